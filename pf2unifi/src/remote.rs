//! File transfer and remote commands over ssh.
//!
//! [`ScpTransport`] shells out to the system `scp` and `ssh` clients in batch
//! mode, so authentication uses keys or an agent. Every invocation is a child
//! process that is waited on before returning, on success and on failure.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

use crate::error::{MigrateError, Result};

/// Copies files to and from a host and runs commands on it.
pub trait RemoteTransport {
    /// Host label used in logs and errors.
    fn host(&self) -> &str;

    /// Copy `remote_path` on the host to `local_path`.
    fn fetch(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Copy `local_path` to `remote_path` on the host.
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// Run `command` on the host and return its stdout.
    fn exec(&self, command: &str) -> Result<String>;
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
}

impl SshTarget {
    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// [`RemoteTransport`] backed by the OpenSSH command-line clients.
#[derive(Debug, Clone)]
pub struct ScpTransport {
    target: SshTarget,
    timeout: Duration,
    scp_program: String,
    ssh_program: String,
}

impl ScpTransport {
    pub fn new(target: SshTarget, timeout: Duration) -> Self {
        Self {
            target,
            timeout,
            scp_program: "scp".to_string(),
            ssh_program: "ssh".to_string(),
        }
    }

    /// Use different client binaries (for wrappers or tests).
    pub fn with_programs(mut self, scp: impl Into<String>, ssh: impl Into<String>) -> Self {
        self.scp_program = scp.into();
        self.ssh_program = ssh.into();
        self
    }

    fn common_options(&self) -> Vec<String> {
        let secs = self.timeout.as_secs().max(1);
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={secs}"),
            "-o".to_string(),
            format!("ServerAliveInterval={secs}"),
            "-o".to_string(),
            "ServerAliveCountMax=1".to_string(),
        ];
        if let Some(identity) = &self.target.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }

    fn scp_args(&self, from: String, to: String) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-P".to_string());
        args.push(self.target.port.to_string());
        args.push(from);
        args.push(to);
        args
    }

    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-p".to_string());
        args.push(self.target.port.to_string());
        args.push(self.target.destination());
        args.push(command.to_string());
        args
    }

    fn remote_spec(&self, path: &str) -> String {
        format!("{}:{}", self.target.destination(), path)
    }

    fn run(&self, program: &str, args: &[String]) -> Result<Output> {
        tracing::debug!(program, ?args, "running remote command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| MigrateError::Connection {
                host: self.target.host.clone(),
                reason: format!("failed to run {program}: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrateError::Connection {
                host: self.target.host.clone(),
                reason: format!("{program} exited with {}: {}", output.status, stderr.trim()),
            });
        }
        Ok(output)
    }
}

impl RemoteTransport for ScpTransport {
    fn host(&self) -> &str {
        &self.target.host
    }

    fn fetch(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let args = self.scp_args(
            self.remote_spec(remote_path),
            local_path.display().to_string(),
        );
        self.run(&self.scp_program, &args)?;
        tracing::info!(host = %self.target.host, remote_path, local = %local_path.display(), "downloaded file");
        Ok(())
    }

    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let args = self.scp_args(
            local_path.display().to_string(),
            self.remote_spec(remote_path),
        );
        self.run(&self.scp_program, &args)?;
        tracing::info!(host = %self.target.host, remote_path, local = %local_path.display(), "uploaded file");
        Ok(())
    }

    fn exec(&self, command: &str) -> Result<String> {
        let output = self.run(&self.ssh_program, &self.ssh_args(command))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::{RemoteTransport, ScpTransport, SshTarget};
    use crate::error::MigrateError;

    fn target() -> SshTarget {
        SshTarget {
            host: "192.168.1.1".to_string(),
            user: "admin".to_string(),
            port: 2222,
            identity_file: Some(PathBuf::from("/home/op/.ssh/id_ed25519")),
        }
    }

    #[test]
    fn scp_args_use_batch_mode_timeout_and_port() {
        let transport = ScpTransport::new(target(), Duration::from_secs(5));
        let args = transport.scp_args(
            transport.remote_spec("/cf/conf/config.xml"),
            "config.xml".to_string(),
        );
        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=5",
                "-o",
                "ServerAliveInterval=5",
                "-o",
                "ServerAliveCountMax=1",
                "-i",
                "/home/op/.ssh/id_ed25519",
                "-P",
                "2222",
                "admin@192.168.1.1:/cf/conf/config.xml",
                "config.xml",
            ]
        );
    }

    #[test]
    fn ssh_args_put_command_last() {
        let mut target = target();
        target.identity_file = None;
        let transport = ScpTransport::new(target, Duration::from_millis(10));
        let args = transport.ssh_args("sudo systemctl restart unifi");
        assert_eq!(args[3], "ConnectTimeout=1");
        assert_eq!(
            &args[args.len() - 4..],
            &["-p", "2222", "admin@192.168.1.1", "sudo systemctl restart unifi"]
        );
    }

    #[test]
    fn failing_client_is_a_connection_error() {
        let transport =
            ScpTransport::new(target(), Duration::from_secs(1)).with_programs("false", "false");
        let err = transport
            .fetch("/cf/conf/config.xml", Path::new("config.xml"))
            .expect_err("false always fails");
        match err {
            MigrateError::Connection { host, .. } => assert_eq!(host, "192.168.1.1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_client_is_a_connection_error() {
        let transport = ScpTransport::new(target(), Duration::from_secs(1))
            .with_programs("pf2unifi-no-such-scp", "pf2unifi-no-such-ssh");
        let err = transport.exec("true").expect_err("program missing");
        assert!(err.to_string().contains("failed to run pf2unifi-no-such-ssh"));
    }

    #[test]
    fn successful_client_returns_stdout() {
        let transport =
            ScpTransport::new(target(), Duration::from_secs(1)).with_programs("true", "echo");
        let out = transport.exec("restarted").expect("echo succeeds");
        assert!(out.trim_end().ends_with("restarted"));
        transport
            .upload(Path::new("config.gateway.json"), "/tmp/x")
            .expect("true succeeds");
    }
}

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use pf2unifi::config::Config;
use pf2unifi::controller::{ControllerApi, UnifiSession};
use pf2unifi::extract::{extract_file, DnsVariant, Extraction};
use pf2unifi::pipeline::{fetch_source, migrate, publish_gateway, MigrateSettings, RunReport};
use pf2unifi::remote::ScpTransport;
use pf2unifi::translate::NetworkField;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, DnsVariantArg, Mode};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(mode) = cli.mode() else {
        eprintln!("{} no mode given\n", "[!]".yellow());
        Cli::command().print_help()?;
        bail!("no mode selected: pass --all, --fetch-only or --unifi-only");
    };

    init_tracing(cli.verbose);
    tracing::debug!(?mode, "verbose mode enabled");

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if cli.upload && mode != Mode::FetchOnly {
        config.gateway().context("--upload needs a [gateway] section")?;
    }

    let local_path = cli
        .input
        .clone()
        .unwrap_or_else(|| config.source.local_path.clone());
    let variant = cli
        .dns_variant
        .map(dns_variant)
        .unwrap_or(config.source.dns_variant);

    if matches!(mode, Mode::All | Mode::FetchOnly) {
        let target = config.source.ssh_target()?;
        let transport = ScpTransport::new(target, fetch_timeout(&config));
        fetch_source(&transport, &config.source.remote_path, &local_path)
            .context("failed to fetch source config")?;
        println!("{} downloaded {}", "[+]".green(), local_path.display());
    }

    let extraction = extract_file(&local_path, variant)
        .with_context(|| format!("failed to read {}", local_path.display()))?;
    report_problems(&extraction);

    if mode == Mode::FetchOnly {
        println!(
            "{} extracted {} DHCP reservations and {} static DNS entries",
            "[+]".green(),
            extraction.reservations.len(),
            extraction.hosts.len()
        );
        return finish(extraction.problems.len());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| config.output.path.clone());
    let mut report = run_migration(&cli, &config, &extraction, output_path)?;

    if cli.upload {
        let gateway = config.gateway()?;
        let transport = ScpTransport::new(gateway.ssh_target(), fetch_timeout(&config));
        let local = report
            .gateway_path
            .clone()
            .context("gateway document was not written")?;
        publish_gateway(
            &transport,
            &local,
            &gateway.remote_path,
            &gateway.restart_command,
        )
        .context("failed to publish gateway config")?;
        report.uploaded = true;
    }

    print_report(&report);
    finish(report.failure_count())
}

fn run_migration(
    cli: &Cli,
    config: &Config,
    extraction: &Extraction,
    output_path: PathBuf,
) -> Result<RunReport> {
    let controller = config.controller.as_ref();
    let settings = MigrateSettings {
        lan_name: controller.map(|c| c.lan_name.clone()).unwrap_or_default(),
        network_field: controller
            .map(|c| c.network_field)
            .unwrap_or(NetworkField::SiteId),
        duplicate_hostnames: config.output.duplicate_hostnames,
        output_path,
    };

    if cli.dry_run {
        return Ok(migrate(extraction, None, &settings)?);
    }

    let controller = config.controller()?;
    let mut session = UnifiSession::builder(&controller.url, controller.resolved_api_key()?)
        .timeout(controller.timeout())
        .accept_invalid_certs(controller.accept_invalid_certs)
        .site(controller.site.clone())
        .build()?;
    let api: &mut dyn ControllerApi = &mut session;
    migrate(extraction, Some(api), &settings).context("migration aborted")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pf2unifi=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn fetch_timeout(config: &Config) -> std::time::Duration {
    config
        .controller
        .as_ref()
        .map(|c| c.timeout())
        .unwrap_or(pf2unifi::controller::DEFAULT_TIMEOUT)
}

fn dns_variant(arg: DnsVariantArg) -> DnsVariant {
    match arg {
        DnsVariantArg::Auto => DnsVariant::Auto,
        DnsVariantArg::Unbound => DnsVariant::Unbound,
        DnsVariantArg::Hosts => DnsVariant::Hosts,
    }
}

fn report_problems(extraction: &Extraction) {
    for problem in &extraction.problems {
        eprintln!("{} {problem}", "[-]".red());
    }
}

fn print_report(report: &RunReport) {
    if report.dry_run {
        println!(
            "{} dry run: {} reservations translated, nothing submitted",
            "[!]".yellow(),
            report.reservations_found
        );
    } else {
        println!(
            "{} reservations: {} created, {} failed (of {})",
            if report.reservations_failed == 0 {
                "[+]".green()
            } else {
                "[-]".red()
            },
            report.reservations_created,
            report.reservations_failed,
            report.reservations_found
        );
    }
    if let Some(path) = &report.gateway_path {
        println!(
            "{} wrote {} with {} static DNS entries",
            "[+]".green(),
            path.display(),
            report.gateway_hosts
        );
    }
    if report.uploaded {
        println!("{} uploaded gateway config and restarted service", "[+]".green());
    }
    if report.records_skipped > 0 {
        println!(
            "{} {} source records skipped",
            "[-]".red(),
            report.records_skipped
        );
    }
}

fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        bail!("{failures} record(s) failed to migrate");
    }
    Ok(())
}

use thiserror::Error;

/// Result alias used across the migration library.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Everything that can go wrong during a migration run.
///
/// Auth and lookup failures abort a run; `Api` and `MissingField` are
/// reported per record and counted instead.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Remote fetch, upload, or command over ssh failed.
    #[error("connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    /// Source document is malformed or not shaped as expected.
    #[error("failed to parse {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    /// A matched node lacks a required child element.
    #[error("{node} is missing required field '{field}'")]
    MissingField { node: String, field: &'static str },

    /// The controller rejected the API key.
    #[error("controller rejected credentials ({status}): {body}")]
    Auth { status: u16, body: String },

    /// An expected site or network does not exist on the controller.
    #[error("{resource} not found on controller")]
    NotFound { resource: String },

    /// Non-2xx response from a controller call.
    #[error("controller returned {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport failure (DNS, TLS, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types shared across the crate.
//!
//! Only [`TopologyError`] ever reaches `main`. Per-device and per-record
//! problems are reported through [`FetchError`] and [`RecordDefect`] and are
//! logged and skipped where they occur.

use thiserror::Error;

/// Process-level failures.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inventory error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Rendering error: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid GraphML: {0}")]
    InvalidGraphMl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Failure to retrieve one device's LLDP payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("polling task failed: {0}")]
    Task(String),
}

/// Why a single neighbor entry could not be turned into a link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordDefect {
    #[error("entry does not match the schema: {0}")]
    InvalidEntry(String),

    #[error("interface has no name")]
    MissingInterfaceName,

    #[error("neighbor has no state")]
    MissingNeighborState,

    #[error("neighbor state has no system-name")]
    MissingSystemName,

    #[error("neighbor state has no port-id")]
    MissingPortId,
}

use thiserror::Error;

/// Failures at the edges: reading payloads and configuration.
///
/// The progress model itself never fails; malformed data inside a payload
/// degrades to display defaults instead of surfacing here.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

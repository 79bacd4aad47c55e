use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch error from {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
}

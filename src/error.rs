use serde::Serialize;
use thiserror::Error;

/// A recoverable problem with the content of a metadata element.
///
/// Unlike [`MedinError`] this is cloneable so that it can be kept as a value
/// inside the assembled metadata when extraction runs in non-raising mode.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}: {detail}")]
pub struct MetadataError {
    pub message: String,
    pub detail: String,
}

impl MetadataError {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { message: message.into(), detail: detail.into() }
    }
}

#[derive(Error, Debug)]
pub enum MedinError {
    #[error("Parse error: {message}")]
    Parse { message: String, position: Option<u64> },
    #[error("Path error: {0}")]
    Path(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// Raised by resolver implementations when the service behind them fails.
    /// Extraction logs it and falls back to a placeholder value.
    #[error("Service error: {0}")]
    Service(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, MedinError>;

// Helper conversions
impl From<quick_xml::Error> for MedinError {
    fn from(e: quick_xml::Error) -> Self { Self::Parse { message: e.to_string(), position: None } }
}
impl From<quick_xml::events::attributes::AttrError> for MedinError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self { Self::Parse { message: e.to_string(), position: None } }
}
impl From<pest::error::Error<crate::path::Rule>> for MedinError {
    fn from(e: pest::error::Error<crate::path::Rule>) -> Self { Self::Path(e.to_string()) }
}
impl From<config::ConfigError> for MedinError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<rusqlite::Error> for MedinError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}

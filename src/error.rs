use thiserror::Error;

use crate::literal::Rule;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VirkningError {
    #[error("Malformed range literal '{literal}': {message}")]
    MalformedRangeLiteral { literal: String, message: String },
    #[error("Invalid range: {from} is after {to}")]
    InvalidRange { from: String, to: String },
    #[error("Unknown validity token: {0}")]
    UnknownValidityToken(String),
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("Arithmetic on an unbounded value: {0}")]
    UnboundedArithmetic(String),
    #[error("Conflicting parameters: {0}")]
    ConflictingParameters(String),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VirkningError>;

// Helper conversions
impl From<pest::error::Error<Rule>> for VirkningError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        Self::MalformedRangeLiteral {
            literal: e.line().to_string(),
            message: e.variant.message().into_owned(),
        }
    }
}
impl From<serde_json::Error> for VirkningError {
    fn from(e: serde_json::Error) -> Self { Self::MalformedDocument(e.to_string()) }
}
impl From<config::ConfigError> for VirkningError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

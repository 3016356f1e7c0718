//! Upstream call errors

use crate::resilience::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    #[error("wrong type: {0}")]
    WrongType(String),

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("connect timeout: {0}")]
    ConnectTimeout(String),

    #[error("read timeout: {0}")]
    ReadTimeout(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("upstream error: {0}")]
    Other(String),
}

impl Classify for UpstreamError {
    fn classify(&self) -> ErrorClass {
        match self {
            Self::MissingAttribute(_) | Self::WrongType(_) | Self::MissingKey(_) => {
                ErrorClass::FatalInput
            }
            Self::ConnectTimeout(_)
            | Self::ReadTimeout(_)
            | Self::Timeout(_)
            | Self::Connection(_) => ErrorClass::Retryable,
            Self::Other(_) => ErrorClass::Fatal,
        }
    }
}

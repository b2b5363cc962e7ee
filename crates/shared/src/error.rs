use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidTransition,
    BroadcastLocked,
    UnmappedVerse,
    ConversionFailed,
}

/// Operator-facing fault carried by notifications and status surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFault {
    pub code: ErrorCode,
    pub message: String,
}

impl ControlFault {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
    #[error("broadcast is live; structural edits are rejected")]
    BroadcastLocked,
    #[error("verse index {verse} has no slide mapping and no chorus fallback")]
    UnmappedVerse { verse: u8 },
}

impl BroadcastError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition(_) => ErrorCode::InvalidTransition,
            Self::BroadcastLocked => ErrorCode::BroadcastLocked,
            Self::UnmappedVerse { .. } => ErrorCode::UnmappedVerse,
        }
    }
}

impl From<BroadcastError> for ControlFault {
    fn from(value: BroadcastError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

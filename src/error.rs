//! Error types surfaced by the decision core and its I/O collaborators.

use thiserror::Error;

use crate::hex::HexCoord;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("legion ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("legion ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported legion ledger version {0}")]
    UnsupportedVersion(u8),
}

/// Faults isolated to a single agent during a decision pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("agent {0} appears more than once in the snapshot")]
    DuplicateAgent(String),

    #[error("path for agent {agent_id} starts at {found}, expected {expected}")]
    PathOrigin {
        agent_id: String,
        expected: HexCoord,
        found: HexCoord,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registration is not open")]
    RegistrationClosed,
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::RegistrationClosed => false,
        }
    }
}

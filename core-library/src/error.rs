use bridge_traits::error::BridgeError;
use thiserror::Error;

use crate::entity::EntityType;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity_type} record has no id")]
    MissingId { entity_type: EntityType },

    #[error("Invalid {entity_type} record: {reason}")]
    InvalidRecord {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Unknown entity type `{0}`")]
    UnknownEntityType(String),

    #[error("No endpoint serves single {0} records")]
    NoEndpoint(EntityType),

    #[error("Empty response from {url}")]
    EmptyResponse { url: String },

    #[error("Request to {url} failed: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
        timed_out: bool,
    },

    #[error("Fetch queue is closed")]
    QueueClosed,
}

impl LibraryError {
    /// Failures worth retrying later: timeouts and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            LibraryError::Fetch {
                status, timed_out, ..
            } => *timed_out || status.map(|s| s >= 500).unwrap_or(true),
            LibraryError::Bridge(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors returned by the player controller and media backends.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The embed SDK rejected a command.
    #[error("Media backend error: {0}")]
    Bridge(#[from] BridgeError),

    /// A signal arrived for a backend that has since been replaced.
    #[error("Session {session} is no longer active")]
    StaleSession { session: u64 },

    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// Seek fraction outside `[0.0, 1.0]` or not finite.
    #[error("Invalid seek fraction: {0} (must be between 0.0 and 1.0)")]
    InvalidSeekFraction(f64),

    /// Volume outside `[0.0, 1.0]` or not finite.
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f64),

    /// A numeric media type that is not one of the known kinds.
    #[error("Unknown media type code: {0}")]
    UnknownMediaKind(i64),

    /// `register` was given `MediaKind::None`.
    #[error("Cannot register a backend of kind None")]
    NoneBackend,
}

impl PlaybackError {
    /// Returns `true` for misuse of the API rather than a runtime failure.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidSeekFraction(_)
                | PlaybackError::InvalidVolume(_)
                | PlaybackError::UnknownMediaKind(_)
                | PlaybackError::NoneBackend
        )
    }

    /// Returns `true` if the SDK reported a timeout.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::Bridge(e) if e.is_timeout())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(PlaybackError::InvalidVolume(1.5).is_programmer_error());
        assert!(!PlaybackError::StaleSession { session: 3 }.is_programmer_error());
        assert!(PlaybackError::from(BridgeError::Timeout("sdk".into())).is_transient());
        assert!(!PlaybackError::from(BridgeError::Sdk("boom".into())).is_transient());
    }
}

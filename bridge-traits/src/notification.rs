//! User-visible notification surface.
//!
//! Router and fetch failure paths record transient notifications; the host UI
//! decides how to render and expire them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::PlatformSendSync;

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub is_error: bool,
    /// HTTP status carried by a server error body.
    pub status: Option<u16>,
    /// Short error name carried by a server error body (e.g. "Bad Request").
    pub error: Option<String>,
    /// Request path carried by a server error body.
    pub path: Option<String>,
    /// Server-side timestamp in epoch milliseconds.
    pub timestamp: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            is_error: false,
            status: None,
            error: None,
            path: None,
            timestamp: None,
            recorded_at: Utc::now(),
        }
    }

    /// Build a notification from a structured server error body.
    ///
    /// Returns `None` when the body is not a JSON object.
    pub fn from_json(body: &str) -> Option<Self> {
        let parsed: ServerErrorBody = serde_json::from_str(body).ok()?;
        let mut notification = Self::new(parsed.message.unwrap_or_default());
        notification.status = parsed.status;
        notification.error = parsed.error;
        notification.path = parsed.path;
        notification.timestamp = parsed.timestamp;
        Some(notification)
    }

    /// Mark the notification as an error.
    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}

pub trait NotificationSink: PlatformSendSync {
    fn record(&self, notification: Notification);
}

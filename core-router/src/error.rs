use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    // ========================================================================
    // Route table errors (construction time)
    // ========================================================================
    #[error("Invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Route `{pattern}` field `{field}` references capture {index}, but the pattern only has {available}")]
    CaptureOutOfRange {
        pattern: String,
        field: String,
        index: usize,
        available: usize,
    },

    #[error("No route matches the login path `{login_path}`")]
    LoginRouteMissing { login_path: String },

    #[error("Login path `{login_path}` resolves to `{pattern}`, which requires `{role}`")]
    LoginRouteGated {
        login_path: String,
        pattern: String,
        role: String,
    },

    #[error("Unknown route `{0}`")]
    UnknownRoute(String),

    #[error("Invalid route table: {0}")]
    InvalidRouteTable(#[from] serde_json::Error),

    // ========================================================================
    // Capture resolution errors (navigation time)
    // ========================================================================
    #[error("Capture {index} is missing")]
    MissingCapture { index: usize },

    #[error("`{value}` is not an encoded id")]
    InvalidSlug { value: String },

    #[error("Capture {index} `{value}` is not an integer")]
    InvalidInteger { index: usize, value: String },
}

impl RouterError {
    /// Errors raised while building the route table, as opposed to while
    /// resolving a particular path.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RouterError::InvalidPattern { .. }
                | RouterError::CaptureOutOfRange { .. }
                | RouterError::LoginRouteMissing { .. }
                | RouterError::LoginRouteGated { .. }
                | RouterError::UnknownRoute(_)
                | RouterError::InvalidRouteTable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

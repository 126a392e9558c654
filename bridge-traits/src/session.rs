//! Session / authorisation getters.
//!
//! The core never authenticates anyone. It only reads the host session's role
//! set to gate routes.

use crate::platform::PlatformSendSync;

/// Role granted to site administrators.
pub const PRIV_ADMIN: &str = "PRIV_ADMIN";

/// Role granted to moderators; gates the records and admin pages.
pub const PRIV_MODERATOR: &str = "PRIV_MODERATOR";

pub trait SessionProvider: PlatformSendSync {
    fn is_logged_in(&self) -> bool;

    /// Returns the granted authorities, or `None` when there are none.
    fn authorities(&self) -> Option<Vec<String>>;

    fn has_role(&self, role: &str) -> bool {
        self.authorities()
            .map(|roles| roles.iter().any(|granted| granted == role))
            .unwrap_or(false)
    }

    fn is_admin(&self) -> bool {
        self.has_role(PRIV_ADMIN)
    }

    fn is_moderator(&self) -> bool {
        self.has_role(PRIV_MODERATOR)
    }
}

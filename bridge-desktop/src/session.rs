//! Session holder for hosts that manage login themselves.

use bridge_traits::session::SessionProvider;
use parking_lot::RwLock;

/// Session whose role set is replaced wholesale by the host after login or
/// logout.
#[derive(Debug, Default)]
pub struct StaticSession {
    authorities: RwLock<Vec<String>>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let session = Self::default();
        session.set_roles(roles);
        session
    }

    pub fn set_roles<I, S>(&self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.authorities.write() = roles.into_iter().map(Into::into).collect();
    }

    pub fn log_out(&self) {
        self.authorities.write().clear();
    }
}

impl SessionProvider for StaticSession {
    fn is_logged_in(&self) -> bool {
        !self.authorities.read().is_empty()
    }

    fn authorities(&self) -> Option<Vec<String>> {
        let authorities = self.authorities.read();
        if authorities.is_empty() {
            None
        } else {
            Some(authorities.clone())
        }
    }
}

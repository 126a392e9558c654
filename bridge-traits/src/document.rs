//! Document / history host.
//!
//! Everything the router needs from the browser document: the current
//! location, history pushes, the page title and named meta tags.

use crate::platform::PlatformSendSync;

pub trait DocumentHost: PlatformSendSync {
    /// Current location pathname, e.g. `/Events/abc/Gig`.
    fn pathname(&self) -> String;

    /// Current location search string including the leading `?`, or an empty
    /// string.
    fn search(&self) -> String;

    /// Push a new history entry. `url` may carry a query string.
    fn push_state(&self, url: &str);

    fn set_title(&self, title: &str);

    /// Set the `content` attribute of `meta[name=<name>]`, if present.
    fn set_meta_tag(&self, name: &str, content: &str);
}

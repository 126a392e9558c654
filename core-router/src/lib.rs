//! # Core Router
//!
//! Client-side navigation for the NestedBird site.
//!
//! ## Overview
//!
//! - [`matcher`] compiles route patterns (`/Events/:id/:name?`, `*`).
//! - [`template`] resolves `$N`, `@N` and `#N` directives against captures.
//! - [`route`] holds the ordered route table and compiled routes.
//! - [`router`] runs navigations: first match wins, the authorisation gate
//!   redirects to login, and commits land in [`NavigationState`].
//! - [`href`] builds links, including the `$parent` and `$modalless` magic
//!   page references.
//! - [`query`] parses and writes query strings.
//! - [`slug`] converts uuids to and from their 22-character URL form.
//!
//! ## Example
//!
//! ```ignore
//! use core_router::{Router, RouterDeps, RouteTable};
//!
//! let deps = RouterDeps::from_config(&config, events.clone());
//! let mut router = Router::new(RouteTable::site(), &config, deps)?;
//!
//! router.process_first_page_load();
//! router.redirect("/Events");
//! assert_eq!(router.state().current_page, Page::Events);
//! ```

pub mod enums;
pub mod error;
pub mod href;
pub mod matcher;
pub mod query;
pub mod route;
pub mod router;
pub mod slug;
pub mod state;
pub mod template;

pub use enums::{Modal, Page};
pub use error::{Result, RouterError};
pub use href::{HrefTarget, PageRef};
pub use matcher::{PathMatch, PathMatcher};
pub use query::{parse_query, write_query, QueryMap};
pub use route::{CommitHook, Route, RouteSpec, RouteState, RouteTable};
pub use router::{NavigationOutcome, Router, RouterDeps};
pub use state::{NavigationState, PathInfo};
pub use template::{StateValue, Template, TemplateValue};

//! Routes and the route table.
//!
//! The table is ordered data: the first route whose pattern matches a path
//! decides the outcome, so specific patterns must come before general ones
//! and the `*` catch-all last.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::enums::{Modal, Page};
use crate::error::{Result, RouterError};
use crate::matcher::{PathMatch, PathMatcher};
use crate::state::{NavigationState, PathInfo};
use crate::template::TemplateValue;

pub const SITE_TITLE: &str = "Sound of Jersey";

/// Fields a route writes into navigation state when it commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_modal: Option<Modal>,
    /// Authority the session must hold. `false` and `null` both mean none.
    #[serde(
        default,
        deserialize_with = "deserialize_authorisation",
        skip_serializing_if = "Option::is_none"
    )]
    pub require_authorisation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TemplateValue>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, TemplateValue>,
}

fn deserialize_authorisation<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(role) if role.is_empty() => Ok(None),
        Value::String(role) => Ok(Some(role)),
        other => Err(serde::de::Error::custom(format!(
            "requireAuthorisation must be false or a role name, got {}",
            other
        ))),
    }
}

impl RouteState {
    pub fn page(page: Page) -> Self {
        Self {
            current_page: Some(page),
            current_modal: Some(Modal::None),
            ..Default::default()
        }
    }

    pub fn modal(modal: Modal) -> Self {
        Self {
            current_modal: Some(modal),
            ..Default::default()
        }
    }

    pub fn requires(mut self, role: impl Into<String>) -> Self {
        self.require_authorisation = Some(role.into());
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(TemplateValue::from(title));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: TemplateValue) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    fn templates(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.title
            .iter()
            .map(|title| ("title", title))
            .chain(self.extra.iter().map(|(name, value)| (name.as_str(), value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub pattern: String,
    #[serde(default)]
    pub state: RouteState,
}

impl RouteSpec {
    pub fn new(pattern: impl Into<String>, state: RouteState) -> Self {
        Self {
            pattern: pattern.into(),
            state,
        }
    }
}

/// Ordered route definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteSpec>) -> Self {
        Self { routes }
    }

    /// Load a table from a JSON array of `{"pattern": …, "state": {…}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn push(&mut self, spec: RouteSpec) {
        self.routes.push(spec);
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The site's own routes.
    pub fn site() -> Self {
        use crate::enums::Modal as M;
        use crate::enums::Page as P;
        use bridge_traits::session::PRIV_MODERATOR as MOD;

        let title = |suffix: &str| format!("{} | {}", SITE_TITLE, suffix);
        let route = |pattern: &str, state: RouteState| RouteSpec::new(pattern, state);

        Self::new(vec![
            route("/search/:query", RouteState::page(P::Search).titled(&title("Search"))),
            route("/submit/:type", RouteState::modal(M::Submit).requires(MOD).titled(&title("Submit"))),
            route("/login/fast", RouteState::modal(M::LoginPassword).titled(&title("Login"))),
            route("/login/register", RouteState::modal(M::Register).titled(&title("Register"))),
            route("/login/reset", RouteState::modal(M::PasswordReset).titled(&title("Password Reset"))),
            route("/VerifyEvents", RouteState::page(P::VerifyEvents).requires(MOD).titled(&title("VerifyEvents"))),
            route(
                "/Records/:name/create",
                RouteState::modal(M::CreateRecord).requires(MOD).titled(&title("Create Record | $1")),
            ),
            route(
                "/Records/:id/:name",
                RouteState::modal(M::EditRecord).requires(MOD).titled(&title("Edit Record | $2")),
            ),
            route("/Records/:name", RouteState::modal(M::Record).requires(MOD).titled(&title("Record | $1"))),
            route("/Records", RouteState::page(P::Records).requires(MOD).titled(&title("Records"))),
            route("/Admin", RouteState::page(P::Admin).requires(MOD).titled(&title("Admin"))),
            route("/Events", RouteState::page(P::Events).titled(&title("Events"))),
            route("/News", RouteState::page(P::News).titled(&title("News"))),
            route("/About", RouteState::page(P::About).titled(&title("About"))),
            route("/Media", RouteState::page(P::Music).titled(&title("Media"))),
            route("/login", RouteState::modal(M::Login).titled(&title("Login"))),
            route("/Locations/:id/:name?", RouteState::modal(M::Location).titled(&title("Location | $2"))),
            route("/Events/:id/:name?", RouteState::modal(M::Event).titled(&title("Event | $2"))),
            route("/Artists/:id/:name?", RouteState::modal(M::Artist).titled(&title("Artist | $2"))),
            route("/Song/:id/:name?", RouteState::modal(M::Song).titled(&title("Song | $2"))),
            route("/Medium/:id/:name?", RouteState::modal(M::Medium).titled(&title("Medium | $2"))),
            route("/", RouteState::page(P::Events).titled(SITE_TITLE)),
            route("*", RouteState::modal(M::NotFound).titled(&title("404"))),
        ])
    }
}

/// Callback run after a route commits.
pub type CommitHook = Arc<dyn Fn(&NavigationState) + Send + Sync>;

/// Everything a route contributes to one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub path: PathInfo,
    pub current_page: Option<Page>,
    pub current_modal: Option<Modal>,
    pub require_authorisation: Option<String>,
    pub title: Option<String>,
    pub extra: Map<String, Value>,
}

impl ResolvedRoute {
    /// Write into `state`. Page and modal are only touched when the route
    /// sets them, so a modal route keeps the page underneath it.
    pub fn apply(self, state: &mut NavigationState) {
        state.path = self.path;
        if let Some(page) = self.current_page {
            state.current_page = page;
        }
        if let Some(modal) = self.current_modal {
            state.current_modal = modal;
        }
        state.require_authorisation = self.require_authorisation;
        if let Some(title) = self.title {
            state.title = title;
        }
        state.extra.extend(self.extra);
    }
}

/// A compiled route.
#[derive(Clone)]
pub struct Route {
    spec: RouteSpec,
    matcher: PathMatcher,
    on_commit: Option<CommitHook>,
}

impl Route {
    /// Compile `spec`, rejecting templates that reference captures the
    /// pattern does not have.
    pub fn new(spec: RouteSpec) -> Result<Self> {
        let matcher = PathMatcher::compile(&spec.pattern)?;
        let available = matcher.keys().len();

        for (field, template) in spec.state.templates() {
            if let Some(index) = template.max_index() {
                if index > available {
                    return Err(RouterError::CaptureOutOfRange {
                        pattern: spec.pattern.clone(),
                        field: field.to_string(),
                        index,
                        available,
                    });
                }
            }
        }

        Ok(Self {
            spec,
            matcher,
            on_commit: None,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.spec.pattern
    }

    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        self.matcher.matches(path)
    }

    pub fn required_role(&self) -> Option<&str> {
        self.spec.state.require_authorisation.as_deref()
    }

    pub fn set_on_commit(&mut self, hook: CommitHook) {
        self.on_commit = Some(hook);
    }

    pub fn on_commit(&self) -> Option<&CommitHook> {
        self.on_commit.as_ref()
    }

    /// Resolve this route's state fields against one match.
    pub fn resolve(&self, matched: &PathMatch) -> Result<ResolvedRoute> {
        let captures = matched.captures();
        let state = &self.spec.state;

        let title = match &state.title {
            Some(TemplateValue::Template(template)) => Some(template.resolve(captures)?.to_string()),
            Some(TemplateValue::Literal(Value::String(text))) => Some(text.clone()),
            Some(TemplateValue::Literal(other)) => Some(other.to_string()),
            None => None,
        };

        let mut extra = Map::new();
        for (name, template) in &state.extra {
            extra.insert(name.clone(), template.resolve(captures)?);
        }

        Ok(ResolvedRoute {
            path: PathInfo {
                url: matched.url().to_string(),
                params: matched.params(),
            },
            current_page: state.current_page,
            current_modal: state.current_modal,
            require_authorisation: state.require_authorisation.clone(),
            title,
            extra,
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.spec.pattern)
            .field("state", &self.spec.state)
            .field("on_commit", &self.on_commit.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_table_compiles_in_order() {
        let table = RouteTable::site();
        let routes: Vec<Route> = table
            .routes()
            .iter()
            .cloned()
            .map(Route::new)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(routes.first().unwrap().pattern(), "/search/:query");
        assert_eq!(routes.last().unwrap().pattern(), "*");
        assert_eq!(routes.len(), 23);
    }

    #[test]
    fn test_capture_out_of_range_rejected() {
        let spec = RouteSpec::new("/Records/:name", RouteState::modal(Modal::Record).titled("x | $2"));
        match Route::new(spec) {
            Err(RouterError::CaptureOutOfRange {
                field,
                index,
                available,
                ..
            }) => {
                assert_eq!(field, "title");
                assert_eq!(index, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected CaptureOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_fills_fields() {
        let spec = RouteSpec::new(
            "/search/:query",
            RouteState::page(Page::Search)
                .titled("Search | $1")
                .with_field("searchQuery", TemplateValue::from("$1")),
        );
        let route = Route::new(spec).unwrap();
        let matched = route.matches("/search/jazz").unwrap();
        let resolved = route.resolve(&matched).unwrap();

        assert_eq!(resolved.title.as_deref(), Some("Search | jazz"));
        assert_eq!(resolved.extra["searchQuery"], "jazz");
        assert_eq!(resolved.path.params["query"], "jazz");
        assert_eq!(resolved.current_modal, Some(Modal::None));
    }

    #[test]
    fn test_from_json_accepts_false_authorisation() {
        let table = RouteTable::from_json(
            r#"[
                {"pattern": "/Admin", "state": {"currentPage": 5, "currentModal": 0,
                 "requireAuthorisation": "PRIV_MODERATOR", "title": "Admin"}},
                {"pattern": "/login", "state": {"currentModal": 6,
                 "requireAuthorisation": false, "title": "Login", "fancy": 3}}
            ]"#,
        )
        .unwrap();

        let admin = &table.routes()[0].state;
        assert_eq!(admin.current_page, Some(Page::Admin));
        assert_eq!(admin.require_authorisation.as_deref(), Some("PRIV_MODERATOR"));

        let login = &table.routes()[1].state;
        assert_eq!(login.require_authorisation, None);
        assert_eq!(
            login.extra.get("fancy"),
            Some(&TemplateValue::Literal(serde_json::json!(3)))
        );
    }

    #[test]
    fn test_from_json_rejects_bad_authorisation() {
        let err = RouteTable::from_json(r#"[{"pattern": "/x", "state": {"requireAuthorisation": 5}}]"#)
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidRouteTable(_)));
        assert!(err.is_configuration_error());
    }
}

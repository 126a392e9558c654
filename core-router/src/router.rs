//! The router.
//!
//! A navigation runs the route table in declaration order, checks the winning
//! route's authorisation requirement against the session, and commits the
//! resolved fields into navigation state as one update:
//!
//! ```text
//! navigate(path)
//!   ├─ no route applies ─────────────► NotFound  (noindex, "Resource Not Found")
//!   ├─ role missing ─────────────────► Forbidden (noindex, "Insufficient permissions",
//!   │                                             then navigate(login_path) once)
//!   └─ authorised ───────────────────► Committed (state, title, completion hook)
//! ```
//!
//! Whatever the outcome, the query string is then re-read from the document
//! and `og:url` updated.
//!
//! Methods take `&mut self`, so two navigations through one router can never
//! interleave. Consumers doing async work keyed off a navigation compare
//! [`NavigationState::sequence`] to drop results from superseded ones.

use std::sync::Arc;

use bridge_traits::document::DocumentHost;
use bridge_traits::notification::{Notification, NotificationSink};
use bridge_traits::session::SessionProvider;
use bridge_traits::time::Clock;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use core_runtime::state::{StateCell, StateReceiver};
use tracing::{debug, info, instrument, warn};

use crate::enums::{Modal, Page};
use crate::error::{Result, RouterError};
use crate::href::{self, HrefTarget};
use crate::query::{parse_query, QueryMap};
use crate::route::{CommitHook, Route, RouteTable};
use crate::state::NavigationState;

pub const NOT_FOUND_MESSAGE: &str = "Resource Not Found";
pub const FORBIDDEN_MESSAGE: &str = "Insufficient permissions";

/// Forbidden navigations redirect to the login path at most this many times.
const MAX_REDIRECT_DEPTH: u8 = 1;

/// Result of one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Committed { status: u16 },
    NotFound,
    /// `redirect` is the login path when the router went there instead.
    Forbidden { redirect: Option<String> },
}

impl NavigationOutcome {
    pub fn status(&self) -> u16 {
        match self {
            NavigationOutcome::Committed { status } => *status,
            NavigationOutcome::NotFound => 404,
            NavigationOutcome::Forbidden { .. } => 403,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, NavigationOutcome::Committed { .. })
    }
}

/// Collaborators the router reads from and writes to.
#[derive(Clone)]
pub struct RouterDeps {
    pub session: Arc<dyn SessionProvider>,
    pub notifications: Arc<dyn NotificationSink>,
    pub document: Arc<dyn DocumentHost>,
    /// Stamps recorded notifications.
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
}

impl RouterDeps {
    pub fn from_config(config: &CoreConfig, events: EventBus) -> Self {
        Self {
            session: config.session.clone(),
            notifications: config.notifications.clone(),
            document: config.document.clone(),
            clock: config.clock.clone(),
            events,
        }
    }
}

pub struct Router {
    routes: Vec<Route>,
    login_path: String,
    site_origin: String,
    title_max_chars: usize,
    deps: RouterDeps,
    state: Arc<StateCell<NavigationState>>,
}

impl Router {
    /// Compile `table` and check it can always fall back to the login path.
    pub fn new(table: RouteTable, config: &CoreConfig, deps: RouterDeps) -> Result<Self> {
        let routes = table
            .routes()
            .iter()
            .cloned()
            .map(Route::new)
            .collect::<Result<Vec<_>>>()?;

        validate_login_route(&routes, &config.login_path)?;

        info!(
            routes = routes.len(),
            login_path = %config.login_path,
            "Router initialised"
        );

        Ok(Self {
            routes,
            login_path: config.login_path.clone(),
            site_origin: config.site_origin.clone(),
            title_max_chars: config.title_max_chars,
            deps,
            state: Arc::new(StateCell::new(NavigationState::default())),
        })
    }

    pub fn state(&self) -> NavigationState {
        self.state.get()
    }

    pub fn subscribe(&self) -> StateReceiver<NavigationState> {
        self.state.subscribe()
    }

    /// Shared handle to the navigation state cell.
    pub fn state_cell(&self) -> Arc<StateCell<NavigationState>> {
        Arc::clone(&self.state)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Run `hook` after every commit of the route declared with `pattern`.
    pub fn on_commit(&mut self, pattern: &str, hook: CommitHook) -> Result<()> {
        let route = self
            .routes
            .iter_mut()
            .find(|route| route.pattern() == pattern)
            .ok_or_else(|| RouterError::UnknownRoute(pattern.to_string()))?;
        route.set_on_commit(hook);
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    pub fn navigate(&mut self, path: &str) -> NavigationOutcome {
        let outcome = self.parse(path, 0);

        if !outcome.is_committed() {
            self.update_query(None);
        }

        let pathname = self.deps.document.pathname();
        self.deps
            .document
            .set_meta_tag("og:url", &format!("{}{}", self.site_origin, pathname));

        outcome
    }

    /// Push `path` onto the history, then navigate to its path part.
    #[instrument(skip(self), fields(path = %path))]
    pub fn redirect(&mut self, path: &str) -> NavigationOutcome {
        self.deps.document.push_state(path);

        let pathname = path.split('?').next().unwrap_or(path);
        let outcome = self.navigate(pathname);

        if self.state.with(|state| state.current_modal == Modal::None) {
            let current = self.deps.document.pathname();
            self.state.update(|state| state.last_modalless_url = current);
        }

        outcome
    }

    /// Replace the query string without re-routing.
    pub fn redirect_query(&mut self, query: &str) {
        let url = format!("{}?{}", self.deps.document.pathname(), query);
        self.deps.document.push_state(&url);
        self.update_query(None);
    }

    /// Commit the query parsed from `raw`, or from the document when `None`.
    pub fn update_query(&mut self, raw: Option<&str>) -> QueryMap {
        let query = match raw {
            Some(raw) => parse_query(raw),
            None => parse_query(&self.deps.document.search()),
        };

        let committed = query.clone();
        self.state.update(|state| state.query = committed);
        self.deps
            .events
            .emit(CoreEvent::Navigation(NavigationEvent::QueryUpdated {
                query: query.clone(),
            }))
            .ok();
        query
    }

    pub fn process_first_page_load(&mut self) -> NavigationOutcome {
        let pathname = self.deps.document.pathname();
        debug!(pathname = %pathname, "Processing first page load");
        self.navigate(&pathname)
    }

    /// Re-route after the host moved through history.
    pub fn on_pop_state(&mut self) -> NavigationOutcome {
        let pathname = self.deps.document.pathname();
        self.navigate(&pathname)
    }

    /// URL for `target`, with magic page references resolved against the
    /// current location.
    pub fn href(&self, target: &HrefTarget) -> String {
        let current_page = self.state.with(|state| state.current_page);
        href::calculate(target, &self.deps.document.pathname(), current_page)
    }

    pub fn navigate_to(&mut self, target: &HrefTarget) -> NavigationOutcome {
        let url = self.href(target);
        let pathname = url.split('?').next().unwrap_or(&url).to_string();
        self.navigate(&pathname)
    }

    pub fn redirect_to(&mut self, target: &HrefTarget) -> NavigationOutcome {
        let url = self.href(target);
        self.redirect(&url)
    }

    /// Switch the page behind any modal and close the modal.
    pub fn set_page(&mut self, page: Page) {
        if let Some(url) = page.url() {
            self.deps.document.push_state(url);
        }
        self.state.update(|state| {
            state.current_page = page;
            state.current_modal = Modal::None;
        });
    }

    /// Open a modal directly, e.g. for an item clicked in a list.
    pub fn set_modal(&mut self, modal: Modal, item_id: Option<String>) {
        self.state.update(|state| {
            state.current_modal = modal;
            state.modal_item_id = item_id;
        });
    }

    pub fn set_mobile_mode(&mut self, is_mobile: bool) {
        self.state.update(|state| state.is_mobile = is_mobile);
    }

    fn parse(&mut self, path: &str, depth: u8) -> NavigationOutcome {
        let Some((index, matched)) = self
            .routes
            .iter()
            .enumerate()
            .find_map(|(i, route)| route.matches(path).map(|m| (i, m)))
        else {
            return self.not_found(path);
        };

        let route = &self.routes[index];

        if let Some(role) = route.required_role() {
            if !self.deps.session.has_role(role) {
                let role = role.to_string();
                return self.forbidden(path, role, depth);
            }
        }

        let resolved = match route.resolve(&matched) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(pattern = route.pattern(), error = %e, "Route matched but its captures did not resolve");
                return self.not_found(path);
            }
        };

        let hook = route.on_commit().cloned();
        let pattern = route.pattern().to_string();
        let query = parse_query(&self.deps.document.search());

        let snapshot = self.state.update(|state| {
            resolved.apply(state);
            state.query = query;
            state.sequence += 1;
            state.clone()
        });

        let title: String = snapshot
            .title
            .chars()
            .take(self.title_max_chars)
            .collect::<String>()
            .replace('_', " ");
        self.deps.document.set_title(&title);

        if let Some(hook) = hook {
            hook(&snapshot);
        }

        info!(
            pattern = %pattern,
            page = %snapshot.current_page,
            modal = %snapshot.current_modal,
            sequence = snapshot.sequence,
            "Navigation committed"
        );
        self.deps
            .events
            .emit(CoreEvent::Navigation(NavigationEvent::Committed {
                path: path.to_string(),
                page: snapshot.current_page.code(),
                modal: snapshot.current_modal.code(),
                sequence: snapshot.sequence,
            }))
            .ok();

        NavigationOutcome::Committed { status: 200 }
    }

    fn notify(&self, message: &str) {
        self.deps
            .notifications
            .record(Notification::new(message).recorded_at(self.deps.clock.now()));
    }

    fn not_found(&mut self, path: &str) -> NavigationOutcome {
        warn!(path = %path, "No route matched");
        self.deps.document.set_meta_tag("robots", "noindex");
        self.notify(NOT_FOUND_MESSAGE);
        self.deps
            .events
            .emit(CoreEvent::Navigation(NavigationEvent::NotFound {
                path: path.to_string(),
            }))
            .ok();
        NavigationOutcome::NotFound
    }

    fn forbidden(&mut self, path: &str, required: String, depth: u8) -> NavigationOutcome {
        let redirect = (path != self.login_path && depth < MAX_REDIRECT_DEPTH).then(|| self.login_path.clone());

        warn!(path = %path, required = %required, redirect = ?redirect, "Navigation forbidden");
        self.deps.document.set_meta_tag("robots", "noindex");
        self.notify(FORBIDDEN_MESSAGE);
        self.deps
            .events
            .emit(CoreEvent::Navigation(NavigationEvent::Forbidden {
                path: path.to_string(),
                required,
                redirect: redirect.clone(),
            }))
            .ok();

        if let Some(login) = &redirect {
            let login = login.clone();
            self.parse(&login, depth + 1);
        }

        NavigationOutcome::Forbidden { redirect }
    }
}

fn validate_login_route(routes: &[Route], login_path: &str) -> Result<()> {
    let route = routes
        .iter()
        .find(|route| route.matches(login_path).is_some())
        .ok_or_else(|| RouterError::LoginRouteMissing {
            login_path: login_path.to_string(),
        })?;

    match route.required_role() {
        Some(role) => Err(RouterError::LoginRouteGated {
            login_path: login_path.to_string(),
            pattern: route.pattern().to_string(),
            role: role.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RouteSpec, RouteState};
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::timer::ManualTimerScheduler;
    use parking_lot::Mutex;

    struct NoHttp;

    #[async_trait::async_trait]
    impl HttpClient for NoHttp {
        async fn execute(&self, _request: HttpRequest) -> bridge_traits::error::Result<HttpResponse> {
            Ok(HttpResponse::new(404, Vec::<u8>::new()))
        }
    }

    struct Roles(Vec<String>);

    impl SessionProvider for Roles {
        fn is_logged_in(&self) -> bool {
            !self.0.is_empty()
        }

        fn authorities(&self) -> Option<Vec<String>> {
            (!self.0.is_empty()).then(|| self.0.clone())
        }
    }

    #[derive(Default)]
    struct Doc {
        pathname: Mutex<String>,
        search: Mutex<String>,
        title: Mutex<String>,
        meta: Mutex<Vec<(String, String)>>,
    }

    impl DocumentHost for Doc {
        fn pathname(&self) -> String {
            self.pathname.lock().clone()
        }

        fn search(&self) -> String {
            self.search.lock().clone()
        }

        fn push_state(&self, url: &str) {
            let (path, search) = match url.split_once('?') {
                Some((path, query)) => (path.to_string(), format!("?{}", query)),
                None => (url.to_string(), String::new()),
            };
            *self.pathname.lock() = path;
            *self.search.lock() = search;
        }

        fn set_title(&self, title: &str) {
            *self.title.lock() = title.to_string();
        }

        fn set_meta_tag(&self, name: &str, content: &str) {
            self.meta.lock().push((name.to_string(), content.to_string()));
        }
    }

    #[derive(Default)]
    struct Notes(Mutex<Vec<Notification>>);

    impl NotificationSink for Notes {
        fn record(&self, notification: Notification) {
            self.0.lock().push(notification);
        }
    }

    fn router_with(table: RouteTable, roles: &[&str]) -> (Router, Arc<Doc>, Arc<Notes>) {
        let doc = Arc::new(Doc::default());
        let notes = Arc::new(Notes::default());
        let session = Arc::new(Roles(roles.iter().map(|r| r.to_string()).collect()));
        let config = CoreConfig::builder()
            .http_client(Arc::new(NoHttp))
            .session(session)
            .notifications(notes.clone())
            .document(doc.clone())
            .timers(Arc::new(ManualTimerScheduler::new()))
            .site_origin("https://soundofjersey.example")
            .build()
            .unwrap();
        let deps = RouterDeps::from_config(&config, EventBus::default());
        (Router::new(table, &config, deps).unwrap(), doc, notes)
    }

    #[test]
    fn test_title_truncated_and_underscores_replaced() {
        let table = RouteTable::new(vec![
            RouteSpec::new("/login", RouteState::modal(Modal::Login)),
            RouteSpec::new(
                "/Artists/:id/:name?",
                RouteState::modal(Modal::Artist).titled("Sound of Jersey | Artist | $2"),
            ),
        ]);
        let (mut router, doc, _) = router_with(table, &[]);
        let long = "A".repeat(30) + "_" + &"B".repeat(30);

        let outcome = router.navigate(&format!("/Artists/x/{}", long));

        assert_eq!(outcome, NavigationOutcome::Committed { status: 200 });
        let title = doc.title.lock().clone();
        assert_eq!(title.chars().count(), 60);
        assert!(title.starts_with("Sound of Jersey | Artist | AAA"));
        assert!(!title.contains('_'));
        assert!(router.state().title.contains('_'));
    }

    #[test]
    fn test_not_found_keeps_state() {
        let table = RouteTable::new(vec![RouteSpec::new("/login", RouteState::modal(Modal::Login))]);
        let (mut router, doc, notes) = router_with(table, &[]);

        let before = router.state();
        assert_eq!(router.navigate("/nowhere"), NavigationOutcome::NotFound);

        assert_eq!(router.state().sequence, before.sequence);
        assert_eq!(router.state().current_modal, before.current_modal);
        assert_eq!(notes.0.lock()[0].message, NOT_FOUND_MESSAGE);
        assert!(!notes.0.lock()[0].is_error);
        assert!(doc
            .meta
            .lock()
            .contains(&("robots".to_string(), "noindex".to_string())));
    }

    #[test]
    fn test_forbidden_login_path_does_not_redirect() {
        let table = RouteTable::new(vec![
            RouteSpec::new("/login", RouteState::modal(Modal::Login)),
            RouteSpec::new("/Admin", RouteState::page(Page::Admin).requires("PRIV_MODERATOR")),
        ]);
        let (mut router, _, _) = router_with(table, &[]);

        let outcome = router.navigate("/Admin");
        assert_eq!(
            outcome,
            NavigationOutcome::Forbidden {
                redirect: Some("/login".into())
            }
        );
        assert_eq!(router.state().current_modal, Modal::Login);
        assert_eq!(router.state().current_page, Page::Events);
    }

    #[test]
    fn test_login_route_validation() {
        let missing = RouteTable::new(vec![RouteSpec::new("/Events", RouteState::page(Page::Events))]);
        let gated = RouteTable::new(vec![RouteSpec::new(
            "/login",
            RouteState::modal(Modal::Login).requires("PRIV_ADMIN"),
        )]);

        let doc: Arc<dyn DocumentHost> = Arc::new(Doc::default());
        let config = CoreConfig::builder()
            .http_client(Arc::new(NoHttp))
            .session(Arc::new(Roles(vec![])))
            .notifications(Arc::new(Notes::default()))
            .document(doc)
            .timers(Arc::new(ManualTimerScheduler::new()))
            .build()
            .unwrap();
        let deps = RouterDeps::from_config(&config, EventBus::default());

        assert!(matches!(
            Router::new(missing, &config, deps.clone()),
            Err(RouterError::LoginRouteMissing { .. })
        ));
        assert!(matches!(
            Router::new(gated, &config, deps),
            Err(RouterError::LoginRouteGated { .. })
        ));
    }

    #[test]
    fn test_on_commit_unknown_route() {
        let (mut router, _, _) = router_with(RouteTable::site(), &[]);
        let hook: CommitHook = Arc::new(|_| {});
        assert!(router.on_commit("/Events", hook.clone()).is_ok());
        assert!(matches!(
            router.on_commit("/Nope", hook),
            Err(RouterError::UnknownRoute(_))
        ));
    }
}

//! Navigation state shared with the UI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::enums::{Modal, Page};
use crate::query::QueryMap;
use crate::slug;

pub const DEFAULT_TITLE: &str = "NestedBird";

/// The matched path: the whole URL plus named segment values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    pub url: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub path: PathInfo,
    pub query: QueryMap,
    pub current_page: Page,
    pub current_modal: Modal,
    pub title: String,
    pub require_authorisation: Option<String>,
    /// Entity shown by the open modal, set by UI code opening modals directly.
    pub modal_item_id: Option<String>,
    pub last_modalless_url: String,
    pub is_mobile: bool,
    /// Incremented on every commit.
    pub sequence: u64,
    /// Route fields without a dedicated slot (`searchQuery`, `submitType`, …).
    pub extra: Map<String, Value>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            path: PathInfo::default(),
            query: QueryMap::new(),
            current_page: Page::Events,
            current_modal: Modal::None,
            title: DEFAULT_TITLE.to_string(),
            require_authorisation: None,
            modal_item_id: None,
            last_modalless_url: "/".to_string(),
            is_mobile: true,
            sequence: 0,
            extra: Map::new(),
        }
    }
}

impl NavigationState {
    pub fn path_id(&self) -> Option<&str> {
        self.path.params.get("id").map(String::as_str)
    }

    pub fn path_name(&self) -> Option<&str> {
        self.path.params.get("name").map(String::as_str)
    }

    /// `path.params["id"]` decoded from its slug.
    pub fn path_id_decoded(&self) -> Option<Uuid> {
        self.path_id().and_then(|id| slug::decode_id(id).ok())
    }

    pub fn has_modal(&self) -> bool {
        self.current_modal != Modal::None
    }

    pub fn extra_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(Value::as_str)
    }
}

//! Navigation state and the history abstraction
//!
//! The app never touches a concrete history. It records states through a
//! [`NavigationService`] and is told about restored states through
//! `App::load_page_from_saved_state`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form key/value data handed to a screen's `on_load`
pub type NavigationData = BTreeMap<String, String>;

/// What gets written into a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub page_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_data: Option<NavigationData>,
}

impl NavigationState {
    pub fn new(page_type_id: impl Into<String>, navigation_data: Option<NavigationData>) -> Self {
        Self {
            page_type_id: page_type_id.into(),
            navigation_data,
        }
    }

    /// The user-visible location fragment for this state, `#/<page_type_id>`
    pub fn fragment(&self) -> String {
        format!("#/{}", urlencoding::encode(&self.page_type_id))
    }
}

/// Build navigation data from string pairs
pub fn navigation_data<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> NavigationData
where
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// History semantics the app relies on
pub trait NavigationService {
    /// Ask the host to go one entry back; the result arrives later as a restore
    fn navigate_backward(&self);

    /// Ask the host to go one entry forward; the result arrives later as a restore
    fn navigate_forward(&self);

    /// Record `state` in a new entry after the current one
    fn push_state(&self, state: NavigationState);

    /// Overwrite the current entry with `state`
    fn replace_state(&self, state: NavigationState);
}

/// History kept in memory that never emits restore events
///
/// Used headless and in tests. Back/forward requests are only counted.
#[derive(Debug, Default)]
pub struct MemoryNavigationService {
    entries: RefCell<Vec<NavigationState>>,
    pushes: Cell<usize>,
    replaces: Cell<usize>,
    back_requests: Cell<usize>,
    forward_requests: Cell<usize>,
}

impl MemoryNavigationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<NavigationState> {
        self.entries.borrow().last().cloned()
    }

    pub fn entries(&self) -> Vec<NavigationState> {
        self.entries.borrow().clone()
    }

    /// Total number of writes (pushes and replaces)
    pub fn writes(&self) -> usize {
        self.pushes.get() + self.replaces.get()
    }

    pub fn pushes(&self) -> usize {
        self.pushes.get()
    }

    pub fn replaces(&self) -> usize {
        self.replaces.get()
    }

    pub fn back_requests(&self) -> usize {
        self.back_requests.get()
    }

    pub fn forward_requests(&self) -> usize {
        self.forward_requests.get()
    }

    pub fn location(&self) -> Option<String> {
        self.current().map(|s| s.fragment())
    }
}

impl NavigationService for MemoryNavigationService {
    fn navigate_backward(&self) {
        self.back_requests.set(self.back_requests.get() + 1);
    }

    fn navigate_forward(&self) {
        self.forward_requests.set(self.forward_requests.get() + 1);
    }

    fn push_state(&self, state: NavigationState) {
        self.pushes.set(self.pushes.get() + 1);
        self.entries.borrow_mut().push(state);
    }

    fn replace_state(&self, state: NavigationState) {
        self.replaces.set(self.replaces.get() + 1);
        let mut entries = self.entries.borrow_mut();
        match entries.last_mut() {
            Some(current) => *current = state,
            None => entries.push(state),
        }
    }
}

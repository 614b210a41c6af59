//! Session history backed by a host
//!
//! [`HistoryNavigationService`] behaves like a browser's session history: a
//! list of entries with a cursor, a location fragment, and restore events when
//! the cursor moves. The history can be persisted to a JSON file so a restarted
//! kiosk comes back to the page it was on.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::app::{App, WeakApp};
use super::navigation::{NavigationService, NavigationState};

/// Notifications from the host history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// The cursor moved to another entry
    PopState(Option<NavigationState>),

    /// The host finished starting up; carries the state of the current entry
    Load(Option<NavigationState>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistorySnapshot {
    entries: Vec<Option<NavigationState>>,
    index: usize,
}

/// Host-backed history with restore events
pub struct HistoryNavigationService {
    history: RefCell<HistorySnapshot>,
    events: UnboundedSender<HistoryEvent>,
    store: Option<PathBuf>,
}

impl HistoryNavigationService {
    /// Create the history, restoring it from `store` when the file exists
    ///
    /// A [`HistoryEvent::Load`] for the current entry is queued right away, the
    /// same way a host that has already loaded fires its load event.
    pub fn new(store: Option<PathBuf>) -> Result<(Self, UnboundedReceiver<HistoryEvent>)> {
        let snapshot = match &store {
            Some(path) if path.exists() => load_snapshot(path)?,
            _ => HistorySnapshot {
                entries: vec![None],
                index: 0,
            },
        };

        let (events, receiver) = unbounded_channel();
        let service = Self {
            history: RefCell::new(snapshot),
            events,
            store,
        };

        service.emit(HistoryEvent::Load(service.state()));
        Ok((service, receiver))
    }

    /// State of the current entry
    pub fn state(&self) -> Option<NavigationState> {
        let history = self.history.borrow();
        history.entries.get(history.index).cloned().flatten()
    }

    /// Location fragment of the current entry, empty when it has no state
    pub fn location(&self) -> String {
        self.state().map(|s| s.fragment()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.history.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> usize {
        self.history.borrow().index
    }

    fn emit(&self, event: HistoryEvent) {
        if self.events.send(event).is_err() {
            debug!("History event dropped, nobody is listening");
        }
    }

    fn traverse(&self, forward: bool) {
        let moved = {
            let mut history = self.history.borrow_mut();
            if forward && history.index + 1 < history.entries.len() {
                history.index += 1;
                true
            } else if !forward && history.index > 0 {
                history.index -= 1;
                true
            } else {
                false
            }
        };

        if moved {
            self.persist();
            self.emit(HistoryEvent::PopState(self.state()));
        } else {
            debug!("History traversal past the {} entry ignored", if forward { "last" } else { "first" });
        }
    }

    fn persist(&self) {
        let Some(path) = &self.store else {
            return;
        };

        let result = serde_json::to_string_pretty(&*self.history.borrow())
            .context("Failed to serialize history")
            .and_then(|json| {
                fs::write(path, json)
                    .with_context(|| format!("Failed to write history file: {:?}", path))
            });

        // Losing persistence must not break navigation
        if let Err(e) = result {
            warn!("{:#}", e);
        }
    }
}

fn load_snapshot(path: &Path) -> Result<HistorySnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {:?}", path))?;
    let mut snapshot: HistorySnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {:?}", path))?;

    if snapshot.entries.is_empty() {
        snapshot.entries.push(None);
    }
    snapshot.index = snapshot.index.min(snapshot.entries.len() - 1);

    debug!(
        "Restored {} history entries from {:?}",
        snapshot.entries.len(),
        path
    );
    Ok(snapshot)
}

impl NavigationService for HistoryNavigationService {
    fn navigate_backward(&self) {
        self.traverse(false);
    }

    fn navigate_forward(&self) {
        self.traverse(true);
    }

    fn push_state(&self, state: NavigationState) {
        {
            let mut history = self.history.borrow_mut();
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(Some(state));
            history.index = keep;
        }
        debug!("History push, location now {}", self.location());
        self.persist();
    }

    fn replace_state(&self, state: NavigationState) {
        {
            let mut history = self.history.borrow_mut();
            let index = history.index;
            history.entries[index] = Some(state);
        }
        debug!("History replace, location now {}", self.location());
        self.persist();
    }
}

/// Feeds host history events into the app
///
/// The first load event only counts if no pop arrived before it. Each restore
/// runs on its own local task so a newer one can cancel an older one.
pub struct HistoryListener {
    app: WeakApp,
    had_initial_pop: bool,
}

impl HistoryListener {
    pub fn new(app: &App) -> Self {
        Self {
            app: app.downgrade(),
            had_initial_pop: false,
        }
    }

    /// Decide whether an event should restore a page, and with which state
    pub fn accept(&mut self, event: HistoryEvent) -> Option<Option<NavigationState>> {
        match event {
            HistoryEvent::PopState(state) => {
                self.had_initial_pop = true;
                Some(state)
            }
            HistoryEvent::Load(state) => {
                if self.had_initial_pop {
                    debug!("Ignoring load event after an earlier pop");
                    None
                } else {
                    self.had_initial_pop = true;
                    Some(state)
                }
            }
        }
    }

    /// Drain `events` until the channel closes or the app is gone
    ///
    /// Must run inside a `tokio::task::LocalSet`.
    pub async fn run(mut self, mut events: UnboundedReceiver<HistoryEvent>) {
        while let Some(event) = events.recv().await {
            let Some(state) = self.accept(event) else {
                continue;
            };
            let Some(app) = self.app.upgrade() else {
                break;
            };

            tokio::task::spawn_local(async move {
                if let Err(e) = app.load_page_from_saved_state(state).await {
                    error!("Failed to restore page from history: {:#}", e);
                }
            });
        }
        info!("History listener stopped");
    }
}

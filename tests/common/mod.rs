//! Shared harness for the integration tests
//!
//! Every screen here writes what happens to it into one shared log, so tests
//! can assert the order of lifecycle hooks across pages and overlays.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::oneshot;

use checkin_kiosk::spa::app::APP_ROOT_CLASS;
use checkin_kiosk::spa::{
    App, Content, Element, LoadingScreen, LoadingScreenType, MemoryNavigationService,
    NavigationData, Screen, ScreenState, ScreenType, Surface, UnloadDecision,
};

pub type Log = Rc<RefCell<Vec<String>>>;

type Gates = Rc<RefCell<HashMap<String, oneshot::Receiver<()>>>>;

/// A page or overlay that records its lifecycle
pub struct Probe {
    pub name: String,
    log: Log,
    veto: Cell<bool>,
    received: RefCell<Option<NavigationData>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    autofocus: bool,
    state: Cell<ScreenState>,
}

impl Probe {
    pub fn state(&self) -> ScreenState {
        self.state.get()
    }

    pub fn set_veto(&self, veto: bool) {
        self.veto.set(veto);
    }

    pub fn received(&self) -> Option<NavigationData> {
        self.received.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Screen for Probe {
    async fn on_load(&self, data: Option<&NavigationData>) -> Result<()> {
        self.log.borrow_mut().push(format!("load:{}", self.name));
        self.state.set(ScreenState::Loading);
        *self.received.borrow_mut() = data.cloned();

        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.state.set(ScreenState::Mounted);
        Ok(())
    }

    async fn on_unload(&self) -> Result<UnloadDecision> {
        self.log.borrow_mut().push(format!("unload:{}", self.name));
        if self.veto.get() {
            return Ok(UnloadDecision::Veto);
        }
        self.state.set(ScreenState::Unloaded);
        Ok(UnloadDecision::Proceed)
    }

    async fn render(&self) -> Result<Content> {
        if self.state.get() != ScreenState::Mounted {
            self.log.borrow_mut().push(format!("early-render:{}", self.name));
        }
        self.log.borrow_mut().push(format!("render:{}", self.name));
        let mut body = Element::div().child(Element::p(self.name.clone()));
        if self.autofocus {
            body = body.child(Element::new("button").text("OK").autofocus());
        }
        Ok(body.into())
    }
}

/// Loading overlay that records when it is created
pub struct StatusProbe {
    status: RefCell<Option<String>>,
}

#[async_trait(?Send)]
impl Screen for StatusProbe {
    async fn render(&self) -> Result<Content> {
        let status = self.status.borrow().clone().unwrap_or_default();
        Ok(Element::p(status).classes("status").into())
    }
}

impl LoadingScreen for StatusProbe {
    fn set_status_text(&self, text: &str) {
        *self.status.borrow_mut() = Some(text.to_string());
    }
}

pub struct Harness {
    pub surface: Rc<Surface>,
    pub navigation: Rc<MemoryNavigationService>,
    pub app: App,
    pub log: Log,
    created: Rc<RefCell<Vec<Rc<Probe>>>>,
    gates: Gates,
}

impl Harness {
    /// Pages A (home), B and C; overlays "note" and "focus"; a loading overlay
    pub fn new() -> Self {
        let surface = Rc::new(Surface::new(APP_ROOT_CLASS));
        let navigation = Rc::new(MemoryNavigationService::new());
        let app = App::new(surface.clone(), navigation.clone());

        let harness = Self {
            surface,
            navigation,
            app,
            log: Rc::new(RefCell::new(Vec::new())),
            created: Rc::new(RefCell::new(Vec::new())),
            gates: Rc::new(RefCell::new(HashMap::new())),
        };

        harness.app.register_page_types(["A", "B", "C"].map(|id| harness.probe_type(id, false)));
        harness
            .app
            .register_overlay_types([harness.probe_type("note", false), harness.probe_type("focus", true)]);
        if let Some(home) = harness.app.page_type("A") {
            harness.app.set_home_page_type(home);
        }

        let log = Rc::clone(&harness.log);
        harness
            .app
            .set_loading_overlay_type(LoadingScreenType::new("loading", move |_: &App| {
                log.borrow_mut().push("create:loading".to_string());
                Ok(Rc::new(StatusProbe {
                    status: RefCell::new(None),
                }) as Rc<dyn LoadingScreen>)
            }));

        harness
    }

    /// A screen type whose instances are recorded and logged
    pub fn probe_type(&self, type_id: &str, autofocus: bool) -> ScreenType {
        let log = Rc::clone(&self.log);
        let created = Rc::clone(&self.created);
        let gates = Rc::clone(&self.gates);
        let name = type_id.to_string();

        ScreenType::new(type_id, move |_: &App| {
            log.borrow_mut().push(format!("create:{}", name));
            let probe = Rc::new(Probe {
                name: name.clone(),
                log: Rc::clone(&log),
                veto: Cell::new(false),
                received: RefCell::new(None),
                gate: RefCell::new(gates.borrow_mut().remove(&name)),
                autofocus,
                state: Cell::new(ScreenState::Unloaded),
            });
            created.borrow_mut().push(Rc::clone(&probe));
            Ok(probe as Rc<dyn Screen>)
        })
    }

    /// Make the next instance of `type_id` block in `on_load` until the sender fires
    pub fn gate(&self, type_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(type_id.to_string(), rx);
        tx
    }

    /// Most recently created instance with the given name
    pub fn last(&self, name: &str) -> Option<Rc<Probe>> {
        self.created
            .borrow()
            .iter()
            .rev()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn current_name(&self) -> Option<String> {
        let current = self.app.current_page()?;
        self.created
            .borrow()
            .iter()
            .find(|p| checkin_kiosk::spa::same_screen(&(Rc::clone(p) as Rc<dyn Screen>), &current))
            .map(|p| p.name.clone())
    }

    pub fn logged(&self, entry: &str) -> bool {
        self.log.borrow().iter().any(|e| e == entry)
    }

    pub fn entries(&self, prefix: &str) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

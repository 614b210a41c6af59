use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use anyhow::Result;
use log::{debug, info, warn};

use super::error::{ScreenKind, SpaError};
use super::job::{JobManager, JobToken};
use super::navigation::{NavigationData, NavigationService, NavigationState};
use super::screen::{LoadingScreen, LoadingScreenType, Screen, ScreenType, UnloadDecision};
use super::screen_manager::ScreenManager;
use super::screen_stack::ScreenStackManager;
use super::surface::RenderTarget;

/// Class of the app's root node
pub const APP_ROOT_CLASS: &str = "spa-app-root";
pub const PAGE_NAMESPACE: &str = "spa-page";
pub const OVERLAY_NAMESPACE: &str = "spa-overlay";
pub const LOADING_NAMESPACE: &str = "spa-loading";

/// The page a navigation should end up on
pub enum PageTarget<'a> {
    /// Look the type up in the page registry
    Id(&'a str),

    /// Use this type directly
    Type(ScreenType),
}

impl<'a> From<&'a str> for PageTarget<'a> {
    fn from(id: &'a str) -> Self {
        PageTarget::Id(id)
    }
}

impl From<ScreenType> for PageTarget<'_> {
    fn from(page_type: ScreenType) -> Self {
        PageTarget::Type(page_type)
    }
}

/// How a finished navigation is recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryWrite {
    Push,
    Replace,
}

/// How a navigation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The new page is mounted
    Completed,

    /// The current page refused to unload
    Vetoed,

    /// A newer navigation took over
    Superseded,
}

struct AppInner {
    navigation: RefCell<Rc<dyn NavigationService>>,
    page_types: RefCell<HashMap<String, ScreenType>>,
    overlay_types: RefCell<HashMap<String, ScreenType>>,
    home_page_type: RefCell<Option<ScreenType>>,
    loading_overlay_type: RefCell<Option<LoadingScreenType>>,
    current_page: ScreenManager<dyn Screen>,
    overlays: ScreenStackManager<dyn Screen>,
    loading_overlay: ScreenManager<dyn LoadingScreen>,
    navigation_jobs: JobManager,
}

/// Owns the pages and overlays of one render target and moves between them
///
/// `App` is a cheap handle; clones share the same state. Screens that need the
/// app should keep a [`WeakApp`] to avoid a reference cycle.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

/// Non-owning handle to an [`App`]
#[derive(Clone)]
pub struct WeakApp {
    inner: Weak<AppInner>,
}

impl WeakApp {
    pub fn upgrade(&self) -> Option<App> {
        self.inner.upgrade().map(|inner| App { inner })
    }
}

impl App {
    /// Create an app on `target`, recording history through `navigation`
    ///
    /// Page, overlay and loading containers are created in that order, so
    /// overlays stack above the page and the loading overlay above both.
    pub fn new(target: Rc<dyn RenderTarget>, navigation: Rc<dyn NavigationService>) -> Self {
        let root = target.root();

        let current_page = ScreenManager::new(Rc::clone(&target), root, PAGE_NAMESPACE);
        let overlays = ScreenStackManager::new(Rc::clone(&target), root, OVERLAY_NAMESPACE);
        let loading_overlay = ScreenManager::new(Rc::clone(&target), root, LOADING_NAMESPACE);

        Self {
            inner: Rc::new(AppInner {
                navigation: RefCell::new(navigation),
                page_types: RefCell::new(HashMap::new()),
                overlay_types: RefCell::new(HashMap::new()),
                home_page_type: RefCell::new(None),
                loading_overlay_type: RefCell::new(None),
                current_page,
                overlays,
                loading_overlay,
                navigation_jobs: JobManager::new(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakApp {
        WeakApp {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Swap the history backend
    pub fn set_navigation_service(&self, navigation: Rc<dyn NavigationService>) {
        *self.inner.navigation.borrow_mut() = navigation;
    }

    pub fn register_page_types(&self, page_types: impl IntoIterator<Item = ScreenType>) {
        let mut registry = self.inner.page_types.borrow_mut();
        for page_type in page_types {
            debug!("Registered page type '{}'", page_type.type_id());
            registry.insert(page_type.type_id().to_string(), page_type);
        }
    }

    pub fn register_overlay_types(&self, overlay_types: impl IntoIterator<Item = ScreenType>) {
        let mut registry = self.inner.overlay_types.borrow_mut();
        for overlay_type in overlay_types {
            debug!("Registered overlay type '{}'", overlay_type.type_id());
            registry.insert(overlay_type.type_id().to_string(), overlay_type);
        }
    }

    pub fn set_home_page_type(&self, page_type: ScreenType) {
        *self.inner.home_page_type.borrow_mut() = Some(page_type);
    }

    pub fn set_loading_overlay_type(&self, overlay_type: LoadingScreenType) {
        *self.inner.loading_overlay_type.borrow_mut() = Some(overlay_type);
    }

    pub fn page_type(&self, type_id: &str) -> Option<ScreenType> {
        self.inner.page_types.borrow().get(type_id).cloned()
    }

    pub fn overlay_type(&self, type_id: &str) -> Option<ScreenType> {
        self.inner.overlay_types.borrow().get(type_id).cloned()
    }

    pub fn current_page(&self) -> Option<Rc<dyn Screen>> {
        self.inner.current_page.get()
    }

    /// Overlays from bottom to top
    pub fn overlays(&self) -> Vec<Rc<dyn Screen>> {
        self.inner.overlays.get_all()
    }

    pub fn has_overlay(&self, overlay: &Rc<dyn Screen>) -> bool {
        self.inner.overlays.has(overlay)
    }

    pub fn loading_overlay(&self) -> Option<Rc<dyn LoadingScreen>> {
        self.inner.loading_overlay.get()
    }

    /// Whether a navigation is still in flight
    pub fn is_navigating(&self) -> bool {
        self.inner.navigation_jobs.running_jobs() > 0
    }

    /// Mount the loading overlay if it isn't up yet, then show `status` on it
    ///
    /// Does nothing when no loading overlay type is configured.
    pub async fn show_loading_overlay(&self, status: Option<&str>) -> Result<()> {
        let mut overlay = self.inner.loading_overlay.get();

        if overlay.is_none() {
            let overlay_type = self.inner.loading_overlay_type.borrow().clone();
            if let Some(overlay_type) = overlay_type {
                let created = overlay_type.create(self)?;
                created.on_load(None).await?;

                // A concurrent call may have mounted one while we were loading
                match self.inner.loading_overlay.get() {
                    Some(existing) => {
                        created.on_unload().await?;
                        overlay = Some(existing);
                    }
                    None => {
                        self.inner.loading_overlay.set(Rc::clone(&created)).await?;
                        debug!("Loading overlay shown");
                        overlay = Some(created);
                    }
                }
            }
        }

        if let (Some(overlay), Some(status)) = (overlay, status) {
            overlay.set_status_text(status);
            self.inner.loading_overlay.refresh().await?;
        }

        Ok(())
    }

    /// Unload and unmount the loading overlay, if one is up
    pub async fn hide_loading_overlay(&self) -> Result<()> {
        if let Some(overlay) = self.inner.loading_overlay.get() {
            overlay.on_unload().await?;

            // Only clear the slot if nobody replaced the overlay while it unloaded
            let still_mounted = self
                .inner
                .loading_overlay
                .get()
                .is_some_and(|current| super::screen::same_screen(&current, &overlay));
            if still_mounted {
                self.inner.loading_overlay.clear();
                debug!("Loading overlay hidden");
            }
        }
        Ok(())
    }

    /// Update the status of the mounted loading overlay; no-op when none is up
    pub async fn set_loading_status(&self, status: &str) -> Result<()> {
        if let Some(overlay) = self.inner.loading_overlay.get() {
            overlay.set_status_text(status);
            self.inner.loading_overlay.refresh().await?;
        }
        Ok(())
    }

    /// Create, load and stack an overlay of the given type
    pub async fn add_overlay(
        &self,
        overlay_type_id: &str,
        data: Option<NavigationData>,
    ) -> Result<Rc<dyn Screen>> {
        let overlay_type = self
            .overlay_type(overlay_type_id)
            .ok_or_else(|| SpaError::not_found(ScreenKind::Overlay, overlay_type_id))?;

        let overlay = overlay_type.create(self)?;
        overlay.on_load(data.as_ref()).await?;
        self.inner.overlays.add(Rc::clone(&overlay)).await?;

        debug!("Overlay '{}' added", overlay_type_id);
        Ok(overlay)
    }

    /// Unload and unmount `overlay`; no-op if it isn't stacked
    ///
    /// The overlay can't veto its own removal.
    pub async fn remove_overlay(&self, overlay: &Rc<dyn Screen>) -> Result<()> {
        if self.inner.overlays.has(overlay) {
            if overlay.on_unload().await? == UnloadDecision::Veto {
                debug!("Ignoring veto from an overlay being removed");
            }
            self.inner.overlays.remove(overlay);
        }
        Ok(())
    }

    /// Unload every overlay from top to bottom, then unmount them all
    pub async fn clear_overlays(&self) -> Result<()> {
        let overlays = self.inner.overlays.get_all();

        for overlay in overlays.iter().rev() {
            overlay.on_unload().await?;
        }

        self.inner.overlays.clear();
        Ok(())
    }

    pub fn navigate_backward(&self) {
        let navigation = Rc::clone(&*self.inner.navigation.borrow());
        navigation.navigate_backward();
    }

    pub fn navigate_forward(&self) {
        let navigation = Rc::clone(&*self.inner.navigation.borrow());
        navigation.navigate_forward();
    }

    /// Navigate to a page, adding a history entry
    pub async fn navigate_to(
        &self,
        page_type_id: &str,
        data: Option<NavigationData>,
    ) -> Result<NavigationOutcome> {
        self.navigate(PageTarget::Id(page_type_id), data, HistoryWrite::Push)
            .await
    }

    /// Navigate to a page, replacing the current history entry
    pub async fn navigate_in_place(
        &self,
        page_type_id: &str,
        data: Option<NavigationData>,
    ) -> Result<NavigationOutcome> {
        self.navigate(PageTarget::Id(page_type_id), data, HistoryWrite::Replace)
            .await
    }

    /// Navigate to a page given by id or type, adding a history entry
    pub async fn navigate_to_target(
        &self,
        target: PageTarget<'_>,
        data: Option<NavigationData>,
    ) -> Result<NavigationOutcome> {
        self.navigate(target, data, HistoryWrite::Push).await
    }

    /// Restore a page from a saved history state
    ///
    /// Without a state, or with one naming a page that is no longer
    /// registered, the app goes to its home page if it has one.
    pub async fn load_page_from_saved_state(
        &self,
        state: Option<NavigationState>,
    ) -> Result<Option<NavigationOutcome>> {
        let state = state.filter(|state| {
            let known = self.page_type(&state.page_type_id).is_some();
            if !known && self.inner.home_page_type.borrow().is_some() {
                warn!(
                    "Saved page '{}' is not registered, going to the home page",
                    state.page_type_id
                );
                return false;
            }
            true
        });

        match state {
            Some(state) => {
                debug!("Restoring page '{}' from saved state", state.page_type_id);
                let outcome = self
                    .navigate(
                        PageTarget::Id(&state.page_type_id),
                        state.navigation_data,
                        HistoryWrite::Replace,
                    )
                    .await?;
                Ok(Some(outcome))
            }
            None => {
                let home = self.inner.home_page_type.borrow().clone();
                match home {
                    Some(home) => {
                        debug!("No saved state, going to home page '{}'", home.type_id());
                        let outcome = self
                            .navigate(PageTarget::Type(home), None, HistoryWrite::Replace)
                            .await?;
                        Ok(Some(outcome))
                    }
                    None => {
                        warn!("No saved state and no home page configured");
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn navigate(
        &self,
        target: PageTarget<'_>,
        data: Option<NavigationData>,
        write: HistoryWrite,
    ) -> Result<NavigationOutcome> {
        // Dropping the guard ends the job on every path out of here
        let job = self.inner.navigation_jobs.begin();
        let token = job.token();

        let page_type = match target {
            PageTarget::Id(id) => self
                .page_type(id)
                .ok_or_else(|| SpaError::not_found(ScreenKind::Page, id))?,
            PageTarget::Type(page_type) => page_type,
        };
        let type_id = page_type.type_id().to_string();
        debug!("Navigating to '{}' ({:?})", type_id, write);

        if let Some(current) = self.inner.current_page.get() {
            if current.on_unload().await? == UnloadDecision::Veto {
                token.cancel();
                warn!("Navigation to '{}' vetoed by the current page", type_id);
                return Ok(NavigationOutcome::Vetoed);
            }
            self.inner.current_page.clear();
        }
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        self.clear_overlays().await?;
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        self.show_loading_overlay(None).await?;
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        let page = page_type.create(self)?;
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        page.on_load(data.as_ref()).await?;
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        let state = NavigationState::new(type_id.clone(), data);
        let navigation = Rc::clone(&*self.inner.navigation.borrow());
        match write {
            HistoryWrite::Push => navigation.push_state(state),
            HistoryWrite::Replace => navigation.replace_state(state),
        }

        self.inner.current_page.set(page).await?;
        if superseded(token, &type_id) {
            return Ok(NavigationOutcome::Superseded);
        }

        self.hide_loading_overlay().await?;

        info!("Navigated to '{}'", type_id);
        Ok(NavigationOutcome::Completed)
    }
}

fn superseded(token: &JobToken, type_id: &str) -> bool {
    if token.is_canceled() {
        debug!("Navigation to '{}' superseded by a newer one", type_id);
        return true;
    }
    false
}

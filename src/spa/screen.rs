//! The screen lifecycle contract
//!
//! Pages, overlays and loading overlays all implement [`Screen`]. A screen is
//! created by its [`ScreenType`] factory, loaded, rendered into a manager,
//! unloaded and then dropped by whoever held it last.

use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use async_trait::async_trait;

use super::app::App;
use super::content::Content;
use super::navigation::NavigationData;

/// Outcome of `Screen::on_unload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnloadDecision {
    /// The screen is done and may be unmounted
    #[default]
    Proceed,

    /// Keep the screen; aborts a navigation in progress
    Veto,
}

/// Where a screen is in its lifecycle
///
/// Managers don't track this themselves; screens that care (and tests) use it
/// to assert the order of hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenState {
    #[default]
    Unloaded,
    Loading,
    Mounted,
    Unloading,
}

/// A page or overlay that can be mounted into the app
///
/// All hooks run on the app's single-threaded executor. `render` may be called
/// more than once and must not change anything outside the screen.
#[async_trait(?Send)]
pub trait Screen {
    /// Async setup, always finished before the first `render`
    async fn on_load(&self, _data: Option<&NavigationData>) -> Result<()> {
        Ok(())
    }

    /// Teardown, always run before the screen is unmounted
    ///
    /// Returning [`UnloadDecision::Veto`] keeps the screen. Only page
    /// navigation honors the veto; overlay removal always goes through.
    async fn on_unload(&self) -> Result<UnloadDecision> {
        Ok(UnloadDecision::Proceed)
    }

    async fn render(&self) -> Result<Content>;
}

/// A screen shown while a navigation is in progress
pub trait LoadingScreen: Screen {
    /// Update the status line shown to the user
    fn set_status_text(&self, text: &str);
}

type Factory<S> = dyn Fn(&App) -> Result<Rc<S>>;

/// A named factory for one kind of screen
///
/// `S` is `dyn Screen` for pages and overlays and `dyn LoadingScreen` for the
/// loading overlay.
pub struct ScreenType<S: ?Sized = dyn Screen> {
    type_id: Rc<str>,
    factory: Rc<Factory<S>>,
}

/// Factory type for the loading overlay slot
pub type LoadingScreenType = ScreenType<dyn LoadingScreen>;

impl<S: ?Sized> ScreenType<S> {
    pub fn new<F>(type_id: &str, factory: F) -> Self
    where
        F: Fn(&App) -> Result<Rc<S>> + 'static,
    {
        Self {
            type_id: Rc::from(type_id),
            factory: Rc::new(factory),
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Build a fresh, unloaded instance
    pub fn create(&self, app: &App) -> Result<Rc<S>> {
        (self.factory)(app)
    }
}

impl<S: ?Sized> Clone for ScreenType<S> {
    fn clone(&self) -> Self {
        Self {
            type_id: Rc::clone(&self.type_id),
            factory: Rc::clone(&self.factory),
        }
    }
}

impl<S: ?Sized> fmt::Debug for ScreenType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenType").field("type_id", &self.type_id).finish()
    }
}

/// Identity comparison for shared screens
pub fn same_screen<S: ?Sized>(a: &Rc<S>, b: &Rc<S>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

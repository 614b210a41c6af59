//! Single-page navigation framework
//!
//! An [`App`] owns one current page, a stack of overlays and a loading overlay,
//! all mounted on a [`RenderTarget`]. Navigation runs under a [`JobManager`] so
//! a newer navigation cancels an older one at its next await point.

pub mod app;
pub mod content;
pub mod error;
pub mod history;
pub mod job;
pub mod navigation;
pub mod screen;
pub mod screen_manager;
pub mod screen_stack;
pub mod surface;

pub use app::{App, NavigationOutcome, PageTarget, WeakApp};
pub use content::{Content, Element, to_css_class};
pub use error::{ScreenKind, SpaError};
pub use history::{HistoryEvent, HistoryListener, HistoryNavigationService};
pub use job::{JobGuard, JobManager, JobToken};
pub use navigation::{
    MemoryNavigationService, NavigationData, NavigationService, NavigationState, navigation_data,
};
pub use screen::{
    LoadingScreen, LoadingScreenType, Screen, ScreenState, ScreenType, UnloadDecision, same_screen,
};
pub use screen_manager::ScreenManager;
pub use screen_stack::ScreenStackManager;
pub use surface::{NodeId, RenderTarget, Surface};

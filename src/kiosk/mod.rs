//! The contactless check-in screens and how they are wired into an [`App`]

pub mod loading;
pub mod printing;
pub mod setup;

use std::rc::Rc;
use std::time::Duration;

use log::info;

use crate::config::KioskConfig;
use crate::services::{FrameSource, QrDecoder};
use crate::spa::{App, LoadingScreen, LoadingScreenType, Screen, ScreenType};

pub use loading::LoadingOverlay;
pub use printing::PrintingOverlay;
pub use setup::SetupPage;

/// Collaborators the kiosk screens are built with
#[derive(Clone)]
pub struct KioskServices {
    pub frames: Rc<dyn FrameSource>,
    pub decoder: Rc<dyn QrDecoder>,
    pub scan_interval: Duration,
    pub print_dwell: Duration,
}

impl KioskServices {
    pub fn from_config(
        config: &KioskConfig,
        frames: Rc<dyn FrameSource>,
        decoder: Rc<dyn QrDecoder>,
    ) -> Self {
        Self {
            frames,
            decoder,
            scan_interval: config.scan_interval(),
            print_dwell: config.print_dwell(),
        }
    }
}

fn loading_overlay_type() -> ScreenType {
    ScreenType::new(LoadingOverlay::TYPE_ID, |_app: &App| {
        Ok(Rc::new(LoadingOverlay::new()) as Rc<dyn Screen>)
    })
}

/// Register the check-in pages and overlays and pick the home page
pub fn configure_app(app: &App, services: &KioskServices) {
    let setup_services = services.clone();
    let setup = ScreenType::new(SetupPage::TYPE_ID, move |app: &App| {
        Ok(Rc::new(SetupPage::new(app, &setup_services)) as Rc<dyn Screen>)
    });

    let printing = ScreenType::new(PrintingOverlay::TYPE_ID, |_app: &App| {
        Ok(Rc::new(PrintingOverlay::new()) as Rc<dyn Screen>)
    });

    app.register_page_types([setup.clone()]);
    app.register_overlay_types([loading_overlay_type(), printing]);
    app.set_home_page_type(setup);
    app.set_loading_overlay_type(LoadingScreenType::new(
        LoadingOverlay::TYPE_ID,
        |_app: &App| Ok(Rc::new(LoadingOverlay::new()) as Rc<dyn LoadingScreen>),
    ));

    info!("Check-in screens registered");
}

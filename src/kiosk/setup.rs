use std::cell::Cell;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info};

use super::KioskServices;
use super::printing::{CODE_KEY, LABELS_KEY, PrintingOverlay};
use crate::services::{HandlerId, QrCameraService, QrCode, parse_labels};
use crate::spa::{
    App, Content, Element, NavigationData, Screen, UnloadDecision, WeakApp, navigation_data,
};

/// Home page: instructions plus the live scanner
pub struct SetupPage {
    app: WeakApp,
    camera: QrCameraService,
    print_dwell: Duration,
    scan_handler: Cell<Option<HandlerId>>,
}

impl SetupPage {
    pub const TYPE_ID: &'static str = "setup";

    pub fn new(app: &App, services: &KioskServices) -> Self {
        Self {
            app: app.downgrade(),
            camera: QrCameraService::new(
                services.frames.clone(),
                services.decoder.clone(),
                services.scan_interval,
            ),
            print_dwell: services.print_dwell,
            scan_handler: Cell::new(None),
        }
    }

    pub fn camera(&self) -> &QrCameraService {
        &self.camera
    }

    fn subscribe(&self) {
        if self.scan_handler.get().is_some() {
            return;
        }

        let app = self.app.clone();
        let camera = self.camera.clone();
        let dwell = self.print_dwell;
        let id = self.camera.on_scan(move |code: &QrCode| {
            // No more scans until this one has printed
            camera.pause();

            let app = app.clone();
            let camera = camera.clone();
            let payload = code.data.clone();
            tokio::task::spawn_local(async move {
                if let Err(e) = print_tags(&app, &payload, dwell).await {
                    error!("Printing failed: {:#}", e);
                }
                camera.resume();
            });
        });
        self.scan_handler.set(Some(id));
    }

    fn unsubscribe(&self) {
        if let Some(id) = self.scan_handler.take() {
            self.camera.off_scan(id);
        }
    }
}

impl Drop for SetupPage {
    fn drop(&mut self) {
        // The handler holds the camera; unregistering breaks the cycle
        self.unsubscribe();
    }
}

/// Show the printing overlay for `dwell`, then take it down
async fn print_tags(app: &WeakApp, payload: &str, dwell: Duration) -> Result<()> {
    let Some(app) = app.upgrade() else {
        return Ok(());
    };

    let mut data = navigation_data([(CODE_KEY, payload)]);
    match parse_labels(payload) {
        Ok(labels) => {
            info!("Printing {} labels", labels.len());
            data.insert(LABELS_KEY.to_string(), labels.len().to_string());
        }
        Err(e) => debug!("Scan is not a label list, printing by code: {:#}", e),
    }

    let overlay = app.add_overlay(PrintingOverlay::TYPE_ID, Some(data)).await?;
    tokio::time::sleep(dwell).await;
    app.remove_overlay(&overlay).await
}

#[async_trait(?Send)]
impl Screen for SetupPage {
    async fn on_load(&self, _data: Option<&NavigationData>) -> Result<()> {
        self.subscribe();
        self.camera.start().await
    }

    async fn on_unload(&self) -> Result<UnloadDecision> {
        self.camera.stop();
        self.unsubscribe();
        Ok(UnloadDecision::Proceed)
    }

    async fn render(&self) -> Result<Content> {
        let instructions = Element::div()
            .classes("flex flex-column padding-3 divider-right")
            .child(Element::h2("Step 1: Check in on your phone.").classes("text-center"))
            .child(
                Element::div()
                    .classes("fill-parent flex flex-center")
                    .child(Element::img("assets/images/phone-checkin.svg")),
            );

        let scanner = Element::div()
            .classes("flex flex-column padding-3")
            .child(Element::h2("Step 2: Scan to print check-in tags.").classes("text-center"))
            .child(
                Element::div()
                    .classes("fill-parent overlay-container")
                    .child(
                        Element::div()
                            .classes("fill-parent overlay flex flex-center")
                            .child(Element::new("video").classes("scanner-border")),
                    )
                    .child(
                        Element::div()
                            .classes("fill-parent overlay flex flex-center")
                            .child(Element::new("canvas").classes("scanner-border scan-overlay")),
                    ),
            );

        Ok(Element::div()
            .classes("fill-parent grid grid-equal-columns bg-white")
            .child(instructions)
            .child(scanner)
            .into())
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::rc::Rc;
use tokio::task::LocalSet;

use checkin_kiosk::cli::Cli;
use checkin_kiosk::config::KioskConfig;
use checkin_kiosk::kiosk::{self, KioskServices};
use checkin_kiosk::services::{ChannelFrameSource, TextPayloadDecoder};
use checkin_kiosk::spa::app::APP_ROOT_CLASS;
use checkin_kiosk::spa::{App, HistoryListener, HistoryNavigationService, Surface};
use checkin_kiosk::ui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = KioskConfig::load(cli.config.as_deref())?;

    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file: {:?}", config.log_file))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Starting checkin-kiosk");

    // Screens are Rc-based, everything runs on this thread
    LocalSet::new().run_until(run(cli.headless, config)).await
}

async fn run(headless: bool, config: KioskConfig) -> Result<()> {
    let surface = Rc::new(Surface::new(APP_ROOT_CLASS));
    let (history, history_events) = HistoryNavigationService::new(config.history_file.clone())?;
    let app = App::new(surface.clone(), Rc::new(history));

    let (frames, frame_sender) = ChannelFrameSource::new();
    let services =
        KioskServices::from_config(&config, Rc::new(frames), Rc::new(TextPayloadDecoder));
    kiosk::configure_app(&app, &services);

    let listener = tokio::task::spawn_local(HistoryListener::new(&app).run(history_events));

    let result = if headless {
        ui::run_headless(&app, &surface, &frame_sender).await
    } else {
        ui::run_terminal(&app, &surface, &frame_sender).await
    };

    listener.abort();
    info!("Shutting down");
    result
}

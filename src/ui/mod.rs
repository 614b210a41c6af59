//! Terminal presentation of the kiosk
//!
//! The app mounts screens onto a [`Surface`]; this module reads the surface back
//! as a list of visible layers and shows them, either with ratatui or as plain
//! text on stdout for headless runs.

pub mod input;
pub mod terminal;

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use crate::services::ImageFrame;
use crate::spa::app::{LOADING_NAMESPACE, OVERLAY_NAMESPACE, PAGE_NAMESPACE};
use crate::spa::{App, RenderTarget, ScreenKind, Surface, to_css_class};

pub use input::{KioskAction, ScanBuffer};
pub use terminal::run_terminal;

/// One mounted screen as the presenter sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub kind: ScreenKind,
    pub lines: Vec<String>,
}

/// Visible screens from bottom to top: page, overlays, loading overlay
pub fn visible_layers(surface: &Surface) -> Vec<Layer> {
    let slots = [
        (ScreenKind::Page, PAGE_NAMESPACE),
        (ScreenKind::Overlay, OVERLAY_NAMESPACE),
        (ScreenKind::Loading, LOADING_NAMESPACE),
    ];

    let mut layers = Vec::new();
    for (kind, namespace) in slots {
        let class = format!("{}s-root", to_css_class(namespace));
        let Some(container) = surface.find_child_by_class(surface.root(), &class) else {
            continue;
        };
        if surface.is_hidden(container) {
            continue;
        }

        for node in surface.children(container) {
            if let Some(element) = surface.element(node) {
                layers.push(Layer {
                    kind,
                    lines: element.text_content(),
                });
            }
        }
    }
    layers
}

fn submit_scan(frames: &UnboundedSender<ImageFrame>, payload: &str) {
    if frames.send(ImageFrame::from_text(payload)).is_err() {
        warn!("Scan dropped, the frame source is gone");
    }
}

/// Apply one input action; returns false when the kiosk should quit
pub fn dispatch(app: &App, frames: &UnboundedSender<ImageFrame>, action: KioskAction) -> bool {
    match action {
        KioskAction::None => {}
        KioskAction::Scan(payload) => submit_scan(frames, &payload),
        KioskAction::Back => app.navigate_backward(),
        KioskAction::Forward => app.navigate_forward(),
        KioskAction::Quit => return false,
    }
    true
}

/// Read scans and commands from stdin, printing the screen whenever it changes
///
/// Lines `:back`, `:forward` and `:quit` are commands; any other non-empty line
/// is a scan payload.
pub async fn run_headless(
    app: &App,
    surface: &Surface,
    frames: &UnboundedSender<ImageFrame>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut shown_revision = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Stdin closed, leaving");
                    break;
                };
                let action = match line.trim() {
                    "" => KioskAction::None,
                    ":back" => KioskAction::Back,
                    ":forward" => KioskAction::Forward,
                    ":quit" => KioskAction::Quit,
                    payload => KioskAction::Scan(payload.to_string()),
                };
                if !dispatch(app, frames, action) {
                    break;
                }
            }
            _ = ticker.tick() => {
                let revision = surface.revision();
                if shown_revision != Some(revision) {
                    shown_revision = Some(revision);
                    print_layers(&visible_layers(surface));
                }
            }
        }
    }
    Ok(())
}

fn print_layers(layers: &[Layer]) {
    println!("----");
    for layer in layers {
        println!("[{}] {}", layer.kind, layer.lines.join(" | "));
    }
}

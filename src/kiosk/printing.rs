use std::cell::Cell;

use anyhow::Result;
use async_trait::async_trait;

use crate::spa::{Content, Element, NavigationData, Screen};

/// Navigation data key holding the scanned payload
pub const CODE_KEY: &str = "code";
/// Navigation data key holding the number of labels being printed
pub const LABELS_KEY: &str = "labels";

/// Shown while check-in tags print
#[derive(Debug, Default)]
pub struct PrintingOverlay {
    label_count: Cell<Option<usize>>,
}

impl PrintingOverlay {
    pub const TYPE_ID: &'static str = "printing";

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Screen for PrintingOverlay {
    async fn on_load(&self, data: Option<&NavigationData>) -> Result<()> {
        let count = data
            .and_then(|d| d.get(LABELS_KEY))
            .and_then(|v| v.parse::<usize>().ok());
        self.label_count.set(count);
        Ok(())
    }

    async fn render(&self) -> Result<Content> {
        let mut panel = Element::div()
            .classes("bg-white flex flex-column flex-center printing-panel")
            .child(Element::img("assets/images/printing.svg"))
            .child(Element::h1("Printing..."));

        match self.label_count.get() {
            Some(1) => panel = panel.child(Element::p("1 label")),
            Some(n) => panel = panel.child(Element::p(format!("{} labels", n))),
            None => {}
        }

        Ok(Element::div()
            .classes("fill-parent flex flex-center spinner-backdrop")
            .child(panel)
            .into())
    }
}

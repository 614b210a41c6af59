use std::cell::RefCell;

use anyhow::Result;
use async_trait::async_trait;

use crate::spa::{Content, Element, LoadingScreen, Screen};

/// Spinner shown while a page loads
#[derive(Debug, Default)]
pub struct LoadingOverlay {
    status: RefCell<Option<String>>,
}

impl LoadingOverlay {
    pub const TYPE_ID: &'static str = "loading";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Screen for LoadingOverlay {
    async fn render(&self) -> Result<Content> {
        let spinner = Element::div()
            .classes("spinner")
            .content((1..=5).map(|n| Element::div().classes(&format!("rect{}", n))));

        let mut backdrop = Element::div()
            .classes("flex flex-center fill-parent spinner-backdrop")
            .child(spinner);
        if let Some(status) = self.status.borrow().as_deref() {
            backdrop = backdrop.child(Element::p(status).classes("loading-status"));
        }

        Ok(backdrop.into())
    }
}

impl LoadingScreen for LoadingOverlay {
    fn set_status_text(&self, text: &str) {
        *self.status.borrow_mut() = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_text_is_rendered() {
        let overlay = LoadingOverlay::new();
        let before = overlay.render().await.unwrap().into_element();
        assert!(before.find_by_class("loading-status").is_none());
        assert!(before.find_by_class("rect5").is_some());

        overlay.set_status_text("Loading setup");
        let after = overlay.render().await.unwrap().into_element();
        assert_eq!(after.text_content(), vec!["Loading setup".to_string()]);
    }
}

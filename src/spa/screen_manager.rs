use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use super::content::to_css_class;
use super::screen::Screen;
use super::surface::{NodeId, RenderTarget};

struct Mounted<S: ?Sized> {
    screen: Rc<S>,
    node: NodeId,
}

/// Holds at most one screen in a container of its own
///
/// The manager only mounts and unmounts; running `on_load`/`on_unload` is up to
/// the caller.
pub struct ScreenManager<S: ?Sized + Screen> {
    target: Rc<dyn RenderTarget>,
    root: NodeId,
    instance_class: String,
    slot: RefCell<Option<Mounted<S>>>,
}

impl<S: ?Sized + Screen> ScreenManager<S> {
    /// Create the slot's container under `parent`, named after `namespace`
    pub fn new(target: Rc<dyn RenderTarget>, parent: NodeId, namespace: &str) -> Self {
        let class = to_css_class(namespace);
        let root = target.create_container(parent, &format!("{class}s-root"));
        target.set_hidden(root, true);

        Self {
            target,
            root,
            instance_class: format!("{class}-instance"),
            slot: RefCell::new(None),
        }
    }

    pub fn get(&self) -> Option<Rc<S>> {
        self.slot.borrow().as_ref().map(|m| Rc::clone(&m.screen))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node currently mounted in the slot
    pub fn node(&self) -> Option<NodeId> {
        self.slot.borrow().as_ref().map(|m| m.node)
    }

    /// Render `screen` and make it the slot's only content
    ///
    /// Whatever was mounted before is dropped. If rendering fails the slot is
    /// left as it was.
    pub async fn set(&self, screen: Rc<S>) -> Result<()> {
        let mut element = screen.render().await?.into_element();
        element.add_class(&self.instance_class);

        self.target.clear_children(self.root);
        let node = self.target.attach(self.root, element);
        self.target.set_hidden(self.root, false);

        *self.slot.borrow_mut() = Some(Mounted { screen, node });
        Ok(())
    }

    /// Re-render the mounted screen in place
    ///
    /// Used when a screen's own state changed (e.g. a new loading status).
    pub async fn refresh(&self) -> Result<()> {
        let Some(screen) = self.get() else {
            return Ok(());
        };

        let mut element = screen.render().await?.into_element();
        element.add_class(&self.instance_class);

        // The slot may have been cleared or replaced while rendering
        let still_mounted = self
            .get()
            .is_some_and(|current| super::screen::same_screen(&current, &screen));
        if still_mounted {
            self.target.clear_children(self.root);
            let node = self.target.attach(self.root, element);
            *self.slot.borrow_mut() = Some(Mounted { screen, node });
        }

        Ok(())
    }

    /// Unmount and forget the current screen
    pub fn clear(&self) {
        self.target.clear_children(self.root);
        self.target.set_hidden(self.root, true);
        *self.slot.borrow_mut() = None;
    }
}

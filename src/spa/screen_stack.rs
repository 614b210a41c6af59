use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use super::content::to_css_class;
use super::screen::{Screen, same_screen};
use super::surface::{NodeId, RenderTarget};

struct StackEntry<S: ?Sized> {
    screen: Rc<S>,
    node: NodeId,
    focus_path: Option<Vec<usize>>,
}

/// Holds an ordered stack of screens, most recently added on top
///
/// Membership is by identity. The stack's container is hidden whenever the
/// stack is empty.
pub struct ScreenStackManager<S: ?Sized + Screen> {
    target: Rc<dyn RenderTarget>,
    root: NodeId,
    instance_class: String,
    entries: RefCell<Vec<StackEntry<S>>>,
}

impl<S: ?Sized + Screen> ScreenStackManager<S> {
    pub fn new(target: Rc<dyn RenderTarget>, parent: NodeId, namespace: &str) -> Self {
        let class = to_css_class(namespace);
        let root = target.create_container(parent, &format!("{class}s-root"));
        target.set_hidden(root, true);

        Self {
            target,
            root,
            instance_class: format!("{class}-instance"),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Put `screen` on top of the stack
    ///
    /// A screen that is already stacked is moved to the top and keeps its
    /// mounted content; anything else is rendered first. A failed render leaves
    /// the stack untouched.
    pub async fn add(&self, screen: Rc<S>) -> Result<()> {
        let existing = self.position(&screen);

        let entry = match existing {
            Some(index) => {
                let entry = self.entries.borrow_mut().remove(index);
                self.target.move_to_end(entry.node);
                entry
            }
            None => {
                let mut element = screen.render().await?.into_element();
                element.add_class(&self.instance_class);
                let focus_path = element.autofocus_path();

                // Another add of the same screen may have finished while we rendered
                if let Some(index) = self.position(&screen) {
                    let stale = self.entries.borrow_mut().remove(index);
                    self.target.remove(stale.node);
                }

                let node = self.target.attach(self.root, element);
                StackEntry {
                    screen,
                    node,
                    focus_path,
                }
            }
        };

        self.target.set_hidden(self.root, false);

        // Focus moves to the first autofocus element of the new top
        if let Some(path) = &entry.focus_path {
            self.target.focus(entry.node, path);
        }

        self.entries.borrow_mut().push(entry);
        Ok(())
    }

    /// Unmount `screen`; does nothing if it isn't stacked
    pub fn remove(&self, screen: &Rc<S>) {
        let Some(index) = self.position(screen) else {
            return;
        };

        let entry = self.entries.borrow_mut().remove(index);
        self.target.remove(entry.node);

        if self.entries.borrow().is_empty() {
            self.target.set_hidden(self.root, true);
        }
    }

    pub fn has(&self, screen: &Rc<S>) -> bool {
        self.position(screen).is_some()
    }

    /// Unmount every screen at once
    pub fn clear(&self) {
        self.target.clear_children(self.root);
        self.entries.borrow_mut().clear();
        self.target.set_hidden(self.root, true);
    }

    /// Stacked screens, oldest first
    pub fn get_all(&self) -> Vec<Rc<S>> {
        self.entries
            .borrow()
            .iter()
            .map(|e| Rc::clone(&e.screen))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The node mounted for `screen`, if it is stacked
    pub fn node_of(&self, screen: &Rc<S>) -> Option<NodeId> {
        self.entries
            .borrow()
            .iter()
            .find(|e| same_screen(&e.screen, screen))
            .map(|e| e.node)
    }

    fn position(&self, screen: &Rc<S>) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|e| same_screen(&e.screen, screen))
    }
}

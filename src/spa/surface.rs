//! Render targets
//!
//! A [`RenderTarget`] is the surface screens are mounted onto. The managers only
//! ever talk to this trait, so a terminal, a test harness or anything else that
//! can hold a tree of nodes can host the app.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

use super::content::Element;

/// Handle to a node owned by a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The mount/unmount contract every surface implements
pub trait RenderTarget {
    /// The node everything else hangs from
    fn root(&self) -> NodeId;

    /// Append an empty container element with the given class under `parent`
    fn create_container(&self, parent: NodeId, class: &str) -> NodeId;

    /// Mount `element` as the last child of `parent`
    fn attach(&self, parent: NodeId, element: Element) -> NodeId;

    /// Move an attached node to the end of its parent's children, keeping its content
    fn move_to_end(&self, node: NodeId);

    /// Unmount and drop a node and everything below it
    fn remove(&self, node: NodeId);

    /// Unmount and drop every child of `parent`
    fn clear_children(&self, parent: NodeId);

    fn set_hidden(&self, node: NodeId, hidden: bool);

    /// Whether `node` is currently a direct child of `parent`
    fn contains(&self, parent: NodeId, node: NodeId) -> bool;

    /// Focus the element at `path` (child indices) inside a mounted node
    fn focus(&self, node: NodeId, path: &[usize]);
}

#[derive(Debug)]
struct NodeRecord {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
}

/// In-memory render target
///
/// Keeps an arena of nodes. Containers and mounted screen content are both
/// nodes; a mounted screen keeps its whole element tree inside one record.
#[derive(Debug)]
pub struct Surface {
    nodes: RefCell<HashMap<NodeId, NodeRecord>>,
    root: NodeId,
    next_id: Cell<u64>,
    focused: RefCell<Option<(NodeId, Vec<usize>)>>,
    /// Bumped on every mutation so presenters know when to redraw
    revision: Cell<u64>,
}

impl Surface {
    pub fn new(root_class: &str) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeRecord {
                element: Element::div().classes(root_class),
                parent: None,
                children: Vec::new(),
                hidden: false,
            },
        );

        Self {
            nodes: RefCell::new(nodes),
            root,
            next_id: Cell::new(1),
            focused: RefCell::new(None),
            revision: Cell::new(0),
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(&node)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the element stored in a node
    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(&node).map(|r| r.element.clone())
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.borrow().get(&node).map(|r| r.hidden).unwrap_or(true)
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.nodes.borrow().contains_key(&node)
    }

    /// First child of `parent` whose element carries `class`
    pub fn find_child_by_class(&self, parent: NodeId, class: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        nodes
            .get(&parent)?
            .children
            .iter()
            .copied()
            .find(|id| nodes.get(id).is_some_and(|r| r.element.has_class(class)))
    }

    pub fn focused(&self) -> Option<(NodeId, Vec<usize>)> {
        self.focused.borrow().clone()
    }

    /// The element that currently has focus, if its node is still mounted
    pub fn focused_element(&self) -> Option<Element> {
        let (node, path) = self.focused()?;
        let mut element = self.element(node)?;
        for index in path {
            element = element.children.get(index)?.clone();
        }
        Some(element)
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    fn touch(&self) {
        self.revision.set(self.revision.get() + 1);
    }

    fn allocate(&self) -> NodeId {
        let id = NodeId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        id
    }

    fn insert_child(&self, parent: NodeId, element: Element) -> NodeId {
        let id = self.allocate();
        let mut nodes = self.nodes.borrow_mut();

        match nodes.get_mut(&parent) {
            Some(record) => record.children.push(id),
            None => {
                log::warn!("Mounting {} under unknown parent {}, node stays detached", id, parent);
            }
        }

        nodes.insert(
            id,
            NodeRecord {
                element,
                parent: Some(parent),
                children: Vec::new(),
                hidden: false,
            },
        );
        drop(nodes);

        self.touch();
        id
    }

    fn drop_subtree(nodes: &mut HashMap<NodeId, NodeRecord>, node: NodeId) {
        if let Some(record) = nodes.remove(&node) {
            for child in record.children {
                Self::drop_subtree(nodes, child);
            }
        }
    }

    fn clear_focus_if_gone(&self) {
        let gone = match &*self.focused.borrow() {
            Some((node, _)) => !self.exists(*node),
            None => false,
        };
        if gone {
            *self.focused.borrow_mut() = None;
        }
    }
}

impl RenderTarget for Surface {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_container(&self, parent: NodeId, class: &str) -> NodeId {
        self.insert_child(parent, Element::div().classes(class))
    }

    fn attach(&self, parent: NodeId, element: Element) -> NodeId {
        self.insert_child(parent, element)
    }

    fn move_to_end(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes.get(&node).and_then(|r| r.parent) else {
            return;
        };

        if let Some(record) = nodes.get_mut(&parent) {
            record.children.retain(|c| *c != node);
            record.children.push(node);
        }
        drop(nodes);

        self.touch();
    }

    fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes.get(&node).and_then(|r| r.parent);

        if let Some(record) = parent.and_then(|p| nodes.get_mut(&p)) {
            record.children.retain(|c| *c != node);
        }
        Self::drop_subtree(&mut nodes, node);
        drop(nodes);

        self.clear_focus_if_gone();
        self.touch();
    }

    fn clear_children(&self, parent: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let children = match nodes.get_mut(&parent) {
            Some(record) => std::mem::take(&mut record.children),
            None => return,
        };
        for child in children {
            Self::drop_subtree(&mut nodes, child);
        }
        drop(nodes);

        self.clear_focus_if_gone();
        self.touch();
    }

    fn set_hidden(&self, node: NodeId, hidden: bool) {
        if let Some(record) = self.nodes.borrow_mut().get_mut(&node) {
            record.hidden = hidden;
        }
        self.touch();
    }

    fn contains(&self, parent: NodeId, node: NodeId) -> bool {
        self.nodes
            .borrow()
            .get(&parent)
            .is_some_and(|r| r.children.contains(&node))
    }

    fn focus(&self, node: NodeId, path: &[usize]) {
        if self.exists(node) {
            *self.focused.borrow_mut() = Some((node, path.to_vec()));
            self.touch();
        }
    }
}

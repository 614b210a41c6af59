use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`EventEmitter::on`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<T> = Rc<dyn Fn(&T)>;

/// A list of handlers for one kind of event
///
/// Handlers may register or unregister other handlers while an event is being
/// emitted; such changes apply from the next emit on.
pub struct EventEmitter<T> {
    handlers: RefCell<Vec<(HandlerId, Handler<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Returns false if the handler was not registered
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    pub fn emit(&self, event: &T) {
        let handlers: Vec<Handler<T>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

//! Synchronous publish/subscribe for domain entities

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use crate::domain::ids::EntityId;

/// An event that can be routed by kind.
pub trait Notification {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventBus::on`], used to unregister a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

struct Listener<E: Notification> {
    id: ListenerId,
    kind: E::Kind,
    handler: Handler<E>,
}

/// Handler registry invoked synchronously on the caller's thread.
///
/// Handlers run in registration order. The list is snapshotted before dispatch, so a
/// handler may register handlers or fire further events without invalidating the
/// iteration of the outer `fire`.
pub struct EventBus<E: Notification> {
    listeners: RefCell<Vec<Listener<E>>>,
    next_listener: Cell<u64>,
}

impl<E: Notification> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Notification> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<E: Notification> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    pub fn on<F>(&self, kind: E::Kind, handler: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            kind,
            handler: Rc::new(handler),
        });
        id
    }

    /// Unregister a handler. Returns false if it was not registered.
    pub fn off(&self, listener: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != listener);
        listeners.len() != before
    }

    pub fn fire(&self, event: &E) {
        let kind = event.kind();
        let handlers: Vec<Handler<E>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Rc::clone(&l.handler))
            .collect();
        trace!(?kind, handlers = handlers.len(), "fire");
        for handler in handlers {
            handler(event);
        }
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }
}

/// Capability shared by entities that carry an identity and an event bus.
pub trait Observable {
    type Event: Notification;

    fn id(&self) -> EntityId;

    fn events(&self) -> &EventBus<Self::Event>;

    fn on<F>(&self, kind: <Self::Event as Notification>::Kind, handler: F) -> ListenerId
    where
        F: Fn(&Self::Event) + 'static,
    {
        self.events().on(kind, handler)
    }

    fn off(&self, listener: ListenerId) -> bool {
        self.events().off(listener)
    }

    fn fire(&self, event: Self::Event) {
        self.events().fire(&event);
    }
}

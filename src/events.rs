//! Host callback subscriptions
//!
//! Bars do not hook into the host directly. They subscribe to pointer events
//! through an [`EventBus`] and keep the returned [`Subscription`] for as long
//! as they live; dropping it unsubscribes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::host::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseButton,
    MouseMove,
}

/// Handle for one registered callback; ids are never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Routing table for host events. The bus only records who listens to what;
/// the caller delivers the payload to each owner returned by
/// [`EventBus::subscribers`].
pub trait EventBus {
    fn subscribe(&self, kind: EventKind, owner: WindowId) -> SubscriptionId;

    /// Returns false when `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Owners subscribed to `kind`, oldest subscription first.
    fn subscribers(&self, kind: EventKind) -> Vec<WindowId>;
}

/// In-process [`EventBus`]
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    next_id: Cell<u64>,
    entries: RefCell<BTreeMap<SubscriptionId, (EventKind, WindowId)>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl EventBus for CallbackRegistry {
    fn subscribe(&self, kind: EventKind, owner: WindowId) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().insert(id, (kind, owner));
        trace!("Subscribed {:?} to {:?} as {:?}", owner, kind, id);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.entries.borrow_mut().remove(&id).is_some()
    }

    fn subscribers(&self, kind: EventKind) -> Vec<WindowId> {
        self.entries
            .borrow()
            .values()
            .filter(|(entry_kind, _)| *entry_kind == kind)
            .map(|(_, owner)| *owner)
            .collect()
    }
}

/// Registered callback, removed from its bus on drop
pub struct Subscription {
    bus: Rc<dyn EventBus>,
    id: SubscriptionId,
    kind: EventKind,
}

impl Subscription {
    pub fn new(bus: Rc<dyn EventBus>, kind: EventKind, owner: WindowId) -> Self {
        let id = bus.subscribe(kind, owner);
        Self { bus, id, kind }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.bus.unsubscribe(self.id) {
            warn!("Subscription {:?} for {:?} was already removed", self.id, self.kind);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

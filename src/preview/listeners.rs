//! Viewport resize listeners.
//!
//! `subscribe` hands back a [`Subscription`]; the callback stays registered
//! exactly as long as that guard lives. Dropping the guard (for example when
//! the view that owns it goes away) unregisters it, so a closed view never
//! receives another resize.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::geometry::Size;

type Callback = Box<dyn FnMut(Size)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
    /// Ids dropped while their callback was out for a notify pass.
    cancelled: Vec<u64>,
    notifying: bool,
}

#[derive(Clone, Default)]
pub struct ResizeListeners {
    registry: Rc<RefCell<Registry>>,
}

impl ResizeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl FnMut(Size) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Box::new(callback)));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every live callback with the new viewport size. Callbacks may
    /// subscribe or drop subscriptions while being notified.
    pub fn notify(&self, size: Size) {
        let mut callbacks = {
            let mut registry = self.registry.borrow_mut();
            if registry.notifying {
                return;
            }
            registry.notifying = true;
            std::mem::take(&mut registry.callbacks)
        };

        for (id, callback) in callbacks.iter_mut() {
            if self.registry.borrow().cancelled.contains(id) {
                continue;
            }
            callback(size);
        }

        // Dropping a callback can drop a Subscription it owns, which cancels
        // more ids, so prune outside the borrow until nothing is left.
        loop {
            let cancelled = std::mem::take(&mut self.registry.borrow_mut().cancelled);
            if cancelled.is_empty() {
                break;
            }
            callbacks.retain(|(id, _)| !cancelled.contains(id));
        }

        let mut registry = self.registry.borrow_mut();
        // Subscriptions made during the pass were pushed to the now-empty list.
        callbacks.append(&mut registry.callbacks);
        registry.callbacks = callbacks;
        registry.notifying = false;
    }
}

/// Keeps a resize callback registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = {
            let mut registry = registry.borrow_mut();
            match registry.callbacks.iter().position(|(id, _)| *id == self.id) {
                Some(pos) => Some(registry.callbacks.remove(pos)),
                None => {
                    if registry.notifying {
                        registry.cancelled.push(self.id);
                    }
                    None
                }
            }
        };
        // The callback may own other subscriptions; drop it unborrowed.
        drop(removed);
    }
}

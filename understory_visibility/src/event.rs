// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multicast subscription points with re-entrant registration.
//!
//! An [`Event`] is a cheap, clonable handle to a shared list of handlers.
//! Handlers may subscribe or unsubscribe (on any event, including the one
//! being dispatched) while a dispatch is in flight:
//!
//! - A handler added during a dispatch is first invoked by the next dispatch.
//! - A handler removed during a dispatch is not invoked for the rest of it,
//!   unless it already ran.
//! - A handler is never invoked re-entrantly by a nested dispatch of the same
//!   event; the nested dispatch skips it.
//!
//! Handlers that hold a clone of their own [`Event`] keep it alive; capture a
//! [`WeakEvent`] instead to avoid the reference cycle.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_visibility::Event;
//!
//! let changed = Event::<bool>::new();
//! let seen = Rc::new(Cell::new(None));
//!
//! let sink = seen.clone();
//! let id = changed.subscribe(move |visible| sink.set(Some(visible)));
//! changed.invoke(true);
//! assert_eq!(seen.get(), Some(true));
//!
//! assert!(changed.unsubscribe(id));
//! changed.invoke(false);
//! assert_eq!(seen.get(), Some(true));
//! ```

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use smallvec::SmallVec;

/// Identifies one subscription on an [`Event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<A> = Box<dyn FnMut(A)>;

struct Slot<A> {
    id: SubscriptionId,
    // `None` while the handler is running.
    handler: Option<Handler<A>>,
    live: bool,
}

struct Subscribers<A> {
    next_id: u64,
    // Slots are only appended or tombstoned while `depth > 0`, so indices stay
    // valid for the duration of a dispatch.
    slots: SmallVec<[Slot<A>; 2]>,
    depth: u32,
}

impl<A> Subscribers<A> {
    fn compact(&mut self) {
        if self.depth == 0 {
            self.slots.retain(|slot| slot.live);
        }
    }
}

/// A multicast notification taking an argument of type `A`.
///
/// Clones share the same subscriber list.
pub struct Event<A> {
    inner: Rc<RefCell<Subscribers<A>>>,
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                slots: SmallVec::new(),
                depth: 0,
            })),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.len())
            .finish_non_exhaustive()
    }
}

impl<A> Event<A> {
    /// Creates an event with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns its subscription id.
    pub fn subscribe(&self, handler: impl FnMut(A) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.slots.push(Slot {
            id,
            handler: Some(Box::new(handler)),
            live: true,
        });
        id
    }

    /// Removes the subscription `id`.
    ///
    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(slot) = inner
            .slots
            .iter_mut()
            .find(|slot| slot.live && slot.id == id)
        else {
            return false;
        };
        slot.live = false;
        inner.compact();
        true
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        for slot in &mut inner.slots {
            slot.live = false;
        }
        inner.compact();
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.live)
            .count()
    }

    /// Returns `true` if there are no live subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a handle that does not keep the subscriber list alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakEvent<A> {
        WeakEvent {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<A: Copy> Event<A> {
    /// Calls every live handler with `arg`, in subscription order.
    ///
    /// With no subscribers this is a no-op. No borrow of the subscriber list is
    /// held while a handler runs.
    ///
    /// If a handler panics, the panic propagates to the caller and the
    /// remaining handlers are not called. The event stays usable: the
    /// panicking handler is kept and runs again on the next dispatch.
    pub fn invoke(&self, arg: A) {
        let len = {
            let mut inner = self.inner.borrow_mut();
            inner.depth += 1;
            inner.slots.len()
        };
        let _dispatch = Dispatch { inner: &self.inner };

        for index in 0..len {
            let taken = {
                let mut inner = self.inner.borrow_mut();
                match inner.slots.get_mut(index) {
                    Some(slot) if slot.live => slot.handler.take(),
                    _ => None,
                }
            };
            let Some(handler) = taken else {
                continue;
            };
            let mut running = Running {
                inner: &self.inner,
                index,
                handler: Some(handler),
            };
            if let Some(handler) = running.handler.as_mut() {
                handler(arg);
            }
        }
    }
}

// Ends a dispatch, also on unwind.
struct Dispatch<'a, A> {
    inner: &'a RefCell<Subscribers<A>>,
}

impl<A> Drop for Dispatch<'_, A> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.depth -= 1;
            inner.compact();
        }
    }
}

// Puts a running handler back into its slot, also on unwind.
struct Running<'a, A> {
    inner: &'a RefCell<Subscribers<A>>,
    index: usize,
    handler: Option<Handler<A>>,
}

impl<A> Drop for Running<'_, A> {
    fn drop(&mut self) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            if let Some(slot) = inner.slots.get_mut(self.index) {
                slot.handler = Some(handler);
            }
        }
    }
}

/// Non-owning handle to an [`Event`], for use inside its own handlers.
pub struct WeakEvent<A> {
    inner: Weak<RefCell<Subscribers<A>>>,
}

impl<A> Clone for WeakEvent<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> fmt::Debug for WeakEvent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEvent")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl<A> WeakEvent<A> {
    /// Returns the event if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Event<A>> {
        self.inner.upgrade().map(|inner| Event { inner })
    }
}

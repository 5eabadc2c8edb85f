// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message-style notifications delivered to the entity that owns a tracker.
//!
//! Components that want to hear about visibility implement
//! [`VisibilityReceiver`] and are registered with the host's entity. The
//! tracker hands each transition to a [`MessageTarget`], scoped either to the
//! entity itself or to the entity and all of its descendants, depending on the
//! configured [`MessageMode`]. Missing receivers are never an error.
//!
//! [`ReceiverNode`] is a ready-made [`MessageTarget`] for hosts that do not have
//! their own entity hierarchy.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_visibility::{
//!     MessageScope, MessageTarget, ReceiverNode, VisibilityMessage, VisibilityReceiver,
//! };
//!
//! struct Counter(Rc<Cell<u32>>);
//!
//! impl VisibilityReceiver for Counter {
//!     fn became_visible(&mut self) {
//!         self.0.set(self.0.get() + 1);
//!     }
//! }
//!
//! let hits = Rc::new(Cell::new(0));
//! let mut root = ReceiverNode::new();
//! root.push_child(ReceiverNode::new().with_receiver(Counter(hits.clone())));
//!
//! // `Entity` scope does not reach the child.
//! root.deliver(MessageScope::Entity, VisibilityMessage::BecameVisible);
//! assert_eq!(hits.get(), 0);
//!
//! root.deliver(MessageScope::EntityAndDescendants, VisibilityMessage::BecameVisible);
//! assert_eq!(hits.get(), 1);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Selects how the tracker notifies its owning entity.
///
/// Independent of the typed events on the tracker, which fire regardless of
/// this setting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageMode {
    /// No message is sent.
    None,
    /// Receivers on the owning entity get the message.
    #[default]
    Send,
    /// Receivers on the owning entity and on all of its descendants get the
    /// message. More expensive than [`Send`](Self::Send).
    Broadcast,
}

impl MessageMode {
    /// Returns the delivery scope for this mode, or `None` if messages are off.
    #[must_use]
    pub const fn scope(self) -> Option<MessageScope> {
        match self {
            Self::None => None,
            Self::Send => Some(MessageScope::Entity),
            Self::Broadcast => Some(MessageScope::EntityAndDescendants),
        }
    }
}

/// Which receivers a message reaches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageScope {
    /// Only receivers registered on the owning entity.
    Entity,
    /// Receivers on the owning entity and all of its descendants.
    EntityAndDescendants,
}

/// The two visibility messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityMessage {
    /// The element started overlapping the viewport.
    BecameVisible,
    /// The element stopped overlapping the viewport, or was found outside it
    /// on activation.
    BecameInvisible,
}

impl VisibilityMessage {
    /// Returns the message for a new visibility value.
    #[must_use]
    pub const fn for_visibility(visible: bool) -> Self {
        if visible {
            Self::BecameVisible
        } else {
            Self::BecameInvisible
        }
    }

    /// A stable name, for logs and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BecameVisible => "became_visible",
            Self::BecameInvisible => "became_invisible",
        }
    }
}

impl fmt::Display for VisibilityMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component that reacts to visibility messages.
///
/// Both hooks default to doing nothing, so implementors only override what
/// they care about.
pub trait VisibilityReceiver {
    /// Called when the element became visible.
    fn became_visible(&mut self) {}

    /// Called when the element became invisible.
    fn became_invisible(&mut self) {}

    /// Routes `message` to the matching hook.
    fn receive(&mut self, message: VisibilityMessage) {
        match message {
            VisibilityMessage::BecameVisible => self.became_visible(),
            VisibilityMessage::BecameInvisible => self.became_invisible(),
        }
    }
}

/// Delivery facility of the entity that owns a tracker.
pub trait MessageTarget {
    /// Delivers `message` to every receiver in `scope`.
    ///
    /// Must tolerate an empty scope.
    fn deliver(&mut self, scope: MessageScope, message: VisibilityMessage);
}

/// Discards every message. Use when the host has no receivers.
impl MessageTarget for () {
    fn deliver(&mut self, _scope: MessageScope, _message: VisibilityMessage) {}
}

impl<T: MessageTarget + ?Sized> MessageTarget for &mut T {
    fn deliver(&mut self, scope: MessageScope, message: VisibilityMessage) {
        (**self).deliver(scope, message);
    }
}

/// An entity in a simple receiver hierarchy.
///
/// Each node owns the receivers registered on it and its child nodes.
/// [`MessageScope::Entity`] reaches this node's receivers in registration
/// order; [`MessageScope::EntityAndDescendants`] then continues depth-first
/// through the children, pre-order.
#[derive(Default)]
pub struct ReceiverNode {
    receivers: Vec<Box<dyn VisibilityReceiver>>,
    children: Vec<ReceiverNode>,
}

impl fmt::Debug for ReceiverNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverNode")
            .field("receivers", &self.receivers.len())
            .field("children", &self.children)
            .finish()
    }
}

impl ReceiverNode {
    /// Creates a node with no receivers and no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_receiver`](Self::add_receiver).
    #[must_use]
    pub fn with_receiver(mut self, receiver: impl VisibilityReceiver + 'static) -> Self {
        self.add_receiver(receiver);
        self
    }

    /// Registers a receiver on this node.
    pub fn add_receiver(&mut self, receiver: impl VisibilityReceiver + 'static) {
        self.receivers.push(Box::new(receiver));
    }

    /// Removes all receivers from this node, keeping its children.
    pub fn clear_receivers(&mut self) {
        self.receivers.clear();
    }

    /// Appends a child node and returns a handle to it.
    pub fn push_child(&mut self, child: Self) -> &mut Self {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.children.get_mut(index)
    }

    /// Returns the child nodes.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Number of receivers registered on this node.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Number of receivers on this node and all descendants.
    #[must_use]
    pub fn subtree_receiver_count(&self) -> usize {
        self.receivers.len()
            + self
                .children
                .iter()
                .map(Self::subtree_receiver_count)
                .sum::<usize>()
    }

    fn deliver_local(&mut self, message: VisibilityMessage) {
        for receiver in &mut self.receivers {
            receiver.receive(message);
        }
    }

    fn deliver_subtree(&mut self, message: VisibilityMessage) {
        self.deliver_local(message);
        for child in &mut self.children {
            child.deliver_subtree(message);
        }
    }
}

impl MessageTarget for ReceiverNode {
    fn deliver(&mut self, scope: MessageScope, message: VisibilityMessage) {
        match scope {
            MessageScope::Entity => self.deliver_local(message),
            MessageScope::EntityAndDescendants => self.deliver_subtree(message),
        }
    }
}

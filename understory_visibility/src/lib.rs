// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_visibility --heading-base-level=0

//! Understory Visibility: edge-triggered viewport visibility for UI culling.
//!
//! This crate answers one question per frame for each tracked UI element: does
//! its rectangle overlap the viewport's rectangle? The answer is debounced into
//! a two-state signal, and interested parties are told exactly once per change.
//! Hosts use it to skip expensive work for list or grid items that are
//! scrolled out of view.
//!
//! The core concepts are:
//!
//! - [`CornerSource`]: the host's transform/layout system, queried for the four
//!   world-space corners of a node. [`WorldQuad`] slices and maps, and closures
//!   via [`corners_from_fn`], work out of the box.
//! - [`world_rect`] and [`overlaps`]: axis-aligned bounds from the bottom-left
//!   and top-right corners, and a strict overlap test where touching edges do
//!   not count.
//! - [`VisibilityTracker`]: the tri-state ([`VisibilityState`]) machine that
//!   evaluates once per frame and dispatches on change.
//! - Notification channels: a [`VisibilityMessage`] delivered to a
//!   [`MessageTarget`] according to the [`MessageMode`], plus three typed
//!   [`Event`] subscription points on the tracker.
//!
//! This crate does **not** own a scene graph, schedule frames, or handle
//! rotation, occlusion, or partial visibility. Callers are expected to:
//!
//! - Finalize layout and transforms for the frame.
//! - Call [`VisibilityTracker::evaluate`] once per tracker per frame.
//! - Call [`VisibilityTracker::activate`] when a tracker is (re-)enabled.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use kurbo::Rect;
//! use understory_visibility::{TrackerConfig, VisibilityTracker, WorldQuad};
//!
//! const ITEM: usize = 0;
//! const VIEWPORT: usize = 1;
//!
//! let mut nodes = vec![
//!     WorldQuad::from_world_rect(Rect::new(10.0, 10.0, 20.0, 20.0)),
//!     WorldQuad::from_world_rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
//! ];
//!
//! let mut tracker = VisibilityTracker::from_config(
//!     TrackerConfig::new().with_rect(ITEM).with_viewport(VIEWPORT),
//! );
//!
//! let changes = Rc::new(Cell::new(0));
//! let counter = changes.clone();
//! tracker
//!     .on_visible_changed()
//!     .subscribe(move |_visible| counter.set(counter.get() + 1));
//!
//! // Activation always evaluates and notifies once.
//! tracker.activate(nodes.as_slice(), &mut ());
//! assert!(tracker.is_visible());
//! assert_eq!(changes.get(), 1);
//!
//! // Unchanged geometry is silent.
//! assert!(tracker.evaluate(nodes.as_slice(), &mut ()).is_none());
//!
//! // Scroll the item out of view.
//! nodes[ITEM] = WorldQuad::from_world_rect(Rect::new(10.0, 150.0, 20.0, 160.0));
//! let transition = tracker.evaluate(nodes.as_slice(), &mut ()).unwrap();
//! assert!(!transition.is_visible());
//! assert_eq!(changes.get(), 2);
//! ```
//!
//! ## Logging
//!
//! Transitions are reported with `tracing` at `TRACE` level, and unresolved
//! references at `DEBUG` level. No subscriber is installed by this crate.
//!
//! ## Features
//!
//! - `std` (default): build Kurbo and `tracing` against `std`.
//! - `libm`: use Kurbo's `libm` backend for `no_std` builds.
//! - `serde`: derive `Serialize`/`Deserialize` for [`TrackerConfig`] and
//!   [`MessageMode`].
//!
//! Trackers are single-threaded: the typed events are `Rc`-based. Each tracker
//! owns its own [`CornerScratch`], so no corner storage is shared between
//! trackers.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod event;
mod geometry;
mod message;
mod state;
mod tracker;

pub use config::{DefaultRect, MissingReference, TrackerConfig};
pub use event::{Event, SubscriptionId, WeakEvent};
pub use geometry::{
    BOTTOM_LEFT, BOTTOM_RIGHT, CornerScratch, CornerSource, CornersFromFn, TOP_LEFT, TOP_RIGHT,
    WorldQuad, corners_from_fn, overlaps, rect_from_corners, world_rect,
};
pub use message::{
    MessageMode, MessageScope, MessageTarget, ReceiverNode, VisibilityMessage, VisibilityReceiver,
};
pub use state::{VisibilityState, VisibilityTransition};
pub use tracker::VisibilityTracker;

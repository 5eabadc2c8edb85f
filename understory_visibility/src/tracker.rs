// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame visibility tracker.

use crate::config::{MissingReference, TrackerConfig};
use crate::event::Event;
use crate::geometry::{CornerScratch, CornerSource, overlaps, world_rect};
use crate::message::{MessageMode, MessageTarget, VisibilityMessage};
use crate::state::{VisibilityState, VisibilityTransition};

/// Tracks whether a rectangular element overlaps a viewport.
///
/// Call [`evaluate`](Self::evaluate) once per frame, after the host has
/// finalized transforms, and [`activate`](Self::activate) whenever the tracker
/// is (re-)enabled. Notifications fire only when the visibility changes, and
/// always on the first evaluation after activation.
///
/// On a change, channels are dispatched synchronously in this order:
///
/// 1. a [`VisibilityMessage`] to the [`MessageTarget`], scoped by the
///    [`MessageMode`] (skipped for [`MessageMode::None`]);
/// 2. [`on_visible_changed`](Self::on_visible_changed) with the new value;
/// 3. [`on_became_visible`](Self::on_became_visible), if now visible;
/// 4. [`on_became_invisible`](Self::on_became_invisible), if now invisible.
///
/// A tracker with an unset or unresolvable element or viewport evaluates as
/// invisible.
///
/// `N` is the host's node handle. The tracker never owns nodes; it only asks a
/// [`CornerSource`] for their corners.
#[derive(Debug)]
pub struct VisibilityTracker<N> {
    rect: Option<N>,
    viewport: Option<N>,
    message_mode: MessageMode,
    state: VisibilityState,
    scratch: CornerScratch,
    visible_changed: Event<bool>,
    became_visible: Event<()>,
    became_invisible: Event<()>,
}

impl<N> Default for VisibilityTracker<N> {
    fn default() -> Self {
        Self::from_config(TrackerConfig::default())
    }
}

impl<N> VisibilityTracker<N> {
    /// Creates an unconfigured tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker from `config`. The tracker starts uninitialized.
    #[must_use]
    pub fn from_config(config: TrackerConfig<N>) -> Self {
        Self {
            rect: config.rect,
            viewport: config.viewport,
            message_mode: config.message_mode,
            state: VisibilityState::Uninitialized,
            scratch: CornerScratch::new(),
            visible_changed: Event::new(),
            became_visible: Event::new(),
            became_invisible: Event::new(),
        }
    }

    /// Returns a snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> TrackerConfig<N>
    where
        N: Clone,
    {
        TrackerConfig {
            rect: self.rect.clone(),
            viewport: self.viewport.clone(),
            message_mode: self.message_mode,
        }
    }

    /// Returns the tracked element.
    #[must_use]
    pub fn rect(&self) -> Option<&N> {
        self.rect.as_ref()
    }

    /// Sets the tracked element. Takes effect on the next evaluation.
    pub fn set_rect(&mut self, rect: Option<N>) {
        self.rect = rect;
    }

    /// Returns the viewport.
    #[must_use]
    pub fn viewport(&self) -> Option<&N> {
        self.viewport.as_ref()
    }

    /// Sets the viewport. Takes effect on the next evaluation.
    pub fn set_viewport(&mut self, viewport: Option<N>) {
        self.viewport = viewport;
    }

    /// Returns the message mode.
    #[must_use]
    pub fn message_mode(&self) -> MessageMode {
        self.message_mode
    }

    /// Sets the message mode. Takes effect on the next transition.
    pub fn set_message_mode(&mut self, mode: MessageMode) {
        self.message_mode = mode;
    }

    /// Returns the current tri-state visibility.
    #[must_use]
    pub fn state(&self) -> VisibilityState {
        self.state
    }

    /// Returns `true` if the element overlapped the viewport at the last
    /// evaluation. `false` before the first evaluation.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    /// Raised with the new value whenever the visibility changes.
    ///
    /// Not affected by the [`MessageMode`].
    #[must_use]
    pub fn on_visible_changed(&self) -> &Event<bool> {
        &self.visible_changed
    }

    /// Raised when the element becomes visible.
    ///
    /// Not affected by the [`MessageMode`].
    #[must_use]
    pub fn on_became_visible(&self) -> &Event<()> {
        &self.became_visible
    }

    /// Raised when the element becomes invisible.
    ///
    /// Not affected by the [`MessageMode`].
    #[must_use]
    pub fn on_became_invisible(&self) -> &Event<()> {
        &self.became_invisible
    }

    /// Computes whether the element overlaps the viewport, without changing
    /// state or notifying anyone.
    pub fn overlap<S>(&mut self, source: &S) -> Result<bool, MissingReference>
    where
        S: CornerSource<N> + ?Sized,
    {
        let rect = self.rect.as_ref().ok_or(MissingReference::Rect)?;
        let viewport = self.viewport.as_ref().ok_or(MissingReference::Viewport)?;
        let rect_bounds =
            world_rect(source, rect, &mut self.scratch).ok_or(MissingReference::Rect)?;
        let viewport_bounds =
            world_rect(source, viewport, &mut self.scratch).ok_or(MissingReference::Viewport)?;
        Ok(overlaps(rect_bounds, viewport_bounds))
    }

    /// Resets to [`VisibilityState::Uninitialized`] and evaluates immediately.
    ///
    /// Always notifies, since there is no previous state to compare against.
    pub fn activate<S, T>(&mut self, source: &S, target: &mut T) -> VisibilityTransition
    where
        S: CornerSource<N> + ?Sized,
        T: MessageTarget + ?Sized,
    {
        self.state = VisibilityState::Uninitialized;
        let current = self.compute_state(source);
        let transition = VisibilityTransition {
            previous: VisibilityState::Uninitialized,
            current,
        };
        self.commit(transition, target);
        transition
    }

    /// Recomputes visibility and notifies if it changed.
    ///
    /// Returns the transition when one happened, `None` in steady state.
    pub fn evaluate<S, T>(&mut self, source: &S, target: &mut T) -> Option<VisibilityTransition>
    where
        S: CornerSource<N> + ?Sized,
        T: MessageTarget + ?Sized,
    {
        let next = self.compute_state(source);
        let transition = self.state.transition_to(next)?;
        self.commit(transition, target);
        Some(transition)
    }

    fn compute_state<S>(&mut self, source: &S) -> VisibilityState
    where
        S: CornerSource<N> + ?Sized,
    {
        let overlapping = self.overlap(source).unwrap_or_else(|missing| {
            tracing::debug!(%missing, "resolving visibility as invisible");
            false
        });
        VisibilityState::from_overlap(overlapping)
    }

    fn commit<T>(&mut self, transition: VisibilityTransition, target: &mut T)
    where
        T: MessageTarget + ?Sized,
    {
        tracing::trace!(
            previous = ?transition.previous,
            current = ?transition.current,
            "visibility changed"
        );
        self.state = transition.current;
        let visible = transition.is_visible();

        if let Some(scope) = self.message_mode.scope() {
            target.deliver(scope, VisibilityMessage::for_visibility(visible));
        }
        self.visible_changed.invoke(visible);
        if visible {
            self.became_visible.invoke(());
        } else {
            self.became_invisible.invoke(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WorldQuad;
    use crate::message::{MessageScope, ReceiverNode, VisibilityReceiver};
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::Rect;

    const ITEM: usize = 0;
    const VIEWPORT: usize = 1;

    fn xywh(x: f64, y: f64, w: f64, h: f64) -> WorldQuad {
        WorldQuad::from_world_rect(Rect::new(x, y, x + w, y + h))
    }

    fn scene(item: WorldQuad) -> Vec<WorldQuad> {
        vec![item, xywh(0.0, 0.0, 100.0, 100.0)]
    }

    fn tracker() -> VisibilityTracker<usize> {
        VisibilityTracker::from_config(
            TrackerConfig::new()
                .with_rect(ITEM)
                .with_viewport(VIEWPORT),
        )
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Note {
        Message(MessageScope, VisibilityMessage),
        Changed(bool),
        BecameVisible,
        BecameInvisible,
    }

    type Notes = Rc<RefCell<Vec<Note>>>;

    struct RecordingTarget(Notes);

    impl MessageTarget for RecordingTarget {
        fn deliver(&mut self, scope: MessageScope, message: VisibilityMessage) {
            self.0.borrow_mut().push(Note::Message(scope, message));
        }
    }

    fn observe(tracker: &VisibilityTracker<usize>) -> Notes {
        let notes = Notes::default();
        let n = notes.clone();
        tracker
            .on_visible_changed()
            .subscribe(move |v| n.borrow_mut().push(Note::Changed(v)));
        let n = notes.clone();
        tracker
            .on_became_visible()
            .subscribe(move |()| n.borrow_mut().push(Note::BecameVisible));
        let n = notes.clone();
        tracker
            .on_became_invisible()
            .subscribe(move |()| n.borrow_mut().push(Note::BecameInvisible));
        notes
    }

    #[test]
    fn starts_uninitialized_and_invisible() {
        let tracker = tracker();
        assert_eq!(tracker.state(), VisibilityState::Uninitialized);
        assert!(!tracker.is_visible());
    }

    #[test]
    fn activation_outside_viewport_notifies_invisible_once() {
        let mut tracker = tracker();
        let notes = observe(&tracker);
        let mut target = RecordingTarget(notes.clone());

        let t = tracker.activate(scene(xywh(200.0, 200.0, 10.0, 10.0)).as_slice(), &mut target);
        assert!(t.is_initial());
        assert_eq!(tracker.state(), VisibilityState::Invisible);
        assert_eq!(
            *notes.borrow(),
            vec![
                Note::Message(MessageScope::Entity, VisibilityMessage::BecameInvisible),
                Note::Changed(false),
                Note::BecameInvisible,
            ]
        );
    }

    #[test]
    fn dispatch_order_when_becoming_visible() {
        let mut tracker = tracker();
        tracker.set_message_mode(MessageMode::Broadcast);
        let notes = observe(&tracker);
        let mut target = RecordingTarget(notes.clone());

        tracker.activate(scene(xywh(10.0, 10.0, 10.0, 10.0)).as_slice(), &mut target);
        assert_eq!(
            *notes.borrow(),
            vec![
                Note::Message(
                    MessageScope::EntityAndDescendants,
                    VisibilityMessage::BecameVisible
                ),
                Note::Changed(true),
                Note::BecameVisible,
            ]
        );
    }

    #[test]
    fn steady_state_is_silent() {
        let mut tracker = tracker();
        let notes = observe(&tracker);
        let nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));

        tracker.activate(nodes.as_slice(), &mut ());
        notes.borrow_mut().clear();
        for _ in 0..10 {
            assert_eq!(tracker.evaluate(nodes.as_slice(), &mut ()), None);
        }
        assert!(notes.borrow().is_empty());
        assert!(tracker.is_visible());
    }

    #[test]
    fn moving_out_notifies_once_on_the_observed_tick() {
        let mut tracker = tracker();
        let notes = observe(&tracker);
        let mut nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));

        tracker.activate(nodes.as_slice(), &mut ());
        notes.borrow_mut().clear();

        nodes[ITEM] = xywh(150.0, 10.0, 10.0, 10.0);
        let t = tracker.evaluate(nodes.as_slice(), &mut ()).unwrap();
        assert_eq!(t.previous, VisibilityState::Visible);
        assert_eq!(t.current, VisibilityState::Invisible);
        assert_eq!(tracker.evaluate(nodes.as_slice(), &mut ()), None);
        assert_eq!(
            *notes.borrow(),
            vec![Note::Changed(false), Note::BecameInvisible]
        );
    }

    #[test]
    fn message_mode_none_keeps_typed_events() {
        let mut tracker = tracker();
        tracker.set_message_mode(MessageMode::None);
        let notes = observe(&tracker);
        let mut target = RecordingTarget(notes.clone());

        tracker.activate(scene(xywh(10.0, 10.0, 10.0, 10.0)).as_slice(), &mut target);
        assert_eq!(
            *notes.borrow(),
            vec![Note::Changed(true), Note::BecameVisible]
        );
    }

    #[test]
    fn messages_arrive_without_subscribers() {
        struct Counter(Rc<RefCell<u32>>);
        impl VisibilityReceiver for Counter {
            fn became_invisible(&mut self) {
                *self.0.borrow_mut() += 1;
            }
        }

        let count = Rc::new(RefCell::new(0));
        let mut entity = ReceiverNode::new().with_receiver(Counter(count.clone()));
        let mut tracker = tracker();
        tracker.activate(scene(xywh(-50.0, 0.0, 10.0, 10.0)).as_slice(), &mut entity);
        assert_eq!(*count.borrow(), 1);
        assert!(tracker.on_visible_changed().is_empty());
    }

    #[test]
    fn missing_references_resolve_as_invisible() {
        let nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));

        let mut no_rect = VisibilityTracker::<usize>::from_config(
            TrackerConfig::new().with_viewport(VIEWPORT),
        );
        assert_eq!(no_rect.overlap(nodes.as_slice()), Err(MissingReference::Rect));
        let t = no_rect.activate(nodes.as_slice(), &mut ());
        assert_eq!(t.current, VisibilityState::Invisible);

        let mut no_viewport =
            VisibilityTracker::<usize>::from_config(TrackerConfig::new().with_rect(ITEM));
        assert_eq!(
            no_viewport.overlap(nodes.as_slice()),
            Err(MissingReference::Viewport)
        );
        assert_eq!(
            no_viewport.evaluate(nodes.as_slice(), &mut ()).map(|t| t.current),
            Some(VisibilityState::Invisible)
        );
    }

    #[test]
    fn stale_reference_resolves_as_invisible() {
        let mut tracker = tracker();
        let mut nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));
        tracker.activate(nodes.as_slice(), &mut ());
        assert!(tracker.is_visible());

        nodes.truncate(1);
        assert_eq!(
            tracker.overlap(nodes.as_slice()),
            Err(MissingReference::Viewport)
        );
        let t = tracker.evaluate(nodes.as_slice(), &mut ()).unwrap();
        assert!(!t.is_visible());
    }

    #[test]
    fn reactivation_notifies_again() {
        let mut tracker = tracker();
        let notes = observe(&tracker);
        let nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));

        tracker.activate(nodes.as_slice(), &mut ());
        tracker.activate(nodes.as_slice(), &mut ());
        assert_eq!(
            notes
                .borrow()
                .iter()
                .filter(|n| **n == Note::Changed(true))
                .count(),
            2
        );
    }

    #[test]
    fn reconfiguring_viewport_takes_effect_next_tick() {
        let mut tracker = tracker();
        let mut nodes = scene(xywh(10.0, 10.0, 10.0, 10.0));
        nodes.push(xywh(500.0, 500.0, 10.0, 10.0));
        tracker.activate(nodes.as_slice(), &mut ());
        assert!(tracker.is_visible());

        tracker.set_viewport(Some(2));
        assert_eq!(tracker.viewport(), Some(&2));
        let t = tracker.evaluate(nodes.as_slice(), &mut ()).unwrap();
        assert!(!t.is_initial());
        assert!(!tracker.is_visible());
    }

    #[test]
    fn config_snapshot_round_trips() {
        let config = TrackerConfig::new()
            .with_rect(3_usize)
            .with_viewport(4)
            .with_message_mode(MessageMode::Broadcast);
        let tracker = VisibilityTracker::from_config(config.clone());
        assert_eq!(tracker.config(), config);
        assert_eq!(tracker.rect(), Some(&3));
        assert_eq!(tracker.message_mode(), MessageMode::Broadcast);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tri-state visibility and the edge-triggered transition rule.

/// Visibility of a tracked element relative to its viewport.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VisibilityState {
    /// No evaluation has happened since the tracker was (re-)activated.
    #[default]
    Uninitialized,
    /// The element overlaps the viewport.
    Visible,
    /// The element does not overlap the viewport.
    Invisible,
}

impl VisibilityState {
    /// Maps an overlap result to [`Visible`](Self::Visible) or
    /// [`Invisible`](Self::Invisible).
    #[must_use]
    pub const fn from_overlap(overlaps: bool) -> Self {
        if overlaps {
            Self::Visible
        } else {
            Self::Invisible
        }
    }

    /// Returns `true` only for [`Visible`](Self::Visible).
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }

    /// Returns `false` only for [`Uninitialized`](Self::Uninitialized).
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Returns the transition from `self` to `next`, if it is a change.
    ///
    /// Leaving [`Uninitialized`](Self::Uninitialized) is always a change, so
    /// the first computed state after activation always produces a transition.
    /// `next` is expected to be an initialized state.
    #[must_use]
    pub fn transition_to(self, next: Self) -> Option<VisibilityTransition> {
        debug_assert!(
            next.is_initialized(),
            "transitions only lead to Visible or Invisible"
        );
        if self == next {
            return None;
        }
        Some(VisibilityTransition {
            previous: self,
            current: next,
        })
    }
}

/// A change of [`VisibilityState`] observed by one evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VisibilityTransition {
    /// State before the evaluation.
    pub previous: VisibilityState,
    /// State after the evaluation.
    pub current: VisibilityState,
}

impl VisibilityTransition {
    /// Returns `true` if this is the first evaluation after activation.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        !self.previous.is_initialized()
    }

    /// Returns `true` if the element became visible.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        self.current.is_visible()
    }
}

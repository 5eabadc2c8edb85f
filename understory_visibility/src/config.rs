// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker configuration and the missing-reference error.

use core::fmt;

use crate::message::MessageMode;

/// A node reference required for evaluation was unset or could not be resolved.
///
/// Evaluation treats this as "not visible" instead of failing; it is surfaced
/// by [`VisibilityTracker::overlap`](crate::VisibilityTracker::overlap) and
/// [`TrackerConfig::validate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MissingReference {
    /// The tracked element.
    Rect,
    /// The viewport.
    Viewport,
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rect => f.write_str("tracked rect is unset or could not be resolved"),
            Self::Viewport => f.write_str("viewport is unset or could not be resolved"),
        }
    }
}

impl core::error::Error for MissingReference {}

/// Supplies a default tracked element at configuration-load time.
///
/// Hosts typically answer with the node that owns the tracker.
pub trait DefaultRect<N> {
    /// Returns the node to track when none is configured.
    fn default_rect(&self) -> Option<N>;
}

impl<N, F: Fn() -> Option<N>> DefaultRect<N> for F {
    fn default_rect(&self) -> Option<N> {
        self()
    }
}

/// Configuration surface of a [`VisibilityTracker`](crate::VisibilityTracker).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig<N> {
    /// The element whose visibility is tracked.
    pub rect: Option<N>,
    /// The region the element must overlap to be visible.
    pub viewport: Option<N>,
    /// How the owning entity is notified.
    pub message_mode: MessageMode,
}

impl<N> Default for TrackerConfig<N> {
    fn default() -> Self {
        Self {
            rect: None,
            viewport: None,
            message_mode: MessageMode::default(),
        }
    }
}

impl<N> TrackerConfig<N> {
    /// Creates a configuration with no references and [`MessageMode::Send`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tracked element.
    #[must_use]
    pub fn with_rect(mut self, rect: N) -> Self {
        self.rect = Some(rect);
        self
    }

    /// Sets the viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: N) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Sets the message mode.
    #[must_use]
    pub fn with_message_mode(mut self, mode: MessageMode) -> Self {
        self.message_mode = mode;
        self
    }

    /// Fills an unset `rect` from `hook`.
    ///
    /// A configured `rect` is left alone. Returns `true` if `rect` was filled.
    pub fn resolve_default_rect(&mut self, hook: &impl DefaultRect<N>) -> bool {
        if self.rect.is_some() {
            return false;
        }
        self.rect = hook.default_rect();
        self.rect.is_some()
    }

    /// Checks that both references are set.
    ///
    /// The tracked element is reported first when both are missing.
    pub fn validate(&self) -> Result<(), MissingReference> {
        if self.rect.is_none() {
            return Err(MissingReference::Rect);
        }
        if self.viewport.is_none() {
            return Err(MissingReference::Viewport);
        }
        Ok(())
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! World-space bounds for rectangular nodes, and the strict overlap test.
//!
//! The host's transform/layout system is reached through [`CornerSource`],
//! which writes the four world-space corners of a node in the fixed order
//! bottom-left, top-left, top-right, bottom-right (y up). Only the bottom-left
//! and top-right corners contribute to the resulting bounds, so rotation and
//! skew are ignored.
//!
//! Bounds are plain [`Rect`]s with `(x0, y0)` at the bottom-left corner and
//! `(x1, y1)` at the top-right corner. They are **not** normalized: a mirrored
//! node yields a negative [`Rect::width`] or [`Rect::height`]. [`overlaps`]
//! only looks at `min_*`/`max_*`, so it is unaffected by the sign.

use core::hash::{BuildHasher, Hash};

use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect};

/// Corner index of the bottom-left corner.
pub const BOTTOM_LEFT: usize = 0;
/// Corner index of the top-left corner.
pub const TOP_LEFT: usize = 1;
/// Corner index of the top-right corner.
pub const TOP_RIGHT: usize = 2;
/// Corner index of the bottom-right corner.
pub const BOTTOM_RIGHT: usize = 3;

/// Source of world-space corners for rectangular nodes.
///
/// Implemented by the host's transform/layout system. The core queries it
/// every evaluation, after the host has finalized transforms for the frame.
pub trait CornerSource<N: ?Sized> {
    /// Writes the world-space corners of `node` into `corners`.
    ///
    /// Corners are written in the order [`BOTTOM_LEFT`], [`TOP_LEFT`],
    /// [`TOP_RIGHT`], [`BOTTOM_RIGHT`]. Returns `false` when `node` cannot be
    /// resolved (for example a stale handle); the buffer contents are then
    /// unspecified.
    fn world_corners(&self, node: &N, corners: &mut [Point; 4]) -> bool;
}

impl<N: ?Sized, S: CornerSource<N> + ?Sized> CornerSource<N> for &S {
    fn world_corners(&self, node: &N, corners: &mut [Point; 4]) -> bool {
        (**self).world_corners(node, corners)
    }
}

/// A [`CornerSource`] backed by a closure. See [`corners_from_fn`].
#[derive(Clone, Copy)]
pub struct CornersFromFn<F>(F);

impl<F> core::fmt::Debug for CornersFromFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CornersFromFn").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`CornerSource`].
///
/// ```
/// use kurbo::Point;
/// use understory_visibility::{CornerScratch, corners_from_fn, world_rect};
///
/// let source = corners_from_fn(|id: &u32, out: &mut [Point; 4]| {
///     let x = f64::from(*id) * 10.0;
///     *out = [
///         Point::new(x, 0.0),
///         Point::new(x, 10.0),
///         Point::new(x + 10.0, 10.0),
///         Point::new(x + 10.0, 0.0),
///     ];
///     true
/// });
///
/// let mut scratch = CornerScratch::new();
/// let rect = world_rect(&source, &2, &mut scratch).unwrap();
/// assert_eq!(rect.x0, 20.0);
/// assert_eq!(rect.width(), 10.0);
/// ```
pub fn corners_from_fn<N, F>(f: F) -> CornersFromFn<F>
where
    N: ?Sized,
    F: Fn(&N, &mut [Point; 4]) -> bool,
{
    CornersFromFn(f)
}

impl<N, F> CornerSource<N> for CornersFromFn<F>
where
    N: ?Sized,
    F: Fn(&N, &mut [Point; 4]) -> bool,
{
    fn world_corners(&self, node: &N, corners: &mut [Point; 4]) -> bool {
        (self.0)(node, corners)
    }
}

/// A local rectangle placed in world space by an affine transform.
///
/// This is the minimal shape of what a layout system knows about a node. The
/// local rect uses the y-up convention: `(x0, y0)` is bottom-left and
/// `(x1, y1)` is top-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldQuad {
    /// Rectangle in the node's local space.
    pub local: Rect,
    /// Local-to-world transform.
    pub transform: Affine,
}

impl WorldQuad {
    /// Creates a quad from a local rect and a local-to-world transform.
    #[must_use]
    pub const fn new(local: Rect, transform: Affine) -> Self {
        Self { local, transform }
    }

    /// Creates a quad whose local space is world space.
    #[must_use]
    pub const fn from_world_rect(rect: Rect) -> Self {
        Self::new(rect, Affine::IDENTITY)
    }

    /// Writes the transformed corners in corner-index order.
    pub fn write_world_corners(&self, corners: &mut [Point; 4]) {
        let Rect { x0, y0, x1, y1 } = self.local;
        corners[BOTTOM_LEFT] = self.transform * Point::new(x0, y0);
        corners[TOP_LEFT] = self.transform * Point::new(x0, y1);
        corners[TOP_RIGHT] = self.transform * Point::new(x1, y1);
        corners[BOTTOM_RIGHT] = self.transform * Point::new(x1, y0);
    }

    /// Returns the transformed corners in corner-index order.
    #[must_use]
    pub fn world_corners(&self) -> [Point; 4] {
        let mut corners = [Point::ZERO; 4];
        self.write_world_corners(&mut corners);
        corners
    }
}

impl CornerSource<usize> for [WorldQuad] {
    fn world_corners(&self, node: &usize, corners: &mut [Point; 4]) -> bool {
        match self.get(*node) {
            Some(quad) => {
                quad.write_world_corners(corners);
                true
            }
            None => false,
        }
    }
}

impl<K, S> CornerSource<K> for HashMap<K, WorldQuad, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn world_corners(&self, node: &K, corners: &mut [Point; 4]) -> bool {
        match self.get(node) {
            Some(quad) => {
                quad.write_world_corners(corners);
                true
            }
            None => false,
        }
    }
}

/// Reusable corner buffer for [`world_rect`].
///
/// The buffer is overwritten by every query and carries no meaning between
/// calls. Use one per tracker, or one per thread in batch loops; it must not
/// be shared between concurrent evaluations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerScratch {
    pub(crate) corners: [Point; 4],
}

impl CornerScratch {
    /// Creates a zeroed scratch buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            corners: [Point::ZERO; 4],
        }
    }

    /// Returns the corners written by the most recent query.
    #[must_use]
    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }
}

impl Default for CornerScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the axis-aligned bounds from corners in corner-index order.
///
/// The result is `Rect::new(bl.x, bl.y, tr.x, tr.y)`, so its width and height
/// are `tr - bl` and may be negative.
#[must_use]
pub fn rect_from_corners(corners: &[Point; 4]) -> Rect {
    let bl = corners[BOTTOM_LEFT];
    let tr = corners[TOP_RIGHT];
    Rect::new(bl.x, bl.y, tr.x, tr.y)
}

/// Queries `source` for `node` and returns its world-space bounds.
///
/// Returns `None` when the source cannot resolve `node`. Does not allocate.
pub fn world_rect<N, S>(source: &S, node: &N, scratch: &mut CornerScratch) -> Option<Rect>
where
    N: ?Sized,
    S: CornerSource<N> + ?Sized,
{
    if !source.world_corners(node, &mut scratch.corners) {
        return None;
    }
    Some(rect_from_corners(&scratch.corners))
}

/// Returns `true` if `a` and `b` share an area of non-zero measure.
///
/// Rectangles that only touch along an edge or at a corner do not overlap, and
/// neither does a rect of zero width or height. Negative extents are handled by
/// using min/max bounds. Any NaN coordinate makes the result `false`.
///
/// A degenerate rect lying strictly inside the other one is therefore reported
/// as not overlapping. Comparing only the edges (`b.max_x() > a.min_x()` and
/// so on) would count it as overlapping; hosts that track zero-size elements
/// should give them a non-zero extent.
#[must_use]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    spans_overlap(a.min_x(), a.max_x(), b.min_x(), b.max_x())
        && spans_overlap(a.min_y(), a.max_y(), b.min_y(), b.max_y())
}

// Positive-length intersection of [a0, a1] and [b0, b1], with a0 <= a1 and
// b0 <= b1 unless NaN is involved. Every comparison fails on NaN.
fn spans_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    a0 < a1 && b0 < b1 && a0 < b1 && b0 < a1
}

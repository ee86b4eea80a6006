// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_bvh --heading-base-level=0

//! Understory BVH: a dynamic 2D bounding-volume hierarchy.
//!
//! Understory BVH answers "which items overlap this region" without rescanning every item.
//!
//! - Insert axis-aligned bounding boxes (AABBs) with owned payloads and get back a [`LeafHandle`].
//! - Delete or move individual items through their handle.
//! - Query by intersecting rectangle or point; results are produced lazily and whole
//!   subtrees that miss the query are skipped.
//!
//! It is generic over the scalar type `T` (`f32`, `f64`, `i64`) and does not depend on any
//! geometry crate. Enable the `kurbo` feature for conversions between [`Aabb2D<f64>`] and
//! `kurbo::Rect`.
//!
//! # Example
//!
//! ```rust
//! use understory_bvh::{Aabb2D, BoundingVolumeTree};
//!
//! let mut tree: BoundingVolumeTree<f64, &str> = BoundingVolumeTree::new();
//! let a = tree.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), "a");
//! let _b = tree.insert(Aabb2D::new(5.0, 5.0, 6.0, 6.0), "b");
//! let _c = tree.insert(Aabb2D::new(0.5, 0.5, 1.5, 1.5), "c");
//!
//! let mut hits: Vec<_> = tree.query(Aabb2D::new(0.0, 0.0, 2.0, 2.0)).copied().collect();
//! hits.sort();
//! assert_eq!(hits, ["a", "c"]);
//!
//! // Deleting hands the payload back.
//! assert_eq!(tree.delete(a), "a");
//! assert_eq!(tree.query_point(0.25, 0.25).count(), 0);
//! ```
//!
//! ## How it works
//!
//! Every item is a leaf. Internal nodes have exactly two children and store the exact union of
//! their boxes.
//!
//! - Insert walks down from the root, at each level stepping into the child whose box would grow
//!   least (by area) to cover the new box. Exact ties go to the first child. The leaf reached there
//!   is paired with the new leaf under a fresh internal node, and ancestors are refit.
//! - Delete removes the leaf and its parent; the sibling takes the parent's place, and ancestors
//!   are refit.
//! - Queries run a depth-first traversal with an explicit stack, pushing only children whose
//!   box overlaps the query.
//!
//! Boxes are closed: touching counts as overlapping. Degenerate (zero-area) boxes are fine.
//!
//! ## Handles and misuse
//!
//! Passing a stale handle (already deleted) or a handle from a different tree to
//! [`BoundingVolumeTree::delete`] or [`BoundingVolumeTree::update`] panics. These are bugs
//! in the caller's bookkeeping, not recoverable conditions. Use [`BoundingVolumeTree::contains`]
//! to probe a handle first.
//!
//! [`BoundingVolumeTree::validate`] checks the structural invariants and reports the first
//! violation as an [`InvariantViolation`]; it is meant for tests and debugging.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds may assert.
//! Area metrics use widened accumulators (`f32`→`f64`, `i64`→`i128`) to reduce precision pitfalls.
//!
//! ## Logging
//!
//! Structural events are reported through the [`log`](https://docs.rs/log) facade at `trace`
//! and `debug` level. No logger is installed by this crate.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod query;
pub mod tree;
pub mod types;
pub mod validate;

pub use query::{Iter, Query, QueryEntries};
pub use tree::{
    BoundingVolumeTree, BoundingVolumeTreeF32, BoundingVolumeTreeF64, BoundingVolumeTreeI64,
    LeafHandle,
};
pub use types::{Aabb2D, Scalar};
pub use validate::InvariantViolation;

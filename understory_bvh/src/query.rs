// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy traversals over a [`BoundingVolumeTree`].
//!
//! Overlap queries walk the tree depth-first with an explicit stack owned by the
//! iterator. A child is only pushed when its box overlaps the query box, so whole
//! subtrees are pruned without being visited. Results arrive in stack order; no
//! payload is ever yielded twice. Dropping an iterator early has no effect on the tree.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::{Enumerate, FusedIterator};
use core::slice;

use crate::tree::{BoundingVolumeTree, Kind, LeafHandle, NodeIdx, Slot};
use crate::types::{Aabb2D, Scalar};

impl<T: Scalar, P> BoundingVolumeTree<T, P> {
    /// Lazily yield every payload whose stored box overlaps `rect` (touching counts).
    pub fn query(&self, rect: Aabb2D<T>) -> Query<'_, T, P> {
        Query::new(self, rect)
    }

    /// Lazily yield every payload whose stored box contains the point.
    pub fn query_point(&self, x: T, y: T) -> Query<'_, T, P> {
        Query::new(self, Aabb2D::point(x, y))
    }

    /// Like [`query`](Self::query), but also yields each item's handle.
    pub fn query_entries(&self, rect: Aabb2D<T>) -> QueryEntries<'_, T, P> {
        QueryEntries {
            inner: Query::new(self, rect),
        }
    }

    /// Iterate over all items in arena order.
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            tree: self,
            slots: self.slots.iter().enumerate(),
        }
    }
}

impl<'a, T: Scalar, P> IntoIterator for &'a BoundingVolumeTree<T, P> {
    type Item = (LeafHandle, &'a P);
    type IntoIter = Iter<'a, T, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`BoundingVolumeTree::query`] and [`BoundingVolumeTree::query_point`].
pub struct Query<'a, T: Scalar, P> {
    tree: &'a BoundingVolumeTree<T, P>,
    rect: Aabb2D<T>,
    stack: Vec<NodeIdx>,
}

impl<'a, T: Scalar, P> Query<'a, T, P> {
    fn new(tree: &'a BoundingVolumeTree<T, P>, rect: Aabb2D<T>) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root
            && tree.node(root).bbox.overlaps(&rect)
        {
            stack.push(root);
        }
        Self { tree, rect, stack }
    }

    fn next_leaf(&mut self) -> Option<(NodeIdx, &'a P)> {
        let tree = self.tree;
        while let Some(idx) = self.stack.pop() {
            match &tree.node(idx).kind {
                Kind::Leaf(payload) => return Some((idx, payload)),
                Kind::Internal { children } => {
                    for &child in children {
                        if tree.node(child).bbox.overlaps(&self.rect) {
                            self.stack.push(child);
                        }
                    }
                }
            }
        }
        None
    }
}

impl<'a, T: Scalar, P> Iterator for Query<'a, T, P> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_leaf().map(|(_, payload)| payload)
    }
}

impl<T: Scalar, P> FusedIterator for Query<'_, T, P> {}

impl<T: Scalar, P> Debug for Query<'_, T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Query")
            .field("rect", &self.rect)
            .field("pending", &self.stack.len())
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`BoundingVolumeTree::query_entries`].
///
/// Collect the handles before deleting; the iterator borrows the tree.
pub struct QueryEntries<'a, T: Scalar, P> {
    inner: Query<'a, T, P>,
}

impl<'a, T: Scalar, P> Iterator for QueryEntries<'a, T, P> {
    type Item = (LeafHandle, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        let (leaf, payload) = self.inner.next_leaf()?;
        Some((self.inner.tree.handle_for(leaf), payload))
    }
}

impl<T: Scalar, P> FusedIterator for QueryEntries<'_, T, P> {}

impl<T: Scalar, P> Debug for QueryEntries<'_, T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("QueryEntries").field(&self.inner).finish()
    }
}

/// Iterator over every item, returned by [`BoundingVolumeTree::iter`].
pub struct Iter<'a, T: Scalar, P> {
    tree: &'a BoundingVolumeTree<T, P>,
    slots: Enumerate<slice::Iter<'a, Slot<T, P>>>,
}

impl<'a, T: Scalar, P> Iterator for Iter<'a, T, P> {
    type Item = (LeafHandle, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, slot) in self.slots.by_ref() {
            if let Some(node) = &slot.node
                && let Kind::Leaf(payload) = &node.kind
            {
                return Some((self.tree.handle_for(NodeIdx::new(i)), payload));
            }
        }
        None
    }
}

impl<T: Scalar, P> FusedIterator for Iter<'_, T, P> {}

impl<T: Scalar, P> Debug for Iter<'_, T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}

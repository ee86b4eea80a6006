// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural self-check for [`BoundingVolumeTree`].
//!
//! Public operations keep the tree consistent on their own; [`BoundingVolumeTree::validate`]
//! exists for tests and debugging. Node numbers in reports are arena slots.

use alloc::vec;

use crate::tree::{BoundingVolumeTree, Kind, NodeIdx};
use crate::types::{Scalar, union_aabb};

/// A broken structural invariant found by [`BoundingVolumeTree::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// The root records a parent.
    #[error("root node {node} has a parent link")]
    RootHasParent {
        /// Arena slot of the root.
        node: usize,
    },
    /// A node's parent link does not point at the node that holds it as a child.
    #[error("node {node} records parent {recorded:?} but is held by {actual}")]
    ParentMismatch {
        /// Arena slot of the child.
        node: usize,
        /// Parent slot stored on the child.
        recorded: Option<usize>,
        /// Slot of the internal node that lists the child.
        actual: usize,
    },
    /// An internal node's box is not exactly the union of its children's boxes.
    #[error("internal node {node} box is not the union of its children")]
    LooseBounds {
        /// Arena slot of the internal node.
        node: usize,
    },
    /// An internal node lists the same child in both positions.
    #[error("internal node {node} lists child {child} twice")]
    DuplicateChild {
        /// Arena slot of the internal node.
        node: usize,
        /// The repeated child slot.
        child: usize,
    },
    /// A node can be reached along more than one path (sharing or a cycle).
    #[error("node {node} is reachable more than once")]
    SharedNode {
        /// Arena slot reached twice.
        node: usize,
    },
    /// A link points at a free or out-of-range arena slot.
    #[error("link to node {missing} points at a free slot")]
    DanglingLink {
        /// The slot that should hold a live node.
        missing: usize,
    },
    /// Live nodes exist that the root cannot reach.
    #[error("{live} live nodes in the arena but only {reachable} reachable from the root")]
    Unreachable {
        /// Live nodes in the arena.
        live: usize,
        /// Nodes reached from the root.
        reachable: usize,
    },
    /// The recorded item count disagrees with the number of reachable leaves.
    #[error("tree records {recorded} items but {found} leaves are reachable")]
    LeafCount {
        /// Value returned by `len`.
        recorded: usize,
        /// Leaves found by traversal.
        found: usize,
    },
}

impl<T: Scalar, P> BoundingVolumeTree<T, P> {
    /// Check every structural invariant of the tree.
    ///
    /// - Each internal node has two distinct children and a box equal to their union.
    /// - Each node's parent link matches the node that holds it; the root has none.
    /// - Every live node is reachable from the root exactly once.
    /// - [`len`](Self::len) matches the number of leaves.
    ///
    /// Leaf boxes are not checked against anything: they are exactly what was inserted.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let live = self.slots.iter().filter(|s| s.node.is_some()).count();
        let Some(root) = self.root else {
            if live != 0 {
                return Err(InvariantViolation::Unreachable { live, reachable: 0 });
            }
            return check_leaf_count(self.leaves, 0);
        };

        let mut seen = vec![false; self.slots.len()];
        let mut stack = vec![(root, None::<NodeIdx>)];
        let mut reachable = 0;
        let mut leaves = 0;

        while let Some((idx, holder)) = stack.pop() {
            let Some(node) = self.slots.get(idx.get()).and_then(|s| s.node.as_ref()) else {
                return Err(InvariantViolation::DanglingLink { missing: idx.get() });
            };
            if seen[idx.get()] {
                return Err(InvariantViolation::SharedNode { node: idx.get() });
            }
            seen[idx.get()] = true;
            reachable += 1;

            match holder {
                None if node.parent.is_some() => {
                    return Err(InvariantViolation::RootHasParent { node: idx.get() });
                }
                Some(holder) if node.parent != Some(holder) => {
                    return Err(InvariantViolation::ParentMismatch {
                        node: idx.get(),
                        recorded: node.parent.map(NodeIdx::get),
                        actual: holder.get(),
                    });
                }
                _ => {}
            }

            match node.kind {
                Kind::Leaf(_) => leaves += 1,
                Kind::Internal {
                    children: [first, second],
                } => {
                    if first == second {
                        return Err(InvariantViolation::DuplicateChild {
                            node: idx.get(),
                            child: first.get(),
                        });
                    }
                    let child_box = |c: NodeIdx| {
                        self.slots
                            .get(c.get())
                            .and_then(|s| s.node.as_ref())
                            .map(|n| n.bbox)
                            .ok_or(InvariantViolation::DanglingLink { missing: c.get() })
                    };
                    if union_aabb(child_box(first)?, child_box(second)?) != node.bbox {
                        return Err(InvariantViolation::LooseBounds { node: idx.get() });
                    }
                    stack.push((first, Some(idx)));
                    stack.push((second, Some(idx)));
                }
            }
        }

        if reachable != live {
            return Err(InvariantViolation::Unreachable { live, reachable });
        }
        check_leaf_count(self.leaves, leaves)
    }
}

fn check_leaf_count(recorded: usize, found: usize) -> Result<(), InvariantViolation> {
    if recorded == found {
        Ok(())
    } else {
        Err(InvariantViolation::LeafCount { recorded, found })
    }
}

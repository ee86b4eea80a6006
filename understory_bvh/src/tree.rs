// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dynamic bounding-volume tree: node arena, insertion, and deletion.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::types::{Aabb2D, Scalar, growth, union_aabb};

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// Handle to one item stored in a [`BoundingVolumeTree`].
///
/// Returned by [`BoundingVolumeTree::insert`] and required by
/// [`BoundingVolumeTree::delete`] and [`BoundingVolumeTree::update`].
/// It consists of the owning tree's id, an arena slot, and a generation counter.
///
/// ## Semantics
///
/// - A handle stays valid across any number of unrelated inserts, deletes, and updates.
/// - Deleting the item (or [clearing](BoundingVolumeTree::clear) the tree) makes the handle stale.
/// - When a freed slot is reused, its generation differs, so a stale handle never
///   aliases a newer item.
/// - Handles from one tree are never accepted by another.
///
/// Use [`BoundingVolumeTree::contains`] to check a handle without panicking.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeafHandle {
    tree: u32,
    slot: u32,
    generation: u32,
}

impl LeafHandle {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Arena slots are addressed with 32 bits; trees never hold 2^32 nodes."
    )]
    const fn new(tree: u32, slot: usize, generation: u32) -> Self {
        Self {
            tree,
            slot: slot as u32,
            generation,
        }
    }

    const fn slot(self) -> usize {
        self.slot as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

pub(crate) enum Kind<P> {
    Leaf(P),
    Internal { children: [NodeIdx; 2] },
}

pub(crate) struct Node<T, P> {
    pub(crate) bbox: Aabb2D<T>,
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) kind: Kind<P>,
}

pub(crate) struct Slot<T, P> {
    pub(crate) generation: u32,
    pub(crate) node: Option<Node<T, P>>,
}

/// A dynamic bounding-volume hierarchy over 2D AABBs with payloads of type `P`.
///
/// Every item lives in its own leaf; every internal node has exactly two children
/// and a box that is the exact union of theirs. Insertion descends by least area
/// increase and pairs the new leaf with the leaf it reaches. Deletion promotes the
/// removed leaf's sibling into their parent's place. Both refit ancestor boxes up
/// to the root.
///
/// Nodes live in an arena; parent links are plain indices, so there are no
/// reference cycles and dropping the tree frees everything.
///
/// Mutation takes `&mut self` and queries borrow `&self`, so a running
/// [`query`](Self::query) can never observe a half-edited tree.
pub struct BoundingVolumeTree<T: Scalar, P> {
    pub(crate) id: u32,
    pub(crate) root: Option<NodeIdx>,
    pub(crate) slots: Vec<Slot<T, P>>,
    pub(crate) free_list: Vec<usize>,
    pub(crate) leaves: usize,
}

impl<T: Scalar, P> Default for BoundingVolumeTree<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, P> BoundingVolumeTree<T, P> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            root: None,
            slots: Vec::new(),
            free_list: Vec::new(),
            leaves: 0,
        }
    }

    /// Create an empty tree with arena space for at least `items` items.
    pub fn with_capacity(items: usize) -> Self {
        let mut tree = Self::new();
        tree.reserve(items);
        tree
    }

    /// Reserve arena space for at least `additional` more items.
    pub fn reserve(&mut self, additional: usize) {
        // n leaves need n - 1 internal nodes.
        self.slots.reserve(additional.saturating_mul(2));
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.leaves
    }

    /// True if the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounding box of everything in the tree, or `None` if empty.
    pub fn root_bounds(&self) -> Option<Aabb2D<T>> {
        self.root.map(|r| self.node(r).bbox)
    }

    /// Number of nodes on the longest root-to-leaf path (0 when empty).
    pub fn height(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut tallest = 0;
        let mut stack = Vec::from([(root, 1_usize)]);
        while let Some((idx, depth)) = stack.pop() {
            tallest = tallest.max(depth);
            if let Kind::Internal { children } = self.node(idx).kind {
                stack.extend(children.map(|c| (c, depth + 1)));
            }
        }
        tallest
    }

    /// Remove every item. All outstanding handles become stale.
    pub fn clear(&mut self) {
        log::debug!("clearing tree {} with {} items", self.id, self.leaves);
        self.root = None;
        self.leaves = 0;
        self.free_list.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(i);
        }
    }

    /// Insert an item with its bounding box. Returns the handle needed to delete it.
    ///
    /// The box is stored as given and never recomputed from the payload.
    /// Degenerate (zero-area) boxes are allowed.
    pub fn insert(&mut self, bbox: Aabb2D<T>, payload: P) -> LeafHandle {
        debug_assert!(!bbox.is_empty(), "inserted AABB is inverted: {bbox:?}");
        let leaf = self.alloc(Node {
            bbox,
            parent: None,
            kind: Kind::Leaf(payload),
        });
        self.leaves += 1;
        self.attach(leaf);
        self.handle_for(leaf)
    }

    /// Delete the item behind `handle` and return its payload.
    ///
    /// The leaf's parent becomes redundant and is removed too; the leaf's sibling
    /// takes the parent's place.
    ///
    /// # Panics
    ///
    /// If `handle` is stale (already deleted, or cleared) or came from another tree,
    /// or if the tree's structure is found to be corrupted.
    pub fn delete(&mut self, handle: LeafHandle) -> P {
        let leaf = self.resolve(handle);
        self.detach(leaf);
        self.leaves -= 1;
        match self.release(leaf).kind {
            Kind::Leaf(payload) => payload,
            Kind::Internal { .. } => unreachable!("resolved handles always name leaves"),
        }
    }

    /// Replace the bounding box of an item, repositioning it in the tree.
    ///
    /// The handle stays valid.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`delete`](Self::delete).
    pub fn update(&mut self, handle: LeafHandle, bbox: Aabb2D<T>) {
        debug_assert!(!bbox.is_empty(), "updated AABB is inverted: {bbox:?}");
        let leaf = self.resolve(handle);
        self.detach(leaf);
        self.node_mut(leaf).bbox = bbox;
        self.attach(leaf);
    }

    /// True if `handle` refers to an item currently in this tree.
    pub fn contains(&self, handle: LeafHandle) -> bool {
        self.lookup(handle).is_some()
    }

    /// The payload behind `handle`, or `None` if the handle is stale or foreign.
    pub fn get(&self, handle: LeafHandle) -> Option<&P> {
        match &self.node(self.lookup(handle)?).kind {
            Kind::Leaf(payload) => Some(payload),
            Kind::Internal { .. } => None,
        }
    }

    /// Mutable access to the payload behind `handle`.
    pub fn get_mut(&mut self, handle: LeafHandle) -> Option<&mut P> {
        let leaf = self.lookup(handle)?;
        match &mut self.node_mut(leaf).kind {
            Kind::Leaf(payload) => Some(payload),
            Kind::Internal { .. } => None,
        }
    }

    /// The box stored for `handle`, or `None` if the handle is stale or foreign.
    pub fn bounds(&self, handle: LeafHandle) -> Option<Aabb2D<T>> {
        self.lookup(handle).map(|leaf| self.node(leaf).bbox)
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &Node<T, P> {
        self.slots
            .get(idx.get())
            .and_then(|s| s.node.as_ref())
            .unwrap_or_else(|| panic!("corrupted tree: node {} is not live", idx.get()))
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<T, P> {
        self.slots
            .get_mut(idx.get())
            .and_then(|s| s.node.as_mut())
            .unwrap_or_else(|| panic!("corrupted tree: node {} is not live", idx.get()))
    }

    pub(crate) fn handle_for(&self, leaf: NodeIdx) -> LeafHandle {
        LeafHandle::new(self.id, leaf.get(), self.slots[leaf.get()].generation)
    }

    fn lookup(&self, handle: LeafHandle) -> Option<NodeIdx> {
        if handle.tree != self.id {
            return None;
        }
        let slot = self.slots.get(handle.slot())?;
        if slot.generation != handle.generation {
            return None;
        }
        match slot.node {
            Some(Node {
                kind: Kind::Leaf(_),
                ..
            }) => Some(NodeIdx::new(handle.slot())),
            _ => None,
        }
    }

    fn resolve(&self, handle: LeafHandle) -> NodeIdx {
        assert!(
            handle.tree == self.id,
            "leaf handle {handle:?} belongs to a different tree (this is tree {})",
            self.id
        );
        self.lookup(handle).unwrap_or_else(|| {
            panic!("leaf handle {handle:?} is stale: its item was already deleted")
        })
    }

    fn alloc(&mut self, node: Node<T, P>) -> NodeIdx {
        if let Some(i) = self.free_list.pop() {
            self.slots[i].node = Some(node);
            NodeIdx::new(i)
        } else {
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeIdx::new(self.slots.len() - 1)
        }
    }

    fn release(&mut self, idx: NodeIdx) -> Node<T, P> {
        let slot = &mut self.slots[idx.get()];
        let node = slot
            .node
            .take()
            .unwrap_or_else(|| panic!("corrupted tree: node {} released twice", idx.get()));
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx.get());
        node
    }

    fn children(&self, idx: NodeIdx) -> [NodeIdx; 2] {
        match self.node(idx).kind {
            Kind::Internal { children } => children,
            Kind::Leaf(_) => panic!("corrupted tree: leaf {} is used as a parent", idx.get()),
        }
    }

    /// Link a parentless leaf into the tree next to the leaf whose box grows least.
    fn attach(&mut self, leaf: NodeIdx) {
        let Some(root) = self.root else {
            log::trace!("leaf {} becomes the root of an empty tree", leaf.get());
            self.root = Some(leaf);
            return;
        };
        let bbox = self.node(leaf).bbox;
        let sibling = self.choose_sibling(root, &bbox);
        let former_parent = self.node(sibling).parent;
        let joined = union_aabb(bbox, self.node(sibling).bbox);
        let branch = self.alloc(Node {
            bbox: joined,
            parent: former_parent,
            kind: Kind::Internal {
                children: [leaf, sibling],
            },
        });
        log::trace!(
            "leaf {} paired with sibling {} under new node {}",
            leaf.get(),
            sibling.get(),
            branch.get()
        );
        self.node_mut(leaf).parent = Some(branch);
        self.node_mut(sibling).parent = Some(branch);
        match former_parent {
            Some(parent) => self.replace_child(parent, sibling, branch),
            None => self.root = Some(branch),
        }
        self.refit(former_parent);
    }

    /// Descend from `root` by least area increase until a leaf is reached.
    fn choose_sibling(&self, root: NodeIdx, bbox: &Aabb2D<T>) -> NodeIdx {
        let mut current = root;
        while let Kind::Internal {
            children: [first, second],
        } = self.node(current).kind
        {
            let cost_first = growth(&self.node(first).bbox, bbox);
            let cost_second = growth(&self.node(second).bbox, bbox);
            // Exact ties go to the first child.
            current = if cost_first <= cost_second {
                first
            } else {
                second
            };
        }
        current
    }

    /// Unlink a leaf, collapsing its parent so the sibling moves up one level.
    fn detach(&mut self, leaf: NodeIdx) {
        let Some(parent) = self.node(leaf).parent else {
            assert_eq!(
                self.root,
                Some(leaf),
                "corrupted tree: parentless node {} is not the root",
                leaf.get()
            );
            self.root = None;
            return;
        };
        let sibling = self.sibling_of(parent, leaf);
        let grandparent = self.node(parent).parent;
        self.release(parent);
        self.node_mut(leaf).parent = None;
        self.node_mut(sibling).parent = grandparent;
        match grandparent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.refit(Some(grandparent));
            }
            None => {
                log::trace!("node {} promoted to root", sibling.get());
                self.root = Some(sibling);
            }
        }
    }

    fn sibling_of(&self, parent: NodeIdx, child: NodeIdx) -> NodeIdx {
        match self.children(parent) {
            [a, b] if a == child => b,
            [a, b] if b == child => a,
            _ => panic!(
                "corrupted tree: node {} is not a child of its recorded parent {}",
                child.get(),
                parent.get()
            ),
        }
    }

    fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        let Kind::Internal { children } = &mut self.node_mut(parent).kind else {
            panic!("corrupted tree: leaf {} is used as a parent", parent.get());
        };
        let Some(slot) = children.iter_mut().find(|c| **c == old) else {
            panic!(
                "corrupted tree: node {} is missing from its parent {}",
                old.get(),
                parent.get()
            );
        };
        *slot = new;
    }

    /// Recompute boxes from `from` up to the root.
    fn refit(&mut self, from: Option<NodeIdx>) {
        let mut cursor = from;
        while let Some(idx) = cursor {
            let [first, second] = self.children(idx);
            let bbox = union_aabb(self.node(first).bbox, self.node(second).bbox);
            let node = self.node_mut(idx);
            node.bbox = bbox;
            cursor = node.parent;
        }
    }
}

impl<T: Scalar, P> Debug for BoundingVolumeTree<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundingVolumeTree")
            .field("id", &self.id)
            .field("len", &self.leaves)
            .field("arena_nodes", &self.slots.len())
            .field("free_slots", &self.free_list.len())
            .field("root_bounds", &self.root_bounds())
            .finish_non_exhaustive()
    }
}

/// Convenience type aliases for common scalar choices.
/// Tree with f32 coordinates and f64 area metrics.
pub type BoundingVolumeTreeF32<P> = BoundingVolumeTree<f32, P>;

/// Tree with f64 coordinates and f64 area metrics.
pub type BoundingVolumeTreeF64<P> = BoundingVolumeTree<f64, P>;

/// Tree with i64 coordinates and i128 area metrics.
pub type BoundingVolumeTreeI64<P> = BoundingVolumeTree<i64, P>;

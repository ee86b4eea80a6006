// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory BVH: insert, query, move, and delete.

use understory_bvh::{Aabb2D, BoundingVolumeTree};

fn main() {
    let mut tree: BoundingVolumeTree<i64, u32> = BoundingVolumeTree::new();
    let k1 = tree.insert(Aabb2D::new(0, 0, 10, 10), 1);
    let _k2 = tree.insert(Aabb2D::new(5, 5, 15, 15), 2);

    // Query a point covered by both boxes
    let hits: Vec<_> = tree.query_point(6, 6).collect();
    println!("hits at (6,6): {:?}", hits);

    // Move box 1 away
    tree.update(k1, Aabb2D::new(20, 0, 30, 10));
    let hits: Vec<_> = tree.query_point(6, 6).collect();
    println!("hits at (6,6) after move: {:?}", hits);

    let payload = tree.delete(k1);
    println!("deleted {payload}; {} item(s) left", tree.len());
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-window example using Kurbo rectangles and overlap queries.
//!
//! Run:
//! - `cargo run -p understory_demos --example bvh_visible_list`

use kurbo::Rect;
use understory_bvh::{Aabb2D, BoundingVolumeTreeF64};

const ROW_H: f64 = 20.0;
const WIDTH: f64 = 200.0;

fn main() {
    let mut tree = BoundingVolumeTreeF64::with_capacity(1000);

    let rows = 1000_usize;
    for i in 0..rows {
        let y0 = i as f64 * ROW_H;
        // Shrink by one unit so neighbouring rows don't touch.
        let row = Rect::new(0.0, y0, WIDTH, y0 + ROW_H - 1.0);
        let _ = tree.insert(Aabb2D::from(row), i);
    }

    // Simulate a few scroll positions by changing the viewport rectangle
    for scroll in [0.0, 30.0, 200.0, 600.0] {
        let viewport = Rect::new(0.0, scroll, WIDTH, scroll + 100.0);
        let mut indices: Vec<usize> = tree.query(viewport.into()).copied().collect();
        indices.sort_unstable();
        println!("scroll={scroll:.1} -> visible indices: {:?}", indices);
    }

    if let Some(bounds) = tree.root_bounds() {
        println!("content bounds: {:?}", Rect::from(bounds));
    }
}

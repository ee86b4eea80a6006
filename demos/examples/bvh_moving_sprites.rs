// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase over moving sprites.
//!
//! Sprites drift each frame and are moved with `update`; a region query culls
//! the ones that reach the right-hand edge, deleting them through their handles.
//!
//! Run (set `RUST_LOG=trace` to watch structural changes):
//! - `cargo run -p understory_demos --example bvh_moving_sprites`

use kurbo::{Rect, Vec2};
use understory_bvh::{Aabb2D, BoundingVolumeTreeF64, LeafHandle};

const WORLD: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);
const SPRITE: f64 = 12.0;

#[derive(Debug)]
struct Sprite {
    name: String,
    velocity: Vec2,
}

fn main() {
    env_logger::init();

    let mut tree = BoundingVolumeTreeF64::new();
    let mut handles: Vec<LeafHandle> = Vec::new();
    for i in 0..8 {
        let origin = Vec2::new(20.0 + 40.0 * f64::from(i), 30.0 * f64::from(i));
        let rect = Rect::from_origin_size(origin.to_point(), (SPRITE, SPRITE));
        let sprite = Sprite {
            name: format!("sprite-{i}"),
            velocity: Vec2::new(15.0 + 5.0 * f64::from(i), 4.0),
        };
        handles.push(tree.insert(rect.into(), sprite));
    }

    let exit_zone = Rect::new(WORLD.x1 - 20.0, WORLD.y0, WORLD.x1, WORLD.y1);
    for frame in 0..6 {
        for &h in &handles {
            let (Some(bounds), Some(sprite)) = (tree.bounds(h), tree.get(h)) else {
                continue;
            };
            let moved = Rect::from(bounds) + sprite.velocity;
            tree.update(h, moved.into());
        }

        let leaving: Vec<LeafHandle> = tree
            .query_entries(Aabb2D::from(exit_zone))
            .map(|(h, _)| h)
            .collect();
        for h in leaving {
            let sprite = tree.delete(h);
            log::info!("frame {frame}: {} left the world", sprite.name);
        }
        handles.retain(|h| tree.contains(*h));

        tree.validate().expect("tree stays consistent while sprites move");
        println!("frame {frame}: {} sprites on screen", tree.len());
    }
}

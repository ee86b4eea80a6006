// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_bvh::{Aabb2D, BoundingVolumeTree, BoundingVolumeTreeF32, BoundingVolumeTreeF64};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, world: f64, rect_w: f64, rect_h: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (world - rect_w).max(1.0);
        let y0 = rng.next_f64() * (world - rect_h).max(1.0);
        out.push(Aabb2D::<f64>::from_xywh(x0, y0, rect_w, rect_h));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Aabb2D::<f64>::from_xywh(cx + dx, cy + dy, 12.0, 12.0));
        }
    }
    out
}

fn build(rects: &[Aabb2D<f64>]) -> BoundingVolumeTreeF64<u32> {
    let mut tree = BoundingVolumeTree::with_capacity(rects.len());
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = tree.insert(r, i as u32);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_f64");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter(|| black_box(build(&rects)));
        });
    }
    let random = gen_random_rects(10_000, 4096.0, 16.0, 16.0);
    group.throughput(Throughput::Elements(random.len() as u64));
    group.bench_function("random_10k", |b| {
        b.iter(|| black_box(build(&random)));
    });
    let clustered = gen_clustered_rects(20, 500, 150.0);
    group.bench_function("clustered_10k", |b| {
        b.iter(|| black_box(build(&clustered)));
    });
    group.finish();
}

fn bench_query_vs_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_f64");
    let rects = gen_random_rects(20_000, 8192.0, 16.0, 16.0);
    let tree = build(&rects);
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let queries: Vec<_> = (0..256)
        .map(|_| {
            let x0 = rng.next_f64() * 8000.0;
            let y0 = rng.next_f64() * 8000.0;
            Aabb2D::<f64>::from_xywh(x0, y0, 200.0, 200.0)
        })
        .collect();
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("tree_rect_256", |b| {
        b.iter(|| {
            let hits: usize = queries.iter().map(|q| tree.query(*q).count()).sum();
            black_box(hits)
        });
    });

    group.bench_function("linear_scan_rect_256", |b| {
        b.iter(|| {
            let hits: usize = queries
                .iter()
                .map(|q| rects.iter().filter(|r| r.overlaps(q)).count())
                .sum();
            black_box(hits)
        });
    });

    group.bench_function("tree_point_256", |b| {
        b.iter(|| {
            let hits: usize = queries
                .iter()
                .map(|q| tree.query_point(q.min_x, q.min_y).count())
                .sum();
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn_f64");
    let rects = gen_random_rects(5_000, 4096.0, 16.0, 16.0);

    group.bench_function("delete_reinsert_half", |b| {
        b.iter_batched(
            || {
                let mut tree = BoundingVolumeTree::with_capacity(rects.len());
                let handles: Vec<_> = rects
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(i, r)| tree.insert(r, i as u32))
                    .collect();
                (tree, handles)
            },
            |(mut tree, handles): (BoundingVolumeTreeF64<u32>, _)| {
                for h in handles.iter().step_by(2) {
                    let id = tree.delete(*h);
                    let _ = tree.insert(rects[id as usize], id);
                }
                black_box(tree.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("update_move_all", |b| {
        b.iter_batched(
            || {
                let mut tree = BoundingVolumeTree::with_capacity(rects.len());
                let handles: Vec<_> = rects
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(i, r)| tree.insert(r, i as u32))
                    .collect();
                (tree, handles)
            },
            |(mut tree, handles): (BoundingVolumeTreeF64<u32>, Vec<_>)| {
                for (h, r) in handles.iter().zip(&rects) {
                    let moved = Aabb2D::new(r.min_x + 3.0, r.min_y, r.max_x + 3.0, r.max_y);
                    tree.update(*h, moved);
                }
                black_box(tree.root_bounds())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_insert_f32(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_f32");
    let rects: Vec<Aabb2D<f32>> = gen_random_rects(10_000, 4096.0, 16.0, 16.0)
        .into_iter()
        .map(|r| Aabb2D::new(r.min_x as f32, r.min_y as f32, r.max_x as f32, r.max_y as f32))
        .collect();
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("random_10k", |b| {
        b.iter(|| {
            let mut tree: BoundingVolumeTreeF32<u32> =
                BoundingVolumeTree::with_capacity(rects.len());
            for (i, r) in rects.iter().copied().enumerate() {
                let _ = tree.insert(r, i as u32);
            }
            black_box(tree)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_query_vs_scan,
    bench_churn,
    bench_insert_f32
);
criterion_main!(benches);

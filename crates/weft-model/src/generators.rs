//! Procedural model generators for benchmarks and testing.
//!
//! Deterministic, resolution-configurable cloth models with the full
//! constraint complement: structural rods, quad shape elements, bends
//! across interior edges, diagonal springs, and one fit cluster.

use glam::Vec3;

use weft_types::WeftResult;

use crate::builder::ModelBuilder;
use crate::desc::{BendDesc, FitClusterDesc, QuadDesc, RodDesc, SpringDesc};
use crate::model::DeformableModel;

/// Generates a rectangular hanging-cloth model.
///
/// The grid has `(cols + 1) × (rows + 1)` nodes spaced `spacing` apart
/// in the XY plane, hanging downward from y = 0. With `pin_top_row`
/// the entire top row becomes the static prefix.
///
/// # Example
/// ```
/// use weft_model::generators::cloth_grid;
/// let model = cloth_grid(2, 2, 0.1, true).unwrap();
/// assert_eq!(model.node_count(), 9);
/// assert_eq!(model.static_node_count(), 3);
/// ```
pub fn cloth_grid(
    cols: usize,
    rows: usize,
    spacing: f32,
    pin_top_row: bool,
) -> WeftResult<DeformableModel> {
    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let mut rest = Vec::with_capacity(verts_x * verts_y);
    for j in 0..verts_y {
        for i in 0..verts_x {
            rest.push(Vec3::new(i as f32 * spacing, -(j as f32) * spacing, 0.0));
        }
    }

    let static_count = if pin_top_row { verts_x } else { 0 };
    let mut builder = ModelBuilder::new(rest, static_count)?;

    let node = |i: usize, j: usize| (j * verts_x + i) as u32;

    // Structural rods along every grid edge.
    for j in 0..verts_y {
        for i in 0..verts_x {
            if i + 1 < verts_x && !(pin_top_row && j == 0) {
                builder.add_rod(RodDesc {
                    node0: node(i, j),
                    node1: node(i + 1, j),
                    min_dist: spacing,
                    max_dist: spacing,
                    weight0: 0.5,
                    relaxation: 1.0,
                });
            }
            if j + 1 < verts_y {
                builder.add_rod(RodDesc {
                    node0: node(i, j),
                    node1: node(i, j + 1),
                    min_dist: spacing,
                    max_dist: spacing,
                    weight0: 0.5,
                    relaxation: 1.0,
                });
            }
        }
    }

    // One shape-matching quad per cell, corners in cyclic order.
    for j in 0..rows {
        for i in 0..cols {
            builder.add_quad(QuadDesc {
                nodes: [
                    node(i, j),
                    node(i + 1, j),
                    node(i + 1, j + 1),
                    node(i, j + 1),
                ],
                weights: [1.0; 4],
            });
        }
    }

    // Bends across interior horizontal edges (between vertical cell pairs).
    for j in 1..rows {
        for i in 0..cols {
            builder.add_bend(BendDesc {
                edge: [node(i, j), node(i + 1, j)],
                virtuals: [
                    node(i, j - 1),
                    node(i + 1, j - 1),
                    node(i, j + 1),
                    node(i + 1, j + 1),
                ],
                te: 0.5,
                tv: 0.5,
                dist: None,
                weights: [0.25; 4],
            });
        }
    }

    // Diagonal shear springs.
    for j in 0..rows {
        for i in 0..cols {
            builder.add_spring(SpringDesc {
                node0: node(i, j),
                node1: node(i + 1, j + 1),
                rest_length: None,
                stiffness: 10.0,
                damping: 0.5,
                weight0: 0.5,
            });
        }
    }

    // One fit cluster over the bottom row, anchored at its center node.
    let bottom = verts_y - 1;
    builder.add_fit_cluster(FitClusterDesc {
        anchor: node(verts_x / 2, bottom),
        members: (0..verts_x).map(|i| (node(i, bottom), 1.0)).collect(),
    });

    builder.build()
}

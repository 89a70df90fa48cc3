//! Bone fit and feedback.
//!
//! The fit stage matches each cluster's deformed member positions
//! against their rest offsets and extracts the best rigid transform —
//! the bridge from simulation to skeletal skinning. Feedback runs the
//! other way: an externally animated transform pulls the cluster's
//! simulated nodes toward the pose it implies.

use glam::{Affine3A, Mat3, Vec3};
use weft_math::svd::svd3;
use weft_model::DeformableModel;

use crate::config::SolverConfig;

/// Compute one rigid transform per fit cluster.
///
/// For each cluster the deformed covariance `Apq = Σ w·(d ⊗ r)` is
/// normalized by the precomputed rest-shape pseudo-inverse and its
/// rotation extracted via SVD. The result maps cluster-local rest
/// offsets into world space: `x = R·r + center`, with the cluster's
/// dynamic center (the weighted mean of member positions) as
/// translation. Degenerate clusters still produce a right-handed
/// orthonormal rotation — the SVD falls back to arbitrary
/// perpendicular axes.
pub fn fit_transforms(
    model: &DeformableModel,
    positions: &[Vec3],
    config: &SolverConfig,
    out: &mut [Affine3A],
) {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(out.len(), model.fit_clusters().len());

    for (cluster, slot) in model.fit_clusters().iter().zip(out.iter_mut()) {
        let mut center = Vec3::ZERO;
        for member in &cluster.members {
            center += positions[member.node.index()] * member.weight;
        }
        let center = center / cluster.total_weight;

        let mut apq = Mat3::ZERO;
        for member in &cluster.members {
            let d = positions[member.node.index()] - center;
            let r = member.rest_offset;
            // Outer product d ⊗ r, accumulated column-wise.
            apq += Mat3::from_cols(d * (member.weight * r.x), d * (member.weight * r.y), d * (member.weight * r.z));
        }

        let normalized = apq * cluster.inv_qq;
        let svd = svd3(&normalized, config.svd_sweeps, config.svd_epsilon);
        let rotation = svd.u * svd.v.transpose();

        *slot = Affine3A::from_mat3_translation(rotation, center);
    }
}

/// Pull each cluster's member nodes toward an externally supplied
/// transform.
///
/// `transforms` uses the same convention as [`fit_transforms`]: each
/// maps cluster-local rest offsets to world space. `stiffness` of 0 is
/// a no-op, 1 snaps members to the implied pose. Static nodes are
/// never moved.
pub fn feedback_fit_transforms(
    model: &DeformableModel,
    positions: &mut [Vec3],
    transforms: &[Affine3A],
    stiffness: f32,
) {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(transforms.len(), model.fit_clusters().len());

    if stiffness <= 0.0 {
        return;
    }
    let stiffness = stiffness.min(1.0);

    for (cluster, transform) in model.fit_clusters().iter().zip(transforms.iter()) {
        for member in &cluster.members {
            let i = member.node.index();
            if i < model.static_node_count() {
                continue;
            }
            let target = transform.transform_point3(member.rest_offset);
            positions[i] += (target - positions[i]) * stiffness;
        }
    }
}

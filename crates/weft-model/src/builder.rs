//! Build-time validation and classification.
//!
//! The builder is the only way to construct a [`DeformableModel`]. It
//! checks every precondition the solver relies on — index ranges,
//! weight ranges, non-degenerate rest shapes — so the hot relaxation
//! paths can stay assertion-only. Malformed topology is unrepresentable
//! downstream of a successful `build()`.

use glam::{Mat3, Vec2, Vec3};
use weft_math::svd::pseudo_inverse;
use weft_math::sym3::SymMat3x;
use weft_types::constants::{DEFAULT_SVD_SWEEPS, EPSILON, PSEUDO_INVERSE_EPSILON};
use weft_types::{NodeId, WeftError, WeftResult};

use crate::desc::{BendDesc, FitClusterDesc, QuadDesc, RodDesc, SpringDesc, TriDesc};
use crate::model::{
    AxialBend, DeformableModel, FitCluster, FitWeight, QuadElement, Rod, Spring, TriElement,
};

/// Collects descriptors and validates them into a [`DeformableModel`].
pub struct ModelBuilder {
    rest_positions: Vec<Vec3>,
    static_node_count: usize,
    collision_radii: Vec<f32>,
    rods: Vec<RodDesc>,
    tris: Vec<TriDesc>,
    quads: Vec<QuadDesc>,
    bends: Vec<BendDesc>,
    springs: Vec<SpringDesc>,
    fit_clusters: Vec<FitClusterDesc>,
}

impl ModelBuilder {
    /// Start a build from rest-pose positions and the immovable prefix
    /// length.
    pub fn new(rest_positions: Vec<Vec3>, static_node_count: usize) -> WeftResult<Self> {
        if static_node_count > rest_positions.len() {
            return Err(WeftError::InvalidTopology(format!(
                "static node count ({static_node_count}) exceeds node count ({})",
                rest_positions.len()
            )));
        }
        for (i, p) in rest_positions.iter().enumerate() {
            if !p.is_finite() {
                return Err(WeftError::InvalidTopology(format!(
                    "rest position of node {i} is not finite"
                )));
            }
        }
        Ok(Self {
            rest_positions,
            static_node_count,
            collision_radii: Vec::new(),
            rods: Vec::new(),
            tris: Vec::new(),
            quads: Vec::new(),
            bends: Vec::new(),
            springs: Vec::new(),
            fit_clusters: Vec::new(),
        })
    }

    /// Set per-node collision radii (length must match the node count).
    pub fn collision_radii(&mut self, radii: Vec<f32>) -> &mut Self {
        self.collision_radii = radii;
        self
    }

    pub fn add_rod(&mut self, desc: RodDesc) -> &mut Self {
        self.rods.push(desc);
        self
    }

    pub fn add_tri(&mut self, desc: TriDesc) -> &mut Self {
        self.tris.push(desc);
        self
    }

    pub fn add_quad(&mut self, desc: QuadDesc) -> &mut Self {
        self.quads.push(desc);
        self
    }

    pub fn add_bend(&mut self, desc: BendDesc) -> &mut Self {
        self.bends.push(desc);
        self
    }

    pub fn add_spring(&mut self, desc: SpringDesc) -> &mut Self {
        self.springs.push(desc);
        self
    }

    pub fn add_fit_cluster(&mut self, desc: FitClusterDesc) -> &mut Self {
        self.fit_clusters.push(desc);
        self
    }

    fn check_node(&self, index: u32) -> WeftResult<()> {
        if (index as usize) < self.rest_positions.len() {
            Ok(())
        } else {
            Err(WeftError::NodeIndexOutOfRange {
                index,
                count: self.rest_positions.len() as u32,
            })
        }
    }

    fn is_static(&self, index: u32) -> bool {
        (index as usize) < self.static_node_count
    }

    fn rest(&self, index: u32) -> Vec3 {
        self.rest_positions[index as usize]
    }

    /// Validate everything and produce the immutable model.
    pub fn build(&self) -> WeftResult<DeformableModel> {
        if !self.collision_radii.is_empty() && self.collision_radii.len() != self.rest_positions.len()
        {
            return Err(WeftError::InvalidTopology(format!(
                "collision radii length ({}) != node count ({})",
                self.collision_radii.len(),
                self.rest_positions.len()
            )));
        }

        let rods = self.build_rods()?;
        let (tris, tri_two_pinned, tri_one_pinned) = self.build_tris()?;
        let (quads, quad_two_pinned, quad_one_pinned) = self.build_quads()?;
        let bends = self.build_bends()?;
        let springs = self.build_springs()?;
        let fit_clusters = self.build_fit_clusters()?;

        Ok(DeformableModel {
            node_count: self.rest_positions.len(),
            static_node_count: self.static_node_count,
            rest_positions: self.rest_positions.clone(),
            rods,
            tris,
            tri_two_pinned,
            tri_one_pinned,
            quads,
            quad_two_pinned,
            quad_one_pinned,
            bends,
            springs,
            fit_clusters,
            collision_radii: self.collision_radii.clone(),
        })
    }

    fn build_rods(&self) -> WeftResult<Vec<Rod>> {
        let mut rods = Vec::with_capacity(self.rods.len());
        for (i, desc) in self.rods.iter().enumerate() {
            self.check_node(desc.node0)?;
            self.check_node(desc.node1)?;
            check_unit_range(desc.weight0, "rod weight0", i)?;
            check_unit_range(desc.relaxation, "rod relaxation", i)?;
            if !(desc.min_dist >= 0.0 && desc.min_dist <= desc.max_dist) {
                return Err(WeftError::InvalidParameter(format!(
                    "rod {i}: distance range [{}, {}] is invalid",
                    desc.min_dist, desc.max_dist
                )));
            }

            let s0 = self.is_static(desc.node0);
            let s1 = self.is_static(desc.node1);
            if s0 && s1 {
                return Err(WeftError::InvalidTopology(format!(
                    "rod {i} connects two static nodes"
                )));
            }
            // A static endpoint must receive no correction.
            let weight0 = if s0 {
                0.0
            } else if s1 {
                1.0
            } else {
                desc.weight0
            };

            rods.push(Rod {
                nodes: [NodeId(desc.node0), NodeId(desc.node1)],
                min_dist: desc.min_dist,
                max_dist: desc.max_dist,
                weight0,
                relaxation: desc.relaxation,
            });
        }
        Ok(rods)
    }

    fn build_tris(&self) -> WeftResult<(Vec<TriElement>, usize, usize)> {
        let mut two = Vec::new();
        let mut one = Vec::new();
        let mut free = Vec::new();

        for (i, desc) in self.tris.iter().enumerate() {
            for &n in &desc.nodes {
                self.check_node(n)?;
            }
            for &w in &desc.weights {
                check_unit_range(w, "tri weight", i)?;
            }

            let pinned = desc.nodes.map(|n| self.is_static(n));
            let pin_count = pinned.iter().filter(|&&p| p).count();
            let rot = tri_rotation(pinned);
            let nodes = [0, 1, 2].map(|k| desc.nodes[(k + rot) % 3]);
            let mut weights = [0, 1, 2].map(|k| desc.weights[(k + rot) % 3]);
            for (w, &n) in weights.iter_mut().zip(nodes.iter()) {
                if self.is_static(n) {
                    *w = 0.0;
                }
            }

            let p = nodes.map(|n| self.rest(n));
            let (e1, e2) = tri_frame(p[0], p[1], p[2])
                .ok_or_else(|| WeftError::InvalidTopology(format!("tri {i} is degenerate at rest")))?;

            let level = pin_count.min(2);
            let origin = if level == 0 {
                weighted_center_3(&p, &weights).ok_or_else(|| {
                    WeftError::InvalidParameter(format!("tri {i}: all corner weights are zero"))
                })?
            } else {
                p[0]
            };

            let rest = p.map(|v| Vec2::new(e1.dot(v - origin), e2.dot(v - origin)));
            let elem = TriElement {
                nodes: nodes.map(NodeId),
                rest,
                weights,
            };
            match level {
                2 => two.push(elem),
                1 => one.push(elem),
                _ => free.push(elem),
            }
        }

        let counts = (two.len(), one.len());
        let mut tris = two;
        tris.extend(one);
        tris.extend(free);
        Ok((tris, counts.0, counts.1))
    }

    fn build_quads(&self) -> WeftResult<(Vec<QuadElement>, usize, usize)> {
        let mut two = Vec::new();
        let mut one = Vec::new();
        let mut free = Vec::new();

        for (i, desc) in self.quads.iter().enumerate() {
            for &n in &desc.nodes {
                self.check_node(n)?;
            }
            for &w in &desc.weights {
                check_unit_range(w, "quad weight", i)?;
            }

            let pinned = desc.nodes.map(|n| self.is_static(n));
            let pin_count = pinned.iter().filter(|&&p| p).count();
            let rot = quad_rotation(pinned).ok_or_else(|| {
                WeftError::InvalidTopology(format!(
                    "quad {i}: pinned corners are diagonal; they must share an edge"
                ))
            })?;
            let nodes = [0, 1, 2, 3].map(|k| desc.nodes[(k + rot) % 4]);
            let mut weights = [0, 1, 2, 3].map(|k| desc.weights[(k + rot) % 4]);
            for (w, &n) in weights.iter_mut().zip(nodes.iter()) {
                if self.is_static(n) {
                    *w = 0.0;
                }
            }

            let p = nodes.map(|n| self.rest(n));
            let (e1, e2, e3) = quad_frame(&p).ok_or_else(|| {
                WeftError::InvalidTopology(format!("quad {i} is degenerate at rest"))
            })?;

            let level = pin_count.min(2);
            let origin = if level == 0 {
                weighted_center_4(&p, &weights).ok_or_else(|| {
                    WeftError::InvalidParameter(format!("quad {i}: all corner weights are zero"))
                })?
            } else {
                p[0]
            };

            let rest = p.map(|v| {
                let d = v - origin;
                Vec3::new(e1.dot(d), e2.dot(d), e3.dot(d))
            });
            let elem = QuadElement {
                nodes: nodes.map(NodeId),
                rest,
                weights,
            };
            match level {
                2 => two.push(elem),
                1 => one.push(elem),
                _ => free.push(elem),
            }
        }

        let counts = (two.len(), one.len());
        let mut quads = two;
        quads.extend(one);
        quads.extend(free);
        Ok((quads, counts.0, counts.1))
    }

    fn build_bends(&self) -> WeftResult<Vec<AxialBend>> {
        let mut bends = Vec::with_capacity(self.bends.len());
        for (i, desc) in self.bends.iter().enumerate() {
            for &n in desc.edge.iter().chain(desc.virtuals.iter()) {
                self.check_node(n)?;
            }
            check_unit_range(desc.te, "bend te", i)?;
            check_unit_range(desc.tv, "bend tv", i)?;

            let mut weights = desc.weights;
            for (w, &n) in weights.iter_mut().zip(desc.virtuals.iter()) {
                if !w.is_finite() {
                    return Err(WeftError::InvalidParameter(format!(
                        "bend {i}: weight is not finite"
                    )));
                }
                if self.is_static(n) {
                    *w = 0.0;
                }
            }

            let dist = match desc.dist {
                Some(d) if d.is_finite() && d >= 0.0 => d,
                Some(d) => {
                    return Err(WeftError::InvalidParameter(format!(
                        "bend {i}: target distance {d} is invalid"
                    )));
                }
                None => {
                    let fe = self
                        .rest(desc.edge[0])
                        .lerp(self.rest(desc.edge[1]), desc.te);
                    let va = 0.5 * (self.rest(desc.virtuals[0]) + self.rest(desc.virtuals[1]));
                    let vb = 0.5 * (self.rest(desc.virtuals[2]) + self.rest(desc.virtuals[3]));
                    let fv = va.lerp(vb, desc.tv);
                    (fv - fe).length()
                }
            };

            bends.push(AxialBend {
                edge: desc.edge.map(NodeId),
                virtuals: desc.virtuals.map(NodeId),
                te: desc.te,
                tv: desc.tv,
                dist,
                weights,
            });
        }
        Ok(bends)
    }

    fn build_springs(&self) -> WeftResult<Vec<Spring>> {
        let mut springs = Vec::with_capacity(self.springs.len());
        for (i, desc) in self.springs.iter().enumerate() {
            self.check_node(desc.node0)?;
            self.check_node(desc.node1)?;
            check_unit_range(desc.weight0, "spring weight0", i)?;
            if !(desc.stiffness.is_finite() && desc.stiffness >= 0.0) {
                return Err(WeftError::InvalidParameter(format!(
                    "spring {i}: stiffness {} is invalid",
                    desc.stiffness
                )));
            }
            if !(desc.damping.is_finite() && desc.damping >= 0.0) {
                return Err(WeftError::InvalidParameter(format!(
                    "spring {i}: damping {} is invalid",
                    desc.damping
                )));
            }

            let s0 = self.is_static(desc.node0);
            let s1 = self.is_static(desc.node1);
            if s0 && s1 {
                return Err(WeftError::InvalidTopology(format!(
                    "spring {i} connects two static nodes"
                )));
            }
            let weight0 = if s0 {
                0.0
            } else if s1 {
                1.0
            } else {
                desc.weight0
            };

            let rest_length = match desc.rest_length {
                Some(l) if l.is_finite() && l >= 0.0 => l,
                Some(l) => {
                    return Err(WeftError::InvalidParameter(format!(
                        "spring {i}: rest length {l} is invalid"
                    )));
                }
                None => (self.rest(desc.node1) - self.rest(desc.node0)).length(),
            };

            springs.push(Spring {
                nodes: [NodeId(desc.node0), NodeId(desc.node1)],
                rest_length,
                stiffness: desc.stiffness,
                damping: desc.damping,
                weight0,
            });
        }
        Ok(springs)
    }

    fn build_fit_clusters(&self) -> WeftResult<Vec<FitCluster>> {
        let mut clusters = Vec::with_capacity(self.fit_clusters.len());
        for (i, desc) in self.fit_clusters.iter().enumerate() {
            self.check_node(desc.anchor)?;
            if desc.members.is_empty() {
                return Err(WeftError::InvalidTopology(format!(
                    "fit cluster {i} has no members"
                )));
            }

            let mut total = 0.0_f32;
            let mut center = Vec3::ZERO;
            for &(node, weight) in &desc.members {
                self.check_node(node)?;
                if !(weight.is_finite() && weight >= 0.0) {
                    return Err(WeftError::InvalidParameter(format!(
                        "fit cluster {i}: weight {weight} is invalid"
                    )));
                }
                total += weight;
                center += self.rest(node) * weight;
            }
            if total <= EPSILON {
                return Err(WeftError::InvalidParameter(format!(
                    "fit cluster {i}: total weight is zero"
                )));
            }
            let rest_center = center / total;

            let mut members = Vec::with_capacity(desc.members.len());
            let mut qq = SymMat3x::<f32>::zero();
            for &(node, weight) in &desc.members {
                let r = self.rest(node) - rest_center;
                qq.m00 += weight * r.x * r.x;
                qq.m01 += weight * r.x * r.y;
                qq.m02 += weight * r.x * r.z;
                qq.m11 += weight * r.y * r.y;
                qq.m12 += weight * r.y * r.z;
                qq.m22 += weight * r.z * r.z;
                members.push(FitWeight {
                    node: NodeId(node),
                    weight,
                    rest_offset: r,
                });
            }

            let pinv = pseudo_inverse(&qq, DEFAULT_SVD_SWEEPS * 2, 0.0, PSEUDO_INVERSE_EPSILON);
            let inv_qq = Mat3::from_cols(
                Vec3::new(pinv.m00, pinv.m01, pinv.m02),
                Vec3::new(pinv.m01, pinv.m11, pinv.m12),
                Vec3::new(pinv.m02, pinv.m12, pinv.m22),
            );

            clusters.push(FitCluster {
                anchor: NodeId(desc.anchor),
                rest_center,
                total_weight: total,
                members,
                inv_qq,
            });
        }
        Ok(clusters)
    }
}

fn check_unit_range(v: f32, what: &str, index: usize) -> WeftResult<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(WeftError::InvalidParameter(format!(
            "{what} {v} out of [0, 1] (element {index})"
        )))
    }
}

/// Rotation bringing a triangle's pinned corners to the leading slots.
fn tri_rotation(pinned: [bool; 3]) -> usize {
    let count = pinned.iter().filter(|&&p| p).count();
    match count {
        0 | 3 => 0,
        1 => pinned.iter().position(|&p| p).unwrap(),
        _ => (0..3)
            .find(|&k| pinned[k] && pinned[(k + 1) % 3])
            .unwrap(),
    }
}

/// Rotation bringing a quad's pinned corners to the leading slots.
/// Returns `None` when exactly two corners are pinned diagonally.
fn quad_rotation(pinned: [bool; 4]) -> Option<usize> {
    let count = pinned.iter().filter(|&&p| p).count();
    match count {
        0 | 4 => Some(0),
        1 => pinned.iter().position(|&p| p),
        _ => (0..4).find(|&k| pinned[k] && pinned[(k + 1) % 4]),
    }
}

/// Local 2D frame of a triangle: x along edge 0→1, y in-plane
/// perpendicular. `None` for degenerate (colinear) triangles.
fn tri_frame(p0: Vec3, p1: Vec3, p2: Vec3) -> Option<(Vec3, Vec3)> {
    let edge = p1 - p0;
    let len = edge.length();
    if len <= EPSILON {
        return None;
    }
    let e1 = edge / len;
    let n = e1.cross(p2 - p0);
    let n_len = n.length();
    if n_len <= EPSILON {
        return None;
    }
    let e3 = n / n_len;
    Some((e1, e3.cross(e1)))
}

/// Local 3D frame of a quad: x along edge 0→1, normal from the
/// `p2 + p3 − 2·p0` secondary direction.
fn quad_frame(p: &[Vec3; 4]) -> Option<(Vec3, Vec3, Vec3)> {
    let edge = p[1] - p[0];
    let len = edge.length();
    if len <= EPSILON {
        return None;
    }
    let e1 = edge / len;
    let t = p[2] + p[3] - 2.0 * p[0];
    let n = e1.cross(t);
    let n_len = n.length();
    if n_len <= EPSILON {
        return None;
    }
    let e3 = n / n_len;
    Some((e1, e3.cross(e1), e3))
}

fn weighted_center_3(p: &[Vec3; 3], w: &[f32; 3]) -> Option<Vec3> {
    let total = w[0] + w[1] + w[2];
    if total <= EPSILON {
        return None;
    }
    Some((p[0] * w[0] + p[1] * w[1] + p[2] * w[2]) / total)
}

fn weighted_center_4(p: &[Vec3; 4], w: &[f32; 4]) -> Option<Vec3> {
    let total = w[0] + w[1] + w[2] + w[3];
    if total <= EPSILON {
        return None;
    }
    Some((p[0] * w[0] + p[1] * w[1] + p[2] * w[2] + p[3] * w[3]) / total)
}

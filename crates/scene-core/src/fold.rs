//! Paper-like folding of a node around its hinge axes.
//!
//! Each hinge is a pair of point indices plus the set of points that swing
//! with it. A fold scale of 0 is the exported (unfolded) layout; moving the
//! scale by `d` turns every hinge subtree by `d * (PI - rest_angle)`.

use crate::scene::SceneNode;
use crate::updater;
use glam::{DQuat, DVec3};
use std::f64::consts::PI;

// Squared axis length below which a hinge is treated as degenerate.
const DEGENERATE_AXIS_EPS: f64 = 1e-24;

#[derive(Clone, Debug, PartialEq)]
pub struct Hinge {
    pub axis: [usize; 2],
    pub subtree: Vec<usize>,
    pub rest_angle: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FoldState {
    pub hinges: Vec<Hinge>,
    scale: f64,
}

impl FoldState {
    /// Pair up axes, subtrees and angles. Hinges missing a subtree or angle
    /// are dropped.
    pub fn new(axes: &[[usize; 2]], subtrees: &[Vec<usize>], angles: &[f64]) -> Self {
        let hinges = axes
            .iter()
            .zip(subtrees)
            .zip(angles)
            .map(|((axis, subtree), angle)| Hinge {
                axis: *axis,
                subtree: subtree.clone(),
                rest_angle: *angle,
            })
            .collect::<Vec<_>>();
        if hinges.len() != axes.len() {
            log::warn!(
                "[fold] {} axes but only {} complete hinges",
                axes.len(),
                hinges.len()
            );
        }
        Self { hinges, scale: 0.0 }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Rotate `p` about the line through `p1` and `p2`.
///
/// The turn is applied with the opposite sign of `angle`, so a positive
/// angle folds towards the closed position. A zero-length axis leaves `p`
/// unchanged.
pub fn rotate_about_axis(p: DVec3, p1: DVec3, p2: DVec3, angle: f64) -> DVec3 {
    let dir = p2 - p1;
    if dir.length_squared() < DEGENERATE_AXIS_EPS {
        return p;
    }
    let q = DQuat::from_axis_angle(dir.normalize(), -angle);
    p1 + q * (p - p1)
}

/// Move `node` to fold scale `target` (clamped to [0, 1]).
///
/// Returns the node's new barycenter, or `None` when the node is not
/// foldable. Applying the current scale again changes nothing.
pub fn fold(node: &mut SceneNode, target: f64) -> Option<DVec3> {
    let state = node.fold.as_ref()?;
    let target = target.clamp(0.0, 1.0);
    let delta = target - state.scale;
    if delta != 0.0 {
        let hinges = state.hinges.clone();
        for hinge in &hinges {
            rotate_subtree(node, hinge, delta);
        }
        if let Some(state) = node.fold.as_mut() {
            state.scale = target;
        }
        updater::update(node);
    }
    Some(node.barycenter())
}

fn rotate_subtree(node: &mut SceneNode, hinge: &Hinge, delta: f64) {
    let [a, b] = hinge.axis;
    let (Some(p1), Some(p2)) = (node.points.get(a), node.points.get(b)) else {
        log::warn!("[fold] hinge axis ({a}, {b}) out of range");
        return;
    };
    let (p1, p2) = (p1.position, p2.position);
    let angle = delta * (PI - hinge.rest_angle);
    for &i in &hinge.subtree {
        if let Some(point) = node.points.get_mut(i) {
            point.position = rotate_about_axis(point.position, p1, p2, angle);
        }
    }
}

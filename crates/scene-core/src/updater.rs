//! Rewrites render positions from a node's logical points.

use crate::initializer::arrowhead_pose;
use crate::scene::{Body, SceneNode};
use glam::DVec3;

/// Refresh every point-derived position of `node`.
pub fn update(node: &mut SceneNode) {
    update_faces_position(node);
    update_edges_position(node);
    sync_point_markers(node);
    sync_edge_labels(node);
    sync_arrowheads(node);
    node.revision += 1;
}

/// Copy the triangle corners into the shared face buffer.
pub fn update_faces_position(node: &mut SceneNode) {
    let SceneNode {
        points,
        triangle_indices,
        face_buffer,
        ..
    } = node;
    let Some(buf) = face_buffer.as_mut() else {
        return;
    };
    for (slot, &pi) in triangle_indices.iter().enumerate() {
        if let Some(p) = points.get(pi) {
            buf.set_xyz(slot, p.position);
        }
    }
    buf.mark_dirty();
}

/// Copy the edge endpoints into the line-segment buffer.
pub fn update_edges_position(node: &mut SceneNode) {
    let SceneNode {
        points,
        edge_indices,
        children,
        ..
    } = node;
    let Some(Body::Lines(lines)) = children
        .iter_mut()
        .find(|c| c.name == "lines")
        .map(|c| &mut c.body)
    else {
        return;
    };
    for (slot, &pi) in edge_indices.iter().enumerate() {
        if let Some(p) = points.get(pi) {
            lines.buffer.set_xyz(slot, p.position);
        }
    }
    lines.buffer.mark_dirty();
}

// Spheres and point labels follow their point.
fn sync_point_markers(node: &mut SceneNode) {
    let SceneNode {
        points, children, ..
    } = node;
    for child in children.iter_mut() {
        match (child.name, &mut child.body) {
            ("points", Body::Spheres(spheres)) => {
                for s in spheres.iter_mut() {
                    if let Some(p) = points.get(s.point) {
                        s.position = p.position;
                    }
                }
            }
            ("pointlabels", Body::Sprites(sprites)) => {
                for p in points.iter() {
                    if let Some(sprite) = p.label.and_then(|i| sprites.get_mut(i)) {
                        sprite.position = p.position;
                    }
                }
            }
            _ => {}
        }
    }
}

// Arrowheads keep their size and follow the tip of their edge.
fn sync_arrowheads(node: &mut SceneNode) {
    let poses: Vec<_> = node
        .edges()
        .map(|(a, b)| match (node.points.get(a), node.points.get(b)) {
            (Some(a), Some(b)) => arrowhead_pose(a.position, b.position, a.radius, b.radius),
            _ => None,
        })
        .collect();
    if let Some(Body::Cones(cones)) = node
        .object_by_name_mut("arrowheads")
        .map(|c| &mut c.body)
    {
        for cone in cones.iter_mut() {
            if let Some(Some(pose)) = poses.get(cone.edge) {
                cone.position = pose.position;
                cone.rotation = pose.rotation;
            }
        }
    }
}

// Edge labels sit at the midpoint of their edge, in edge order.
fn sync_edge_labels(node: &mut SceneNode) {
    let midpoints: Vec<DVec3> = node
        .edges()
        .map(|(a, b)| match (node.points.get(a), node.points.get(b)) {
            (Some(a), Some(b)) => (a.position + b.position) * 0.5,
            _ => DVec3::ZERO,
        })
        .collect();
    if let Some(Body::Sprites(sprites)) = node
        .object_by_name_mut("edgelabels")
        .map(|c| &mut c.body)
    {
        for (sprite, mid) in sprites.iter_mut().zip(midpoints) {
            sprite.position = mid;
        }
    }
}

//! Builds the renderable sub-objects of a node from its exported user data.
//!
//! Each declared kind is built once. A kind whose data is unusable (no
//! points, indices out of range, empty facets) is skipped with a warning and
//! the rest of the node is still built.

use crate::buffer::VertexBuffer;
use crate::constants::{
    ARROW_HEIGHT_DIVISOR, ARROW_RADIUS_DIVISOR, LABEL_FONT_SCALE, LABEL_TEXTURE_SIZE,
};
use crate::data::{Material, NodeData, Side, Styled};
use crate::fold::FoldState;
use crate::scene::{
    Body, Cone, FaceMesh, Geometry, KindSet, LabelTexture, LineMesh, ObjectKind, SceneNode,
    SphereInstance, Sprite, SubObject, BACK_FACES, FRONT_FACES,
};
use crate::updater;
use glam::{DQuat, DVec3};

// Sphere radius when the export gives none.
const DEFAULT_POINT_RADIUS: f64 = 1.0;

/// Build a node and record the kinds it contributes in `contains`.
pub fn init_node(data: &NodeData, contains: &mut KindSet, label_font_size: u32) -> SceneNode {
    let mut node = SceneNode::new(
        data.name.clone(),
        data.points.iter().map(|p| DVec3::from_array(*p)).collect(),
    );
    if node.points.is_empty() {
        log::warn!("[init] node '{}' has no points; skipping sub-objects", data.name);
        return node;
    }
    let edges_ok = edges_valid(data);
    if edges_ok {
        node.edge_indices = data.edgeindices.clone();
    }

    if let Some(materials) = &data.pointmaterial {
        if init_points(&mut node, data.pointradii.as_ref(), materials) {
            contains.insert(ObjectKind::Points);
        }
    }
    if let Some(labels) = &data.pointlabels {
        if init_point_labels(&mut node, labels, label_font_size) {
            contains.insert(ObjectKind::PointLabels);
        }
    }
    if let Some(materials) = &data.edgematerial {
        if edges_ok {
            init_lines(&mut node, materials);
            contains.insert(ObjectKind::Lines);
        }
    }
    if let Some(labels) = &data.edgelabels {
        if edges_ok && init_edge_labels(&mut node, &data.edgeindices, labels, label_font_size) {
            contains.insert(ObjectKind::EdgeLabels);
        }
    }
    if data.arrowstyle.is_some() && edges_ok {
        init_arrowheads(&mut node, &data.edgeindices, data.edgematerial.as_ref());
        contains.insert(ObjectKind::Arrowheads);
    }
    if let Some(materials) = &data.facetmaterial {
        if init_faces(&mut node, &data.facets, materials) {
            contains.insert(ObjectKind::Faces);
        }
    }
    if data.is_foldable() {
        node.fold = Some(FoldState::new(&data.axes, &data.subtrees, &data.angles));
    }
    if data.explodable {
        node.centroid = Some(node.barycenter());
    }
    if node.has_kind(ObjectKind::Lines) || node.has_kind(ObjectKind::Faces) {
        updater::update(&mut node);
    }
    node
}

fn edges_valid(data: &NodeData) -> bool {
    if data.edgeindices.is_empty() {
        return false;
    }
    if data.edgeindices.len() % 2 != 0 {
        log::warn!("[init] node '{}' has an odd edge index count", data.name);
        return false;
    }
    let n = data.points.len();
    if let Some(bad) = data.edgeindices.iter().find(|&&i| i >= n) {
        log::warn!("[init] node '{}' edge index {bad} out of range", data.name);
        return false;
    }
    true
}

/// Largest font size not above `base * 10` at which every line of `text`
/// fits the label texture.
pub fn label_font_size(text: &str, base: u32) -> u32 {
    let mut size = base.saturating_mul(LABEL_FONT_SCALE);
    for line in text.lines() {
        let len = line.chars().count() as u32;
        if len > 0 {
            size = size.min(LABEL_TEXTURE_SIZE / len);
        }
    }
    size
}

fn label_texture(text: &str, base: u32) -> LabelTexture {
    LabelTexture {
        text: text.to_string(),
        font_size: label_font_size(text, base),
    }
}

fn init_points(
    node: &mut SceneNode,
    radii: Option<&Styled<f64>>,
    materials: &Styled<Material>,
) -> bool {
    let shared_geometry = match radii {
        Some(Styled::PerItem(_)) => None,
        Some(Styled::Shared(r)) => Some((node.add_geometry(Geometry::Sphere { radius: *r }), *r)),
        None => Some((
            node.add_geometry(Geometry::Sphere {
                radius: DEFAULT_POINT_RADIUS,
            }),
            DEFAULT_POINT_RADIUS,
        )),
    };
    let shared_material = match materials {
        Styled::Shared(m) => Some(node.add_material(m.clone())),
        Styled::PerItem(_) => None,
    };

    let mut spheres = Vec::with_capacity(node.points.len());
    for i in 0..node.points.len() {
        let (geometry, radius) = match (shared_geometry, radii) {
            (Some(shared), _) => shared,
            (None, Some(per_item)) => match per_item.get(i) {
                Some(&r) if r != 0.0 => (node.add_geometry(Geometry::Sphere { radius: r }), r),
                _ => continue,
            },
            (None, None) => continue,
        };
        let material = match shared_material {
            Some(id) => id,
            None => match materials.get(i) {
                Some(m) => node.add_material(m.clone()),
                None => continue,
            },
        };
        let point = &mut node.points[i];
        point.sphere = Some(spheres.len());
        point.radius = radius;
        spheres.push(SphereInstance {
            point: i,
            geometry,
            material,
            position: point.position,
        });
    }
    node.children.push(SubObject::new(
        "points",
        ObjectKind::Points,
        Body::Spheres(spheres),
    ));
    true
}

fn init_point_labels(node: &mut SceneNode, labels: &Styled<String>, base: u32) -> bool {
    let shared = match labels {
        Styled::Shared(text) => Some(node.add_label(label_texture(text, base))),
        Styled::PerItem(_) => None,
    };
    let mut sprites = Vec::with_capacity(node.points.len());
    for i in 0..node.points.len() {
        let label = match shared {
            Some(id) => id,
            None => match labels.get(i) {
                Some(text) => node.add_label(label_texture(text, base)),
                None => continue,
            },
        };
        let point = &mut node.points[i];
        point.label = Some(sprites.len());
        sprites.push(Sprite {
            label,
            position: point.position,
        });
    }
    node.children.push(SubObject::new(
        "pointlabels",
        ObjectKind::PointLabels,
        Body::Sprites(sprites),
    ));
    true
}

fn init_lines(node: &mut SceneNode, materials: &Styled<Material>) {
    let mut buffer = VertexBuffer::with_len(node.edge_indices.len());
    let material_ids = match materials {
        Styled::Shared(m) => vec![node.add_material(m.clone())],
        Styled::PerItem(ms) => {
            for i in 0..ms.len() {
                buffer.add_group(2 * i, 2, i);
            }
            ms.iter().map(|m| node.add_material(m.clone())).collect()
        }
    };
    node.children.push(SubObject::new(
        "lines",
        ObjectKind::Lines,
        Body::Lines(LineMesh {
            buffer,
            materials: material_ids,
        }),
    ));
}

fn init_edge_labels(
    node: &mut SceneNode,
    edge_indices: &[usize],
    labels: &Styled<String>,
    base: u32,
) -> bool {
    let shared = match labels {
        Styled::Shared(text) => Some(node.add_label(label_texture(text, base))),
        Styled::PerItem(_) => None,
    };
    let mut sprites = Vec::with_capacity(edge_indices.len() / 2);
    for (e, pair) in edge_indices.chunks_exact(2).enumerate() {
        let label = match shared {
            Some(id) => id,
            None => match labels.get(e) {
                Some(text) => node.add_label(label_texture(text, base)),
                None => {
                    log::warn!("[init] node '{}' lacks edge label {e}", node.name);
                    return false;
                }
            },
        };
        let mid = (node.points[pair[0]].position + node.points[pair[1]].position) * 0.5;
        sprites.push(Sprite {
            label,
            position: mid,
        });
    }
    node.children.push(SubObject::new(
        "edgelabels",
        ObjectKind::EdgeLabels,
        Body::Sprites(sprites),
    ));
    true
}

/// Placement of a cone tipping the edge from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowPose {
    pub position: DVec3,
    pub rotation: DQuat,
    pub radius: f64,
    pub height: f64,
}

/// Cone pose for an edge whose endpoints carry spheres of the given radii.
/// `None` when the spheres swallow the whole edge.
pub fn arrowhead_pose(start: DVec3, end: DVec3, r_start: f64, r_end: f64) -> Option<ArrowPose> {
    let dist = start.distance(end) - r_start - r_end;
    if dist <= 0.0 {
        return None;
    }
    let dir = (end - start).normalize();
    let height = dist / ARROW_HEIGHT_DIVISOR;
    Some(ArrowPose {
        position: start + dir * (r_start + dist - height / 2.0),
        rotation: DQuat::from_rotation_arc(DVec3::Y, dir),
        radius: dist / ARROW_RADIUS_DIVISOR,
        height,
    })
}

fn init_arrowheads(
    node: &mut SceneNode,
    edge_indices: &[usize],
    edge_materials: Option<&Styled<Material>>,
) {
    let arrow_material = |m: &Material| Material {
        color: m.color,
        ..Material::default()
    };
    let shared = match edge_materials {
        Some(Styled::Shared(m)) => Some(node.add_material(arrow_material(m))),
        Some(Styled::PerItem(_)) => None,
        None => Some(node.add_material(Material::default())),
    };
    let mut cones = Vec::new();
    for (e, pair) in edge_indices.chunks_exact(2).enumerate() {
        let (start, end) = (&node.points[pair[0]], &node.points[pair[1]]);
        let Some(pose) = arrowhead_pose(start.position, end.position, start.radius, end.radius)
        else {
            continue;
        };
        let material = match (shared, edge_materials) {
            (Some(id), _) => id,
            (None, Some(styled)) => match styled.get(e) {
                Some(m) => node.add_material(arrow_material(m)),
                None => continue,
            },
            (None, None) => continue,
        };
        let geometry = node.add_geometry(Geometry::Cone {
            radius: pose.radius,
            height: pose.height,
        });
        cones.push(Cone {
            edge: e,
            geometry,
            material,
            position: pose.position,
            rotation: pose.rotation,
        });
    }
    node.children.push(SubObject::new(
        "arrowheads",
        ObjectKind::Arrowheads,
        Body::Cones(cones),
    ));
}

/// Fan-triangulate `facets` from each facet's first vertex. Facets with fewer
/// than three vertices or with out-of-range indices are skipped.
///
/// Returns the flat triangle indices and, per kept facet, its
/// `(facet index, first slot, slot count)`.
pub fn triangulate(
    facets: &[Vec<usize>],
    point_count: usize,
) -> (Vec<usize>, Vec<(usize, usize, usize)>) {
    let mut indices = Vec::new();
    let mut spans = Vec::new();
    for (f, facet) in facets.iter().enumerate() {
        if facet.len() < 3 || facet.iter().any(|&i| i >= point_count) {
            continue;
        }
        let start = indices.len();
        for t in 0..facet.len() - 2 {
            indices.extend_from_slice(&[facet[0], facet[t + 1], facet[t + 2]]);
        }
        spans.push((f, start, indices.len() - start));
    }
    (indices, spans)
}

fn init_faces(
    node: &mut SceneNode,
    facets: &[Vec<usize>],
    materials: &Styled<Material>,
) -> bool {
    let (triangles, spans) = triangulate(facets, node.points.len());
    if triangles.is_empty() {
        log::warn!("[init] node '{}' has no usable facets", node.name);
        return false;
    }
    if spans.len() < facets.len() {
        log::warn!(
            "[init] node '{}': skipped {} degenerate facets",
            node.name,
            facets.len() - spans.len()
        );
    }
    let mut buffer = VertexBuffer::with_len(triangles.len());
    let (front, back) = match materials {
        Styled::PerItem(ms) => {
            let fallback = [Material::default()];
            let ms = if ms.is_empty() { &fallback[..] } else { &ms[..] };
            if ms.len() < facets.len() {
                log::warn!(
                    "[init] node '{}': {} facet materials for {} facets, reusing the last",
                    node.name,
                    ms.len(),
                    facets.len()
                );
            }
            // facets past the end of the list share its last material
            for &(f, start, count) in &spans {
                buffer.add_group(start, count, f.min(ms.len() - 1));
            }
            let front: Vec<_> = ms
                .iter()
                .map(|m| node.add_material(m.with_side(Side::Front)))
                .collect();
            let back: Vec<_> = ms
                .iter()
                .map(|m| node.add_material(m.with_side(Side::Back)))
                .collect();
            (front, back)
        }
        Styled::Shared(m) => (
            vec![node.add_material(m.with_side(Side::Front))],
            vec![node.add_material(m.with_side(Side::Back))],
        ),
    };
    node.facet_materials = front.iter().chain(back.iter()).copied().collect();
    node.triangle_indices = triangles;
    node.face_buffer = Some(buffer);
    node.children.push(SubObject::new(
        BACK_FACES,
        ObjectKind::Faces,
        Body::Faces(FaceMesh {
            side: Side::Back,
            materials: back,
        }),
    ));
    node.children.push(SubObject::new(
        FRONT_FACES,
        ObjectKind::Faces,
        Body::Faces(FaceMesh {
            side: Side::Front,
            materials: front,
        }),
    ));
    true
}

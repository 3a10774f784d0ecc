//! Retained scene graph mirrored into the renderer.
//!
//! Nodes own their sub-objects plus small tables of geometries, materials and
//! label textures. Sub-objects refer into those tables by id, so a shared
//! style is stored once and referenced by every instance.

use crate::buffer::VertexBuffer;
use crate::data::{Material, Side};
use crate::fold::FoldState;
use glam::{DQuat, DVec3};

/// Renderable categories a node may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Points,
    PointLabels,
    Lines,
    EdgeLabels,
    Arrowheads,
    Faces,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Points,
        ObjectKind::PointLabels,
        ObjectKind::Lines,
        ObjectKind::EdgeLabels,
        ObjectKind::Arrowheads,
        ObjectKind::Faces,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ObjectKind::Points => "points",
            ObjectKind::PointLabels => "pointlabels",
            ObjectKind::Lines => "lines",
            ObjectKind::EdgeLabels => "edgelabels",
            ObjectKind::Arrowheads => "arrowheads",
            ObjectKind::Faces => "faces",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Checkbox caption in the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Points => "Points",
            ObjectKind::PointLabels => "Point labels",
            ObjectKind::Lines => "Edges",
            ObjectKind::EdgeLabels => "Edge labels",
            ObjectKind::Arrowheads => "Arrow heads",
            ObjectKind::Faces => "Faces",
        }
    }

    /// Names of the sub-objects that make up this kind.
    pub fn object_names(self) -> &'static [&'static str] {
        match self {
            ObjectKind::Points => &["points"],
            ObjectKind::PointLabels => &["pointlabels"],
            ObjectKind::Lines => &["lines"],
            ObjectKind::EdgeLabels => &["edgelabels"],
            ObjectKind::Arrowheads => &["arrowheads"],
            ObjectKind::Faces => &[FRONT_FACES, BACK_FACES],
        }
    }

    pub fn is_label(self) -> bool {
        matches!(self, ObjectKind::PointLabels | ObjectKind::EdgeLabels)
    }

    /// All kinds ordered by their key, the order the settings panel lists them.
    pub fn sorted_by_key() -> Vec<ObjectKind> {
        let mut kinds = Self::ALL.to_vec();
        kinds.sort_by_key(|k| k.key());
        kinds
    }
}

pub const FRONT_FACES: &str = "frontfaces";
pub const BACK_FACES: &str = "backfaces";

/// Set of kinds present somewhere in the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindSet(u8);

impl KindSet {
    fn bit(kind: ObjectKind) -> u8 {
        1 << (kind as u8)
    }

    pub fn insert(&mut self, kind: ObjectKind) {
        self.0 |= Self::bit(kind);
    }

    pub fn contains(&self, kind: ObjectKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectKind> + '_ {
        ObjectKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Sphere { radius: f64 },
    Cone { radius: f64, height: f64 },
}

/// Text rendered into a sprite texture.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelTexture {
    pub text: String,
    pub font_size: u32,
}

/// Logical vertex of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub position: DVec3,
    /// Index of the sphere rendering this point inside the `points` group.
    pub sphere: Option<usize>,
    /// Index of the sprite labelling this point inside the `pointlabels` group.
    pub label: Option<usize>,
    /// Radius of the rendered sphere, 0 without one.
    pub radius: f64,
}

impl Point {
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            sphere: None,
            label: None,
            radius: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SphereInstance {
    pub point: usize,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub position: DVec3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub label: LabelId,
    pub position: DVec3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cone {
    /// Edge number (pair index into `edge_indices`) the cone tips.
    pub edge: usize,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub position: DVec3,
    pub rotation: DQuat,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineMesh {
    pub buffer: VertexBuffer,
    /// One entry when shared, one per edge otherwise.
    pub materials: Vec<MaterialId>,
}

/// One side of the face geometry. Both sides draw `SceneNode::face_buffer`.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMesh {
    pub side: Side,
    pub materials: Vec<MaterialId>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Spheres(Vec<SphereInstance>),
    Sprites(Vec<Sprite>),
    Lines(LineMesh),
    Cones(Vec<Cone>),
    Faces(FaceMesh),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubObject {
    pub name: &'static str,
    pub kind: ObjectKind,
    pub visible: bool,
    pub body: Body,
}

impl SubObject {
    pub fn new(name: &'static str, kind: ObjectKind, body: Body) -> Self {
        Self {
            name,
            kind,
            visible: true,
            body,
        }
    }
}

/// Top-level renderable group built from one exported node.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    pub visible: bool,
    /// Offset applied by the explosion controller.
    pub position: DVec3,
    pub points: Vec<Point>,
    pub children: Vec<SubObject>,
    pub geometries: Vec<Geometry>,
    pub materials: Vec<Material>,
    pub labels: Vec<LabelTexture>,
    /// Flat `[a0, b0, a1, b1, ...]` edge endpoint indices.
    pub edge_indices: Vec<usize>,
    /// Fan-triangulated facets, three point indices per triangle.
    pub triangle_indices: Vec<usize>,
    pub face_buffer: Option<VertexBuffer>,
    /// Front materials followed by back materials.
    pub facet_materials: Vec<MaterialId>,
    pub fold: Option<FoldState>,
    pub centroid: Option<DVec3>,
    /// Bumped whenever point-derived positions were rewritten.
    pub revision: u64,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, points: Vec<DVec3>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            points: points.into_iter().map(Point::new).collect(),
            ..Default::default()
        }
    }

    pub fn object_by_name(&self, name: &str) -> Option<&SubObject> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn object_by_name_mut(&mut self, name: &str) -> Option<&mut SubObject> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn has_kind(&self, kind: ObjectKind) -> bool {
        self.children.iter().any(|c| c.kind == kind)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_label(&mut self, label: LabelTexture) -> LabelId {
        self.labels.push(label);
        LabelId(self.labels.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    /// Edge endpoint pairs; a dangling trailing index is ignored.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_indices.chunks_exact(2).map(|e| (e[0], e[1]))
    }

    /// Mean of all point positions, the origin for an empty node.
    pub fn barycenter(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        let sum: DVec3 = self.points.iter().map(|p| p.position).sum();
        sum / self.points.len() as f64
    }
}

/// The session's scene: every top-level node plus the global rotation.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
    /// Euler rotation (x, y, z) of the whole scene.
    pub rotation: DVec3,
    /// Kinds declared by at least one node.
    pub contains: KindSet,
    /// Bumped whenever visibility or material state changed.
    pub style_revision: u64,
}

impl SceneGraph {
    /// Set `visible` on the sub-object called `name` in every top-level node.
    pub fn set_visibility(&mut self, visible: bool, name: &str) {
        for node in &mut self.nodes {
            if let Some(obj) = node.object_by_name_mut(name) {
                obj.visible = visible;
            }
        }
        self.style_revision += 1;
    }

    pub fn is_explodable(&self) -> bool {
        self.nodes.iter().any(|n| n.centroid.is_some())
    }

    pub fn foldable_indices(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.fold.is_some())
            .map(|(i, _)| i)
            .collect()
    }
}

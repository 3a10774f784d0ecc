//! The exported scene document.
//!
//! Every export injects one JSON document holding the per-node user data,
//! the cameras and optional viewer settings. Field names follow the keys the
//! exporter writes.

use crate::config::ViewerConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A style value that is either shared by every item or given per item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Styled<T> {
    PerItem(Vec<T>),
    Shared(T),
}

impl<T> Styled<T> {
    /// Style of item `i`. Shared values answer for every index.
    pub fn get(&self, i: usize) -> Option<&T> {
        match self {
            Styled::Shared(v) => Some(v),
            Styled::PerItem(vs) => vs.get(i),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Renderer-agnostic material description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub transparent: bool,
    pub linewidth: f32,
    pub side: Side,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            transparent: false,
            linewidth: 1.0,
            side: Side::Front,
        }
    }
}

impl Material {
    /// Copy of this material restricted to one side.
    pub fn with_side(&self, side: Side) -> Self {
        Self {
            side,
            ..self.clone()
        }
    }
}

/// Per-node user data as exported.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeData {
    pub name: String,
    pub points: Vec<[f64; 3]>,
    pub pointradii: Option<Styled<f64>>,
    pub pointmaterial: Option<Styled<Material>>,
    pub pointlabels: Option<Styled<String>>,
    pub edgeindices: Vec<usize>,
    pub edgematerial: Option<Styled<Material>>,
    pub edgelabels: Option<Styled<String>>,
    /// Only its presence matters: it requests arrowheads on every edge.
    pub arrowstyle: Option<serde_json::Value>,
    pub facets: Vec<Vec<usize>>,
    pub facetmaterial: Option<Styled<Material>>,
    pub explodable: bool,
    pub axes: Vec<[usize; 2]>,
    pub subtrees: Vec<Vec<usize>>,
    pub angles: Vec<f64>,
}

impl NodeData {
    pub fn is_foldable(&self) -> bool {
        !self.axes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionSpec {
    Perspective { fov: f64 },
    Orthographic { frustum_size: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    #[serde(flatten)]
    pub projection: ProjectionSpec,
    pub position: [f64; 3],
    #[serde(default)]
    pub target: [f64; 3],
    #[serde(default = "default_up")]
    pub up: [f64; 3],
    #[serde(default = "default_near")]
    pub near: f64,
    #[serde(default = "default_far")]
    pub far: f64,
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_near() -> f64 {
    crate::constants::DEFAULT_CAMERA_NEAR
}

fn default_far() -> f64 {
    crate::constants::DEFAULT_CAMERA_FAR
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub cameras: Vec<CameraSpec>,
    #[serde(default)]
    pub config: ViewerConfig,
}

impl SceneData {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_explodable(&self) -> bool {
        self.nodes.iter().any(|n| n.explodable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_accepts_scalar_and_sequence() {
        let shared: Styled<f64> = serde_json::from_str("0.5").unwrap();
        assert_eq!(shared, Styled::Shared(0.5));
        assert_eq!(shared.get(7), Some(&0.5));

        let per_item: Styled<String> = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert!(matches!(per_item, Styled::PerItem(_)));
        assert_eq!(per_item.get(1).map(String::as_str), Some("b"));
        assert_eq!(per_item.get(2), None);
    }

    #[test]
    fn material_sequence_is_per_item() {
        let styled: Styled<Material> =
            serde_json::from_str(r#"[{"color":[1,0,0]},{"color":[0,1,0],"opacity":0.5}]"#)
                .unwrap();
        match styled {
            Styled::PerItem(ms) => {
                assert_eq!(ms.len(), 2);
                assert_eq!(ms[1].opacity, 0.5);
                assert_eq!(ms[0].side, Side::Front);
            }
            Styled::Shared(_) => panic!("expected per-item materials"),
        }
    }

    #[test]
    fn camera_spec_flattens_projection() {
        let cam: CameraSpec = serde_json::from_str(
            r#"{"type":"orthographic","frustum_size":4,"position":[0,0,5]}"#,
        )
        .unwrap();
        assert_eq!(
            cam.projection,
            ProjectionSpec::Orthographic { frustum_size: 4.0 }
        );
        assert_eq!(cam.up, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(SceneData::from_json("{\"nodes\": 3}").is_err());
    }
}

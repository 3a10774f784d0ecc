//! Display state behind the settings panel: kind and object visibility,
//! facet transparency and the continuous scene rotation.

use crate::constants::ROTATION_STEP;
use crate::scene::{ObjectKind, SceneGraph, SceneNode};
use fnv::FnvHashMap;
use glam::DVec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug)]
pub struct DisplayState {
    kinds: FnvHashMap<ObjectKind, bool>,
    objects: Vec<bool>,
    rotation: [bool; 3],
    rotation_speed: f64,
    pub settings_shown: bool,
}

impl DisplayState {
    /// Every kind the model contains and every node start out visible.
    pub fn new(scene: &SceneGraph, rotation_speed: f64) -> Self {
        Self {
            kinds: scene.contains.iter().map(|k| (k, true)).collect(),
            objects: vec![true; scene.nodes.len()],
            rotation: [false; 3],
            rotation_speed,
            settings_shown: false,
        }
    }

    pub fn is_kind_visible(&self, kind: ObjectKind) -> bool {
        self.kinds.get(&kind).copied().unwrap_or(false)
    }

    /// Show or hide every sub-object of `kind` in every top-level node.
    /// Faces switch the front and back meshes together.
    pub fn set_kind_visible(&mut self, scene: &mut SceneGraph, kind: ObjectKind, visible: bool) {
        self.kinds.insert(kind, visible);
        for name in kind.object_names() {
            scene.set_visibility(visible, name);
        }
        log::info!("[ui] {} visible={}", kind.key(), visible);
    }

    pub fn is_object_visible(&self, index: usize) -> bool {
        self.objects.get(index).copied().unwrap_or(false)
    }

    /// Show or hide top-level node `index`. Returns false for an unknown node.
    pub fn set_object_visible(
        &mut self,
        scene: &mut SceneGraph,
        index: usize,
        visible: bool,
    ) -> bool {
        let (Some(flag), Some(node)) = (self.objects.get_mut(index), scene.nodes.get_mut(index))
        else {
            return false;
        };
        *flag = visible;
        node.visible = visible;
        scene.style_revision += 1;
        true
    }

    pub fn set_rotation(&mut self, axis: Axis, enabled: bool) {
        self.rotation[axis as usize] = enabled;
    }

    pub fn rotation_enabled(&self, axis: Axis) -> bool {
        self.rotation[axis as usize]
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.rotation_speed = speed;
    }

    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    /// Advance the scene rotation by one frame on every enabled axis.
    pub fn step_rotation(&self, scene: &mut SceneGraph) {
        let phi = ROTATION_STEP * self.rotation_speed;
        let [x, y, z] = self.rotation;
        scene.rotation += DVec3::new(
            if x { phi } else { 0.0 },
            if y { phi } else { 0.0 },
            if z { phi } else { 0.0 },
        );
    }
}

/// Set the opacity of every facet material (front and back, shared or per
/// facet) to `1 - slider`.
pub fn set_transparency(scene: &mut SceneGraph, slider: f64) {
    let opacity = (1.0 - slider) as f32;
    for node in &mut scene.nodes {
        let SceneNode {
            facet_materials,
            materials,
            ..
        } = node;
        for id in facet_materials.iter() {
            if let Some(m) = materials.get_mut(id.0) {
                m.opacity = opacity;
            }
        }
    }
    scene.style_revision += 1;
}

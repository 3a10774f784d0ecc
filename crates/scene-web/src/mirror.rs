//! Mirrors the retained [`SceneGraph`] and [`CameraRig`] into three.js.
//!
//! Objects are created once from the initial graph. Each frame then pushes
//! only what moved: node offsets and visibility always, instance positions
//! when a node's revision changed, vertex buffers when they are dirty, and
//! sub-object visibility plus material opacity when the style revision
//! changed.

use crate::dom::{self, js_error};
use crate::three::{self, params};
use anyhow::anyhow;
use glam::{DQuat, DVec3};
use scene_core::camera::{CameraRig, Pose, Projection};
use scene_core::constants::LABEL_TEXTURE_SIZE;
use scene_core::data::{Material as MaterialSpec, Side};
use scene_core::scene::{Body, Geometry, GeometryId, LabelId, MaterialId, SceneGraph, SceneNode};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

const SPHERE_SEGMENTS: (u32, u32) = (16, 12);
const CONE_SEGMENTS: u32 = 8;

#[derive(Clone, Copy)]
enum MaterialClass {
    Mesh,
    Line,
}

fn side_value(side: Side) -> u32 {
    match side {
        Side::Front => three::FRONT_SIDE,
        Side::Back => three::BACK_SIDE,
        Side::Double => three::DOUBLE_SIDE,
    }
}

fn build_material(spec: &MaterialSpec, class: MaterialClass) -> three::Material {
    let [r, g, b] = spec.color;
    let p = params(&[
        ("color", three::Color::new(r, g, b).into()),
        ("opacity", spec.opacity.into()),
        ("transparent", spec.transparent.into()),
        ("side", side_value(spec.side).into()),
        ("linewidth", spec.linewidth.into()),
    ]);
    match class {
        MaterialClass::Mesh => three::MeshBasicMaterial::new(&p).into(),
        MaterialClass::Line => three::LineBasicMaterial::new(&p).into(),
    }
}

/// Sprite material showing `text` on a transparent square canvas, one line
/// per row, centred.
fn label_material(text: &str, font_size: u32) -> anyhow::Result<three::SpriteMaterial> {
    let document = dom::window_document().ok_or_else(|| anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = dom::create(&document, "canvas")?;
    canvas.set_width(LABEL_TEXTURE_SIZE);
    canvas.set_height(LABEL_TEXTURE_SIZE);
    let ctx = canvas
        .get_context("2d")
        .map_err(js_error)?
        .ok_or_else(|| anyhow!("no 2d context for label"))?
        .dyn_into::<web::CanvasRenderingContext2d>()
        .map_err(js_error)?;
    ctx.set_font(&format!("{font_size}px Helvetica"));
    ctx.set_fill_style(&JsValue::from_str("rgba(0, 0, 0, 1.0)"));
    let half = f64::from(LABEL_TEXTURE_SIZE) / 2.0;
    for (i, line) in text.lines().enumerate() {
        ctx.fill_text(line, half, half + (i as f64) * f64::from(font_size))
            .map_err(js_error)?;
    }
    let texture = three::Texture::new(&canvas);
    texture.set_needs_update(true);
    Ok(three::SpriteMaterial::new(&params(&[
        ("map", texture.into()),
        ("depthTest", true.into()),
        ("depthWrite", false.into()),
        ("polygonOffset", true.into()),
        ("polygonOffsetFactor", JsValue::from_f64(-1.0)),
        ("polygonOffsetUnits", JsValue::from_f64(1.0)),
    ])))
}

fn set_position(obj: &three::Object3D, p: DVec3) {
    obj.position().set(p.x, p.y, p.z);
}

fn set_rotation(obj: &three::Object3D, q: DQuat) {
    obj.quaternion().set(q.x, q.y, q.z, q.w);
}

fn position_attribute(floats: &[f32]) -> three::Float32BufferAttribute {
    three::Float32BufferAttribute::new(&js_sys::Float32Array::from(floats), 3)
}

fn upload(geometry: &three::BufferGeometry, floats: &[f32]) {
    let attr = geometry.get_attribute("position");
    attr.array().copy_from(floats);
    attr.set_needs_update(true);
    geometry.compute_bounding_sphere();
}

/// Per-node three.js resources, created lazily so a shared style maps to one
/// JS object.
struct Resources {
    geometries: Vec<Option<three::BufferGeometry>>,
    materials: Vec<Option<three::Material>>,
    labels: Vec<Option<three::SpriteMaterial>>,
}

impl Resources {
    fn new(node: &SceneNode) -> Self {
        Self {
            geometries: vec![None; node.geometries.len()],
            materials: vec![None; node.materials.len()],
            labels: vec![None; node.labels.len()],
        }
    }

    fn geometry(
        &mut self,
        node: &SceneNode,
        id: GeometryId,
    ) -> anyhow::Result<three::BufferGeometry> {
        let slot = self
            .geometries
            .get_mut(id.0)
            .ok_or_else(|| anyhow!("geometry {} out of range", id.0))?;
        if let Some(g) = slot {
            return Ok(g.clone());
        }
        let built: three::BufferGeometry = match node.geometry(id) {
            Some(Geometry::Sphere { radius }) => {
                three::SphereGeometry::new(*radius, SPHERE_SEGMENTS.0, SPHERE_SEGMENTS.1).into()
            }
            Some(Geometry::Cone { radius, height }) => {
                three::ConeGeometry::new(*radius, *height, CONE_SEGMENTS).into()
            }
            None => return Err(anyhow!("geometry {} out of range", id.0)),
        };
        *slot = Some(built.clone());
        Ok(built)
    }

    fn material(
        &mut self,
        node: &SceneNode,
        id: MaterialId,
        class: MaterialClass,
    ) -> anyhow::Result<three::Material> {
        let spec = node
            .material(id)
            .ok_or_else(|| anyhow!("material {} out of range", id.0))?;
        let slot = &mut self.materials[id.0];
        if let Some(m) = slot {
            return Ok(m.clone());
        }
        let built = build_material(spec, class);
        *slot = Some(built.clone());
        Ok(built)
    }

    /// One material for a single id, otherwise an array matched to draw groups.
    fn material_list(
        &mut self,
        node: &SceneNode,
        ids: &[MaterialId],
        class: MaterialClass,
    ) -> anyhow::Result<JsValue> {
        if let [single] = ids {
            return Ok(self.material(node, *single, class)?.into());
        }
        let list = js_sys::Array::new();
        for id in ids {
            list.push(&self.material(node, *id, class)?);
        }
        Ok(list.into())
    }

    fn label(&mut self, node: &SceneNode, id: LabelId) -> anyhow::Result<three::SpriteMaterial> {
        let texture = node
            .labels
            .get(id.0)
            .ok_or_else(|| anyhow!("label {} out of range", id.0))?;
        let slot = &mut self.labels[id.0];
        if let Some(m) = slot {
            return Ok(m.clone());
        }
        let built = label_material(&texture.text, texture.font_size)?;
        *slot = Some(built.clone());
        Ok(built)
    }
}

enum Parts {
    /// One object per sphere, sprite or cone, in body order.
    Instances(Vec<three::Object3D>),
    Lines(three::BufferGeometry),
    Faces,
}

struct ChildMirror {
    object: three::Object3D,
    parts: Parts,
}

struct NodeMirror {
    group: three::Group,
    children: Vec<ChildMirror>,
    face_geometry: Option<three::BufferGeometry>,
    resources: Resources,
    revision: u64,
}

impl NodeMirror {
    fn build(node: &SceneNode) -> anyhow::Result<Self> {
        let group = three::Group::new();
        group.set_name(&node.name);
        let mut res = Resources::new(node);
        let face_geometry = node.face_buffer.as_ref().map(|buffer| {
            let geometry = three::BufferGeometry::new();
            geometry.set_attribute("position", &position_attribute(buffer.as_floats()));
            for g in buffer.groups() {
                geometry.add_group(g.start as u32, g.count as u32, g.material_index as u32);
            }
            geometry
        });

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let (object, parts): (three::Object3D, Parts) = match &child.body {
                Body::Spheres(spheres) => {
                    let holder = three::Group::new();
                    let mut parts = Vec::with_capacity(spheres.len());
                    for s in spheres {
                        let material = res.material(node, s.material, MaterialClass::Mesh)?;
                        let mesh = three::Mesh::new(&res.geometry(node, s.geometry)?, &material);
                        set_position(&mesh, s.position);
                        holder.add(&mesh);
                        parts.push(mesh.into());
                    }
                    (holder.into(), Parts::Instances(parts))
                }
                Body::Sprites(sprites) => {
                    let holder = three::Group::new();
                    let mut parts = Vec::with_capacity(sprites.len());
                    for s in sprites {
                        let sprite = three::Sprite::new(&res.label(node, s.label)?);
                        set_position(&sprite, s.position);
                        holder.add(&sprite);
                        parts.push(sprite.into());
                    }
                    (holder.into(), Parts::Instances(parts))
                }
                Body::Cones(cones) => {
                    let holder = three::Group::new();
                    let mut parts = Vec::with_capacity(cones.len());
                    for c in cones {
                        let material = res.material(node, c.material, MaterialClass::Mesh)?;
                        let mesh = three::Mesh::new(&res.geometry(node, c.geometry)?, &material);
                        set_position(&mesh, c.position);
                        set_rotation(&mesh, c.rotation);
                        holder.add(&mesh);
                        parts.push(mesh.into());
                    }
                    (holder.into(), Parts::Instances(parts))
                }
                Body::Lines(lines) => {
                    let geometry = three::BufferGeometry::new();
                    let attribute = position_attribute(lines.buffer.as_floats());
                    geometry.set_attribute("position", &attribute);
                    for g in lines.buffer.groups() {
                        geometry.add_group(g.start as u32, g.count as u32, g.material_index as u32);
                    }
                    let material = res.material_list(node, &lines.materials, MaterialClass::Line)?;
                    let segments = three::LineSegments::new(&geometry, &material);
                    (segments.into(), Parts::Lines(geometry))
                }
                Body::Faces(faces) => {
                    let geometry = face_geometry
                        .as_ref()
                        .ok_or_else(|| anyhow!("{}: faces without a face buffer", node.name))?;
                    let material = res.material_list(node, &faces.materials, MaterialClass::Mesh)?;
                    (three::Mesh::new(geometry, &material).into(), Parts::Faces)
                }
            };
            object.set_name(child.name);
            object.set_visible(child.visible);
            group.add(&object);
            children.push(ChildMirror { object, parts });
        }

        Ok(Self {
            group,
            children,
            face_geometry,
            resources: res,
            revision: node.revision,
        })
    }

    fn move_instances(&self, node: &SceneNode) {
        for (child, mirror) in node.children.iter().zip(&self.children) {
            let Parts::Instances(objects) = &mirror.parts else {
                continue;
            };
            match &child.body {
                Body::Spheres(spheres) => {
                    for (obj, s) in objects.iter().zip(spheres) {
                        set_position(obj, s.position);
                    }
                }
                Body::Sprites(sprites) => {
                    for (obj, s) in objects.iter().zip(sprites) {
                        set_position(obj, s.position);
                    }
                }
                Body::Cones(cones) => {
                    for (obj, c) in objects.iter().zip(cones) {
                        set_position(obj, c.position);
                        set_rotation(obj, c.rotation);
                    }
                }
                _ => {}
            }
        }
    }

    fn upload_buffers(&self, node: &mut SceneNode) {
        for (child, mirror) in node.children.iter_mut().zip(&self.children) {
            if let (Body::Lines(lines), Parts::Lines(geometry)) = (&mut child.body, &mirror.parts) {
                if lines.buffer.take_dirty() {
                    upload(geometry, lines.buffer.as_floats());
                }
            }
        }
        if let (Some(buffer), Some(geometry)) = (node.face_buffer.as_mut(), &self.face_geometry) {
            if buffer.take_dirty() {
                upload(geometry, buffer.as_floats());
            }
        }
    }

    fn restyle(&self, node: &SceneNode) {
        for (child, mirror) in node.children.iter().zip(&self.children) {
            mirror.object.set_visible(child.visible);
        }
        for (spec, material) in node.materials.iter().zip(&self.resources.materials) {
            if let Some(m) = material {
                m.set_opacity(spec.opacity);
                m.set_transparent(spec.transparent);
                m.set_needs_update(true);
            }
        }
    }
}

pub struct SceneMirror {
    pub scene: three::Scene,
    nodes: Vec<NodeMirror>,
    style_revision: u64,
}

impl SceneMirror {
    pub fn build(graph: &SceneGraph) -> anyhow::Result<Self> {
        let scene = three::Scene::new();
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            let mirror = NodeMirror::build(node)?;
            scene.add(&mirror.group);
            nodes.push(mirror);
        }
        let mirror = Self {
            scene,
            nodes,
            style_revision: graph.style_revision,
        };
        mirror.place(graph);
        Ok(mirror)
    }

    /// Scene rotation plus per-node offset and visibility.
    fn place(&self, graph: &SceneGraph) {
        let r = graph.rotation;
        self.scene.rotation().set(r.x, r.y, r.z);
        for (node, mirror) in graph.nodes.iter().zip(&self.nodes) {
            set_position(&mirror.group, node.position);
            mirror.group.set_visible(node.visible);
        }
    }

    /// Apply sub-object visibility and material state if it changed.
    pub fn restyle(&mut self, graph: &SceneGraph) {
        if self.style_revision == graph.style_revision {
            return;
        }
        for (node, mirror) in graph.nodes.iter().zip(&self.nodes) {
            mirror.restyle(node);
        }
        self.style_revision = graph.style_revision;
    }

    pub fn sync(&mut self, graph: &mut SceneGraph) {
        self.place(graph);
        for (node, mirror) in graph.nodes.iter_mut().zip(&mut self.nodes) {
            if mirror.revision != node.revision {
                mirror.move_instances(node);
                mirror.revision = node.revision;
            }
            mirror.upload_buffers(node);
        }
        self.restyle(graph);
    }
}

enum ThreeCamera {
    Perspective(three::PerspectiveCamera),
    Orthographic(three::OrthographicCamera),
}

impl ThreeCamera {
    fn new(camera: &scene_core::Camera) -> Self {
        match camera.projection {
            Projection::Perspective {
                fovy_degrees,
                aspect,
            } => ThreeCamera::Perspective(three::PerspectiveCamera::new(
                fovy_degrees,
                aspect,
                camera.znear,
                camera.zfar,
            )),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                ..
            } => ThreeCamera::Orthographic(three::OrthographicCamera::new(
                left,
                right,
                top,
                bottom,
                camera.znear,
                camera.zfar,
            )),
        }
    }

    fn camera(&self) -> &three::Camera {
        match self {
            ThreeCamera::Perspective(c) => c,
            ThreeCamera::Orthographic(c) => c,
        }
    }

    fn set_projection(&self, projection: &Projection) {
        match (self, projection) {
            (
                ThreeCamera::Perspective(c),
                Projection::Perspective {
                    fovy_degrees,
                    aspect,
                },
            ) => {
                c.set_fov(*fovy_degrees);
                c.set_aspect(*aspect);
            }
            (
                ThreeCamera::Orthographic(c),
                Projection::Orthographic {
                    left,
                    right,
                    top,
                    bottom,
                    ..
                },
            ) => {
                c.set_left(*left);
                c.set_right(*right);
                c.set_top(*top);
                c.set_bottom(*bottom);
            }
            _ => log::warn!("[ui] camera projection changed type; ignoring"),
        }
        self.camera().update_projection_matrix();
    }
}

/// What was last written into one JS camera/control pair.
#[derive(Clone, PartialEq)]
struct Pushed {
    pose: Pose,
    target: DVec3,
    projection: Projection,
    enabled: bool,
}

fn read_vec(v: &three::Vector3) -> DVec3 {
    DVec3::new(v.x(), v.y(), v.z())
}

/// Camera/control pairs. The rig is authoritative for anything it changed
/// since the last push; otherwise orbiting in the page is adopted into it.
pub struct CameraMirror {
    cameras: Vec<ThreeCamera>,
    controls: Vec<three::OrbitControls>,
    pushed: Vec<Option<Pushed>>,
    active: usize,
}

impl CameraMirror {
    pub fn build(rig: &CameraRig, dom_element: &web::HtmlElement) -> Self {
        let cameras: Vec<ThreeCamera> = rig.cameras().iter().map(ThreeCamera::new).collect();
        let controls = cameras
            .iter()
            .map(|c| three::OrbitControls::new(c.camera(), dom_element))
            .collect();
        Self {
            pushed: vec![None; cameras.len()],
            cameras,
            controls,
            active: rig.active_index(),
        }
    }

    /// JS camera of the pair that was active at the last sync.
    pub fn active(&self) -> &three::Camera {
        self.cameras[self.active].camera()
    }

    fn state(rig: &CameraRig, i: usize) -> Pushed {
        let camera = &rig.cameras()[i];
        let control = &rig.controls()[i];
        Pushed {
            pose: camera.pose,
            target: control.target,
            projection: camera.projection.clone(),
            enabled: control.enabled,
        }
    }

    pub fn sync(&mut self, rig: &mut CameraRig) {
        let active = rig.active_index();
        self.active = active;
        if let Some(pushed) = self.pushed[active].as_mut() {
            if *pushed == Self::state(rig, active) {
                let eye = read_vec(&self.cameras[active].camera().position());
                let target = read_vec(&self.controls[active].target());
                if eye != pushed.pose.eye || target != pushed.target {
                    rig.orbit_to(eye, target);
                    *pushed = Self::state(rig, active);
                }
            }
        }
        for i in 0..self.cameras.len() {
            let state = Self::state(rig, i);
            if self.pushed[i].as_ref() == Some(&state) {
                continue;
            }
            let three_cam = &self.cameras[i];
            let camera = three_cam.camera();
            let Pose { eye, up, .. } = state.pose;
            camera.position().set(eye.x, eye.y, eye.z);
            camera.up().set(up.x, up.y, up.z);
            camera.look_at(state.target.x, state.target.y, state.target.z);
            three_cam.set_projection(&state.projection);
            let control = &self.controls[i];
            control.target().set(state.target.x, state.target.y, state.target.z);
            control.set_enabled(state.enabled);
            control.update();
            self.pushed[i] = Some(state);
        }
    }
}

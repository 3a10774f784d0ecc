//! Bindings to the subset of three.js the viewer drives. The page loads
//! three.js (plus the OrbitControls and SVGRenderer add-ons) onto the global
//! `THREE` namespace before the module starts.

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

pub const FRONT_SIDE: u32 = 0;
pub const BACK_SIDE: u32 = 1;
pub const DOUBLE_SIDE: u32 = 2;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = THREE)]
    pub type Vector3;
    #[wasm_bindgen(method)]
    pub fn set(this: &Vector3, x: f64, y: f64, z: f64);
    #[wasm_bindgen(method, getter)]
    pub fn x(this: &Vector3) -> f64;
    #[wasm_bindgen(method, getter)]
    pub fn y(this: &Vector3) -> f64;
    #[wasm_bindgen(method, getter)]
    pub fn z(this: &Vector3) -> f64;

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Euler;
    #[wasm_bindgen(method)]
    pub fn set(this: &Euler, x: f64, y: f64, z: f64);

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Quaternion;
    #[wasm_bindgen(method)]
    pub fn set(this: &Quaternion, x: f64, y: f64, z: f64, w: f64);

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Color;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(r: f32, g: f32, b: f32) -> Color;

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Object3D;
    #[wasm_bindgen(method, getter)]
    pub fn position(this: &Object3D) -> Vector3;
    #[wasm_bindgen(method, getter)]
    pub fn rotation(this: &Object3D) -> Euler;
    #[wasm_bindgen(method, getter)]
    pub fn quaternion(this: &Object3D) -> Quaternion;
    #[wasm_bindgen(method, getter)]
    pub fn up(this: &Object3D) -> Vector3;
    #[wasm_bindgen(method, setter)]
    pub fn set_visible(this: &Object3D, visible: bool);
    #[wasm_bindgen(method, setter)]
    pub fn set_name(this: &Object3D, name: &str);
    #[wasm_bindgen(method)]
    pub fn add(this: &Object3D, child: &Object3D);
    #[wasm_bindgen(method, js_name = lookAt)]
    pub fn look_at(this: &Object3D, x: f64, y: f64, z: f64);

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type Scene;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new() -> Scene;

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type Group;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new() -> Group;

    // ---------------- Geometry ----------------

    #[wasm_bindgen(js_namespace = THREE)]
    pub type BufferAttribute;
    #[wasm_bindgen(method, getter)]
    pub fn array(this: &BufferAttribute) -> Float32Array;
    #[wasm_bindgen(method, setter = needsUpdate)]
    pub fn set_needs_update(this: &BufferAttribute, value: bool);

    #[wasm_bindgen(js_namespace = THREE, extends = BufferAttribute)]
    pub type Float32BufferAttribute;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(array: &Float32Array, item_size: u32) -> Float32BufferAttribute;

    #[wasm_bindgen(js_namespace = THREE)]
    pub type BufferGeometry;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new() -> BufferGeometry;
    #[wasm_bindgen(method, js_name = setAttribute)]
    pub fn set_attribute(this: &BufferGeometry, name: &str, attribute: &BufferAttribute);
    #[wasm_bindgen(method, js_name = getAttribute)]
    pub fn get_attribute(this: &BufferGeometry, name: &str) -> BufferAttribute;
    #[wasm_bindgen(method, js_name = addGroup)]
    pub fn add_group(this: &BufferGeometry, start: u32, count: u32, material_index: u32);
    #[wasm_bindgen(method, js_name = computeBoundingSphere)]
    pub fn compute_bounding_sphere(this: &BufferGeometry);

    #[wasm_bindgen(js_namespace = THREE, extends = BufferGeometry)]
    pub type SphereGeometry;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(radius: f64, width_segments: u32, height_segments: u32) -> SphereGeometry;

    #[wasm_bindgen(js_namespace = THREE, extends = BufferGeometry)]
    pub type ConeGeometry;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(radius: f64, height: f64, radial_segments: u32) -> ConeGeometry;

    // ---------------- Materials ----------------

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Material;
    #[wasm_bindgen(method, setter)]
    pub fn set_opacity(this: &Material, opacity: f32);
    #[wasm_bindgen(method, setter)]
    pub fn set_transparent(this: &Material, transparent: bool);
    #[wasm_bindgen(method, setter = needsUpdate)]
    pub fn set_needs_update(this: &Material, value: bool);

    #[wasm_bindgen(js_namespace = THREE, extends = Material)]
    pub type MeshBasicMaterial;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(params: &JsValue) -> MeshBasicMaterial;

    #[wasm_bindgen(js_namespace = THREE, extends = Material)]
    pub type LineBasicMaterial;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(params: &JsValue) -> LineBasicMaterial;

    #[wasm_bindgen(js_namespace = THREE, extends = Material)]
    pub type SpriteMaterial;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(params: &JsValue) -> SpriteMaterial;

    #[wasm_bindgen(js_namespace = THREE)]
    pub type Texture;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(canvas: &web_sys::HtmlCanvasElement) -> Texture;
    #[wasm_bindgen(method, setter = needsUpdate)]
    pub fn set_needs_update(this: &Texture, value: bool);

    // ---------------- Renderables ----------------

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type Mesh;
    /// `material` is a single material or an array matched to draw groups.
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(geometry: &BufferGeometry, material: &JsValue) -> Mesh;

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type LineSegments;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(geometry: &BufferGeometry, material: &JsValue) -> LineSegments;

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type Sprite;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(material: &SpriteMaterial) -> Sprite;

    // ---------------- Cameras ----------------

    #[wasm_bindgen(js_namespace = THREE, extends = Object3D)]
    pub type Camera;
    #[wasm_bindgen(method, js_name = updateProjectionMatrix)]
    pub fn update_projection_matrix(this: &Camera);

    #[wasm_bindgen(js_namespace = THREE, extends = Camera)]
    pub type PerspectiveCamera;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> PerspectiveCamera;
    #[wasm_bindgen(method, setter)]
    pub fn set_fov(this: &PerspectiveCamera, fov: f64);
    #[wasm_bindgen(method, setter)]
    pub fn set_aspect(this: &PerspectiveCamera, aspect: f64);

    #[wasm_bindgen(js_namespace = THREE, extends = Camera)]
    pub type OrthographicCamera;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        near: f64,
        far: f64,
    ) -> OrthographicCamera;
    #[wasm_bindgen(method, setter)]
    pub fn set_left(this: &OrthographicCamera, v: f64);
    #[wasm_bindgen(method, setter)]
    pub fn set_right(this: &OrthographicCamera, v: f64);
    #[wasm_bindgen(method, setter)]
    pub fn set_top(this: &OrthographicCamera, v: f64);
    #[wasm_bindgen(method, setter)]
    pub fn set_bottom(this: &OrthographicCamera, v: f64);

    #[wasm_bindgen(js_namespace = THREE)]
    pub type OrbitControls;
    #[wasm_bindgen(constructor, js_namespace = THREE)]
    pub fn new(camera: &Camera, dom_element: &web_sys::HtmlElement) -> OrbitControls;
    #[wasm_bindgen(method, setter)]
    pub fn set_enabled(this: &OrbitControls, enabled: bool);
    #[wasm_bindgen(method, getter)]
    pub fn target(this: &OrbitControls) -> Vector3;
    #[wasm_bindgen(method)]
    pub fn update(this: &OrbitControls) -> bool;

    // ---------------- Renderers ----------------

    #[wasm_bindgen(js_namespace = THREE, js_name = WebGLRenderer)]
    pub type WebGlRenderer;
    #[wasm_bindgen(constructor, js_namespace = THREE, js_class = WebGLRenderer)]
    pub fn new(params: &JsValue) -> WebGlRenderer;
    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &WebGlRenderer, width: f64, height: f64);
    #[wasm_bindgen(method, js_name = setPixelRatio)]
    pub fn set_pixel_ratio(this: &WebGlRenderer, ratio: f64);
    #[wasm_bindgen(method)]
    pub fn render(this: &WebGlRenderer, scene: &Scene, camera: &Camera);
    #[wasm_bindgen(method, getter = domElement)]
    pub fn dom_element(this: &WebGlRenderer) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(js_namespace = THREE, js_name = SVGRenderer)]
    pub type SvgRenderer;
    #[wasm_bindgen(constructor, js_namespace = THREE, js_class = SVGRenderer)]
    pub fn new() -> SvgRenderer;
    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &SvgRenderer, width: f64, height: f64);
    #[wasm_bindgen(method)]
    pub fn render(this: &SvgRenderer, scene: &Scene, camera: &Camera);
    #[wasm_bindgen(method, getter = domElement)]
    pub fn dom_element(this: &SvgRenderer) -> web_sys::Element;
}

/// Plain JS object built from `(key, value)` pairs, for constructor
/// parameter bags.
pub fn params(entries: &[(&str, JsValue)]) -> JsValue {
    let obj = js_sys::Object::new();
    for (key, value) in entries {
        let _ = js_sys::Reflect::set(&obj, &JsValue::from_str(key), value);
    }
    obj.into()
}

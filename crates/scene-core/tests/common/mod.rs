// Fake page for host-side tests: recorded listeners, timers fired by hand and
// a vector renderer that notes what it was asked to draw.

#![allow(dead_code)]

use scene_core::camera::Camera;
use scene_core::config::ViewerConfig;
use scene_core::constants::ids;
use scene_core::explode::{TimerId, TimerKind};
use scene_core::host::{
    ControlState, Delivery, EventHandler, EventKind, EventOutcome, Host, KeyPress, ListenerId,
    RangeSpec, Target, TimerCallback, UiEvent, VectorRenderer,
};
use scene_core::scene::{ObjectKind, SceneGraph};
use scene_core::{Result, SceneError, Session, Shared};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

pub struct Listener {
    pub target: Target,
    pub kind: EventKind,
    pub handler: Rc<RefCell<EventHandler>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppendedCheckbox {
    pub container: String,
    pub name: String,
    pub caption: String,
    pub id: String,
}

#[derive(Default)]
pub struct FakeHost {
    next_id: u64,
    pub elements: HashSet<String>,
    pub listeners: BTreeMap<ListenerId, Listener>,
    pub timers: BTreeMap<u64, (TimerKind, Rc<RefCell<TimerCallback>>)>,
    pub values: HashMap<String, f64>,
    pub visible: HashMap<String, bool>,
    pub checked: HashMap<String, bool>,
    pub selected: HashMap<String, usize>,
    pub groups: Vec<(String, String, String)>,
    pub checkboxes: Vec<AppendedCheckbox>,
    pub ranges: Vec<(String, RangeSpec, String)>,
    pub aspect: f64,
    pub delivered: Vec<(String, Delivery)>,
    /// For every render: whether any label sub-object was visible.
    pub renders_with_labels: Vec<bool>,
}

impl FakeHost {
    /// A page carrying every element the viewer looks up.
    pub fn with_page(config: &ViewerConfig) -> Self {
        let bases = [
            ids::SETTINGS,
            ids::SHOW_SETTINGS_BUTTON,
            ids::HIDE_SETTINGS_BUTTON,
            ids::CAMERA_TYPE,
            ids::TRANSPARENCY_RANGE,
            ids::ROTATION_X,
            ids::ROTATION_Y,
            ids::ROTATION_Z,
            ids::ROTATION_SPEED_RANGE,
            ids::RESET_BUTTON,
            ids::TAKE_SCREENSHOT,
            ids::SCREENSHOT_IN_TAB,
            ids::EXPLODE_RANGE,
            ids::EXPLODE_CHECKBOX,
            ids::EXPLODING_SPEED_RANGE,
            ids::SHOWN_OBJECT_TYPES,
            ids::SHOWN_OBJECTS,
        ];
        Self {
            elements: bases.iter().map(|b| config.element_id(b)).collect(),
            aspect: 1.0,
            ..Default::default()
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_timers(&self) -> Vec<(TimerId, TimerKind)> {
        self.timers
            .iter()
            .map(|(id, (kind, _))| (TimerId(*id), *kind))
            .collect()
    }

    pub fn listeners_on(&self, target: &Target, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|l| &l.target == target && l.kind == kind)
            .count()
    }

    pub fn checkbox(&self, container: &str, name: &str) -> Option<&AppendedCheckbox> {
        self.checkboxes
            .iter()
            .find(|c| c.container == container && c.name == name)
    }
}

impl VectorRenderer for FakeHost {
    fn render_svg(&mut self, scene: &SceneGraph, _camera: &Camera) -> Result<String> {
        let labels_visible = scene.nodes.iter().any(|n| {
            n.children
                .iter()
                .any(|c| c.kind.is_label() && c.visible)
        });
        self.renders_with_labels.push(labels_visible);
        Ok(format!("<svg data-nodes=\"{}\"></svg>", scene.nodes.len()))
    }
}

impl Host for FakeHost {
    fn listen(
        &mut self,
        target: &Target,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<ListenerId> {
        if let Target::Element(id) = target {
            if !self.elements.contains(id) {
                return Err(SceneError::MissingElement(id.clone()));
            }
        }
        let id = ListenerId(self.next());
        self.listeners.insert(
            id,
            Listener {
                target: target.clone(),
                kind,
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        Ok(id)
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn start_timer(&mut self, kind: TimerKind, callback: TimerCallback) -> TimerId {
        let id = self.next();
        self.timers.insert(id, (kind, Rc::new(RefCell::new(callback))));
        TimerId(id)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.remove(&id.0);
    }

    fn set_control_value(&mut self, element_id: &str, value: f64) {
        self.values.insert(element_id.to_string(), value);
    }

    fn set_element_visible(&mut self, element_id: &str, visible: bool) {
        self.visible.insert(element_id.to_string(), visible);
    }

    fn is_checked(&self, element_id: &str) -> Result<bool> {
        if !self.elements.contains(element_id) {
            return Err(SceneError::MissingElement(element_id.to_string()));
        }
        Ok(self.checked.get(element_id).copied().unwrap_or(false))
    }

    fn selected_index(&self, element_id: &str) -> Result<usize> {
        if !self.elements.contains(element_id) {
            return Err(SceneError::MissingElement(element_id.to_string()));
        }
        Ok(self.selected.get(element_id).copied().unwrap_or(0))
    }

    fn prepend_group(&mut self, parent_id: &str, group_id: &str, title: &str) -> Result<()> {
        if !self.elements.contains(parent_id) {
            return Err(SceneError::MissingElement(parent_id.to_string()));
        }
        self.elements.insert(group_id.to_string());
        self.groups
            .insert(0, (parent_id.into(), group_id.into(), title.into()));
        Ok(())
    }

    fn append_checkbox(
        &mut self,
        container_id: &str,
        name: &str,
        caption: &str,
        checked: bool,
    ) -> Result<String> {
        if !self.elements.contains(container_id) {
            return Err(SceneError::MissingElement(container_id.to_string()));
        }
        let id = format!("{container_id}-cb{}", self.next());
        self.elements.insert(id.clone());
        self.checked.insert(id.clone(), checked);
        self.checkboxes.push(AppendedCheckbox {
            container: container_id.into(),
            name: name.into(),
            caption: caption.into(),
            id: id.clone(),
        });
        Ok(id)
    }

    fn append_range(&mut self, container_id: &str, spec: &RangeSpec) -> Result<String> {
        if !self.elements.contains(container_id) {
            return Err(SceneError::MissingElement(container_id.to_string()));
        }
        let id = format!("{container_id}-range{}", self.next());
        self.elements.insert(id.clone());
        self.ranges.push((container_id.into(), spec.clone(), id.clone()));
        Ok(id)
    }

    fn viewport_aspect(&self) -> f64 {
        self.aspect
    }

    fn deliver_svg(&mut self, markup: &str, delivery: &Delivery) -> Result<()> {
        self.delivered.push((markup.to_string(), delivery.clone()));
        Ok(())
    }
}

/// Dispatch `event` to every listener on `target` for `kind`. No borrow of
/// the host is held while handlers run.
pub fn fire(
    host: &Shared<FakeHost>,
    target: &Target,
    kind: EventKind,
    event: UiEvent,
) -> Vec<EventOutcome> {
    let handlers: Vec<_> = host
        .borrow()
        .listeners
        .values()
        .filter(|l| &l.target == target && l.kind == kind)
        .map(|l| l.handler.clone())
        .collect();
    handlers
        .into_iter()
        .map(|h| {
            let mut handler = h.borrow_mut();
            (&mut **handler)(&event)
        })
        .collect()
}

pub fn input(host: &Shared<FakeHost>, element_id: &str, value: f64) {
    let state = ControlState {
        value,
        ..Default::default()
    };
    fire(
        host,
        &Target::Element(element_id.into()),
        EventKind::Input,
        UiEvent::Control(state),
    );
}

pub fn change(host: &Shared<FakeHost>, element_id: &str, state: ControlState) {
    fire(
        host,
        &Target::Element(element_id.into()),
        EventKind::Change,
        UiEvent::Control(state),
    );
}

pub fn toggle(host: &Shared<FakeHost>, element_id: &str, checked: bool) {
    host.borrow_mut().checked.insert(element_id.into(), checked);
    change(
        host,
        element_id,
        ControlState {
            checked,
            ..Default::default()
        },
    );
}

pub fn click(host: &Shared<FakeHost>, element_id: &str) {
    fire(
        host,
        &Target::Element(element_id.into()),
        EventKind::Click,
        UiEvent::Click,
    );
}

pub fn key_down(host: &Shared<FakeHost>, press: KeyPress) -> Vec<EventOutcome> {
    fire(host, &Target::Document, EventKind::KeyDown, UiEvent::Key(press))
}

/// Run the callback of timer `id` once, as the page would when it elapses.
/// Timeouts are removed before they run.
pub fn fire_timer(host: &Shared<FakeHost>, id: TimerId) {
    let callback = {
        let mut h = host.borrow_mut();
        let Some((kind, callback)) = h.timers.get(&id.0).cloned() else {
            return;
        };
        if matches!(kind, TimerKind::Timeout { .. }) {
            h.timers.remove(&id.0);
        }
        callback
    };
    let mut callback = callback.borrow_mut();
    (&mut **callback)(id);
}

/// Fire whatever single timer is live. Panics when there is not exactly one.
pub fn fire_only_timer(host: &Shared<FakeHost>) -> TimerKind {
    let live = host.borrow().live_timers();
    assert_eq!(live.len(), 1, "expected one live timer, got {live:?}");
    let (id, kind) = live[0];
    fire_timer(host, id);
    kind
}

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Session bound to a fake page.
pub fn bound_session(doc: serde_json::Value) -> (Shared<Session>, Shared<FakeHost>) {
    let data: scene_core::SceneData = serde_json::from_value(doc).expect("scene document");
    let host = shared(FakeHost::with_page(&data.config));
    let session = shared(Session::from_data(&data));
    scene_core::bind(&session, &host).expect("bind");
    (session, host)
}

pub fn kind_visible(session: &Shared<Session>, name: &str) -> Vec<bool> {
    session
        .borrow()
        .scene
        .nodes
        .iter()
        .filter_map(|n| n.object_by_name(name).map(|o| o.visible))
        .collect()
}

// Sample documents

/// Unit cube centered at `center`, with edges, labelled points and faces.
pub fn cube(name: &str, center: [f64; 3], explodable: bool) -> serde_json::Value {
    let [cx, cy, cz] = center;
    let mut points = Vec::new();
    for &x in &[-0.5, 0.5] {
        for &y in &[-0.5, 0.5] {
            for &z in &[-0.5, 0.5] {
                points.push([cx + x, cy + y, cz + z]);
            }
        }
    }
    json!({
        "name": name,
        "points": points,
        "pointradii": 0.02,
        "pointmaterial": {"color": [0.0, 0.0, 0.0]},
        "pointlabels": ["0", "1", "2", "3", "4", "5", "6", "7"],
        "edgeindices": [0,1, 0,2, 0,4, 1,3, 1,5, 2,3, 2,6, 3,7, 4,5, 4,6, 5,7, 6,7],
        "edgematerial": {"color": [0.2, 0.2, 0.2]},
        "facets": [[0,1,3,2], [4,6,7,5], [0,4,5,1], [2,3,7,6], [0,2,6,4], [1,5,7,3]],
        "facetmaterial": {"color": [1.0, 0.0, 0.0], "transparent": true},
        "explodable": explodable
    })
}

/// Two triangles sharing the edge 0-1; the second folds up about that edge
/// to a dihedral rest angle of pi/2.
pub fn hinged_pair() -> serde_json::Value {
    json!({
        "name": "net",
        "points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
        "edgeindices": [0,1, 1,2, 2,0, 1,3, 3,0],
        "edgematerial": {"color": [0.0, 0.0, 0.0]},
        "edgelabels": ["a", "b", "c", "d", "e"],
        "facets": [[0,1,2], [0,3,1]],
        "facetmaterial": [{"color": [1.0, 0.0, 0.0]}, {"color": [0.0, 0.0, 1.0]}],
        "axes": [[0, 1]],
        "subtrees": [[3]],
        "angles": [std::f64::consts::FRAC_PI_2]
    })
}

/// Three triangles in a strip. The inner hinge (1-3) is listed before the
/// outer one (0-1) whose subtree carries it.
pub fn nested_net() -> serde_json::Value {
    json!({
        "name": "strip",
        "points": [
            [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]
        ],
        "edgeindices": [0,1, 1,2, 2,0, 1,3, 3,0, 3,4, 4,1],
        "edgematerial": {"color": [0.0, 0.0, 0.0]},
        "facets": [[0,1,2], [0,3,1], [1,3,4]],
        "facetmaterial": {"color": [0.0, 1.0, 0.0]},
        "axes": [[1, 3], [0, 1]],
        "subtrees": [[4], [3, 4]],
        "angles": [2.0, std::f64::consts::FRAC_PI_2]
    })
}

pub fn scene(nodes: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "nodes": nodes })
}

pub fn kinds_of(session: &Shared<Session>) -> Vec<ObjectKind> {
    session.borrow().scene.contains.iter().collect()
}

//! [`Host`] over the browser DOM plus the three.js stage it draws into.
//!
//! Handlers and timer callbacks are owned by their JS closures, so the page
//! calls them without touching `WebHost`; they are free to borrow the host
//! again. Detached closures are parked until the next frame because a
//! handler may detach itself while it is running.

use crate::dom::{self, js_error};
use crate::mirror::{CameraMirror, SceneMirror};
use crate::three::{self, params};
use fnv::FnvHashMap;
use scene_core::explode::{TimerId, TimerKind};
use scene_core::host::{
    ControlState, Delivery, EventHandler, EventKind, EventOutcome, KeyPress, ListenerId,
    RangeSpec, Target, TimerCallback, UiEvent,
};
use scene_core::{Camera, Host, Result, SceneError, SceneGraph, Session, VectorRenderer};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// WebGL output, the SVG renderer used for screenshots and the mirrored
/// scene they both draw.
pub struct Stage {
    container: web::HtmlElement,
    renderer: three::WebGlRenderer,
    svg: three::SvgRenderer,
    pub scene: SceneMirror,
    pub cameras: CameraMirror,
}

impl Stage {
    pub fn new(container: web::HtmlElement, session: &Session) -> anyhow::Result<Self> {
        let renderer = three::WebGlRenderer::new(&params(&[
            ("antialias", true.into()),
            ("alpha", true.into()),
        ]));
        if let Some(w) = web::window() {
            renderer.set_pixel_ratio(w.device_pixel_ratio());
        }
        let canvas = renderer.dom_element();
        container.append_child(&canvas).map_err(js_error)?;
        let scene = SceneMirror::build(&session.scene)?;
        let cameras = CameraMirror::build(&session.cameras, &canvas);
        let stage = Self {
            container,
            renderer,
            svg: three::SvgRenderer::new(),
            scene,
            cameras,
        };
        stage.resize();
        Ok(stage)
    }

    fn size(&self) -> (f64, f64) {
        (
            f64::from(self.container.client_width()),
            f64::from(self.container.client_height()),
        )
    }

    pub fn resize(&self) {
        let (w, h) = self.size();
        self.renderer.set_size(w, h);
        self.svg.set_size(w, h);
    }

    pub fn aspect(&self) -> f64 {
        match self.size() {
            (w, h) if w > 0.0 && h > 0.0 => w / h,
            _ => 1.0,
        }
    }

    pub fn draw(&mut self, session: &mut Session) {
        self.scene.sync(&mut session.scene);
        self.cameras.sync(&mut session.cameras);
        self.renderer.render(&self.scene.scene, self.cameras.active());
    }
}

struct Listener {
    target: web::EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(web::Event)>,
}

struct Timer {
    handle: i32,
    kind: TimerKind,
    _closure: Closure<dyn FnMut()>,
}

pub struct WebHost {
    window: web::Window,
    document: web::Document,
    pub stage: Stage,
    listeners: FnvHashMap<ListenerId, Listener>,
    timers: FnvHashMap<u64, Timer>,
    retired_listeners: Vec<Listener>,
    retired_timers: Vec<Timer>,
    next_id: u64,
}

impl WebHost {
    pub fn new(window: web::Window, document: web::Document, stage: Stage) -> Self {
        Self {
            window,
            document,
            stage,
            listeners: FnvHashMap::default(),
            timers: FnvHashMap::default(),
            retired_listeners: Vec::new(),
            retired_timers: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Drop closures detached since the last frame.
    pub fn collect_retired(&mut self) {
        self.retired_listeners.clear();
        self.retired_timers.clear();
    }

    fn event_target(&self, target: &Target) -> Result<web::EventTarget> {
        match target {
            Target::Document => Ok(self.document.clone().into()),
            Target::Element(id) => dom::element::<web::Element>(&self.document, id).map(Into::into),
        }
    }

    fn container(&self, id: &str) -> Result<web::Element> {
        dom::element(&self.document, id)
    }
}

fn key_press(event: &web::Event) -> KeyPress {
    let Some(key) = event.dyn_ref::<web::KeyboardEvent>() else {
        return KeyPress::default();
    };
    KeyPress {
        code: key.key_code(),
        ctrl: key.ctrl_key(),
        shift: key.shift_key(),
        alt: key.alt_key(),
        meta: key.meta_key(),
        in_text_input: dom::in_text_input(event),
    }
}

fn control_state(event: &web::Event) -> ControlState {
    let Some(target) = event.current_target() else {
        return ControlState::default();
    };
    if let Some(input) = target.dyn_ref::<web::HtmlInputElement>() {
        let value = input.value_as_number();
        ControlState {
            value: if value.is_nan() { 0.0 } else { value },
            checked: input.checked(),
            selected_index: None,
        }
    } else if let Some(select) = target.dyn_ref::<web::HtmlSelectElement>() {
        ControlState {
            selected_index: usize::try_from(select.selected_index()).ok(),
            ..Default::default()
        }
    } else {
        ControlState::default()
    }
}

fn ui_event(kind: EventKind, event: &web::Event) -> UiEvent {
    match kind {
        EventKind::Input | EventKind::Change => UiEvent::Control(control_state(event)),
        EventKind::Click => UiEvent::Click,
        EventKind::KeyDown | EventKind::KeyUp | EventKind::KeyPress => {
            UiEvent::Key(key_press(event))
        }
    }
}

impl VectorRenderer for WebHost {
    fn render_svg(&mut self, scene: &SceneGraph, _camera: &Camera) -> Result<String> {
        // the JS cameras already follow the rig
        let stage = &mut self.stage;
        stage.scene.restyle(scene);
        stage.svg.render(&stage.scene.scene, stage.cameras.active());
        let serializer =
            web::XmlSerializer::new().map_err(|e| SceneError::VectorRender(format!("{e:?}")))?;
        serializer
            .serialize_to_string(&stage.svg.dom_element())
            .map_err(|e| SceneError::VectorRender(format!("{e:?}")))
    }
}

impl Host for WebHost {
    fn listen(
        &mut self,
        target: &Target,
        kind: EventKind,
        mut handler: EventHandler,
    ) -> Result<ListenerId> {
        let event_target = self.event_target(target)?;
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            if handler(&ui_event(kind, &ev)) == EventOutcome::Consume {
                ev.prevent_default();
                ev.stop_propagation();
            }
        }) as Box<dyn FnMut(web::Event)>);
        event_target
            .add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
            .map_err(|e| SceneError::Page(format!("{e:?}")))?;
        let id = ListenerId(self.next_id());
        self.listeners.insert(
            id,
            Listener {
                target: event_target,
                kind,
                closure,
            },
        );
        Ok(id)
    }

    fn unlisten(&mut self, id: ListenerId) {
        if let Some(listener) = self.listeners.remove(&id) {
            _ = listener.target.remove_event_listener_with_callback(
                listener.kind.as_str(),
                listener.closure.as_ref().unchecked_ref(),
            );
            self.retired_listeners.push(listener);
        }
    }

    fn start_timer(&mut self, kind: TimerKind, mut callback: TimerCallback) -> TimerId {
        let id = self.next_id();
        let closure = Closure::wrap(Box::new(move || callback(TimerId(id))) as Box<dyn FnMut()>);
        let f = closure.as_ref().unchecked_ref();
        let handle = match kind {
            TimerKind::Interval { period_ms } => self
                .window
                .set_interval_with_callback_and_timeout_and_arguments_0(f, period_ms as i32),
            TimerKind::Timeout { delay_ms } => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(f, delay_ms as i32),
        };
        match handle {
            Ok(handle) => {
                self.timers.insert(
                    id,
                    Timer {
                        handle,
                        kind,
                        _closure: closure,
                    },
                );
            }
            Err(e) => log::error!("[explode] timer not started: {:?}", e),
        }
        TimerId(id)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.remove(&id.0) {
            match timer.kind {
                TimerKind::Interval { .. } => self.window.clear_interval_with_handle(timer.handle),
                TimerKind::Timeout { .. } => self.window.clear_timeout_with_handle(timer.handle),
            }
            self.retired_timers.push(timer);
        }
    }

    fn set_control_value(&mut self, element_id: &str, value: f64) {
        match dom::element::<web::HtmlInputElement>(&self.document, element_id) {
            Ok(input) => input.set_value_as_number(value),
            Err(e) => log::warn!("[ui] {}", e),
        }
    }

    fn set_element_visible(&mut self, element_id: &str, visible: bool) {
        match dom::element::<web::HtmlElement>(&self.document, element_id) {
            Ok(el) => dom::set_shown(&el, visible),
            Err(e) => log::warn!("[ui] {}", e),
        }
    }

    fn is_checked(&self, element_id: &str) -> Result<bool> {
        dom::element::<web::HtmlInputElement>(&self.document, element_id).map(|i| i.checked())
    }

    fn selected_index(&self, element_id: &str) -> Result<usize> {
        dom::element::<web::HtmlSelectElement>(&self.document, element_id)
            .map(|s| s.selected_index().max(0) as usize)
    }

    fn prepend_group(&mut self, parent_id: &str, group_id: &str, title: &str) -> Result<()> {
        let parent = self.container(parent_id)?;
        let build = || -> anyhow::Result<web::Element> {
            let group: web::Element = dom::create(&self.document, "div")?;
            group.set_id(group_id);
            group.set_class_name("group");
            let heading: web::Element = dom::create(&self.document, "strong")?;
            heading.set_text_content(Some(title));
            group.append_child(&heading).map_err(js_error)?;
            Ok(group)
        };
        let group = build().map_err(|e| SceneError::Page(e.to_string()))?;
        parent
            .prepend_with_node_1(&group)
            .map_err(|e| SceneError::Page(format!("{e:?}")))
    }

    fn append_checkbox(
        &mut self,
        container_id: &str,
        name: &str,
        caption: &str,
        checked: bool,
    ) -> Result<String> {
        let container = self.container(container_id)?;
        let id = format!("{container_id}_{name}");
        dom::append_checkbox(&self.document, &container, &id, name, caption, checked)
            .map_err(|e| SceneError::Page(e.to_string()))?;
        Ok(id)
    }

    fn append_range(&mut self, container_id: &str, spec: &RangeSpec) -> Result<String> {
        let container = self.container(container_id)?;
        let id = format!("{container_id}_{}", spec.name);
        let build = || -> anyhow::Result<()> {
            let range: web::HtmlInputElement = dom::create(&self.document, "input")?;
            range.set_type("range");
            range.set_id(&id);
            range.set_name(&spec.name);
            range.set_min(&spec.min.to_string());
            range.set_max(&spec.max.to_string());
            range.set_step(&spec.step.to_string());
            range.set_value(&spec.value.to_string());
            container.append_child(&range).map_err(js_error)?;
            Ok(())
        };
        build().map_err(|e| SceneError::Page(e.to_string()))?;
        Ok(id)
    }

    fn viewport_aspect(&self) -> f64 {
        self.stage.aspect()
    }

    fn deliver_svg(&mut self, markup: &str, delivery: &Delivery) -> Result<()> {
        let deliver = || -> anyhow::Result<()> {
            match delivery {
                Delivery::NewTab => {
                    let tab = self
                        .window
                        .open_with_url_and_target("", "")
                        .map_err(js_error)?
                        .ok_or_else(|| anyhow::anyhow!("popup blocked"))?;
                    let body = tab
                        .document()
                        .and_then(|d| d.body())
                        .ok_or_else(|| anyhow::anyhow!("new tab has no body"))?;
                    body.set_inner_html(markup);
                }
                Delivery::Download { file_name } => {
                    let body = self
                        .document
                        .body()
                        .ok_or_else(|| anyhow::anyhow!("page has no body"))?;
                    let anchor: web::HtmlAnchorElement = dom::create(&self.document, "a")?;
                    let encoded = String::from(js_sys::encode_uri_component(markup));
                    anchor.set_href(&format!("data:text/plain;charset=utf-8,{encoded}"));
                    anchor.set_download(file_name);
                    dom::set_shown(&anchor, false);
                    body.append_child(&anchor).map_err(js_error)?;
                    anchor.click();
                    body.remove_child(&anchor).map_err(js_error)?;
                }
            }
            Ok(())
        };
        deliver().map_err(|e| SceneError::VectorRender(e.to_string()))
    }
}

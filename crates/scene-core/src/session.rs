//! The viewer session: one scene plus every controller acting on it, and the
//! wiring of those controllers to the page.
//!
//! Initialisation order: nodes are built first (filling the kind summary),
//! then cameras, display state and the explosion controller. Binding attaches
//! the page handlers afterwards, so handlers only ever see a complete session.

use crate::camera::CameraRig;
use crate::config::ViewerConfig;
use crate::constants::{ids, FOLD_SLIDER_STEP};
use crate::data::SceneData;
use crate::display::{set_transparency, Axis, DisplayState};
use crate::error::Result;
use crate::explode::{ExplosionController, TimerId, TimerKind, Timers};
use crate::fold;
use crate::host::{
    ControlState, EventHandler, EventKind, EventOutcome, Host, KeyPress, RangeSpec, Target,
    UiEvent,
};
use crate::initializer::init_node;
use crate::scene::{KindSet, ObjectKind, SceneGraph};
use crate::screenshot;
use crate::shortcut::{ShortcutOptions, ShortcutRegistry};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type Shared<T> = Rc<RefCell<T>>;

/// Combination toggling the settings panel.
pub const SETTINGS_SHORTCUT: &str = "Alt+Left";

#[derive(Debug)]
pub struct Session {
    pub config: ViewerConfig,
    pub scene: SceneGraph,
    pub cameras: CameraRig,
    pub display: DisplayState,
    pub explosion: ExplosionController,
    pub shortcuts: ShortcutRegistry,
}

impl Session {
    pub fn from_data(data: &SceneData) -> Self {
        let config = data.config.clone();
        let mut contains = KindSet::default();
        let nodes = data
            .nodes
            .iter()
            .map(|n| init_node(n, &mut contains, config.label_font_size))
            .collect();
        let mut scene = SceneGraph {
            nodes,
            contains,
            ..Default::default()
        };
        let mut cameras = CameraRig::from_specs(&data.cameras);
        let display = DisplayState::new(&scene, config.rotation_speed);
        let explosion = ExplosionController::new(config.exploding_speed);
        if scene.is_explodable() {
            explosion.apply(&mut scene);
        }
        if let Some(&first) = scene.foldable_indices().first() {
            cameras.look_at(scene.nodes[first].barycenter());
        }
        log::info!(
            "[init] {} nodes, {} cameras, explodable={}",
            scene.nodes.len(),
            cameras.len(),
            scene.is_explodable()
        );
        Self {
            config,
            scene,
            cameras,
            display,
            explosion,
            shortcuts: ShortcutRegistry::new(),
        }
    }

    pub fn element_id(&self, base: &str) -> String {
        self.config.element_id(base)
    }

    /// Per-frame update ahead of rendering.
    pub fn frame(&mut self) {
        self.display.step_rotation(&mut self.scene);
    }

    pub fn resize(&mut self, aspect: f64) {
        self.cameras.update_projection(aspect);
    }

    /// Fold node `index` to `value` and aim the active control at its
    /// barycenter. Returns the barycenter, or None for a node that cannot
    /// fold.
    pub fn fold(&mut self, index: usize, value: f64) -> Option<DVec3> {
        let center = fold::fold(self.scene.nodes.get_mut(index)?, value)?;
        self.cameras.look_at(center);
        Some(center)
    }

    /// Undo scene rotation and return every camera to its exported pose.
    pub fn reset(&mut self) {
        self.scene.rotation = DVec3::ZERO;
        self.cameras.reset();
        log::info!("[ui] scene reset");
    }
}

/// Explosion timers backed by the host. Fired timers route back into the
/// session, which holds only weak handles so the session can be dropped.
pub struct HostTimers<H: Host + 'static> {
    host: Weak<RefCell<H>>,
    session: Weak<RefCell<Session>>,
    explode_range: Rc<str>,
}

impl<H: Host + 'static> HostTimers<H> {
    pub fn new(session: &Shared<Session>, host: &Shared<H>, explode_range: Rc<str>) -> Self {
        Self {
            host: Rc::downgrade(host),
            session: Rc::downgrade(session),
            explode_range,
        }
    }
}

impl<H: Host + 'static> Clone for HostTimers<H> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            session: self.session.clone(),
            explode_range: self.explode_range.clone(),
        }
    }
}

impl<H: Host + 'static> Timers for HostTimers<H> {
    fn arm(&mut self, kind: TimerKind) -> TimerId {
        let timers = self.clone();
        let callback = Box::new(move |id: TimerId| on_explode_timer(&timers, id));
        match self.host.upgrade() {
            Some(host) => host.borrow_mut().start_timer(kind, callback),
            None => TimerId(0),
        }
    }

    fn disarm(&mut self, id: TimerId) {
        if let Some(host) = self.host.upgrade() {
            host.borrow_mut().cancel_timer(id);
        }
    }
}

fn on_explode_timer<H: Host + 'static>(timers: &HostTimers<H>, id: TimerId) {
    let Some(session) = timers.session.upgrade() else {
        return;
    };
    let factor = {
        let mut guard = session.borrow_mut();
        let Session {
            scene, explosion, ..
        } = &mut *guard;
        explosion.on_timer(id, scene, &mut timers.clone())
    };
    if let (Some(factor), Some(host)) = (factor, timers.host.upgrade()) {
        host.borrow_mut().set_control_value(&timers.explode_range, factor);
    }
}

fn control_handler(
    session: &Shared<Session>,
    mut apply: impl FnMut(&mut Session, ControlState) + 'static,
) -> EventHandler {
    let session = Rc::downgrade(session);
    Box::new(move |event: &UiEvent| {
        if let (UiEvent::Control(state), Some(session)) = (event, session.upgrade()) {
            apply(&mut *session.borrow_mut(), *state);
        }
        EventOutcome::Continue
    })
}

fn click_handler(mut apply: impl FnMut() + 'static) -> EventHandler {
    Box::new(move |event: &UiEvent| {
        if matches!(event, UiEvent::Click) {
            apply();
        }
        EventOutcome::Continue
    })
}

fn listen<H: Host>(
    host: &Shared<H>,
    element_id: &str,
    kind: EventKind,
    handler: EventHandler,
) -> Result<()> {
    host.borrow_mut()
        .listen(&Target::Element(element_id.to_string()), kind, handler)?;
    Ok(())
}

fn switch_camera(session: &mut Session, index: usize, aspect: f64) {
    if let Err(e) = session.cameras.switch(index, aspect) {
        log::warn!("[ui] {}", e);
    }
}

fn show_settings<H: Host>(session: &mut Session, host: &mut H, shown: bool) {
    host.set_element_visible(&session.element_id(ids::SETTINGS), shown);
    host.set_element_visible(&session.element_id(ids::SHOW_SETTINGS_BUTTON), !shown);
    host.set_element_visible(&session.element_id(ids::HIDE_SETTINGS_BUTTON), shown);
    session.display.settings_shown = shown;
}

/// Attach every page control to the session. Fails on the first missing
/// element.
pub fn bind<H: Host + 'static>(session: &Shared<Session>, host: &Shared<H>) -> Result<()> {
    let id = |base: &str| session.borrow().element_id(base);

    let camera_type = id(ids::CAMERA_TYPE);
    let aspect_host = Rc::downgrade(host);
    listen(
        host,
        &camera_type,
        EventKind::Change,
        control_handler(session, move |s, state| {
            if let Some(host) = aspect_host.upgrade() {
                let aspect = host.borrow().viewport_aspect();
                switch_camera(s, state.selected_index.unwrap_or(0), aspect);
            }
        }),
    )?;
    // a pre-selected option takes effect without waiting for a change
    let (selected, aspect) = {
        let h = host.borrow();
        (h.selected_index(&camera_type)?, h.viewport_aspect())
    };
    switch_camera(&mut session.borrow_mut(), selected, aspect);

    listen(
        host,
        &id(ids::TRANSPARENCY_RANGE),
        EventKind::Input,
        control_handler(session, |s, state| set_transparency(&mut s.scene, state.value)),
    )?;

    for (base, axis) in [
        (ids::ROTATION_X, Axis::X),
        (ids::ROTATION_Y, Axis::Y),
        (ids::ROTATION_Z, Axis::Z),
    ] {
        listen(
            host,
            &id(base),
            EventKind::Change,
            control_handler(session, move |s, state| {
                s.display.set_rotation(axis, state.checked)
            }),
        )?;
    }

    listen(
        host,
        &id(ids::ROTATION_SPEED_RANGE),
        EventKind::Input,
        control_handler(session, |s, state| s.display.set_rotation_speed(state.value)),
    )?;

    let weak = Rc::downgrade(session);
    listen(
        host,
        &id(ids::RESET_BUTTON),
        EventKind::Click,
        click_handler(move || {
            if let Some(s) = weak.upgrade() {
                s.borrow_mut().reset();
            }
        }),
    )?;

    bind_screenshot(session, host)?;
    bind_settings(session, host)?;
    bind_fold(session, host)?;
    bind_explosion(session, host)?;
    bind_kind_checkboxes(session, host)?;
    bind_object_checkboxes(session, host)?;
    Ok(())
}

fn bind_screenshot<H: Host + 'static>(session: &Shared<Session>, host: &Shared<H>) -> Result<()> {
    let (button, tab) = {
        let s = session.borrow();
        (
            s.element_id(ids::TAKE_SCREENSHOT),
            s.element_id(ids::SCREENSHOT_IN_TAB),
        )
    };
    let weak_session = Rc::downgrade(session);
    let weak_host = Rc::downgrade(host);
    listen(
        host,
        &button,
        EventKind::Click,
        click_handler(move || {
            let (Some(session), Some(host)) = (weak_session.upgrade(), weak_host.upgrade()) else {
                return;
            };
            let mut guard = session.borrow_mut();
            let Session {
                scene,
                display,
                cameras,
                config,
                ..
            } = &mut *guard;
            let result = screenshot::take_screenshot(
                &mut *host.borrow_mut(),
                scene,
                display,
                cameras.active(),
                &tab,
                &config.screenshot_file_name,
            );
            if let Err(e) = result {
                log::error!("[svg] screenshot failed: {}", e);
            }
        }),
    )
}

fn bind_settings<H: Host + 'static>(session: &Shared<Session>, host: &Shared<H>) -> Result<()> {
    let (show_button, hide_button) = {
        let s = session.borrow();
        (
            s.element_id(ids::SHOW_SETTINGS_BUTTON),
            s.element_id(ids::HIDE_SETTINGS_BUTTON),
        )
    };
    for (button, shown) in [(show_button, true), (hide_button, false)] {
        let weak_session = Rc::downgrade(session);
        let weak_host = Rc::downgrade(host);
        listen(
            host,
            &button,
            EventKind::Click,
            click_handler(move || {
                if let (Some(s), Some(h)) = (weak_session.upgrade(), weak_host.upgrade()) {
                    show_settings(&mut *s.borrow_mut(), &mut *h.borrow_mut(), shown);
                }
            }),
        )?;
    }

    let weak_session = Rc::downgrade(session);
    let weak_host = Rc::downgrade(host);
    let toggle = move |_: &KeyPress| {
        if let (Some(s), Some(h)) = (weak_session.upgrade(), weak_host.upgrade()) {
            let mut session = s.borrow_mut();
            let shown = !session.display.settings_shown;
            show_settings(&mut *session, &mut *h.borrow_mut(), shown);
        }
    };
    let mut shortcuts = std::mem::take(&mut session.borrow_mut().shortcuts);
    let added = shortcuts.add(
        &mut *host.borrow_mut(),
        SETTINGS_SHORTCUT,
        toggle,
        ShortcutOptions::default(),
    );
    session.borrow_mut().shortcuts = shortcuts;
    added
}

fn bind_fold<H: Host + 'static>(session: &Shared<Session>, host: &Shared<H>) -> Result<()> {
    let (foldables, settings, group) = {
        let s = session.borrow();
        (
            s.scene.foldable_indices(),
            s.element_id(ids::SETTINGS),
            s.element_id(ids::FOLD_GROUP),
        )
    };
    if foldables.is_empty() {
        return Ok(());
    }
    host.borrow_mut().prepend_group(&settings, &group, "Fold")?;
    for (slot, node) in foldables.into_iter().enumerate() {
        let spec = RangeSpec {
            name: slot.to_string(),
            min: 0.0,
            max: 1.0,
            step: FOLD_SLIDER_STEP,
            value: 0.0,
        };
        let range = host.borrow_mut().append_range(&group, &spec)?;
        listen(
            host,
            &range,
            EventKind::Input,
            control_handler(session, move |s, state| {
                s.fold(node, state.value);
            }),
        )?;
    }
    Ok(())
}

fn bind_explosion<H: Host + 'static>(session: &Shared<Session>, host: &Shared<H>) -> Result<()> {
    let (explodable, range, checkbox, speed) = {
        let s = session.borrow();
        (
            s.scene.is_explodable(),
            s.element_id(ids::EXPLODE_RANGE),
            s.element_id(ids::EXPLODE_CHECKBOX),
            s.element_id(ids::EXPLODING_SPEED_RANGE),
        )
    };
    if !explodable {
        return Ok(());
    }
    listen(
        host,
        &range,
        EventKind::Input,
        control_handler(session, |s, state| {
            let Session {
                scene, explosion, ..
            } = s;
            explosion.set_factor(scene, state.value);
        }),
    )?;

    let timers = HostTimers::new(session, host, Rc::from(range.as_str()));
    listen(
        host,
        &checkbox,
        EventKind::Change,
        control_handler(session, move |s, state| {
            s.explosion.set_automatic(state.checked, &mut timers.clone());
        }),
    )?;

    listen(
        host,
        &speed,
        EventKind::Input,
        control_handler(session, |s, state| s.explosion.set_speed(state.value)),
    )?;
    Ok(())
}

fn bind_kind_checkboxes<H: Host + 'static>(
    session: &Shared<Session>,
    host: &Shared<H>,
) -> Result<()> {
    let (list, contains) = {
        let s = session.borrow();
        (s.element_id(ids::SHOWN_OBJECT_TYPES), s.scene.contains)
    };
    for kind in ObjectKind::sorted_by_key() {
        if !contains.contains(kind) {
            continue;
        }
        let checkbox = host
            .borrow_mut()
            .append_checkbox(&list, kind.key(), kind.label(), true)?;
        listen(
            host,
            &checkbox,
            EventKind::Change,
            control_handler(session, move |s, state| {
                let Session { scene, display, .. } = s;
                display.set_kind_visible(scene, kind, state.checked);
            }),
        )?;
    }
    Ok(())
}

fn bind_object_checkboxes<H: Host + 'static>(
    session: &Shared<Session>,
    host: &Shared<H>,
) -> Result<()> {
    let (list, names) = {
        let s = session.borrow();
        let names: Vec<String> = s.scene.nodes.iter().map(|n| n.name.clone()).collect();
        (s.element_id(ids::SHOWN_OBJECTS), names)
    };
    for (index, name) in names.iter().enumerate() {
        let checkbox = host
            .borrow_mut()
            .append_checkbox(&list, &index.to_string(), name, true)?;
        listen(
            host,
            &checkbox,
            EventKind::Change,
            control_handler(session, move |s, state| {
                let Session { scene, display, .. } = s;
                display.set_object_visible(scene, index, state.checked);
            }),
        )?;
    }
    Ok(())
}

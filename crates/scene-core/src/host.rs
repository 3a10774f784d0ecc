//! Capabilities the page environment provides to the controllers.
//!
//! The web front-end implements [`Host`] over the DOM; tests implement it
//! with recorded handlers and hand-fired timers.

use crate::camera::Camera;
use crate::error::Result;
use crate::explode::{TimerId, TimerKind};
use crate::scene::SceneGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    Change,
    Click,
    #[default]
    KeyDown,
    KeyUp,
    KeyPress,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::KeyPress => "keypress",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Target {
    #[default]
    Document,
    Element(String),
}

/// Snapshot of a key event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// Legacy `keyCode` of the key.
    pub code: u32,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// The event originated in an `<input>` or `<textarea>`.
    pub in_text_input: bool,
}

/// State of the form control that fired an event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlState {
    pub value: f64,
    pub checked: bool,
    pub selected_index: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UiEvent {
    Control(ControlState),
    Click,
    Key(KeyPress),
}

/// What the host should do with the event after the handler ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EventOutcome {
    #[default]
    Continue,
    /// Prevent the default action and stop propagation.
    Consume,
}

pub type EventHandler = Box<dyn FnMut(&UiEvent) -> EventOutcome>;
pub type TimerCallback = Box<dyn FnMut(TimerId)>;

/// Slider appended to the settings panel.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    NewTab,
    Download { file_name: String },
}

/// Renders the scene as seen by `camera` into SVG markup.
pub trait VectorRenderer {
    fn render_svg(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<String>;
}

pub trait Host: VectorRenderer {
    /// Attach `handler` to `kind` events of `target`. A missing element is a
    /// configuration error.
    fn listen(&mut self, target: &Target, kind: EventKind, handler: EventHandler)
        -> Result<ListenerId>;
    /// Detach a listener. Unknown ids are ignored.
    fn unlisten(&mut self, id: ListenerId);

    fn start_timer(&mut self, kind: TimerKind, callback: TimerCallback) -> TimerId;
    fn cancel_timer(&mut self, id: TimerId);

    fn set_control_value(&mut self, element_id: &str, value: f64);
    fn set_element_visible(&mut self, element_id: &str, visible: bool);
    /// Read a checkbox without an event (e.g. the screenshot target toggle).
    fn is_checked(&self, element_id: &str) -> Result<bool>;
    /// Index of the option a select currently shows.
    fn selected_index(&self, element_id: &str) -> Result<usize>;

    /// Insert a titled group as the first child of `parent_id`.
    fn prepend_group(&mut self, parent_id: &str, group_id: &str, title: &str) -> Result<()>;
    /// Append a checked-state checkbox plus caption; returns the new element id.
    fn append_checkbox(
        &mut self,
        container_id: &str,
        name: &str,
        caption: &str,
        checked: bool,
    ) -> Result<String>;
    /// Append a slider; returns the new element id.
    fn append_range(&mut self, container_id: &str, spec: &RangeSpec) -> Result<String>;

    /// Width over height of the drawing area.
    fn viewport_aspect(&self) -> f64;

    fn deliver_svg(&mut self, markup: &str, delivery: &Delivery) -> Result<()>;
}

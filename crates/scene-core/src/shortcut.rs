//! Keyboard shortcuts.
//!
//! Combinations are written like `"Ctrl+Shift+S"`, compared case-insensitively
//! and matched against the legacy key code of the event. The modifier state
//! must match exactly: `Ctrl+S` does not fire while Shift is also held.

use crate::error::Result;
use crate::host::{
    EventHandler, EventKind, EventOutcome, Host, KeyPress, ListenerId, Target, UiEvent,
};
use fnv::FnvHashMap;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn of(press: &KeyPress) -> Self {
        Self {
            ctrl: press.ctrl,
            shift: press.shift,
            alt: press.alt,
            meta: press.meta,
        }
    }
}

/// Key code of a named special key.
pub fn special_key_code(name: &str) -> Option<u32> {
    let code = match name {
        "esc" | "escape" => 27,
        "tab" => 9,
        "space" => 32,
        "return" | "enter" => 13,
        "backspace" => 8,
        "scrolllock" | "scroll_lock" | "scroll" => 145,
        "capslock" | "caps_lock" | "caps" => 20,
        "numlock" | "num_lock" | "num" => 144,
        "pause" | "break" => 19,
        "insert" => 45,
        "home" => 36,
        "delete" => 46,
        "end" => 35,
        "pageup" | "page_up" | "pu" => 33,
        "pagedown" | "page_down" | "pd" => 34,
        "left" => 37,
        "up" => 38,
        "right" => 39,
        "down" => 40,
        "f1" => 112,
        "f2" => 113,
        "f3" => 114,
        "f4" => 115,
        "f5" => 116,
        "f6" => 117,
        "f7" => 118,
        "f8" => 119,
        "f9" => 120,
        "f10" => 121,
        "f11" => 122,
        "f12" => 123,
        _ => return None,
    };
    Some(code)
}

/// Character produced by `c` with Shift held on a US layout.
pub fn shifted(c: char) -> Option<char> {
    let s = match c {
        '`' => '~',
        '1' => '!',
        '2' => '@',
        '3' => '#',
        '4' => '$',
        '5' => '%',
        '6' => '^',
        '7' => '&',
        '8' => '*',
        '9' => '(',
        '0' => ')',
        '-' => '_',
        '=' => '+',
        ';' => ':',
        '\'' => '"',
        ',' => '<',
        '.' => '>',
        '/' => '?',
        '\\' => '|',
        _ => return None,
    };
    Some(s)
}

/// Lower-cased character a key code stands for on keydown.
fn code_char(code: u32) -> Option<char> {
    match code {
        188 => Some(','),
        190 => Some('.'),
        _ => char::from_u32(code).and_then(|c| c.to_lowercase().next()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum KeyPart {
    Special(Option<u32>),
    Char(char),
    /// Empty or multi-character text that names no key.
    Never,
}

/// A parsed, normalized key combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    normalized: String,
    modifiers: Modifiers,
    keys: SmallVec<[KeyPart; 2]>,
}

impl Combination {
    pub fn parse(text: &str) -> Self {
        let normalized = text.to_lowercase();
        let mut modifiers = Modifiers::default();
        let mut keys = SmallVec::new();
        for part in normalized.split('+') {
            match part {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" => modifiers.alt = true,
                "meta" => modifiers.meta = true,
                p if p.chars().count() > 1 => keys.push(KeyPart::Special(special_key_code(p))),
                p => keys.push(p.chars().next().map_or(KeyPart::Never, KeyPart::Char)),
            }
        }
        Self {
            normalized,
            modifiers,
            keys,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether `press` triggers this combination. With `keycode` set,
    /// single-character parts compare against that code instead.
    pub fn matches(&self, press: &KeyPress, keycode: Option<u32>) -> bool {
        if Modifiers::of(press) != self.modifiers {
            return false;
        }
        let character = code_char(press.code);
        self.keys.iter().all(|part| match part {
            KeyPart::Special(code) => *code == Some(press.code),
            KeyPart::Char(_) if keycode.is_some() => keycode == Some(press.code),
            KeyPart::Char(k) => match character {
                Some(c) if c == *k => true,
                Some(c) if press.shift => shifted(c) == Some(*k),
                _ => false,
            },
            KeyPart::Never => false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutOptions {
    pub event: EventKind,
    /// Let the event continue to the page after the callback ran.
    pub propagate: bool,
    /// Ignore keys typed into text fields.
    pub disable_in_input: bool,
    pub target: Target,
    /// Match this key code instead of the combination's character.
    pub keycode: Option<u32>,
}

impl Default for ShortcutOptions {
    fn default() -> Self {
        Self {
            event: EventKind::KeyDown,
            propagate: false,
            disable_in_input: false,
            target: Target::Document,
            keycode: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub listener: ListenerId,
    pub target: Target,
    pub event: EventKind,
}

/// Registered shortcuts, at most one binding per normalized combination.
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    bindings: FnvHashMap<String, Binding>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `callback` to `combination`, replacing any previous binding of
    /// the same combination. A failed bind leaves the previous one in place.
    pub fn add(
        &mut self,
        host: &mut impl Host,
        combination: &str,
        callback: impl FnMut(&KeyPress) + 'static,
        options: ShortcutOptions,
    ) -> Result<()> {
        let combo = Combination::parse(combination);
        let handler = key_handler(combo.clone(), callback, &options);
        let listener = host.listen(&options.target, options.event, handler)?;
        log::info!("[keys] bound {}", combo.as_str());
        let replaced = self.bindings.insert(
            combo.normalized,
            Binding {
                listener,
                target: options.target,
                event: options.event,
            },
        );
        if let Some(old) = replaced {
            host.unlisten(old.listener);
        }
        Ok(())
    }

    /// Unbind `combination`; nothing happens when it is not bound.
    pub fn remove(&mut self, host: &mut impl Host, combination: &str) {
        if let Some(binding) = self.bindings.remove(&combination.to_lowercase()) {
            host.unlisten(binding.listener);
        }
    }

    pub fn get(&self, combination: &str) -> Option<&Binding> {
        self.bindings.get(&combination.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn key_handler(
    combo: Combination,
    mut callback: impl FnMut(&KeyPress) + 'static,
    options: &ShortcutOptions,
) -> EventHandler {
    let keycode = options.keycode;
    let propagate = options.propagate;
    let disable_in_input = options.disable_in_input;
    Box::new(move |event: &UiEvent| {
        let UiEvent::Key(press) = event else {
            return EventOutcome::Continue;
        };
        if disable_in_input && press.in_text_input {
            return EventOutcome::Continue;
        }
        if !combo.matches(press, keycode) {
            return EventOutcome::Continue;
        }
        callback(press);
        if propagate {
            EventOutcome::Continue
        } else {
            EventOutcome::Consume
        }
    })
}

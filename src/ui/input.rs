/// Keyboard state tracker and control-frame assembly.
///
/// Tracks which keys are currently held down so the two logical axes
/// read like a joystick: held arrows/WASD deflect an axis, release (or
/// silence) recenters it. Keypad commands are edge-triggered.
///
/// Terminals that report key-release events get exact holds; elsewhere
/// a key counts as held until it stops repeating for HOLD_TIMEOUT.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, poll};

use crate::domain::controls::{AxisPos, Command, ControlFrame};
use crate::ui::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key
/// released. Covers terminals that never report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Game key tables ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_TRIGGER: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('*')];
const KEYS_SUICIDE: &[KeyCode] = &[KeyCode::Char('0')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for the Ctrl+C check.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);

                    match key.kind {
                        KeyEventKind::Release => {
                            // Only terminals with release reporting send
                            // these; the timeout covers the rest.
                            self.last_active.remove(&key.code);
                        }
                        _ => {
                            // Press or Repeat: the key is active
                            let was_held = self.is_held(key.code);
                            self.last_active.insert(key.code, Instant::now());
                            if !was_held {
                                self.fresh_presses.push(key.code);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // Expire keys that stopped repeating
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Assemble the control frame for one simulation tick, merging the
    /// keyboard with the gamepad. Keyboard axes win when deflected;
    /// opposing keys held together cancel to center.
    pub fn control_frame(&self, gp: &GamepadState) -> ControlFrame {
        let mut horizontal = axis_of(self.any_held(KEYS_LEFT), self.any_held(KEYS_RIGHT));
        let mut vertical = axis_of(self.any_held(KEYS_UP), self.any_held(KEYS_DOWN));
        if horizontal == AxisPos::Center {
            horizontal = gp.horizontal();
        }
        if vertical == AxisPos::Center {
            vertical = gp.vertical();
        }

        let trigger = self.any_held(KEYS_TRIGGER) || gp.trigger_held();

        let command = if self.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            Command::Quit
        } else if self.any_pressed(KEYS_SUICIDE) {
            Command::Suicide
        } else if self.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
            Command::Pause
        } else {
            Command::None
        };

        ControlFrame {
            horizontal,
            vertical,
            trigger,
            command,
        }
    }

    /// Fresh trigger press this frame, keyboard or pad. The menus want
    /// the edge, not the level, so a button still held from the last
    /// screen cannot re-fire.
    pub fn fire_pressed(&self, gp: &GamepadState) -> bool {
        self.any_pressed(KEYS_TRIGGER) || gp.trigger_pressed()
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

fn axis_of(negative: bool, positive: bool) -> AxisPos {
    match (negative, positive) {
        (true, false) => AxisPos::Negative,
        (false, true) => AxisPos::Positive,
        _ => AxisPos::Center,
    }
}

/// Keyboard input tracker.
///
/// Hops are edge-triggered: one hop per physical key press, no matter how
/// long the key is held or how fast the terminal auto-repeats. Terminals that
/// report Release events (keyboard enhancement) release keys explicitly;
/// elsewhere a key counts as released after `HOLD_TIMEOUT` without a
/// Press/Repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::MoveDir;
use crate::sim::game::InputEvent;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self
                    .last_active
                    .get(&key.code)
                    .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Fresh presses of this frame as game input, in press order.
    pub fn game_inputs(&self) -> Vec<InputEvent> {
        let mut out: Vec<InputEvent> = self.fresh_presses.iter().filter_map(|&c| map_key(c)).collect();
        if self.ctrl_c_pressed() {
            out.push(InputEvent::Quit);
        }
        out
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Keyboard layout: arrows/WASD hop, Enter/Space confirm, P/F1 pause,
/// Esc/Q quit.
pub fn map_key(code: KeyCode) -> Option<InputEvent> {
    let input = match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => InputEvent::Move(MoveDir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => InputEvent::Move(MoveDir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => InputEvent::Move(MoveDir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => InputEvent::Move(MoveDir::Right),
        KeyCode::Enter | KeyCode::Char(' ') => InputEvent::Confirm,
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::F(1) => InputEvent::Pause,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => InputEvent::Quit,
        _ => return None,
    };
    Some(input)
}

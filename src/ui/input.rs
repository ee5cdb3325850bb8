/// Input state tracker.
///
/// Tracks which keys are currently held down so movement continues
/// while an arrow key stays pressed, and meta actions (save, load,
/// restart) fire once per press.
///
/// Uses crossterm's keyboard enhancement for Release events when
/// available, with timeout-based release detection as a fallback for
/// terminals that never report releases.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, poll};

/// After this long without a Press/Repeat event the key counts as released.
/// Only relevant when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of the last Press/Repeat event per key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from up to down during the most recent
    /// drain_events() call (edge-triggered actions).
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during the drain, for modifier checks.
    pub raw_events: Vec<KeyEvent>,

    /// Honor Release events. Only set when keyboard enhancement is
    /// confirmed working.
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

    /// Drain all pending terminal events and update key states.
    /// Call once per tick, before the simulation turn.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);

                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {
                        // No enhancement: rely on timeout expiry instead.
                    }
                    _ => {
                        let was_held = self.is_held_inner(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Is this key currently held down? (continuous movement)
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this tick? (one-shot actions)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

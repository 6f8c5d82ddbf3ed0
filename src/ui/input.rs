/// Input state tracker.
///
/// Tracks which keys are currently held down, and the press/release
/// edges observed each frame. Held keys drive continuous movement;
/// release edges matter here too, because the actor's idle facing is
/// the last direction key released.
///
/// Uses crossterm's keyboard enhancement for Release events when
/// available. Falls back to timeout-based release detection on
/// terminals that don't report them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind};

/// After this duration without a Press/Repeat event, consider the key
/// released. Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went "not held" -> "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Keys that went "held" -> "not held", whether by an explicit
    /// Release event or by timeout expiry.
    fresh_releases: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            fresh_releases: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.fresh_releases.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);

                    match key.kind {
                        KeyEventKind::Release if self.honor_release => {
                            if self.last_active.remove(&key.code).is_some() {
                                self.fresh_releases.push(key.code);
                            }
                        }
                        KeyEventKind::Release => {
                            // Ignore when enhancement isn't confirmed;
                            // timeout expiry handles it below.
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
                _ => {}
            }
        }

        // Expire keys that timed out (terminals without Release events).
        let now = Instant::now();
        let expired: Vec<KeyCode> = self
            .last_active
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(code, _)| *code)
            .collect();
        for code in expired {
            self.last_active.remove(&code);
            self.fresh_releases.push(code);
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code)
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Was this key released this frame? (edge trigger)
    pub fn was_released(&self, code: KeyCode) -> bool {
        self.fresh_releases.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Convenience: was any of these keys released?
    pub fn any_released(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_released(*c))
    }

    /// Check if any raw event this frame has Ctrl+C.
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

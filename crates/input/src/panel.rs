//! Keyboard panel standing in for the reader antenna and the station button.
//!
//! Terminals do not report key releases everywhere, so a button tap counts as
//! held for a short timeout, like the release timeout of the old input handler.

use std::cell::RefCell;
use std::io::{self, IsTerminal};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use log::{info, warn};

use crate::map::{map_key_event, PanelKey};
use crate::types::{Button, Identifier, PresenceSample, PresenceSensor};

/// Tags selectable with keys `1`..`3`. The last one is a 7-byte identifier.
pub const PRESET_TAGS: [&[u8]; 3] = [
    &[0x04, 0xA2, 0x1B, 0x3C],
    &[0xDE, 0xAD, 0xBE, 0xEF],
    &[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66],
];

pub const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u64 = 150;

/// In flaky mode every Nth read misses the tag.
pub const FLAKY_DROP_EVERY: u32 = 3;

#[derive(Debug, Clone)]
pub struct PanelState {
    on_antenna: Option<Identifier>,
    flaky: bool,
    reads: u32,
    last_button_press: Option<Instant>,
    release_timeout: Duration,
    quit: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            on_antenna: None,
            flaky: false,
            reads: 0,
            last_button_press: None,
            release_timeout: Duration::from_millis(DEFAULT_KEY_RELEASE_TIMEOUT_MS),
            quit: false,
        }
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, key: PanelKey, now: Instant) {
        match key {
            PanelKey::ToggleTag(index) => {
                let Some(identifier) = PRESET_TAGS.get(index).and_then(|b| Identifier::new(b))
                else {
                    return;
                };
                if self.on_antenna == Some(identifier) {
                    info!("[panel] tag {} removed", identifier);
                    self.on_antenna = None;
                } else {
                    info!("[panel] tag {} placed on the reader", identifier);
                    self.on_antenna = Some(identifier);
                }
            }
            PanelKey::ClearReader => {
                if self.on_antenna.take().is_some() {
                    info!("[panel] reader cleared");
                }
            }
            PanelKey::ToggleFlaky => {
                self.flaky = !self.flaky;
                info!("[panel] flaky reads {}", if self.flaky { "on" } else { "off" });
            }
            PanelKey::Button => self.last_button_press = Some(now),
            PanelKey::Quit => self.quit = true,
        }
    }

    pub fn on_antenna(&self) -> Option<Identifier> {
        self.on_antenna
    }

    pub fn is_flaky(&self) -> bool {
        self.flaky
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// One reader poll.
    pub fn sample(&mut self) -> PresenceSample {
        let Some(identifier) = self.on_antenna else {
            return PresenceSample::absent();
        };
        self.reads = self.reads.wrapping_add(1);
        if self.flaky && self.reads % FLAKY_DROP_EVERY == 0 {
            return PresenceSample::absent();
        }
        PresenceSample::present(identifier)
    }

    pub fn button_level(&self, now: Instant) -> bool {
        match self.last_button_press {
            Some(at) => now.saturating_duration_since(at) < self.release_timeout,
            None => false,
        }
    }
}

/// Drain pending terminal events, waiting at most `timeout` for the first one.
fn pump_events(state: &RefCell<PanelState>, timeout: Duration) -> io::Result<()> {
    let mut wait = timeout;
    while event::poll(wait)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                if let Some(action) = map_key_event(key) {
                    state.borrow_mut().apply(action, Instant::now());
                }
            }
        }
        wait = Duration::ZERO;
    }
    Ok(())
}

/// Owns raw mode and hands out the simulated sensor and button.
pub struct KeyboardPanel {
    state: Rc<RefCell<PanelState>>,
    raw: bool,
}

impl KeyboardPanel {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(PanelState::new())),
            raw: false,
        }
    }

    pub fn enter(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    pub fn exit(&mut self) -> io::Result<()> {
        if self.raw {
            terminal::disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    pub fn pump(&self, timeout: Duration) -> io::Result<()> {
        pump_events(&self.state, timeout)
    }

    pub fn quit_requested(&self) -> bool {
        self.state.borrow().quit_requested()
    }

    pub fn sensor(&self) -> KeyboardSensor {
        KeyboardSensor {
            state: Rc::clone(&self.state),
        }
    }

    pub fn button(&self) -> KeyboardButton {
        KeyboardButton {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for KeyboardPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KeyboardPanel {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

/// Reader whose antenna is the keyboard. Polling also pumps key events.
pub struct KeyboardSensor {
    state: Rc<RefCell<PanelState>>,
}

impl PresenceSensor for KeyboardSensor {
    fn probe(&mut self) -> bool {
        io::stdin().is_terminal()
    }

    fn poll(&mut self, timeout_ms: u64) -> PresenceSample {
        if let Err(e) = pump_events(&self.state, Duration::from_millis(timeout_ms)) {
            warn!("[panel] terminal read failed: {}", e);
        }
        self.state.borrow_mut().sample()
    }
}

pub struct KeyboardButton {
    state: Rc<RefCell<PanelState>>,
}

impl Button for KeyboardButton {
    fn is_pressed(&mut self) -> bool {
        self.state.borrow().button_level(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_tag_places_and_removes() {
        let mut state = PanelState::new();
        let now = Instant::now();
        assert_eq!(state.sample(), PresenceSample::absent());

        state.apply(PanelKey::ToggleTag(2), now);
        let sample = state.sample();
        assert!(sample.present);
        assert_eq!(sample.length(), 7);

        state.apply(PanelKey::ToggleTag(2), now);
        assert_eq!(state.on_antenna(), None);
    }

    #[test]
    fn test_unknown_preset_is_ignored() {
        let mut state = PanelState::new();
        state.apply(PanelKey::ToggleTag(8), Instant::now());
        assert_eq!(state.on_antenna(), None);
    }

    #[test]
    fn test_flaky_mode_drops_reads() {
        let mut state = PanelState::new();
        let now = Instant::now();
        state.apply(PanelKey::ToggleTag(0), now);
        state.apply(PanelKey::ToggleFlaky, now);
        let present = (0..9).filter(|_| state.sample().present).count();
        assert_eq!(present, 6);
    }

    #[test]
    fn test_button_release_timeout() {
        let mut state = PanelState::new();
        let now = Instant::now();
        assert!(!state.button_level(now));
        state.apply(PanelKey::Button, now);
        assert!(state.button_level(now + Duration::from_millis(100)));
        assert!(!state.button_level(now + Duration::from_millis(150)));
    }

    #[test]
    fn test_quit() {
        let mut state = PanelState::new();
        state.apply(PanelKey::Quit, Instant::now());
        assert!(state.quit_requested());
    }
}

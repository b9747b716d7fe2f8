//! Presence debouncer - turns polled reader samples into edge events
//!
//! The reader is polled once per cycle and reports "target present" with a raw
//! identifier. Reads jitter: a tag sitting on the antenna can drop out for a poll
//! or two, and a tag passing quickly can show up for a single poll. The debouncer
//! only accepts a new presence state once the raw state has held, uninterrupted,
//! for the debounce interval.
//!
//! - Any raw change (including a flicker back to the previous value) restarts the
//!   interval.
//! - Committing to "present" emits [`PresenceEvent::Entered`] unless the identifier
//!   equals the one already held.
//! - Committing to "absent" forgets the held identifier and emits
//!   [`PresenceEvent::Exited`], so the same tag fires again when re-presented.

use crate::types::{Identifier, PresenceEvent, PresenceSample, DEBOUNCE_MS};

/// Debouncer bookkeeping for one physical reader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DebounceState {
    /// Last committed (debounced) presence
    pub stable_present: bool,
    /// Presence reported by the most recent sample
    pub raw_present: bool,
    /// When `raw_present` last changed
    pub last_change_ms: u64,
    /// Identifier committed with the current presence episode
    pub last_stable_identifier: Option<Identifier>,
}

/// Edge detector over raw presence samples
#[derive(Debug, Clone)]
pub struct PresenceDebouncer {
    interval_ms: u64,
    state: DebounceState,
}

impl Default for PresenceDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceDebouncer {
    /// Debouncer with the nominal 250 ms interval
    pub fn new() -> Self {
        Self::with_interval(DEBOUNCE_MS)
    }

    pub fn with_interval(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            state: DebounceState::default(),
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// Debounced presence
    pub fn is_present(&self) -> bool {
        self.state.stable_present
    }

    pub fn held_identifier(&self) -> Option<&Identifier> {
        self.state.last_stable_identifier.as_ref()
    }

    /// Forget all history (reader re-initialised)
    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }

    /// Feed one sample taken at `now_ms`.
    ///
    /// Returns at most one event per call.
    pub fn observe(&mut self, sample: &PresenceSample, now_ms: u64) -> Option<PresenceEvent> {
        if sample.present != self.state.raw_present {
            self.state.raw_present = sample.present;
            self.state.last_change_ms = now_ms;
        }

        let held_ms = now_ms.saturating_sub(self.state.last_change_ms);
        if held_ms < self.interval_ms || self.state.raw_present == self.state.stable_present {
            return None;
        }

        self.state.stable_present = self.state.raw_present;

        if self.state.stable_present {
            if self.state.last_stable_identifier == Some(sample.identifier) {
                return None;
            }
            self.state.last_stable_identifier = Some(sample.identifier);
            Some(PresenceEvent::Entered(sample.identifier))
        } else {
            self.state.last_stable_identifier = None;
            Some(PresenceEvent::Exited)
        }
    }
}

//! Collaborator interfaces.
//!
//! The session core never touches hardware or sockets directly. Each collaborator is
//! a small trait so the same core runs against the real radio stack, the host
//! network, or scripted test doubles.

use crate::{PresenceSample, WifiCredentials};

/// Presence-detecting reader (e.g. a PN532 polled for ISO14443A targets).
pub trait PresenceSensor {
    /// Check that the reader answers at all. Called once at boot.
    fn probe(&mut self) -> bool;

    /// Poll for a target, waiting at most `timeout_ms`.
    fn poll(&mut self, timeout_ms: u64) -> PresenceSample;
}

/// Momentary push button. Debouncing is the implementor's job.
pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

/// WiFi association.
pub trait Link {
    fn is_associated(&self) -> bool;

    /// One association attempt, bounded by `timeout_ms`.
    fn associate(&mut self, credentials: &WifiCredentials, timeout_ms: u64) -> bool;
}

/// Line-oriented stream to the server.
pub trait Transport {
    /// One connection attempt, bounded by `timeout_ms`.
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u64) -> bool;

    fn is_open(&self) -> bool;

    /// Write `line` followed by `\n`.
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;

    /// Complete lines received so far, without their terminators. Never waits for
    /// more data.
    fn read_available_lines(&mut self) -> Vec<String>;

    fn close(&mut self);
}

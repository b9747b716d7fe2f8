//! Device error taxonomy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// WiFi is down. Retried every cycle, never fatal.
    #[error("WiFi link is not associated")]
    LinkUnavailable,
    /// No TCP session. Retried every cycle; outbound lines are dropped meanwhile.
    #[error("server session is closed")]
    SessionClosed,
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// Reader missing at boot. The device halts.
    #[error("presence reader not detected")]
    SensorUnavailable,
    #[error("configuration error: {0}")]
    Config(String),
}

impl DeviceError {
    /// Errors that stop the device instead of being retried next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::SensorUnavailable | DeviceError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_boot_errors_are_fatal() {
        assert!(DeviceError::SensorUnavailable.is_fatal());
        assert!(DeviceError::Config("bad role".into()).is_fatal());
        assert!(!DeviceError::LinkUnavailable.is_fatal());
        assert!(!DeviceError::SessionClosed.is_fatal());
        assert!(!DeviceError::MalformedCommand("PING".into()).is_fatal());
    }
}

//! Protocol dispatcher - routes inbound verbs and turns device events into lines
//!
//! The dispatcher owns the pending `READUID` request. It never writes to the
//! network itself: every handler returns the lines to send and the session hands
//! them to the supervisor.

use arrayvec::ArrayVec;
use log::{debug, info, warn};

use crate::core::{LifecycleEvent, TagLifecycle};
use crate::error::DeviceError;
use crate::protocol::{
    format_ack, format_lifecycle_event, format_pong, format_scan, format_status, format_uid,
    parse_command, InboundCommand, REPLY_NACK,
};
use crate::types::{Capabilities, DeviceRole, PresenceEvent};

/// Replies to one inbound line (PONG plus an optional status line)
pub type Replies = ArrayVec<String, 2>;

/// Outstanding "report the next identifier" request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReadRequest {
    pub request_id: String,
    pub active: bool,
}

impl PendingReadRequest {
    /// Arm with `request_id`, replacing any earlier request.
    pub fn arm(&mut self, request_id: &str) {
        self.request_id.clear();
        self.request_id.push_str(request_id);
        self.active = true;
    }

    /// Consume the request if armed.
    pub fn take(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(std::mem::take(&mut self.request_id))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    role: DeviceRole,
    caps: Capabilities,
    pending: PendingReadRequest,
}

impl Dispatcher {
    pub fn new(role: DeviceRole) -> Self {
        Self::with_capabilities(role, role.capabilities())
    }

    pub fn with_capabilities(role: DeviceRole, caps: Capabilities) -> Self {
        Self {
            role,
            caps,
            pending: PendingReadRequest::default(),
        }
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn pending(&self) -> &PendingReadRequest {
        &self.pending
    }

    /// Handle one inbound line. `lifecycle` is the station's tag engine, if any.
    pub fn handle_line(&mut self, line: &str, lifecycle: Option<&mut TagLifecycle>) -> Replies {
        let mut replies = Replies::new();

        let line = line.trim();
        if line.is_empty() {
            return replies;
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("[proto] ignored: {}", e);
                return replies;
            }
        };

        match command {
            InboundCommand::Ping { request_id } if self.caps.handles_ping => {
                replies.push(format_pong(&request_id, self.role));
                if let Some(lifecycle) = lifecycle {
                    replies.push(format_status(lifecycle.status()));
                }
            }
            InboundCommand::ReadUid { request_id } if self.caps.handles_read_uid => {
                if self.pending.is_active() {
                    info!(
                        "[proto] READUID {} replaces pending request {}",
                        request_id, self.pending.request_id
                    );
                } else {
                    info!("[proto] READUID {} armed, waiting for a tag", request_id);
                }
                self.pending.arm(&request_id);
            }
            InboundCommand::Set { payload } if self.caps.handles_set => {
                replies.push(self.handle_set(&payload, lifecycle));
            }
            InboundCommand::Unrecognized(text) => {
                info!("[proto] server: {}", text);
            }
            other => {
                warn!(
                    "[proto] {} is not handled by a {} node",
                    other.verb(),
                    self.role
                );
            }
        }

        replies
    }

    fn handle_set(&self, payload: &str, lifecycle: Option<&mut TagLifecycle>) -> String {
        let Some(lifecycle) = lifecycle else {
            warn!("[proto] SET received but no tag engine is running");
            return REPLY_NACK.to_string();
        };

        match lifecycle.configure_from_payload(payload) {
            Ok(id) => format_ack(id),
            Err(e) if e.is_invalid_transition() => {
                warn!("[proto] SET refused: {}", DeviceError::InvalidTransition(e.to_string()));
                REPLY_NACK.to_string()
            }
            Err(e) => {
                warn!("[proto] SET rejected: {}", DeviceError::MalformedCommand(e.to_string()));
                REPLY_NACK.to_string()
            }
        }
    }

    /// Outbound line for a debounced presence event.
    ///
    /// An armed `READUID` takes the first `Entered`, whatever the identifier;
    /// otherwise reader roles report it as `SCAN`.
    pub fn on_presence(&mut self, event: &PresenceEvent) -> Option<String> {
        match event {
            PresenceEvent::Entered(identifier) => {
                info!("[nfc] tag {} entered", identifier);
                if let Some(request_id) = self.pending.take() {
                    info!("[nfc] answering READUID {}", request_id);
                    return Some(format_uid(&request_id, identifier));
                }
                if self.caps.has_reader {
                    return Some(format_scan(identifier));
                }
                None
            }
            PresenceEvent::Exited => {
                debug!("[nfc] tag left the field");
                None
            }
        }
    }

    pub fn on_lifecycle_events(&self, events: &[LifecycleEvent]) -> Vec<String> {
        events.iter().map(format_lifecycle_event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identifier;

    #[test]
    fn test_pending_request_take_once() {
        let mut p = PendingReadRequest::default();
        assert_eq!(p.take(), None);
        p.arm("a");
        p.arm("b");
        assert!(p.is_active());
        assert_eq!(p.take(), Some("b".to_string()));
        assert_eq!(p.take(), None);
    }

    #[test]
    fn test_door_ignores_set() {
        let mut d = Dispatcher::new(DeviceRole::Door);
        let replies = d.handle_line(r#"SET {"ID":1}"#, None);
        assert!(replies.is_empty());
    }

    #[test]
    fn test_station_ignores_readuid() {
        let mut d = Dispatcher::new(DeviceRole::TagStation);
        let mut lc = TagLifecycle::new();
        assert!(d.handle_line("READUID 5", Some(&mut lc)).is_empty());
        assert!(!d.pending().is_active());
    }

    #[test]
    fn test_exited_produces_no_line() {
        let mut d = Dispatcher::new(DeviceRole::Scanner);
        assert_eq!(d.on_presence(&PresenceEvent::Exited), None);
        let id = Identifier::new(&[0xDE, 0xAD]).unwrap();
        assert_eq!(
            d.on_presence(&PresenceEvent::Entered(id)),
            Some("SCAN DEAD".to_string())
        );
    }
}

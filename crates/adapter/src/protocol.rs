//! Protocol module - line protocol between nodes and the server
//!
//! One command or event per `\n`-terminated UTF-8 line; the first token is the verb
//! and verbs are case-sensitive. Fields never contain newlines.
//!
//! Tag snapshots embedded in `MOVE`, `SOLD` and `DATA` are JSON objects using the
//! same field names the server sends in `SET`.

use serde::Serialize;

use crate::core::{LifecycleEvent, ResetReason, TagRecord, TagStatus};
use crate::error::DeviceError;
use crate::types::{DeviceRole, Identifier, Location};

// ============== Server -> Device ==============

pub const VERB_PING: &str = "PING";
pub const VERB_READUID: &str = "READUID";
pub const VERB_SET: &str = "SET";

// ============== Device -> Server ==============

pub const VERB_ROLE: &str = "ROLE";
pub const VERB_PONG: &str = "PONG";
pub const VERB_SCAN: &str = "SCAN";
pub const VERB_UID: &str = "UID";
pub const VERB_MOVE: &str = "MOVE";
pub const VERB_SOLD: &str = "SOLD";
pub const VERB_RESET: &str = "RESET";
pub const REPLY_NACK: &str = "NACK";
pub const STATUS_EMPTY: &str = "EMPTY";
pub const STATUS_DATA: &str = "DATA";

/// Parsed inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    Ping { request_id: String },
    ReadUid { request_id: String },
    Set { payload: String },
    /// Anything else, kept verbatim for logging
    Unrecognized(String),
}

impl InboundCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            InboundCommand::Ping { .. } => VERB_PING,
            InboundCommand::ReadUid { .. } => VERB_READUID,
            InboundCommand::Set { .. } => VERB_SET,
            InboundCommand::Unrecognized(_) => "",
        }
    }
}

/// Parse one inbound line.
///
/// Unknown verbs are not errors (forward compatibility); a known verb without its
/// argument is `MalformedCommand`.
pub fn parse_command(line: &str) -> Result<InboundCommand, DeviceError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let require_arg = |what: &str| -> Result<String, DeviceError> {
        if rest.is_empty() {
            Err(DeviceError::MalformedCommand(format!("{} without {}", verb, what)))
        } else {
            Ok(rest.to_string())
        }
    };

    match verb {
        VERB_PING => Ok(InboundCommand::Ping {
            request_id: require_arg("request id")?,
        }),
        VERB_READUID => Ok(InboundCommand::ReadUid {
            request_id: require_arg("request id")?,
        }),
        VERB_SET => Ok(InboundCommand::Set {
            payload: require_arg("fields")?,
        }),
        _ => Ok(InboundCommand::Unrecognized(line.to_string())),
    }
}

/// `ROLE <component> <role>` announcement sent once per connection
pub fn format_role(role: DeviceRole) -> String {
    format!("{} {} {}", VERB_ROLE, role.component(), role.wire_token())
}

pub fn format_pong(request_id: &str, role: DeviceRole) -> String {
    format!(
        "{} {} {} {}",
        VERB_PONG,
        request_id,
        role.component(),
        role.wire_token()
    )
}

pub fn format_scan(identifier: &Identifier) -> String {
    format!("{} {}", VERB_SCAN, identifier.to_hex())
}

pub fn format_uid(request_id: &str, identifier: &Identifier) -> String {
    format!("{} {} {}", VERB_UID, request_id, identifier.to_hex())
}

pub fn format_ack(id: i64) -> String {
    format!("ACK ID={}", id)
}

/// Tag snapshot as carried on the wire
#[derive(Debug, Clone, Serialize)]
pub struct TagJson<'a> {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Temporada")]
    pub season: &'a str,
    #[serde(rename = "Tipo")]
    pub kind: &'a str,
    #[serde(rename = "Ubicacion")]
    pub location: &'static str,
    #[serde(rename = "Precio")]
    pub price: f64,
    #[serde(rename = "From", skip_serializing_if = "Option::is_none")]
    pub from: Option<&'static str>,
    #[serde(rename = "To", skip_serializing_if = "Option::is_none")]
    pub to: Option<&'static str>,
}

impl<'a> TagJson<'a> {
    pub fn from_record(record: &'a TagRecord) -> Self {
        Self {
            id: record.id,
            season: &record.season,
            kind: &record.kind,
            location: record.location.as_wire(),
            price: record.price,
            from: None,
            to: None,
        }
    }

    pub fn with_move(mut self, from: Location, to: Location) -> Self {
        self.from = Some(from.as_wire());
        self.to = Some(to.as_wire());
        self
    }

    pub fn to_json(&self) -> String {
        // Only strings and numbers; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Status line answering a station PING
pub fn format_status(status: TagStatus<'_>) -> String {
    match status {
        TagStatus::Empty => STATUS_EMPTY.to_string(),
        TagStatus::Data(record) => {
            format!("{} {}", STATUS_DATA, TagJson::from_record(record).to_json())
        }
    }
}

pub fn format_lifecycle_event(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::Moved { record, from, to } => format!(
            "{} {}",
            VERB_MOVE,
            TagJson::from_record(record).with_move(*from, *to).to_json()
        ),
        LifecycleEvent::Sold { record } => {
            format!("{} {}", VERB_SOLD, TagJson::from_record(record).to_json())
        }
        LifecycleEvent::Reset { id, reason } => {
            let suffix = match reason {
                ResetReason::Idle => None,
                ResetReason::AfterSale => Some("AFTER_SALE"),
                ResetReason::Unknown => Some("UNKNOWN"),
            };
            match (id, suffix) {
                (_, None) => VERB_RESET.to_string(),
                (Some(id), Some(suffix)) => format!("{} ID={} {}", VERB_RESET, id, suffix),
                (None, Some(suffix)) => format!("{} {}", VERB_RESET, suffix),
            }
        }
    }
}

/// `ROLE` line as seen by the server side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAnnouncement {
    pub component: String,
    pub role: String,
}

pub fn parse_role_announcement(line: &str) -> Option<RoleAnnouncement> {
    let mut parts = line.split_whitespace();
    if parts.next()? != VERB_ROLE {
        return None;
    }
    let component = parts.next()?.to_string();
    let role = parts.next()?.to_string();
    Some(RoleAnnouncement { component, role })
}

//! Shared types module - vocabulary used by every tagnode crate
//!
//! This crate defines the data that flows between the device session core, the
//! protocol layer and the hardware collaborators. It has no external dependencies so
//! it can be shared by firmware-style code, host tooling and tests alike.
//!
//! # Roles
//!
//! A node runs exactly one [`DeviceRole`], fixed at boot:
//!
//! | Role | Wire token | Component | Reader | Lifecycle |
//! |------|------------|-----------|--------|-----------|
//! | `Door` | `DOOR` | `NFC` | yes | no |
//! | `Scanner` | `BOX` | `NFC` | yes | no |
//! | `TagStation` | `STATION` | `TAG` | no | yes |
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEBOUNCE_MS` | 250 | Raw presence must hold this long before it is accepted |
//! | `POLL_TIMEOUT_MS` | 50 | Upper bound for one reader poll |
//! | `LINK_TIMEOUT_MS` | 20000 | Upper bound for one WiFi association attempt |
//! | `CONNECT_TIMEOUT_MS` | 5000 | Upper bound for one TCP connect attempt |
//! | `LINK_RETRY_MS` | 1000 | Minimum spacing between association attempts |
//!
//! # Examples
//!
//! ```
//! use tagnode_types::{DeviceRole, Identifier};
//!
//! let role = DeviceRole::from_str("door").unwrap();
//! assert_eq!(role.wire_token(), "DOOR");
//! assert!(role.capabilities().has_reader);
//!
//! let uid = Identifier::new(&[0x0A, 0xFF]).unwrap();
//! assert_eq!(uid.to_hex(), "0AFF");
//! ```

use std::fmt;

pub mod io;

pub use io::{Button, Link, PresenceSensor, Transport};

/// Debounce interval for presence samples in milliseconds
pub const DEBOUNCE_MS: u64 = 250;

/// Reader poll timeout in milliseconds
pub const POLL_TIMEOUT_MS: u64 = 50;

/// WiFi association timeout in milliseconds
pub const LINK_TIMEOUT_MS: u64 = 20_000;

/// TCP connect timeout in milliseconds
pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Minimum spacing between WiFi association attempts in milliseconds
pub const LINK_RETRY_MS: u64 = 1_000;

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Longest identifier a reader can report (7-byte ISO14443A UID)
pub const MAX_IDENTIFIER_LEN: usize = 7;

/// Longest inbound protocol line accepted, excluding the newline
pub const MAX_LINE_LEN: usize = 512;


/// Fixed operating mode of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    /// Door reader: reports every tag that crosses the door
    Door,
    /// Point-of-sale reader ("box")
    Scanner,
    /// Tag-programmer station holding one tag record
    TagStation,
}

impl DeviceRole {
    /// Parse role from a configuration string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tagnode_types::DeviceRole;
    ///
    /// assert_eq!(DeviceRole::from_str("Door"), Some(DeviceRole::Door));
    /// assert_eq!(DeviceRole::from_str("station"), Some(DeviceRole::TagStation));
    /// assert_eq!(DeviceRole::from_str("fridge"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "door" => Some(DeviceRole::Door),
            "scanner" | "box" => Some(DeviceRole::Scanner),
            "station" | "tagstation" | "tag-station" | "tag_station" => {
                Some(DeviceRole::TagStation)
            }
            _ => None,
        }
    }

    /// Token announced to the server in `ROLE` and `PONG` lines
    pub fn wire_token(&self) -> &'static str {
        match self {
            DeviceRole::Door => "DOOR",
            DeviceRole::Scanner => "BOX",
            DeviceRole::TagStation => "STATION",
        }
    }

    /// Subsystem that answers for this role (`NFC` reader or `TAG` station)
    pub fn component(&self) -> &'static str {
        match self {
            DeviceRole::Door | DeviceRole::Scanner => "NFC",
            DeviceRole::TagStation => "TAG",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            DeviceRole::Door | DeviceRole::Scanner => Capabilities {
                handles_ping: true,
                handles_read_uid: true,
                handles_set: false,
                runs_lifecycle: false,
                has_reader: true,
            },
            DeviceRole::TagStation => Capabilities {
                handles_ping: true,
                handles_read_uid: false,
                handles_set: true,
                runs_lifecycle: true,
                has_reader: false,
            },
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_token())
    }
}

/// Which verbs and engines a node runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub handles_ping: bool,
    pub handles_read_uid: bool,
    pub handles_set: bool,
    pub runs_lifecycle: bool,
    /// A presence reader is attached and must be present at boot
    pub has_reader: bool,
}

/// Raw identifier reported by the reader
///
/// Stored inline (no heap). Only the first `len` bytes are meaningful; equality and
/// hashing compare the length first and then those bytes.
#[derive(Clone, Copy)]
pub struct Identifier {
    bytes: [u8; MAX_IDENTIFIER_LEN],
    len: u8,
}

impl Identifier {
    /// Zero-length identifier
    pub const EMPTY: Identifier = Identifier {
        bytes: [0; MAX_IDENTIFIER_LEN],
        len: 0,
    };

    /// Copy an identifier from a slice; `None` if it is longer than 7 bytes
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_IDENTIFIER_LEN {
            return None;
        }
        let mut buf = [0u8; MAX_IDENTIFIER_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Build from a driver buffer and the length it reported
    pub fn from_raw(buf: [u8; MAX_IDENTIFIER_LEN], len: u8) -> Option<Self> {
        if len as usize > MAX_IDENTIFIER_LEN {
            return None;
        }
        Some(Self { bytes: buf, len })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Uppercase hex, two digits per byte, no separators
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.len() * 2);
        for b in self.as_bytes() {
            out.push_str(&format!("{:02X}", b));
        }
        out
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Identifier {}

impl std::hash::Hash for Identifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.as_bytes() {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// One reader poll result, produced fresh every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSample {
    pub present: bool,
    pub identifier: Identifier,
}

impl PresenceSample {
    pub fn absent() -> Self {
        Self {
            present: false,
            identifier: Identifier::EMPTY,
        }
    }

    pub fn present(identifier: Identifier) -> Self {
        Self {
            present: true,
            identifier,
        }
    }

    /// Identifier length as reported by the driver
    pub fn length(&self) -> u8 {
        self.identifier.len() as u8
    }
}

/// Debounced presence transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// A tag settled in the antenna field
    Entered(Identifier),
    /// The field settled empty
    Exited,
}

/// Where a tracked tag currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Location {
    #[default]
    Unset,
    Warehouse,
    Store,
}

impl Location {
    /// Parse the `Ubicacion` field; only the exact names select a location
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "almacén" => Location::Warehouse,
            "tienda" => Location::Store,
            _ => Location::Unset,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Location::Unset => "",
            Location::Warehouse => "almacén",
            Location::Store => "tienda",
        }
    }
}

/// WiFi network credentials
#[derive(Clone, PartialEq, Eq, Default)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

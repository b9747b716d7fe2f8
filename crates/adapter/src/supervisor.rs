//! Connection supervisor - keeps the WiFi link and the server session alive
//!
//! | Condition                          | Action                                   |
//! |------------------------------------|------------------------------------------|
//! | link down                          | close session, retry association paced   |
//! | link up, session open              | nothing                                  |
//! | link up, session closed            | one connect attempt, `ROLE` on success   |
//!
//! The supervisor never blocks longer than one connect attempt and never queues
//! lines: anything sent while disconnected is dropped.

use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::protocol::format_role;
use crate::types::{DeviceRole, Link, Transport, WifiCredentials};
use crate::wire_log::{Direction, WireLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub credentials: WifiCredentials,
    pub host: String,
    pub port: u16,
    pub link_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub link_retry_ms: u64,
}

impl SupervisorSettings {
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            credentials: config.credentials.clone(),
            host: config.server_host.clone(),
            port: config.server_port,
            link_timeout_ms: config.link_timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
            link_retry_ms: config.link_retry_ms,
        }
    }
}

pub struct ConnectionSupervisor<L, T> {
    link: L,
    transport: T,
    settings: SupervisorSettings,
    announcement: String,
    state: ConnectionState,
    last_link_attempt_ms: Option<u64>,
    wire_log: Option<WireLog>,
    connects: u64,
}

impl<L: Link, T: Transport> ConnectionSupervisor<L, T> {
    pub fn new(role: DeviceRole, settings: SupervisorSettings, link: L, transport: T) -> Self {
        Self {
            link,
            transport,
            settings,
            announcement: format_role(role),
            state: ConnectionState::Disconnected,
            last_link_attempt_ms: None,
            wire_log: None,
            connects: 0,
        }
    }

    pub fn with_wire_log(mut self, wire_log: WireLog) -> Self {
        self.wire_log = Some(wire_log);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sessions opened since boot
    pub fn connect_count(&self) -> u64 {
        self.connects
    }

    /// Blocking association attempt, bounded by the link timeout.
    pub fn associate(&mut self, now_ms: u64) -> bool {
        self.last_link_attempt_ms = Some(now_ms);
        info!("[wifi] associating with {:?}", self.settings.credentials.ssid);
        let ok = self
            .link
            .associate(&self.settings.credentials, self.settings.link_timeout_ms);
        if ok {
            info!("[wifi] link up");
        } else {
            warn!(
                "[wifi] association failed after {} ms",
                self.settings.link_timeout_ms
            );
        }
        ok
    }

    /// Retry association when the link is down, at most once per retry interval.
    pub fn maintain_link(&mut self, now_ms: u64) -> bool {
        if self.link.is_associated() {
            return true;
        }
        let due = match self.last_link_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.settings.link_retry_ms,
        };
        if !due {
            return false;
        }
        self.associate(now_ms)
    }

    /// Make sure a session is open, attempting at most one connect.
    pub fn ensure_connected(&mut self) -> Result<(), DeviceError> {
        if !self.link.is_associated() {
            if self.state == ConnectionState::Connected {
                warn!("[tcp] link lost, closing session");
                self.mark_disconnected();
            }
            return Err(DeviceError::LinkUnavailable);
        }

        if self.state == ConnectionState::Connected && self.transport.is_open() {
            return Ok(());
        }

        if self.state == ConnectionState::Connected {
            info!("[tcp] session closed by peer");
        }
        self.mark_disconnected();

        debug!(
            "[tcp] connecting to {}:{}",
            self.settings.host, self.settings.port
        );
        if !self.transport.connect(
            &self.settings.host,
            self.settings.port,
            self.settings.connect_timeout_ms,
        ) {
            return Err(DeviceError::SessionClosed);
        }

        self.state = ConnectionState::Connected;
        self.connects += 1;
        info!(
            "[tcp] connected to {}:{}",
            self.settings.host, self.settings.port
        );

        let announcement = self.announcement.clone();
        if self.send_line(&announcement) {
            Ok(())
        } else {
            Err(DeviceError::SessionClosed)
        }
    }

    /// Send one line. Returns false when it was dropped.
    pub fn send_line(&mut self, line: &str) -> bool {
        if self.state != ConnectionState::Connected {
            debug!("[tcp] dropped while disconnected: {}", line);
            return false;
        }
        match self.transport.write_line(line) {
            Ok(()) => {
                self.record(Direction::Outbound, line);
                true
            }
            Err(e) => {
                warn!("[tcp] write failed ({}), dropping session", e);
                self.mark_disconnected();
                false
            }
        }
    }

    /// Complete lines received since the last call.
    pub fn drain_lines(&mut self) -> Vec<String> {
        if self.state != ConnectionState::Connected {
            return Vec::new();
        }
        let lines = self.transport.read_available_lines();
        for line in &lines {
            self.record(Direction::Inbound, line);
        }
        lines
    }

    pub fn disconnect(&mut self) {
        self.mark_disconnected();
    }

    fn mark_disconnected(&mut self) {
        self.transport.close();
        self.state = ConnectionState::Disconnected;
    }

    fn record(&mut self, direction: Direction, line: &str) {
        let Some(log) = self.wire_log.as_mut() else {
            return;
        };
        if let Err(e) = log.record(direction, line) {
            warn!(
                "[tcp] wire log {} failed ({}), disabling",
                log.path().display(),
                e
            );
            self.wire_log = None;
        }
    }
}

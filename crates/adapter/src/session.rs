//! Device session - one node, one cooperative polling cycle
//!
//! The session owns every component of the node and runs them in a fixed order
//! each cycle:
//!
//! 1. link maintenance (paced re-association)
//! 2. `ensure_connected` (one bounded attempt, `ROLE` on success)
//! 3. drain inbound lines into the dispatcher
//! 4. one presence poll through the debouncer
//! 5. one button-edge check, `advance` on a rising edge
//!
//! Nothing in the cycle waits longer than the sensor poll or a single connect.

use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::core::{ButtonEdge, PresenceDebouncer, TagLifecycle};
use crate::dispatcher::Dispatcher;
use crate::error::DeviceError;
use crate::supervisor::{ConnectionSupervisor, SupervisorSettings};
use crate::types::{
    Button, Capabilities, DeviceRole, Link, PresenceEvent, PresenceSample, PresenceSensor,
    Transport,
};
use crate::wire_log::WireLog;

pub struct DeviceSession<L, T> {
    role: DeviceRole,
    caps: Capabilities,
    supervisor: ConnectionSupervisor<L, T>,
    dispatcher: Dispatcher,
    debouncer: Option<PresenceDebouncer>,
    lifecycle: Option<TagLifecycle>,
    sensor: Option<Box<dyn PresenceSensor>>,
    button: Option<Box<dyn Button>>,
    button_edge: ButtonEdge,
    poll_timeout_ms: u64,
    cycles: u64,
}

impl<L: Link, T: Transport> DeviceSession<L, T> {
    /// Assemble a session without touching the network.
    ///
    /// Reader roles need a sensor that answers `probe`; otherwise this fails with
    /// `SensorUnavailable` and the node must halt.
    pub fn new(
        config: &DeviceConfig,
        link: L,
        transport: T,
        sensor: Option<Box<dyn PresenceSensor>>,
        button: Option<Box<dyn Button>>,
    ) -> Result<Self, DeviceError> {
        let role = config.role;
        let caps = role.capabilities();

        let sensor = if caps.has_reader {
            let Some(mut sensor) = sensor else {
                return Err(DeviceError::SensorUnavailable);
            };
            if !sensor.probe() {
                return Err(DeviceError::SensorUnavailable);
            }
            info!("[nfc] reader detected");
            Some(sensor)
        } else {
            sensor
        };

        if caps.runs_lifecycle && button.is_none() {
            warn!("[tag] no button attached; the tag can only be configured");
        }

        let mut supervisor = ConnectionSupervisor::new(
            role,
            SupervisorSettings::from_config(config),
            link,
            transport,
        );
        if let Some(path) = config.wire_log_path.as_deref() {
            match WireLog::open(path) {
                Ok(log) => supervisor = supervisor.with_wire_log(log),
                Err(e) => warn!("[tcp] cannot open wire log {}: {}", path, e),
            }
        }

        let debouncer = sensor
            .as_ref()
            .map(|_| PresenceDebouncer::with_interval(config.debounce_ms));
        let lifecycle = caps.runs_lifecycle.then(TagLifecycle::new);

        info!("[tag] node role {} ({})", role, role.component());

        Ok(Self {
            role,
            caps,
            supervisor,
            dispatcher: Dispatcher::with_capabilities(role, caps),
            debouncer,
            lifecycle,
            sensor,
            button,
            button_edge: ButtonEdge::new(),
            poll_timeout_ms: config.poll_timeout_ms,
            cycles: 0,
        })
    }

    /// `new`, then one association attempt and one connect attempt.
    pub fn boot(
        config: &DeviceConfig,
        link: L,
        transport: T,
        sensor: Option<Box<dyn PresenceSensor>>,
        button: Option<Box<dyn Button>>,
        now_ms: u64,
    ) -> Result<Self, DeviceError> {
        let mut session = Self::new(config, link, transport, sensor, button)?;
        session.supervisor.associate(now_ms);
        if let Err(e) = session.supervisor.ensure_connected() {
            warn!("[tcp] not connected at boot: {}", e);
        }
        Ok(session)
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<L, T> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectionSupervisor<L, T> {
        &mut self.supervisor
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn debouncer(&self) -> Option<&PresenceDebouncer> {
        self.debouncer.as_ref()
    }

    pub fn lifecycle(&self) -> Option<&TagLifecycle> {
        self.lifecycle.as_ref()
    }

    pub fn connected(&self) -> bool {
        self.supervisor.connected()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one polling cycle at `now_ms` (monotonic milliseconds).
    pub fn cycle(&mut self, now_ms: u64) {
        self.cycles += 1;

        self.supervisor.maintain_link(now_ms);
        if let Err(e) = self.supervisor.ensure_connected() {
            debug!("[tcp] {}", e);
        }

        for line in self.supervisor.drain_lines() {
            self.handle_line(&line);
        }

        let sample = self
            .sensor
            .as_mut()
            .map(|sensor| sensor.poll(self.poll_timeout_ms));
        if let Some(sample) = sample {
            self.handle_sample(&sample, now_ms);
        }

        let pressed = match self.button.as_mut() {
            Some(button) => button.is_pressed(),
            None => false,
        };
        if self.button_edge.rising(pressed) {
            self.press_button();
        }
    }

    /// Dispatch one inbound line and send its replies.
    pub fn handle_line(&mut self, line: &str) {
        let replies = self.dispatcher.handle_line(line, self.lifecycle.as_mut());
        for reply in &replies {
            self.supervisor.send_line(reply);
        }
    }

    /// Feed one raw sample to the debouncer; returns the committed event, if any.
    pub fn handle_sample(&mut self, sample: &PresenceSample, now_ms: u64) -> Option<PresenceEvent> {
        let debouncer = self.debouncer.as_mut()?;
        let event = debouncer.observe(sample, now_ms)?;
        // An armed READUID outlives a dropped session.
        if !self.supervisor.connected() {
            debug!("[nfc] {:?} not reported, no session", event);
            return Some(event);
        }
        if let Some(line) = self.dispatcher.on_presence(&event) {
            self.supervisor.send_line(&line);
        }
        Some(event)
    }

    /// One lifecycle step, as if the button had been pressed.
    pub fn press_button(&mut self) {
        let Some(lifecycle) = self.lifecycle.as_mut() else {
            debug!("[tag] button ignored, no tag engine on a {} node", self.role);
            return;
        };
        let events = lifecycle.advance();
        for line in self.dispatcher.on_lifecycle_events(&events) {
            self.supervisor.send_line(&line);
        }
    }

    /// Close the session (shutdown).
    pub fn shutdown(&mut self) {
        info!("[tcp] shutting down after {} cycles", self.cycles);
        self.supervisor.disconnect();
    }
}

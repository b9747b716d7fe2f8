//! Node runner (default binary).
//!
//! Runs one node on the host: the keyboard panel stands in for the reader and
//! the button, the host network for WiFi. The role and server come from the
//! `TAGNODE_*` environment variables.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{error, info};

use tagnode::adapter::{DeviceConfig, DeviceSession, HostLink, TcpTransport};
use tagnode::input::KeyboardPanel;
use tagnode::types::{Button, PresenceSensor};

fn init_logging() {
    // Raw mode: every line needs its own carriage return.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}\r",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = DeviceConfig::from_env()?;
    info!(
        "[tcp] {} node, server {}",
        config.role,
        config.server_addr()
    );

    let mut panel = KeyboardPanel::new();
    panel.enter()?;

    let result = run(&config, &panel);

    // Always try to restore terminal state.
    let _ = panel.exit();
    result
}

fn run(config: &DeviceConfig, panel: &KeyboardPanel) -> Result<()> {
    let caps = config.role.capabilities();

    let sensor = caps
        .has_reader
        .then(|| Box::new(panel.sensor()) as Box<dyn PresenceSensor>);
    let button = caps
        .runs_lifecycle
        .then(|| Box::new(panel.button()) as Box<dyn Button>);

    let start = Instant::now();
    let mut session = match DeviceSession::boot(
        config,
        HostLink::new(),
        TcpTransport::new()?,
        sensor,
        button,
        0,
    ) {
        Ok(session) => session,
        Err(e) if e.is_fatal() => {
            error!("[nfc] {}, halting", e);
            return Err(e.into());
        }
        Err(e) => return Err(anyhow::Error::from(e).context("boot failed")),
    };

    info!("[panel] 1-3 tag, 0 clear, f flaky, space button, q quit");

    // Without a reader nothing else waits, so the panel paces the cycle.
    let idle = Duration::from_millis(config.poll_timeout_ms);
    while !panel.quit_requested() {
        session.cycle(start.elapsed().as_millis() as u64);
        if !caps.has_reader {
            panel.pump(idle)?;
        }
    }

    session.shutdown();
    Ok(())
}

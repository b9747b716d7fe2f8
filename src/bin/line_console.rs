//! Development line console.
//!
//! Listens for nodes and prints every line they send. Typed lines go to every
//! node, or to one node with `@<id> <line>`.

use std::io::Write;

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use tagnode::adapter::{run_console, ConsoleCommand, ConsoleConfig, ConsoleEvent};

fn parse_operator_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix('@') {
        let (id, text) = rest.split_once(char::is_whitespace)?;
        let device_id = id.parse().ok()?;
        return Some(ConsoleCommand::ToDevice {
            device_id,
            line: text.trim().to_string(),
        });
    }
    Some(ConsoleCommand::Broadcast {
        line: line.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{:<5} {}", record.level(), record.args()))
        .init();

    let config = ConsoleConfig::from_env();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ConsoleCommand>();

    let server = tokio::spawn(run_console(config, events_tx, cmd_rx, None));

    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                ConsoleEvent::Connected { device_id, addr } => {
                    println!("#{} connected from {}", device_id, addr)
                }
                ConsoleEvent::Announced {
                    device_id,
                    component,
                    role,
                } => println!("#{} ROLE {} {}", device_id, component, role),
                ConsoleEvent::Line { device_id, line } => println!("#{} {}", device_id, line),
                ConsoleEvent::Disconnected { device_id } => {
                    println!("#{} disconnected", device_id)
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_operator_line(&line) {
            Some(cmd) => {
                if cmd_tx.send(cmd).is_err() {
                    break;
                }
            }
            None if line.trim_start().starts_with('@') => {
                warn!("usage: @<device id> <line>");
            }
            None => {}
        }
    }

    info!("stdin closed, stopping");
    server.abort();
    Ok(())
}

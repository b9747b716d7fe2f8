//! Development line console - a stand-in for the fleet server
//!
//! Accepts any number of nodes, reports their lines as [`ConsoleEvent`]s and
//! forwards operator lines to one node or all of them. It keeps no tag state and
//! makes no routing decisions.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::parse_role_announcement;
use crate::types::DEFAULT_SERVER_PORT;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("TAGNODE_CONSOLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("TAGNODE_CONSOLE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT);

        Self { host, port }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid console address {}:{}", self.host, self.port))
    }
}

/// Something a node did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Connected {
        device_id: usize,
        addr: SocketAddr,
    },
    Announced {
        device_id: usize,
        component: String,
        role: String,
    },
    Line {
        device_id: usize,
        line: String,
    },
    Disconnected {
        device_id: usize,
    },
}

/// Operator line to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    ToDevice { device_id: usize, line: String },
    Broadcast { line: String },
}

struct DeviceHandle {
    id: usize,
    tx: mpsc::UnboundedSender<String>,
}

/// Connected nodes, shared between the accept loop and the command pump
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<Vec<DeviceHandle>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    async fn register(&self, id: usize, tx: mpsc::UnboundedSender<String>) {
        self.devices.write().await.push(DeviceHandle { id, tx });
    }

    async fn unregister(&self, id: usize) {
        self.devices.write().await.retain(|d| d.id != id);
    }

    /// Returns false when no such node is connected.
    pub async fn send_to(&self, device_id: usize, line: String) -> bool {
        let devices = self.devices.read().await;
        match devices.iter().find(|d| d.id == device_id) {
            Some(d) => d.tx.send(line).is_ok(),
            None => false,
        }
    }

    /// Returns how many nodes the line was queued for.
    pub async fn broadcast(&self, line: &str) -> usize {
        let devices = self.devices.read().await;
        devices
            .iter()
            .filter(|d| d.tx.send(line.to_string()).is_ok())
            .count()
    }
}

pub async fn run_console(
    config: ConsoleConfig,
    events_tx: mpsc::UnboundedSender<ConsoleEvent>,
    mut cmd_rx: mpsc::UnboundedReceiver<ConsoleCommand>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!("[console] listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let registry = DeviceRegistry::new();

    // Operator commands.
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    ConsoleCommand::ToDevice { device_id, line } => {
                        if !registry.send_to(device_id, line).await {
                            warn!("[console] no device {}", device_id);
                        }
                    }
                    ConsoleCommand::Broadcast { line } => {
                        let n = registry.broadcast(&line).await;
                        info!("[console] sent to {} device(s)", n);
                    }
                }
            }
        });
    }

    let mut device_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        device_id_counter += 1;
        let device_id = device_id_counter;

        let registry = registry.clone();
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_device(socket, addr, device_id, registry, events_tx).await {
                warn!("[console] device {} error: {}", device_id, e);
            }
        });
    }
}

/// Serve one node until it disconnects.
pub async fn handle_device<S>(
    stream: S,
    addr: SocketAddr,
    device_id: usize,
    registry: DeviceRegistry,
    events_tx: mpsc::UnboundedSender<ConsoleEvent>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    registry.register(device_id, tx).await;
    info!("[console] device {} connected from {}", device_id, addr);
    let _ = events_tx.send(ConsoleEvent::Connected { device_id, addr });

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    let result: anyhow::Result<()> = loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line).await {
            Ok(n) => n,
            Err(e) => break Err(e.into()),
        };
        if bytes_read == 0 {
            break Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event = match parse_role_announcement(trimmed) {
            Some(role) => {
                info!(
                    "[console] device {} is {} {}",
                    device_id, role.component, role.role
                );
                ConsoleEvent::Announced {
                    device_id,
                    component: role.component,
                    role: role.role,
                }
            }
            None => ConsoleEvent::Line {
                device_id,
                line: trimmed.to_string(),
            },
        };
        let _ = events_tx.send(event);
    };

    registry.unregister(device_id).await;
    write_task.abort();
    info!("[console] device {} disconnected", device_id);
    let _ = events_tx.send(ConsoleEvent::Disconnected { device_id });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_console_config_addr() {
        let config = ConsoleConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
        };
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );
        let bad = ConsoleConfig {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[tokio::test]
    async fn test_device_lines_become_events() {
        let stream = tokio_test::io::Builder::new()
            .read(b"ROLE NFC DOOR\r\n")
            .read(b"\nSCAN 04A2\n")
            .build();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let registry = DeviceRegistry::new();

        handle_device(stream, addr(), 3, registry.clone(), events_tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(e) = events_rx.try_recv() {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                ConsoleEvent::Connected {
                    device_id: 3,
                    addr: addr()
                },
                ConsoleEvent::Announced {
                    device_id: 3,
                    component: "NFC".to_string(),
                    role: "DOOR".to_string()
                },
                ConsoleEvent::Line {
                    device_id: 3,
                    line: "SCAN 04A2".to_string()
                },
                ConsoleEvent::Disconnected { device_id: 3 },
            ]
        );
        assert!(registry.is_empty().await);
        assert!(!registry.send_to(3, "PING 1".to_string()).await);
    }
}

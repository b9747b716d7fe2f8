//! Host collaborators: a tokio TCP transport and the OS network as the link.
//!
//! The device cycle is synchronous, so the transport owns a current-thread tokio
//! runtime and drives every socket operation through `block_on` under a timeout.

use std::io;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;

use crate::framing::LineBuffer;
use crate::types::{Link, Transport, WifiCredentials};

const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const READ_READY_TIMEOUT: Duration = Duration::from_millis(1);
/// Upper bound on reads per drain so a chatty peer cannot stall the cycle
const MAX_READS_PER_DRAIN: usize = 64;

pub struct TcpTransport {
    rt: Runtime,
    stream: Option<TcpStream>,
    lines: LineBuffer,
}

impl TcpTransport {
    pub fn new() -> io::Result<Self> {
        let rt = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            rt,
            stream: None,
            lines: LineBuffer::new(),
        })
    }

    fn drop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Deregistering needs the runtime context.
            let _guard = self.rt.enter();
            drop(stream);
        }
        self.lines.clear();
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.drop_stream();
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u64) -> bool {
        self.drop_stream();

        let addr = format!("{}:{}", host, port);
        let limit = Duration::from_millis(timeout_ms);
        let result = self
            .rt
            .block_on(async { timeout(limit, TcpStream::connect(&addr)).await });

        match result {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("[tcp] set_nodelay failed: {}", e);
                }
                self.stream = Some(stream);
                true
            }
            Ok(Err(e)) => {
                warn!("[tcp] connect to {} failed: {}", addr, e);
                false
            }
            Err(_) => {
                warn!("[tcp] connect to {} timed out after {} ms", addr, timeout_ms);
                false
            }
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no session"));
        };

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        let result = self.rt.block_on(async {
            match timeout(WRITE_TIMEOUT, stream.write_all(&bytes)).await {
                Ok(r) => r,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
            }
        });

        if result.is_err() {
            self.drop_stream();
        }
        result
    }

    fn read_available_lines(&mut self) -> Vec<String> {
        let Some(stream) = self.stream.as_ref() else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        let mut closed = false;
        let mut chunk = [0u8; 1024];
        let lines_buf = &mut self.lines;

        self.rt.block_on(async {
            for _ in 0..MAX_READS_PER_DRAIN {
                match timeout(READ_READY_TIMEOUT, stream.readable()).await {
                    Err(_) => break,
                    Ok(Err(e)) => {
                        debug!("[tcp] readable failed: {}", e);
                        closed = true;
                        break;
                    }
                    Ok(Ok(())) => {}
                }
                match stream.try_read(&mut chunk) {
                    Ok(0) => {
                        closed = true;
                        break;
                    }
                    Ok(n) => lines.extend(lines_buf.push_bytes(&chunk[..n])),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                    Err(e) => {
                        debug!("[tcp] read failed: {}", e);
                        closed = true;
                        break;
                    }
                }
            }
        });

        if closed {
            info!("[tcp] server closed the connection");
            self.drop_stream();
        }
        lines
    }

    fn close(&mut self) {
        self.drop_stream();
    }
}

/// The host's own network standing in for the WiFi radio.
///
/// Association always succeeds; the credentials are only logged by SSID.
#[derive(Debug, Default)]
pub struct HostLink {
    associated: bool,
}

impl HostLink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Link for HostLink {
    fn is_associated(&self) -> bool {
        self.associated
    }

    fn associate(&mut self, credentials: &WifiCredentials, _timeout_ms: u64) -> bool {
        if credentials.ssid.is_empty() {
            debug!("[wifi] no SSID configured, using the host network");
        } else {
            debug!("[wifi] host network stands in for {:?}", credentials.ssid);
        }
        self.associated = true;
        true
    }
}

//! Append-only log of every protocol line sent or received.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device -> server
    Outbound,
    /// Server -> device
    Inbound,
}

impl Direction {
    fn marker(&self) -> &'static str {
        match self {
            Direction::Outbound => ">",
            Direction::Inbound => "<",
        }
    }
}

#[derive(Debug)]
pub struct WireLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl WireLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, direction: Direction, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{} {}", direction.marker(), line)?;
        self.writer.flush()
    }
}

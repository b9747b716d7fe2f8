//! Adapter crate - everything between the node logic and the outside world
//!
//! Nodes speak a **line protocol** over one persistent TCP session with the
//! fleet server. The server drives requests; the node reports what its reader and
//! button see.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: the node connects to the server (default port 5000)
//! 2. **Announcement**: the first line of every session is `ROLE <component> <role>`
//! 3. **Requests**: the server sends `PING`, `READUID` and (stations) `SET`
//! 4. **Events**: the node sends `SCAN`, `UID`, `MOVE`, `SOLD` and `RESET`
//!
//! # Message Types
//!
//! ## Server → Node
//!
//! | line | roles | reply |
//! |------|-------|-------|
//! | `PING <rid>` | all | `PONG <rid> <component> <role>` (+ `EMPTY`/`DATA {..}` on stations) |
//! | `READUID <rid>` | door, scanner | `UID <rid> <hex>` on the next tag |
//! | `SET {..}` | station | `ACK ID=<id>` or `NACK` |
//!
//! ## Node → Server
//!
//! - **SCAN** `<hex>`: a tag entered the reader field
//! - **MOVE** `{..}`: the held tag moved from the warehouse to the store
//! - **SOLD** `{..}` then **RESET** `ID=<id> AFTER_SALE`: the held tag was sold
//! - **RESET**: button pressed with nothing held
//!
//! # Example Session
//!
//! ```text
//! Node   -> Server: ROLE TAG STATION
//! Server -> Node:   SET {"ID":12,"Temporada":"invierno","Tipo":"abrigo","Ubicacion":"almacén","Precio":"59,90"}
//! Node   -> Server: ACK ID=12
//! Node   -> Server: MOVE {"ID":12,"Temporada":"invierno","Tipo":"abrigo","Ubicacion":"tienda","Precio":59.9,"From":"almacén","To":"tienda"}
//! ```
//!
//! # Modules
//!
//! - [`protocol`]: verbs, parsing and line formatting
//! - [`dispatcher`]: routes inbound lines, owns the pending `READUID`
//! - [`supervisor`]: link and session maintenance, guarded sends
//! - [`session`]: the per-cycle composition of all of the above
//! - [`net`]: tokio TCP transport and host link
//! - [`console`]: development listener standing in for the server
//!
//! # Testing
//!
//! Run `line-console` and point a node at it, or use netcat:
//!
//! ```bash
//! nc -l 5000
//! ```

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod framing;
pub mod net;
pub mod protocol;
pub mod session;
pub mod supervisor;
pub mod wire_log;

pub use tagnode_core as core;
pub use tagnode_types as types;

pub use config::DeviceConfig;
pub use console::{run_console, ConsoleCommand, ConsoleConfig, ConsoleEvent, DeviceRegistry};
pub use dispatcher::{Dispatcher, PendingReadRequest, Replies};
pub use error::DeviceError;
pub use framing::LineBuffer;
pub use net::{HostLink, TcpTransport};
pub use protocol::*;
pub use session::DeviceSession;
pub use supervisor::{ConnectionState, ConnectionSupervisor, SupervisorSettings};
pub use wire_log::{Direction, WireLog};

//! tagnode (workspace facade crate).
//!
//! Re-exports the member crates under `crates/` as `tagnode::{adapter,core,input,types}`.

pub use tagnode_adapter as adapter;
pub use tagnode_core as core;
pub use tagnode_input as input;
pub use tagnode_types as types;

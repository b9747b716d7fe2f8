//! Terminal input crate - the keyboard as a node's reader and button.
//!
//! This crate is independent of the protocol. It maps `crossterm` key events
//! into [`PanelKey`]s and exposes the resulting panel through the collaborator
//! traits of `tagnode-types`, so a node can run on a desk without hardware.
//!
//! | key | effect |
//! |-----|--------|
//! | `1`..`3` | place / remove a preset tag |
//! | `0` | clear the reader |
//! | `f` | toggle flaky reads |
//! | space | press the station button |
//! | `q`, Esc, Ctrl-C | quit |

pub mod map;
pub mod panel;

pub use tagnode_types as types;

pub use map::{map_key_event, should_quit, PanelKey};
pub use panel::{KeyboardButton, KeyboardPanel, KeyboardSensor, PanelState, PRESET_TAGS};

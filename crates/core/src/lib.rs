//! Core device logic - pure, deterministic, and testable
//!
//! Everything in this crate is driven by explicit inputs (samples, timestamps,
//! payload strings) and returns explicit outputs (events, results). It performs
//! **no I/O**: sockets, radios and buttons live behind the collaborator traits in
//! `tagnode-types` and are driven by the session in `tagnode-adapter`.
//!
//! # Module Structure
//!
//! - [`debounce`]: presence debouncer turning raw reader polls into `Entered`/`Exited`
//! - [`fields`]: tolerant field extractor for `SET` payloads
//! - [`lifecycle`]: the tag record and its Empty → Warehouse → Store → Sold machine
//! - [`button`]: rising-edge detection for the station button
//!
//! # Example
//!
//! ```
//! use tagnode_core::{LifecycleEvent, PresenceDebouncer, TagLifecycle};
//! use tagnode_types::{Identifier, PresenceEvent, PresenceSample};
//!
//! let mut debouncer = PresenceDebouncer::new();
//! let sample = PresenceSample::present(Identifier::new(&[0x04, 0xA2]).unwrap());
//! assert_eq!(debouncer.observe(&sample, 0), None);
//! assert_eq!(
//!     debouncer.observe(&sample, 250),
//!     Some(PresenceEvent::Entered(sample.identifier))
//! );
//!
//! let mut tag = TagLifecycle::new();
//! let payload = r#"{"ID":1,"Temporada":"verano","Tipo":"falda","Ubicacion":"almacén","Precio":"20,00"}"#;
//! assert_eq!(tag.configure_from_payload(payload), Ok(1));
//! assert!(matches!(tag.advance()[0], LifecycleEvent::Moved { .. }));
//! ```

pub mod button;
pub mod debounce;
pub mod fields;
pub mod lifecycle;

pub use tagnode_types as types;

pub use button::ButtonEdge;
pub use debounce::{DebounceState, PresenceDebouncer};
pub use fields::{extract_field, parse_price, parse_tag_fields, FieldError, TagFields};
pub use lifecycle::{
    LifecycleError, LifecycleEvent, LifecycleEvents, ResetReason, TagLifecycle, TagRecord,
    TagState, TagStatus,
};

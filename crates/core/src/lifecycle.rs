//! Tag lifecycle engine - the single tag record held by a tag station
//!
//! ```text
//!            SET (ACK)           button             button
//!   Empty ───────────────▶ Warehouse ──────▶ Store ──────▶ (Sold) ──▶ Empty
//!     ▲  button: RESET                 MOVE            SOLD + RESET AFTER_SALE
//!     └──┘
//! ```
//!
//! `configure` only succeeds from `Empty` and is all-or-nothing. `advance` is driven
//! by the station's button and emits the protocol events for the step it took.
//! Sold is not a stored state: the record is cleared in the same step.

use arrayvec::ArrayVec;
use log::{info, warn};
use thiserror::Error;

use crate::fields::{parse_tag_fields, FieldError, TagFields};
use crate::types::Location;

/// Device-resident tag record
#[derive(Debug, Clone, PartialEq)]
pub struct TagRecord {
    pub configured: bool,
    /// `-1` when unset
    pub id: i64,
    pub season: String,
    pub kind: String,
    pub location: Location,
    pub price: f64,
}

impl TagRecord {
    pub const UNSET_ID: i64 = -1;

    pub fn empty() -> Self {
        Self {
            configured: false,
            id: Self::UNSET_ID,
            season: String::new(),
            kind: String::new(),
            location: Location::Unset,
            price: 0.0,
        }
    }

    /// Reset every field in place.
    pub fn clear(&mut self) {
        self.configured = false;
        self.id = Self::UNSET_ID;
        self.season.clear();
        self.kind.clear();
        self.location = Location::Unset;
        self.price = 0.0;
    }
}

impl Default for TagRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// State projection of the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Empty,
    Warehouse,
    Store,
    /// Configured with a location the engine cannot advance from
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Button pressed with nothing held
    Idle,
    AfterSale,
    Unknown,
}

/// Outbound event produced by a lifecycle step
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Moved {
        record: TagRecord,
        from: Location,
        to: Location,
    },
    Sold {
        record: TagRecord,
    },
    Reset {
        id: Option<i64>,
        reason: ResetReason,
    },
}

/// Events from one `advance` (at most SOLD followed by RESET)
pub type LifecycleEvents = ArrayVec<LifecycleEvent, 2>;

/// Answer to a status query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagStatus<'a> {
    Empty,
    Data(&'a TagRecord),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    /// Configure while a tag is held
    #[error("tag {id} is still held; advance it before configuring another")]
    Occupied { id: i64 },
    #[error(transparent)]
    Malformed(#[from] FieldError),
    #[error("{0}")]
    Rejected(&'static str),
}

impl LifecycleError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, LifecycleError::Occupied { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagLifecycle {
    record: TagRecord,
}

impl TagLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &TagRecord {
        &self.record
    }

    pub fn is_configured(&self) -> bool {
        self.record.configured
    }

    pub fn state(&self) -> TagState {
        if !self.record.configured {
            return TagState::Empty;
        }
        match self.record.location {
            Location::Warehouse => TagState::Warehouse,
            Location::Store => TagState::Store,
            Location::Unset => TagState::Unknown,
        }
    }

    pub fn status(&self) -> TagStatus<'_> {
        if self.record.configured {
            TagStatus::Data(&self.record)
        } else {
            TagStatus::Empty
        }
    }

    /// Parse a `SET` payload and configure from it.
    pub fn configure_from_payload(&mut self, payload: &str) -> Result<i64, LifecycleError> {
        self.ensure_empty()?;
        let fields = parse_tag_fields(payload)?;
        self.configure(fields)
    }

    /// Populate the record. Nothing changes unless every check passes.
    pub fn configure(&mut self, fields: TagFields) -> Result<i64, LifecycleError> {
        self.ensure_empty()?;

        if fields.id < 0 {
            return Err(LifecycleError::Rejected("ID must be zero or positive"));
        }
        if fields.season.is_empty() || fields.kind.is_empty() || fields.location.is_empty() {
            return Err(LifecycleError::Rejected(
                "Temporada, Tipo and Ubicacion must not be empty",
            ));
        }

        let location = Location::from_wire(&fields.location);
        if location == Location::Unset {
            warn!(
                "[tag] ID={} has unrecognised location {:?}",
                fields.id, fields.location
            );
        }

        self.record = TagRecord {
            configured: true,
            id: fields.id,
            season: fields.season,
            kind: fields.kind,
            location,
            price: fields.price,
        };
        info!("[tag] configured ID={} at {:?}", self.record.id, location);
        Ok(self.record.id)
    }

    /// Take one lifecycle step (button press).
    pub fn advance(&mut self) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();

        match self.state() {
            TagState::Empty => {
                self.record.clear();
                events.push(LifecycleEvent::Reset {
                    id: None,
                    reason: ResetReason::Idle,
                });
            }
            TagState::Warehouse => {
                self.record.location = Location::Store;
                info!("[tag] ID={} moved to store", self.record.id);
                events.push(LifecycleEvent::Moved {
                    record: self.record.clone(),
                    from: Location::Warehouse,
                    to: Location::Store,
                });
            }
            TagState::Store => {
                let id = self.record.id;
                info!("[tag] ID={} sold", id);
                events.push(LifecycleEvent::Sold {
                    record: self.record.clone(),
                });
                self.record.clear();
                events.push(LifecycleEvent::Reset {
                    id: Some(id),
                    reason: ResetReason::AfterSale,
                });
            }
            TagState::Unknown => {
                let id = self.record.id;
                warn!("[tag] ID={} has no known location, resetting", id);
                self.record.clear();
                events.push(LifecycleEvent::Reset {
                    id: Some(id),
                    reason: ResetReason::Unknown,
                });
            }
        }

        events
    }

    fn ensure_empty(&self) -> Result<(), LifecycleError> {
        if self.record.configured {
            return Err(LifecycleError::Occupied {
                id: self.record.id,
            });
        }
        Ok(())
    }
}

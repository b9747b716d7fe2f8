//! Tolerant field extraction for `SET` payloads.
//!
//! Payloads look like JSON objects but come from hand-written server code, so they
//! are not parsed as JSON. Prices may use a decimal comma (`"Precio": "12,50"`),
//! which a JSON parser would reject. Instead each known key is located and its value
//! read directly:
//!
//! - keys may appear in any order,
//! - any whitespace may follow the `:`,
//! - a quoted value runs to its closing quote,
//! - a bare value runs to the next `,` or `}`.

use log::warn;
use thiserror::Error;

pub const FIELD_ID: &str = "ID";
pub const FIELD_SEASON: &str = "Temporada";
pub const FIELD_KIND: &str = "Tipo";
pub const FIELD_LOCATION: &str = "Ubicacion";
pub const FIELD_PRICE: &str = "Precio";

/// Typed fields of a `SET` command
#[derive(Debug, Clone, PartialEq)]
pub struct TagFields {
    pub id: i64,
    pub season: String,
    pub kind: String,
    pub location: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` has invalid value {value:?}")]
    Invalid { field: &'static str, value: String },
}

/// Raw value of `key`, or `None` when the key is absent.
///
/// Only an occurrence of `"key"` followed by `:` counts, so a value that happens to
/// spell a key name is skipped.
pub fn extract_field<'a>(payload: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{}\"", key);
    let mut search_from = 0;

    while let Some(pos) = payload[search_from..].find(&needle) {
        let after_key = search_from + pos + needle.len();
        search_from = after_key;

        let Some(rest) = payload[after_key..].trim_start().strip_prefix(':') else {
            continue;
        };
        return Some(read_value(rest.trim_start()));
    }

    None
}

fn read_value(rest: &str) -> &str {
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"').unwrap_or(quoted.len());
        return &quoted[..end];
    }
    let end = rest.find(|c| c == ',' || c == '}').unwrap_or(rest.len());
    rest[..end].trim()
}

/// Parse a decimal accepting either `.` or `,` as the fractional separator.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

/// Extract every `SET` field. Value checks beyond "it parses" (non-negative id,
/// non-empty strings) belong to the lifecycle engine.
///
/// The price never rejects a payload: a missing or unreadable `Precio` is stored
/// as `0.0`.
pub fn parse_tag_fields(payload: &str) -> Result<TagFields, FieldError> {
    let raw_id = extract_field(payload, FIELD_ID).ok_or(FieldError::Missing(FIELD_ID))?;
    let id = raw_id.trim().parse::<i64>().map_err(|_| FieldError::Invalid {
        field: FIELD_ID,
        value: raw_id.to_string(),
    })?;

    let string_field = |key: &'static str| -> Result<String, FieldError> {
        extract_field(payload, key)
            .map(|v| v.trim().to_string())
            .ok_or(FieldError::Missing(key))
    };
    let season = string_field(FIELD_SEASON)?;
    let kind = string_field(FIELD_KIND)?;
    let location = string_field(FIELD_LOCATION)?;

    let price = match extract_field(payload, FIELD_PRICE) {
        Some(raw) => parse_price(raw).unwrap_or_else(|| {
            warn!("[tag] ID={} has unreadable price {:?}, using 0", id, raw);
            0.0
        }),
        None => {
            warn!("[tag] ID={} has no price, using 0", id);
            0.0
        }
    };

    Ok(TagFields {
        id,
        season,
        kind,
        location,
        price,
    })
}

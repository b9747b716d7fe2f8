//! Dispatcher and line protocol, without a network

use serde::Deserialize;

use tagnode::adapter::{Dispatcher, LineBuffer};
use tagnode::core::TagLifecycle;
use tagnode::types::{DeviceRole, Identifier, PresenceEvent};

/// Tag snapshot as the server would decode it
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Temporada")]
    season: String,
    #[serde(rename = "Tipo")]
    kind: String,
    #[serde(rename = "Ubicacion")]
    location: String,
    #[serde(rename = "Precio")]
    price: f64,
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "To")]
    to: Option<String>,
}

fn entered(bytes: &[u8]) -> PresenceEvent {
    PresenceEvent::Entered(Identifier::new(bytes).unwrap())
}

#[test]
fn test_readuid_precedence() {
    let mut d = Dispatcher::new(DeviceRole::Door);

    assert!(d.handle_line("READUID r1", None).is_empty());
    assert_eq!(
        d.on_presence(&entered(&[0x0A, 0xFF])),
        Some("UID r1 0AFF".to_string())
    );

    // Disarmed after one answer
    assert_eq!(
        d.on_presence(&entered(&[0x0A, 0xFF])),
        Some("SCAN 0AFF".to_string())
    );
}

#[test]
fn test_later_readuid_replaces_earlier() {
    let mut d = Dispatcher::new(DeviceRole::Scanner);
    d.handle_line("READUID first", None);
    d.handle_line("READUID second", None);
    assert_eq!(d.pending().request_id, "second");
    assert_eq!(
        d.on_presence(&entered(&[0x01])),
        Some("UID second 01".to_string())
    );
}

#[test]
fn test_ping_per_role() {
    let mut door = Dispatcher::new(DeviceRole::Door);
    assert_eq!(
        door.handle_line("PING 1", None).as_slice(),
        &["PONG 1 NFC DOOR".to_string()]
    );

    let mut scanner = Dispatcher::new(DeviceRole::Scanner);
    assert_eq!(
        scanner.handle_line("PING 2", None).as_slice(),
        &["PONG 2 NFC BOX".to_string()]
    );

    let mut station = Dispatcher::new(DeviceRole::TagStation);
    let mut tag = TagLifecycle::new();
    assert_eq!(
        station.handle_line("PING 3", Some(&mut tag)).as_slice(),
        &["PONG 3 TAG STATION".to_string(), "EMPTY".to_string()]
    );
}

#[test]
fn test_set_ack_nack_and_status() {
    let mut station = Dispatcher::new(DeviceRole::TagStation);
    let mut tag = TagLifecycle::new();

    let set = r#"SET {"ID":5,"Temporada":"otoño","Tipo":"bufanda","Ubicacion":"almacén","Precio":"12,50"}"#;
    assert_eq!(
        station.handle_line(set, Some(&mut tag)).as_slice(),
        &["ACK ID=5".to_string()]
    );
    assert_eq!(
        station.handle_line(set, Some(&mut tag)).as_slice(),
        &["NACK".to_string()]
    );

    let replies = station.handle_line("PING 9", Some(&mut tag));
    assert_eq!(replies.len(), 2);
    let json = replies[1].strip_prefix("DATA ").unwrap();
    let snapshot: Snapshot = serde_json::from_str(json).unwrap();
    assert_eq!(snapshot.id, 5);
    assert_eq!(snapshot.season, "otoño");
    assert_eq!(snapshot.kind, "bufanda");
    assert_eq!(snapshot.location, "almacén");
    assert!((snapshot.price - 12.5).abs() < 1e-9);
    assert!(snapshot.from.is_none());
}

#[test]
fn test_set_without_price_is_acknowledged() {
    let mut station = Dispatcher::new(DeviceRole::TagStation);
    let mut tag = TagLifecycle::new();
    let set = r#"SET {"ID":1,"Temporada":"a","Tipo":"b","Ubicacion":"almacén"}"#;
    assert_eq!(
        station.handle_line(set, Some(&mut tag)).as_slice(),
        &["ACK ID=1".to_string()]
    );
    assert_eq!(tag.record().price, 0.0);
}

#[test]
fn test_move_snapshot_decodes() {
    let station = Dispatcher::new(DeviceRole::TagStation);
    let mut tag = TagLifecycle::new();
    tag.configure_from_payload(
        r#"{"ID":8,"Temporada":"verano","Tipo":"gorra","Ubicacion":"almacén","Precio":8}"#,
    )
    .unwrap();

    let out = station.on_lifecycle_events(&tag.advance());
    let json = out[0].strip_prefix("MOVE ").unwrap();
    let snapshot: Snapshot = serde_json::from_str(json).unwrap();
    assert_eq!(snapshot.location, "tienda");
    assert_eq!(snapshot.from.as_deref(), Some("almacén"));
    assert_eq!(snapshot.to.as_deref(), Some("tienda"));
}

#[test]
fn test_unknown_and_malformed_lines_are_ignored() {
    let mut d = Dispatcher::new(DeviceRole::Door);
    assert!(d.handle_line("DOOR OK 0AFF", None).is_empty());
    assert!(d.handle_line("PING", None).is_empty());
    assert!(d.handle_line("   ", None).is_empty());
    assert!(!d.pending().is_active());
}

#[test]
fn test_framing_handles_split_and_crlf() {
    let mut buf = LineBuffer::new();
    assert!(buf.push_bytes(b"PI").is_empty());
    assert_eq!(buf.push_bytes(b"NG 1\r\nREAD"), vec!["PING 1".to_string()]);
    assert_eq!(buf.push_bytes(b"UID 2\n"), vec!["READUID 2".to_string()]);
    assert_eq!(buf.pending_len(), 0);
}

#[test]
fn test_framing_drops_overlong_line() {
    let mut buf = LineBuffer::with_max_len(8);
    assert!(buf.push_bytes(b"0123456789").is_empty());
    assert!(buf.push_bytes(b"abc").is_empty());
    assert_eq!(buf.push_bytes(b"\nPING 1\n"), vec!["PING 1".to_string()]);
}

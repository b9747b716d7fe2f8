//! Tag lifecycle engine through its public API

use tagnode::adapter::format_lifecycle_event;
use tagnode::core::{LifecycleError, LifecycleEvent, ResetReason, TagLifecycle, TagState, TagStatus};
use tagnode::types::Location;

const WAREHOUSE_SET: &str =
    r#"{"ID": 21, "Temporada": "invierno", "Tipo": "abrigo", "Ubicacion": "almacén", "Precio": "59,90"}"#;

fn lines(events: &[LifecycleEvent]) -> Vec<String> {
    events.iter().map(format_lifecycle_event).collect()
}

#[test]
fn test_configure_on_empty_commits() {
    let mut tag = TagLifecycle::new();
    assert_eq!(tag.configure_from_payload(WAREHOUSE_SET), Ok(21));
    assert_eq!(tag.state(), TagState::Warehouse);

    let record = tag.record();
    assert!(record.configured);
    assert_eq!(record.season, "invierno");
    assert_eq!(record.kind, "abrigo");
    assert_eq!(record.location, Location::Warehouse);
    assert!((record.price - 59.9).abs() < 1e-9);
}

#[test]
fn test_configure_when_occupied_changes_nothing() {
    let mut tag = TagLifecycle::new();
    tag.configure_from_payload(WAREHOUSE_SET).unwrap();
    let before = tag.record().clone();

    let other = r#"{"ID":22,"Temporada":"verano","Tipo":"falda","Ubicacion":"tienda","Precio":10}"#;
    let err = tag.configure_from_payload(other).unwrap_err();
    assert_eq!(err, LifecycleError::Occupied { id: 21 });
    assert!(err.is_invalid_transition());
    assert_eq!(tag.record(), &before);
}

#[test]
fn test_round_trip() {
    let mut tag = TagLifecycle::new();
    tag.configure_from_payload(WAREHOUSE_SET).unwrap();

    // Warehouse -> Store
    let first = tag.advance();
    assert_eq!(tag.state(), TagState::Store);
    let out = lines(&first);
    assert_eq!(out.len(), 1);
    assert!(out[0].starts_with("MOVE {"));
    assert!(out[0].contains(r#""From":"almacén","To":"tienda""#));

    // Store -> sold -> Empty
    let second = tag.advance();
    assert_eq!(tag.state(), TagState::Empty);
    let out = lines(&second);
    assert_eq!(out.len(), 2);
    assert!(out[0].starts_with("SOLD {"));
    assert!(out[0].contains(r#""ID":21"#));
    assert_eq!(out[1], "RESET ID=21 AFTER_SALE");

    // Empty: plain RESET only
    let third = tag.advance();
    assert_eq!(
        third.as_slice(),
        &[LifecycleEvent::Reset {
            id: None,
            reason: ResetReason::Idle
        }]
    );
    assert_eq!(lines(&third), vec!["RESET".to_string()]);
}

#[test]
fn test_sold_tag_can_be_configured_again() {
    let mut tag = TagLifecycle::new();
    tag.configure_from_payload(WAREHOUSE_SET).unwrap();
    tag.advance();
    tag.advance();
    assert_eq!(tag.status(), TagStatus::Empty);
    assert_eq!(tag.configure_from_payload(WAREHOUSE_SET), Ok(21));
}

#[test]
fn test_rejected_payloads_leave_tag_empty() {
    let bad = [
        r#"{"ID":-1,"Temporada":"a","Tipo":"b","Ubicacion":"almacén","Precio":1}"#,
        r#"{"ID":1,"Temporada":"","Tipo":"b","Ubicacion":"almacén","Precio":1}"#,
        r#"{"ID":1,"Temporada":"a","Ubicacion":"almacén","Precio":1}"#,
        r#"{"ID":"uno","Temporada":"a","Tipo":"b","Ubicacion":"almacén"}"#,
        "not json at all",
    ];
    for payload in bad {
        let mut tag = TagLifecycle::new();
        assert!(tag.configure_from_payload(payload).is_err(), "{}", payload);
        assert_eq!(tag.state(), TagState::Empty, "{}", payload);
    }
}

#[test]
fn test_price_is_not_required() {
    for payload in [
        r#"{"ID":1,"Temporada":"a","Tipo":"b","Ubicacion":"almacén"}"#,
        r#"{"ID":1,"Temporada":"a","Tipo":"b","Ubicacion":"almacén","Precio":"gratis"}"#,
    ] {
        let mut tag = TagLifecycle::new();
        assert_eq!(tag.configure_from_payload(payload), Ok(1), "{}", payload);
        assert_eq!(tag.state(), TagState::Warehouse);
        assert_eq!(tag.record().price, 0.0);
    }
}

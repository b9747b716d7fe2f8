use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagnode::adapter::Dispatcher;
use tagnode::core::{parse_tag_fields, PresenceDebouncer, TagLifecycle};
use tagnode::types::{DeviceRole, Identifier, PresenceSample};

const SET_PAYLOAD: &str =
    r#"{"ID": 21, "Temporada": "invierno", "Tipo": "abrigo", "Ubicacion": "almacén", "Precio": "59,90"}"#;

fn bench_debounce(c: &mut Criterion) {
    let id = Identifier::new(&[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]).unwrap();
    let present = PresenceSample::present(id);
    let absent = PresenceSample::absent();

    c.bench_function("debounce_observe_50ms", |b| {
        let mut debouncer = PresenceDebouncer::new();
        let mut t = 0u64;
        b.iter(|| {
            t += 50;
            // Present for 500 ms, absent for 500 ms
            let sample = if (t / 500) % 2 == 0 { &present } else { &absent };
            black_box(debouncer.observe(sample, t));
        })
    });
}

fn bench_set_parse(c: &mut Criterion) {
    c.bench_function("parse_set_fields", |b| {
        b.iter(|| parse_tag_fields(black_box(SET_PAYLOAD)))
    });
}

fn bench_station_round_trip(c: &mut Criterion) {
    let mut dispatcher = Dispatcher::new(DeviceRole::TagStation);

    c.bench_function("station_set_move_sell", |b| {
        b.iter(|| {
            let mut tag = TagLifecycle::new();
            let set = format!("SET {}", SET_PAYLOAD);
            black_box(dispatcher.handle_line(&set, Some(&mut tag)));
            for _ in 0..2 {
                let events = tag.advance();
                black_box(dispatcher.on_lifecycle_events(&events));
            }
        })
    });
}

fn bench_ping(c: &mut Criterion) {
    let mut dispatcher = Dispatcher::new(DeviceRole::Door);

    c.bench_function("door_ping", |b| {
        b.iter(|| dispatcher.handle_line(black_box("PING 12345"), None))
    });
}

criterion_group!(
    benches,
    bench_debounce,
    bench_set_parse,
    bench_station_round_trip,
    bench_ping
);
criterion_main!(benches);

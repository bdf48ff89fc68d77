use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shapepack::io::buffer::SegmentBuffer;
use shapepack::registry::Shaped;
use shapepack::{CacheOptions, ConverterCache};
use shapepack_derive::MsgShape;

#[derive(Clone, PartialEq, MsgShape)]
#[msgpack(layout = "map")]
struct Contact {
    #[msgpack(name = "name")]
    name: String,
    #[msgpack(name = "age")]
    age: u32,
    #[msgpack(name = "tags", default)]
    tags: Vec<String>,
}

impl Default for Contact {
    fn default() -> Self {
        Contact { name: String::new(), age: 0, tags: Vec::new() }
    }
}

fn object_round_trip(c: &mut Criterion) {
    let cache = ConverterCache::new();
    let converter = Contact::converter(&cache);
    let value = Contact { name: "Ada Lovelace".to_string(), age: 36, tags: vec!["math".into(), "computing".into()] };

    c.bench_function("object_roundtrip/write_contact", |b| {
        b.iter(|| {
            let mut ctx = shapepack::SerializeContext::default();
            let mut buf = SegmentBuffer::new();
            converter.write(&mut ctx, &mut buf, black_box(&value)).unwrap();
            black_box(buf);
        })
    });

    let mut ctx = shapepack::SerializeContext::default();
    let mut encoded = SegmentBuffer::new();
    converter.write(&mut ctx, &mut encoded, &value).unwrap();
    let bytes = encoded.drain_to_vec();
    let _ = CacheOptions::default();

    c.bench_function("object_roundtrip/read_contact", |b| {
        b.iter(|| {
            let mut ctx = shapepack::SerializeContext::default();
            let mut buf = SegmentBuffer::new();
            buf.extend_from_slice(&bytes);
            let decoded = converter.read(&mut ctx, &mut buf).unwrap();
            black_box(decoded);
        })
    });
}

criterion_group!(benches, object_round_trip);
criterion_main!(benches);

//! End-to-end scenarios exercising the public surface the way a consumer
//! actually would: derive a shape, serialize, and decode it back, rather
//! than poking individual converters in isolation (that's what the unit
//! tests alongside each module already cover).

use shapepack::builtin::scalar::ScalarConverter;
use shapepack::bulk::{read_bulk_array, write_bulk_array};
use shapepack::io::buffer::SegmentBuffer;
use shapepack::io::buffered_reader::BufferedReader;
use shapepack::io::writer::StreamWriter;
use shapepack::object::unused_data::UnusedDataPacket;
use shapepack::registry::Shaped;
use shapepack::union::{UnionAlternativeBinding, UnionConverter};
use shapepack::{CacheOptions, ConverterCache, Converter, SerializeContext};
use shapepack_derive::MsgShape;

fn roundtrip_bytes<T: Shaped + Clone>(cache: &ConverterCache, value: &T) -> (Vec<u8>, T) {
    let converter = T::converter(cache);
    let mut ctx = SerializeContext::default();
    let mut buf = SegmentBuffer::new();
    converter.write(&mut ctx, &mut buf, value).unwrap();
    let bytes = buf.drain_to_vec();

    let mut ctx = SerializeContext::default();
    let mut replay = SegmentBuffer::new();
    replay.extend_from_slice(&bytes);
    let decoded = converter.read(&mut ctx, &mut replay).unwrap();
    (bytes, decoded)
}

// S1 — a property-map object elides properties still holding their default
// value, leaving only the properties that were actually set.
#[derive(Clone, Debug, PartialEq, MsgShape)]
#[msgpack(layout = "map")]
struct PersonMap {
    #[msgpack(name = "name")]
    name: String,
    #[msgpack(name = "nickname", default)]
    nickname: String,
}

impl Default for PersonMap {
    fn default() -> Self {
        PersonMap { name: String::new(), nickname: String::new() }
    }
}

#[test]
fn s1_map_layout_elides_default_valued_properties() {
    let cache = ConverterCache::new();
    let value = PersonMap { name: "Ada".to_string(), nickname: String::new() };
    let (bytes, decoded) = roundtrip_bytes(&cache, &value);
    assert_eq!(decoded, value);

    let mut buf = SegmentBuffer::new();
    buf.extend_from_slice(&bytes);
    let mut reader = BufferedReader::new(&mut buf);
    assert_eq!(reader.read_map_header().unwrap(), 1);
    assert_eq!(reader.read_string().unwrap(), "name");
    assert_eq!(reader.read_string().unwrap(), "Ada");
}

// S2 — a keyed-array object written by a schema with an extra trailing
// field (a newer version) is still readable by a schema that only knows
// the shared prefix: positions beyond the reader's own field count are
// captured into its unused-data packet instead of aborting the decode.
#[derive(Clone, Debug, PartialEq, MsgShape)]
#[msgpack(layout = "array")]
struct OrderV1 {
    #[msgpack(name = "sku")]
    sku: String,
    #[msgpack(name = "quantity")]
    quantity: u32,
    #[msgpack(unused_data)]
    unused: UnusedDataPacket,
}

impl Default for OrderV1 {
    fn default() -> Self {
        OrderV1 { sku: String::new(), quantity: 0, unused: UnusedDataPacket::new() }
    }
}

#[derive(Clone, Debug, PartialEq, MsgShape)]
#[msgpack(layout = "array")]
struct OrderV2 {
    #[msgpack(name = "sku")]
    sku: String,
    #[msgpack(name = "quantity")]
    quantity: u32,
    #[msgpack(name = "discount_code")]
    discount_code: String,
}

impl Default for OrderV2 {
    fn default() -> Self {
        OrderV2 { sku: String::new(), quantity: 0, discount_code: String::new() }
    }
}

#[test]
fn s2_array_layout_tolerates_a_newer_trailing_field() {
    let cache = ConverterCache::new();
    let v2 = OrderV2 { sku: "WIDGET-1".to_string(), quantity: 4, discount_code: "SPRING".to_string() };
    let converter_v2 = OrderV2::converter(&cache);
    let mut ctx = SerializeContext::default();
    let mut buf = SegmentBuffer::new();
    converter_v2.write(&mut ctx, &mut buf, &v2).unwrap();
    let bytes = buf.drain_to_vec();

    let converter_v1 = OrderV1::converter(&cache);
    let mut ctx = SerializeContext::default();
    let mut replay = SegmentBuffer::new();
    replay.extend_from_slice(&bytes);
    let v1 = converter_v1.read(&mut ctx, &mut replay).unwrap();

    assert_eq!(v1.sku, "WIDGET-1");
    assert_eq!(v1.quantity, 4);
    assert_eq!(v1.unused.entries().len(), 1);
}

// S3 — bulk bool encoding produces the exact expected bytes: an array
// header followed by one single-byte token per element.
#[test]
fn s3_bulk_bool_array_is_byte_exact() {
    let mut buf = SegmentBuffer::new();
    write_bulk_array(&mut buf, &[true, false, true]);
    let bytes = buf.drain_to_vec();
    assert_eq!(bytes, vec![0x93, 0xc3, 0xc2, 0xc3]);
}

// S4 — integers always take the shortest MessagePack form that round-trips
// them.
#[test]
fn s4_integers_use_minimal_encoded_form() {
    let mut buf = SegmentBuffer::new();
    StreamWriter::new(&mut buf).write_integer(130);
    assert_eq!(buf.drain_to_vec(), vec![0xcc, 130]);

    let mut buf = SegmentBuffer::new();
    StreamWriter::new(&mut buf).write_integer(-1);
    assert_eq!(buf.drain_to_vec(), vec![0xff]);

    let mut buf = SegmentBuffer::new();
    StreamWriter::new(&mut buf).write_integer(256);
    assert_eq!(buf.drain_to_vec(), vec![0xcd, 0x01, 0x00]);
}

// S5 — a union alternative identified by an integer alias round-trips
// independently from the declared base type (discriminated by `Nil`).
#[derive(Debug, Clone, PartialEq)]
enum Pet {
    Unspecified(String),
    Dog(String),
    Cat(String),
}

fn pet_converter() -> UnionConverter<Pet> {
    UnionConverter::new(
        vec![
            UnionAlternativeBinding {
                alias: shapepack::shape::Alias::Base,
                matches: |p| matches!(p, Pet::Unspecified(_)),
                write_payload: |_ctx, buffer, value| {
                    let Pet::Unspecified(name) = value else { unreachable!() };
                    StreamWriter::new(buffer).write_string(name);
                    Ok(())
                },
                construct: |_ctx, buffer| Ok(Pet::Unspecified(BufferedReader::new(buffer).read_string()?)),
            },
            UnionAlternativeBinding {
                alias: shapepack::shape::Alias::Integer(1),
                matches: |p| matches!(p, Pet::Dog(_)),
                write_payload: |_ctx, buffer, value| {
                    let Pet::Dog(name) = value else { unreachable!() };
                    StreamWriter::new(buffer).write_string(name);
                    Ok(())
                },
                construct: |_ctx, buffer| Ok(Pet::Dog(BufferedReader::new(buffer).read_string()?)),
            },
            UnionAlternativeBinding {
                alias: shapepack::shape::Alias::Integer(2),
                matches: |p| matches!(p, Pet::Cat(_)),
                write_payload: |_ctx, buffer, value| {
                    let Pet::Cat(name) = value else { unreachable!() };
                    StreamWriter::new(buffer).write_string(name);
                    Ok(())
                },
                construct: |_ctx, buffer| Ok(Pet::Cat(BufferedReader::new(buffer).read_string()?)),
            },
        ],
        vec![],
    )
}

#[test]
fn s5_union_dispatches_by_integer_alias_and_nil_base() {
    let conv = pet_converter();
    let mut ctx = SerializeContext::default();

    for value in [Pet::Unspecified("Rex".to_string()), Pet::Dog("Fido".to_string()), Pet::Cat("Tom".to_string())] {
        let mut buf = SegmentBuffer::new();
        conv.write(&mut ctx, &mut buf, &value).unwrap();
        assert_eq!(conv.read(&mut ctx, &mut buf).unwrap(), value);
    }

    let mut buf = SegmentBuffer::new();
    conv.write(&mut ctx, &mut buf, &Pet::Dog("Fido".to_string())).unwrap();
    let bytes = buf.drain_to_vec();
    let mut replay = SegmentBuffer::new();
    replay.extend_from_slice(&bytes);
    let mut reader = BufferedReader::new(&mut replay);
    assert_eq!(reader.read_array_header().unwrap(), 2);
    assert_eq!(reader.read_i64().unwrap(), 1);
}

// S6 — version safety: a field an older schema doesn't know about survives
// a decode/re-encode cycle through that older schema via its unused-data
// packet, and is visible again once a schema that does know about it reads
// the result.
#[derive(Clone, Debug, PartialEq, MsgShape)]
#[msgpack(layout = "map")]
struct ContactV1 {
    #[msgpack(name = "name")]
    name: String,
    #[msgpack(name = "last_name")]
    last_name: String,
    #[msgpack(unused_data)]
    unused: UnusedDataPacket,
}

impl Default for ContactV1 {
    fn default() -> Self {
        ContactV1 { name: String::new(), last_name: String::new(), unused: UnusedDataPacket::new() }
    }
}

#[derive(Clone, Debug, PartialEq, MsgShape)]
#[msgpack(layout = "map")]
struct ContactV2 {
    #[msgpack(name = "name")]
    name: String,
    #[msgpack(name = "last_name")]
    last_name: String,
    #[msgpack(name = "age")]
    age: u32,
}

impl Default for ContactV2 {
    fn default() -> Self {
        ContactV2 { name: String::new(), last_name: String::new(), age: 0 }
    }
}

#[test]
fn s6_unknown_field_survives_a_round_trip_through_an_older_schema() {
    let cache = ConverterCache::new();
    let original = ContactV2 { name: "Grace".to_string(), last_name: "Hopper".to_string(), age: 85 };

    let converter_v2 = ContactV2::converter(&cache);
    let mut ctx = SerializeContext::default();
    let mut buf = SegmentBuffer::new();
    converter_v2.write(&mut ctx, &mut buf, &original).unwrap();
    let encoded_v2 = buf.drain_to_vec();

    let converter_v1 = ContactV1::converter(&cache);
    let mut ctx = SerializeContext::default();
    let mut replay = SegmentBuffer::new();
    replay.extend_from_slice(&encoded_v2);
    let mut as_v1 = converter_v1.read(&mut ctx, &mut replay).unwrap();
    assert_eq!(as_v1.unused.entries().len(), 1);

    as_v1.last_name = "Hopper-Murray".to_string();

    let mut ctx = SerializeContext::default();
    let mut buf = SegmentBuffer::new();
    converter_v1.write(&mut ctx, &mut buf, &as_v1).unwrap();
    let re_encoded = buf.drain_to_vec();

    let mut ctx = SerializeContext::default();
    let mut replay = SegmentBuffer::new();
    replay.extend_from_slice(&re_encoded);
    let roundtripped = converter_v2.read(&mut ctx, &mut replay).unwrap();

    assert_eq!(roundtripped.name, "Grace");
    assert_eq!(roundtripped.last_name, "Hopper-Murray");
    assert_eq!(roundtripped.age, 85);
}

#[test]
fn public_api_serialize_deserialize_round_trips_a_scalar() {
    let converter = ScalarConverter::<i64>::new();
    let bytes = shapepack::api::serialize(&converter, &-42i64, CacheOptions::default()).unwrap();
    let value: i64 = shapepack::api::deserialize(&converter, &bytes, CacheOptions::default()).unwrap();
    assert_eq!(value, -42);
}

#[test]
fn bulk_u32_array_round_trips_through_the_public_api() {
    let mut buf = SegmentBuffer::new();
    let values: Vec<u32> = vec![1, 2, 3, 1000];
    write_bulk_array(&mut buf, &values);
    let decoded: Vec<u32> = read_bulk_array(&mut buf).unwrap();
    assert_eq!(decoded, values);
}

use super::*;
use crate::buffer::WriteBuffer;
use crate::error::ProtocolError;
use crate::ttype::TType;
use crate::value::{FieldValue, ListValue, MapValue, SetValue, StructValue, Value};

fn encode(value: &Value) -> Vec<u8> {
    serialize_value(value)
}

fn decode(ttype: TType, bytes: &[u8]) -> Value {
    deserialize_value(ttype, bytes).unwrap()
}

fn assert_round_trip(value: Value, bytes: &[u8]) {
    assert_eq!(encode(&value), bytes);
    assert_eq!(decode(value.ttype(), bytes), value);
}

#[test]
fn primitives_are_big_endian() {
    assert_round_trip(Value::Bool(true), &[0x01]);
    assert_round_trip(Value::Bool(false), &[0x00]);
    assert_round_trip(Value::Byte(-1), &[0xff]);
    assert_round_trip(Value::I16(258), &[0x01, 0x02]);
    assert_round_trip(Value::I16(-1), &[0xff, 0xff]);
    assert_round_trip(Value::I32(65537), &[0x00, 0x01, 0x00, 0x01]);
    assert_round_trip(
        Value::I64(4611686018427387904),
        &[0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
    assert_round_trip(
        Value::Double(1.0),
        &[0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
}

#[test]
fn double_is_ieee_754_bits() {
    let bytes = encode(&Value::Double(1.0000000001));
    assert_eq!(f64::from_be_bytes(bytes.try_into().unwrap()), 1.0000000001);
}

#[test]
fn binary_is_length_prefixed() {
    assert_round_trip(
        Value::Binary(b"hello".to_vec()),
        &[0x00, 0x00, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o'],
    );
    assert_round_trip(Value::Binary(vec![]), &[0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn struct_with_string_field() {
    // struct { 1: required string name = "Hi" }
    let value = Value::Struct(StructValue::new(vec![FieldValue {
        id: 1,
        ttype: TType::Binary,
        value: Value::Binary(b"Hi".to_vec()),
    }]));
    assert_round_trip(
        value,
        &[0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x48, 0x69, 0x00],
    );
}

#[test]
fn list_of_strings() {
    let value = Value::List(ListValue {
        value_ttype: TType::Binary,
        values: vec![
            Value::Binary(b"a".to_vec()),
            Value::Binary(b"bb".to_vec()),
        ],
    });
    assert_round_trip(
        value,
        &[
            0x0B, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x61, 0x00, 0x00, 0x00, 0x02,
            0x62, 0x62,
        ],
    );
}

#[test]
fn map_layout() {
    let value = Value::Map(MapValue {
        key_ttype: TType::Byte,
        value_ttype: TType::I16,
        pairs: vec![(Value::Byte(1), Value::I16(2))],
    });
    assert_round_trip(value, &[0x03, 0x06, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x02]);
}

#[test]
fn set_layout() {
    let value = Value::Set(SetValue {
        value_ttype: TType::I32,
        values: vec![Value::I32(1234), Value::I32(4567)],
    });
    assert_round_trip(
        value,
        &[
            0x08, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x04, 0xd2, 0x00, 0x00, 0x11, 0xd7,
        ],
    );
}

#[test]
fn nested_struct_round_trips() {
    let inner = Value::Struct(StructValue::new(vec![FieldValue {
        id: 1,
        ttype: TType::I32,
        value: Value::I32(7),
    }]));
    let outer = Value::Struct(StructValue::new(vec![
        FieldValue {
            id: 1,
            ttype: TType::Struct,
            value: inner,
        },
        FieldValue {
            id: 2,
            ttype: TType::Bool,
            value: Value::Bool(true),
        },
    ]));
    let bytes = encode(&outer);
    assert_eq!(decode(TType::Struct, &bytes), outer);
}

#[test]
fn truncated_input_fails() {
    assert_eq!(
        deserialize_value(TType::I32, &[0x00, 0x01]),
        Err(ProtocolError::EndOfInput {
            expected: 4,
            got: 2
        })
    );
    // Binary claiming more bytes than remain.
    assert_eq!(
        deserialize_value(TType::Binary, &[0x00, 0x00, 0x00, 0x05, b'h', b'i']),
        Err(ProtocolError::EndOfInput {
            expected: 5,
            got: 2
        })
    );
}

#[test]
fn unknown_type_code_in_struct_fails() {
    // Field claims type 5, which is not a TType.
    let result = deserialize_value(TType::Struct, &[0x05, 0x00, 0x01, 0x00]);
    assert_eq!(result, Err(ProtocolError::UnknownTType(5)));
}

#[test]
fn skip_fixed_width() {
    let mut reader = BinaryReader::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xff]);
    reader.skip(TType::I64).unwrap();
    assert_eq!(reader.read_byte().unwrap(), -1);
}

#[test]
fn skip_matches_read_for_every_type() {
    let values = [
        Value::Bool(true),
        Value::Byte(5),
        Value::Double(2.5),
        Value::I16(-3),
        Value::I32(1 << 20),
        Value::I64(-1),
        Value::Binary(b"payload".to_vec()),
        Value::Struct(StructValue::new(vec![FieldValue {
            id: 4,
            ttype: TType::List,
            value: Value::List(ListValue {
                value_ttype: TType::Binary,
                values: vec![Value::Binary(b"x".to_vec())],
            }),
        }])),
        Value::Map(MapValue {
            key_ttype: TType::I32,
            value_ttype: TType::Binary,
            pairs: vec![(Value::I32(1), Value::Binary(b"one".to_vec()))],
        }),
        Value::Set(SetValue {
            value_ttype: TType::Byte,
            values: vec![Value::Byte(9)],
        }),
    ];

    for value in values {
        let mut bytes = encode(&value);
        bytes.push(0xAB); // trailing marker
        let mut reader = BinaryReader::new(&bytes);
        reader.skip(value.ttype()).unwrap();
        assert_eq!(reader.read_byte().unwrap(), 0xABu8 as i8, "{value:?}");
    }
}

#[test]
fn strict_message_round_trips() {
    // getFoo, CALL, seqid 10, no body.
    let header = MessageHeader {
        name: "getFoo".to_string(),
        kind: MessageKind::Call,
        seqid: 10,
    };
    let mut buffer = WriteBuffer::new();
    let mut writer = BinaryWriter::new(&mut buffer);
    writer.write_message_begin(&header);
    writer.write_struct_end();

    assert_eq!(
        buffer.value(),
        &[
            0x80, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x67, 0x65, 0x74, 0x46, 0x6F, 0x6F,
            0x00, 0x00, 0x00, 0x0A, 0x00,
        ]
    );

    let mut reader = BinaryReader::new(buffer.value());
    assert_eq!(reader.read_message_begin().unwrap(), header);
}

#[test]
fn non_strict_message_is_readable() {
    let bytes = [
        0x00, 0x00, 0x00, 0x06, 0x67, 0x65, 0x74, 0x46, 0x6F, 0x6F, 0x01, 0x00, 0x00, 0x00, 0x0A,
        0x00,
    ];
    let mut reader = BinaryReader::new(&bytes);
    let header = reader.read_message_begin().unwrap();
    assert_eq!(header.name, "getFoo");
    assert_eq!(header.kind, MessageKind::Call);
    assert_eq!(header.seqid, 10);
    // The body (empty struct) follows.
    assert_eq!(reader.read_field_begin().unwrap(), None);
}

#[test]
fn strict_message_bad_version_fails() {
    // Version nibble 2 instead of 1.
    let bytes = [0x80, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    let mut reader = BinaryReader::new(&bytes);
    assert_eq!(
        reader.read_message_begin(),
        Err(ProtocolError::UnsupportedVersion(2))
    );
}

#[test]
fn message_kinds_round_trip() {
    for kind in [
        MessageKind::Call,
        MessageKind::Reply,
        MessageKind::Exception,
        MessageKind::Oneway,
    ] {
        let header = MessageHeader {
            name: "f".to_string(),
            kind,
            seqid: -1,
        };
        let mut buffer = WriteBuffer::new();
        BinaryWriter::new(&mut buffer).write_message_begin(&header);
        let decoded = BinaryReader::new(buffer.value())
            .read_message_begin()
            .unwrap();
        assert_eq!(decoded, header);
    }
}

#[test]
fn field_begin_sentinel() {
    let mut reader = BinaryReader::new(&[0x08, 0x00, 0x07, 0x00]);
    assert_eq!(
        reader.read_field_begin().unwrap(),
        Some(FieldHeader { ttype: 8, id: 7 })
    );
    // Struct end after skipping the field would follow; here we read it raw.
}

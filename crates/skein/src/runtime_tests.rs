//! Serialization behavior of linked modules: wire images, round trips,
//! message envelopes, and validation failures.

use indoc::indoc;

use skein_wire::{serialize_value, MessageKind};

use crate::{loads, Error, Module, Primitive, Value, ValueError};

fn kv_module() -> Module {
    loads(
        "kv",
        indoc! {r#"
            exception KeyDoesNotExist { 1: optional string message }

            service KeyValue {
                string getValue(1: string key) throws (1: KeyDoesNotExist notFound)
                void putValue(1: string key, 2: string value)
                oneway void ping()
            }
        "#},
    )
    .unwrap()
}

#[test]
fn i32_wire_image() {
    let module = loads("test", "struct S { 1: required i32 x }").unwrap();
    let value = module
        .instantiate("S", vec![("x", Value::I32(65537))])
        .unwrap();
    assert_eq!(
        module.dumps(&value).unwrap(),
        [0x08, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00]
    );
}

#[test]
fn required_string_wire_image() {
    let module = loads("test", "struct S { 1: required string name }").unwrap();
    let value = module.instantiate("S", vec![("name", "Hi".into())]).unwrap();
    assert_eq!(
        module.dumps(&value).unwrap(),
        [0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x48, 0x69, 0x00]
    );
    assert_eq!(module.loads("S", &module.dumps(&value).unwrap()).unwrap(), value);
}

#[test]
fn list_of_strings_wire_image() {
    let module = loads("test", "struct S { 1: required list<string> items }").unwrap();
    let value = module
        .instantiate(
            "S",
            vec![(
                "items",
                Value::List(vec!["a".into(), "bb".into()]),
            )],
        )
        .unwrap();
    let bytes = module.dumps(&value).unwrap();
    // Field header, then the list image, then struct end.
    assert_eq!(
        &bytes[3..],
        [
            0x0B, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x61, 0x00, 0x00, 0x00, 0x02,
            0x62, 0x62, 0x00,
        ]
        .as_slice()
    );
}

#[test]
fn every_primitive_round_trips() {
    let module = loads(
        "test",
        indoc! {r#"
            struct All {
                1: optional bool flag
                2: optional byte tiny
                3: optional i16 small
                4: optional i32 medium
                5: optional i64 large
                6: optional double real
                7: optional string text
                8: optional binary blob
            }
        "#},
    )
    .unwrap();

    let value = module
        .instantiate(
            "All",
            vec![
                ("flag", true.into()),
                ("tiny", Value::Byte(-4)),
                ("small", Value::I16(-1000)),
                ("medium", Value::I32(1 << 20)),
                ("large", Value::I64(1 << 40)),
                ("real", 2.5.into()),
                ("text", "héllo".into()),
                ("blob", Value::Binary(vec![0, 255, 7])),
            ],
        )
        .unwrap();
    let bytes = module.dumps(&value).unwrap();
    assert_eq!(module.loads("All", &bytes).unwrap(), value);
}

#[test]
fn containers_round_trip() {
    let module = loads(
        "test",
        indoc! {r#"
            struct S {
                1: optional map<i32, list<string>> index
                2: optional set<i64> ids
            }
        "#},
    )
    .unwrap();

    let value = module
        .instantiate(
            "S",
            vec![
                (
                    "index",
                    Value::Map(vec![(
                        Value::I32(1),
                        Value::List(vec!["a".into(), "b".into()]),
                    )]),
                ),
                ("ids", Value::Set(vec![Value::I64(10), Value::I64(20)])),
            ],
        )
        .unwrap();
    let bytes = module.dumps(&value).unwrap();
    assert_eq!(module.loads("S", &bytes).unwrap(), value);
}

#[test]
fn sets_deduplicate_on_read() {
    let module = loads("test", "struct S { 1: required set<i32> ids }").unwrap();
    // A wire image holding [1, 1, 2]: set header inside field 1.
    let bytes = [
        0x0E, 0x00, 0x01, // field 1: set
        0x08, 0x00, 0x00, 0x00, 0x03, // i32 x3
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00,
    ];
    let value = module.loads("S", &bytes).unwrap();
    match &value {
        Value::Struct(s) => assert_eq!(
            s.get("ids"),
            Some(&Value::Set(vec![Value::I32(1), Value::I32(2)]))
        ),
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn to_wire_matches_direct_write() {
    let module = loads(
        "test",
        "struct S { 1: required string name, 2: optional i32 count }",
    )
    .unwrap();
    let value = module
        .instantiate("S", vec![("name", "x".into()), ("count", 3.into())])
        .unwrap();

    let wire = module.to_wire("S", &value).unwrap();
    assert_eq!(serialize_value(&wire), module.dumps(&value).unwrap());
    assert_eq!(module.from_wire("S", &wire).unwrap(), value);
}

#[test]
fn skip_equivalence_for_unknown_fields() {
    let module = loads("test", "struct S { 1: required i32 x }").unwrap();

    let minimal = [0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x00];
    // The same struct with extra fields a newer writer might emit: a
    // string at id 5, a list<i32> at id 9, and a bool at id 2.
    let extended = [
        0x0B, 0x00, 0x05, 0x00, 0x00, 0x00, 0x03, b'n', b'e', b'w', // 5: string
        0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x07, // 1: i32 = 7
        0x0F, 0x00, 0x09, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2A, // 9: [42]
        0x02, 0x00, 0x02, 0x01, // 2: bool
        0x00,
    ];

    assert_eq!(
        module.loads("S", &minimal).unwrap(),
        module.loads("S", &extended).unwrap()
    );
}

#[test]
fn type_mismatched_known_field_is_skipped() {
    let module = loads(
        "test",
        "struct S { 1: optional i32 x, 2: optional i32 y }",
    )
    .unwrap();
    // Field 1 arrives as a string; the declared i32 never shows up.
    let bytes = [
        0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, b'?', // 1: string "?"
        0x08, 0x00, 0x02, 0x00, 0x00, 0x00, 0x05, // 2: i32 = 5
        0x00,
    ];
    let value = module.loads("S", &bytes).unwrap();
    match &value {
        Value::Struct(s) => {
            assert_eq!(s.get("x"), None);
            assert_eq!(s.get("y"), Some(&Value::I32(5)));
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn missing_required_field_fails() {
    let module = loads("test", "struct S { 1: required string name }").unwrap();

    let err = module.instantiate("S", vec![]).unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::MissingRequired { ref field, .. }) if field == "name"
    ));

    // The same rule applies when reading an empty wire image.
    let err = module.loads("S", &[0x00]).unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::MissingRequired { ref field, .. }) if field == "name"
    ));
}

#[test]
fn integer_range_is_enforced() {
    let module = loads("test", "struct S { 1: optional byte b }").unwrap();
    let err = module
        .instantiate("S", vec![("b", Value::I32(200))])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::OutOfRange { value: 200, .. })
    ));
}

#[test]
fn bool_accepts_zero_and_one() {
    let module = loads("test", "struct S { 1: required bool flag }").unwrap();
    let value = module
        .instantiate("S", vec![("flag", Value::I32(1))])
        .unwrap();
    let bytes = module.dumps(&value).unwrap();
    assert_eq!(bytes, [0x02, 0x00, 0x01, 0x01, 0x00]);

    let err = module
        .instantiate("S", vec![("flag", Value::I32(2))])
        .unwrap_err();
    assert!(matches!(err, Error::Value(ValueError::TypeMismatch { .. })));
}

#[test]
fn string_and_binary_accept_each_other() {
    let module = loads(
        "test",
        "struct S { 1: optional string text, 2: optional binary blob }",
    )
    .unwrap();
    let value = module
        .instantiate(
            "S",
            vec![
                ("text", Value::Binary(b"bytes".to_vec())),
                ("blob", Value::Text("text".to_string())),
            ],
        )
        .unwrap();
    let bytes = module.dumps(&value).unwrap();

    let decoded = module.loads("S", &bytes).unwrap();
    match &decoded {
        Value::Struct(s) => {
            // string decodes to text, binary stays raw.
            assert_eq!(s.get("text"), Some(&Value::Text("bytes".to_string())));
            assert_eq!(s.get("blob"), Some(&Value::Binary(b"text".to_vec())));
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn invalid_utf8_in_string_fails_on_read() {
    let module = loads("test", "struct S { 1: optional string text }").unwrap();
    let bytes = [0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xC3, 0x28, 0x00];
    let err = module.loads("S", &bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::InvalidUtf8 { .. })
    ));
}

#[test]
fn enum_round_trip_and_name_lookup() {
    let module = loads("test", "enum Status { QUEUED = 0, RUNNING = 1 }").unwrap();
    let id = module.type_id("Status").unwrap();

    let bytes = {
        use skein_wire::{BinaryWriter, WriteBuffer};
        let mut buffer = WriteBuffer::new();
        module
            .arena()
            .write_to(id, &mut BinaryWriter::new(&mut buffer), &Value::I32(1))
            .unwrap();
        buffer.into_bytes()
    };
    assert_eq!(bytes, [0x00, 0x00, 0x00, 0x01]);

    let decoded = module
        .arena()
        .read_from(id, &mut skein_wire::BinaryReader::new(&bytes))
        .unwrap();
    assert_eq!(decoded, Value::I32(1));

    match module.arena().get(id) {
        crate::spec::TypeSpec::Enum(spec) => assert_eq!(spec.name_of(1), Some("RUNNING")),
        other => panic!("expected enum, got {other:?}"),
    }
}

#[test]
fn enum_primitive_forms() {
    let module = loads(
        "test",
        indoc! {r#"
            enum Status { QUEUED = 0, RUNNING = 1 }
            enum Role { USER = 1, ADMIN = 2 } (primitive = "name")
        "#},
    )
    .unwrap();

    // Default: integer primitive form.
    assert_eq!(
        module.to_primitive("Status", &Value::I32(1)).unwrap(),
        Primitive::Int(1)
    );
    // Configured: item name, first declared wins.
    assert_eq!(
        module.to_primitive("Role", &Value::I32(2)).unwrap(),
        Primitive::Text("ADMIN".to_string())
    );

    // from_primitive accepts both forms either way.
    assert_eq!(
        module
            .from_primitive("Status", &Primitive::Text("RUNNING".to_string()))
            .unwrap(),
        Value::I32(1)
    );
    assert_eq!(
        module.from_primitive("Role", &Primitive::Int(1)).unwrap(),
        Value::I32(1)
    );

    let err = module
        .from_primitive("Status", &Primitive::Text("MISSING".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::UnknownEnumItem { .. })
    ));
}

#[test]
fn union_cardinality() {
    let module = loads(
        "test",
        "union Body { 1: string plainText, 2: binary richText }",
    )
    .unwrap();

    let ok = module
        .instantiate("Body", vec![("plainText", "hi".into())])
        .unwrap();
    let bytes = module.dumps(&ok).unwrap();
    assert_eq!(module.loads("Body", &bytes).unwrap(), ok);

    let err = module.instantiate("Body", vec![]).unwrap_err();
    assert!(matches!(err, Error::Value(ValueError::EmptyUnion { .. })));

    let err = module
        .instantiate(
            "Body",
            vec![
                ("plainText", "hi".into()),
                ("richText", Value::Binary(vec![1])),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::MultipleUnionFields { .. })
    ));
}

#[test]
fn struct_primitive_round_trip() {
    let module = loads(
        "test",
        indoc! {r#"
            struct User {
                1: required string name
                2: optional i32 stars
                3: optional list<string> tags
            }
        "#},
    )
    .unwrap();

    let user = module
        .instantiate(
            "User",
            vec![
                ("name", "ada".into()),
                ("stars", 5.into()),
                ("tags", Value::List(vec!["x".into()])),
            ],
        )
        .unwrap();

    let primitive = module.to_primitive("User", &user).unwrap();
    assert_eq!(
        serde_json::to_string(&primitive).unwrap(),
        r#"{"name":"ada","stars":5,"tags":["x"]}"#
    );
    assert_eq!(module.from_primitive("User", &primitive).unwrap(), user);
}

#[test]
fn absent_fields_are_omitted_from_primitive() {
    let module = loads(
        "test",
        "struct S { 1: required string name, 2: optional i32 stars }",
    )
    .unwrap();
    let value = module.instantiate("S", vec![("name", "a".into())]).unwrap();
    assert_eq!(
        module.to_primitive("S", &value).unwrap(),
        Primitive::Object(vec![(
            Primitive::Text("name".to_string()),
            Primitive::Text("a".to_string())
        )])
    );
}

#[test]
fn positional_construction_orders_required_first() {
    let module = loads(
        "test",
        indoc! {r#"
            struct S {
                1: optional i32 stars = 3
                2: required string name
            }
        "#},
    )
    .unwrap();

    // `name` is the only required-without-default field, so it comes first.
    let value = module
        .instantiate_positional("S", vec!["ada".into()])
        .unwrap();
    match &value {
        Value::Struct(s) => {
            assert_eq!(s.get("name"), Some(&Value::Text("ada".to_string())));
            assert_eq!(s.get("stars"), Some(&Value::I32(3)));
        }
        other => panic!("expected struct, got {other:?}"),
    }

    let value = module
        .instantiate_positional("S", vec!["ada".into(), 9.into()])
        .unwrap();
    match &value {
        Value::Struct(s) => assert_eq!(s.get("stars"), Some(&Value::I32(9))),
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn wrong_surface_type_is_rejected() {
    let module = loads(
        "test",
        indoc! {r#"
            struct A { 1: required i32 x }
            struct B { 1: required i32 x }
            struct Holder { 1: required A a }
        "#},
    )
    .unwrap();

    let b = module.instantiate("B", vec![("x", 1.into())]).unwrap();
    let err = module.instantiate("Holder", vec![("a", b)]).unwrap_err();
    assert!(matches!(err, Error::Value(ValueError::TypeMismatch { .. })));
}

// --- Message envelopes ---

#[test]
fn call_message_wire_image() {
    let module = loads("test", "service Foo { void getFoo() }").unwrap();
    let request = module.instantiate("Foo_getFoo_request", vec![]).unwrap();
    let bytes = module.dumps_message(&request, 10).unwrap();
    assert_eq!(
        bytes,
        [
            0x80, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x67, 0x65, 0x74, 0x46, 0x6F, 0x6F,
            0x00, 0x00, 0x00, 0x0A, 0x00,
        ]
    );
}

#[test]
fn non_strict_message_is_accepted() {
    let module = loads("test", "service Foo { void getFoo() }").unwrap();
    let bytes = [
        0x00, 0x00, 0x00, 0x06, 0x67, 0x65, 0x74, 0x46, 0x6F, 0x6F, 0x01, 0x00, 0x00, 0x00, 0x0A,
        0x00,
    ];
    let message = module.loads_message("Foo", &bytes).unwrap();
    assert_eq!(message.name, "getFoo");
    assert_eq!(message.kind, MessageKind::Call);
    assert_eq!(message.seqid, 10);
    assert_eq!(
        message.body,
        module.instantiate("Foo_getFoo_request", vec![]).unwrap()
    );
}

#[test]
fn request_and_reply_round_trip() {
    let module = kv_module();

    let request = module
        .instantiate("KeyValue_getValue_request", vec![("key", "k1".into())])
        .unwrap();
    let bytes = module.dumps_message(&request, 7).unwrap();
    let message = module.loads_message("KeyValue", &bytes).unwrap();
    assert_eq!(message.kind, MessageKind::Call);
    assert_eq!(message.seqid, 7);
    assert_eq!(message.body, request);

    let response = module
        .instantiate(
            "KeyValue_getValue_response",
            vec![("success", "v1".into())],
        )
        .unwrap();
    let bytes = module.dumps_message(&response, 7).unwrap();
    let message = module.loads_message("KeyValue", &bytes).unwrap();
    assert_eq!(message.kind, MessageKind::Reply);
    assert_eq!(message.body, response);
}

#[test]
fn exception_reply_round_trips() {
    let module = kv_module();
    let not_found = module
        .instantiate("KeyDoesNotExist", vec![("message", "no k1".into())])
        .unwrap();
    let response = module
        .instantiate("KeyValue_getValue_response", vec![("notFound", not_found)])
        .unwrap();
    let bytes = module.dumps_message(&response, 1).unwrap();
    let message = module.loads_message("KeyValue", &bytes).unwrap();
    assert_eq!(message.kind, MessageKind::Reply);
    assert_eq!(message.body, response);
}

#[test]
fn oneway_request_uses_oneway_kind() {
    let module = kv_module();
    let ping = module.instantiate("KeyValue_ping_request", vec![]).unwrap();
    let bytes = module.dumps_message(&ping, 0).unwrap();
    let message = module.loads_message("KeyValue", &bytes).unwrap();
    assert_eq!(message.kind, MessageKind::Oneway);
    assert_eq!(message.name, "ping");
}

#[test]
fn void_reply_is_an_empty_union() {
    let module = kv_module();
    let response = module
        .instantiate("KeyValue_putValue_response", vec![])
        .unwrap();
    let bytes = module.dumps_message(&response, 3).unwrap();
    let message = module.loads_message("KeyValue", &bytes).unwrap();
    assert_eq!(message.kind, MessageKind::Reply);
    assert_eq!(message.body, response);
}

#[test]
fn unknown_exception_id_is_surfaced() {
    let module = kv_module();
    // A response union holding field id 7, which is neither 0 (success)
    // nor a declared exception.
    let bytes = [0x08, 0x00, 0x07, 0x00, 0x00, 0x00, 0x2A, 0x00];
    let err = module
        .loads("KeyValue_getValue_response", &bytes)
        .unwrap_err();
    match err {
        Error::UnknownException(e) => {
            assert!(e.message.contains("unknown exception"), "{e}");
            assert!(e.response.get(7, skein_wire::TType::I32).is_some());
        }
        other => panic!("expected UnknownException, got {other:?}"),
    }
}

#[test]
fn future_return_type_widening_is_skipped() {
    let module = kv_module();
    // Field id 0 with a ttype that does not match the declared string
    // success: skipped, leaving an empty union - but getValue's response
    // does not allow empty, so the required-one rule fires.
    let bytes = [0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A, 0x00];
    let err = module
        .loads("KeyValue_getValue_response", &bytes)
        .unwrap_err();
    assert!(matches!(err, Error::Value(ValueError::EmptyUnion { .. })));
}

#[test]
fn exception_envelope_raises() {
    let module = kv_module();
    let bytes = {
        use skein_wire::{BinaryWriter, MessageHeader, WriteBuffer};
        let mut buffer = WriteBuffer::new();
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_message_begin(&MessageHeader {
            name: "getValue".to_string(),
            kind: MessageKind::Exception,
            seqid: 4,
        });
        writer.write_struct_end();
        buffer.into_bytes()
    };
    let err = module.loads_message("KeyValue", &bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownException(_)));
}

#[test]
fn unknown_function_in_message_fails() {
    let module = kv_module();
    let bytes = {
        use skein_wire::{BinaryWriter, MessageHeader, WriteBuffer};
        let mut buffer = WriteBuffer::new();
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_message_begin(&MessageHeader {
            name: "nope".to_string(),
            kind: MessageKind::Call,
            seqid: 0,
        });
        writer.write_struct_end();
        buffer.into_bytes()
    };
    let err = module.loads_message("KeyValue", &bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownFunction { ref function, .. } if function == "nope"
    ));
}

#[test]
fn non_envelope_value_cannot_be_a_message() {
    let module = loads(
        "test",
        "struct S { 1: required string name } service Svc { void f() }",
    )
    .unwrap();
    let value = module.instantiate("S", vec![("name", "x".into())]).unwrap();
    let err = module.dumps_message(&value, 0).unwrap_err();
    assert!(matches!(err, Error::Value(ValueError::TypeMismatch { .. })));
}

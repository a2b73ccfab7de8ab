use bson_object_model::io::{
    BsonBinaryReader, BsonBinaryReaderSettings, BsonBinaryWriter, BsonBinaryWriterSettings,
    BsonReader, JsonWriterSettings,
};
use bson_object_model::{
    BsonArray, BsonBinaryData, BsonBinarySubType, BsonDateTime, BsonDocument, BsonJavaScriptWithScope,
    BsonRegularExpression, BsonTimestamp, BsonType, BsonValue, GuidRepresentation, ObjectId,
};
use uuid::Uuid;

fn doc(fields: &[(&str, BsonValue)]) -> BsonDocument {
    BsonDocument::from_elements(fields.iter().map(|(k, v)| (*k, v.clone()))).unwrap()
}

fn every_kind() -> BsonDocument {
    let guid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
    doc(&[
        ("double", BsonValue::Double(123.456)),
        ("nan", BsonValue::Double(f64::NAN)),
        ("string", BsonValue::from("hello")),
        ("unicode", BsonValue::from("héllo wörld ✓")),
        ("empty", BsonValue::from("")),
        (
            "document",
            BsonValue::from(doc(&[("foo", "bar".into()), ("baz", 42.into())])),
        ),
        (
            "array",
            BsonValue::from(vec![BsonValue::Int32(1), BsonValue::from("x"), BsonValue::Null]),
        ),
        ("binary", BsonValue::from(vec![1u8, 2, 3])),
        (
            "user_binary",
            BsonValue::from(
                BsonBinaryData::with_sub_type(vec![9u8], BsonBinarySubType::UserDefined(0x80))
                    .unwrap(),
            ),
        ),
        (
            "uuid",
            BsonValue::from(BsonBinaryData::from_guid(guid, GuidRepresentation::Standard).unwrap()),
        ),
        (
            "legacy_uuid",
            BsonValue::from(
                BsonBinaryData::from_guid(guid, GuidRepresentation::CSharpLegacy).unwrap(),
            ),
        ),
        ("undefined", BsonValue::Undefined),
        (
            "object_id",
            BsonValue::from(ObjectId::parse("507f1f77bcf86cd799439011").unwrap()),
        ),
        ("true", BsonValue::Boolean(true)),
        ("false", BsonValue::Boolean(false)),
        (
            "date_time",
            BsonValue::from(BsonDateTime::from_millis(1_325_376_000_123)),
        ),
        ("null", BsonValue::Null),
        (
            "regex",
            BsonValue::from(BsonRegularExpression::with_options("^a.*b$", "im")),
        ),
        ("javascript", BsonValue::JavaScript("function() { return 42; }".into())),
        ("symbol", BsonValue::symbol("sym")),
        (
            "javascript_with_scope",
            BsonValue::from(BsonJavaScriptWithScope::new(
                "function() { return x; }",
                doc(&[("x", 42.into())]),
            )),
        ),
        ("int32", BsonValue::Int32(-7)),
        ("timestamp", BsonValue::from(BsonTimestamp::new(1_700_000_000, 3))),
        ("int64", BsonValue::Int64(12_321_321_123)),
        ("min_key", BsonValue::MinKey),
        ("max_key", BsonValue::MaxKey),
    ])
}

#[test]
fn every_kind_round_trips_through_binary() {
    let original = every_kind();
    let bytes = original.to_bson().unwrap();
    assert_eq!(
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
        bytes.len()
    );
    let decoded = BsonDocument::from_bson(&bytes).unwrap();
    assert_eq!(decoded, original);
    for (a, b) in decoded.iter().zip(original.iter()) {
        assert_eq!(a.value().bson_type(), b.value().bson_type(), "{}", a.name());
    }
    assert_eq!(decoded.to_bson().unwrap(), bytes);
}

#[test]
fn known_encoding() {
    let doc = doc(&[("hello", "world".into())]);
    assert_eq!(
        doc.to_bson().unwrap(),
        b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00"
    );
}

#[test]
fn decoded_symbols_are_interned() {
    let original = doc(&[("s", BsonValue::symbol("shared"))]);
    let decoded = BsonDocument::from_bson(&original.to_bson().unwrap()).unwrap();
    let BsonValue::Symbol(a) = original.get("s").unwrap() else {
        panic!("symbol expected");
    };
    let BsonValue::Symbol(b) = decoded.get("s").unwrap() else {
        panic!("symbol expected");
    };
    assert!(bson_object_model::BsonSymbol::ptr_eq(a, b));
}

#[test]
fn duplicate_names_survive_when_allowed() {
    let mut original = BsonDocument::with_allow_duplicate_names(true);
    original.add("a", 1).unwrap().add("a", 2).unwrap();
    let bytes = original.to_bson().unwrap();

    let mut reader = BsonBinaryReader::new(&bytes, BsonBinaryReaderSettings::default());
    let decoded = BsonDocument::read_from_with(&mut reader, true).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get("a").unwrap(), &BsonValue::Int32(1));
    assert_eq!(decoded.get_at(1).unwrap(), &BsonValue::Int32(2));

    assert!(BsonDocument::from_bson(&bytes).is_err());
}

#[test]
fn replace_from_swaps_content() {
    let source = doc(&[("x", 1.into())]);
    let bytes = source.to_bson().unwrap();
    let mut target = doc(&[("old", true.into())]);
    let mut reader = BsonBinaryReader::new(&bytes, BsonBinaryReaderSettings::default());
    target.replace_from(&mut reader).unwrap();
    assert_eq!(target, source);
}

#[test]
fn top_level_values_stream_through_reader() {
    let array: BsonArray = [1, 2, 3].into_iter().collect();
    let bytes = doc(&[("values", array.clone().into())]).to_bson().unwrap();

    let mut reader = BsonBinaryReader::new(&bytes, BsonBinaryReaderSettings::default());
    reader.read_start_document().unwrap();
    assert_eq!(reader.read_bson_type().unwrap(), BsonType::Array);
    assert_eq!(reader.read_name().unwrap(), "values");
    let read = BsonValue::read_from(&mut reader).unwrap();
    assert_eq!(read, BsonValue::Array(array));
    assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
    reader.read_end_document().unwrap();
    assert!(reader.is_at_end());
}

#[test]
fn old_binary_settings() {
    let original = doc(&[(
        "b",
        BsonBinaryData::with_sub_type(vec![1u8, 2], BsonBinarySubType::OldBinary)
            .unwrap()
            .into(),
    )]);
    let keep = BsonBinaryWriterSettings {
        fix_old_binary_sub_type_on_output: false,
        ..BsonBinaryWriterSettings::default()
    };
    let bytes = original.to_bson_with(keep).unwrap();

    let fixed = BsonDocument::from_bson(&bytes).unwrap();
    let bin = fixed.get("b").unwrap().as_binary().unwrap();
    assert_eq!(bin.sub_type(), BsonBinarySubType::Binary);
    assert_eq!(bin.bytes(), [1, 2]);

    let raw = BsonDocument::from_bson_with(
        &bytes,
        BsonBinaryReaderSettings {
            fix_old_binary_sub_type_on_input: false,
            ..BsonBinaryReaderSettings::default()
        },
    )
    .unwrap();
    let bin = raw.get("b").unwrap().as_binary().unwrap();
    assert_eq!(bin.sub_type(), BsonBinarySubType::OldBinary);
    assert_eq!(bin.bytes(), [2, 0, 0, 0, 1, 2]);
}

#[test]
fn writer_can_be_driven_directly() {
    let mut writer = BsonBinaryWriter::default();
    doc(&[("k", BsonValue::MaxKey)]).write_to(&mut writer).unwrap();
    assert_eq!(writer.into_bytes(), [8, 0, 0, 0, 0x7f, b'k', 0, 0]);
}

#[test]
fn json_shell_and_strict() {
    let d = doc(&[
        ("_id", ObjectId::parse("507f1f77bcf86cd799439011").unwrap().into()),
        ("n", BsonValue::Int64(3)),
        ("arr", vec![BsonValue::Int32(1), BsonValue::Double(2.5)].into()),
    ]);
    assert_eq!(
        d.to_json().unwrap(),
        r#"{ "_id" : ObjectId("507f1f77bcf86cd799439011"), "n" : NumberLong(3), "arr" : [1, 2.5] }"#
    );
    assert_eq!(
        d.to_json_with(JsonWriterSettings::strict()).unwrap(),
        r#"{ "_id" : { "$oid" : "507f1f77bcf86cd799439011" }, "n" : 3, "arr" : [1, 2.5] }"#
    );
    assert_eq!(d.to_string(), d.to_json().unwrap());
}

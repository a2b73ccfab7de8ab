use bson_object_model::io::{
    BsonBinaryReader, BsonBinaryReaderSettings, BsonBinaryWriter, BsonBinaryWriterSettings,
    BsonWriter,
};
use bson_object_model::{BsonArray, BsonDocument, BsonElement, BsonError, BsonType, BsonValue};

fn with_size(mut body: Vec<u8>) -> Vec<u8> {
    let len = body.len() as u8;
    body[0] = len;
    body
}

#[test]
fn decoder_error_matrix() {
    let cases: Vec<(&str, Vec<u8>, fn(&BsonError) -> bool)> = vec![
        ("empty input", vec![], |e| matches!(e, BsonError::UnexpectedEof)),
        (
            "declared size past end",
            vec![20, 0, 0, 0, 0],
            |e| matches!(e, BsonError::UnexpectedEof),
        ),
        (
            "size below minimum",
            vec![4, 0, 0, 0],
            |e| matches!(e, BsonError::Format(_)),
        ),
        (
            "unknown element type",
            with_size(vec![0, 0, 0, 0, 0x13, b'a', 0, 0]),
            |e| matches!(e, BsonError::UnsupportedType(0x13)),
        ),
        (
            "invalid utf-8 string",
            with_size(vec![0, 0, 0, 0, 0x02, b'a', 0, 2, 0, 0, 0, 0xff, 0, 0]),
            |e| matches!(e, BsonError::InvalidUtf8),
        ),
        (
            "string missing terminator",
            with_size(vec![0, 0, 0, 0, 0x02, b'a', 0, 2, 0, 0, 0, b'x', b'y', 0]),
            |e| matches!(e, BsonError::Format(_)),
        ),
        (
            "trailing bytes",
            vec![5, 0, 0, 0, 0, 0],
            |e| matches!(e, BsonError::Format(_)),
        ),
        (
            "duplicate names",
            with_size(vec![
                0, 0, 0, 0, 0x0a, b'a', 0, 0x0a, b'a', 0, 0,
            ]),
            |e| matches!(e, BsonError::DuplicateElementName(n) if n == "a"),
        ),
        (
            "legacy uuid of wrong length",
            with_size(vec![0, 0, 0, 0, 0x05, b'g', 0, 1, 0, 0, 0, 3, 0xaa, 0]),
            |e| matches!(e, BsonError::InvalidGuidLength(1)),
        ),
    ];

    for (name, bytes, check) in cases {
        let err = BsonDocument::from_bson(&bytes).expect_err(name);
        assert!(check(&err), "{name}: unexpected error {err:?}");
    }
}

#[test]
fn reader_enforces_max_document_size() {
    let doc = BsonDocument::from_elements([("s", "x".repeat(64))]).unwrap();
    let bytes = doc.to_bson().unwrap();
    let settings = BsonBinaryReaderSettings {
        max_document_size: 32,
        ..BsonBinaryReaderSettings::default()
    };
    assert!(matches!(
        BsonDocument::from_bson_with(&bytes, settings),
        Err(BsonError::DocumentTooLarge { max: 32, .. })
    ));
}

#[test]
fn writer_enforces_max_document_size() {
    let doc = BsonDocument::from_elements([("s", "x".repeat(64))]).unwrap();
    let settings = BsonBinaryWriterSettings {
        max_document_size: 32,
        ..BsonBinaryWriterSettings::default()
    };
    assert!(matches!(
        doc.to_bson_with(settings),
        Err(BsonError::DocumentTooLarge { max: 32, .. })
    ));
}

#[test]
fn failed_replace_leaves_document_untouched() {
    let mut target = BsonDocument::from_elements([("keep", 1)]).unwrap();
    let before = target.clone();
    let bytes = [12u8, 0, 0, 0, 0x10, b'a', 0];
    let mut reader = BsonBinaryReader::new(&bytes, BsonBinaryReaderSettings::default());
    assert!(target.replace_from(&mut reader).is_err());
    assert_eq!(target, before);
}

#[test]
fn writer_state_errors() {
    let mut writer = BsonBinaryWriter::default();
    assert!(matches!(
        writer.write_name("a"),
        Err(BsonError::InvalidState { method: "write_name", .. })
    ));
    writer.write_start_document().unwrap();
    assert!(matches!(
        writer.write_end_array(),
        Err(BsonError::InvalidState { method: "write_end_array", .. })
    ));
    writer.write_name("a").unwrap();
    writer.write_start_array().unwrap();
    assert!(matches!(
        writer.write_name("b"),
        Err(BsonError::InvalidState { method: "write_name", state: "Value" })
    ));
}

#[test]
fn model_error_matrix() {
    let mut doc = BsonDocument::from_elements([("a", 1)]).unwrap();

    assert_eq!(doc.add("a", 2).unwrap_err(), BsonError::DuplicateElementName("a".into()));
    assert_eq!(
        doc.add("bad\0name", 2).unwrap_err(),
        BsonError::InvalidElementName("bad\0name".into())
    );
    assert_eq!(BsonElement::new("x\0", 1).unwrap_err(), BsonError::InvalidElementName("x\0".into()));
    assert_eq!(doc.get("missing").unwrap_err(), BsonError::ElementNotFound("missing".into()));
    assert_eq!(
        doc.get_at(3).unwrap_err(),
        BsonError::IndexOutOfRange { index: 3, len: 1 }
    );
    assert_eq!(
        BsonArray::new().remove_at(0).unwrap_err(),
        BsonError::IndexOutOfRange { index: 0, len: 0 }
    );
    assert_eq!(
        BsonValue::Null.as_document().unwrap_err(),
        BsonError::InvalidCast {
            from: BsonType::Null,
            to: "Document"
        }
    );
    assert!(matches!(
        BsonValue::from("1e99").to_int32(),
        Err(BsonError::Conversion { from: BsonType::String, to: "Int32", .. })
    ));
    assert_eq!(doc.len(), 1);
}

#[test]
fn errors_render_readable_messages() {
    assert_eq!(
        BsonError::UnsupportedType(0x13).to_string(),
        "unsupported BSON element type: 0x13"
    );
    assert_eq!(
        BsonError::DuplicateElementName("a".into()).to_string(),
        "duplicate element name \"a\""
    );
}

//! Reader and writer abstractions over BSON streams.
//!
//! [`BsonReader`] and [`BsonWriter`] expose one operation per wire
//! primitive. The value model serializes itself through them, so any
//! stream that implements the traits can carry documents. The crate ships
//! a binary pair ([`BsonBinaryReader`], [`BsonBinaryWriter`]) and a
//! [`JsonWriter`] used for display.

mod binary_reader;
mod binary_writer;
mod json_writer;
mod settings;

pub use binary_reader::BsonBinaryReader;
pub use binary_writer::BsonBinaryWriter;
pub use json_writer::JsonWriter;
pub use settings::{
    BsonBinaryReaderSettings, BsonBinaryWriterSettings, JsonOutputMode, JsonWriterSettings,
    DEFAULT_MAX_DOCUMENT_SIZE,
};

use crate::binary::BsonBinaryData;
use crate::bson_type::BsonType;
use crate::error::BsonError;
use crate::object_id::ObjectId;

/// Pull-style reader over a BSON stream.
///
/// Inside a document the caller alternates [`read_bson_type`], then
/// [`read_name`] (or [`skip_name`]), then exactly one value read. A type of
/// [`BsonType::EndOfDocument`] means the container is exhausted and must be
/// closed with the matching `read_end_*`.
///
/// [`read_bson_type`]: BsonReader::read_bson_type
/// [`read_name`]: BsonReader::read_name
/// [`skip_name`]: BsonReader::skip_name
pub trait BsonReader {
    /// Type of the value the reader is positioned on.
    fn current_bson_type(&self) -> Result<BsonType, BsonError>;
    fn read_bson_type(&mut self) -> Result<BsonType, BsonError>;
    fn read_name(&mut self) -> Result<String, BsonError>;
    fn skip_name(&mut self) -> Result<(), BsonError>;

    fn read_start_document(&mut self) -> Result<(), BsonError>;
    fn read_end_document(&mut self) -> Result<(), BsonError>;
    fn read_start_array(&mut self) -> Result<(), BsonError>;
    fn read_end_array(&mut self) -> Result<(), BsonError>;

    fn read_double(&mut self) -> Result<f64, BsonError>;
    fn read_string(&mut self) -> Result<String, BsonError>;
    fn read_binary_data(&mut self) -> Result<BsonBinaryData, BsonError>;
    fn read_undefined(&mut self) -> Result<(), BsonError>;
    fn read_object_id(&mut self) -> Result<ObjectId, BsonError>;
    fn read_boolean(&mut self) -> Result<bool, BsonError>;
    /// Milliseconds since the Unix epoch.
    fn read_date_time(&mut self) -> Result<i64, BsonError>;
    fn read_null(&mut self) -> Result<(), BsonError>;
    /// Pattern and options.
    fn read_regular_expression(&mut self) -> Result<(String, String), BsonError>;
    fn read_javascript(&mut self) -> Result<String, BsonError>;
    fn read_symbol(&mut self) -> Result<String, BsonError>;
    /// Reads the code; the scope document follows and is read with
    /// [`read_start_document`](BsonReader::read_start_document).
    fn read_javascript_with_scope(&mut self) -> Result<String, BsonError>;
    fn read_int32(&mut self) -> Result<i32, BsonError>;
    fn read_timestamp(&mut self) -> Result<u64, BsonError>;
    fn read_int64(&mut self) -> Result<i64, BsonError>;
    fn read_min_key(&mut self) -> Result<(), BsonError>;
    fn read_max_key(&mut self) -> Result<(), BsonError>;
}

/// Push-style writer onto a BSON stream.
///
/// Inside a document every value is preceded by [`write_name`]. Inside an
/// array names are implied by position and must not be written.
///
/// [`write_name`]: BsonWriter::write_name
pub trait BsonWriter {
    fn write_name(&mut self, name: &str) -> Result<(), BsonError>;

    fn write_start_document(&mut self) -> Result<(), BsonError>;
    fn write_end_document(&mut self) -> Result<(), BsonError>;
    fn write_start_array(&mut self) -> Result<(), BsonError>;
    fn write_end_array(&mut self) -> Result<(), BsonError>;

    fn write_double(&mut self, value: f64) -> Result<(), BsonError>;
    fn write_string(&mut self, value: &str) -> Result<(), BsonError>;
    fn write_binary_data(&mut self, value: &BsonBinaryData) -> Result<(), BsonError>;
    fn write_undefined(&mut self) -> Result<(), BsonError>;
    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), BsonError>;
    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError>;
    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError>;
    fn write_null(&mut self) -> Result<(), BsonError>;
    fn write_regular_expression(&mut self, pattern: &str, options: &str) -> Result<(), BsonError>;
    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError>;
    fn write_symbol(&mut self, name: &str) -> Result<(), BsonError>;
    /// Writes the code; the caller then writes the scope document.
    fn write_javascript_with_scope(&mut self, code: &str) -> Result<(), BsonError>;
    fn write_int32(&mut self, value: i32) -> Result<(), BsonError>;
    fn write_timestamp(&mut self, value: u64) -> Result<(), BsonError>;
    fn write_int64(&mut self, value: i64) -> Result<(), BsonError>;
    fn write_min_key(&mut self) -> Result<(), BsonError>;
    fn write_max_key(&mut self) -> Result<(), BsonError>;
}

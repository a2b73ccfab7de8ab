//! BSON binary writer.
//!
//! Multi-byte integers are little-endian. Container lengths are not known
//! up front, so each container reserves four bytes and patches them when
//! it is closed.

use tracing::debug;

use crate::binary::{BsonBinaryData, BsonBinarySubType};
use crate::bson_type::BsonType;
use crate::element::validate_name;
use crate::error::BsonError;
use crate::guid::GuidRepresentation;
use crate::object_id::ObjectId;

use super::{BsonBinaryWriterSettings, BsonWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Name,
    Value,
    ScopeDocument,
    Done,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Initial => "Initial",
            State::Name => "Name",
            State::Value => "Value",
            State::ScopeDocument => "ScopeDocument",
            State::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Document,
    Array,
    JavaScriptWithScope,
    ScopeDocument,
}

#[derive(Debug)]
struct Context {
    kind: ContextKind,
    /// Offset of the reserved length field.
    start: usize,
    /// Next implied name inside an array.
    index: usize,
}

/// Writes BSON into an owned buffer.
pub struct BsonBinaryWriter {
    buf: Vec<u8>,
    settings: BsonBinaryWriterSettings,
    state: State,
    contexts: Vec<Context>,
    name: String,
}

impl Default for BsonBinaryWriter {
    fn default() -> Self {
        Self::new(BsonBinaryWriterSettings::default())
    }
}

impl BsonBinaryWriter {
    pub fn new(settings: BsonBinaryWriterSettings) -> Self {
        Self {
            buf: Vec::new(),
            settings,
            state: State::Initial,
            contexts: Vec::new(),
            name: String::new(),
        }
    }

    pub fn settings(&self) -> &BsonBinaryWriterSettings {
        &self.settings
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn invalid_state(&self, method: &'static str) -> BsonError {
        debug!(method, state = self.state.name(), "bson writer called in wrong state");
        BsonError::InvalidState {
            method,
            state: self.state.name(),
        }
    }

    fn top_kind(&self) -> Option<ContextKind> {
        self.contexts.last().map(|c| c.kind)
    }

    /// State after a complete value has been written in the current context.
    fn next_state(&self) -> State {
        match self.top_kind() {
            None => State::Done,
            Some(ContextKind::Array) => State::Value,
            Some(_) => State::Name,
        }
    }

    /// Writes the element type and name for a value about to be written.
    fn write_header(&mut self, method: &'static str, bson_type: BsonType) -> Result<(), BsonError> {
        if self.state != State::Value {
            return Err(self.invalid_state(method));
        }
        self.buf.push(bson_type.tag());
        match self.contexts.last_mut() {
            Some(ctx) if ctx.kind == ContextKind::Array => {
                let index = ctx.index;
                ctx.index += 1;
                self.write_cstring(&index.to_string());
            }
            _ => {
                let name = std::mem::take(&mut self.name);
                self.write_cstring(&name);
            }
        }
        Ok(())
    }

    fn finish_value(&mut self) {
        self.state = self.next_state();
    }

    fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Length-prefixed string: i32 (byte count + 1), UTF-8 bytes, NUL.
    fn write_string_bytes(&mut self, s: &str) -> Result<(), BsonError> {
        let len = self.wire_length(s.len(), 1)?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /// `len + extra` as a wire length, bounded by `max_document_size` and `i32::MAX`.
    fn wire_length(&self, len: usize, extra: usize) -> Result<i32, BsonError> {
        let max = self.settings.max_document_size;
        len.checked_add(extra)
            .filter(|&size| size <= max)
            .and_then(|size| i32::try_from(size).ok())
            .ok_or_else(|| {
                let size = len.saturating_add(extra);
                debug!(size, max, "bson length out of range");
                BsonError::DocumentTooLarge { size, max }
            })
    }

    fn reserve_length(&mut self) -> usize {
        let start = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        start
    }

    fn patch_length(&mut self, start: usize) -> Result<(), BsonError> {
        let size = self.buf.len() - start;
        if size > self.settings.max_document_size {
            debug!(size, max = self.settings.max_document_size, "bson document too large");
            return Err(BsonError::DocumentTooLarge {
                size,
                max: self.settings.max_document_size,
            });
        }
        let size = self.wire_length(size, 0)?;
        self.buf[start..start + 4].copy_from_slice(&size.to_le_bytes());
        Ok(())
    }

    fn push_container(&mut self, kind: ContextKind) {
        let start = self.reserve_length();
        self.contexts.push(Context {
            kind,
            start,
            index: 0,
        });
    }

    fn check_guid_representation(&self, value: &BsonBinaryData) -> Result<(), BsonError> {
        if value.sub_type() != BsonBinarySubType::UuidLegacy {
            return Ok(());
        }
        let expected = self.settings.guid_representation;
        let found = value.guid_representation();
        if expected != GuidRepresentation::Unspecified
            && found != GuidRepresentation::Unspecified
            && expected != found
        {
            return Err(BsonError::GuidRepresentationMismatch { expected, found });
        }
        Ok(())
    }
}

impl BsonWriter for BsonBinaryWriter {
    fn write_name(&mut self, name: &str) -> Result<(), BsonError> {
        if self.state != State::Name {
            return Err(self.invalid_state("write_name"));
        }
        validate_name(name)?;
        self.name.clear();
        self.name.push_str(name);
        self.state = State::Value;
        Ok(())
    }

    fn write_start_document(&mut self) -> Result<(), BsonError> {
        match self.state {
            State::Initial | State::Done => self.push_container(ContextKind::Document),
            State::Value => {
                self.write_header("write_start_document", BsonType::Document)?;
                self.push_container(ContextKind::Document);
            }
            State::ScopeDocument => self.push_container(ContextKind::ScopeDocument),
            State::Name => return Err(self.invalid_state("write_start_document")),
        }
        self.state = State::Name;
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), BsonError> {
        let kind = self.top_kind();
        if self.state != State::Name
            || !matches!(kind, Some(ContextKind::Document | ContextKind::ScopeDocument))
        {
            return Err(self.invalid_state("write_end_document"));
        }
        self.buf.push(0);
        if let Some(ctx) = self.contexts.pop() {
            self.patch_length(ctx.start)?;
        }
        if kind == Some(ContextKind::ScopeDocument) {
            if let Some(ctx) = self.contexts.pop() {
                self.patch_length(ctx.start)?;
            }
        }
        self.finish_value();
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), BsonError> {
        self.write_header("write_start_array", BsonType::Array)?;
        self.push_container(ContextKind::Array);
        self.state = State::Value;
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), BsonError> {
        if self.state != State::Value || self.top_kind() != Some(ContextKind::Array) {
            return Err(self.invalid_state("write_end_array"));
        }
        self.buf.push(0);
        if let Some(ctx) = self.contexts.pop() {
            self.patch_length(ctx.start)?;
        }
        self.finish_value();
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), BsonError> {
        self.write_header("write_double", BsonType::Double)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), BsonError> {
        self.write_header("write_string", BsonType::String)?;
        self.write_string_bytes(value)?;
        self.finish_value();
        Ok(())
    }

    fn write_binary_data(&mut self, value: &BsonBinaryData) -> Result<(), BsonError> {
        if self.state == State::Value {
            self.check_guid_representation(value)?;
        }
        self.write_header("write_binary_data", BsonType::Binary)?;
        let bytes = value.bytes();
        let mut sub_type = value.sub_type();
        if sub_type == BsonBinarySubType::OldBinary && self.settings.fix_old_binary_sub_type_on_output {
            sub_type = BsonBinarySubType::Binary;
        }
        if sub_type == BsonBinarySubType::OldBinary {
            let outer = self.wire_length(bytes.len(), 4)?;
            let inner = self.wire_length(bytes.len(), 0)?;
            self.buf.extend_from_slice(&outer.to_le_bytes());
            self.buf.push(sub_type.to_u8());
            self.buf.extend_from_slice(&inner.to_le_bytes());
        } else {
            let len = self.wire_length(bytes.len(), 0)?;
            self.buf.extend_from_slice(&len.to_le_bytes());
            self.buf.push(sub_type.to_u8());
        }
        self.buf.extend_from_slice(bytes);
        self.finish_value();
        Ok(())
    }

    fn write_undefined(&mut self) -> Result<(), BsonError> {
        self.write_header("write_undefined", BsonType::Undefined)?;
        self.finish_value();
        Ok(())
    }

    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), BsonError> {
        self.write_header("write_object_id", BsonType::ObjectId)?;
        self.buf.extend_from_slice(&value.to_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError> {
        self.write_header("write_boolean", BsonType::Boolean)?;
        self.buf.push(u8::from(value));
        self.finish_value();
        Ok(())
    }

    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError> {
        self.write_header("write_date_time", BsonType::DateTime)?;
        self.buf.extend_from_slice(&millis.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), BsonError> {
        self.write_header("write_null", BsonType::Null)?;
        self.finish_value();
        Ok(())
    }

    fn write_regular_expression(&mut self, pattern: &str, options: &str) -> Result<(), BsonError> {
        if pattern.contains('\0') || options.contains('\0') {
            return Err(BsonError::format("regular expression cannot contain a NUL byte"));
        }
        self.write_header("write_regular_expression", BsonType::RegularExpression)?;
        self.write_cstring(pattern);
        self.write_cstring(options);
        self.finish_value();
        Ok(())
    }

    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError> {
        self.write_header("write_javascript", BsonType::JavaScript)?;
        self.write_string_bytes(code)?;
        self.finish_value();
        Ok(())
    }

    fn write_symbol(&mut self, name: &str) -> Result<(), BsonError> {
        self.write_header("write_symbol", BsonType::Symbol)?;
        self.write_string_bytes(name)?;
        self.finish_value();
        Ok(())
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> Result<(), BsonError> {
        self.write_header("write_javascript_with_scope", BsonType::JavaScriptWithScope)?;
        self.push_container(ContextKind::JavaScriptWithScope);
        self.write_string_bytes(code)?;
        self.state = State::ScopeDocument;
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<(), BsonError> {
        self.write_header("write_int32", BsonType::Int32)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_timestamp(&mut self, value: u64) -> Result<(), BsonError> {
        self.write_header("write_timestamp", BsonType::Timestamp)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_int64(&mut self, value: i64) -> Result<(), BsonError> {
        self.write_header("write_int64", BsonType::Int64)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_min_key(&mut self) -> Result<(), BsonError> {
        self.write_header("write_min_key", BsonType::MinKey)?;
        self.finish_value();
        Ok(())
    }

    fn write_max_key(&mut self) -> Result<(), BsonError> {
        self.write_header("write_max_key", BsonType::MaxKey)?;
        self.finish_value();
        Ok(())
    }
}

//! BSON binary reader.
//!
//! Reads from a borrowed byte slice. Every container's declared length is
//! checked against the buffer on entry and against the bytes actually
//! consumed on exit.

use tracing::debug;

use crate::binary::{BsonBinaryData, BsonBinarySubType};
use crate::bson_type::BsonType;
use crate::error::BsonError;
use crate::guid::GuidRepresentation;
use crate::object_id::ObjectId;

use super::{BsonBinaryReaderSettings, BsonReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Type,
    Name,
    Value,
    ScopeDocument,
    EndOfDocument,
    EndOfArray,
    Done,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Initial => "Initial",
            State::Type => "Type",
            State::Name => "Name",
            State::Value => "Value",
            State::ScopeDocument => "ScopeDocument",
            State::EndOfDocument => "EndOfDocument",
            State::EndOfArray => "EndOfArray",
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
    start: usize,
    size: usize,
}

/// Reads BSON from a byte slice.
pub struct BsonBinaryReader<'a> {
    data: &'a [u8],
    x: usize,
    settings: BsonBinaryReaderSettings,
    state: State,
    current_type: BsonType,
    contexts: Vec<Context>,
}

impl<'a> BsonBinaryReader<'a> {
    pub fn new(data: &'a [u8], settings: BsonBinaryReaderSettings) -> Self {
        Self {
            data,
            x: 0,
            settings,
            state: State::Initial,
            current_type: BsonType::Document,
            contexts: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BsonBinaryReaderSettings {
        &self.settings
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.x
    }

    /// True once every input byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.x >= self.data.len()
    }

    fn invalid_state(&self, method: &'static str) -> BsonError {
        debug!(method, state = self.state.name(), position = self.x, "bson reader called in wrong state");
        BsonError::InvalidState {
            method,
            state: self.state.name(),
        }
    }

    fn format_error(&self, msg: impl Into<String>) -> BsonError {
        let msg = msg.into();
        debug!(position = self.x, "{msg}");
        BsonError::Format(msg)
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BsonError> {
        if self.x + n > self.data.len() {
            debug!(position = self.x, needed = n, "bson input truncated");
            Err(BsonError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    fn u8(&mut self) -> Result<u8, BsonError> {
        self.check(1)?;
        let val = self.data[self.x];
        self.x += 1;
        Ok(val)
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], BsonError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    fn i32_le(&mut self) -> Result<i32, BsonError> {
        Ok(i32::from_le_bytes(self.bytes()?))
    }

    fn buf(&mut self, n: usize) -> Result<&'a [u8], BsonError> {
        self.check(n)?;
        let data = self.data;
        let out = &data[self.x..self.x + n];
        self.x += n;
        Ok(out)
    }

    /// Reads a non-negative i32 length.
    fn length(&mut self) -> Result<usize, BsonError> {
        let len = self.i32_le()?;
        usize::try_from(len).map_err(|_| self.format_error(format!("negative length {len}")))
    }

    fn cstring_bytes(&mut self) -> Result<&'a [u8], BsonError> {
        let data = self.data;
        let start = self.x;
        match data[start..].iter().position(|&b| b == 0) {
            Some(len) => {
                self.x = start + len + 1;
                Ok(&data[start..start + len])
            }
            None => {
                debug!(position = start, "unterminated cstring");
                Err(BsonError::UnexpectedEof)
            }
        }
    }

    fn cstring(&mut self) -> Result<String, BsonError> {
        let bytes = self.cstring_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| BsonError::InvalidUtf8)
    }

    fn string(&mut self) -> Result<String, BsonError> {
        let length = self.length()?;
        if length == 0 {
            return Err(self.format_error("string length must include its terminator"));
        }
        let bytes = self.buf(length - 1)?;
        if self.u8()? != 0 {
            return Err(self.format_error("string is missing its NUL terminator"));
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| BsonError::InvalidUtf8)
    }

    fn verify_value(&self, method: &'static str, expected: BsonType) -> Result<(), BsonError> {
        if self.state != State::Value {
            return Err(self.invalid_state(method));
        }
        if self.current_type != expected {
            return Err(self.format_error(format!(
                "{method} cannot be called when the current type is {}",
                self.current_type
            )));
        }
        Ok(())
    }

    fn next_state(&self) -> State {
        match self.contexts.last().map(|c| c.kind) {
            None => State::Done,
            Some(_) => State::Type,
        }
    }

    fn finish_value(&mut self) {
        self.state = self.next_state();
    }

    /// Reads a container length and pushes its context.
    fn enter(&mut self, kind: ContextKind) -> Result<(), BsonError> {
        let start = self.x;
        let size = self.length()?;
        if size < 5 {
            return Err(self.format_error(format!("container size {size} is too small")));
        }
        if size > self.settings.max_document_size {
            debug!(size, max = self.settings.max_document_size, "bson document too large");
            return Err(BsonError::DocumentTooLarge {
                size,
                max: self.settings.max_document_size,
            });
        }
        if start + size > self.data.len() {
            debug!(position = start, size, "declared size exceeds input");
            return Err(BsonError::UnexpectedEof);
        }
        self.contexts.push(Context { kind, start, size });
        Ok(())
    }

    /// Pops a context and checks the consumed length matches the declared one.
    fn leave(&mut self) -> Result<Option<ContextKind>, BsonError> {
        let Some(ctx) = self.contexts.pop() else {
            return Ok(None);
        };
        if self.x - ctx.start != ctx.size {
            return Err(self.format_error(format!(
                "declared size {} does not match actual size {}",
                ctx.size,
                self.x - ctx.start
            )));
        }
        Ok(Some(ctx.kind))
    }

    /// Representation given to a binary of `sub_type` read from the wire.
    fn guid_representation_for(&self, sub_type: BsonBinarySubType) -> GuidRepresentation {
        match sub_type {
            BsonBinarySubType::UuidStandard => GuidRepresentation::Standard,
            BsonBinarySubType::UuidLegacy => match self.settings.guid_representation {
                GuidRepresentation::Standard => GuidRepresentation::Unspecified,
                other => other,
            },
            _ => GuidRepresentation::Unspecified,
        }
    }
}

impl BsonReader for BsonBinaryReader<'_> {
    fn current_bson_type(&self) -> Result<BsonType, BsonError> {
        match self.state {
            State::Initial | State::ScopeDocument => Ok(BsonType::Document),
            State::Name | State::Value | State::EndOfDocument | State::EndOfArray => {
                Ok(self.current_type)
            }
            State::Type | State::Done => Err(self.invalid_state("current_bson_type")),
        }
    }

    fn read_bson_type(&mut self) -> Result<BsonType, BsonError> {
        if self.state != State::Type {
            return Err(self.invalid_state("read_bson_type"));
        }
        let tag = self.u8()?;
        if tag == 0 {
            self.current_type = BsonType::EndOfDocument;
            self.state = match self.contexts.last().map(|c| c.kind) {
                Some(ContextKind::Array) => State::EndOfArray,
                _ => State::EndOfDocument,
            };
            return Ok(BsonType::EndOfDocument);
        }
        let bson_type = BsonType::try_from(tag).inspect_err(|_| {
            debug!(position = self.x - 1, tag, "unsupported bson element type");
        })?;
        self.current_type = bson_type;
        self.state = State::Name;
        Ok(bson_type)
    }

    fn read_name(&mut self) -> Result<String, BsonError> {
        if self.state != State::Name {
            return Err(self.invalid_state("read_name"));
        }
        let name = self.cstring()?;
        self.state = State::Value;
        Ok(name)
    }

    fn skip_name(&mut self) -> Result<(), BsonError> {
        if self.state != State::Name {
            return Err(self.invalid_state("skip_name"));
        }
        self.cstring_bytes()?;
        self.state = State::Value;
        Ok(())
    }

    fn read_start_document(&mut self) -> Result<(), BsonError> {
        let kind = match self.state {
            State::Initial | State::Done => ContextKind::Document,
            State::ScopeDocument => ContextKind::ScopeDocument,
            State::Value if self.current_type == BsonType::Document => ContextKind::Document,
            State::Value => {
                return Err(self.format_error(format!(
                    "read_start_document cannot be called when the current type is {}",
                    self.current_type
                )))
            }
            _ => return Err(self.invalid_state("read_start_document")),
        };
        self.enter(kind)?;
        self.state = State::Type;
        Ok(())
    }

    fn read_end_document(&mut self) -> Result<(), BsonError> {
        if self.state != State::EndOfDocument {
            return Err(self.invalid_state("read_end_document"));
        }
        if self.leave()? == Some(ContextKind::ScopeDocument) {
            self.leave()?;
        }
        self.finish_value();
        Ok(())
    }

    fn read_start_array(&mut self) -> Result<(), BsonError> {
        self.verify_value("read_start_array", BsonType::Array)?;
        self.enter(ContextKind::Array)?;
        self.state = State::Type;
        Ok(())
    }

    fn read_end_array(&mut self) -> Result<(), BsonError> {
        if self.state != State::EndOfArray {
            return Err(self.invalid_state("read_end_array"));
        }
        self.leave()?;
        self.finish_value();
        Ok(())
    }

    fn read_double(&mut self) -> Result<f64, BsonError> {
        self.verify_value("read_double", BsonType::Double)?;
        let value = f64::from_le_bytes(self.bytes()?);
        self.finish_value();
        Ok(value)
    }

    fn read_string(&mut self) -> Result<String, BsonError> {
        self.verify_value("read_string", BsonType::String)?;
        let value = self.string()?;
        self.finish_value();
        Ok(value)
    }

    fn read_binary_data(&mut self) -> Result<BsonBinaryData, BsonError> {
        self.verify_value("read_binary_data", BsonType::Binary)?;
        let mut length = self.length()?;
        let mut sub_type = BsonBinarySubType::from(self.u8()?);
        if sub_type == BsonBinarySubType::OldBinary && self.settings.fix_old_binary_sub_type_on_input {
            let inner = self.length()?;
            if inner + 4 != length {
                return Err(self.format_error(format!(
                    "old binary inner length {inner} does not match outer length {length}"
                )));
            }
            length = inner;
            sub_type = BsonBinarySubType::Binary;
        }
        let bytes = self.buf(length)?;
        let representation = self.guid_representation_for(sub_type);
        let value = BsonBinaryData::with_guid_representation(bytes, sub_type, representation)
            .inspect_err(|e| debug!(position = self.x, error = %e, "invalid binary value"))?;
        self.finish_value();
        Ok(value)
    }

    fn read_undefined(&mut self) -> Result<(), BsonError> {
        self.verify_value("read_undefined", BsonType::Undefined)?;
        self.finish_value();
        Ok(())
    }

    fn read_object_id(&mut self) -> Result<ObjectId, BsonError> {
        self.verify_value("read_object_id", BsonType::ObjectId)?;
        let bytes: [u8; 12] = self.bytes()?;
        self.finish_value();
        Ok(ObjectId::unpack(&bytes))
    }

    fn read_boolean(&mut self) -> Result<bool, BsonError> {
        self.verify_value("read_boolean", BsonType::Boolean)?;
        let value = match self.u8()? {
            0 => false,
            1 => true,
            b => return Err(self.format_error(format!("invalid boolean byte {b}"))),
        };
        self.finish_value();
        Ok(value)
    }

    fn read_date_time(&mut self) -> Result<i64, BsonError> {
        self.verify_value("read_date_time", BsonType::DateTime)?;
        let value = i64::from_le_bytes(self.bytes()?);
        self.finish_value();
        Ok(value)
    }

    fn read_null(&mut self) -> Result<(), BsonError> {
        self.verify_value("read_null", BsonType::Null)?;
        self.finish_value();
        Ok(())
    }

    fn read_regular_expression(&mut self) -> Result<(String, String), BsonError> {
        self.verify_value("read_regular_expression", BsonType::RegularExpression)?;
        let pattern = self.cstring()?;
        let options = self.cstring()?;
        self.finish_value();
        Ok((pattern, options))
    }

    fn read_javascript(&mut self) -> Result<String, BsonError> {
        self.verify_value("read_javascript", BsonType::JavaScript)?;
        let value = self.string()?;
        self.finish_value();
        Ok(value)
    }

    fn read_symbol(&mut self) -> Result<String, BsonError> {
        self.verify_value("read_symbol", BsonType::Symbol)?;
        let value = self.string()?;
        self.finish_value();
        Ok(value)
    }

    fn read_javascript_with_scope(&mut self) -> Result<String, BsonError> {
        self.verify_value("read_javascript_with_scope", BsonType::JavaScriptWithScope)?;
        self.enter(ContextKind::JavaScriptWithScope)?;
        let code = self.string()?;
        self.state = State::ScopeDocument;
        Ok(code)
    }

    fn read_int32(&mut self) -> Result<i32, BsonError> {
        self.verify_value("read_int32", BsonType::Int32)?;
        let value = self.i32_le()?;
        self.finish_value();
        Ok(value)
    }

    fn read_timestamp(&mut self) -> Result<u64, BsonError> {
        self.verify_value("read_timestamp", BsonType::Timestamp)?;
        let value = u64::from_le_bytes(self.bytes()?);
        self.finish_value();
        Ok(value)
    }

    fn read_int64(&mut self) -> Result<i64, BsonError> {
        self.verify_value("read_int64", BsonType::Int64)?;
        let value = i64::from_le_bytes(self.bytes()?);
        self.finish_value();
        Ok(value)
    }

    fn read_min_key(&mut self) -> Result<(), BsonError> {
        self.verify_value("read_min_key", BsonType::MinKey)?;
        self.finish_value();
        Ok(())
    }

    fn read_max_key(&mut self) -> Result<(), BsonError> {
        self.verify_value("read_max_key", BsonType::MaxKey)?;
        self.finish_value();
        Ok(())
    }
}

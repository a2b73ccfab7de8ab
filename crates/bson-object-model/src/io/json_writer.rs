//! JSON text writer.
//!
//! Shell mode emits mongo shell syntax. Strict mode emits plain JSON and
//! wraps kinds JSON cannot express in `$`-prefixed objects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Datelike, TimeZone, Utc};

use crate::binary::{BsonBinaryData, BsonBinarySubType};
use crate::error::BsonError;
use crate::guid::GuidRepresentation;
use crate::object_id::ObjectId;
use crate::timestamp::BsonTimestamp;

use super::{BsonWriter, JsonOutputMode, JsonWriterSettings};

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
    has_elements: bool,
    indentation: String,
}

/// Writes values as JSON text into an owned string.
pub struct JsonWriter {
    out: String,
    settings: JsonWriterSettings,
    state: State,
    contexts: Vec<Context>,
    name: String,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new(JsonWriterSettings::default())
    }
}

fn quote(s: &str) -> Result<String, BsonError> {
    serde_json::to_string(s).map_err(|e| BsonError::format(e.to_string()))
}

fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_owned()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v:?}")
    }
}

impl JsonWriter {
    pub fn new(settings: JsonWriterSettings) -> Self {
        Self {
            out: String::new(),
            settings,
            state: State::Initial,
            contexts: Vec::new(),
            name: String::new(),
        }
    }

    pub fn settings(&self) -> &JsonWriterSettings {
        &self.settings
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn shell(&self) -> bool {
        self.settings.output_mode == JsonOutputMode::Shell
    }

    fn invalid_state(&self, method: &'static str) -> BsonError {
        BsonError::InvalidState {
            method,
            state: self.state.name(),
        }
    }

    fn parent_indentation(&self) -> &str {
        self.contexts
            .last()
            .map(|c| c.indentation.as_str())
            .unwrap_or("")
    }

    /// Writes the separator and name that precede a value.
    fn begin_value(&mut self, method: &'static str) -> Result<(), BsonError> {
        if !matches!(self.state, State::Value | State::Initial | State::Done) {
            return Err(self.invalid_state(method));
        }
        let indent = self.settings.indent;
        let new_line = self.settings.new_line_chars.clone();
        let name = std::mem::take(&mut self.name);
        let Some(ctx) = self.contexts.last_mut() else {
            return Ok(());
        };
        match ctx.kind {
            ContextKind::Array => {
                if ctx.has_elements {
                    self.out.push_str(", ");
                }
            }
            ContextKind::Document | ContextKind::ScopeDocument => {
                if ctx.has_elements {
                    self.out.push(',');
                }
                if indent {
                    self.out.push_str(&new_line);
                    self.out.push_str(&ctx.indentation);
                } else {
                    self.out.push(' ');
                }
                self.out.push_str(&quote(&name)?);
                self.out.push_str(" : ");
            }
            ContextKind::JavaScriptWithScope => {}
        }
        ctx.has_elements = true;
        Ok(())
    }

    fn finish_value(&mut self) {
        self.state = match self.contexts.last().map(|c| c.kind) {
            None => State::Done,
            Some(ContextKind::Array) => State::Value,
            Some(_) => State::Name,
        };
    }

    fn write_raw(&mut self, method: &'static str, text: &str) -> Result<(), BsonError> {
        self.begin_value(method)?;
        self.out.push_str(text);
        self.finish_value();
        Ok(())
    }

    fn push_context(&mut self, kind: ContextKind) {
        let indentation = format!("{}{}", self.parent_indentation(), self.settings.indent_chars);
        self.contexts.push(Context {
            kind,
            has_elements: false,
            indentation,
        });
    }

    fn binary_text(&self, value: &BsonBinaryData) -> Result<String, BsonError> {
        let sub_type = value.sub_type();
        if self.shell() && sub_type.is_uuid() && value.bytes().len() == 16 {
            let representation = match (sub_type, value.guid_representation()) {
                (BsonBinarySubType::UuidStandard, _) => GuidRepresentation::Standard,
                (_, GuidRepresentation::Unspecified) => self.settings.guid_representation,
                (_, representation) => representation,
            };
            let prefix = match representation {
                GuidRepresentation::Standard => Some("UUID"),
                GuidRepresentation::CSharpLegacy => Some("CSUUID"),
                GuidRepresentation::JavaLegacy => Some("JUUID"),
                GuidRepresentation::PythonLegacy => Some("PYUUID"),
                GuidRepresentation::Unspecified => None,
            };
            if let Some(prefix) = prefix {
                let guid = value.to_guid_with(representation)?;
                return Ok(format!("{prefix}(\"{}\")", guid.hyphenated()));
            }
        }
        let encoded = STANDARD.encode(value.bytes());
        if self.shell() {
            Ok(format!("new BinData({}, \"{encoded}\")", sub_type.to_u8()))
        } else {
            Ok(format!(
                "{{ \"$binary\" : \"{encoded}\", \"$type\" : \"{:02x}\" }}",
                sub_type.to_u8()
            ))
        }
    }

    fn date_time_text(&self, millis: i64) -> String {
        if !self.shell() {
            return format!("{{ \"$date\" : {millis} }}");
        }
        match Utc.timestamp_millis_opt(millis).single() {
            Some(dt) if (1..=9999).contains(&dt.year()) => {
                format!("ISODate(\"{}\")", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
            }
            _ => format!("new Date({millis})"),
        }
    }
}

impl BsonWriter for JsonWriter {
    fn write_name(&mut self, name: &str) -> Result<(), BsonError> {
        if self.state != State::Name {
            return Err(self.invalid_state("write_name"));
        }
        self.name.clear();
        self.name.push_str(name);
        self.state = State::Value;
        Ok(())
    }

    fn write_start_document(&mut self) -> Result<(), BsonError> {
        let kind = if self.state == State::ScopeDocument {
            ContextKind::ScopeDocument
        } else {
            self.begin_value("write_start_document")?;
            ContextKind::Document
        };
        self.out.push('{');
        self.push_context(kind);
        self.state = State::Name;
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), BsonError> {
        let top = self.contexts.last();
        let kind = top.map(|c| c.kind);
        if self.state != State::Name
            || !matches!(kind, Some(ContextKind::Document | ContextKind::ScopeDocument))
        {
            return Err(self.invalid_state("write_end_document"));
        }
        let has_elements = top.is_some_and(|c| c.has_elements);
        self.contexts.pop();
        if has_elements && self.settings.indent {
            let closing = format!("{}{}", self.settings.new_line_chars, self.parent_indentation());
            self.out.push_str(&closing);
            self.out.push('}');
        } else {
            self.out.push_str(" }");
        }
        if kind == Some(ContextKind::ScopeDocument) {
            self.contexts.pop();
            self.out.push_str(" }");
        }
        self.finish_value();
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), BsonError> {
        self.begin_value("write_start_array")?;
        self.out.push('[');
        self.push_context(ContextKind::Array);
        self.state = State::Value;
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), BsonError> {
        if self.state != State::Value || self.contexts.last().map(|c| c.kind) != Some(ContextKind::Array) {
            return Err(self.invalid_state("write_end_array"));
        }
        self.contexts.pop();
        self.out.push(']');
        self.finish_value();
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), BsonError> {
        self.write_raw("write_double", &format_double(value))
    }

    fn write_string(&mut self, value: &str) -> Result<(), BsonError> {
        self.write_raw("write_string", &quote(value)?)
    }

    fn write_binary_data(&mut self, value: &BsonBinaryData) -> Result<(), BsonError> {
        let text = self.binary_text(value)?;
        self.write_raw("write_binary_data", &text)
    }

    fn write_undefined(&mut self) -> Result<(), BsonError> {
        let text = if self.shell() {
            "undefined"
        } else {
            "{ \"$undefined\" : true }"
        };
        self.write_raw("write_undefined", text)
    }

    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), BsonError> {
        let text = if self.shell() {
            format!("ObjectId(\"{value}\")")
        } else {
            format!("{{ \"$oid\" : \"{value}\" }}")
        };
        self.write_raw("write_object_id", &text)
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError> {
        self.write_raw("write_boolean", if value { "true" } else { "false" })
    }

    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError> {
        let text = self.date_time_text(millis);
        self.write_raw("write_date_time", &text)
    }

    fn write_null(&mut self) -> Result<(), BsonError> {
        self.write_raw("write_null", "null")
    }

    fn write_regular_expression(&mut self, pattern: &str, options: &str) -> Result<(), BsonError> {
        let text = if self.shell() {
            let pattern = if pattern.is_empty() { "(?:)" } else { pattern };
            format!("/{}/{options}", pattern.replace('/', "\\/"))
        } else {
            format!(
                "{{ \"$regex\" : {}, \"$options\" : {} }}",
                quote(pattern)?,
                quote(options)?
            )
        };
        self.write_raw("write_regular_expression", &text)
    }

    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError> {
        let text = format!("{{ \"$code\" : {} }}", quote(code)?);
        self.write_raw("write_javascript", &text)
    }

    fn write_symbol(&mut self, name: &str) -> Result<(), BsonError> {
        let text = format!("{{ \"$symbol\" : {} }}", quote(name)?);
        self.write_raw("write_symbol", &text)
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> Result<(), BsonError> {
        self.begin_value("write_javascript_with_scope")?;
        let text = format!("{{ \"$code\" : {}, \"$scope\" : ", quote(code)?);
        self.out.push_str(&text);
        self.push_context(ContextKind::JavaScriptWithScope);
        self.state = State::ScopeDocument;
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<(), BsonError> {
        self.write_raw("write_int32", &value.to_string())
    }

    fn write_timestamp(&mut self, value: u64) -> Result<(), BsonError> {
        let ts = BsonTimestamp::from_value(value);
        let text = if self.shell() {
            ts.to_string()
        } else {
            format!(
                "{{ \"$timestamp\" : {{ \"t\" : {}, \"i\" : {} }} }}",
                ts.seconds(),
                ts.increment()
            )
        };
        self.write_raw("write_timestamp", &text)
    }

    fn write_int64(&mut self, value: i64) -> Result<(), BsonError> {
        let text = if !self.shell() {
            value.to_string()
        } else if i32::try_from(value).is_ok() {
            format!("NumberLong({value})")
        } else {
            format!("NumberLong(\"{value}\")")
        };
        self.write_raw("write_int64", &text)
    }

    fn write_min_key(&mut self) -> Result<(), BsonError> {
        let text = if self.shell() { "MinKey" } else { "{ \"$minKey\" : 1 }" };
        self.write_raw("write_min_key", text)
    }

    fn write_max_key(&mut self) -> Result<(), BsonError> {
        let text = if self.shell() { "MaxKey" } else { "{ \"$maxKey\" : 1 }" };
        self.write_raw("write_max_key", text)
    }
}

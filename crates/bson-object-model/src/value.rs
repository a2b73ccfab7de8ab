//! The BSON value algebra.
//!
//! [`BsonValue`] is a closed sum over every BSON kind. Ordering follows the
//! cross-kind sort order used by the server: numbers compare by value
//! whatever their width, strings compare with symbols by text, date-times
//! compare with timestamps by instant, and every other pair falls back to
//! [`BsonType::sort_rank`].
//!
//! Values are plain owned data. Documents and arrays are mutable containers
//! and are not synchronized; share them across threads behind a lock.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeZone};
use uuid::Uuid;

use crate::array::BsonArray;
use crate::binary::BsonBinaryData;
use crate::bson_type::BsonType;
use crate::canonical;
use crate::date_time::BsonDateTime;
use crate::document::BsonDocument;
use crate::error::BsonError;
use crate::io::{BsonReader, BsonWriter, JsonWriter, JsonWriterSettings};
use crate::javascript::BsonJavaScriptWithScope;
use crate::object_id::ObjectId;
use crate::regular_expression::BsonRegularExpression;
use crate::symbol::BsonSymbol;
use crate::timestamp::BsonTimestamp;

/// A BSON value.
#[derive(Debug, Clone)]
pub enum BsonValue {
    /// BSON double (0x01)
    Double(f64),
    /// BSON UTF-8 string (0x02)
    String(String),
    /// Embedded document (0x03)
    Document(BsonDocument),
    /// Array (0x04)
    Array(BsonArray),
    /// Binary data (0x05)
    Binary(BsonBinaryData),
    /// ObjectId (0x07)
    ObjectId(ObjectId),
    /// Boolean (0x08)
    Boolean(bool),
    /// UTC date-time (0x09)
    DateTime(BsonDateTime),
    /// Null (0x0a)
    Null,
    /// Regular expression (0x0b)
    RegularExpression(BsonRegularExpression),
    /// JavaScript code (0x0d)
    JavaScript(String),
    /// Interned symbol (0x0e)
    Symbol(BsonSymbol),
    /// JavaScript code with scope (0x0f)
    JavaScriptWithScope(BsonJavaScriptWithScope),
    /// Int32 (0x10)
    Int32(i32),
    /// Replication timestamp (0x11)
    Timestamp(BsonTimestamp),
    /// Int64 (0x12)
    Int64(i64),
    /// MinKey (0xff)
    MinKey,
    /// MaxKey (0x7f)
    MaxKey,
    /// Undefined (0x06, deprecated)
    Undefined,
}

// ── Construction ────────────────────────────────────────────────────────────

impl BsonValue {
    /// Int32 value, borrowed from the canonical cache when `value` is in the
    /// cached range.
    pub fn create_int32(value: i32) -> Cow<'static, BsonValue> {
        match canonical::int32(value) {
            Some(cached) => Cow::Borrowed(cached),
            None => Cow::Owned(BsonValue::Int32(value)),
        }
    }

    /// The canonical boolean instance.
    pub fn create_boolean(value: bool) -> &'static BsonValue {
        canonical::boolean(value)
    }

    /// String value; the empty string is served from the canonical registry.
    pub fn create_string(value: impl Into<String>) -> Cow<'static, BsonValue> {
        let value = value.into();
        if value.is_empty() {
            Cow::Borrowed(canonical::empty_string())
        } else {
            Cow::Owned(BsonValue::String(value))
        }
    }

    /// Symbol value interned in the process-wide symbol table.
    pub fn symbol(name: &str) -> BsonValue {
        BsonValue::Symbol(BsonSymbol::new(name))
    }

    pub fn bson_type(&self) -> BsonType {
        match self {
            BsonValue::Double(_) => BsonType::Double,
            BsonValue::String(_) => BsonType::String,
            BsonValue::Document(_) => BsonType::Document,
            BsonValue::Array(_) => BsonType::Array,
            BsonValue::Binary(_) => BsonType::Binary,
            BsonValue::ObjectId(_) => BsonType::ObjectId,
            BsonValue::Boolean(_) => BsonType::Boolean,
            BsonValue::DateTime(_) => BsonType::DateTime,
            BsonValue::Null => BsonType::Null,
            BsonValue::RegularExpression(_) => BsonType::RegularExpression,
            BsonValue::JavaScript(_) => BsonType::JavaScript,
            BsonValue::Symbol(_) => BsonType::Symbol,
            BsonValue::JavaScriptWithScope(_) => BsonType::JavaScriptWithScope,
            BsonValue::Int32(_) => BsonType::Int32,
            BsonValue::Timestamp(_) => BsonType::Timestamp,
            BsonValue::Int64(_) => BsonType::Int64,
            BsonValue::MinKey => BsonType::MinKey,
            BsonValue::MaxKey => BsonType::MaxKey,
            BsonValue::Undefined => BsonType::Undefined,
        }
    }
}

// ── Predicates ──────────────────────────────────────────────────────────────

impl BsonValue {
    pub fn is_numeric(&self) -> bool {
        self.bson_type().is_numeric()
    }

    pub fn is_double(&self) -> bool {
        matches!(self, BsonValue::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BsonValue::String(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, BsonValue::Document(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, BsonValue::Array(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, BsonValue::Binary(_))
    }

    /// Binary value holding a GUID (subtype 3 or 4).
    pub fn is_guid(&self) -> bool {
        matches!(self, BsonValue::Binary(b) if b.sub_type().is_uuid())
    }

    pub fn is_object_id(&self) -> bool {
        matches!(self, BsonValue::ObjectId(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, BsonValue::Boolean(_))
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self, BsonValue::DateTime(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BsonValue::Null)
    }

    pub fn is_regular_expression(&self) -> bool {
        matches!(self, BsonValue::RegularExpression(_))
    }

    pub fn is_javascript(&self) -> bool {
        matches!(self, BsonValue::JavaScript(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, BsonValue::Symbol(_))
    }

    pub fn is_javascript_with_scope(&self) -> bool {
        matches!(self, BsonValue::JavaScriptWithScope(_))
    }

    pub fn is_int32(&self) -> bool {
        matches!(self, BsonValue::Int32(_))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, BsonValue::Timestamp(_))
    }

    pub fn is_int64(&self) -> bool {
        matches!(self, BsonValue::Int64(_))
    }

    pub fn is_min_key(&self) -> bool {
        matches!(self, BsonValue::MinKey)
    }

    pub fn is_max_key(&self) -> bool {
        matches!(self, BsonValue::MaxKey)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, BsonValue::Undefined)
    }
}

// ── Typed accessors ─────────────────────────────────────────────────────────
//
// Each accessor fails with `InvalidCast` on any other kind.

impl BsonValue {
    pub fn as_f64(&self) -> Result<f64, BsonError> {
        match self {
            BsonValue::Double(v) => Ok(*v),
            other => Err(BsonError::cast(other.bson_type(), "Double")),
        }
    }

    pub fn as_str(&self) -> Result<&str, BsonError> {
        match self {
            BsonValue::String(s) => Ok(s),
            other => Err(BsonError::cast(other.bson_type(), "String")),
        }
    }

    pub fn as_document(&self) -> Result<&BsonDocument, BsonError> {
        match self {
            BsonValue::Document(d) => Ok(d),
            other => Err(BsonError::cast(other.bson_type(), "Document")),
        }
    }

    pub fn as_document_mut(&mut self) -> Result<&mut BsonDocument, BsonError> {
        match self {
            BsonValue::Document(d) => Ok(d),
            other => Err(BsonError::cast(other.bson_type(), "Document")),
        }
    }

    pub fn as_array(&self) -> Result<&BsonArray, BsonError> {
        match self {
            BsonValue::Array(a) => Ok(a),
            other => Err(BsonError::cast(other.bson_type(), "Array")),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut BsonArray, BsonError> {
        match self {
            BsonValue::Array(a) => Ok(a),
            other => Err(BsonError::cast(other.bson_type(), "Array")),
        }
    }

    pub fn as_binary(&self) -> Result<&BsonBinaryData, BsonError> {
        match self {
            BsonValue::Binary(b) => Ok(b),
            other => Err(BsonError::cast(other.bson_type(), "Binary")),
        }
    }

    /// GUID stored in a subtype 3 or 4 binary, decoded with its own
    /// representation.
    pub fn as_guid(&self) -> Result<Uuid, BsonError> {
        match self {
            BsonValue::Binary(b) if b.sub_type().is_uuid() => b.to_guid(),
            other => Err(BsonError::cast(other.bson_type(), "Guid")),
        }
    }

    pub fn as_object_id(&self) -> Result<ObjectId, BsonError> {
        match self {
            BsonValue::ObjectId(id) => Ok(*id),
            other => Err(BsonError::cast(other.bson_type(), "ObjectId")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, BsonError> {
        match self {
            BsonValue::Boolean(b) => Ok(*b),
            other => Err(BsonError::cast(other.bson_type(), "Boolean")),
        }
    }

    pub fn as_date_time(&self) -> Result<BsonDateTime, BsonError> {
        match self {
            BsonValue::DateTime(dt) => Ok(*dt),
            other => Err(BsonError::cast(other.bson_type(), "DateTime")),
        }
    }

    pub fn as_regular_expression(&self) -> Result<&BsonRegularExpression, BsonError> {
        match self {
            BsonValue::RegularExpression(re) => Ok(re),
            other => Err(BsonError::cast(other.bson_type(), "RegularExpression")),
        }
    }

    pub fn as_javascript(&self) -> Result<&str, BsonError> {
        match self {
            BsonValue::JavaScript(code) => Ok(code),
            BsonValue::JavaScriptWithScope(js) => Ok(js.code()),
            other => Err(BsonError::cast(other.bson_type(), "JavaScript")),
        }
    }

    pub fn as_symbol(&self) -> Result<&BsonSymbol, BsonError> {
        match self {
            BsonValue::Symbol(s) => Ok(s),
            other => Err(BsonError::cast(other.bson_type(), "Symbol")),
        }
    }

    pub fn as_javascript_with_scope(&self) -> Result<&BsonJavaScriptWithScope, BsonError> {
        match self {
            BsonValue::JavaScriptWithScope(js) => Ok(js),
            other => Err(BsonError::cast(other.bson_type(), "JavaScriptWithScope")),
        }
    }

    pub fn as_i32(&self) -> Result<i32, BsonError> {
        match self {
            BsonValue::Int32(v) => Ok(*v),
            other => Err(BsonError::cast(other.bson_type(), "Int32")),
        }
    }

    pub fn as_timestamp(&self) -> Result<BsonTimestamp, BsonError> {
        match self {
            BsonValue::Timestamp(ts) => Ok(*ts),
            other => Err(BsonError::cast(other.bson_type(), "Timestamp")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, BsonError> {
        match self {
            BsonValue::Int64(v) => Ok(*v),
            other => Err(BsonError::cast(other.bson_type(), "Int64")),
        }
    }
}

// ── Coercion ────────────────────────────────────────────────────────────────

fn conversion(from: BsonType, to: &'static str, reason: impl Into<String>) -> BsonError {
    BsonError::Conversion {
        from,
        to,
        reason: reason.into(),
    }
}

fn double_to_integer(v: f64, to: &'static str, min: f64, max: f64) -> Result<f64, BsonError> {
    if v.is_nan() {
        return Err(conversion(BsonType::Double, to, "value is NaN"));
    }
    let truncated = v.trunc();
    if truncated < min || truncated > max {
        return Err(conversion(BsonType::Double, to, format!("{v} is out of range")));
    }
    Ok(truncated)
}

impl BsonValue {
    /// Truthiness.
    ///
    /// | kind | result |
    /// |---|---|
    /// | Boolean | the value |
    /// | Double | false for NaN and zero |
    /// | Int32, Int64 | false for zero |
    /// | Null, Undefined | false |
    /// | String | false when empty |
    /// | anything else | true |
    pub fn to_boolean(&self) -> bool {
        match self {
            BsonValue::Boolean(b) => *b,
            BsonValue::Double(v) => !(v.is_nan() || *v == 0.0),
            BsonValue::Int32(v) => *v != 0,
            BsonValue::Int64(v) => *v != 0,
            BsonValue::Null | BsonValue::Undefined => false,
            BsonValue::String(s) => !s.is_empty(),
            BsonValue::Document(_)
            | BsonValue::Array(_)
            | BsonValue::Binary(_)
            | BsonValue::ObjectId(_)
            | BsonValue::DateTime(_)
            | BsonValue::RegularExpression(_)
            | BsonValue::JavaScript(_)
            | BsonValue::Symbol(_)
            | BsonValue::JavaScriptWithScope(_)
            | BsonValue::Timestamp(_)
            | BsonValue::MinKey
            | BsonValue::MaxKey => true,
        }
    }

    /// Int32 from Double (truncated toward zero), Int32, Int64 or a decimal
    /// String. Out-of-range values fail instead of wrapping.
    pub fn to_int32(&self) -> Result<i32, BsonError> {
        match self {
            BsonValue::Double(v) => {
                double_to_integer(*v, "Int32", i32::MIN as f64, i32::MAX as f64).map(|t| t as i32)
            }
            BsonValue::Int32(v) => Ok(*v),
            BsonValue::Int64(v) => i32::try_from(*v)
                .map_err(|_| conversion(BsonType::Int64, "Int32", format!("{v} is out of range"))),
            BsonValue::String(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|e| conversion(BsonType::String, "Int32", format!("{s:?}: {e}"))),
            other => Err(BsonError::cast(other.bson_type(), "Int32")),
        }
    }

    /// Int64 from Double (truncated toward zero), Int32, Int64 or a decimal
    /// String.
    pub fn to_int64(&self) -> Result<i64, BsonError> {
        match self {
            // i64::MAX is not representable; 2^63 itself is out of range.
            BsonValue::Double(v) => {
                if v.trunc() >= 9_223_372_036_854_775_808.0 {
                    return Err(conversion(BsonType::Double, "Int64", format!("{v} is out of range")));
                }
                double_to_integer(*v, "Int64", i64::MIN as f64, f64::MAX).map(|t| t as i64)
            }
            BsonValue::Int32(v) => Ok(*v as i64),
            BsonValue::Int64(v) => Ok(*v),
            BsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| conversion(BsonType::String, "Int64", format!("{s:?}: {e}"))),
            other => Err(BsonError::cast(other.bson_type(), "Int64")),
        }
    }

    /// Double from Double, Int32, Int64 (nearest representable) or a String.
    pub fn to_double(&self) -> Result<f64, BsonError> {
        match self {
            BsonValue::Double(v) => Ok(*v),
            BsonValue::Int32(v) => Ok(*v as f64),
            BsonValue::Int64(v) => Ok(*v as f64),
            BsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| conversion(BsonType::String, "Double", format!("{s:?}: {e}"))),
            other => Err(BsonError::cast(other.bson_type(), "Double")),
        }
    }
}

// ── Ordering ────────────────────────────────────────────────────────────────

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// NaN sorts below every other double and equal to itself.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an i64 against a double.
fn cmp_i64_f64(i: i64, d: f64) -> Ordering {
    if d.is_nan() {
        return Ordering::Greater;
    }
    if d >= TWO_POW_63 {
        return Ordering::Less;
    }
    if d < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0f64.partial_cmp(&(d - whole)).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

fn cmp_numeric(a: &BsonValue, b: &BsonValue) -> Option<Ordering> {
    use BsonValue::*;
    Some(match (a, b) {
        (Double(x), Double(y)) => cmp_f64(*x, *y),
        (Double(x), Int32(y)) => cmp_i64_f64(*y as i64, *x).reverse(),
        (Double(x), Int64(y)) => cmp_i64_f64(*y, *x).reverse(),
        (Int32(x), Double(y)) => cmp_i64_f64(*x as i64, *y),
        (Int64(x), Double(y)) => cmp_i64_f64(*x, *y),
        (Int32(x), Int32(y)) => x.cmp(y),
        (Int32(x), Int64(y)) => (*x as i64).cmp(y),
        (Int64(x), Int32(y)) => x.cmp(&(*y as i64)),
        (Int64(x), Int64(y)) => x.cmp(y),
        _ => return None,
    })
}

/// Date-times and timestamps share one timeline: milliseconds first, then a
/// date-time before a timestamp at the same millisecond, then the
/// timestamp's packed value.
fn time_key(value: &BsonValue) -> Option<(i64, u8, u64)> {
    match value {
        BsonValue::DateTime(dt) => Some((dt.millis(), 0, 0)),
        BsonValue::Timestamp(ts) => Some((ts.seconds() as i64 * 1000, 1, ts.value())),
        _ => None,
    }
}

fn text(value: &BsonValue) -> Option<&str> {
    match value {
        BsonValue::String(s) => Some(s),
        BsonValue::Symbol(s) => Some(s.name()),
        _ => None,
    }
}

impl BsonValue {
    /// Total order across all kinds.
    pub fn compare_to(&self, other: &BsonValue) -> Ordering {
        if std::ptr::eq(self, other) {
            return Ordering::Equal;
        }
        if let Some(ord) = cmp_numeric(self, other) {
            return ord;
        }
        if let (Some(a), Some(b)) = (text(self), text(other)) {
            return a.cmp(b);
        }
        if let (Some(a), Some(b)) = (time_key(self), time_key(other)) {
            return a.cmp(&b);
        }
        match self.compare_type_to(other) {
            Ordering::Equal => self.compare_same_kind(other),
            ord => ord,
        }
    }

    /// Comparison against an optional handle; an absent value sorts below
    /// every present one, so `self` is greater.
    pub fn compare_to_option(&self, other: Option<&BsonValue>) -> Ordering {
        match other {
            Some(other) => self.compare_to(other),
            None => Ordering::Greater,
        }
    }

    /// Compares kinds only, by sort rank.
    pub fn compare_type_to(&self, other: &BsonValue) -> Ordering {
        self.bson_type()
            .sort_rank()
            .cmp(&other.bson_type().sort_rank())
    }

    fn compare_same_kind(&self, other: &BsonValue) -> Ordering {
        use BsonValue::*;
        match (self, other) {
            (Document(a), Document(b)) => a.compare_to(b),
            (Array(a), Array(b)) => a.compare_to(b),
            (Binary(a), Binary(b)) => a.compare_to(b),
            (ObjectId(a), ObjectId(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (RegularExpression(a), RegularExpression(b)) => a
                .pattern()
                .cmp(b.pattern())
                .then_with(|| a.options().cmp(b.options())),
            (JavaScript(a), JavaScript(b)) => a.cmp(b),
            (JavaScriptWithScope(a), JavaScriptWithScope(b)) => a.compare_to(b),
            (Null, Null) | (Undefined, Undefined) | (MinKey, MinKey) | (MaxKey, MaxKey) => {
                Ordering::Equal
            }
            _ => self.bson_type().cmp(&other.bson_type()),
        }
    }
}

// ── Equality and hashing ────────────────────────────────────────────────────

impl PartialEq for BsonValue {
    /// Numbers are equal across Double, Int32 and Int64 when their values
    /// are; every other kind only equals its own kind.
    fn eq(&self, other: &Self) -> bool {
        use BsonValue::*;
        if std::ptr::eq(self, other) {
            return true;
        }
        if let Some(ord) = cmp_numeric(self, other) {
            return ord == Ordering::Equal;
        }
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Document(a), Document(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (ObjectId(a), ObjectId(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (RegularExpression(a), RegularExpression(b)) => a == b,
            (JavaScript(a), JavaScript(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (JavaScriptWithScope(a), JavaScriptWithScope(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Null, Null) | (Undefined, Undefined) | (MinKey, MinKey) | (MaxKey, MaxKey) => true,
            _ => false,
        }
    }
}

/// NaN equals NaN under this model, which keeps equality reflexive.
impl Eq for BsonValue {}

#[derive(Hash)]
enum NumericKey {
    Integral(i64),
    Fractional(u64),
    NaN,
}

fn numeric_key(value: &BsonValue) -> Option<NumericKey> {
    match value {
        BsonValue::Int32(v) => Some(NumericKey::Integral(*v as i64)),
        BsonValue::Int64(v) => Some(NumericKey::Integral(*v)),
        BsonValue::Double(d) => Some(if d.is_nan() {
            NumericKey::NaN
        } else if d.fract() == 0.0 && *d >= -TWO_POW_63 && *d < TWO_POW_63 {
            NumericKey::Integral(*d as i64)
        } else {
            NumericKey::Fractional(d.to_bits())
        }),
        _ => None,
    }
}

const NUMERIC_HASH_SEED: u8 = 0xfe;

impl Hash for BsonValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(key) = numeric_key(self) {
            state.write_u8(NUMERIC_HASH_SEED);
            key.hash(state);
            return;
        }
        state.write_u8(self.bson_type().tag());
        match self {
            BsonValue::String(s) | BsonValue::JavaScript(s) => s.hash(state),
            BsonValue::Document(d) => d.hash(state),
            BsonValue::Array(a) => a.hash(state),
            BsonValue::Binary(b) => b.hash(state),
            BsonValue::ObjectId(id) => id.hash(state),
            BsonValue::Boolean(b) => b.hash(state),
            BsonValue::DateTime(dt) => dt.hash(state),
            BsonValue::RegularExpression(re) => re.hash(state),
            BsonValue::Symbol(s) => s.hash(state),
            BsonValue::JavaScriptWithScope(js) => js.hash(state),
            BsonValue::Timestamp(ts) => ts.hash(state),
            BsonValue::Double(_) | BsonValue::Int32(_) | BsonValue::Int64(_) => {}
            BsonValue::Null | BsonValue::Undefined | BsonValue::MinKey | BsonValue::MaxKey => {}
        }
    }
}

// ── Cloning ─────────────────────────────────────────────────────────────────

impl BsonValue {
    /// Copies a container's structure. Scalars are immutable and come back
    /// unchanged.
    ///
    /// Children are exclusively owned, so the copy owns its children too;
    /// nothing is shared with `self` after the call.
    pub fn shallow_clone(&self) -> BsonValue {
        match self {
            BsonValue::Document(d) => BsonValue::Document(d.shallow_clone()),
            BsonValue::Array(a) => BsonValue::Array(a.shallow_clone()),
            other => other.clone(),
        }
    }

    /// Recursively clones containers, including a code-with-scope's scope.
    pub fn deep_clone(&self) -> BsonValue {
        match self {
            BsonValue::Document(d) => BsonValue::Document(d.deep_clone()),
            BsonValue::Array(a) => BsonValue::Array(a.deep_clone()),
            BsonValue::JavaScriptWithScope(js) => BsonValue::JavaScriptWithScope(js.deep_clone()),
            other => other.clone(),
        }
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl BsonValue {
    /// Issues the writer calls for this value. The element name, if any,
    /// must already have been written.
    pub fn write_to<W: BsonWriter + ?Sized>(&self, writer: &mut W) -> Result<(), BsonError> {
        match self {
            BsonValue::Double(v) => writer.write_double(*v),
            BsonValue::String(s) => writer.write_string(s),
            BsonValue::Document(d) => d.write_to(writer),
            BsonValue::Array(a) => a.write_to(writer),
            BsonValue::Binary(b) => writer.write_binary_data(b),
            BsonValue::ObjectId(id) => writer.write_object_id(id),
            BsonValue::Boolean(b) => writer.write_boolean(*b),
            BsonValue::DateTime(dt) => writer.write_date_time(dt.millis()),
            BsonValue::Null => writer.write_null(),
            BsonValue::RegularExpression(re) => {
                writer.write_regular_expression(re.pattern(), re.options())
            }
            BsonValue::JavaScript(code) => writer.write_javascript(code),
            BsonValue::Symbol(s) => writer.write_symbol(s.name()),
            BsonValue::JavaScriptWithScope(js) => {
                writer.write_javascript_with_scope(js.code())?;
                js.scope().write_to(writer)
            }
            BsonValue::Int32(v) => writer.write_int32(*v),
            BsonValue::Timestamp(ts) => writer.write_timestamp(ts.value()),
            BsonValue::Int64(v) => writer.write_int64(*v),
            BsonValue::MinKey => writer.write_min_key(),
            BsonValue::MaxKey => writer.write_max_key(),
            BsonValue::Undefined => writer.write_undefined(),
        }
    }

    /// Reads the value at the reader's current position.
    pub fn read_from<R: BsonReader + ?Sized>(reader: &mut R) -> Result<BsonValue, BsonError> {
        let bson_type = reader.current_bson_type()?;
        Ok(match bson_type {
            BsonType::Double => BsonValue::Double(reader.read_double()?),
            BsonType::String => BsonValue::create_string(reader.read_string()?).into_owned(),
            BsonType::Document => BsonValue::Document(BsonDocument::read_from(reader)?),
            BsonType::Array => BsonValue::Array(BsonArray::read_from(reader)?),
            BsonType::Binary => BsonValue::Binary(reader.read_binary_data()?),
            BsonType::Undefined => {
                reader.read_undefined()?;
                BsonValue::Undefined
            }
            BsonType::ObjectId => BsonValue::ObjectId(reader.read_object_id()?),
            BsonType::Boolean => BsonValue::Boolean(reader.read_boolean()?),
            BsonType::DateTime => {
                BsonValue::DateTime(BsonDateTime::from_millis(reader.read_date_time()?))
            }
            BsonType::Null => {
                reader.read_null()?;
                BsonValue::Null
            }
            BsonType::RegularExpression => {
                let (pattern, options) = reader.read_regular_expression()?;
                BsonValue::RegularExpression(BsonRegularExpression::with_options(pattern, options))
            }
            BsonType::JavaScript => BsonValue::JavaScript(reader.read_javascript()?),
            BsonType::Symbol => BsonValue::symbol(&reader.read_symbol()?),
            BsonType::JavaScriptWithScope => {
                let code = reader.read_javascript_with_scope()?;
                let scope = BsonDocument::read_from(reader)?;
                BsonValue::JavaScriptWithScope(BsonJavaScriptWithScope::new(code, scope))
            }
            BsonType::Int32 => BsonValue::create_int32(reader.read_int32()?).into_owned(),
            BsonType::Timestamp => {
                BsonValue::Timestamp(BsonTimestamp::from_value(reader.read_timestamp()?))
            }
            BsonType::Int64 => BsonValue::Int64(reader.read_int64()?),
            BsonType::MinKey => {
                reader.read_min_key()?;
                BsonValue::MinKey
            }
            BsonType::MaxKey => {
                reader.read_max_key()?;
                BsonValue::MaxKey
            }
            BsonType::EndOfDocument => {
                return Err(BsonError::format("expected a value, found end of document"))
            }
        })
    }

    /// JSON text of this value under `settings`.
    pub fn to_json_with(&self, settings: JsonWriterSettings) -> Result<String, BsonError> {
        let mut writer = JsonWriter::new(settings);
        self.write_to(&mut writer)?;
        Ok(writer.into_string())
    }
}

fn write_double(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{v}")
    }
}

impl fmt::Display for BsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BsonValue::Double(v) => write_double(f, *v),
            BsonValue::String(s) => f.write_str(s),
            BsonValue::Document(d) => fmt::Display::fmt(d, f),
            BsonValue::Array(a) => fmt::Display::fmt(a, f),
            BsonValue::Binary(_) | BsonValue::JavaScriptWithScope(_) => {
                let json = self
                    .to_json_with(JsonWriterSettings::default())
                    .map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            BsonValue::ObjectId(id) => fmt::Display::fmt(id, f),
            BsonValue::Boolean(b) => fmt::Display::fmt(b, f),
            BsonValue::DateTime(dt) => fmt::Display::fmt(dt, f),
            BsonValue::Null => f.write_str("BsonNull"),
            BsonValue::RegularExpression(re) => fmt::Display::fmt(re, f),
            BsonValue::JavaScript(code) => f.write_str(code),
            BsonValue::Symbol(s) => fmt::Display::fmt(s, f),
            BsonValue::Int32(v) => fmt::Display::fmt(v, f),
            BsonValue::Timestamp(ts) => fmt::Display::fmt(ts, f),
            BsonValue::Int64(v) => fmt::Display::fmt(v, f),
            BsonValue::MinKey => f.write_str("BsonMinKey"),
            BsonValue::MaxKey => f.write_str("BsonMaxKey"),
            BsonValue::Undefined => f.write_str("BsonUndefined"),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

impl From<f64> for BsonValue {
    fn from(v: f64) -> Self {
        BsonValue::Double(v)
    }
}

impl From<i32> for BsonValue {
    fn from(v: i32) -> Self {
        BsonValue::Int32(v)
    }
}

impl From<i64> for BsonValue {
    fn from(v: i64) -> Self {
        BsonValue::Int64(v)
    }
}

impl From<bool> for BsonValue {
    fn from(v: bool) -> Self {
        BsonValue::Boolean(v)
    }
}

impl From<&str> for BsonValue {
    fn from(v: &str) -> Self {
        BsonValue::String(v.to_owned())
    }
}

impl From<String> for BsonValue {
    fn from(v: String) -> Self {
        BsonValue::String(v)
    }
}

impl From<ObjectId> for BsonValue {
    fn from(v: ObjectId) -> Self {
        BsonValue::ObjectId(v)
    }
}

impl From<BsonDocument> for BsonValue {
    fn from(v: BsonDocument) -> Self {
        BsonValue::Document(v)
    }
}

impl From<BsonArray> for BsonValue {
    fn from(v: BsonArray) -> Self {
        BsonValue::Array(v)
    }
}

impl From<Vec<BsonValue>> for BsonValue {
    fn from(v: Vec<BsonValue>) -> Self {
        BsonValue::Array(BsonArray::from(v))
    }
}

impl From<BsonBinaryData> for BsonValue {
    fn from(v: BsonBinaryData) -> Self {
        BsonValue::Binary(v)
    }
}

impl From<Vec<u8>> for BsonValue {
    fn from(v: Vec<u8>) -> Self {
        BsonValue::Binary(BsonBinaryData::new(v))
    }
}

impl From<BsonDateTime> for BsonValue {
    fn from(v: BsonDateTime) -> Self {
        BsonValue::DateTime(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for BsonValue {
    fn from(v: DateTime<Tz>) -> Self {
        BsonValue::DateTime(v.into())
    }
}

impl From<BsonRegularExpression> for BsonValue {
    fn from(v: BsonRegularExpression) -> Self {
        BsonValue::RegularExpression(v)
    }
}

impl From<BsonSymbol> for BsonValue {
    fn from(v: BsonSymbol) -> Self {
        BsonValue::Symbol(v)
    }
}

impl From<BsonTimestamp> for BsonValue {
    fn from(v: BsonTimestamp) -> Self {
        BsonValue::Timestamp(v)
    }
}

impl From<BsonJavaScriptWithScope> for BsonValue {
    fn from(v: BsonJavaScriptWithScope) -> Self {
        BsonValue::JavaScriptWithScope(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &BsonValue) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn numbers_are_cross_equal() {
        let cases = [BsonValue::Int32(5), BsonValue::Int64(5), BsonValue::Double(5.0)];
        for a in &cases {
            for b in &cases {
                assert_eq!(a, b);
                assert_eq!(a.compare_to(b), Ordering::Equal);
                assert_eq!(hash_of(a), hash_of(b));
            }
        }
        assert_ne!(BsonValue::Int32(5), BsonValue::from("5"));
    }

    #[test]
    fn large_int64_is_not_equal_to_nearby_double() {
        let big = BsonValue::Int64((1 << 53) + 1);
        let near = BsonValue::Double((1u64 << 53) as f64);
        assert_ne!(big, near);
        assert_eq!(big.compare_to(&near), Ordering::Greater);
        assert_eq!(near.compare_to(&big), Ordering::Less);
    }

    #[test]
    fn fractional_double_orders_between_integers() {
        let d = BsonValue::Double(1.5);
        assert_eq!(BsonValue::Int32(1).compare_to(&d), Ordering::Less);
        assert_eq!(BsonValue::Int64(2).compare_to(&d), Ordering::Greater);
        let neg = BsonValue::Double(-1.5);
        assert_eq!(BsonValue::Int32(-1).compare_to(&neg), Ordering::Greater);
        assert_eq!(BsonValue::Int32(-2).compare_to(&neg), Ordering::Less);
    }

    #[test]
    fn nan_sorts_first_among_numbers_and_equals_itself() {
        let nan = BsonValue::Double(f64::NAN);
        assert_eq!(nan, BsonValue::Double(f64::NAN));
        assert_eq!(nan.compare_to(&BsonValue::Int64(i64::MIN)), Ordering::Less);
        assert_eq!(nan.compare_to(&BsonValue::Double(f64::NEG_INFINITY)), Ordering::Less);
        assert_eq!(hash_of(&nan), hash_of(&BsonValue::Double(f64::NAN)));
    }

    #[test]
    fn negative_zero_equals_zero() {
        assert_eq!(BsonValue::Double(-0.0), BsonValue::Int32(0));
        assert_eq!(hash_of(&BsonValue::Double(-0.0)), hash_of(&BsonValue::Int64(0)));
    }

    #[test]
    fn string_and_symbol_compare_by_text_but_are_not_equal() {
        let s = BsonValue::from("x");
        let sym = BsonValue::symbol("x");
        assert_eq!(s.compare_to(&sym), Ordering::Equal);
        assert_ne!(s, sym);
        assert_eq!(BsonValue::from("a").compare_to(&BsonValue::symbol("b")), Ordering::Less);
    }

    #[test]
    fn date_time_and_timestamp_share_a_timeline() {
        let dt = BsonValue::DateTime(BsonDateTime::from_millis(2_000));
        let ts_before = BsonValue::Timestamp(BsonTimestamp::new(1, 99));
        let ts_same = BsonValue::Timestamp(BsonTimestamp::new(2, 0));
        assert_eq!(dt.compare_to(&ts_before), Ordering::Greater);
        assert_eq!(dt.compare_to(&ts_same), Ordering::Less);
        assert_eq!(ts_same.compare_to(&dt), Ordering::Greater);
        assert_ne!(dt, ts_same);
    }

    #[test]
    fn kinds_without_cross_rules_use_rank() {
        let ordered = [
            BsonValue::MinKey,
            BsonValue::Undefined,
            BsonValue::Null,
            BsonValue::Int32(1_000),
            BsonValue::from("a"),
            BsonValue::Document(BsonDocument::new()),
            BsonValue::Array(BsonArray::new()),
            BsonValue::Binary(BsonBinaryData::new(vec![])),
            BsonValue::ObjectId(ObjectId::empty()),
            BsonValue::Boolean(false),
            BsonValue::DateTime(BsonDateTime::from_millis(0)),
            BsonValue::RegularExpression(BsonRegularExpression::new("a")),
            BsonValue::JavaScript("x".into()),
            BsonValue::JavaScriptWithScope(BsonJavaScriptWithScope::new("x", BsonDocument::new())),
            BsonValue::MaxKey,
        ];
        for (i, a) in ordered.iter().enumerate() {
            for (j, b) in ordered.iter().enumerate() {
                assert_eq!(a.compare_to(b), i.cmp(&j), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn absent_handle_sorts_below_every_value() {
        assert_eq!(BsonValue::MinKey.compare_to_option(None), Ordering::Greater);
        assert_eq!(BsonValue::Null.compare_to_option(None), Ordering::Greater);
        assert_eq!(
            BsonValue::Null.compare_to_option(Some(&BsonValue::Null)),
            Ordering::Equal
        );
    }

    #[test]
    fn to_boolean_table() {
        assert!(!BsonValue::Double(f64::NAN).to_boolean());
        assert!(!BsonValue::Double(0.0).to_boolean());
        assert!(BsonValue::Double(0.1).to_boolean());
        assert!(!BsonValue::Int32(0).to_boolean());
        assert!(BsonValue::Int64(-1).to_boolean());
        assert!(!BsonValue::Null.to_boolean());
        assert!(!BsonValue::Undefined.to_boolean());
        assert!(!BsonValue::from("").to_boolean());
        assert!(BsonValue::from("false").to_boolean());
        assert!(BsonValue::Document(BsonDocument::new()).to_boolean());
        assert!(BsonValue::MinKey.to_boolean());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(BsonValue::Double(-3.9).to_int32().unwrap(), -3);
        assert_eq!(BsonValue::from(" 42 ").to_int64().unwrap(), 42);
        assert_eq!(BsonValue::Int64(7).to_double().unwrap(), 7.0);
        assert!(matches!(
            BsonValue::Int64(i64::MAX).to_int32(),
            Err(BsonError::Conversion { .. })
        ));
        assert!(matches!(
            BsonValue::Double(f64::NAN).to_int64(),
            Err(BsonError::Conversion { .. })
        ));
        assert!(matches!(
            BsonValue::Double(1e19).to_int64(),
            Err(BsonError::Conversion { .. })
        ));
        assert!(matches!(
            BsonValue::from("abc").to_double(),
            Err(BsonError::Conversion { .. })
        ));
        assert!(matches!(
            BsonValue::Boolean(true).to_int32(),
            Err(BsonError::InvalidCast { .. })
        ));
    }

    #[test]
    fn typed_accessors_fail_on_wrong_kind() {
        assert_eq!(BsonValue::Int32(1).as_i32().unwrap(), 1);
        assert_eq!(
            BsonValue::Int32(1).as_str(),
            Err(BsonError::InvalidCast {
                from: BsonType::Int32,
                to: "String"
            })
        );
        assert!(BsonValue::Int64(1).as_i32().is_err());
        assert!(BsonValue::Null.as_document().is_err());
    }

    #[test]
    fn canonical_instances() {
        assert!(std::ptr::eq(
            BsonValue::create_boolean(true),
            BsonValue::create_boolean(true)
        ));
        let a = BsonValue::create_int32(5);
        let b = BsonValue::create_int32(5);
        match (&a, &b) {
            (Cow::Borrowed(x), Cow::Borrowed(y)) => assert!(std::ptr::eq(*x, *y)),
            _ => panic!("cached Int32 must be borrowed"),
        }
        let c = BsonValue::create_int32(5000);
        let d = BsonValue::create_int32(5000);
        assert!(matches!(c, Cow::Owned(_)));
        assert_eq!(c, d);
        assert!(matches!(BsonValue::create_string(""), Cow::Borrowed(_)));
    }

    #[test]
    fn display_forms() {
        let id = ObjectId::parse("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(BsonValue::from(id).to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(
            BsonValue::from(BsonRegularExpression::with_options("a+", "i")).to_string(),
            "/a+/i"
        );
        assert_eq!(BsonValue::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(BsonValue::Null.to_string(), "BsonNull");
    }

    #[test]
    fn deep_clone_is_equal_and_independent() {
        let mut scope = BsonDocument::new();
        scope.add("x", 1).unwrap();
        let js = BsonValue::from(BsonJavaScriptWithScope::new("x", scope));
        let mut copy = js.deep_clone();
        assert_eq!(copy, js);
        if let BsonValue::JavaScriptWithScope(inner) = &mut copy {
            inner.scope_mut().set("x", 2).unwrap();
        }
        assert_ne!(copy, js);
    }
}

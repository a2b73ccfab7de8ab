//! Registry of canonical singleton values.
//!
//! The registry is built once, on first access, and is read-only afterwards,
//! so the returned references can be shared freely across threads. Two
//! requests for the same canonical value return the same address, which lets
//! equality take an identity fast path.

use once_cell::sync::Lazy;

use crate::value::BsonValue;

/// Smallest Int32 served from the cache.
pub const MIN_CACHED_INT32: i32 = -10;
/// Largest Int32 served from the cache.
pub const MAX_CACHED_INT32: i32 = 100;

struct Registry {
    null: BsonValue,
    undefined: BsonValue,
    min_key: BsonValue,
    max_key: BsonValue,
    true_value: BsonValue,
    false_value: BsonValue,
    empty_string: BsonValue,
    int32: Vec<BsonValue>,
}

impl Registry {
    fn build() -> Self {
        Self {
            null: BsonValue::Null,
            undefined: BsonValue::Undefined,
            min_key: BsonValue::MinKey,
            max_key: BsonValue::MaxKey,
            true_value: BsonValue::Boolean(true),
            false_value: BsonValue::Boolean(false),
            empty_string: BsonValue::String(String::new()),
            int32: (MIN_CACHED_INT32..=MAX_CACHED_INT32)
                .map(BsonValue::Int32)
                .collect(),
        }
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

pub fn null() -> &'static BsonValue {
    &REGISTRY.null
}

pub fn undefined() -> &'static BsonValue {
    &REGISTRY.undefined
}

pub fn min_key() -> &'static BsonValue {
    &REGISTRY.min_key
}

pub fn max_key() -> &'static BsonValue {
    &REGISTRY.max_key
}

pub fn boolean(value: bool) -> &'static BsonValue {
    if value {
        &REGISTRY.true_value
    } else {
        &REGISTRY.false_value
    }
}

pub fn empty_string() -> &'static BsonValue {
    &REGISTRY.empty_string
}

/// The cached instance for `value`, if it lies in the cached range.
pub fn int32(value: i32) -> Option<&'static BsonValue> {
    if (MIN_CACHED_INT32..=MAX_CACHED_INT32).contains(&value) {
        REGISTRY.int32.get((value - MIN_CACHED_INT32) as usize)
    } else {
        None
    }
}

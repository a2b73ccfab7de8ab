//! A named value inside a document.

use std::cmp::Ordering;

use crate::error::BsonError;
use crate::value::BsonValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonElement {
    name: String,
    value: BsonValue,
}

/// Element names are written as C strings, so they cannot hold a NUL.
pub(crate) fn validate_name(name: &str) -> Result<(), BsonError> {
    if name.contains('\0') {
        return Err(BsonError::InvalidElementName(name.to_owned()));
    }
    Ok(())
}

impl BsonElement {
    pub fn new(name: impl Into<String>, value: impl Into<BsonValue>) -> Result<Self, BsonError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &BsonValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut BsonValue {
        &mut self.value
    }

    pub fn set_value(&mut self, value: impl Into<BsonValue>) {
        self.value = value.into();
    }

    pub fn into_parts(self) -> (String, BsonValue) {
        (self.name, self.value)
    }

    pub fn deep_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.deep_clone(),
        }
    }

    /// Orders by name, then by value.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.value.compare_to(&other.value))
    }
}

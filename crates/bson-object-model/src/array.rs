//! Ordered, zero-based sequence of values.

use std::cmp::Ordering;
use std::fmt;

use crate::bson_type::BsonType;
use crate::error::BsonError;
use crate::io::{BsonReader, BsonWriter, JsonWriter, JsonWriterSettings};
use crate::value::BsonValue;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BsonArray {
    values: Vec<BsonValue>,
}

impl BsonArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), BsonError> {
        if index >= self.values.len() {
            return Err(BsonError::IndexOutOfRange {
                index,
                len: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn add(&mut self, value: impl Into<BsonValue>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    /// Appends every item of `values`, converting each into its value kind.
    pub fn add_range<I, T>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<BsonValue>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    /// Like [`add_range`](Self::add_range) but skips absent items.
    pub fn add_range_opt<I, T>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<T>>,
        T: Into<BsonValue>,
    {
        self.values.extend(values.into_iter().flatten().map(Into::into));
        self
    }

    pub fn get(&self, index: usize) -> Result<&BsonValue, BsonError> {
        self.check_index(index)?;
        Ok(&self.values[index])
    }

    pub fn try_get(&self, index: usize) -> Option<&BsonValue> {
        self.values.get(index)
    }

    pub fn get_or<'a>(&'a self, index: usize, default: &'a BsonValue) -> &'a BsonValue {
        self.values.get(index).unwrap_or(default)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut BsonValue, BsonError> {
        self.check_index(index)?;
        Ok(&mut self.values[index])
    }

    pub fn try_get_mut(&mut self, index: usize) -> Option<&mut BsonValue> {
        self.values.get_mut(index)
    }

    pub fn set(&mut self, index: usize, value: impl Into<BsonValue>) -> Result<&mut Self, BsonError> {
        self.check_index(index)?;
        self.values[index] = value.into();
        Ok(self)
    }

    /// Inserts at `index` (at most `len()`), shifting later values right.
    pub fn insert(&mut self, index: usize, value: impl Into<BsonValue>) -> Result<&mut Self, BsonError> {
        if index > self.values.len() {
            return Err(BsonError::IndexOutOfRange {
                index,
                len: self.values.len(),
            });
        }
        self.values.insert(index, value.into());
        Ok(self)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<BsonValue, BsonError> {
        self.check_index(index)?;
        Ok(self.values.remove(index))
    }

    /// Removes the first value equal to `value`.
    pub fn remove(&mut self, value: &BsonValue) -> bool {
        match self.index_of(value) {
            Some(i) => {
                self.values.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &BsonValue) -> bool {
        self.values.contains(value)
    }

    pub fn index_of(&self, value: &BsonValue) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BsonValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &[BsonValue] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<BsonValue> {
        self.values
    }

    pub fn shallow_clone(&self) -> Self {
        self.clone()
    }

    pub fn deep_clone(&self) -> Self {
        Self {
            values: self.values.iter().map(BsonValue::deep_clone).collect(),
        }
    }

    /// Element-wise, then by length.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        for (a, b) in self.values.iter().zip(&other.values) {
            match a.compare_to(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.values.len().cmp(&other.values.len())
    }

    pub fn write_to<W: BsonWriter + ?Sized>(&self, writer: &mut W) -> Result<(), BsonError> {
        writer.write_start_array()?;
        for value in &self.values {
            value.write_to(writer)?;
        }
        writer.write_end_array()
    }

    pub fn read_from<R: BsonReader + ?Sized>(reader: &mut R) -> Result<Self, BsonError> {
        let mut array = Self::new();
        reader.read_start_array()?;
        while reader.read_bson_type()? != BsonType::EndOfDocument {
            reader.skip_name()?;
            array.values.push(BsonValue::read_from(reader)?);
        }
        reader.read_end_array()?;
        Ok(array)
    }
}

impl From<Vec<BsonValue>> for BsonArray {
    fn from(values: Vec<BsonValue>) -> Self {
        Self { values }
    }
}

impl<T: Into<BsonValue>> FromIterator<T> for BsonArray {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.add_range(iter);
        array
    }
}

impl IntoIterator for BsonArray {
    type Item = BsonValue;
    type IntoIter = std::vec::IntoIter<BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a BsonArray {
    type Item = &'a BsonValue;
    type IntoIter = std::slice::Iter<'a, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for BsonArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = JsonWriter::new(JsonWriterSettings::default());
        self.write_to(&mut writer).map_err(|_| fmt::Error)?;
        f.write_str(&writer.into_string())
    }
}

//! Ordered document of named values.
//!
//! Elements keep insertion order. A name → index map serves lookups and
//! always points at the first element carrying a name. Appends update the
//! map in place; every other structural edit rebuilds it through
//! [`BsonDocument::rebuild_index`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::bson_type::BsonType;
use crate::element::{validate_name, BsonElement};
use crate::error::BsonError;
use crate::io::{
    BsonBinaryReader, BsonBinaryReaderSettings, BsonBinaryWriter, BsonBinaryWriterSettings,
    BsonReader, BsonWriter, JsonWriter, JsonWriterSettings,
};
use crate::object_id::ObjectId;
use crate::value::BsonValue;

/// Reserved name of the identity field.
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Default)]
pub struct BsonDocument {
    elements: Vec<BsonElement>,
    indexes: HashMap<String, usize>,
    allow_duplicate_names: bool,
}

// ── Construction ────────────────────────────────────────────────────────────

impl BsonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document that keeps later elements whose name is already
    /// present instead of rejecting them.
    pub fn with_allow_duplicate_names(allow_duplicate_names: bool) -> Self {
        Self {
            allow_duplicate_names,
            ..Self::default()
        }
    }

    /// Builds a document from `(name, value)` pairs, failing on the first
    /// invalid or duplicate name.
    pub fn from_elements<I, K, V>(elements: I) -> Result<Self, BsonError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BsonValue>,
    {
        let mut doc = Self::new();
        doc.add_range(elements)?;
        Ok(doc)
    }

    pub fn allow_duplicate_names(&self) -> bool {
        self.allow_duplicate_names
    }

    pub fn set_allow_duplicate_names(&mut self, allow: bool) {
        self.allow_duplicate_names = allow;
    }

    /// Recomputes the name → index map from the element list.
    fn rebuild_index(&mut self) {
        self.indexes.clear();
        for (i, element) in self.elements.iter().enumerate() {
            self.indexes.entry(element.name().to_owned()).or_insert(i);
        }
    }

    fn check_index(&self, index: usize) -> Result<(), BsonError> {
        if index >= self.elements.len() {
            return Err(BsonError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        Ok(())
    }
}

// ── Adding and inserting ────────────────────────────────────────────────────

impl BsonDocument {
    /// Appends an element.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<BsonValue>,
    ) -> Result<&mut Self, BsonError> {
        self.add_element(BsonElement::new(name, value)?)
    }

    /// Appends an element. A duplicate name is an error unless the document
    /// allows duplicates, in which case the new element is only reachable
    /// by position.
    pub fn add_element(&mut self, element: BsonElement) -> Result<&mut Self, BsonError> {
        if self.indexes.contains_key(element.name()) {
            if !self.allow_duplicate_names {
                return Err(BsonError::DuplicateElementName(element.name().to_owned()));
            }
        } else {
            self.indexes
                .insert(element.name().to_owned(), self.elements.len());
        }
        self.elements.push(element);
        Ok(self)
    }

    pub fn add_range<I, K, V>(&mut self, elements: I) -> Result<&mut Self, BsonError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BsonValue>,
    {
        for (name, value) in elements {
            self.add(name, value)?;
        }
        Ok(self)
    }

    /// Inserts an element at `index` (at most `len()`).
    pub fn insert_at(&mut self, index: usize, element: BsonElement) -> Result<&mut Self, BsonError> {
        if index > self.elements.len() {
            return Err(BsonError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        if self.indexes.contains_key(element.name()) && !self.allow_duplicate_names {
            return Err(BsonError::DuplicateElementName(element.name().to_owned()));
        }
        self.elements.insert(index, element);
        self.rebuild_index();
        Ok(self)
    }

    /// Adds the elements of `other` whose names are missing here. When
    /// `overwrite_existing` is set, elements already present take the value
    /// from `other`.
    pub fn merge(&mut self, other: &BsonDocument, overwrite_existing: bool) -> Result<&mut Self, BsonError> {
        for element in &other.elements {
            match self.indexes.get(element.name()).copied() {
                None => {
                    self.add_element(element.clone())?;
                }
                Some(index) if overwrite_existing => {
                    self.elements[index].set_value(element.value().clone());
                }
                Some(_) => {}
            }
        }
        Ok(self)
    }
}

// ── Lookup ──────────────────────────────────────────────────────────────────

impl BsonDocument {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn contains_value(&self, value: &BsonValue) -> bool {
        self.elements.iter().any(|e| e.value() == value)
    }

    /// Position of the first element named `name`.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.indexes.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Result<&BsonValue, BsonError> {
        self.try_get(name)
            .ok_or_else(|| BsonError::ElementNotFound(name.to_owned()))
    }

    pub fn try_get(&self, name: &str) -> Option<&BsonValue> {
        self.indexes.get(name).map(|&i| self.elements[i].value())
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a BsonValue) -> &'a BsonValue {
        self.try_get(name).unwrap_or(default)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut BsonValue, BsonError> {
        self.try_get_mut(name)
            .ok_or_else(|| BsonError::ElementNotFound(name.to_owned()))
    }

    pub fn try_get_mut(&mut self, name: &str) -> Option<&mut BsonValue> {
        let i = self.indexes.get(name).copied()?;
        Some(self.elements[i].value_mut())
    }

    pub fn get_at(&self, index: usize) -> Result<&BsonValue, BsonError> {
        self.element_at(index).map(BsonElement::value)
    }

    pub fn try_get_at(&self, index: usize) -> Option<&BsonValue> {
        self.elements.get(index).map(BsonElement::value)
    }

    pub fn get_at_or<'a>(&'a self, index: usize, default: &'a BsonValue) -> &'a BsonValue {
        self.try_get_at(index).unwrap_or(default)
    }

    pub fn get_at_mut(&mut self, index: usize) -> Result<&mut BsonValue, BsonError> {
        self.check_index(index)?;
        Ok(self.elements[index].value_mut())
    }

    pub fn try_get_at_mut(&mut self, index: usize) -> Option<&mut BsonValue> {
        self.elements.get_mut(index).map(BsonElement::value_mut)
    }

    pub fn element_at(&self, index: usize) -> Result<&BsonElement, BsonError> {
        self.check_index(index)?;
        Ok(&self.elements[index])
    }

    pub fn try_element_at(&self, index: usize) -> Option<&BsonElement> {
        self.elements.get(index)
    }

    pub fn get_element(&self, name: &str) -> Result<&BsonElement, BsonError> {
        self.try_get_element(name)
            .ok_or_else(|| BsonError::ElementNotFound(name.to_owned()))
    }

    pub fn try_get_element(&self, name: &str) -> Option<&BsonElement> {
        self.indexes.get(name).map(|&i| &self.elements[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(BsonElement::name)
    }

    pub fn values(&self) -> impl Iterator<Item = &BsonValue> {
        self.elements.iter().map(BsonElement::value)
    }

    pub fn elements(&self) -> &[BsonElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BsonElement> {
        self.elements.iter()
    }
}

// ── Setting and removing ────────────────────────────────────────────────────

impl BsonDocument {
    /// Overwrites the first element named `name`, or appends one.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<BsonValue>,
    ) -> Result<&mut Self, BsonError> {
        let name = name.into();
        validate_name(&name)?;
        match self.indexes.get(&name).copied() {
            Some(i) => {
                self.elements[i].set_value(value);
                Ok(self)
            }
            None => self.add_element(BsonElement::new(name, value)?),
        }
    }

    pub fn set_at(&mut self, index: usize, value: impl Into<BsonValue>) -> Result<&mut Self, BsonError> {
        self.check_index(index)?;
        self.elements[index].set_value(value);
        Ok(self)
    }

    pub fn set_element(&mut self, element: BsonElement) -> Result<&mut Self, BsonError> {
        let (name, value) = element.into_parts();
        self.set(name, value)
    }

    /// Removes every element named `name`. Returns whether any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        if !self.indexes.contains_key(name) {
            return false;
        }
        self.elements.retain(|e| e.name() != name);
        self.rebuild_index();
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Result<BsonElement, BsonError> {
        self.check_index(index)?;
        let element = self.elements.remove(index);
        self.rebuild_index();
        Ok(element)
    }

    /// Removes the first element equal to `element` (same name and value).
    pub fn remove_element(&mut self, element: &BsonElement) -> bool {
        match self.elements.iter().position(|e| e == element) {
            Some(i) => {
                self.elements.remove(i);
                self.rebuild_index();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.indexes.clear();
    }
}

// ── Identity field ──────────────────────────────────────────────────────────

impl BsonDocument {
    pub fn document_id(&self) -> Option<&BsonValue> {
        self.try_get(ID_FIELD)
    }

    /// Sets `_id`, placing it first when it is not present yet.
    pub fn set_document_id(&mut self, id: impl Into<BsonValue>) -> Result<&mut Self, BsonError> {
        if self.contains(ID_FIELD) {
            self.set(ID_FIELD, id)
        } else {
            self.insert_at(0, BsonElement::new(ID_FIELD, id)?)
        }
    }

    /// Returns `_id`, first inserting a freshly generated ObjectId at the
    /// front of the document if it has none.
    pub fn ensure_document_id(&mut self) -> Result<&BsonValue, BsonError> {
        if !self.contains(ID_FIELD) {
            self.insert_at(0, BsonElement::new(ID_FIELD, ObjectId::generate_new_id())?)?;
        }
        self.get(ID_FIELD)
    }
}

// ── Clone, compare ──────────────────────────────────────────────────────────

impl BsonDocument {
    /// Copies the element list. Children are owned, so the copy owns its
    /// own children.
    pub fn shallow_clone(&self) -> Self {
        self.clone()
    }

    /// Copies the element list and deep-clones every child value.
    pub fn deep_clone(&self) -> Self {
        Self {
            elements: self.elements.iter().map(BsonElement::deep_clone).collect(),
            indexes: self.indexes.clone(),
            allow_duplicate_names: self.allow_duplicate_names,
        }
    }

    /// Element-wise by name and value, then by element count.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        for (a, b) in self.elements.iter().zip(&other.elements) {
            match a.compare_to(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.elements.len().cmp(&other.elements.len())
    }
}

impl PartialEq for BsonDocument {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Eq for BsonDocument {}

impl Hash for BsonDocument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elements.len().hash(state);
        for element in &self.elements {
            element.hash(state);
        }
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl BsonDocument {
    pub fn write_to<W: BsonWriter + ?Sized>(&self, writer: &mut W) -> Result<(), BsonError> {
        writer.write_start_document()?;
        for element in &self.elements {
            writer.write_name(element.name())?;
            element.value().write_to(writer)?;
        }
        writer.write_end_document()
    }

    /// Reads a document at the reader's current position.
    pub fn read_from<R: BsonReader + ?Sized>(reader: &mut R) -> Result<Self, BsonError> {
        Self::read_from_with(reader, false)
    }

    pub fn read_from_with<R: BsonReader + ?Sized>(
        reader: &mut R,
        allow_duplicate_names: bool,
    ) -> Result<Self, BsonError> {
        let mut doc = Self::with_allow_duplicate_names(allow_duplicate_names);
        reader.read_start_document()?;
        while reader.read_bson_type()? != BsonType::EndOfDocument {
            let name = reader.read_name()?;
            let value = BsonValue::read_from(reader)?;
            doc.add(name, value)?;
        }
        reader.read_end_document()?;
        Ok(doc)
    }

    /// Replaces this document's content with the document read from
    /// `reader`. On error the document is left untouched.
    pub fn replace_from<R: BsonReader + ?Sized>(&mut self, reader: &mut R) -> Result<(), BsonError> {
        let parsed = Self::read_from_with(reader, self.allow_duplicate_names)?;
        *self = parsed;
        Ok(())
    }

    /// Encodes this document as BSON bytes with default writer settings.
    pub fn to_bson(&self) -> Result<Vec<u8>, BsonError> {
        self.to_bson_with(BsonBinaryWriterSettings::default())
    }

    pub fn to_bson_with(&self, settings: BsonBinaryWriterSettings) -> Result<Vec<u8>, BsonError> {
        let mut writer = BsonBinaryWriter::new(settings);
        self.write_to(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Decodes exactly one document from `bytes` with default reader settings.
    pub fn from_bson(bytes: &[u8]) -> Result<Self, BsonError> {
        Self::from_bson_with(bytes, BsonBinaryReaderSettings::default())
    }

    pub fn from_bson_with(bytes: &[u8], settings: BsonBinaryReaderSettings) -> Result<Self, BsonError> {
        let mut reader = BsonBinaryReader::new(bytes, settings);
        let doc = Self::read_from(&mut reader)?;
        if !reader.is_at_end() {
            return Err(BsonError::format("trailing bytes after document"));
        }
        Ok(doc)
    }

    /// Shell-mode JSON text.
    pub fn to_json(&self) -> Result<String, BsonError> {
        self.to_json_with(JsonWriterSettings::default())
    }

    pub fn to_json_with(&self, settings: JsonWriterSettings) -> Result<String, BsonError> {
        let mut writer = JsonWriter::new(settings);
        self.write_to(&mut writer)?;
        Ok(writer.into_string())
    }
}

impl fmt::Display for BsonDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json().map_err(|_| fmt::Error)?)
    }
}

impl IntoIterator for BsonDocument {
    type Item = BsonElement;
    type IntoIter = std::vec::IntoIter<BsonElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a BsonDocument {
    type Item = &'a BsonElement;
    type IntoIter = std::slice::Iter<'a, BsonElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::BsonArray;

    fn sample() -> BsonDocument {
        BsonDocument::from_elements([("a", 1), ("b", 2), ("c", 3)]).unwrap()
    }

    #[test]
    fn duplicate_names_rejected_by_default() {
        let mut doc = BsonDocument::new();
        doc.add("a", 1).unwrap();
        assert_eq!(
            doc.add("a", 2).unwrap_err(),
            BsonError::DuplicateElementName("a".into())
        );
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn duplicate_names_allowed_when_opted_in() {
        let mut doc = BsonDocument::with_allow_duplicate_names(true);
        doc.add("a", 1).unwrap().add("b", 0).unwrap().add("a", 2).unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("a").unwrap(), &BsonValue::Int32(1));
        assert_eq!(doc.get_at(2).unwrap(), &BsonValue::Int32(2));
        assert!(doc.remove("a"));
        assert_eq!(doc.len(), 1);
        assert!(!doc.contains("a"));
        assert_eq!(doc.index_of_name("b"), Some(0));
    }

    #[test]
    fn insert_at_rebuilds_index() {
        let mut doc = sample();
        doc.insert_at(1, BsonElement::new("x", 9).unwrap()).unwrap();
        assert_eq!(doc.names().collect::<Vec<_>>(), ["a", "x", "b", "c"]);
        assert_eq!(doc.index_of_name("b"), Some(2));
        assert_eq!(doc.get("c").unwrap(), &BsonValue::Int32(3));
        assert!(matches!(
            doc.insert_at(9, BsonElement::new("y", 0).unwrap()),
            Err(BsonError::IndexOutOfRange { index: 9, len: 4 })
        ));
        assert!(matches!(
            doc.insert_at(0, BsonElement::new("a", 0).unwrap()),
            Err(BsonError::DuplicateElementName(_))
        ));
    }

    #[test]
    fn set_overwrites_or_appends() {
        let mut doc = sample();
        doc.set("b", "two").unwrap();
        doc.set("d", 4).unwrap();
        assert_eq!(doc.names().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
        assert_eq!(doc.get("b").unwrap(), &BsonValue::from("two"));
        doc.set_at(0, 10).unwrap();
        assert_eq!(doc.get("a").unwrap(), &BsonValue::Int32(10));
        assert!(doc.set_at(10, 0).is_err());
    }

    #[test]
    fn remove_by_position_and_element() {
        let mut doc = sample();
        let removed = doc.remove_at(0).unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(doc.index_of_name("b"), Some(0));
        assert!(doc.remove_element(&BsonElement::new("c", 3i64).unwrap()));
        assert!(!doc.remove_element(&BsonElement::new("b", 0).unwrap()));
        assert_eq!(doc.len(), 1);
        assert!(!doc.remove("zzz"));
    }

    #[test]
    fn not_found_and_fallbacks() {
        let doc = sample();
        assert_eq!(
            doc.get("zzz").unwrap_err(),
            BsonError::ElementNotFound("zzz".into())
        );
        assert_eq!(doc.try_get("zzz"), None);
        let fallback = BsonValue::Null;
        assert_eq!(doc.get_or("zzz", &fallback), &BsonValue::Null);
        assert!(doc.element_at(3).is_err());
        assert!(doc.try_element_at(3).is_none());
        assert!(doc.get_element("zzz").is_err());
        assert_eq!(doc.get_at_or(3, &fallback), &BsonValue::Null);
        assert_eq!(doc.get_at_or(0, &fallback), &BsonValue::Int32(1));

        let mut doc = doc;
        assert!(doc.try_get_mut("zzz").is_none());
        assert!(doc.try_get_at_mut(3).is_none());
        *doc.try_get_mut("a").unwrap() = BsonValue::Int32(10);
        *doc.try_get_at_mut(1).unwrap() = BsonValue::Int32(20);
        assert_eq!(doc.get("a").unwrap(), &BsonValue::Int32(10));
        assert_eq!(doc.get_at(1).unwrap(), &BsonValue::Int32(20));
    }

    #[test]
    fn remove_drops_every_duplicate_after_policy_change() {
        let mut doc = BsonDocument::with_allow_duplicate_names(true);
        doc.add("a", 1).unwrap().add("b", 2).unwrap().add("a", 3).unwrap();
        doc.set_allow_duplicate_names(false);
        assert!(doc.remove("a"));
        assert_eq!(doc.len(), 1);
        assert!(!doc.contains("a"));
        assert_eq!(doc.try_get("a"), None);
        assert_eq!(doc.get("b").unwrap(), &BsonValue::Int32(2));
    }

    #[test]
    fn merge_policies() {
        let other = BsonDocument::from_elements([("b", 20), ("d", 40)]).unwrap();
        let mut keep = sample();
        keep.merge(&other, false).unwrap();
        assert_eq!(keep.get("b").unwrap(), &BsonValue::Int32(2));
        assert_eq!(keep.get("d").unwrap(), &BsonValue::Int32(40));
        let mut overwrite = sample();
        overwrite.merge(&other, true).unwrap();
        assert_eq!(overwrite.get("b").unwrap(), &BsonValue::Int32(20));
        assert_eq!(overwrite.len(), 4);
    }

    #[test]
    fn document_id_is_synthesized_first() {
        let mut doc = sample();
        assert!(doc.document_id().is_none());
        let id = doc.ensure_document_id().unwrap().clone();
        assert!(id.is_object_id());
        assert_eq!(doc.element_at(0).unwrap().name(), ID_FIELD);
        assert_eq!(doc.ensure_document_id().unwrap(), &id);
        doc.set_document_id(5).unwrap();
        assert_eq!(doc.document_id(), Some(&BsonValue::Int32(5)));
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn ordering_is_element_wise_then_by_length() {
        let a = BsonDocument::from_elements([("a", 1)]).unwrap();
        let ab = sample();
        assert_eq!(a.compare_to(&ab), Ordering::Less);
        let b = BsonDocument::from_elements([("b", 0)]).unwrap();
        assert_eq!(ab.compare_to(&b), Ordering::Less);
    }

    #[test]
    fn deep_clone_copies_nested_containers() {
        let mut doc = BsonDocument::new();
        doc.add("arr", BsonArray::from(vec![BsonValue::Int32(1)])).unwrap();
        let mut copy = doc.deep_clone();
        copy.get_mut("arr").unwrap().as_array_mut().unwrap().add(2);
        assert_eq!(doc.get("arr").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(copy.get("arr").unwrap().as_array().unwrap().len(), 2);
        assert_eq!(doc.shallow_clone(), doc);
    }

    #[test]
    fn displays_as_shell_json() {
        let doc = BsonDocument::from_elements([("a", BsonValue::Int32(1)), ("b", BsonValue::from("x"))])
            .unwrap();
        assert_eq!(doc.to_string(), r#"{ "a" : 1, "b" : "x" }"#);
        assert_eq!(BsonDocument::new().to_string(), "{ }");
    }
}

//! JavaScript code with a scope document.

use std::cmp::Ordering;

use crate::document::BsonDocument;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonJavaScriptWithScope {
    code: String,
    scope: BsonDocument,
}

impl BsonJavaScriptWithScope {
    pub fn new(code: impl Into<String>, scope: BsonDocument) -> Self {
        Self {
            code: code.into(),
            scope,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn scope(&self) -> &BsonDocument {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut BsonDocument {
        &mut self.scope
    }

    pub fn into_parts(self) -> (String, BsonDocument) {
        (self.code, self.scope)
    }

    /// Copy whose scope document is deep-cloned.
    pub fn deep_clone(&self) -> Self {
        Self {
            code: self.code.clone(),
            scope: self.scope.deep_clone(),
        }
    }

    /// Orders by code, then by scope.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.code
            .cmp(&other.code)
            .then_with(|| self.scope.compare_to(&other.scope))
    }
}

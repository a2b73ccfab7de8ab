//! BSON regular expression (pattern plus option letters).

use std::fmt;

use crate::error::BsonError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonRegularExpression {
    pattern: String,
    options: String,
}

impl BsonRegularExpression {
    /// Builds a regular expression from `pattern`.
    ///
    /// A pattern in the `/pattern/options` form is split at the last slash.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.len() > 1 && pattern.starts_with('/') {
            if let Some(end) = pattern.rfind('/') {
                if end > 0 {
                    let options = pattern[end + 1..].to_owned();
                    let body = pattern[1..end].to_owned();
                    return Self {
                        pattern: body,
                        options,
                    };
                }
            }
        }
        Self {
            pattern,
            options: String::new(),
        }
    }

    pub fn with_options(pattern: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            options: options.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// Compiles the expression with the `regex` crate.
    ///
    /// The `i`, `m`, `s` and `x` options become inline flags; any other
    /// option letter is rejected.
    pub fn to_regex(&self) -> Result<::regex::Regex, BsonError> {
        let mut flags = String::new();
        for c in self.options.chars() {
            match c {
                'i' | 'm' | 's' | 'x' => flags.push(c),
                other => {
                    return Err(BsonError::format(format!(
                        "unsupported regular expression option {other:?}"
                    )))
                }
            }
        }
        let source = if flags.is_empty() {
            self.pattern.clone()
        } else {
            format!("(?{flags}){}", self.pattern)
        };
        ::regex::Regex::new(&source).map_err(|e| BsonError::format(e.to_string()))
    }
}

impl fmt::Display for BsonRegularExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

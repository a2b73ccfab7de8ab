use serde::{Deserialize, Serialize};

use crate::guid::GuidRepresentation;

/// Largest document the binary codecs accept by default (16 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BsonBinaryReaderSettings {
    /// Representation given to subtype 3 binaries.
    pub guid_representation: GuidRepresentation,
    pub max_document_size: usize,
    /// Strip the redundant inner length of subtype 2 binaries and report
    /// them as generic binary.
    pub fix_old_binary_sub_type_on_input: bool,
}

impl Default for BsonBinaryReaderSettings {
    fn default() -> Self {
        Self {
            guid_representation: GuidRepresentation::CSharpLegacy,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            fix_old_binary_sub_type_on_input: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BsonBinaryWriterSettings {
    /// Subtype 3 binaries tagged with a different representation are
    /// rejected.
    pub guid_representation: GuidRepresentation,
    pub max_document_size: usize,
    /// Write subtype 2 binaries as generic binary.
    pub fix_old_binary_sub_type_on_output: bool,
}

impl Default for BsonBinaryWriterSettings {
    fn default() -> Self {
        Self {
            guid_representation: GuidRepresentation::CSharpLegacy,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            fix_old_binary_sub_type_on_output: true,
        }
    }
}

/// JSON dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JsonOutputMode {
    /// Pure JSON with `$`-prefixed wrapper objects for non-JSON kinds.
    Strict,
    /// Mongo shell syntax (`ObjectId("...")`, `ISODate("...")`, ...).
    #[default]
    Shell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonWriterSettings {
    pub output_mode: JsonOutputMode,
    pub indent: bool,
    pub indent_chars: String,
    pub new_line_chars: String,
    /// Used for UUID binaries that carry no representation of their own.
    pub guid_representation: GuidRepresentation,
}

impl Default for JsonWriterSettings {
    fn default() -> Self {
        Self {
            output_mode: JsonOutputMode::Shell,
            indent: false,
            indent_chars: "  ".to_owned(),
            new_line_chars: "\n".to_owned(),
            guid_representation: GuidRepresentation::CSharpLegacy,
        }
    }
}

impl JsonWriterSettings {
    pub fn strict() -> Self {
        Self {
            output_mode: JsonOutputMode::Strict,
            ..Self::default()
        }
    }

    pub fn indented() -> Self {
        Self {
            indent: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let settings: BsonBinaryReaderSettings =
            serde_json::from_str(r#"{ "guid_representation": "Standard" }"#).unwrap();
        assert_eq!(settings.guid_representation, GuidRepresentation::Standard);
        assert_eq!(settings.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
        assert!(settings.fix_old_binary_sub_type_on_input);
    }

    #[test]
    fn json_settings_round_trip_through_serde() {
        let settings = JsonWriterSettings {
            indent: true,
            ..JsonWriterSettings::strict()
        };
        let text = serde_json::to_string(&settings).unwrap();
        let back: JsonWriterSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}

//! BSON value model and codec core.
//!
//! [`BsonValue`] is the closed set of BSON kinds with a total cross-kind
//! order, hashing consistent with equality, and lossless conversions.
//! [`BsonDocument`] and [`BsonArray`] are the mutable containers.
//! Serialization goes through the [`io::BsonReader`] and [`io::BsonWriter`]
//! traits; [`io::BsonBinaryReader`], [`io::BsonBinaryWriter`] and
//! [`io::JsonWriter`] implement them.

mod array;
mod binary;
mod bson_type;
mod date_time;
mod document;
mod element;
mod error;
mod guid;
mod javascript;
mod object_id;
mod regular_expression;
mod symbol;
mod timestamp;
mod value;

pub mod canonical;
pub mod io;

pub use array::BsonArray;
pub use binary::{BsonBinaryData, BsonBinarySubType};
pub use bson_type::BsonType;
pub use date_time::BsonDateTime;
pub use document::{BsonDocument, ID_FIELD};
pub use element::BsonElement;
pub use error::BsonError;
pub use guid::{GuidConverter, GuidRepresentation};
pub use javascript::BsonJavaScriptWithScope;
pub use object_id::ObjectId;
pub use regular_expression::BsonRegularExpression;
pub use symbol::{BsonSymbol, SymbolTable};
pub use timestamp::BsonTimestamp;
pub use value::BsonValue;

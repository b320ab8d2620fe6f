//! The JSON-compatible "primitive" form of host values.
//!
//! Primitive forms erase Thrift typing: all integer widths collapse to
//! [`Primitive::Int`], enums become their integer (or, if so configured,
//! their name), structs become objects keyed by field name. They are what
//! `to_primitive`/`from_primitive` exchange, and the shape constant values
//! take in the IDL.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A loosely-typed value: the JSON-ish shape of any Thrift value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Primitive>),
    /// Maps and structs both serialize as objects. Pair order is preserved;
    /// keys are [`Primitive::Text`] for structs but may be anything for maps.
    Object(Vec<(Primitive, Primitive)>),
}

impl Primitive {
    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Bool(_) => "bool",
            Primitive::Int(_) => "integer",
            Primitive::Float(_) => "float",
            Primitive::Bytes(_) => "bytes",
            Primitive::Text(_) => "text",
            Primitive::Array(_) => "array",
            Primitive::Object(_) => "object",
        }
    }
}

impl Serialize for Primitive {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Primitive::Bool(v) => serializer.serialize_bool(*v),
            Primitive::Int(v) => serializer.serialize_i64(*v),
            Primitive::Float(v) => serializer.serialize_f64(*v),
            Primitive::Bytes(v) => serializer.serialize_bytes(v),
            Primitive::Text(v) => serializer.serialize_str(v),
            Primitive::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Primitive::Object(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

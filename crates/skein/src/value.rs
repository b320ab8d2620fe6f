//! Dynamic host values.
//!
//! Because the schema only exists at runtime, host values are a dynamic sum
//! type rather than generated Rust structs. A [`StructValue`] carries the
//! name of the type that constructed it; specs check that name instead of
//! re-validating children (the surface-identity optimization).

use indexmap::IndexMap;

/// A host-language value for any Thrift type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    /// Order-preserving; deduplicated by equality when read off the wire.
    Set(Vec<Value>),
    /// Pair order is preserved. Keys need not be hashable (doubles, structs).
    Map(Vec<(Value, Value)>),
    /// Structs, exceptions, and unions alike. Absent fields are absent keys.
    Struct(StructValue),
}

impl Value {
    /// The contained integer for any integral variant.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Double(_) => "double",
            Value::Binary(_) => "binary",
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }
}

/// An instance of a struct, union, or exception type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Name of the type this value was constructed for.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Present field value, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Present fields in insertion order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

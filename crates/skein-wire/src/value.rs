//! Protocol-independent representation of decoded Thrift values.
//!
//! A [`Value`] carries just enough information to travel to or from the
//! wire: type codes and payloads, no host-type knowledge. Specs in the
//! `skein` crate map host values to and from this model.

use std::collections::HashMap;

use crate::ttype::TType;

/// Any Thrift value, as decoded from or destined for the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Double(f64),
    I16(i16),
    I32(i32),
    I64(i64),
    Binary(Vec<u8>),
    Struct(StructValue),
    Map(MapValue),
    Set(SetValue),
    List(ListValue),
}

impl Value {
    /// The type code determined by the variant.
    pub fn ttype(&self) -> TType {
        match self {
            Value::Bool(_) => TType::Bool,
            Value::Byte(_) => TType::Byte,
            Value::Double(_) => TType::Double,
            Value::I16(_) => TType::I16,
            Value::I32(_) => TType::I32,
            Value::I64(_) => TType::I64,
            Value::Binary(_) => TType::Binary,
            Value::Struct(_) => TType::Struct,
            Value::Map(_) => TType::Map,
            Value::Set(_) => TType::Set,
            Value::List(_) => TType::List,
        }
    }
}

/// A single field inside a [`StructValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    /// Numeric field identifier.
    pub id: i16,
    /// Type code of the held value.
    pub ttype: TType,
    pub value: Value,
}

/// A collection of fields of different types.
///
/// Field order is preserved for serialization; an `(id, ttype)` index is
/// maintained for O(1) lookup during deserialization.
#[derive(Debug, Clone, Default)]
pub struct StructValue {
    fields: Vec<FieldValue>,
    index: HashMap<(i16, TType), usize>,
}

impl StructValue {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| ((f.id, f.ttype), i))
            .collect();
        Self { fields, index }
    }

    /// The value stored at the given field id and type, if any.
    pub fn get(&self, id: i16, ttype: TType) -> Option<&Value> {
        self.index.get(&(id, ttype)).map(|&i| &self.fields[i].value)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }
}

// The index is derived from the fields, so equality is field order alone.
impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

/// A mapping between two kinds of values. Pair order is preserved; this is
/// deliberately not a map type since wire keys need not be hashable.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub key_ttype: TType,
    pub value_ttype: TType,
    pub pairs: Vec<(Value, Value)>,
}

/// A collection of values of one type, read off the wire in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SetValue {
    pub value_ttype: TType,
    pub values: Vec<Value>,
}

/// An ordered collection of values of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    pub value_ttype: TType,
    pub values: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttype_follows_variant() {
        assert_eq!(Value::Bool(true).ttype(), TType::Bool);
        assert_eq!(Value::Byte(42).ttype(), TType::Byte);
        assert_eq!(Value::Double(1.5).ttype(), TType::Double);
        assert_eq!(Value::I16(1).ttype(), TType::I16);
        assert_eq!(Value::I32(1).ttype(), TType::I32);
        assert_eq!(Value::I64(1).ttype(), TType::I64);
        assert_eq!(Value::Binary(vec![]).ttype(), TType::Binary);
        assert_eq!(
            Value::Struct(StructValue::new(vec![])).ttype(),
            TType::Struct
        );
    }

    #[test]
    fn struct_lookup_by_id_and_type() {
        let value = StructValue::new(vec![
            FieldValue {
                id: 1,
                ttype: TType::Bool,
                value: Value::Bool(true),
            },
            FieldValue {
                id: 2,
                ttype: TType::I32,
                value: Value::I32(42),
            },
        ]);

        assert_eq!(value.get(1, TType::Bool), Some(&Value::Bool(true)));
        assert_eq!(value.get(2, TType::I32), Some(&Value::I32(42)));
        // Wrong type code misses even when the id exists.
        assert_eq!(value.get(2, TType::I64), None);
        assert_eq!(value.get(3, TType::I32), None);
    }

    #[test]
    fn struct_equality_ignores_index() {
        let a = StructValue::new(vec![FieldValue {
            id: 1,
            ttype: TType::I32,
            value: Value::I32(7),
        }]);
        let b = StructValue::new(vec![FieldValue {
            id: 1,
            ttype: TType::I32,
            value: Value::I32(7),
        }]);
        assert_eq!(a, b);
    }
}

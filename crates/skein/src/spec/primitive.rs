//! Specs for the eight primitive types.
//!
//! `string` and `binary` share the BINARY wire code: `string` transcodes
//! UTF-8 text, `binary` is raw bytes, and each accepts the other's host
//! form. Integer specs enforce their signed two's-complement range.

use skein_wire::{BinaryReader, BinaryWriter, TType, Value as WireValue};

use crate::errors::{Error, ValueError};
use crate::primitive::Primitive;
use crate::value::Value;

/// The primitive type specs. Discriminants double as the fixed arena slots
/// primitives occupy in every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PrimitiveType {
    Bool = 0,
    Byte = 1,
    Double = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    Binary = 6,
    Text = 7,
}

impl PrimitiveType {
    /// All primitives, in arena-slot order.
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Bool,
        PrimitiveType::Byte,
        PrimitiveType::Double,
        PrimitiveType::I16,
        PrimitiveType::I32,
        PrimitiveType::I64,
        PrimitiveType::Binary,
        PrimitiveType::Text,
    ];

    /// The IDL name of the type.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Double => "double",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::Binary => "binary",
            PrimitiveType::Text => "string",
        }
    }

    pub fn ttype(self) -> TType {
        match self {
            PrimitiveType::Bool => TType::Bool,
            PrimitiveType::Byte => TType::Byte,
            PrimitiveType::Double => TType::Double,
            PrimitiveType::I16 => TType::I16,
            PrimitiveType::I32 => TType::I32,
            PrimitiveType::I64 => TType::I64,
            PrimitiveType::Binary | PrimitiveType::Text => TType::Binary,
        }
    }

    fn mismatch(self, value: &Value) -> Error {
        ValueError::TypeMismatch {
            expected: self.name().to_string(),
            actual: value.kind().to_string(),
        }
        .into()
    }

    /// Integer range of this spec, if it is an integer spec.
    fn int_range(self) -> Option<(i64, i64)> {
        match self {
            PrimitiveType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveType::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveType::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveType::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    fn checked_int(self, value: i64) -> Result<i64, Error> {
        let (lo, hi) = self.int_range().expect("not an integer spec");
        if value < lo || value > hi {
            return Err(ValueError::OutOfRange {
                value,
                target: self.name().to_string(),
            }
            .into());
        }
        Ok(value)
    }

    pub fn validate(self, value: &Value) -> Result<(), Error> {
        match self {
            PrimitiveType::Bool => match value {
                Value::Bool(_) => Ok(()),
                // Integer 0/1 is an accepted spelling of a boolean.
                _ => match value.as_int() {
                    Some(0) | Some(1) => Ok(()),
                    _ => Err(self.mismatch(value)),
                },
            },
            PrimitiveType::Byte | PrimitiveType::I16 | PrimitiveType::I32 | PrimitiveType::I64 => {
                match value.as_int() {
                    Some(v) => self.checked_int(v).map(|_| ()),
                    None => Err(self.mismatch(value)),
                }
            }
            PrimitiveType::Double => match value {
                Value::Double(_) => Ok(()),
                _ if value.as_int().is_some() => Ok(()),
                _ => Err(self.mismatch(value)),
            },
            PrimitiveType::Binary | PrimitiveType::Text => match value {
                Value::Binary(_) | Value::Text(_) => Ok(()),
                _ => Err(self.mismatch(value)),
            },
        }
    }

    /// The boolean a host value spells, after validation.
    fn as_bool(self, value: &Value) -> Result<bool, Error> {
        match value {
            Value::Bool(v) => Ok(*v),
            _ => match value.as_int() {
                Some(v @ (0 | 1)) => Ok(v == 1),
                _ => Err(self.mismatch(value)),
            },
        }
    }

    fn as_double(self, value: &Value) -> Result<f64, Error> {
        match value {
            Value::Double(v) => Ok(*v),
            _ => match value.as_int() {
                Some(v) => Ok(v as f64),
                None => Err(self.mismatch(value)),
            },
        }
    }

    fn as_bytes(self, value: &Value) -> Result<Vec<u8>, Error> {
        match value {
            Value::Binary(bytes) => Ok(bytes.clone()),
            Value::Text(text) => Ok(text.as_bytes().to_vec()),
            _ => Err(self.mismatch(value)),
        }
    }

    fn int_of(self, value: &Value) -> Result<i64, Error> {
        match value.as_int() {
            Some(v) => self.checked_int(v),
            None => Err(self.mismatch(value)),
        }
    }

    pub fn to_wire(self, value: &Value) -> Result<WireValue, Error> {
        match self {
            PrimitiveType::Bool => Ok(WireValue::Bool(self.as_bool(value)?)),
            PrimitiveType::Byte => Ok(WireValue::Byte(self.int_of(value)? as i8)),
            PrimitiveType::I16 => Ok(WireValue::I16(self.int_of(value)? as i16)),
            PrimitiveType::I32 => Ok(WireValue::I32(self.int_of(value)? as i32)),
            PrimitiveType::I64 => Ok(WireValue::I64(self.int_of(value)?)),
            PrimitiveType::Double => Ok(WireValue::Double(self.as_double(value)?)),
            PrimitiveType::Binary | PrimitiveType::Text => {
                Ok(WireValue::Binary(self.as_bytes(value)?))
            }
        }
    }

    fn wire_mismatch(self, wire: &WireValue) -> Error {
        ValueError::TypeMismatch {
            expected: self.name().to_string(),
            actual: format!("wire value of type {}", wire.ttype()),
        }
        .into()
    }

    pub fn from_wire(self, wire: &WireValue) -> Result<Value, Error> {
        match (self, wire) {
            (PrimitiveType::Bool, WireValue::Bool(v)) => Ok(Value::Bool(*v)),
            (PrimitiveType::Byte, WireValue::Byte(v)) => Ok(Value::Byte(*v)),
            (PrimitiveType::Double, WireValue::Double(v)) => Ok(Value::Double(*v)),
            (PrimitiveType::I16, WireValue::I16(v)) => Ok(Value::I16(*v)),
            (PrimitiveType::I32, WireValue::I32(v)) => Ok(Value::I32(*v)),
            (PrimitiveType::I64, WireValue::I64(v)) => Ok(Value::I64(*v)),
            (PrimitiveType::Binary, WireValue::Binary(v)) => Ok(Value::Binary(v.clone())),
            (PrimitiveType::Text, WireValue::Binary(v)) => self.decode_text(v.clone()),
            _ => Err(self.wire_mismatch(wire)),
        }
    }

    fn decode_text(self, bytes: Vec<u8>) -> Result<Value, Error> {
        String::from_utf8(bytes)
            .map(Value::Text)
            .map_err(|_| {
                ValueError::InvalidUtf8 {
                    type_name: self.name().to_string(),
                }
                .into()
            })
    }

    pub fn write_to(self, writer: &mut BinaryWriter<'_>, value: &Value) -> Result<(), Error> {
        match self {
            PrimitiveType::Bool => writer.write_bool(self.as_bool(value)?),
            PrimitiveType::Byte => writer.write_byte(self.int_of(value)? as i8),
            PrimitiveType::I16 => writer.write_i16(self.int_of(value)? as i16),
            PrimitiveType::I32 => writer.write_i32(self.int_of(value)? as i32),
            PrimitiveType::I64 => writer.write_i64(self.int_of(value)?),
            PrimitiveType::Double => writer.write_double(self.as_double(value)?),
            PrimitiveType::Binary | PrimitiveType::Text => {
                writer.write_binary(&self.as_bytes(value)?)
            }
        }
        Ok(())
    }

    pub fn read_from(self, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        match self {
            PrimitiveType::Bool => Ok(Value::Bool(reader.read_bool()?)),
            PrimitiveType::Byte => Ok(Value::Byte(reader.read_byte()?)),
            PrimitiveType::I16 => Ok(Value::I16(reader.read_i16()?)),
            PrimitiveType::I32 => Ok(Value::I32(reader.read_i32()?)),
            PrimitiveType::I64 => Ok(Value::I64(reader.read_i64()?)),
            PrimitiveType::Double => Ok(Value::Double(reader.read_double()?)),
            PrimitiveType::Binary => Ok(Value::Binary(reader.read_binary()?)),
            PrimitiveType::Text => {
                let bytes = reader.read_binary()?;
                self.decode_text(bytes)
            }
        }
    }

    pub fn to_primitive(self, value: &Value) -> Result<Primitive, Error> {
        match self {
            PrimitiveType::Bool => Ok(Primitive::Bool(self.as_bool(value)?)),
            PrimitiveType::Byte | PrimitiveType::I16 | PrimitiveType::I32 | PrimitiveType::I64 => {
                Ok(Primitive::Int(self.int_of(value)?))
            }
            PrimitiveType::Double => Ok(Primitive::Float(self.as_double(value)?)),
            PrimitiveType::Binary => Ok(Primitive::Bytes(self.as_bytes(value)?)),
            PrimitiveType::Text => match value {
                Value::Text(text) => Ok(Primitive::Text(text.clone())),
                Value::Binary(bytes) => match self.decode_text(bytes.clone())? {
                    Value::Text(text) => Ok(Primitive::Text(text)),
                    _ => unreachable!(),
                },
                _ => Err(self.mismatch(value)),
            },
        }
    }

    fn primitive_mismatch(self, primitive: &Primitive) -> Error {
        ValueError::TypeMismatch {
            expected: self.name().to_string(),
            actual: primitive.kind().to_string(),
        }
        .into()
    }

    pub fn from_primitive(self, primitive: &Primitive) -> Result<Value, Error> {
        match (self, primitive) {
            (PrimitiveType::Bool, Primitive::Bool(v)) => Ok(Value::Bool(*v)),
            (PrimitiveType::Bool, Primitive::Int(v @ (0 | 1))) => Ok(Value::Bool(*v == 1)),
            (PrimitiveType::Byte, Primitive::Int(v)) => {
                Ok(Value::Byte(self.checked_int(*v)? as i8))
            }
            (PrimitiveType::I16, Primitive::Int(v)) => Ok(Value::I16(self.checked_int(*v)? as i16)),
            (PrimitiveType::I32, Primitive::Int(v)) => Ok(Value::I32(self.checked_int(*v)? as i32)),
            (PrimitiveType::I64, Primitive::Int(v)) => Ok(Value::I64(*v)),
            (PrimitiveType::Double, Primitive::Float(v)) => Ok(Value::Double(*v)),
            (PrimitiveType::Double, Primitive::Int(v)) => Ok(Value::Double(*v as f64)),
            (PrimitiveType::Binary, Primitive::Bytes(v)) => Ok(Value::Binary(v.clone())),
            (PrimitiveType::Binary, Primitive::Text(v)) => {
                Ok(Value::Binary(v.as_bytes().to_vec()))
            }
            (PrimitiveType::Text, Primitive::Text(v)) => Ok(Value::Text(v.clone())),
            (PrimitiveType::Text, Primitive::Bytes(v)) => self.decode_text(v.clone()),
            _ => Err(self.primitive_mismatch(primitive)),
        }
    }
}

//! Specs for enum types.
//!
//! On the wire an enum is an I32. Duplicate item names are a compile error;
//! duplicate values are allowed, and the reverse index remembers every name
//! for a value in declaration order.

use std::collections::HashMap;

use skein_wire::{BinaryReader, BinaryWriter, Value as WireValue};

use crate::errors::{CompileError, Error, ValueError};
use crate::idl::ast;
use crate::primitive::Primitive;
use crate::value::Value;

/// Annotation that switches an enum's primitive form from the item value to
/// the item name.
const PRIMITIVE_ANNOTATION: &str = "primitive";

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeSpec {
    pub name: String,
    /// Item names to values, in declaration order.
    pub items: Vec<(String, i32)>,
    /// Reverse index: value to every name declared for it, in order.
    values_to_names: HashMap<i32, Vec<String>>,
    /// When true, `to_primitive` emits the item name instead of the value.
    primitive_names: bool,
}

impl EnumTypeSpec {
    pub fn new(name: impl Into<String>, items: Vec<(String, i32)>) -> Self {
        let mut values_to_names: HashMap<i32, Vec<String>> = HashMap::new();
        for (item_name, value) in &items {
            values_to_names
                .entry(*value)
                .or_default()
                .push(item_name.clone());
        }
        Self {
            name: name.into(),
            items,
            values_to_names,
            primitive_names: false,
        }
    }

    pub fn compile(enum_def: &ast::Enum) -> Result<Self, CompileError> {
        let mut items = Vec::with_capacity(enum_def.items.len());
        let mut prev: i64 = -1;

        for item in &enum_def.items {
            let value = item.value.unwrap_or(prev + 1);
            prev = value;

            if items.iter().any(|(name, _)| name == &item.name) {
                return Err(CompileError::new(format!(
                    "Enum entry \"{}.{}\" on line {} has duplicates.",
                    enum_def.name, item.name, item.line
                )));
            }

            if i32::try_from(value).is_err() {
                return Err(CompileError::new(format!(
                    "Value {} of enum entry \"{}.{}\" on line {} does not fit in 32 bits.",
                    value, enum_def.name, item.name, item.line
                )));
            }

            items.push((item.name.clone(), value as i32));
        }

        let mut spec = Self::new(enum_def.name.clone(), items);
        spec.primitive_names = enum_def
            .annotations
            .iter()
            .any(|a| a.name == PRIMITIVE_ANNOTATION && a.value == "name");
        Ok(spec)
    }

    /// The first name declared for `value`, if any.
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.values_to_names
            .get(&value)
            .and_then(|names| names.first())
            .map(String::as_str)
    }

    /// The value of the item with the given name.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.items
            .iter()
            .find(|(item, _)| item == name)
            .map(|(_, value)| *value)
    }

    fn checked(&self, value: &Value) -> Result<i32, Error> {
        let int = value.as_int().ok_or_else(|| ValueError::TypeMismatch {
            expected: self.name.clone(),
            actual: value.kind().to_string(),
        })?;
        i32::try_from(int).map_err(|_| {
            ValueError::OutOfRange {
                value: int,
                target: self.name.clone(),
            }
            .into()
        })
    }

    pub fn validate(&self, value: &Value) -> Result<(), Error> {
        self.checked(value).map(|_| ())
    }

    pub fn to_wire(&self, value: &Value) -> Result<WireValue, Error> {
        Ok(WireValue::I32(self.checked(value)?))
    }

    pub fn from_wire(&self, wire: &WireValue) -> Result<Value, Error> {
        match wire {
            WireValue::I32(v) => Ok(Value::I32(*v)),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name.clone(),
                actual: format!("wire value of type {}", wire.ttype()),
            }
            .into()),
        }
    }

    pub fn write_to(&self, writer: &mut BinaryWriter<'_>, value: &Value) -> Result<(), Error> {
        writer.write_i32(self.checked(value)?);
        Ok(())
    }

    pub fn read_from(&self, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        Ok(Value::I32(reader.read_i32()?))
    }

    pub fn to_primitive(&self, value: &Value) -> Result<Primitive, Error> {
        let value = self.checked(value)?;
        if self.primitive_names {
            if let Some(name) = self.name_of(value) {
                return Ok(Primitive::Text(name.to_string()));
            }
        }
        Ok(Primitive::Int(value as i64))
    }

    pub fn from_primitive(&self, primitive: &Primitive) -> Result<Value, Error> {
        match primitive {
            Primitive::Int(v) => {
                let value = i32::try_from(*v).map_err(|_| ValueError::OutOfRange {
                    value: *v,
                    target: self.name.clone(),
                })?;
                Ok(Value::I32(value))
            }
            Primitive::Text(name) => match self.value_of(name) {
                Some(value) => Ok(Value::I32(value)),
                None => Err(ValueError::UnknownEnumItem {
                    enum_name: self.name.clone(),
                    item: name.clone(),
                }
                .into()),
            },
            _ => Err(ValueError::TypeMismatch {
                expected: self.name.clone(),
                actual: primitive.kind().to_string(),
            }
            .into()),
        }
    }
}

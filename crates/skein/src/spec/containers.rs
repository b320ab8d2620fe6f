//! Specs for list, set, and map types.

use skein_wire::{BinaryReader, BinaryWriter, ListValue, MapValue, SetValue, Value as WireValue};

use crate::errors::{Error, ValueError};
use crate::primitive::Primitive;
use crate::value::Value;

use super::{SpecArena, TypeRef};

/// `list<elem>`. Order-preserving.
#[derive(Debug, Clone, PartialEq)]
pub struct ListTypeSpec {
    pub elem: TypeRef,
}

/// `set<elem>`. Deserialization deduplicates by host equality.
#[derive(Debug, Clone, PartialEq)]
pub struct SetTypeSpec {
    pub elem: TypeRef,
}

/// `map<key, value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTypeSpec {
    pub key: TypeRef,
    pub value: TypeRef,
}

fn mismatch(spec_name: String, value: &Value) -> Error {
    ValueError::TypeMismatch {
        expected: spec_name,
        actual: value.kind().to_string(),
    }
    .into()
}

impl ListTypeSpec {
    fn items<'v>(&self, arena: &SpecArena, value: &'v Value) -> Result<&'v [Value], Error> {
        match value {
            Value::List(items) => Ok(items),
            _ => Err(mismatch(self.name(arena), value)),
        }
    }

    fn name(&self, arena: &SpecArena) -> String {
        format!("list<{}>", arena.name(self.elem.id()))
    }

    pub fn validate(&self, arena: &SpecArena, value: &Value) -> Result<(), Error> {
        let elem = self.elem.id();
        for item in self.items(arena, value)? {
            arena.validate(elem, item)?;
        }
        Ok(())
    }

    pub fn to_wire(&self, arena: &SpecArena, value: &Value) -> Result<WireValue, Error> {
        let elem = self.elem.id();
        let values = self
            .items(arena, value)?
            .iter()
            .map(|item| arena.to_wire(elem, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WireValue::List(ListValue {
            value_ttype: arena.ttype(elem),
            values,
        }))
    }

    pub fn from_wire(&self, arena: &SpecArena, wire: &WireValue) -> Result<Value, Error> {
        let elem = self.elem.id();
        match wire {
            WireValue::List(list) => Ok(Value::List(
                list.values
                    .iter()
                    .map(|item| arena.from_wire(elem, item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: format!("wire value of type {}", wire.ttype()),
            }
            .into()),
        }
    }

    pub fn write_to(
        &self,
        arena: &SpecArena,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        let elem = self.elem.id();
        let items = self.items(arena, value)?;
        writer.write_list_begin(arena.ttype(elem), items.len() as i32);
        for item in items {
            arena.write_to(elem, writer, item)?;
        }
        Ok(())
    }

    pub fn read_from(&self, arena: &SpecArena, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        let elem = self.elem.id();
        let (_, size) = reader.read_list_begin()?;
        let mut items = Vec::with_capacity(size.max(0) as usize);
        for _ in 0..size {
            items.push(arena.read_from(elem, reader)?);
        }
        Ok(Value::List(items))
    }

    pub fn to_primitive(&self, arena: &SpecArena, value: &Value) -> Result<Primitive, Error> {
        let elem = self.elem.id();
        Ok(Primitive::Array(
            self.items(arena, value)?
                .iter()
                .map(|item| arena.to_primitive(elem, item))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn from_primitive(&self, arena: &SpecArena, primitive: &Primitive) -> Result<Value, Error> {
        let elem = self.elem.id();
        match primitive {
            Primitive::Array(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| arena.from_primitive(elem, item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: primitive.kind().to_string(),
            }
            .into()),
        }
    }
}

impl SetTypeSpec {
    fn name(&self, arena: &SpecArena) -> String {
        format!("set<{}>", arena.name(self.elem.id()))
    }

    fn items<'v>(&self, arena: &SpecArena, value: &'v Value) -> Result<&'v [Value], Error> {
        match value {
            Value::Set(items) => Ok(items),
            _ => Err(mismatch(self.name(arena), value)),
        }
    }

    /// Dedup by host equality, preserving first occurrences.
    fn dedup(items: Vec<Value>) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !out.contains(&item) {
                out.push(item);
            }
        }
        out
    }

    pub fn validate(&self, arena: &SpecArena, value: &Value) -> Result<(), Error> {
        let elem = self.elem.id();
        for item in self.items(arena, value)? {
            arena.validate(elem, item)?;
        }
        Ok(())
    }

    pub fn to_wire(&self, arena: &SpecArena, value: &Value) -> Result<WireValue, Error> {
        let elem = self.elem.id();
        let values = self
            .items(arena, value)?
            .iter()
            .map(|item| arena.to_wire(elem, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WireValue::Set(SetValue {
            value_ttype: arena.ttype(elem),
            values,
        }))
    }

    pub fn from_wire(&self, arena: &SpecArena, wire: &WireValue) -> Result<Value, Error> {
        let elem = self.elem.id();
        match wire {
            WireValue::Set(set) => {
                let items = set
                    .values
                    .iter()
                    .map(|item| arena.from_wire(elem, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Set(Self::dedup(items)))
            }
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: format!("wire value of type {}", wire.ttype()),
            }
            .into()),
        }
    }

    pub fn write_to(
        &self,
        arena: &SpecArena,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        let elem = self.elem.id();
        let items = self.items(arena, value)?;
        writer.write_set_begin(arena.ttype(elem), items.len() as i32);
        for item in items {
            arena.write_to(elem, writer, item)?;
        }
        Ok(())
    }

    pub fn read_from(&self, arena: &SpecArena, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        let elem = self.elem.id();
        let (_, size) = reader.read_set_begin()?;
        let mut items = Vec::with_capacity(size.max(0) as usize);
        for _ in 0..size {
            items.push(arena.read_from(elem, reader)?);
        }
        Ok(Value::Set(Self::dedup(items)))
    }

    pub fn to_primitive(&self, arena: &SpecArena, value: &Value) -> Result<Primitive, Error> {
        let elem = self.elem.id();
        Ok(Primitive::Array(
            self.items(arena, value)?
                .iter()
                .map(|item| arena.to_primitive(elem, item))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn from_primitive(&self, arena: &SpecArena, primitive: &Primitive) -> Result<Value, Error> {
        let elem = self.elem.id();
        match primitive {
            Primitive::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| arena.from_primitive(elem, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Set(Self::dedup(items)))
            }
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: primitive.kind().to_string(),
            }
            .into()),
        }
    }
}

impl MapTypeSpec {
    fn name(&self, arena: &SpecArena) -> String {
        format!(
            "map<{}, {}>",
            arena.name(self.key.id()),
            arena.name(self.value.id())
        )
    }

    fn pairs<'v>(
        &self,
        arena: &SpecArena,
        value: &'v Value,
    ) -> Result<&'v [(Value, Value)], Error> {
        match value {
            Value::Map(pairs) => Ok(pairs),
            _ => Err(mismatch(self.name(arena), value)),
        }
    }

    pub fn validate(&self, arena: &SpecArena, value: &Value) -> Result<(), Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        for (k, v) in self.pairs(arena, value)? {
            arena.validate(kspec, k)?;
            arena.validate(vspec, v)?;
        }
        Ok(())
    }

    pub fn to_wire(&self, arena: &SpecArena, value: &Value) -> Result<WireValue, Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        let pairs = self
            .pairs(arena, value)?
            .iter()
            .map(|(k, v)| Ok((arena.to_wire(kspec, k)?, arena.to_wire(vspec, v)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(WireValue::Map(MapValue {
            key_ttype: arena.ttype(kspec),
            value_ttype: arena.ttype(vspec),
            pairs,
        }))
    }

    pub fn from_wire(&self, arena: &SpecArena, wire: &WireValue) -> Result<Value, Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        match wire {
            WireValue::Map(map) => Ok(Value::Map(
                map.pairs
                    .iter()
                    .map(|(k, v)| Ok((arena.from_wire(kspec, k)?, arena.from_wire(vspec, v)?)))
                    .collect::<Result<Vec<_>, Error>>()?,
            )),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: format!("wire value of type {}", wire.ttype()),
            }
            .into()),
        }
    }

    pub fn write_to(
        &self,
        arena: &SpecArena,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        let pairs = self.pairs(arena, value)?;
        writer.write_map_begin(arena.ttype(kspec), arena.ttype(vspec), pairs.len() as i32);
        for (k, v) in pairs {
            arena.write_to(kspec, writer, k)?;
            arena.write_to(vspec, writer, v)?;
        }
        Ok(())
    }

    pub fn read_from(&self, arena: &SpecArena, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        let (_, _, size) = reader.read_map_begin()?;
        let mut pairs = Vec::with_capacity(size.max(0) as usize);
        for _ in 0..size {
            let k = arena.read_from(kspec, reader)?;
            let v = arena.read_from(vspec, reader)?;
            pairs.push((k, v));
        }
        Ok(Value::Map(pairs))
    }

    pub fn to_primitive(&self, arena: &SpecArena, value: &Value) -> Result<Primitive, Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        Ok(Primitive::Object(
            self.pairs(arena, value)?
                .iter()
                .map(|(k, v)| {
                    Ok((arena.to_primitive(kspec, k)?, arena.to_primitive(vspec, v)?))
                })
                .collect::<Result<Vec<_>, Error>>()?,
        ))
    }

    pub fn from_primitive(&self, arena: &SpecArena, primitive: &Primitive) -> Result<Value, Error> {
        let (kspec, vspec) = (self.key.id(), self.value.id());
        match primitive {
            Primitive::Object(pairs) => Ok(Value::Map(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            arena.from_primitive(kspec, k)?,
                            arena.from_primitive(vspec, v)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, Error>>()?,
            )),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name(arena),
                actual: primitive.kind().to_string(),
            }
            .into()),
        }
    }
}

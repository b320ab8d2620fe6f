//! Specs for union types and implicit function-result unions.
//!
//! Unions share the struct wire shape. At most one field may be present;
//! unless the union allows emptiness (void function results), exactly one
//! must be.

use std::collections::HashMap;

use indexmap::IndexMap;

use skein_wire::{
    BinaryReader, BinaryWriter, FieldHeader, StructValue as WireStruct, TType,
    Value as WireValue,
};

use crate::errors::{CompileError, Error, UnknownExceptionError, ValueError};
use crate::idl::ast;
use crate::primitive::Primitive;
use crate::value::{StructValue, Value};

use super::structs::compile_fields;
use super::{FieldSpec, SpecArena};

/// Distinguishes declared unions from the implicit function-result kind,
/// which surfaces unknown exception ids instead of skipping them.
#[derive(Debug, Clone, PartialEq)]
pub enum UnionKind {
    Plain,
    FunctionResult { exception_ids: Vec<i16> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTypeSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    /// Whether a value with no field set is acceptable.
    pub allow_empty: bool,
    pub kind: UnionKind,
    index: HashMap<i16, usize>,
}

impl UnionTypeSpec {
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldSpec>,
        allow_empty: bool,
        kind: UnionKind,
    ) -> Self {
        let index = fields.iter().enumerate().map(|(i, f)| (f.id, i)).collect();
        Self {
            name: name.into(),
            fields,
            allow_empty,
            kind,
            index,
        }
    }

    pub fn compile(arena: &mut SpecArena, def: &ast::Struct) -> Result<Self, CompileError> {
        for field in &def.fields {
            if field.requiredness.is_some() {
                return Err(CompileError::new(format!(
                    "Field \"{}\" of union \"{}\" on line {} is \"{}\". \
                     Unions cannot specify requiredness.",
                    field.name,
                    def.name,
                    field.line,
                    if field.requiredness == Some(true) {
                        "required"
                    } else {
                        "optional"
                    },
                )));
            }
            if field.default.is_some() {
                return Err(CompileError::new(format!(
                    "Field \"{}\" of union \"{}\" on line {} has a default value. \
                     Fields of unions cannot have default values.",
                    field.name, def.name, field.line
                )));
            }
        }

        let fields = compile_fields(arena, &def.fields, &def.name, false)?;
        Ok(Self::new(def.name.clone(), fields, false, UnionKind::Plain))
    }

    pub(crate) fn field_by_id(&self, id: i16) -> Option<&FieldSpec> {
        self.index.get(&id).map(|&i| &self.fields[i])
    }

    fn surface_of<'v>(&self, value: &'v Value) -> Result<&'v StructValue, Error> {
        match value {
            Value::Struct(s) if s.type_name() == self.name => Ok(s),
            _ => Err(ValueError::TypeMismatch {
                expected: self.name.clone(),
                actual: value.kind().to_string(),
            }
            .into()),
        }
    }

    pub fn validate(&self, value: &Value) -> Result<(), Error> {
        self.surface_of(value).map(|_| ())
    }

    /// Enforce the union cardinality rule over present fields.
    fn check_cardinality(&self, present: &IndexMap<String, Value>) -> Result<(), Error> {
        let mut names = present.keys();
        if let (Some(first), Some(second)) = (names.next(), names.next()) {
            return Err(ValueError::MultipleUnionFields {
                union: self.name.clone(),
                first: first.clone(),
                second: second.clone(),
            }
            .into());
        }
        if present.is_empty() && !self.fields.is_empty() && !self.allow_empty {
            return Err(ValueError::EmptyUnion {
                union: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub fn to_wire(&self, arena: &SpecArena, value: &Value) -> Result<WireValue, Error> {
        let surface = self.surface_of(value)?;
        let mut fields = Vec::with_capacity(1);
        for field in &self.fields {
            if let Some(v) = surface.get(&field.name) {
                fields.push(skein_wire::FieldValue {
                    id: field.id,
                    ttype: arena.ttype(field.spec.id()),
                    value: arena.to_wire(field.spec.id(), v)?,
                });
            }
        }
        Ok(WireValue::Struct(WireStruct::new(fields)))
    }

    pub fn from_wire(&self, arena: &SpecArena, wire: &WireValue) -> Result<Value, Error> {
        let wire = match wire {
            WireValue::Struct(s) => s,
            _ => {
                return Err(ValueError::TypeMismatch {
                    expected: self.name.clone(),
                    actual: format!("wire value of type {}", wire.ttype()),
                }
                .into())
            }
        };

        // Function results surface exception ids this module has never
        // heard of; everything else is skipped like a struct would.
        if let UnionKind::FunctionResult { exception_ids } = &self.kind {
            for field in wire.fields() {
                if field.id != 0 && !exception_ids.contains(&field.id) {
                    return Err(UnknownExceptionError {
                        message: format!(
                            "\"{}\" received an unknown exception with ID {}",
                            self.name, field.id
                        ),
                        response: wire.clone(),
                    }
                    .into());
                }
            }
        }

        let mut present = IndexMap::new();
        for field in &self.fields {
            let spec = field.spec.id();
            if let Some(value) = wire.get(field.id, arena.ttype(spec)) {
                present.insert(field.name.clone(), arena.from_wire(spec, value)?);
            }
        }
        self.check_cardinality(&present)?;
        Ok(Value::Struct(StructValue::new(self.name.clone(), present)))
    }

    pub fn write_to(
        &self,
        arena: &SpecArena,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        let surface = self.surface_of(value)?;
        for field in &self.fields {
            if let Some(v) = surface.get(&field.name) {
                let spec = field.spec.id();
                writer.write_field_begin(FieldHeader {
                    ttype: arena.ttype(spec).code(),
                    id: field.id,
                });
                arena.write_to(spec, writer, v)?;
            }
        }
        writer.write_struct_end();
        Ok(())
    }

    pub fn read_from(&self, arena: &SpecArena, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        // Function results go through the wire value so the unknown-exception
        // error can carry the whole struct.
        if matches!(self.kind, UnionKind::FunctionResult { .. }) {
            let wire = reader.read_value(TType::Struct)?;
            return self.from_wire(arena, &wire);
        }

        let mut present = IndexMap::new();
        while let Some(header) = reader.read_field_begin()? {
            match self.field_by_id(header.id) {
                Some(field) if arena.ttype(field.spec.id()).code() == header.ttype => {
                    present.insert(
                        field.name.clone(),
                        arena.read_from(field.spec.id(), reader)?,
                    );
                }
                _ => reader.skip(TType::from_code(header.ttype)?)?,
            }
        }
        self.check_cardinality(&present)?;
        Ok(Value::Struct(StructValue::new(self.name.clone(), present)))
    }

    /// Construct an instance. At most one of `named` may be given; if the
    /// union does not allow emptiness, exactly one.
    pub fn instantiate(
        &self,
        arena: &SpecArena,
        named: Vec<(String, Value)>,
    ) -> Result<Value, Error> {
        let mut present: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in named {
            let field = self
                .fields
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| ValueError::UnknownField {
                    owner: self.name.clone(),
                    field: name.clone(),
                })?;
            if present.contains_key(&name) {
                return Err(ValueError::DuplicateField {
                    owner: self.name.clone(),
                    field: name,
                }
                .into());
            }
            arena.validate(field.spec.id(), &value)?;
            present.insert(name, value);
        }
        self.check_cardinality(&present)?;
        Ok(Value::Struct(StructValue::new(self.name.clone(), present)))
    }

    pub fn to_primitive(&self, arena: &SpecArena, value: &Value) -> Result<Primitive, Error> {
        let surface = self.surface_of(value)?;
        let mut pairs = Vec::with_capacity(1);
        for field in &self.fields {
            if let Some(v) = surface.get(&field.name) {
                pairs.push((
                    Primitive::Text(field.name.clone()),
                    arena.to_primitive(field.spec.id(), v)?,
                ));
            }
        }
        Ok(Primitive::Object(pairs))
    }

    pub fn from_primitive(&self, arena: &SpecArena, primitive: &Primitive) -> Result<Value, Error> {
        let pairs = match primitive {
            Primitive::Object(pairs) => pairs,
            _ => {
                return Err(ValueError::TypeMismatch {
                    expected: self.name.clone(),
                    actual: primitive.kind().to_string(),
                }
                .into())
            }
        };

        let mut present = IndexMap::new();
        for field in &self.fields {
            let given = pairs.iter().find_map(|(key, value)| match key {
                Primitive::Text(name) if name == &field.name => Some(value),
                _ => None,
            });
            if let Some(value) = given {
                present.insert(
                    field.name.clone(),
                    arena.from_primitive(field.spec.id(), value)?,
                );
            }
        }
        self.check_cardinality(&present)?;
        Ok(Value::Struct(StructValue::new(self.name.clone(), present)))
    }
}

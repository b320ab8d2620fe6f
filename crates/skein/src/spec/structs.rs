//! Specs for struct and exception types, and the field spec they share
//! with unions and parameter lists.

use std::collections::HashMap;

use indexmap::IndexMap;

use skein_wire::{
    BinaryReader, BinaryWriter, FieldHeader, StructValue as WireStruct, TType,
    Value as WireValue,
};

use crate::errors::{CompileError, Error, ValueError};
use crate::idl::ast;
use crate::primitive::Primitive;
use crate::value::{StructValue, Value};

use super::consts::ConstNode;
use super::{intern_type_expr, SpecArena, TypeRef};

/// What a struct-shaped spec stands for in the IDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Struct,
    /// Same wire shape, error-like surface.
    Exception,
    /// Implicit `<service>_<function>_request` parameter struct.
    Request,
}

/// Specification of a single field of a struct, union, exception, or
/// parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub id: i16,
    pub name: String,
    pub spec: TypeRef,
    pub required: bool,
    /// Default expression as written in the IDL; resolved by the linker.
    pub(crate) default_expr: Option<ConstNode>,
    /// Resolved default, deep-copied into each constructed instance.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub(crate) fn compile(
        arena: &mut SpecArena,
        field: &ast::Field,
        owner: &str,
        require_requiredness: bool,
    ) -> Result<FieldSpec, CompileError> {
        let id = field.id.ok_or_else(|| {
            CompileError::new(format!(
                "Field \"{}\" of \"{}\" on line {} does not have an explicit field ID. \
                 Please specify the numeric ID for the field.",
                field.name, owner, field.line
            ))
        })?;

        let id = i16::try_from(id).map_err(|_| {
            CompileError::new(format!(
                "Field ID {} of \"{}.{}\" on line {} does not fit in 16 bits.",
                id, owner, field.name, field.line
            ))
        })?;

        let required = match field.requiredness {
            Some(required) => required,
            None if require_requiredness => {
                return Err(CompileError::new(format!(
                    "Field \"{}\" of \"{}\" on line {} does not explicitly specify \
                     requiredness. Please specify whether the field is optional \
                     or required in the IDL.",
                    field.name, owner, field.line
                )))
            }
            None => false,
        };

        Ok(FieldSpec {
            id,
            name: field.name.clone(),
            spec: intern_type_expr(arena, &field.field_type),
            required,
            default_expr: field.default.as_ref().map(ConstNode::compile),
            default: None,
        })
    }
}

/// Compile a field list, rejecting duplicate names and ids.
pub(crate) fn compile_fields(
    arena: &mut SpecArena,
    fields: &[ast::Field],
    owner: &str,
    require_requiredness: bool,
) -> Result<Vec<FieldSpec>, CompileError> {
    let mut specs: Vec<FieldSpec> = Vec::with_capacity(fields.len());
    for field in fields {
        if specs.iter().any(|f| f.name == field.name) {
            return Err(CompileError::new(format!(
                "Field \"{}\" of \"{}\" on line {} has duplicates.",
                field.name, owner, field.line
            )));
        }
        let spec = FieldSpec::compile(arena, field, owner, require_requiredness)?;
        if specs.iter().any(|f| f.id == spec.id) {
            return Err(CompileError::new(format!(
                "Field ID \"{}\" of \"{}\" on line {} has already been used.",
                spec.id, owner, field.line
            )));
        }
        specs.push(spec);
    }
    Ok(specs)
}

/// A struct is a collection of named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructTypeSpec {
    pub name: String,
    pub kind: StructKind,
    pub fields: Vec<FieldSpec>,
    /// Field id to position, for O(1) dispatch during deserialization.
    index: HashMap<i16, usize>,
}

impl StructTypeSpec {
    pub fn new(name: impl Into<String>, kind: StructKind, fields: Vec<FieldSpec>) -> Self {
        let index = fields.iter().enumerate().map(|(i, f)| (f.id, i)).collect();
        Self {
            name: name.into(),
            kind,
            fields,
            index,
        }
    }

    pub fn compile(
        arena: &mut SpecArena,
        def: &ast::Struct,
        kind: StructKind,
        require_requiredness: bool,
    ) -> Result<Self, CompileError> {
        let fields = compile_fields(arena, &def.fields, &def.name, require_requiredness)?;
        Ok(Self::new(def.name.clone(), kind, fields))
    }

    /// Whether the surface of this spec is error-like.
    pub fn is_error(&self) -> bool {
        self.kind == StructKind::Exception
    }

    pub(crate) fn field_by_id(&self, id: i16) -> Option<&FieldSpec> {
        self.index.get(&id).map(|&i| &self.fields[i])
    }

    fn surface_of<'v>(&self, value: &'v Value) -> Result<&'v StructValue, Error> {
        match value {
            // Identity check only: children are validated at construction.
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

    pub fn to_wire(&self, arena: &SpecArena, value: &Value) -> Result<WireValue, Error> {
        let surface = self.surface_of(value)?;
        let mut fields = Vec::with_capacity(surface.fields().len());

        for field in &self.fields {
            match surface.get(&field.name) {
                Some(v) => fields.push(skein_wire::FieldValue {
                    id: field.id,
                    ttype: arena.ttype(field.spec.id()),
                    value: arena.to_wire(field.spec.id(), v)?,
                }),
                None if field.required => {
                    return Err(ValueError::MissingRequired {
                        owner: self.name.clone(),
                        field: field.name.clone(),
                    }
                    .into())
                }
                None => {}
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

        let mut present = IndexMap::new();
        for field in &self.fields {
            let spec = field.spec.id();
            if let Some(value) = wire.get(field.id, arena.ttype(spec)) {
                present.insert(field.name.clone(), arena.from_wire(spec, value)?);
            }
        }
        self.finish_record(present)
    }

    pub fn write_to(
        &self,
        arena: &SpecArena,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        let surface = self.surface_of(value)?;

        for field in &self.fields {
            match surface.get(&field.name) {
                Some(v) => {
                    let spec = field.spec.id();
                    writer.write_field_begin(FieldHeader {
                        ttype: arena.ttype(spec).code(),
                        id: field.id,
                    });
                    arena.write_to(spec, writer, v)?;
                }
                None if field.required => {
                    return Err(ValueError::MissingRequired {
                        owner: self.name.clone(),
                        field: field.name.clone(),
                    }
                    .into())
                }
                None => {}
            }
        }
        writer.write_struct_end();
        Ok(())
    }

    pub fn read_from(&self, arena: &SpecArena, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        let mut present = IndexMap::new();

        while let Some(header) = reader.read_field_begin()? {
            match self.field_by_id(header.id) {
                // Known field with the declared wire type.
                Some(field) if arena.ttype(field.spec.id()).code() == header.ttype => {
                    present.insert(
                        field.name.clone(),
                        arena.read_from(field.spec.id(), reader)?,
                    );
                }
                // Unknown id or mismatched type: skip for compatibility.
                _ => reader.skip(TType::from_code(header.ttype)?)?,
            }
        }
        self.finish_record(present)
    }

    /// Apply defaults and requiredness to present fields, yielding the
    /// finished record in declaration order.
    pub(crate) fn finish_record(
        &self,
        mut present: IndexMap<String, Value>,
    ) -> Result<Value, Error> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in &self.fields {
            if let Some(value) = present.swap_remove(&field.name) {
                fields.insert(field.name.clone(), value);
            } else if let Some(default) = &field.default {
                fields.insert(field.name.clone(), default.clone());
            } else if field.required {
                return Err(ValueError::MissingRequired {
                    owner: self.name.clone(),
                    field: field.name.clone(),
                }
                .into());
            }
        }
        Ok(Value::Struct(StructValue::new(self.name.clone(), fields)))
    }

    /// Construct an instance from named values. Each value is validated;
    /// unspecified fields take their defaults.
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
        self.finish_record(present)
    }

    /// Construct an instance from positional values: fields that are
    /// required and have no default come first, then the rest, each group
    /// in declaration order.
    pub fn instantiate_positional(
        &self,
        arena: &SpecArena,
        args: Vec<Value>,
    ) -> Result<Value, Error> {
        if args.len() > self.fields.len() {
            return Err(ValueError::TypeMismatch {
                expected: format!("at most {} constructor arguments", self.fields.len()),
                actual: format!("{} arguments", args.len()),
            }
            .into());
        }

        let order = self.constructor_order();
        let named = order
            .into_iter()
            .zip(args)
            .map(|(i, value)| (self.fields[i].name.clone(), value))
            .collect();
        self.instantiate(arena, named)
    }

    fn constructor_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if field.required && field.default.is_none() {
                order.push(i);
            }
        }
        for (i, field) in self.fields.iter().enumerate() {
            if !(field.required && field.default.is_none()) {
                order.push(i);
            }
        }
        order
    }

    pub fn to_primitive(&self, arena: &SpecArena, value: &Value) -> Result<Primitive, Error> {
        let surface = self.surface_of(value)?;
        let mut pairs = Vec::with_capacity(surface.fields().len());
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
        self.finish_record(present)
    }
}

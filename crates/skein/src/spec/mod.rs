//! The spec tree: typed intermediate representation of Thrift declarations.
//!
//! Every type expression is interned into a per-module arena addressed by
//! [`TypeId`]. Children hold a [`TypeRef`] that starts out as a name and is
//! patched to an id by the linker, so cyclic type graphs (`Tree` referencing
//! `Branch` referencing `Tree`) terminate trivially: links are ids, not
//! owned subtrees.
//!
//! Bridge operations (`validate`, `to_wire`, `from_wire`, `read_from`,
//! `write_to`, `to_primitive`, `from_primitive`) dispatch on the spec
//! variant; the per-variant rules live in the sibling modules.

pub mod consts;
mod containers;
mod enums;
mod primitive;
mod service;
mod structs;
mod unions;


pub use consts::{ConstNode, ConstSpec};
pub use containers::{ListTypeSpec, MapTypeSpec, SetTypeSpec};
pub use enums::EnumTypeSpec;
pub use primitive::PrimitiveType;
pub use service::{FunctionSpec, ServiceSpec};
pub use structs::{FieldSpec, StructKind, StructTypeSpec};
pub use unions::{UnionKind, UnionTypeSpec};

use skein_wire::{BinaryReader, BinaryWriter, TType, Value as WireValue};

use crate::errors::Error;
use crate::primitive::Primitive;
use crate::value::Value;

/// Index of a spec in its module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Link from one spec to another: a bare name before linking, an arena id
/// after. Any `Named` ref surviving to serialization is a programmer bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named { name: String, line: usize },
    Id(TypeId),
}

impl TypeRef {
    /// The resolved id. Panics on an unlinked reference - linking must
    /// complete before any bridge operation runs.
    pub fn id(&self) -> TypeId {
        match self {
            TypeRef::Id(id) => *id,
            TypeRef::Named { name, .. } => {
                panic!("type reference \"{name}\" was never linked")
            }
        }
    }
}

/// One declarable Thrift type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Primitive(PrimitiveType),
    List(ListTypeSpec),
    Set(SetTypeSpec),
    Map(MapTypeSpec),
    Enum(EnumTypeSpec),
    Struct(StructTypeSpec),
    Union(UnionTypeSpec),
    /// Transparent alias. Name resolution chases through it, so nothing
    /// points at a typedef once linking is done.
    Typedef(TypedefTypeSpec),
}

/// `typedef <target> <name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefTypeSpec {
    pub name: String,
    pub target: TypeRef,
}

impl TypeSpec {
    /// Names this spec still refers to, with the lines that referenced them.
    pub(crate) fn named_refs(&self) -> Vec<(String, usize)> {
        fn collect(r: &TypeRef, out: &mut Vec<(String, usize)>) {
            if let TypeRef::Named { name, line } = r {
                out.push((name.clone(), *line));
            }
        }

        let mut out = Vec::new();
        match self {
            TypeSpec::Primitive(_) | TypeSpec::Enum(_) => {}
            TypeSpec::List(spec) => collect(&spec.elem, &mut out),
            TypeSpec::Set(spec) => collect(&spec.elem, &mut out),
            TypeSpec::Map(spec) => {
                collect(&spec.key, &mut out);
                collect(&spec.value, &mut out);
            }
            TypeSpec::Struct(spec) => {
                for field in &spec.fields {
                    collect(&field.spec, &mut out);
                }
            }
            TypeSpec::Union(spec) => {
                for field in &spec.fields {
                    collect(&field.spec, &mut out);
                }
            }
            TypeSpec::Typedef(spec) => collect(&spec.target, &mut out),
        }
        out
    }

    /// Replace named refs with resolved ids.
    pub(crate) fn patch_refs(&mut self, resolved: &std::collections::HashMap<String, TypeId>) {
        fn patch(r: &mut TypeRef, resolved: &std::collections::HashMap<String, TypeId>) {
            if let TypeRef::Named { name, .. } = r {
                if let Some(&id) = resolved.get(name.as_str()) {
                    *r = TypeRef::Id(id);
                }
            }
        }

        match self {
            TypeSpec::Primitive(_) | TypeSpec::Enum(_) => {}
            TypeSpec::List(spec) => patch(&mut spec.elem, resolved),
            TypeSpec::Set(spec) => patch(&mut spec.elem, resolved),
            TypeSpec::Map(spec) => {
                patch(&mut spec.key, resolved);
                patch(&mut spec.value, resolved);
            }
            TypeSpec::Struct(spec) => {
                for field in &mut spec.fields {
                    patch(&mut field.spec, resolved);
                }
            }
            TypeSpec::Union(spec) => {
                for field in &mut spec.fields {
                    patch(&mut field.spec, resolved);
                }
            }
            TypeSpec::Typedef(spec) => patch(&mut spec.target, resolved),
        }
    }

    /// Clone this spec with every resolved child id rewritten through `f`.
    /// Used when importing specs from an included module's arena.
    pub(crate) fn map_child_ids<E>(
        &self,
        f: &mut impl FnMut(TypeId) -> Result<TypeId, E>,
    ) -> Result<TypeSpec, E> {
        let map = |r: &TypeRef, f: &mut dyn FnMut(TypeId) -> Result<TypeId, E>| match r {
            TypeRef::Id(id) => Ok(TypeRef::Id(f(*id)?)),
            named => Ok(named.clone()),
        };

        Ok(match self {
            TypeSpec::Primitive(p) => TypeSpec::Primitive(*p),
            TypeSpec::Enum(e) => TypeSpec::Enum(e.clone()),
            TypeSpec::List(spec) => TypeSpec::List(ListTypeSpec {
                elem: map(&spec.elem, &mut *f)?,
            }),
            TypeSpec::Set(spec) => TypeSpec::Set(SetTypeSpec {
                elem: map(&spec.elem, &mut *f)?,
            }),
            TypeSpec::Map(spec) => TypeSpec::Map(MapTypeSpec {
                key: map(&spec.key, &mut *f)?,
                value: map(&spec.value, &mut *f)?,
            }),
            TypeSpec::Struct(spec) => {
                let mut copy = spec.clone();
                for field in &mut copy.fields {
                    field.spec = map(&field.spec, &mut *f)?;
                }
                TypeSpec::Struct(copy)
            }
            TypeSpec::Union(spec) => {
                let mut copy = spec.clone();
                for field in &mut copy.fields {
                    field.spec = map(&field.spec, &mut *f)?;
                }
                TypeSpec::Union(copy)
            }
            TypeSpec::Typedef(spec) => TypeSpec::Typedef(TypedefTypeSpec {
                name: spec.name.clone(),
                target: map(&spec.target, &mut *f)?,
            }),
        })
    }
}

/// Owns every spec of a module. Primitives occupy the first eight slots of
/// every arena so they never need importing or name resolution.
#[derive(Debug, Clone)]
pub struct SpecArena {
    entries: Vec<TypeSpec>,
}

impl SpecArena {
    pub fn new() -> Self {
        Self {
            entries: PrimitiveType::ALL
                .iter()
                .map(|p| TypeSpec::Primitive(*p))
                .collect(),
        }
    }

    /// The fixed id of a primitive spec.
    pub fn primitive_id(primitive: PrimitiveType) -> TypeId {
        TypeId(primitive as u32)
    }

    pub fn push(&mut self, spec: TypeSpec) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(spec);
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: TypeId) -> &TypeSpec {
        &self.entries[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut TypeSpec {
        &mut self.entries[id.index()]
    }

    /// The on-wire type code of a spec.
    pub fn ttype(&self, id: TypeId) -> TType {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.ttype(),
            TypeSpec::List(_) => TType::List,
            TypeSpec::Set(_) => TType::Set,
            TypeSpec::Map(_) => TType::Map,
            TypeSpec::Enum(_) => TType::I32,
            TypeSpec::Struct(_) | TypeSpec::Union(_) => TType::Struct,
            TypeSpec::Typedef(spec) => self.ttype(spec.target.id()),
        }
    }

    /// Human-readable name of a spec (`map<string, list<i32>>` style for
    /// containers).
    pub fn name(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.name().to_string(),
            TypeSpec::List(spec) => format!("list<{}>", self.ref_name(&spec.elem)),
            TypeSpec::Set(spec) => format!("set<{}>", self.ref_name(&spec.elem)),
            TypeSpec::Map(spec) => format!(
                "map<{}, {}>",
                self.ref_name(&spec.key),
                self.ref_name(&spec.value)
            ),
            TypeSpec::Enum(spec) => spec.name.clone(),
            TypeSpec::Struct(spec) => spec.name.clone(),
            TypeSpec::Union(spec) => spec.name.clone(),
            TypeSpec::Typedef(spec) => spec.name.clone(),
        }
    }

    fn ref_name(&self, r: &TypeRef) -> String {
        match r {
            TypeRef::Named { name, .. } => name.clone(),
            TypeRef::Id(id) => self.name(*id),
        }
    }

    // --- Bridge operations ---

    /// Check a host value against a spec. Total on all inputs; child
    /// struct values are only checked by surface identity.
    pub fn validate(&self, id: TypeId, value: &Value) -> Result<(), Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.validate(value),
            TypeSpec::List(spec) => spec.validate(self, value),
            TypeSpec::Set(spec) => spec.validate(self, value),
            TypeSpec::Map(spec) => spec.validate(self, value),
            TypeSpec::Enum(spec) => spec.validate(value),
            TypeSpec::Struct(spec) => spec.validate(value),
            TypeSpec::Union(spec) => spec.validate(value),
            TypeSpec::Typedef(spec) => self.validate(spec.target.id(), value),
        }
    }

    /// Convert a host value into its wire representation.
    pub fn to_wire(&self, id: TypeId, value: &Value) -> Result<WireValue, Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.to_wire(value),
            TypeSpec::List(spec) => spec.to_wire(self, value),
            TypeSpec::Set(spec) => spec.to_wire(self, value),
            TypeSpec::Map(spec) => spec.to_wire(self, value),
            TypeSpec::Enum(spec) => spec.to_wire(value),
            TypeSpec::Struct(spec) => spec.to_wire(self, value),
            TypeSpec::Union(spec) => spec.to_wire(self, value),
            TypeSpec::Typedef(spec) => self.to_wire(spec.target.id(), value),
        }
    }

    /// Convert a wire value back into a host value.
    pub fn from_wire(&self, id: TypeId, wire: &WireValue) -> Result<Value, Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.from_wire(wire),
            TypeSpec::List(spec) => spec.from_wire(self, wire),
            TypeSpec::Set(spec) => spec.from_wire(self, wire),
            TypeSpec::Map(spec) => spec.from_wire(self, wire),
            TypeSpec::Enum(spec) => spec.from_wire(wire),
            TypeSpec::Struct(spec) => spec.from_wire(self, wire),
            TypeSpec::Union(spec) => spec.from_wire(self, wire),
            TypeSpec::Typedef(spec) => self.from_wire(spec.target.id(), wire),
        }
    }

    /// Serialize a host value directly to the writer, bypassing wire-value
    /// construction. Behaviorally identical to `to_wire` + `write_value`.
    pub fn write_to(
        &self,
        id: TypeId,
        writer: &mut BinaryWriter<'_>,
        value: &Value,
    ) -> Result<(), Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.write_to(writer, value),
            TypeSpec::List(spec) => spec.write_to(self, writer, value),
            TypeSpec::Set(spec) => spec.write_to(self, writer, value),
            TypeSpec::Map(spec) => spec.write_to(self, writer, value),
            TypeSpec::Enum(spec) => spec.write_to(writer, value),
            TypeSpec::Struct(spec) => spec.write_to(self, writer, value),
            TypeSpec::Union(spec) => spec.write_to(self, writer, value),
            TypeSpec::Typedef(spec) => self.write_to(spec.target.id(), writer, value),
        }
    }

    /// Deserialize a host value directly from the reader.
    pub fn read_from(&self, id: TypeId, reader: &mut BinaryReader<'_>) -> Result<Value, Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.read_from(reader),
            TypeSpec::List(spec) => spec.read_from(self, reader),
            TypeSpec::Set(spec) => spec.read_from(self, reader),
            TypeSpec::Map(spec) => spec.read_from(self, reader),
            TypeSpec::Enum(spec) => spec.read_from(reader),
            TypeSpec::Struct(spec) => spec.read_from(self, reader),
            TypeSpec::Union(spec) => spec.read_from(self, reader),
            TypeSpec::Typedef(spec) => self.read_from(spec.target.id(), reader),
        }
    }

    /// Convert a host value into its JSON-compatible primitive form.
    pub fn to_primitive(&self, id: TypeId, value: &Value) -> Result<Primitive, Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.to_primitive(value),
            TypeSpec::List(spec) => spec.to_primitive(self, value),
            TypeSpec::Set(spec) => spec.to_primitive(self, value),
            TypeSpec::Map(spec) => spec.to_primitive(self, value),
            TypeSpec::Enum(spec) => spec.to_primitive(value),
            TypeSpec::Struct(spec) => spec.to_primitive(self, value),
            TypeSpec::Union(spec) => spec.to_primitive(self, value),
            TypeSpec::Typedef(spec) => self.to_primitive(spec.target.id(), value),
        }
    }

    /// Reconstruct a host value from its primitive form.
    pub fn from_primitive(&self, id: TypeId, primitive: &Primitive) -> Result<Value, Error> {
        match self.get(id) {
            TypeSpec::Primitive(p) => p.from_primitive(primitive),
            TypeSpec::List(spec) => spec.from_primitive(self, primitive),
            TypeSpec::Set(spec) => spec.from_primitive(self, primitive),
            TypeSpec::Map(spec) => spec.from_primitive(self, primitive),
            TypeSpec::Enum(spec) => spec.from_primitive(primitive),
            TypeSpec::Struct(spec) => spec.from_primitive(self, primitive),
            TypeSpec::Union(spec) => spec.from_primitive(self, primitive),
            TypeSpec::Typedef(spec) => self.from_primitive(spec.target.id(), primitive),
        }
    }
}

impl Default for SpecArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern an AST type expression into the arena.
///
/// Primitives map to their fixed slots; containers get fresh entries with
/// their children interned recursively; defined types stay named until the
/// linker resolves them.
pub(crate) fn intern_type_expr(arena: &mut SpecArena, expr: &crate::idl::ast::TypeExpr) -> TypeRef {
    use crate::idl::ast::{PrimitiveName, TypeExpr};

    match expr {
        TypeExpr::Primitive { name, .. } => {
            let primitive = match name {
                PrimitiveName::Bool => PrimitiveType::Bool,
                PrimitiveName::Byte => PrimitiveType::Byte,
                PrimitiveName::I16 => PrimitiveType::I16,
                PrimitiveName::I32 => PrimitiveType::I32,
                PrimitiveName::I64 => PrimitiveType::I64,
                PrimitiveName::Double => PrimitiveType::Double,
                PrimitiveName::String => PrimitiveType::Text,
                PrimitiveName::Binary => PrimitiveType::Binary,
            };
            TypeRef::Id(SpecArena::primitive_id(primitive))
        }
        TypeExpr::List { value, .. } => {
            let elem = intern_type_expr(arena, value);
            TypeRef::Id(arena.push(TypeSpec::List(ListTypeSpec { elem })))
        }
        TypeExpr::Set { value, .. } => {
            let elem = intern_type_expr(arena, value);
            TypeRef::Id(arena.push(TypeSpec::Set(SetTypeSpec { elem })))
        }
        TypeExpr::Map { key, value, .. } => {
            let key = intern_type_expr(arena, key);
            let value = intern_type_expr(arena, value);
            TypeRef::Id(arena.push(TypeSpec::Map(MapTypeSpec { key, value })))
        }
        TypeExpr::Named { name, line } => TypeRef::Named {
            name: name.clone(),
            line: *line,
        },
    }
}

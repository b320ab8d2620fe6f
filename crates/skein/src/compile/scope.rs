//! The compilation environment.
//!
//! A [`Scope`] owns the spec arena and every name table while a module is
//! being compiled. It is mutated only during the compile and link phases;
//! [`Module::assemble`](crate::Module) freezes it afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::CompileError;
use crate::module::Module;
use crate::primitive::Primitive;
use crate::spec::{
    ConstNode, ConstSpec, PrimitiveType, ServiceSpec, SpecArena, TypeId, TypeSpec,
};

pub struct Scope {
    pub name: String,
    pub arena: SpecArena,
    /// Declared and primitive type names. Typedef names are rewritten to
    /// their targets by the linker.
    pub types: IndexMap<String, TypeId>,
    pub services: IndexMap<String, ServiceSpec>,
    pub constants: IndexMap<String, ConstSpec>,
    pub includes: IndexMap<String, Arc<Module>>,
    /// Memo for specs imported from included modules, keyed by the
    /// include's arena identity and foreign id. Keeps shared and cyclic
    /// subgraphs shared.
    import_memo: HashMap<(usize, TypeId), TypeId>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        let arena = SpecArena::new();
        let types = PrimitiveType::ALL
            .iter()
            .map(|p| (p.name().to_string(), SpecArena::primitive_id(*p)))
            .collect();
        Self {
            name: name.into(),
            arena,
            types,
            services: IndexMap::new(),
            constants: IndexMap::new(),
            includes: IndexMap::new(),
            import_memo: HashMap::new(),
        }
    }

    // --- Registration (compile phase) ---

    pub fn add_type(&mut self, name: &str, id: TypeId, line: usize) -> Result<(), CompileError> {
        if self.types.contains_key(name) {
            return Err(CompileError::new(format!(
                "Cannot define type \"{name}\" at line {line}. \
                 Another type with that name already exists."
            )));
        }
        self.types.insert(name.to_string(), id);
        Ok(())
    }

    pub fn add_service(&mut self, spec: ServiceSpec) -> Result<(), CompileError> {
        if self.services.contains_key(&spec.name) {
            return Err(CompileError::new(format!(
                "Cannot define service \"{}\". That name is already taken.",
                spec.name
            )));
        }
        self.services.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn add_constant(&mut self, spec: ConstSpec) -> Result<(), CompileError> {
        if self.constants.contains_key(&spec.name) {
            return Err(CompileError::new(format!(
                "Cannot define constant \"{}\". That name is already taken.",
                spec.name
            )));
        }
        self.constants.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn add_include(&mut self, name: &str, module: Arc<Module>) -> Result<(), CompileError> {
        if self.includes.contains_key(name) {
            return Err(CompileError::new(format!(
                "Cannot include \"{name}\". That name is already taken."
            )));
        }
        self.includes.insert(name.to_string(), module);
        Ok(())
    }

    // --- Resolution (link phase) ---

    /// Find the spec for a type name, chasing typedefs and importing from
    /// included modules for qualified names.
    pub fn resolve_type(&mut self, name: &str, line: usize) -> Result<TypeId, CompileError> {
        self.resolve_type_guarded(name, line, &mut Vec::new())
    }

    fn resolve_type_guarded(
        &mut self,
        name: &str,
        line: usize,
        visiting: &mut Vec<String>,
    ) -> Result<TypeId, CompileError> {
        if let Some((include, rest)) = name.split_once('.') {
            if let Some(module) = self.includes.get(include).cloned() {
                let (owner, foreign) = module.find_type(rest).ok_or_else(|| {
                    CompileError::new(format!(
                        "Unknown type \"{name}\" referenced at line {line}"
                    ))
                })?;
                return Ok(self.import_type(&owner, foreign));
            }
        }

        let id = match self.types.get(name) {
            Some(&id) => id,
            None => {
                return Err(CompileError::new(format!(
                    "Unknown type \"{name}\" referenced at line {line}"
                )))
            }
        };

        match self.arena.get(id) {
            TypeSpec::Typedef(typedef) => {
                if visiting.iter().any(|seen| seen == name) {
                    return Err(CompileError::new(format!(
                        "Cannot resolve type \"{name}\" at line {line}: \
                         the chain of typedefs is circular."
                    )));
                }
                visiting.push(name.to_string());

                match typedef.target.clone() {
                    crate::spec::TypeRef::Id(target) => Ok(target),
                    crate::spec::TypeRef::Named {
                        name: target,
                        line: target_line,
                    } => {
                        let resolved =
                            self.resolve_type_guarded(&target, target_line, visiting)?;
                        // Memoize so later lookups stop chasing.
                        if let TypeSpec::Typedef(typedef) = self.arena.get_mut(id) {
                            typedef.target = crate::spec::TypeRef::Id(resolved);
                        }
                        Ok(resolved)
                    }
                }
            }
            _ => Ok(id),
        }
    }

    /// Copy a spec subtree from an included (already linked) module into
    /// this arena, memoized so cycles and shared nodes stay shared.
    pub(crate) fn import_type(&mut self, module: &Arc<Module>, foreign: TypeId) -> TypeId {
        if let TypeSpec::Primitive(p) = module.arena().get(foreign) {
            return SpecArena::primitive_id(*p);
        }

        let key = (Arc::as_ptr(module) as usize, foreign);
        if let Some(&local) = self.import_memo.get(&key) {
            return local;
        }

        // Reserve the slot before recursing so cyclic graphs terminate.
        // The placeholder is always overwritten below.
        let local = self.arena.push(TypeSpec::Primitive(PrimitiveType::Bool));
        self.import_memo.insert(key, local);

        let spec = module
            .arena()
            .get(foreign)
            .clone()
            .map_child_ids(&mut |child| {
                Ok::<TypeId, std::convert::Infallible>(self.import_type(module, child))
            })
            .unwrap_or_else(|e| match e {});
        *self.arena.get_mut(local) = spec;
        local
    }

    /// Resolve a constant expression to its primitive form.
    pub(crate) fn resolve_const_node(
        &mut self,
        node: &ConstNode,
        visiting: &mut Vec<String>,
    ) -> Result<Primitive, CompileError> {
        match node {
            ConstNode::Bool(v) => Ok(Primitive::Bool(*v)),
            ConstNode::Int(v) => Ok(Primitive::Int(*v)),
            ConstNode::Double(v) => Ok(Primitive::Float(*v)),
            ConstNode::Text(v) => Ok(Primitive::Text(v.clone())),
            ConstNode::List(items) => Ok(Primitive::Array(
                items
                    .iter()
                    .map(|item| self.resolve_const_node(item, visiting))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            ConstNode::Map(pairs) => Ok(Primitive::Object(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            self.resolve_const_node(k, visiting)?,
                            self.resolve_const_node(v, visiting)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, CompileError>>()?,
            )),
            ConstNode::Ref { name, line } => self.resolve_const_ref(name, *line, visiting),
        }
    }

    /// Resolve a constant reference: a constant of this module, an enum
    /// item (`Role.Admin`), or either of those in an included module.
    pub(crate) fn resolve_const_ref(
        &mut self,
        name: &str,
        line: usize,
        visiting: &mut Vec<String>,
    ) -> Result<Primitive, CompileError> {
        if let Some(spec) = self.constants.get(name) {
            if let Some(primitive) = &spec.primitive {
                return Ok(primitive.clone());
            }
            if visiting.iter().any(|seen| seen == name) {
                return Err(CompileError::new(format!(
                    "Cannot resolve constant \"{name}\" referenced at line {line}: \
                     the chain of constants is circular."
                )));
            }
            visiting.push(name.to_string());

            let expr = spec.expr.clone();
            let type_id = spec.spec.id();
            let primitive = self.resolve_const_node(&expr, visiting)?;
            let value = self
                .arena
                .from_primitive(type_id, &primitive)
                .map_err(|e| {
                    CompileError::new(format!(
                        "Value for constant \"{name}\" does not match its type \
                         \"{}\": {e}",
                        self.arena.name(type_id)
                    ))
                })?;

            let spec = self.constants.get_mut(name).expect("constant vanished");
            spec.primitive = Some(primitive.clone());
            spec.value = Some(value);
            return Ok(primitive);
        }

        if let Some((first, rest)) = name.split_once('.') {
            if let Some(&id) = self.types.get(first) {
                if let TypeSpec::Enum(spec) = self.arena.get(id) {
                    return match spec.value_of(rest) {
                        Some(value) => Ok(Primitive::Int(value as i64)),
                        None => Err(CompileError::new(format!(
                            "\"{rest}\" is not an item of enum \"{first}\" \
                             (referenced at line {line})"
                        ))),
                    };
                }
            }
            if let Some(module) = self.includes.get(first) {
                if let Some(primitive) = module.find_constant(rest) {
                    return Ok(primitive);
                }
            }
        }

        Err(CompileError::new(format!(
            "Unknown constant \"{name}\" referenced at line {line}"
        )))
    }
}

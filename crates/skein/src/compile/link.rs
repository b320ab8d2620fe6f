//! The link phase: resolve every name the compile phase left behind.
//!
//! Ordering matters for cycles: arena entries are patched first (ids, not
//! subtrees, so type cycles need no special care), then field defaults and
//! constants (lazily, with in-progress guards), then services (parent
//! before child, with an in-progress marker to reject inheritance cycles).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::errors::CompileError;
use crate::spec::{ConstNode, FunctionSpec, TypeId, TypeRef, TypeSpec};

use super::scope::Scope;

pub(crate) struct Linker<'a> {
    scope: &'a mut Scope,
}

#[derive(Clone, Copy, PartialEq)]
enum LinkState {
    Unlinked,
    Linking,
    Linked,
}

impl<'a> Linker<'a> {
    pub(crate) fn new(scope: &'a mut Scope) -> Self {
        Self { scope }
    }

    pub(crate) fn link(mut self) -> Result<(), CompileError> {
        self.link_types()?;
        // Constant type refs must be patched before defaults resolve,
        // since a default may reference a constant.
        self.patch_constant_types()?;
        self.link_defaults()?;
        self.link_constants()?;
        self.link_services()?;
        Ok(())
    }

    /// Patch every named ref in the arena to an id, and rewrite typedef
    /// names in the scope to their final targets.
    fn link_types(&mut self) -> Result<(), CompileError> {
        // Imports may append fully-resolved entries while we iterate;
        // patching those is a no-op.
        let mut index = 0;
        while index < self.scope.arena.len() {
            let id = TypeId(index as u32);
            let named = self.scope.arena.get(id).named_refs();
            if !named.is_empty() {
                let mut resolved = HashMap::new();
                for (name, line) in named {
                    if !resolved.contains_key(&name) {
                        let target = self.scope.resolve_type(&name, line)?;
                        resolved.insert(name, target);
                    }
                }
                self.scope.arena.get_mut(id).patch_refs(&resolved);
            }
            index += 1;
        }

        let names: Vec<String> = self.scope.types.keys().cloned().collect();
        for name in names {
            let id = self.scope.types[&name];
            if matches!(self.scope.arena.get(id), TypeSpec::Typedef(_)) {
                let target = self.scope.resolve_type(&name, 0)?;
                self.scope.types[&name] = target;
            }
        }
        Ok(())
    }

    /// Resolve field default expressions into validated values.
    fn link_defaults(&mut self) -> Result<(), CompileError> {
        let mut jobs = Vec::new();
        for index in 0..self.scope.arena.len() {
            let id = TypeId(index as u32);
            if let TypeSpec::Struct(spec) = self.scope.arena.get(id) {
                for (field_index, field) in spec.fields.iter().enumerate() {
                    if let Some(expr) = &field.default_expr {
                        jobs.push((
                            id,
                            field_index,
                            expr.clone(),
                            field.spec.id(),
                            spec.name.clone(),
                            field.name.clone(),
                        ));
                    }
                }
            }
        }

        for (id, field_index, expr, field_type, owner, field_name) in jobs {
            let value = self.resolve_value(&expr, field_type).map_err(|e| {
                CompileError::new(format!(
                    "Default value for field \"{field_name}\" of \"{owner}\" \
                     does not match its type: {e}"
                ))
            })?;
            if let TypeSpec::Struct(spec) = self.scope.arena.get_mut(id) {
                spec.fields[field_index].default = Some(value);
                spec.fields[field_index].default_expr = None;
            }
        }
        Ok(())
    }

    fn resolve_value(
        &mut self,
        expr: &ConstNode,
        type_id: TypeId,
    ) -> Result<crate::value::Value, CompileError> {
        let primitive = self.scope.resolve_const_node(expr, &mut Vec::new())?;
        self.scope
            .arena
            .from_primitive(type_id, &primitive)
            .map_err(|e| CompileError::new(e.to_string()))
    }

    /// Resolve the declared type of every constant.
    fn patch_constant_types(&mut self) -> Result<(), CompileError> {
        let names: Vec<String> = self.scope.constants.keys().cloned().collect();
        for name in &names {
            if let TypeRef::Named {
                name: type_name,
                line,
            } = self.scope.constants[name].spec.clone()
            {
                let id = self.scope.resolve_type(&type_name, line)?;
                self.scope.constants[name].spec = TypeRef::Id(id);
            }
        }
        Ok(())
    }

    /// Resolve every constant's value.
    fn link_constants(&mut self) -> Result<(), CompileError> {
        let names: Vec<String> = self.scope.constants.keys().cloned().collect();
        for name in &names {
            self.scope.resolve_const_ref(name, 0, &mut Vec::new())?;
        }
        Ok(())
    }

    /// Resolve parents and build per-service function tables, folding in
    /// inherited functions.
    fn link_services(&mut self) -> Result<(), CompileError> {
        let mut states = vec![LinkState::Unlinked; self.scope.services.len()];
        for index in 0..self.scope.services.len() {
            self.link_service(index, &mut states)?;
        }
        Ok(())
    }

    fn link_service(
        &mut self,
        index: usize,
        states: &mut Vec<LinkState>,
    ) -> Result<(), CompileError> {
        match states[index] {
            LinkState::Linked => return Ok(()),
            LinkState::Linking => {
                let name = self.scope.services.get_index(index).unwrap().0.clone();
                return Err(CompileError::new(format!(
                    "Service \"{name}\" inherits from itself."
                )));
            }
            LinkState::Unlinked => states[index] = LinkState::Linking,
        }

        let (name, parent, functions) = {
            let (name, spec) = self.scope.services.get_index(index).unwrap();
            (name.clone(), spec.parent.clone(), spec.functions.clone())
        };

        let mut table: IndexMap<String, FunctionSpec> = match &parent {
            None => IndexMap::new(),
            Some(parent_name) => self.parent_table(&name, parent_name, states)?,
        };

        for func in functions {
            if table.contains_key(&func.name) {
                return Err(CompileError::new(format!(
                    "Function \"{}.{}\" cannot be defined. \
                     That name is already taken.",
                    name, func.name
                )));
            }
            table.insert(func.name.clone(), func);
        }

        self.scope.services[index].table = table;
        states[index] = LinkState::Linked;
        Ok(())
    }

    fn parent_table(
        &mut self,
        service: &str,
        parent: &str,
        states: &mut Vec<LinkState>,
    ) -> Result<IndexMap<String, FunctionSpec>, CompileError> {
        // Include-qualified parent: import the foreign function table.
        if let Some((include, rest)) = parent.split_once('.') {
            if let Some(module) = self.scope.includes.get(include).cloned() {
                let foreign = module.service(rest).ok_or_else(|| {
                    CompileError::new(format!(
                        "Service \"{service}\" inherits from unknown service \"{parent}\""
                    ))
                })?;
                let mut table = IndexMap::new();
                for (fname, func) in foreign.functions_by_name() {
                    table.insert(
                        fname.clone(),
                        FunctionSpec {
                            name: func.name.clone(),
                            args: self.scope.import_type(&module, func.args),
                            result: func
                                .result
                                .map(|result| self.scope.import_type(&module, result)),
                            oneway: func.oneway,
                        },
                    );
                }
                return Ok(table);
            }
        }

        let parent_index = self.scope.services.get_index_of(parent).ok_or_else(|| {
            CompileError::new(format!(
                "Service \"{service}\" inherits from unknown service \"{parent}\""
            ))
        })?;
        self.link_service(parent_index, states)?;
        Ok(self.scope.services[parent_index].table.clone())
    }
}

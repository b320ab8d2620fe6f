//! Specs for services and their functions.
//!
//! Every function gets an implicit `<service>_<function>_request` struct
//! built from its parameters, and (unless it is oneway) an implicit
//! `<service>_<function>_response` union with field 0 `success` plus one
//! field per declared exception.

use indexmap::IndexMap;

use crate::errors::CompileError;
use crate::idl::ast;

use super::structs::{compile_fields, FieldSpec, StructKind, StructTypeSpec};
use super::unions::{UnionKind, UnionTypeSpec};
use super::{intern_type_expr, SpecArena, TypeId, TypeSpec};

/// A single function of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    /// Spec of the implicit request struct.
    pub args: TypeId,
    /// Spec of the implicit response union; absent for oneway functions.
    pub result: Option<TypeId>,
    pub oneway: bool,
}

/// A service: named functions, with at most one parent to inherit from.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    /// Parent service name, possibly include-qualified. Resolved at link.
    pub parent: Option<String>,
    pub functions: Vec<FunctionSpec>,
    /// Function lookup table including inherited functions; built at link.
    pub(crate) table: IndexMap<String, FunctionSpec>,
}

impl FunctionSpec {
    fn compile(
        arena: &mut SpecArena,
        func: &ast::Function,
        service_name: &str,
    ) -> Result<FunctionSpec, CompileError> {
        if func.oneway {
            if func.return_type.is_some() {
                return Err(CompileError::new(format!(
                    "Function \"{}.{}\" on line {} is oneway. It cannot return a value.",
                    service_name, func.name, func.line
                )));
            }
            if !func.exceptions.is_empty() {
                return Err(CompileError::new(format!(
                    "Function \"{}.{}\" on line {} is oneway. It cannot raise exceptions.",
                    service_name, func.name, func.line
                )));
            }
        }

        let args_name = format!("{}_{}_request", service_name, func.name);
        let params = compile_fields(arena, &func.parameters, &args_name, false)?;
        let args = arena.push(TypeSpec::Struct(StructTypeSpec::new(
            args_name,
            StructKind::Request,
            params,
        )));

        let result = if func.oneway {
            None
        } else {
            let result_name = format!("{}_{}_response", service_name, func.name);
            let mut fields = Vec::new();
            if let Some(return_type) = &func.return_type {
                fields.push(FieldSpec {
                    id: 0,
                    name: "success".to_string(),
                    spec: intern_type_expr(arena, return_type),
                    required: false,
                    default_expr: None,
                    default: None,
                });
            }
            for exc in compile_fields(arena, &func.exceptions, &result_name, false)? {
                if exc.id == 0 {
                    return Err(CompileError::new(format!(
                        "Exception \"{}\" of \"{}\" uses field ID 0, which is \
                         reserved for the return value.",
                        exc.name, result_name
                    )));
                }
                fields.push(exc);
            }

            let exception_ids = fields.iter().map(|f| f.id).filter(|&id| id != 0).collect();
            // An empty response union means "void success".
            let allow_empty = func.return_type.is_none();
            Some(arena.push(TypeSpec::Union(UnionTypeSpec::new(
                result_name,
                fields,
                allow_empty,
                UnionKind::FunctionResult { exception_ids },
            ))))
        };

        Ok(FunctionSpec {
            name: func.name.clone(),
            args,
            result,
            oneway: func.oneway,
        })
    }
}

impl ServiceSpec {
    pub fn compile(arena: &mut SpecArena, service: &ast::Service) -> Result<Self, CompileError> {
        let mut functions: Vec<FunctionSpec> = Vec::with_capacity(service.functions.len());
        for func in &service.functions {
            if functions.iter().any(|f| f.name == func.name) {
                return Err(CompileError::new(format!(
                    "Function \"{}.{}\" on line {} cannot be defined. \
                     That name is already taken.",
                    service.name, func.name, func.line
                )));
            }
            functions.push(FunctionSpec::compile(arena, func, &service.name)?);
        }

        Ok(ServiceSpec {
            name: service.name.clone(),
            parent: service.parent.clone(),
            functions,
            table: IndexMap::new(),
        })
    }

    /// Function lookup including inherited functions. Empty before linking.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.table.get(name)
    }

    /// All callable functions, inherited first.
    pub fn functions_by_name(&self) -> &IndexMap<String, FunctionSpec> {
        &self.table
    }
}

//! The compiler: gathers declarations into a scope, links, and assembles
//! the final module.

mod link;
mod scope;

pub use scope::Scope;

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{CompileError, Error};
use crate::idl::ast::{Definition, Header, Program};
use crate::module::Module;
use crate::spec::{
    ConstSpec, EnumTypeSpec, ServiceSpec, StructKind, StructTypeSpec, TypeSpec, TypedefTypeSpec,
    UnionTypeSpec,
};

use link::Linker;

/// Compiles parsed programs into linked modules.
#[derive(Debug, Clone)]
pub struct Compiler {
    /// When true (the default), struct fields must explicitly say
    /// `required` or `optional`. Apache Thrift's behavior for unmarked
    /// fields differs per language, so unmarked fields are only accepted
    /// for compatibility with existing files.
    pub strict: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self { strict: true }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    /// Compile a program into a linked module.
    ///
    /// `includes` maps include names (the file stem of the included path)
    /// to previously compiled modules; the loader prepares it.
    pub fn compile(
        &self,
        name: &str,
        program: &Program,
        includes: IndexMap<String, Arc<Module>>,
    ) -> Result<Module, Error> {
        let mut scope = Scope::new(name);

        for header in &program.headers {
            match header {
                Header::Include(include) => {
                    let stem = include_stem(&include.path);
                    let module = includes.get(&stem).cloned().ok_or_else(|| {
                        CompileError::new(format!(
                            "Include of \"{}\" found on line {}. \
                             Includes are resolved by the loader; \
                             compile in-memory documents without includes.",
                            include.path, include.line
                        ))
                    })?;
                    scope.add_include(&stem, module)?;
                }
                Header::Namespace(_) => {}
            }
        }

        for definition in &program.definitions {
            self.gather(&mut scope, definition)?;
        }

        Linker::new(&mut scope).link()?;
        Ok(Module::assemble(scope))
    }

    fn gather(&self, scope: &mut Scope, definition: &Definition) -> Result<(), CompileError> {
        match definition {
            Definition::Const(def) => {
                let spec = ConstSpec::compile(&mut scope.arena, def);
                scope.add_constant(spec)
            }
            Definition::Typedef(def) => {
                let target = crate::spec::intern_type_expr(&mut scope.arena, &def.target);
                let id = scope.arena.push(TypeSpec::Typedef(TypedefTypeSpec {
                    name: def.name.clone(),
                    target,
                }));
                scope.add_type(&def.name, id, def.line)
            }
            Definition::Enum(def) => {
                let spec = EnumTypeSpec::compile(def)?;
                let id = scope.arena.push(TypeSpec::Enum(spec));
                scope.add_type(&def.name, id, def.line)
            }
            Definition::Struct(def) => {
                let spec =
                    StructTypeSpec::compile(&mut scope.arena, def, StructKind::Struct, self.strict)?;
                let id = scope.arena.push(TypeSpec::Struct(spec));
                scope.add_type(&def.name, id, def.line)
            }
            Definition::Exception(def) => {
                let spec = StructTypeSpec::compile(
                    &mut scope.arena,
                    def,
                    StructKind::Exception,
                    self.strict,
                )?;
                let id = scope.arena.push(TypeSpec::Struct(spec));
                scope.add_type(&def.name, id, def.line)
            }
            Definition::Union(def) => {
                let spec = UnionTypeSpec::compile(&mut scope.arena, def)?;
                let id = scope.arena.push(TypeSpec::Union(spec));
                scope.add_type(&def.name, id, def.line)
            }
            Definition::Service(def) => {
                let spec = ServiceSpec::compile(&mut scope.arena, def)?;
                scope.add_service(spec)
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// The name an include is reachable under: the file stem of its path.
pub(crate) fn include_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

//! Loads and compiles Thrift files, resolving `include` headers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::compile::{include_stem, Compiler};
use crate::errors::{CompileError, Error};
use crate::idl;
use crate::idl::ast::Header;
use crate::module::Module;

/// Parses and compiles `.thrift` files with a path-keyed module cache.
///
/// Includes are resolved relative to the including file and loaded first;
/// loading the same file twice (directly or through includes) reuses the
/// cached module, so diamond-shaped include graphs share specs.
pub struct Loader {
    compiler: Compiler,
    cache: HashMap<PathBuf, Arc<Module>>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            compiler: Compiler::new(),
            cache: HashMap::new(),
        }
    }

    pub fn with_compiler(compiler: Compiler) -> Self {
        Self {
            compiler,
            cache: HashMap::new(),
        }
    }

    /// Load and compile the Thrift file at `path`, following includes.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Arc<Module>, Error> {
        self.load_inner(path.as_ref(), &mut Vec::new())
    }

    /// Parse and compile an in-memory document. The document may not use
    /// `include` headers since there is no path to resolve them against.
    pub fn loads(&self, name: &str, document: &str) -> Result<Module, Error> {
        let program = idl::parse(document)?;
        self.compiler.compile(name, &program, IndexMap::new())
    }

    fn load_inner(
        &mut self,
        path: &Path,
        loading: &mut Vec<PathBuf>,
    ) -> Result<Arc<Module>, Error> {
        let path = path.canonicalize().map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(module) = self.cache.get(&path) {
            return Ok(Arc::clone(module));
        }
        if loading.contains(&path) {
            return Err(CompileError::new(format!(
                "Cannot include \"{}\". The chain of includes is circular.",
                path.display()
            ))
            .into());
        }
        loading.push(path.clone());

        let document = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let program = idl::parse(&document)?;

        let mut includes = IndexMap::new();
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        for header in &program.headers {
            if let Header::Include(include) = header {
                let module = self.load_inner(&parent.join(&include.path), loading)?;
                includes.insert(include_stem(&include.path), module);
            }
        }

        let name = include_stem(&path.to_string_lossy());
        let module = Arc::new(self.compiler.compile(&name, &program, includes)?);

        loading.pop();
        self.cache.insert(path, Arc::clone(&module));
        Ok(module)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

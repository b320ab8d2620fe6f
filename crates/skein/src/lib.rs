//! skein: a runtime Thrift IDL compiler and binary-protocol serializer.
//!
//! Give it a `.thrift` document and it parses, compiles, and links a
//! [`Module`] holding a typed spec for every declared type, constant, and
//! service. The module serializes and deserializes dynamic [`Value`]s with
//! the Thrift Binary Protocol, with or without message envelopes.
//!
//! # Example
//!
//! ```
//! let module = skein::loads(
//!     "blog",
//!     r#"
//!         struct Post {
//!             1: required string title
//!             2: optional i32 stars = 0
//!         }
//!     "#,
//! )?;
//!
//! let post = module.instantiate("Post", vec![("title", "hello".into())])?;
//! let bytes = module.dumps(&post)?;
//! assert_eq!(module.loads("Post", &bytes)?, post);
//! # Ok::<(), skein::Error>(())
//! ```

pub mod idl;
pub mod spec;

mod compile;
mod errors;
mod loader;
mod module;
mod primitive;
mod value;

pub use compile::Compiler;
pub use errors::{
    CompileError, Error, ParseError, UnknownExceptionError, ValueError,
};
pub use loader::Loader;
pub use module::{Constant, Message, Module};
pub use primitive::Primitive;
pub use value::{StructValue, Value};

/// The wire model and binary codec this crate is built on.
pub use skein_wire as wire;

use std::path::Path;
use std::sync::Arc;

/// Parse and compile an in-memory Thrift document.
pub fn loads(name: &str, document: &str) -> Result<Module, Error> {
    Loader::new().loads(name, document)
}

/// Load and compile a Thrift file, following `include` headers.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Module>, Error> {
    Loader::new().load(path)
}

#[cfg(test)]
mod runtime_tests;

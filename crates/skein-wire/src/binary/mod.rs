//! Thrift Binary Protocol (TBinary) over the read/write buffers.
//!
//! All multi-byte integers and floats are big-endian. Struct fields are
//! framed as `type:1 | id:2` with a single `0x00` terminator; containers
//! carry element type codes and an `i32` size; messages use the strict
//! envelope on write and accept both strict and non-strict on read.

mod message;
mod reader;
mod writer;

pub use message::{FieldHeader, MessageHeader, MessageKind};
pub use reader::{deserialize_value, BinaryReader};
pub use writer::{serialize_value, BinaryWriter};

#[cfg(test)]
mod binary_tests;

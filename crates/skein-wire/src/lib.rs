//! Wire-level half of skein: the Thrift type codes, the protocol-independent
//! value model, byte buffers, and the Binary Protocol (TBinary) codec.
//!
//! Nothing in this crate knows about IDL declarations or host types. A
//! [`Value`] is pure decoded data; the codec turns values into big-endian
//! bytes and back.

mod buffer;
mod error;
mod ttype;
mod value;

pub mod binary;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use error::ProtocolError;
pub use ttype::{TType, STRUCT_END};
pub use value::{FieldValue, ListValue, MapValue, SetValue, StructValue, Value};

pub use binary::{
    deserialize_value, serialize_value, BinaryReader, BinaryWriter, FieldHeader, MessageHeader,
    MessageKind,
};

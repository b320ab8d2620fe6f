//! Parser for the binary protocol.

use crate::buffer::ReadBuffer;
use crate::error::ProtocolError;
use crate::ttype::{TType, STRUCT_END};
use crate::value::{FieldValue, ListValue, MapValue, SetValue, StructValue, Value};

use super::message::{FieldHeader, MessageHeader, MessageKind, VERSION_MASK};

/// Reads values and framing from a [`ReadBuffer`] using TBinary.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    buffer: ReadBuffer<'a>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            buffer: ReadBuffer::new(bytes),
        }
    }

    /// Bytes left in the underlying buffer.
    pub fn available(&self) -> usize {
        self.buffer.available()
    }

    // --- Fixed-width primitives ---

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_byte()? == 1)
    }

    pub fn read_byte(&mut self) -> Result<i8, ProtocolError> {
        let chunk = self.buffer.read(1)?;
        Ok(chunk[0] as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        let chunk = self.buffer.read(2)?;
        Ok(i16::from_be_bytes([chunk[0], chunk[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        let chunk = self.buffer.read(4)?;
        Ok(i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        let chunk = self.buffer.read(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        Ok(i64::from_be_bytes(bytes))
    }

    pub fn read_double(&mut self) -> Result<f64, ProtocolError> {
        let chunk = self.buffer.read(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        Ok(f64::from_be_bytes(bytes))
    }

    /// `len:i32 | len bytes`.
    pub fn read_binary(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let length = self.read_i32()?;
        self.buffer.take(length.max(0) as usize)
    }

    // --- Struct framing ---

    /// The next field header, or `None` at the struct-end byte.
    pub fn read_field_begin(&mut self) -> Result<Option<FieldHeader>, ProtocolError> {
        let ttype = self.read_byte()?;
        if ttype == STRUCT_END {
            return Ok(None);
        }
        let id = self.read_i16()?;
        Ok(Some(FieldHeader { ttype, id }))
    }

    // --- Container headers ---

    pub fn read_map_begin(&mut self) -> Result<(TType, TType, i32), ProtocolError> {
        let key_ttype = TType::from_code(self.read_byte()?)?;
        let value_ttype = TType::from_code(self.read_byte()?)?;
        let size = self.read_i32()?;
        Ok((key_ttype, value_ttype, size))
    }

    pub fn read_set_begin(&mut self) -> Result<(TType, i32), ProtocolError> {
        let value_ttype = TType::from_code(self.read_byte()?)?;
        let size = self.read_i32()?;
        Ok((value_ttype, size))
    }

    pub fn read_list_begin(&mut self) -> Result<(TType, i32), ProtocolError> {
        let value_ttype = TType::from_code(self.read_byte()?)?;
        let size = self.read_i32()?;
        Ok((value_ttype, size))
    }

    // --- Message envelope ---

    /// Accepts both strict and non-strict envelopes.
    ///
    /// Strict frames start with a negative size word carrying the version
    /// and kind; only version 1 is accepted. Non-strict frames start with
    /// the non-negative name length.
    pub fn read_message_begin(&mut self) -> Result<MessageHeader, ProtocolError> {
        let size = self.read_i32()?;
        if size < 0 {
            let version = (size as u32 & VERSION_MASK) >> 16;
            if version != 1 {
                return Err(ProtocolError::UnsupportedVersion(version as i32));
            }
            let kind = MessageKind::from_code((size & 0xff) as i8)?;
            let name = self.read_binary()?;
            let seqid = self.read_i32()?;
            Ok(MessageHeader {
                name: String::from_utf8_lossy(&name).into_owned(),
                kind,
                seqid,
            })
        } else {
            let name = self.buffer.take(size as usize)?;
            let kind = MessageKind::from_code(self.read_byte()?)?;
            let seqid = self.read_i32()?;
            Ok(MessageHeader {
                name: String::from_utf8_lossy(&name).into_owned(),
                kind,
                seqid,
            })
        }
    }

    // --- Skip ---

    /// Discard a value of the given type using the protocol's own structure,
    /// without materializing anything.
    pub fn skip(&mut self, ttype: TType) -> Result<(), ProtocolError> {
        match ttype {
            TType::Bool | TType::Byte => self.buffer.skip(1),
            TType::I16 => self.buffer.skip(2),
            TType::I32 => self.buffer.skip(4),
            TType::I64 | TType::Double => self.buffer.skip(8),
            TType::Binary => {
                let length = self.read_i32()?;
                self.buffer.skip(length.max(0) as usize)
            }
            TType::Struct => {
                while let Some(header) = self.read_field_begin()? {
                    self.skip(TType::from_code(header.ttype)?)?;
                }
                Ok(())
            }
            TType::Map => {
                let (key_ttype, value_ttype, size) = self.read_map_begin()?;
                for _ in 0..size {
                    self.skip(key_ttype)?;
                    self.skip(value_ttype)?;
                }
                Ok(())
            }
            TType::Set => {
                let (value_ttype, size) = self.read_set_begin()?;
                for _ in 0..size {
                    self.skip(value_ttype)?;
                }
                Ok(())
            }
            TType::List => {
                let (value_ttype, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip(value_ttype)?;
                }
                Ok(())
            }
        }
    }

    // --- Generic wire values ---

    /// Read an arbitrary wire value of the given type.
    pub fn read_value(&mut self, ttype: TType) -> Result<Value, ProtocolError> {
        match ttype {
            TType::Bool => Ok(Value::Bool(self.read_bool()?)),
            TType::Byte => Ok(Value::Byte(self.read_byte()?)),
            TType::Double => Ok(Value::Double(self.read_double()?)),
            TType::I16 => Ok(Value::I16(self.read_i16()?)),
            TType::I32 => Ok(Value::I32(self.read_i32()?)),
            TType::I64 => Ok(Value::I64(self.read_i64()?)),
            TType::Binary => Ok(Value::Binary(self.read_binary()?)),
            TType::Struct => {
                let mut fields = Vec::new();
                while let Some(header) = self.read_field_begin()? {
                    let field_ttype = TType::from_code(header.ttype)?;
                    fields.push(FieldValue {
                        id: header.id,
                        ttype: field_ttype,
                        value: self.read_value(field_ttype)?,
                    });
                }
                Ok(Value::Struct(StructValue::new(fields)))
            }
            TType::Map => {
                let (key_ttype, value_ttype, size) = self.read_map_begin()?;
                let mut pairs = Vec::with_capacity(size.max(0) as usize);
                for _ in 0..size {
                    let key = self.read_value(key_ttype)?;
                    let value = self.read_value(value_ttype)?;
                    pairs.push((key, value));
                }
                Ok(Value::Map(MapValue {
                    key_ttype,
                    value_ttype,
                    pairs,
                }))
            }
            TType::Set => {
                let (value_ttype, size) = self.read_set_begin()?;
                let mut values = Vec::with_capacity(size.max(0) as usize);
                for _ in 0..size {
                    values.push(self.read_value(value_ttype)?);
                }
                Ok(Value::Set(SetValue {
                    value_ttype,
                    values,
                }))
            }
            TType::List => {
                let (value_ttype, size) = self.read_list_begin()?;
                let mut values = Vec::with_capacity(size.max(0) as usize);
                for _ in 0..size {
                    values.push(self.read_value(value_ttype)?);
                }
                Ok(Value::List(ListValue {
                    value_ttype,
                    values,
                }))
            }
        }
    }
}

/// Deserialize a single wire value of the given type from bytes.
pub fn deserialize_value(ttype: TType, bytes: &[u8]) -> Result<Value, ProtocolError> {
    BinaryReader::new(bytes).read_value(ttype)
}

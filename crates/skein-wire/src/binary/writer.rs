//! Serializer for the binary protocol.

use crate::buffer::WriteBuffer;
use crate::ttype::{TType, STRUCT_END};
use crate::value::Value;

use super::message::{FieldHeader, MessageHeader, VERSION_1};

/// Writes values and framing to a [`WriteBuffer`] using TBinary.
#[derive(Debug)]
pub struct BinaryWriter<'b> {
    buffer: &'b mut WriteBuffer,
}

impl<'b> BinaryWriter<'b> {
    pub fn new(buffer: &'b mut WriteBuffer) -> Self {
        Self { buffer }
    }

    // --- Fixed-width primitives ---

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(if value { 1 } else { 0 });
    }

    pub fn write_byte(&mut self, value: i8) {
        self.buffer.write(&value.to_be_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buffer.write(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.write(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.write(&value.to_be_bytes());
    }

    pub fn write_double(&mut self, value: f64) {
        self.buffer.write(&value.to_be_bytes());
    }

    /// `len:i32 | len bytes`.
    pub fn write_binary(&mut self, bytes: &[u8]) {
        self.write_i32(bytes.len() as i32);
        self.buffer.write(bytes);
    }

    // --- Struct framing ---

    /// `type:1 | id:2`. No bytes are emitted for struct begin.
    pub fn write_field_begin(&mut self, header: FieldHeader) {
        self.write_byte(header.ttype);
        self.write_i16(header.id);
    }

    /// The single `0x00` terminator.
    pub fn write_struct_end(&mut self) {
        self.write_byte(STRUCT_END);
    }

    // --- Container headers. No end bytes exist for containers. ---

    pub fn write_map_begin(&mut self, key_ttype: TType, value_ttype: TType, size: i32) {
        self.write_byte(key_ttype.code());
        self.write_byte(value_ttype.code());
        self.write_i32(size);
    }

    pub fn write_set_begin(&mut self, value_ttype: TType, size: i32) {
        self.write_byte(value_ttype.code());
        self.write_i32(size);
    }

    pub fn write_list_begin(&mut self, value_ttype: TType, size: i32) {
        self.write_byte(value_ttype.code());
        self.write_i32(size);
    }

    // --- Message envelope ---

    /// Always emits the strict form:
    /// `(0x80010000 | kind):i32 | name_len:i32 | name | seqid:i32`.
    pub fn write_message_begin(&mut self, header: &MessageHeader) {
        self.write_i32((VERSION_1 | header.kind.code() as u32) as i32);
        self.write_binary(header.name.as_bytes());
        self.write_i32(header.seqid);
    }

    // --- Generic wire values ---

    /// Write an arbitrary wire value.
    pub fn write_value(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => self.write_bool(*v),
            Value::Byte(v) => self.write_byte(*v),
            Value::Double(v) => self.write_double(*v),
            Value::I16(v) => self.write_i16(*v),
            Value::I32(v) => self.write_i32(*v),
            Value::I64(v) => self.write_i64(*v),
            Value::Binary(v) => self.write_binary(v),
            Value::Struct(v) => {
                for field in v.fields() {
                    self.write_field_begin(FieldHeader {
                        ttype: field.ttype.code(),
                        id: field.id,
                    });
                    self.write_value(&field.value);
                }
                self.write_struct_end();
            }
            Value::Map(v) => {
                self.write_map_begin(v.key_ttype, v.value_ttype, v.pairs.len() as i32);
                for (key, val) in &v.pairs {
                    self.write_value(key);
                    self.write_value(val);
                }
            }
            Value::Set(v) => {
                self.write_set_begin(v.value_ttype, v.values.len() as i32);
                for item in &v.values {
                    self.write_value(item);
                }
            }
            Value::List(v) => {
                self.write_list_begin(v.value_ttype, v.values.len() as i32);
                for item in &v.values {
                    self.write_value(item);
                }
            }
        }
    }
}

/// Serialize a single wire value to bytes.
pub fn serialize_value(value: &Value) -> Vec<u8> {
    let mut buffer = WriteBuffer::new();
    BinaryWriter::new(&mut buffer).write_value(value);
    buffer.into_bytes()
}

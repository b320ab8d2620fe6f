//! Message envelope and struct framing headers.

use crate::error::ProtocolError;

/// The version word of a strict envelope: `0x8001` in the top half.
pub(crate) const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the version half of a strict size word.
pub(crate) const VERSION_MASK: u32 = 0x7fff_0000;

/// Kind of a message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum MessageKind {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageKind {
    pub fn from_code(code: i8) -> Result<MessageKind, ProtocolError> {
        match code {
            1 => Ok(MessageKind::Call),
            2 => Ok(MessageKind::Reply),
            3 => Ok(MessageKind::Exception),
            4 => Ok(MessageKind::Oneway),
            other => Err(ProtocolError::UnknownMessageKind(other)),
        }
    }

    #[inline]
    pub fn code(self) -> i8 {
        self as i8
    }
}

/// Envelope of a single message: name, kind, and sequence id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub kind: MessageKind,
    pub seqid: i32,
}

/// Header of a single struct field: `type:1 | id:2` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub ttype: i8,
    pub id: i16,
}

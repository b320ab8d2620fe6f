//! On-wire Thrift type codes.

use crate::error::ProtocolError;

/// Byte that terminates a struct on the wire. Not a `TType`.
pub const STRUCT_END: i8 = 0;

/// The closed set of Thrift type codes, wire-compatible with Apache Thrift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i8)]
pub enum TType {
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    Binary = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl TType {
    /// Decode a raw type code. Fails with [`ProtocolError::UnknownTType`]
    /// for anything outside the closed set, including the struct-end byte.
    pub fn from_code(code: i8) -> Result<TType, ProtocolError> {
        match code {
            2 => Ok(TType::Bool),
            3 => Ok(TType::Byte),
            4 => Ok(TType::Double),
            6 => Ok(TType::I16),
            8 => Ok(TType::I32),
            10 => Ok(TType::I64),
            11 => Ok(TType::Binary),
            12 => Ok(TType::Struct),
            13 => Ok(TType::Map),
            14 => Ok(TType::Set),
            15 => Ok(TType::List),
            other => Err(ProtocolError::UnknownTType(other)),
        }
    }

    /// The raw wire code.
    #[inline]
    pub fn code(self) -> i8 {
        self as i8
    }
}

impl std::fmt::Display for TType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TType::Bool => "bool",
            TType::Byte => "byte",
            TType::Double => "double",
            TType::I16 => "i16",
            TType::I32 => "i32",
            TType::I64 => "i64",
            TType::Binary => "binary",
            TType::Struct => "struct",
            TType::Map => "map",
            TType::Set => "set",
            TType::List => "list",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_wire_compatible() {
        assert_eq!(TType::Bool.code(), 2);
        assert_eq!(TType::Byte.code(), 3);
        assert_eq!(TType::Double.code(), 4);
        assert_eq!(TType::I16.code(), 6);
        assert_eq!(TType::I32.code(), 8);
        assert_eq!(TType::I64.code(), 10);
        assert_eq!(TType::Binary.code(), 11);
        assert_eq!(TType::Struct.code(), 12);
        assert_eq!(TType::Map.code(), 13);
        assert_eq!(TType::Set.code(), 14);
        assert_eq!(TType::List.code(), 15);
    }

    #[test]
    fn from_code_round_trips() {
        for code in [2, 3, 4, 6, 8, 10, 11, 12, 13, 14, 15] {
            assert_eq!(TType::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn from_code_rejects_unknown() {
        for code in [-1, 0, 1, 5, 7, 9, 16, 127] {
            assert_eq!(
                TType::from_code(code),
                Err(ProtocolError::UnknownTType(code))
            );
        }
    }
}

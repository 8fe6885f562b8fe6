//! Core data types for LabFlow
//!
//! This module contains the small value types shared by the column model,
//! the filter graph and the import decoders.
//!
//! # Main Types
//!
//! - [`DataType`] - Stable catalog of the fixed-width numeric encodings a
//!   binary source can hold (int8 … real64)
//! - [`ByteOrder`] - Endianness of encoded values
//! - [`ColumnMode`] - Semantic type of a column's values
//! - [`PlotDesignation`] - Role a column plays in a plot
//! - [`ImportMode`] - How imported columns are merged into a data sink
//!
//! # Decoding
//!
//! Every [`DataType`] maps to one entry of a decode table holding its byte
//! width and a decode function. Integer and floating point values are all
//! widened to `f64`, the common storage representation of numeric columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker for a missing numeric value in `f64` column storage.
pub const MISSING_VALUE: f64 = f64::NAN;

/// Check whether a stored numeric value is the missing marker
#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

// ==================== Byte order ====================

/// Byte order of encoded binary values.
///
/// The ordinals match the persisted `byteOrder` attribute (0 = big, 1 = little).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ByteOrder {
    BigEndian = 0,
    #[default]
    LittleEndian = 1,
}

impl ByteOrder {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(ByteOrder::BigEndian),
            1 => Some(ByteOrder::LittleEndian),
            _ => None,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::BigEndian => write!(f, "big endian"),
            ByteOrder::LittleEndian => write!(f, "little endian"),
        }
    }
}

// ==================== Data type catalog ====================

/// Fixed-width numeric encodings of a binary source.
///
/// The ordinal order is part of the persisted format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DataType {
    #[default]
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    UInt8 = 4,
    UInt16 = 5,
    UInt32 = 6,
    UInt64 = 7,
    Real32 = 8,
    Real64 = 9,
}

type DecodeFn = fn(&[u8], ByteOrder) -> f64;

/// One entry of the decode table: byte width and decoder.
struct Codec {
    width: usize,
    decode: DecodeFn,
}

macro_rules! decoder {
    ($name:ident, $ty:ty) => {
        fn $name(bytes: &[u8], order: ByteOrder) -> f64 {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
            match order {
                ByteOrder::BigEndian => <$ty>::from_be_bytes(buf) as f64,
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(buf) as f64,
            }
        }
    };
}

decoder!(decode_i8, i8);
decoder!(decode_i16, i16);
decoder!(decode_i32, i32);
decoder!(decode_i64, i64);
decoder!(decode_u8, u8);
decoder!(decode_u16, u16);
decoder!(decode_u32, u32);
decoder!(decode_u64, u64);
decoder!(decode_f32, f32);
decoder!(decode_f64, f64);

/// Indexed by `DataType` ordinal.
static CODECS: [Codec; 10] = [
    Codec { width: 1, decode: decode_i8 },
    Codec { width: 2, decode: decode_i16 },
    Codec { width: 4, decode: decode_i32 },
    Codec { width: 8, decode: decode_i64 },
    Codec { width: 1, decode: decode_u8 },
    Codec { width: 2, decode: decode_u16 },
    Codec { width: 4, decode: decode_u32 },
    Codec { width: 8, decode: decode_u64 },
    Codec { width: 4, decode: decode_f32 },
    Codec { width: 8, decode: decode_f64 },
];

impl DataType {
    /// All data types in ordinal order
    pub const ALL: [DataType; 10] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Real32,
        DataType::Real64,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Returns the size in bytes of one encoded element
    pub fn size_bytes(self) -> usize {
        CODECS[self as usize].width
    }

    /// Whether values of this type are floating point
    pub fn is_float(self) -> bool {
        matches!(self, DataType::Real32 | DataType::Real64)
    }

    /// Decode one element, widened to `f64`.
    ///
    /// Returns `None` when `bytes` is shorter than the element width.
    pub fn decode(self, bytes: &[u8], order: ByteOrder) -> Option<f64> {
        let codec = &CODECS[self as usize];
        if bytes.len() < codec.width {
            return None;
        }
        Some((codec.decode)(bytes, order))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Real32 => "real32",
            DataType::Real64 => "real64",
        };
        write!(f, "{}", name)
    }
}

// ==================== Column attributes ====================

/// Semantic type of a column's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColumnMode {
    /// 64-bit floating point, `NaN` marks missing values
    #[default]
    Double,
    /// Free text
    Text,
    /// Date and time
    DateTime,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
}

impl ColumnMode {
    /// Whether values of this mode can be read as numbers
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnMode::Double | ColumnMode::Integer | ColumnMode::BigInt
        )
    }
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMode::Double => write!(f, "Double"),
            ColumnMode::Text => write!(f, "Text"),
            ColumnMode::DateTime => write!(f, "DateTime"),
            ColumnMode::Integer => write!(f, "Integer"),
            ColumnMode::BigInt => write!(f, "BigInt"),
        }
    }
}

/// Role a column plays in a plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlotDesignation {
    #[default]
    NoDesignation,
    X,
    Y,
    Z,
    XError,
    YError,
}

/// How imported columns are merged into a data sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImportMode {
    /// Add the imported columns after the existing ones
    Append,
    /// Insert the imported columns before the existing ones
    Prepend,
    /// Discard existing columns and resize to exactly the imported extent
    #[default]
    Replace,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Append => write!(f, "append"),
            ImportMode::Prepend => write!(f, "prepend"),
            ImportMode::Replace => write!(f, "replace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_sizes() {
        let sizes: Vec<usize> = DataType::ALL.iter().map(|t| t.size_bytes()).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8, 1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn test_data_type_ordinals_are_stable() {
        for (i, t) in DataType::ALL.iter().enumerate() {
            assert_eq!(t.ordinal() as usize, i);
            assert_eq!(DataType::from_ordinal(i as i64), Some(*t));
        }
        assert_eq!(DataType::from_ordinal(10), None);
        assert_eq!(DataType::from_ordinal(-1), None);
    }

    #[test]
    fn test_decode_byte_order() {
        let bytes = [0x01, 0x02];
        assert_eq!(
            DataType::UInt16.decode(&bytes, ByteOrder::BigEndian),
            Some(258.0)
        );
        assert_eq!(
            DataType::UInt16.decode(&bytes, ByteOrder::LittleEndian),
            Some(513.0)
        );
    }

    #[test]
    fn test_decode_signed_and_float() {
        assert_eq!(
            DataType::Int8.decode(&[0xFF], ByteOrder::LittleEndian),
            Some(-1.0)
        );
        let pi = 3.5f32.to_be_bytes();
        assert_eq!(DataType::Real32.decode(&pi, ByteOrder::BigEndian), Some(3.5));
        let v = (-42i64).to_le_bytes();
        assert_eq!(
            DataType::Int64.decode(&v, ByteOrder::LittleEndian),
            Some(-42.0)
        );
    }

    #[test]
    fn test_decode_short_input() {
        assert_eq!(DataType::Real64.decode(&[0u8; 4], ByteOrder::LittleEndian), None);
    }

    #[test]
    fn test_byte_order_ordinals() {
        assert_eq!(ByteOrder::BigEndian.ordinal(), 0);
        assert_eq!(ByteOrder::LittleEndian.ordinal(), 1);
        assert_eq!(ByteOrder::from_ordinal(1), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_ordinal(2), None);
    }

    #[test]
    fn test_missing_marker() {
        assert!(is_missing(MISSING_VALUE));
        assert!(!is_missing(0.0));
    }
}

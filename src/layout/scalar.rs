//! Scalar Types
//!
//! The closed set of scalar encodings an attribute can be stored as, together
//! with the byte-width table and the normalized-integer mapping.
//!
//! [`Scalar`] ties a Rust numeric type to its [`ScalarType`] so that typed
//! access can be checked against a field's declared type without any runtime
//! type identity.

use std::fmt;

use bytemuck::Pod;
use half::f16;

/// Storage type of a single attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float16,
    Float32,
    Float64,
}

impl ScalarType {
    /// Every storage type, in declaration order.
    pub const ALL: [ScalarType; 11] = [
        ScalarType::Int8,
        ScalarType::UInt8,
        ScalarType::Int16,
        ScalarType::UInt16,
        ScalarType::Int32,
        ScalarType::UInt32,
        ScalarType::Int64,
        ScalarType::UInt64,
        ScalarType::Float16,
        ScalarType::Float32,
        ScalarType::Float64,
    ];

    /// Width of one component in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !self.is_float()
    }

    #[inline]
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Float16 | Self::Float32 | Self::Float64
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float16 => "half",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }

    /// Decodes one normalized integer component from `bytes`.
    ///
    /// Unsigned values map to `[0, 1]`, signed values to `[-1, 1]` with the
    /// most negative value clamped to `-1`. Float types are returned as-is.
    pub(crate) fn decode_normalized(self, bytes: &[u8]) -> f64 {
        macro_rules! unsigned {
            ($ty:ty) => {
                f64::from(bytemuck::pod_read_unaligned::<$ty>(bytes)) / f64::from(<$ty>::MAX)
            };
        }
        macro_rules! signed {
            ($ty:ty) => {
                (f64::from(bytemuck::pod_read_unaligned::<$ty>(bytes)) / f64::from(<$ty>::MAX)).max(-1.0)
            };
        }
        match self {
            Self::UInt8 => unsigned!(u8),
            Self::UInt16 => unsigned!(u16),
            Self::UInt32 => unsigned!(u32),
            Self::UInt64 => bytemuck::pod_read_unaligned::<u64>(bytes) as f64 / u64::MAX as f64,
            Self::Int8 => signed!(i8),
            Self::Int16 => signed!(i16),
            Self::Int32 => signed!(i32),
            Self::Int64 => (bytemuck::pod_read_unaligned::<i64>(bytes) as f64 / i64::MAX as f64).max(-1.0),
            Self::Float16 => bytemuck::pod_read_unaligned::<f16>(bytes).to_f64(),
            Self::Float32 => f64::from(bytemuck::pod_read_unaligned::<f32>(bytes)),
            Self::Float64 => bytemuck::pod_read_unaligned::<f64>(bytes),
        }
    }

    /// Encodes `value` as one normalized integer component into `out`.
    ///
    /// The value is clamped to the representable range before rounding.
    pub(crate) fn encode_normalized(self, value: f64, out: &mut [u8]) {
        macro_rules! unsigned {
            ($ty:ty) => {{
                let v = (value.clamp(0.0, 1.0) * <$ty>::MAX as f64).round() as $ty;
                out.copy_from_slice(bytemuck::bytes_of(&v));
            }};
        }
        macro_rules! signed {
            ($ty:ty) => {{
                let v = (value.clamp(-1.0, 1.0) * <$ty>::MAX as f64).round() as $ty;
                out.copy_from_slice(bytemuck::bytes_of(&v));
            }};
        }
        match self {
            Self::UInt8 => unsigned!(u8),
            Self::UInt16 => unsigned!(u16),
            Self::UInt32 => unsigned!(u32),
            Self::UInt64 => unsigned!(u64),
            Self::Int8 => signed!(i8),
            Self::Int16 => signed!(i16),
            Self::Int32 => signed!(i32),
            Self::Int64 => signed!(i64),
            Self::Float16 => out.copy_from_slice(bytemuck::bytes_of(&f16::from_f64(value))),
            Self::Float32 => out.copy_from_slice(bytemuck::bytes_of(&(value as f32))),
            Self::Float64 => out.copy_from_slice(bytemuck::bytes_of(&value)),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust numeric type that can be read from or written to an attribute.
pub trait Scalar: Pod + PartialEq + fmt::Debug {
    /// The storage type this Rust type aliases exactly.
    const TYPE: ScalarType;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: ScalarType = ScalarType::$variant;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl Scalar for f16 {
    const TYPE: ScalarType = ScalarType::Float16;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_rust_types() {
        assert_eq!(ScalarType::Int8.byte_width(), size_of::<i8>());
        assert_eq!(ScalarType::UInt16.byte_width(), size_of::<u16>());
        assert_eq!(ScalarType::Float16.byte_width(), size_of::<f16>());
        assert_eq!(ScalarType::Int32.byte_width(), size_of::<i32>());
        assert_eq!(ScalarType::Float32.byte_width(), size_of::<f32>());
        assert_eq!(ScalarType::UInt64.byte_width(), size_of::<u64>());
        assert_eq!(ScalarType::Float64.byte_width(), size_of::<f64>());
    }

    #[test]
    fn width_table_is_consistent() {
        for ty in ScalarType::ALL {
            assert!(matches!(ty.byte_width(), 1 | 2 | 4 | 8), "{ty}");
            assert_ne!(ty.is_float(), ty.is_integer(), "{ty}");
            if ty.is_float() {
                assert!(ty.is_signed(), "{ty}");
            }
            assert_eq!(ty.to_string(), ty.name());
        }
        let floats = ScalarType::ALL.iter().filter(|t| t.is_float()).count();
        assert_eq!(floats, 3);
    }

    #[test]
    fn unsigned_normalized_range() {
        let mut out = [0u8; 1];
        ScalarType::UInt8.encode_normalized(1.0, &mut out);
        assert_eq!(out[0], 255);
        assert!((ScalarType::UInt8.decode_normalized(&out) - 1.0).abs() < 1e-12);

        ScalarType::UInt8.encode_normalized(-3.0, &mut out);
        assert_eq!(out[0], 0);

        ScalarType::UInt8.encode_normalized(0.5, &mut out);
        assert_eq!(out[0], 128);
    }

    #[test]
    fn signed_normalized_clamps_min() {
        let bytes = i16::MIN.to_ne_bytes();
        assert!((ScalarType::Int16.decode_normalized(&bytes) + 1.0).abs() < 1e-12);

        let mut out = [0u8; 2];
        ScalarType::Int16.encode_normalized(-1.0, &mut out);
        assert_eq!(i16::from_ne_bytes(out), -i16::MAX);
    }

    #[test]
    fn scalar_tags() {
        assert_eq!(<f32 as Scalar>::TYPE, ScalarType::Float32);
        assert_eq!(<u8 as Scalar>::TYPE, ScalarType::UInt8);
        assert_eq!(<f16 as Scalar>::TYPE, ScalarType::Float16);
        assert!(ScalarType::Float16.is_float());
        assert!(!ScalarType::UInt32.is_signed());
    }
}

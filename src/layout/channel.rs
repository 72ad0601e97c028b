//! Attribute Channels
//!
//! An [`AttributeChannel`] is the typed codec of one attribute inside a bound
//! record buffer. It knows the record stride and the field placement, and
//! converts between the stored encoding and the Rust type requested by the
//! caller.
//!
//! # Codec Selection
//!
//! | Field                                         | Codec           | Accessible as                 |
//! |-----------------------------------------------|-----------------|-------------------------------|
//! | `internal_type == PACKED_UNORM_10_10_10_2`    | `Packed1010102` | any float type                |
//! | normalized integer                            | `Normalized`    | any float type, stored type   |
//! | other `internal_type != 0`                    | `Opaque`        | stored type (physical words)  |
//! | everything else                               | `Direct`        | stored type                   |
//!
//! Every access validates type and byte range before touching the buffer.

use std::ops::Range;

use crate::errors::{LayoutError, Result};
use crate::layout::attribute::{AttributeField, INTERNAL_NONE, PACKED_UNORM_10_10_10_2};
use crate::layout::scalar::{Scalar, ScalarType};

const PACKED_BITS: [u32; 4] = [10, 10, 10, 2];
const PACKED_SHIFTS: [u32; 4] = [0, 10, 20, 30];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelCodec {
    /// Components stored as declared, accessed by their exact type.
    Direct,
    /// Integer components mapped to `[0, 1]` / `[-1, 1]` on float access.
    Normalized,
    /// Four unorm channels (10/10/10/2 bits) per 32-bit word.
    Packed1010102,
    /// Unknown packing: the physical words are exposed untouched.
    Opaque,
}

impl ChannelCodec {
    fn select(field: &AttributeField) -> Self {
        match field.internal_type() {
            INTERNAL_NONE if field.is_normalized() && field.data_type().is_integer() => Self::Normalized,
            INTERNAL_NONE => Self::Direct,
            PACKED_UNORM_10_10_10_2
                if field.data_type() == ScalarType::UInt32
                    && field.vec_size() == 4
                    && field.col_size() == 1
                    && field.byte_size() == field.array_size() as usize * 4 =>
            {
                Self::Packed1010102
            }
            PACKED_UNORM_10_10_10_2 => {
                log::warn!(
                    "Attribute '{}' does not fit the 10/10/10/2 packing ({} storage, {} bytes); exposing raw words",
                    field.name(),
                    field.data_type(),
                    field.byte_size()
                );
                Self::Opaque
            }
            _ => Self::Opaque,
        }
    }
}

/// Typed access to one attribute of every record in a buffer.
#[derive(Debug, Clone)]
pub struct AttributeChannel {
    field: AttributeField,
    stride: usize,
    codec: ChannelCodec,
}

impl AttributeChannel {
    #[must_use]
    pub fn new(field: AttributeField, stride: usize) -> Self {
        Self {
            codec: ChannelCodec::select(&field),
            field,
            stride,
        }
    }

    #[inline]
    #[must_use]
    pub fn field(&self) -> &AttributeField {
        &self.field
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    #[must_use]
    pub fn codec(&self) -> ChannelCodec {
        self.codec
    }

    /// Number of values exchanged per record.
    ///
    /// Logical components for all codecs except `Opaque`, which exposes the
    /// physical words of the field.
    #[must_use]
    pub fn components(&self) -> usize {
        match self.codec {
            ChannelCodec::Direct | ChannelCodec::Normalized | ChannelCodec::Packed1010102 => {
                self.field.component_count()
            }
            ChannelCodec::Opaque => self.field.byte_size() / self.field.data_type().byte_width(),
        }
    }

    /// Whether values of `requested` type can be exchanged with this channel.
    #[must_use]
    pub fn accepts(&self, requested: ScalarType) -> bool {
        let stored = self.field.data_type();
        match self.codec {
            ChannelCodec::Direct | ChannelCodec::Opaque => requested == stored,
            ChannelCodec::Normalized => requested == stored || requested.is_float(),
            ChannelCodec::Packed1010102 => requested.is_float(),
        }
    }

    /// Bytes touched per record, starting at the field offset.
    fn span(&self) -> usize {
        match self.codec {
            ChannelCodec::Packed1010102 => self.field.array_size() as usize * 4,
            _ => self.components() * self.field.data_type().byte_width(),
        }
    }

    /// Reads `count` records starting at `index` into `values`.
    pub fn read<T: Scalar>(&self, data: &[u8], index: usize, values: &mut [T], count: usize) -> Result<()> {
        let n = self.validate::<T>(data.len(), index, values.len(), count)?;
        if n == 0 {
            return Ok(());
        }

        for (record, dst) in values.chunks_exact_mut(n).take(count).enumerate() {
            let src = index
                .checked_add(record)
                .and_then(|r| self.record_range(r))
                .and_then(|range| data.get(range))
                .ok_or_else(|| self.out_of_range(data.len(), index, count))?;
            self.decode(src, dst);
        }
        Ok(())
    }

    /// Writes `count` records starting at `index` from `values`.
    pub fn write<T: Scalar>(&self, data: &mut [u8], index: usize, values: &[T], count: usize) -> Result<()> {
        let n = self.validate::<T>(data.len(), index, values.len(), count)?;
        if n == 0 {
            return Ok(());
        }

        let data_len = data.len();
        for (record, src) in values.chunks_exact(n).take(count).enumerate() {
            let dst = index
                .checked_add(record)
                .and_then(|r| self.record_range(r))
                .and_then(|range| data.get_mut(range))
                .ok_or_else(|| self.out_of_range(data_len, index, count))?;
            self.encode(src, dst);
        }
        Ok(())
    }

    /// Byte range of this field in record `record`.
    fn record_range(&self, record: usize) -> Option<Range<usize>> {
        let start = record.checked_mul(self.stride)?.checked_add(self.field.offset())?;
        Some(start..start.checked_add(self.span())?)
    }

    fn out_of_range(&self, data_len: usize, index: usize, count: usize) -> LayoutError {
        LayoutError::IndexOutOfRange {
            index,
            count,
            element_count: data_len.checked_div(self.stride).unwrap_or(0),
        }
    }

    /// Checks type, value count and byte range; returns values per record.
    ///
    /// Only whole records are addressable: the trailing `data_len % stride`
    /// bytes are never touched, even by a field that extends past the stride.
    fn validate<T: Scalar>(&self, data_len: usize, index: usize, values_len: usize, count: usize) -> Result<usize> {
        if !self.accepts(T::TYPE) {
            return Err(LayoutError::TypeMismatch {
                attribute: self.field.name().to_string(),
                stored: self.field.data_type(),
                requested: T::TYPE,
            });
        }

        let n = self.components();
        let required = n.saturating_mul(count);
        if values_len < required {
            return Err(LayoutError::BufferTooSmall {
                required,
                actual: values_len,
            });
        }

        if count > 0 {
            let records = data_len.checked_div(self.stride).unwrap_or(0);
            let limit = records * self.stride;
            // Ranges grow with the record index, so the last one bounds them all.
            let end = index
                .checked_add(count - 1)
                .and_then(|last| self.record_range(last))
                .map(|range| range.end);
            if end.is_none_or(|end| end > limit) {
                return Err(self.out_of_range(data_len, index, count));
            }
        }
        Ok(n)
    }

    fn decode<T: Scalar>(&self, src: &[u8], dst: &mut [T]) {
        let stored = self.field.data_type();
        match self.codec {
            ChannelCodec::Direct | ChannelCodec::Opaque => {
                bytemuck::cast_slice_mut::<T, u8>(dst).copy_from_slice(src);
            }
            ChannelCodec::Normalized if T::TYPE == stored => {
                bytemuck::cast_slice_mut::<T, u8>(dst).copy_from_slice(src);
            }
            ChannelCodec::Normalized => {
                for (value, bytes) in dst.iter_mut().zip(src.chunks_exact(stored.byte_width())) {
                    *value = T::from_f64(stored.decode_normalized(bytes));
                }
            }
            ChannelCodec::Packed1010102 => {
                for (channels, word) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    let word: u32 = bytemuck::pod_read_unaligned(word);
                    for ((value, bits), shift) in channels.iter_mut().zip(PACKED_BITS).zip(PACKED_SHIFTS) {
                        let max = (1u32 << bits) - 1;
                        *value = T::from_f64(f64::from((word >> shift) & max) / f64::from(max));
                    }
                }
            }
        }
    }

    fn encode<T: Scalar>(&self, src: &[T], dst: &mut [u8]) {
        let stored = self.field.data_type();
        match self.codec {
            ChannelCodec::Direct | ChannelCodec::Opaque => {
                dst.copy_from_slice(bytemuck::cast_slice(src));
            }
            ChannelCodec::Normalized if T::TYPE == stored => {
                dst.copy_from_slice(bytemuck::cast_slice(src));
            }
            ChannelCodec::Normalized => {
                for (value, bytes) in src.iter().zip(dst.chunks_exact_mut(stored.byte_width())) {
                    stored.encode_normalized(value.to_f64(), bytes);
                }
            }
            ChannelCodec::Packed1010102 => {
                for (channels, word) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                    let mut packed = 0u32;
                    for ((value, bits), shift) in channels.iter().zip(PACKED_BITS).zip(PACKED_SHIFTS) {
                        let max = (1u32 << bits) - 1;
                        let v = (value.to_f64().clamp(0.0, 1.0) * f64::from(max)).round() as u32;
                        packed |= (v & max) << shift;
                    }
                    word.copy_from_slice(&packed.to_ne_bytes());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::interner::AttributeName;

    fn field(ty: ScalarType, vec: u16, normalized: bool, offset: usize) -> AttributeField {
        AttributeField::new(AttributeName::new("ch"), ty, vec, 1, 1, normalized, 0, offset).unwrap()
    }

    #[test]
    fn codec_selection() {
        assert_eq!(AttributeChannel::new(field(ScalarType::Float32, 3, false, 0), 12).codec(), ChannelCodec::Direct);
        assert_eq!(AttributeChannel::new(field(ScalarType::UInt8, 4, true, 0), 4).codec(), ChannelCodec::Normalized);
        assert_eq!(AttributeChannel::new(field(ScalarType::Float32, 4, true, 0), 16).codec(), ChannelCodec::Direct);

        let opaque = AttributeField::with_byte_size(AttributeName::new("o"), ScalarType::UInt16, 4, 3, 1, 1, false, 42, 0).unwrap();
        let ch = AttributeChannel::new(opaque, 4);
        assert_eq!(ch.codec(), ChannelCodec::Opaque);
        assert_eq!(ch.components(), 2);
    }

    #[test]
    fn direct_strided_roundtrip() {
        let ch = AttributeChannel::new(field(ScalarType::Float32, 2, false, 4), 12);
        let mut data = vec![0u8; 36];
        ch.write(&mut data, 1, &[1.0f32, 2.0, 3.0, 4.0], 2).unwrap();

        let mut out = [0.0f32; 4];
        ch.read(&data, 1, &mut out, 2).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
        // record 0 untouched
        assert!(data[..12].iter().all(|&b| b == 0));
    }

    #[test]
    fn type_mismatch_touches_nothing() {
        let ch = AttributeChannel::new(field(ScalarType::Float32, 1, false, 0), 4);
        let mut data = vec![0u8; 4];
        let err = ch.write(&mut data, 0, &[7i32], 1).unwrap_err();
        assert!(matches!(err, LayoutError::TypeMismatch { .. }));
        assert_eq!(data, vec![0u8; 4]);
    }

    #[test]
    fn packed_1010102_roundtrip() {
        let packed = AttributeField::with_byte_size(
            AttributeName::new("p"),
            ScalarType::UInt32,
            4,
            4,
            1,
            1,
            true,
            PACKED_UNORM_10_10_10_2,
            0,
        )
        .unwrap();
        let ch = AttributeChannel::new(packed, 4);
        assert_eq!(ch.codec(), ChannelCodec::Packed1010102);

        let mut data = vec![0u8; 4];
        ch.write(&mut data, 0, &[1.0f32, 0.0, 1.0, 1.0], 1).unwrap();
        let word = u32::from_ne_bytes([data[0], data[1], data[2], data[3]]);
        assert_eq!(word, 0x3ff | (0x3ff << 20) | (0x3 << 30));

        let mut out = [0.0f32; 4];
        ch.read(&data, 0, &mut out, 1).unwrap();
        assert_eq!(out, [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn huge_stride_does_not_wrap() {
        let ch = AttributeChannel::new(field(ScalarType::Float32, 1, false, 0), usize::MAX / 2);
        let mut data = vec![0u8; 8];
        let mut out = [0.0f32; 1];
        assert!(matches!(
            ch.read(&data, 3, &mut out, 1),
            Err(LayoutError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            ch.write(&mut data, 3, &[1.0f32], 1),
            Err(LayoutError::IndexOutOfRange { .. })
        ));
        assert_eq!(data, vec![0u8; 8]);
    }

    #[test]
    fn field_past_stride_stops_at_last_whole_record() {
        // 12-byte field in 8-byte records: record 1 would reach bytes 8..20.
        let ch = AttributeChannel::new(field(ScalarType::Float32, 3, false, 0), 8);
        let mut data = vec![0u8; 20];
        data[16..20].copy_from_slice(&7.0f32.to_ne_bytes());

        let mut out = [0.0f32; 3];
        assert!(matches!(
            ch.read(&data, 1, &mut out, 1),
            Err(LayoutError::IndexOutOfRange { element_count: 2, .. })
        ));
        ch.read(&data, 0, &mut out, 1).unwrap();
        assert_eq!(out, [0.0; 3]);
    }

    #[test]
    fn field_past_buffer_is_rejected() {
        let ch = AttributeChannel::new(field(ScalarType::Float32, 4, false, 8), 16);
        let data = vec![0u8; 16];
        let mut out = [0.0f32; 4];
        assert!(matches!(
            ch.read(&data, 0, &mut out, 1),
            Err(LayoutError::IndexOutOfRange { .. })
        ));
    }
}

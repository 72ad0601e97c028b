use std::cmp::Ordering;
use std::fmt;

use crate::errors::{LayoutError, Result};
use crate::layout::scalar::ScalarType;
use crate::utils::interner::AttributeName;

/// Internal type tag: no packing, components are stored as declared.
pub const INTERNAL_NONE: u32 = 0;

/// Internal type tag: four unsigned normalized channels with 10, 10, 10 and 2
/// bits packed into one `UInt32` word (first channel in the low bits).
pub const PACKED_UNORM_10_10_10_2: u32 = 1;

/// Describes one attribute of a record: name, storage type, shape and
/// placement.
///
/// Fields are immutable once constructed. `byte_size` is either derived from
/// the shape (`width * vec * col * array`) or supplied explicitly for packed
/// encodings, in which case the shape still describes the logical view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "AttributeFieldRepr"))]
pub struct AttributeField {
    name: AttributeName,
    data_type: ScalarType,
    byte_size: usize,
    offset: usize,
    array_size: u32,
    vec_size: u16,
    col_size: u16,
    normalized: bool,
    internal_type: u32,
}

static EMPTY_FIELD: AttributeField = AttributeField::empty();

impl AttributeField {
    /// Creates a field whose byte size is derived from its shape.
    ///
    /// Fails with [`LayoutError::SizeOverflow`] if the byte size or the end of
    /// the field does not fit in `usize`.
    pub fn new(
        name: AttributeName,
        data_type: ScalarType,
        vec_size: u16,
        col_size: u16,
        array_size: u32,
        normalized: bool,
        internal_type: u32,
        offset: usize,
    ) -> Result<Self> {
        let byte_size = shape_bytes(data_type, vec_size, col_size, array_size).ok_or_else(|| overflow(name))?;
        Self::with_byte_size(
            name,
            data_type,
            byte_size,
            vec_size,
            col_size,
            array_size,
            normalized,
            internal_type,
            offset,
        )
    }

    /// Creates a field with an explicit byte size.
    ///
    /// Required whenever `internal_type` packs logical components more densely
    /// than the shape implies.
    pub fn with_byte_size(
        name: AttributeName,
        data_type: ScalarType,
        byte_size: usize,
        vec_size: u16,
        col_size: u16,
        array_size: u32,
        normalized: bool,
        internal_type: u32,
        offset: usize,
    ) -> Result<Self> {
        let field = Self {
            name,
            data_type,
            byte_size,
            offset,
            array_size,
            vec_size,
            col_size,
            normalized,
            internal_type,
        };
        field.checked_end()?;
        Ok(field)
    }

    /// The zero-sized sentinel returned by lookups that find nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            name: AttributeName::EMPTY,
            data_type: ScalarType::UInt8,
            byte_size: 0,
            offset: 0,
            array_size: 0,
            vec_size: 0,
            col_size: 0,
            normalized: false,
            internal_type: INTERNAL_NONE,
        }
    }

    pub(crate) fn empty_ref() -> &'static Self {
        &EMPTY_FIELD
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.byte_size == 0 && self.name.is_empty()
    }

    /// Returns a copy of this field placed at `offset`.
    pub fn with_offset(mut self, offset: usize) -> Result<Self> {
        self.offset = offset;
        self.checked_end()?;
        Ok(self)
    }

    fn checked_end(&self) -> Result<usize> {
        self.offset.checked_add(self.byte_size).ok_or_else(|| overflow(self.name))
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> AttributeName {
        self.name
    }

    #[inline]
    #[must_use]
    pub fn data_type(&self) -> ScalarType {
        self.data_type
    }

    #[inline]
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// One past the last byte of this field within a record.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        // Constructors reject fields whose end overflows.
        self.offset.saturating_add(self.byte_size)
    }

    #[inline]
    #[must_use]
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    #[inline]
    #[must_use]
    pub fn vec_size(&self) -> u16 {
        self.vec_size
    }

    #[inline]
    #[must_use]
    pub fn col_size(&self) -> u16 {
        self.col_size
    }

    #[inline]
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    #[inline]
    #[must_use]
    pub fn internal_type(&self) -> u32 {
        self.internal_type
    }

    /// Number of logical components per record (`vec * col * array`).
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        usize::from(self.vec_size)
            .saturating_mul(usize::from(self.col_size))
            .saturating_mul(self.array_size as usize)
    }
}

fn shape_bytes(data_type: ScalarType, vec_size: u16, col_size: u16, array_size: u32) -> Option<usize> {
    data_type
        .byte_width()
        .checked_mul(usize::from(vec_size))?
        .checked_mul(usize::from(col_size))?
        .checked_mul(usize::try_from(array_size).ok()?)
}

pub(crate) fn overflow(name: AttributeName) -> LayoutError {
    LayoutError::SizeOverflow(format!("attribute '{name}'"))
}

impl Default for AttributeField {
    fn default() -> Self {
        Self::empty()
    }
}

/// Unchecked wire form; converted through the constructors on load.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct AttributeFieldRepr {
    name: AttributeName,
    data_type: ScalarType,
    byte_size: usize,
    offset: usize,
    array_size: u32,
    vec_size: u16,
    col_size: u16,
    normalized: bool,
    internal_type: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<AttributeFieldRepr> for AttributeField {
    type Error = LayoutError;

    fn try_from(r: AttributeFieldRepr) -> Result<Self> {
        // Unpacked components are stored as declared, so the byte size must
        // cover the shape.
        if r.internal_type == INTERNAL_NONE {
            let shape = shape_bytes(r.data_type, r.vec_size, r.col_size, r.array_size).ok_or_else(|| overflow(r.name))?;
            if r.byte_size < shape {
                return Err(LayoutError::InvalidLayout(format!(
                    "attribute '{}' declares {} bytes but its shape needs {shape}",
                    r.name, r.byte_size
                )));
            }
        }
        Self::with_byte_size(
            r.name,
            r.data_type,
            r.byte_size,
            r.vec_size,
            r.col_size,
            r.array_size,
            r.normalized,
            r.internal_type,
            r.offset,
        )
    }
}

// Not a semantic ranking; gives sorted containers a deterministic order.
impl Ord for AttributeField {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then(self.array_size.cmp(&other.array_size))
            .then(self.vec_size.cmp(&other.vec_size))
            .then(self.col_size.cmp(&other.col_size))
            .then(self.byte_size.cmp(&other.byte_size))
            .then(self.data_type.cmp(&other.data_type))
            .then(self.name.cmp(&other.name))
            .then(self.normalized.cmp(&other.normalized))
            .then(self.internal_type.cmp(&other.internal_type))
    }
}

impl PartialOrd for AttributeField {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AttributeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (off {}): ", self.name, self.offset)?;
        if self.array_size > 1 {
            write!(f, "{}", self.array_size)?;
        }
        if self.vec_size > 1 || self.col_size > 1 {
            f.write_str("*")?;
        }
        if self.vec_size > 1 {
            write!(f, "{}", self.vec_size)?;
        }
        if self.vec_size > 1 && self.col_size > 1 {
            f.write_str("x")?;
        }
        if self.col_size > 1 {
            write!(f, "{}", self.col_size)?;
        }
        write!(f, " {} ({} bytes)", self.data_type, self.byte_size)?;
        if self.normalized {
            f.write_str(" (normalized)")?;
        }
        if self.internal_type > 0 {
            write!(f, " (internal: {})", self.internal_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_byte_size() {
        let f = AttributeField::new(AttributeName::new("m"), ScalarType::Float32, 4, 4, 2, false, 0, 8).unwrap();
        assert_eq!(f.byte_size(), 4 * 4 * 4 * 2);
        assert_eq!(f.component_count(), 32);
        assert_eq!(f.end(), 8 + 128);
    }

    #[test]
    fn explicit_byte_size_keeps_shape() {
        let f = AttributeField::with_byte_size(
            AttributeName::new("packed_normal"),
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
        assert_eq!(f.byte_size(), 4);
        assert_eq!(f.vec_size(), 4);
        assert_eq!(f.component_count(), 4);
    }

    #[test]
    fn display_vector_normalized() {
        let f = AttributeField::new(AttributeName::new("color"), ScalarType::UInt8, 4, 1, 1, true, 0, 12).unwrap();
        assert_eq!(f.to_string(), "color (off 12): *4 uint8 (4 bytes) (normalized)");
    }

    #[test]
    fn display_matrix_array_internal() {
        let f = AttributeField::new(AttributeName::new("bones"), ScalarType::Float32, 4, 4, 3, false, 7, 0).unwrap();
        assert_eq!(f.to_string(), "bones (off 0): 3*4x4 float (192 bytes) (internal: 7)");

        let s = AttributeField::new(AttributeName::new("w"), ScalarType::Float64, 1, 1, 1, false, 0, 4).unwrap();
        assert_eq!(s.to_string(), "w (off 4):  double (8 bytes)");
    }

    #[test]
    fn ordering_prefers_offset() {
        let a = AttributeField::new(AttributeName::new("z"), ScalarType::Float32, 4, 1, 1, false, 0, 0).unwrap();
        let b = AttributeField::new(AttributeName::new("a"), ScalarType::UInt8, 1, 1, 1, false, 0, 4).unwrap();
        assert!(a < b);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn oversized_shape_is_rejected() {
        let err = AttributeField::new(AttributeName::new("huge"), ScalarType::Float64, u16::MAX, u16::MAX, u32::MAX, false, 0, 0)
            .unwrap_err();
        assert_eq!(err, LayoutError::SizeOverflow("attribute 'huge'".to_string()));
    }

    #[test]
    fn offset_past_usize_is_rejected() {
        let name = AttributeName::new("tail");
        let err = AttributeField::new(name, ScalarType::Float32, 1, 1, 1, false, 0, usize::MAX - 3).unwrap_err();
        assert!(matches!(err, LayoutError::SizeOverflow(_)));

        let f = AttributeField::new(name, ScalarType::Float32, 1, 1, 1, false, 0, usize::MAX - 4).unwrap();
        assert_eq!(f.end(), usize::MAX);
        assert!(f.with_offset(usize::MAX).is_err());
    }

    #[test]
    fn empty_sentinel() {
        let e = AttributeField::empty();
        assert!(e.is_empty());
        assert_eq!(e.byte_size(), 0);
        assert!(e.name().is_empty());
        assert_eq!(AttributeField::default(), e);
    }
}

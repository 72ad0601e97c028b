//! Record Format
//!
//! [`RecordFormat`] is the schema of one record: an ordered list of
//! [`AttributeField`]s, the record stride (`size`) and an alignment hint.
//!
//! # Layout Rules
//!
//! - [`RecordFormat::append_attribute`] places the new field at the current `size` and
//!   grows `size` by the field's byte size, so for append-only formats the
//!   offset of field *i* is the sum of all earlier byte sizes.
//! - [`RecordFormat::append_explicit`] takes the offset from the caller and
//!   leaves `size` untouched (manually interleaved layouts).
//! - [`RecordFormat::update`] and [`RecordFormat::merge`] keep `size` in sync.
//! - [`RecordFormat::set_size`] forces a stride, e.g. for hardware padding.
//!
//! ```rust,ignore
//! let mut format = RecordFormat::new();
//! format.append_vec3("position", 1, false)?;
//! format.append_attribute("color", ScalarType::UInt8, 4, 1, 1, true, 0)?;
//! assert_eq!(format.size(), 16);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{LayoutError, Result};
use crate::layout::attribute::{AttributeField, overflow};
use crate::layout::scalar::ScalarType;
use crate::utils::interner::AttributeName;

/// Ordered attribute list plus record stride.
///
/// Equality and hashing are order-sensitive: the same fields in a different
/// order describe a different layout.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RecordFormatRepr"))]
pub struct RecordFormat {
    attributes: Vec<AttributeField>,
    size: usize,
    alignment: usize,
}

impl RecordFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty format carrying an attribute alignment hint.
    #[must_use]
    pub fn with_alignment(alignment: usize) -> Self {
        Self {
            attributes: Vec::new(),
            size: 0,
            alignment,
        }
    }

    // ========================================================================
    // Appending
    // ========================================================================

    /// Appends a field at the end of the record.
    ///
    /// The returned reference is valid until the next mutation of this format.
    pub fn append_attribute(
        &mut self,
        name: impl Into<AttributeName>,
        data_type: ScalarType,
        vec_size: u16,
        col_size: u16,
        array_size: u32,
        normalized: bool,
        internal_type: u32,
    ) -> Result<&AttributeField> {
        let field = AttributeField::new(
            name.into(),
            data_type,
            vec_size,
            col_size,
            array_size,
            normalized,
            internal_type,
            self.size,
        )?;
        self.push_appended(field)
    }

    /// Appends a field with an explicit byte size at the end of the record.
    pub fn append_packed(
        &mut self,
        name: impl Into<AttributeName>,
        data_type: ScalarType,
        byte_size: usize,
        vec_size: u16,
        col_size: u16,
        array_size: u32,
        normalized: bool,
        internal_type: u32,
    ) -> Result<&AttributeField> {
        let field = AttributeField::with_byte_size(
            name.into(),
            data_type,
            byte_size,
            vec_size,
            col_size,
            array_size,
            normalized,
            internal_type,
            self.size,
        )?;
        self.push_appended(field)
    }

    /// Appends a field at a caller-chosen offset without touching `size`.
    ///
    /// Use together with [`RecordFormat::set_size`] for manually interleaved
    /// layouts; overlapping fields are not detected.
    pub fn append_explicit(
        &mut self,
        name: impl Into<AttributeName>,
        data_type: ScalarType,
        vec_size: u16,
        col_size: u16,
        array_size: u32,
        normalized: bool,
        internal_type: u32,
        offset: usize,
    ) -> Result<&AttributeField> {
        let field = AttributeField::new(
            name.into(),
            data_type,
            vec_size,
            col_size,
            array_size,
            normalized,
            internal_type,
            offset,
        )?;
        self.ensure_unique(field.name())?;
        self.attributes.push(field);
        Ok(self.last())
    }

    fn push_appended(&mut self, field: AttributeField) -> Result<&AttributeField> {
        self.ensure_unique(field.name())?;
        // The field starts at the old size.
        self.size = field.end();
        self.attributes.push(field);
        Ok(self.last())
    }

    fn last(&self) -> &AttributeField {
        self.attributes.last().unwrap_or(AttributeField::empty_ref())
    }

    fn ensure_unique(&self, name: AttributeName) -> Result<()> {
        if self.has_name(name) {
            return Err(LayoutError::DuplicateAttribute(name.to_string()));
        }
        Ok(())
    }

    /// Adds `array_size` float values.
    pub fn append_float(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::Float32, 1, 1, array_size, normalized, 0)
    }

    /// Adds a float vector with `components` channels.
    pub fn append_float_vec(
        &mut self,
        name: impl Into<AttributeName>,
        components: u16,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::Float32, components, 1, array_size, normalized, 0)
    }

    pub fn append_vec2(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_float_vec(name, 2, array_size, normalized)
    }

    pub fn append_vec3(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_float_vec(name, 3, array_size, normalized)
    }

    pub fn append_vec4(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_float_vec(name, 4, array_size, normalized)
    }

    /// Adds a float matrix with `rows` components per column.
    pub fn append_float_mat(
        &mut self,
        name: impl Into<AttributeName>,
        rows: u16,
        columns: u16,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::Float32, rows, columns, array_size, normalized, 0)
    }

    pub fn append_mat3(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_float_mat(name, 3, 3, array_size, normalized)
    }

    pub fn append_mat4(
        &mut self,
        name: impl Into<AttributeName>,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_float_mat(name, 4, 4, array_size, normalized)
    }

    pub fn append_uint(&mut self, name: impl Into<AttributeName>, array_size: u32) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::UInt32, 1, 1, array_size, false, 0)
    }

    pub fn append_uint_vec(
        &mut self,
        name: impl Into<AttributeName>,
        components: u16,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::UInt32, components, 1, array_size, normalized, 0)
    }

    pub fn append_int(&mut self, name: impl Into<AttributeName>, array_size: u32) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::Int32, 1, 1, array_size, false, 0)
    }

    pub fn append_int_vec(
        &mut self,
        name: impl Into<AttributeName>,
        components: u16,
        array_size: u32,
        normalized: bool,
    ) -> Result<&AttributeField> {
        self.append_attribute(name, ScalarType::Int32, components, 1, array_size, normalized, 0)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Returns the field named `name`, or `None`. Never fails.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeField> {
        let name = AttributeName::lookup(name)?;
        self.get_by_name(name)
    }

    #[must_use]
    pub fn get_by_name(&self, name: AttributeName) -> Option<&AttributeField> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Returns the field named `name`, or the zero-sized empty field.
    #[must_use]
    pub fn get_or_empty(&self, name: &str) -> &AttributeField {
        self.get(name).unwrap_or(AttributeField::empty_ref())
    }

    /// Returns the field at `location`.
    pub fn attribute_at(&self, location: usize) -> Result<&AttributeField> {
        self.attributes.get(location).ok_or(LayoutError::OutOfRange {
            location,
            count: self.attributes.len(),
        })
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn has_name(&self, name: AttributeName) -> bool {
        self.get_by_name(name).is_some()
    }

    /// Position of the field named `name` in declaration order.
    #[must_use]
    pub fn location_of(&self, name: &str) -> Option<usize> {
        let name = AttributeName::lookup(name)?;
        self.location_of_name(name)
    }

    #[must_use]
    pub fn location_of_name(&self, name: AttributeName) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    // ========================================================================
    // Structural Mutation
    // ========================================================================

    /// Replaces the field with the same name, or appends `field`.
    ///
    /// With `recalc_offsets`, offsets are reassigned by accumulating byte
    /// sizes in declaration order; otherwise the offsets as given are kept.
    /// `size` is always recomputed to cover every field. On overflow the
    /// format is left unchanged.
    pub fn update(&mut self, field: AttributeField, recalc_offsets: bool) -> Result<()> {
        let mut attributes = self.attributes.clone();
        match self.location_of_name(field.name()) {
            Some(location) => attributes[location] = field,
            None => attributes.push(field),
        }

        if recalc_offsets {
            let mut offset = 0;
            for attr in &mut attributes {
                *attr = attr.with_offset(offset)?;
                offset = attr.end();
            }
        }

        self.size = attributes.iter().map(AttributeField::end).max().unwrap_or(0);
        self.attributes = attributes;
        log::debug!("Updated attribute '{}', record size is now {}", field.name(), self.size);
        Ok(())
    }

    /// Appends every field of `other`, shifted behind the current record.
    ///
    /// Fails without modifying `self` if a name of `other` already exists or
    /// the merged record does not fit in `usize`.
    pub fn merge(&mut self, other: &RecordFormat) -> Result<()> {
        if let Some(dup) = other.attributes.iter().find(|a| self.has_name(a.name())) {
            return Err(LayoutError::DuplicateAttribute(dup.name().to_string()));
        }

        let base = self.size;
        let size = base.checked_add(other.size).ok_or_else(|| {
            LayoutError::SizeOverflow(format!("merged record of {base} + {} bytes", other.size))
        })?;
        let shifted = other
            .attributes
            .iter()
            .map(|a| {
                let offset = a.offset().checked_add(base).ok_or_else(|| overflow(a.name()))?;
                a.with_offset(offset)
            })
            .collect::<Result<Vec<_>>>()?;

        self.attributes.extend(shifted);
        self.size = size;
        log::debug!(
            "Merged {} attribute(s), record size is now {}",
            other.attributes.len(),
            self.size
        );
        Ok(())
    }

    /// Forces the record stride. Offsets are not touched.
    ///
    /// The size is recomputed by the next append/update/merge.
    pub fn set_size(&mut self, size: usize) {
        let covered = self.attributes.iter().map(AttributeField::end).max().unwrap_or(0);
        if size < covered {
            log::warn!("Forcing record size {size} below attribute coverage of {covered} bytes");
        }
        self.size = size;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Record stride in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[AttributeField] {
        &self.attributes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeField> {
        self.attributes.iter()
    }
}

/// Unchecked wire form; names must be unique and `size` must cover every
/// field.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RecordFormatRepr {
    attributes: Vec<AttributeField>,
    size: usize,
    alignment: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RecordFormatRepr> for RecordFormat {
    type Error = LayoutError;

    fn try_from(r: RecordFormatRepr) -> Result<Self> {
        let mut format = RecordFormat::with_alignment(r.alignment);
        for field in r.attributes {
            format.ensure_unique(field.name())?;
            format.attributes.push(field);
        }

        let covered = format.attributes.iter().map(AttributeField::end).max().unwrap_or(0);
        if r.size < covered {
            return Err(LayoutError::InvalidLayout(format!(
                "record size {} is below attribute coverage of {covered} bytes",
                r.size
            )));
        }
        format.size = r.size;
        Ok(format)
    }
}

impl<'a> IntoIterator for &'a RecordFormat {
    type Item = &'a AttributeField;
    type IntoIter = std::slice::Iter<'a, AttributeField>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

impl PartialEq for RecordFormat {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.alignment == other.alignment && self.attributes == other.attributes
    }
}

impl Eq for RecordFormat {}

impl Hash for RecordFormat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size.hash(state);
        self.alignment.hash(state);
        for attr in &self.attributes {
            attr.hash(state);
        }
    }
}

impl Ord for RecordFormat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.attributes
            .cmp(&other.attributes)
            .then(self.size.cmp(&other.size))
            .then(self.alignment.cmp(&other.alignment))
    }
}

impl PartialOrd for RecordFormat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `{}` renders one line, `{:#}` one attribute per line.
impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "RecordFormat (size {}, alignment {}) {{", self.size, self.alignment)?;
            for (location, attr) in self.attributes.iter().enumerate() {
                writeln!(f, "  {location}: {attr}")?;
            }
            f.write_str("}")
        } else {
            write!(f, "RecordFormat(size {}", self.size)?;
            for attr in &self.attributes {
                write!(f, ", {attr}")?;
            }
            f.write_str(")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(format: &RecordFormat) -> u64 {
        let mut h = DefaultHasher::new();
        format.hash(&mut h);
        h.finish()
    }

    #[test]
    fn append_accumulates_offsets() {
        let mut format = RecordFormat::new();
        format.append_vec3("position", 1, false).unwrap();
        format.append_vec3("normal", 1, false).unwrap();
        format.append_vec2("uv", 1, false).unwrap();

        let offsets: Vec<_> = format.iter().map(AttributeField::offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(format.size(), 32);
    }

    #[test]
    fn append_returns_stored_field() {
        let mut format = RecordFormat::new();
        format.append_float("a", 1, false).unwrap();
        let field = *format.append_mat4("model", 1, false).unwrap();
        assert_eq!(field.offset(), 4);
        assert_eq!(field.byte_size(), 64);
        assert_eq!(format.attribute_at(1).unwrap(), &field);
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let mut format = RecordFormat::new();
        format.append_vec3("position", 1, false).unwrap();
        let err = format.append_vec4("position", 1, false).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateAttribute("position".into()));
        assert_eq!(format.len(), 1);
        assert_eq!(format.size(), 12);
    }

    #[test]
    fn explicit_offset_leaves_size() {
        let mut format = RecordFormat::new();
        format.append_explicit("b", ScalarType::Float32, 2, 1, 1, false, 0, 8).unwrap();
        assert_eq!(format.size(), 0);
        format.set_size(16);
        assert_eq!(format.size(), 16);
        assert_eq!(format.get_or_empty("b").offset(), 8);
    }

    #[test]
    fn hash_is_order_sensitive() {
        let mut a = RecordFormat::new();
        a.append_float("x", 1, false).unwrap();
        a.append_int("y", 1).unwrap();

        let mut b = RecordFormat::new();
        b.append_int("y", 1).unwrap();
        b.append_float("x", 1, false).unwrap();

        assert_ne!(a, b);
        assert_ne!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&a.clone()));
    }
}

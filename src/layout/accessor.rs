//! Record Accessor
//!
//! [`RecordAccessor`] is a bounds-checked view over an externally owned byte
//! buffer holding `element_count` records of one [`RecordFormat`].
//!
//! # Ownership
//!
//! The accessor borrows the buffer for its whole lifetime and never allocates,
//! resizes or frees it. The format is copied on construction, so later
//! changes to the caller's format do not affect a bound accessor.
//!
//! # Thread Safety
//!
//! No internal synchronization; caller serializes writes. Reads take `&self`
//! and writes `&mut self`, so overlapping writers are rejected at compile time.
//!
//! # Leniency
//!
//! Reads fail on unknown names, bad locations and bad indices. Writes fail on
//! bad locations and bad indices, but a write to an unknown *name* is a no-op
//! so that writers of optional attributes can stay branchless.
//!
//! ```rust,ignore
//! let mut buffer = vec![0u8; format.size() * 2];
//! let mut acc = RecordAccessor::new(&mut buffer, &format);
//! acc.write_value(0, "position", &[1.0f32, 2.0, 3.0])?;
//! acc.write_value(0, "tangent", &[0.0f32; 4])?; // absent: ignored
//! let pos = acc.read_vec3(0, "position")?;
//! ```

use glam::{Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{LayoutError, Result};
use crate::layout::channel::AttributeChannel;
use crate::layout::format::RecordFormat;
use crate::layout::scalar::{Scalar, ScalarType};
use crate::utils::interner::AttributeName;

/// Result of resolving an [`AttributeKey`] against a bound format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeLookup {
    /// A location; may still be out of range.
    Location(usize),
    /// A name the bound format does not contain.
    Missing(String),
}

/// Identifies an attribute either by location or by name.
pub trait AttributeKey {
    fn locate(&self, locations: &FxHashMap<AttributeName, usize>) -> AttributeLookup;
}

impl AttributeKey for usize {
    fn locate(&self, _: &FxHashMap<AttributeName, usize>) -> AttributeLookup {
        AttributeLookup::Location(*self)
    }
}

impl AttributeKey for AttributeName {
    fn locate(&self, locations: &FxHashMap<AttributeName, usize>) -> AttributeLookup {
        locations
            .get(self)
            .map_or_else(|| AttributeLookup::Missing(self.to_string()), |&l| AttributeLookup::Location(l))
    }
}

impl AttributeKey for &str {
    fn locate(&self, locations: &FxHashMap<AttributeName, usize>) -> AttributeLookup {
        match AttributeName::lookup(self) {
            Some(name) => name.locate(locations),
            None => AttributeLookup::Missing((*self).to_string()),
        }
    }
}

impl AttributeKey for &String {
    fn locate(&self, locations: &FxHashMap<AttributeName, usize>) -> AttributeLookup {
        self.as_str().locate(locations)
    }
}

/// Bounds-checked typed view over an array of records.
#[derive(Debug)]
pub struct RecordAccessor<'a> {
    data: &'a mut [u8],
    format: RecordFormat,
    element_count: usize,
    locations: FxHashMap<AttributeName, usize>,
    channels: Vec<AttributeChannel>,
}

impl<'a> RecordAccessor<'a> {
    /// Binds `data` as an array of `format` records.
    ///
    /// `element_count` is `data.len() / format.size()`; trailing bytes that do
    /// not form a whole record are never reachable.
    pub fn new(data: &'a mut [u8], format: &RecordFormat) -> Self {
        let format = format.clone();
        let stride = format.size();
        let element_count = data.len().checked_div(stride).unwrap_or(0);

        let mut locations = FxHashMap::default();
        let mut channels = Vec::with_capacity(format.len());
        for (location, field) in format.iter().enumerate() {
            locations.insert(field.name(), location);
            channels.push(AttributeChannel::new(*field, stride));
        }

        log::trace!(
            "Bound {} bytes as {element_count} record(s) of {stride} bytes with {} attribute(s)",
            data.len(),
            channels.len()
        );

        Self {
            data,
            format,
            element_count,
            locations,
            channels,
        }
    }

    // ========================================================================
    // Raw Access
    // ========================================================================

    /// Copies `count` whole records starting at `index` into `target`.
    pub fn read_raw(&self, index: usize, target: &mut [u8], count: usize) -> Result<()> {
        let range = self.raw_range(index, count, target.len())?;
        target[..range.len()].copy_from_slice(&self.data[range]);
        Ok(())
    }

    /// Copies `count` whole records from `source` into the buffer at `index`.
    pub fn write_raw(&mut self, index: usize, source: &[u8], count: usize) -> Result<()> {
        let range = self.raw_range(index, count, source.len())?;
        let len = range.len();
        self.data[range].copy_from_slice(&source[..len]);
        Ok(())
    }

    fn raw_range(&self, index: usize, count: usize, available: usize) -> Result<std::ops::Range<usize>> {
        if self.channels.is_empty() {
            return Err(LayoutError::NoAttributes);
        }
        self.check_elements(index, count)?;

        let stride = self.format.size();
        let required = count * stride;
        if available < required {
            return Err(LayoutError::BufferTooSmall {
                required,
                actual: available,
            });
        }
        let start = index * stride;
        Ok(start..start + required)
    }

    // ========================================================================
    // Typed Reads
    // ========================================================================

    /// Reads `count` consecutive records of one attribute into `values`.
    ///
    /// `values` must hold at least `count * components` items.
    pub fn read_values<T: Scalar, K: AttributeKey>(
        &self,
        index: usize,
        key: K,
        values: &mut [T],
        count: usize,
    ) -> Result<()> {
        let location = match key.locate(&self.locations) {
            AttributeLookup::Location(location) => location,
            AttributeLookup::Missing(name) => return Err(LayoutError::UnknownAttribute(name)),
        };
        self.check_range(index, location, count)?;
        self.channels[location].read(&*self.data, index, values, count)
    }

    /// Reads the value of one attribute of a single record.
    pub fn read_value<T: Scalar, K: AttributeKey>(&self, index: usize, key: K) -> Result<SmallVec<[T; 16]>> {
        let location = self.resolve(key)?;
        let mut values = SmallVec::from_elem(T::zeroed(), self.channels[location].components());
        self.read_values(index, location, &mut values[..], 1)?;
        Ok(values)
    }

    /// Reads `count` consecutive records of one attribute into a new `Vec`.
    pub fn read_values_vec<T: Scalar, K: AttributeKey>(&self, index: usize, key: K, count: usize) -> Result<Vec<T>> {
        let location = self.resolve(key)?;
        self.check_elements(index, count)?;
        let mut values = vec![T::zeroed(); self.channels[location].components().saturating_mul(count)];
        self.read_values(index, location, &mut values[..], count)?;
        Ok(values)
    }

    // ========================================================================
    // Typed Writes
    // ========================================================================

    /// Writes `count` consecutive records of one attribute from `values`.
    ///
    /// An unknown name is ignored; an out-of-range location is an error.
    pub fn write_values<T: Scalar, K: AttributeKey>(
        &mut self,
        index: usize,
        key: K,
        values: &[T],
        count: usize,
    ) -> Result<()> {
        let location = match key.locate(&self.locations) {
            AttributeLookup::Location(location) => location,
            AttributeLookup::Missing(name) => {
                log::trace!("Ignoring write to unknown attribute '{name}'");
                return Ok(());
            }
        };
        self.check_range(index, location, count)?;
        self.channels[location].write(&mut *self.data, index, values, count)
    }

    /// Writes the value of one attribute of a single record.
    pub fn write_value<T: Scalar, K: AttributeKey>(&mut self, index: usize, key: K, value: &[T]) -> Result<()> {
        self.write_values(index, key, value, 1)
    }

    // ========================================================================
    // glam Helpers
    // ========================================================================

    pub fn read_vec2<K: AttributeKey>(&self, index: usize, key: K) -> Result<Vec2> {
        let v = self.read_float_vec::<K, 2>(index, key)?;
        Ok(Vec2::from_array(v))
    }

    pub fn read_vec3<K: AttributeKey>(&self, index: usize, key: K) -> Result<Vec3> {
        let v = self.read_float_vec::<K, 3>(index, key)?;
        Ok(Vec3::from_array(v))
    }

    pub fn read_vec4<K: AttributeKey>(&self, index: usize, key: K) -> Result<Vec4> {
        let v = self.read_float_vec::<K, 4>(index, key)?;
        Ok(Vec4::from_array(v))
    }

    pub fn write_vec2<K: AttributeKey>(&mut self, index: usize, key: K, value: Vec2) -> Result<()> {
        self.write_float_vec(index, key, &value.to_array())
    }

    pub fn write_vec3<K: AttributeKey>(&mut self, index: usize, key: K, value: Vec3) -> Result<()> {
        self.write_float_vec(index, key, &value.to_array())
    }

    pub fn write_vec4<K: AttributeKey>(&mut self, index: usize, key: K, value: Vec4) -> Result<()> {
        self.write_float_vec(index, key, &value.to_array())
    }

    fn read_float_vec<K: AttributeKey, const N: usize>(&self, index: usize, key: K) -> Result<[f32; N]> {
        let location = self.resolve(key)?;
        self.check_components(location, N)?;
        let mut out = [0.0f32; N];
        self.read_values(index, location, &mut out[..], 1)?;
        Ok(out)
    }

    fn write_float_vec<K: AttributeKey, const N: usize>(&mut self, index: usize, key: K, value: &[f32; N]) -> Result<()> {
        let location = match key.locate(&self.locations) {
            AttributeLookup::Location(location) => location,
            AttributeLookup::Missing(name) => {
                log::trace!("Ignoring write to unknown attribute '{name}'");
                return Ok(());
            }
        };
        if location < self.channels.len() {
            self.check_components(location, N)?;
        }
        self.write_values(index, location, &value[..], 1)
    }

    fn check_components(&self, location: usize, requested: usize) -> Result<()> {
        let channel = &self.channels[location];
        if channel.components() != requested {
            return Err(LayoutError::ShapeMismatch {
                attribute: channel.field().name().to_string(),
                components: channel.components(),
                requested,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Resolves `key` to a valid location, failing on unknown names and
    /// out-of-range locations.
    fn resolve<K: AttributeKey>(&self, key: K) -> Result<usize> {
        match key.locate(&self.locations) {
            AttributeLookup::Location(location) if location < self.channels.len() => Ok(location),
            AttributeLookup::Location(location) => Err(LayoutError::LocationOutOfRange {
                location,
                count: self.channels.len(),
            }),
            AttributeLookup::Missing(name) => Err(LayoutError::UnknownAttribute(name)),
        }
    }

    fn check_range(&self, index: usize, location: usize, count: usize) -> Result<()> {
        if location >= self.channels.len() {
            return Err(LayoutError::LocationOutOfRange {
                location,
                count: self.channels.len(),
            });
        }
        self.check_elements(index, count)
    }

    fn check_elements(&self, index: usize, count: usize) -> Result<()> {
        if index >= self.element_count || count > self.element_count - index {
            return Err(LayoutError::IndexOutOfRange {
                index,
                count,
                element_count: self.element_count,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The format snapshot taken at construction.
    #[inline]
    #[must_use]
    pub fn format(&self) -> &RecordFormat {
        &self.format
    }

    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Length of the bound buffer in bytes, including any trailing partial
    /// record.
    #[inline]
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn location_of(&self, name: &str) -> Option<usize> {
        match name.locate(&self.locations) {
            AttributeLookup::Location(location) => Some(location),
            AttributeLookup::Missing(_) => None,
        }
    }

    #[must_use]
    pub fn channel(&self, location: usize) -> Option<&AttributeChannel> {
        self.channels.get(location)
    }

    /// Declared storage type of the attribute at `location`.
    #[must_use]
    pub fn data_type(&self, location: usize) -> Option<ScalarType> {
        self.channels.get(location).map(|c| c.field().data_type())
    }
}

//! Error Types
//!
//! This module defines the error type used throughout the crate.
//!
//! # Overview
//!
//! [`LayoutError`] covers every failure mode of layout construction and
//! buffer access:
//! - Range failures (bad element index, bad attribute location, unknown name)
//! - Type mismatches between a requested Rust type and a stored encoding
//! - Direct field lookups past the attribute count
//! - Duplicate attribute names
//! - Offsets or sizes that do not fit in `usize`
//!
//! Every failing operation is detected before any memory is touched.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata::errors::{LayoutError, Result};
//!
//! fn first_position(acc: &RecordAccessor<'_>) -> Result<glam::Vec3> {
//!     acc.read_vec3(0, "position")
//! }
//! ```

use thiserror::Error;

use crate::layout::ScalarType;

/// The main error type for record layouts and record access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    // ========================================================================
    // Range Errors
    // ========================================================================
    /// Attribute location is not below the attribute count.
    #[error("Trying to access attribute at location {location} of overall {count} attributes")]
    LocationOutOfRange {
        /// The requested location
        location: usize,
        /// Number of attributes in the bound format
        count: usize,
    },

    /// Element range reaches past the last record.
    #[error("Trying to access {count} element(s) at index {index} of overall {element_count} elements")]
    IndexOutOfRange {
        /// First requested element
        index: usize,
        /// Number of requested elements
        count: usize,
        /// Number of records in the bound buffer
        element_count: usize,
    },

    /// No attribute with the given name exists in the bound format.
    #[error("There is no attribute named '{0}'")]
    UnknownAttribute(String),

    /// Whole-record access needs at least one declared attribute.
    #[error("Format has no attributes")]
    NoAttributes,

    // ========================================================================
    // Type Errors
    // ========================================================================
    /// The requested type cannot be produced from the stored encoding.
    #[error("Attribute '{attribute}' stores {stored} and cannot be accessed as {requested}")]
    TypeMismatch {
        /// Attribute name
        attribute: String,
        /// Declared storage type
        stored: ScalarType,
        /// Requested type
        requested: ScalarType,
    },

    /// The attribute has a different number of components than requested.
    #[error("Attribute '{attribute}' has {components} component(s), {requested} requested")]
    ShapeMismatch {
        /// Attribute name
        attribute: String,
        /// Components per record
        components: usize,
        /// Requested components
        requested: usize,
    },

    // ========================================================================
    // Format Errors
    // ========================================================================
    /// Direct field lookup by location past the attribute count.
    #[error("Attribute location {location} out of range (format has {count} attributes)")]
    OutOfRange {
        /// The requested location
        location: usize,
        /// Number of attributes in the format
        count: usize,
    },

    /// An attribute with the same name is already part of the format.
    #[error("Duplicate attribute name: {0}")]
    DuplicateAttribute(String),

    /// Offset or size arithmetic left the addressable range.
    #[error("Size overflow: {0} exceeds the addressable range")]
    SizeOverflow(String),

    /// A deserialized layout contradicts its own shape.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A caller-provided slice cannot hold the requested data.
    #[error("Buffer too small: {required} required, {actual} available")]
    BufferTooSmall {
        /// Required number of items
        required: usize,
        /// Provided number of items
        actual: usize,
    },
}

impl LayoutError {
    /// Whether this error belongs to the range family (index, location or name
    /// outside the bound format/buffer).
    #[must_use]
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Self::LocationOutOfRange { .. }
                | Self::IndexOutOfRange { .. }
                | Self::UnknownAttribute(_)
                | Self::NoAttributes
        )
    }
}

/// Alias for `Result<T, LayoutError>`.
pub type Result<T> = std::result::Result<T, LayoutError>;

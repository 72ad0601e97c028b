//! Self-describing binary record layouts.
//!
//! Build a [`RecordFormat`] from named, typed attributes, then bind a byte
//! buffer with a [`RecordAccessor`] for bounds-checked, type-converting access
//! to the records it holds (e.g. interleaved GPU vertex buffers).

pub mod errors;
pub mod layout;
pub mod utils;

pub use errors::{LayoutError, Result};
pub use layout::{
    AttributeChannel, AttributeField, AttributeKey, ChannelCodec, RecordAccessor, RecordFormat, Scalar, ScalarType,
    INTERNAL_NONE, PACKED_UNORM_10_10_10_2,
};
pub use utils::interner::{self, AttributeName};

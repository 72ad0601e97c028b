//! Record Layouts
//!
//! Describes the binary layout of structured records and provides typed
//! access to buffers holding arrays of them:
//! - [`ScalarType`] / [`Scalar`]: storage types and their Rust counterparts
//! - [`AttributeField`]: one named, typed attribute
//! - [`RecordFormat`]: ordered attributes plus record stride
//! - [`AttributeChannel`]: per-attribute codec
//! - [`RecordAccessor`]: bounds-checked view over a record buffer

pub mod accessor;
pub mod attribute;
pub mod channel;
pub mod format;
pub mod scalar;

pub use accessor::{AttributeKey, AttributeLookup, RecordAccessor};
pub use attribute::{AttributeField, INTERNAL_NONE, PACKED_UNORM_10_10_10_2};
pub use channel::{AttributeChannel, ChannelCodec};
pub use format::RecordFormat;
pub use scalar::{Scalar, ScalarType};

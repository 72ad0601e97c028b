//! Utility Module
//!
//! - [`interner`]: String interning for attribute names
//!
//! # String Interning
//!
//! Interned names ([`AttributeName`]) compare and hash in O(1).
//!
//! ```rust,ignore
//! use strata::utils::interner::AttributeName;
//!
//! let a = AttributeName::new("position");
//! let b = AttributeName::new("position");
//! assert_eq!(a, b); // O(1) comparison
//! ```

pub mod interner;

pub use interner::{AttributeName, Symbol};

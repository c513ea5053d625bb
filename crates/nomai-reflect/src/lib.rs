//! Nomai Reflect -- Runtime type descriptors and dynamic values for remote inspection.
//!
//! The remote world describes every reflected type with a [`TypeDescriptor`]
//! delivered at runtime; nothing about the schema is known at compile time.
//! This crate holds that description and the pure operations built on it:
//!
//! - [`registry`]: the closed set of structural type shapes and the
//!   [`TypeRegistry`] that maps type names to them.
//! - [`type_names`]: well-known type paths and name-based predicates
//!   (numeric, optional, string) plus short display names.
//! - [`defaults`]: builds a representative value for any registered type.
//! - [`address`]: first-class paths into a dynamic value with whole-subtree
//!   get/set.
//! - [`color`]: lossless conversion between the ten color encodings the
//!   remote color type can carry.
//!
//! Dynamic values are plain [`serde_json::Value`]s: primitives, sequences
//! (`Value::Array`) and keyed maps (`Value::Object`).
//!
//! # Quick Start
//!
//! ```
//! use nomai_reflect::prelude::*;
//! use serde_json::json;
//!
//! let registry: TypeRegistry = serde_json::from_value(json!([
//!     ["f32", { "kind": "opaque" }],
//!     ["glam::Vec2", {
//!         "kind": "struct",
//!         "fields": [{ "name": "x", "type": "f32" }, { "name": "y", "type": "f32" }]
//!     }],
//! ]))
//! .unwrap();
//!
//! assert_eq!(resolve_default(&registry, "glam::Vec2"), Some(json!({ "x": 1, "y": 1 })));
//! ```

#![deny(unsafe_code)]

pub mod address;
pub mod color;
pub mod defaults;
pub mod registry;
pub mod type_names;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when reading or writing a value by [`address::Address`].
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// A path step could not be taken because the value has the wrong shape.
    #[error("cannot step into {found} at '{address}' (expected {expected})")]
    TypeMismatch {
        /// The address of the value that could not be stepped into.
        address: String,
        /// The shape the step required.
        expected: &'static str,
        /// The shape that was actually found.
        found: &'static str,
    },

    /// An index step pointed past the end of a sequence.
    #[error("index {index} out of range at '{address}' (length {len})")]
    IndexOutOfRange {
        /// The address of the sequence.
        address: String,
        /// The requested index.
        index: usize,
        /// The current sequence length.
        len: usize,
    },
}

/// Errors produced by color space conversion.
#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    /// A color space name did not match any known encoding.
    #[error("unknown color space '{0}'")]
    UnknownSpace(String),

    /// A color value did not carry the channels of its declared encoding.
    #[error("malformed {space} color: {details}")]
    Malformed {
        /// The encoding the value claimed to be in.
        space: color::ColorSpace,
        /// What was wrong with the value.
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::address::{Address, PathSegment};
    pub use crate::color::ColorSpace;
    pub use crate::defaults::{resolve_default, DefaultResolver};
    pub use crate::registry::{NamedField, TypeDescriptor, TypeRegistry, TypeShape, Variant};
    pub use crate::{AddressError, ColorError};
}

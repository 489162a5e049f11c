#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// field error types.
pub mod error;

/// 2D scalar field container.
pub mod field;

/// utilities for interpolation on fields.
pub mod interpolation;

/// binary persistence of fields.
pub mod io;

pub use error::FieldError;
pub use field::{Field2, GridSize};

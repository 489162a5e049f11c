#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// point cloud assembly.
pub mod cloud;

/// cloud error types.
pub mod error;

/// modulation based validity masking.
pub mod mask;

/// binary PLY export.
pub mod ply;

pub use cloud::{assemble, ScanCloud};
pub use error::CloudError;
pub use mask::{mask_field, modulation_cutoff, modulation_mask};
pub use ply::{write_ply, PlyError};

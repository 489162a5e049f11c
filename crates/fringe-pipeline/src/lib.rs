#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// capture frame loading.
pub mod capture;

/// run configuration.
pub mod config;

/// pipeline error types.
pub mod error;

/// reconstruction driver.
pub mod reconstruct;

/// the temporal unwrapping collaborator boundary.
pub mod unwrap;

pub use config::{PatternOrientation, ReconstructionConfig, UnwrapStrategy};
pub use error::PipelineError;
pub use reconstruct::{Reconstructor, ReconstructionSummary};
pub use unwrap::{TemporalUnwrapper, UnwrapError, UnwrappedField, WrappedBand};

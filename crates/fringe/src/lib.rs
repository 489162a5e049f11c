#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use fringe_grid as grid;

#[doc(inline)]
pub use fringe_calib as calib;

#[doc(inline)]
pub use fringe_recon as recon;

#[doc(inline)]
pub use fringe_cloud as cloud;

#[doc(inline)]
pub use fringe_pipeline as pipeline;

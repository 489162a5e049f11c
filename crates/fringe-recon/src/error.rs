/// An error type for the reconstruction module.
#[derive(thiserror::Error, Debug)]
pub enum ReconError {
    /// Error when per-pixel inputs do not share the capture resolution.
    #[error("Field shapes do not match: {0}x{1} vs {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),

    /// Error propagated from the field container.
    #[error(transparent)]
    Field(#[from] fringe_grid::FieldError),
}

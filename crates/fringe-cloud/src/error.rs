/// An error type for the cloud module.
#[derive(thiserror::Error, Debug)]
pub enum CloudError {
    /// Error propagated from the field container.
    #[error(transparent)]
    Field(#[from] fringe_grid::FieldError),

    /// Error when fewer than two fringe levels are configured.
    #[error("At least two fringe levels are required, got {0}")]
    NotEnoughLevels(usize),

    /// Error when no phase-shift step counts are configured.
    #[error("Step counts must not be empty")]
    EmptySteps,

    /// Error while writing the point cloud file.
    #[error(transparent)]
    Ply(#[from] crate::ply::PlyError),
}

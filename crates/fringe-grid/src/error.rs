/// An error type for the field module.
#[derive(thiserror::Error, Debug)]
pub enum FieldError {
    /// Error when the data length does not match the grid size.
    #[error("Data length ({0}) does not match the grid size ({1})")]
    InvalidLength(usize, usize),

    /// Error when two fields are expected to share a shape.
    #[error("Field shapes do not match: {0}x{1} vs {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),

    /// Error when the file cannot be read or written.
    #[error("Failed to manipulate the file. {0}")]
    Io(#[from] std::io::Error),

    /// Error when encoding a field to its binary representation.
    #[error("Failed to encode field. {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Error when decoding a field from its binary representation.
    #[error("Failed to decode field. {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

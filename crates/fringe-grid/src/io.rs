use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FieldError;
use crate::field::Field2;

/// Write a field to a binary file, overwriting any existing file.
///
/// # Arguments
///
/// * `path` - The destination file path.
/// * `field` - The field to persist.
pub fn write_field<T>(path: impl AsRef<Path>, field: &Field2<T>) -> Result<(), FieldError>
where
    T: Serialize,
{
    let encoded = bincode::serde::encode_to_vec(field, bincode::config::standard())?;
    std::fs::write(path, encoded)?;
    Ok(())
}

/// Read a field from a binary file written by [`write_field`].
///
/// # Arguments
///
/// * `path` - The source file path.
pub fn read_field<T>(path: impl AsRef<Path>) -> Result<Field2<T>, FieldError>
where
    T: DeserializeOwned,
{
    let bytes = std::fs::read(path)?;
    let (field, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::GridSize;

    #[test]
    fn test_field_roundtrip() -> Result<(), FieldError> {
        let field = Field2::new(
            GridSize {
                width: 2,
                height: 2,
            },
            vec![1.5f64, -2.5, 0.0, 42.0],
        )?;

        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("field.bin");
        write_field(&path, &field)?;
        let loaded: Field2<f64> = read_field(&path)?;

        assert_eq!(loaded, field);
        Ok(())
    }

    #[test]
    fn test_mask_roundtrip() -> Result<(), FieldError> {
        let mask = Field2::new(
            GridSize {
                width: 3,
                height: 1,
            },
            vec![true, false, true],
        )?;

        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("mask.bin");
        write_field(&path, &mask)?;
        let loaded: Field2<bool> = read_field(&path)?;

        assert_eq!(loaded, mask);
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        let result: Result<Field2<f64>, _> = read_field("/nonexistent/field.bin");
        assert!(result.is_err());
    }
}

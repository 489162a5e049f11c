use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Grid size in pixels
///
/// A struct to represent the size of a pixel grid.
///
/// # Examples
///
/// ```
/// use fringe_grid::GridSize;
///
/// let size = GridSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(size.width, 10);
/// assert_eq!(size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    /// Width of the grid in pixels
    pub width: usize,
    /// Height of the grid in pixels
    pub height: usize,
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "GridSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for GridSize {
    fn from(size: [usize; 2]) -> Self {
        GridSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Represents a dense 2D field of per-pixel values.
///
/// The data is stored row-major with shape (H, W), one value per pixel.
/// A boolean field doubles as a validity mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field2<T> {
    size: GridSize,
    data: Vec<T>,
}

impl<T> Field2<T> {
    /// Create a new field from per-pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the grid in pixels.
    /// * `data` - The per-pixel values in row-major order.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match the grid size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use fringe_grid::{Field2, GridSize};
    ///
    /// let field = Field2::new(
    ///     GridSize {
    ///         width: 2,
    ///         height: 3,
    ///     },
    ///     vec![0.0f64; 6],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(field.width(), 2);
    /// assert_eq!(field.height(), 3);
    /// ```
    pub fn new(size: GridSize, data: Vec<T>) -> Result<Self, FieldError> {
        if data.len() != size.width * size.height {
            return Err(FieldError::InvalidLength(
                data.len(),
                size.width * size.height,
            ));
        }
        Ok(Self { size, data })
    }

    /// Create a new field filled with a single value.
    pub fn from_size_val(size: GridSize, val: T) -> Self
    where
        T: Clone,
    {
        Self {
            size,
            data: vec![val; size.width * size.height],
        }
    }

    /// Create a new field filled with zeros.
    pub fn zeros(size: GridSize) -> Self
    where
        T: Zero + Clone,
    {
        Self::from_size_val(size, T::zero())
    }

    /// Get the size of the field.
    #[inline]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Get the width of the field in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the field in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of pixels in the field.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the value at the given pixel position, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.size.height || col >= self.size.width {
            return None;
        }
        self.data.get(row * self.size.width + col)
    }

    /// Get the data as a flat row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the data as a mutable flat row-major slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over the rows of the field.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.size.width)
    }

    /// Consume the field and return the underlying data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply a function to each value, producing a new field of the same shape.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Field2<U> {
        Field2 {
            size: self.size,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Check that another field shares this field's shape.
    pub fn check_same_shape<U>(&self, other: &Field2<U>) -> Result<(), FieldError> {
        if self.size.width != other.size.width || self.size.height != other.size.height {
            return Err(FieldError::ShapeMismatch(
                self.size.width,
                self.size.height,
                other.size.width,
                other.size.height,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_new() -> Result<(), FieldError> {
        let field = Field2::new(
            GridSize {
                width: 3,
                height: 2,
            },
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )?;
        assert_eq!(field.len(), 6);
        assert_eq!(field.get(0, 2), Some(&3.0));
        assert_eq!(field.get(1, 0), Some(&4.0));
        assert_eq!(field.get(2, 0), None);
        Ok(())
    }

    #[test]
    fn test_field_new_invalid_length() {
        let result = Field2::new(
            GridSize {
                width: 3,
                height: 2,
            },
            vec![1.0; 5],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_field_rows() -> Result<(), FieldError> {
        let field = Field2::new(
            GridSize {
                width: 2,
                height: 2,
            },
            vec![1u8, 2, 3, 4],
        )?;
        let rows: Vec<&[u8]> = field.rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3u8, 4][..]]);
        Ok(())
    }

    #[test]
    fn test_field_map() {
        let field = Field2::from_size_val(
            GridSize {
                width: 2,
                height: 2,
            },
            2.0f64,
        );
        let doubled = field.map(|v| v * 2.0);
        assert_eq!(doubled.as_slice(), &[4.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_field_shape_check() {
        let a = Field2::<f64>::zeros(GridSize {
            width: 4,
            height: 3,
        });
        let b = Field2::<bool>::from_size_val(
            GridSize {
                width: 4,
                height: 2,
            },
            false,
        );
        assert!(a.check_same_shape(&b).is_err());
    }
}

use std::path::{Path, PathBuf};

use fringe_grid::{Field2, GridSize};

use crate::error::PipelineError;

/// Supported capture image extensions, probed in order.
const CAPTURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "tiff"];

/// File stem of the full-color reference image.
const REFERENCE_STEM: &str = "white";

fn find_capture(dir: &Path, stem: &str) -> Result<PathBuf, PipelineError> {
    for extension in CAPTURE_EXTENSIONS {
        let path = dir.join(format!("{stem}.{extension}"));
        if path.exists() {
            return Ok(path);
        }
    }
    Err(PipelineError::FileDoesNotExist(
        dir.join(format!("{stem}.{}", CAPTURE_EXTENSIONS[0])),
    ))
}

fn load_gray(path: &Path) -> Result<Field2<f64>, PipelineError> {
    let img = image::open(path)?.to_luma8();
    let size = GridSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    let data = img.as_raw().iter().map(|v| *v as f64).collect();
    Ok(Field2::new(size, data)?)
}

/// Load the sequentially named grayscale capture frames of one run.
///
/// Frames are expected as `capt_0`, `capt_1`, ... in the capture directory;
/// a missing frame is a fatal error before any computation starts.
///
/// # Arguments
///
/// * `dir` - The capture directory.
/// * `count` - The number of frames the selected strategy consumes.
pub fn load_frames(dir: &Path, count: usize) -> Result<Vec<Field2<f64>>, PipelineError> {
    (0..count)
        .map(|index| {
            let path = find_capture(dir, &format!("capt_{index}"))?;
            load_gray(&path)
        })
        .collect()
}

/// Load the full-color reference image of one run.
///
/// The reference (white) image provides the texture of the reconstructed
/// points; channels are returned as raw intensities.
///
/// # Arguments
///
/// * `dir` - The capture directory.
pub fn load_reference(dir: &Path) -> Result<Field2<[f32; 3]>, PipelineError> {
    let path = find_capture(dir, REFERENCE_STEM)?;
    let img = image::open(&path)?.to_rgb8();
    let size = GridSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    let data = img
        .as_raw()
        .chunks_exact(3)
        .map(|rgb| [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32])
        .collect();
    Ok(Field2::new(size, data)?)
}

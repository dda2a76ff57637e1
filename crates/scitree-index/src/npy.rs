//! Loading the embedding matrix from a NumPy `.npy` file.
//!
//! The file is read into memory and viewed in place, so the header's claimed
//! shape is checked against the bytes actually present before anything is
//! allocated for it.

use std::fs;
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use ndarray_npy::ViewNpyExt;

use scitree_core::LoadError;

/// Read a 2-D little-endian `f32` array.
///
/// # Errors
///
/// Returns [`LoadError::MissingArtifact`] if the file does not exist and
/// [`LoadError::Malformed`] for a bad header, an unsupported dtype, a rank
/// other than two, or data that does not match the declared shape.
pub fn read_f32_matrix(path: &Path) -> Result<Array2<f32>, LoadError> {
    let malformed = |reason: String| LoadError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::MissingArtifact {
            path: path.to_path_buf(),
        },
        _ => malformed(e.to_string()),
    })?;

    // np.save pads the header so the data starts 16-byte aligned.
    let view = ArrayView2::<f32>::view_npy(&bytes).map_err(|e| malformed(e.to_string()))?;
    Ok(view.as_standard_layout().into_owned())
}

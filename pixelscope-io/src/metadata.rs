//! File-level information shown alongside an image.

use std::fmt;
use std::path::{Path, PathBuf};

use pixelscope_core::{DtypeClass, Image, ImageShape};
use serde::Serialize;

use crate::loader::extension;
use crate::Result;

/// Basic facts about a loaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub path: PathBuf,
    /// Upper-cased suffix, e.g. `TIFF`.
    pub format: String,
    /// Size on disk in bytes.
    pub file_size: u64,
    pub shape: ImageShape,
    pub dtype: DtypeClass,
}

impl ImageMetadata {
    /// Gather metadata for `image`, which was loaded from `path`.
    ///
    /// # Errors
    /// Returns an error if the file can no longer be stat'ed.
    pub fn from_image(path: &Path, image: &Image) -> Result<Self> {
        let file_size = std::fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            format: extension(path).unwrap_or_default().to_ascii_uppercase(),
            file_size,
            shape: image.shape(),
            dtype: image.dtype(),
        })
    }
}

impl fmt::Display for ImageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path:     {}", self.path.display())?;
        writeln!(f, "format:   {}", self.format)?;
        writeln!(f, "size:     {} bytes", self.file_size)?;
        writeln!(
            f,
            "shape:    {} x {} x {}",
            self.shape.height, self.shape.width, self.shape.channels
        )?;
        write!(f, "dtype:    {}", self.dtype)
    }
}

//! pixelscope-io: Image loading and state persistence for PixelScope.
//!
//! This crate provides a prioritised loader registry over the `tiff` and
//! `image` decoders (files are memory-mapped via memmap2), basic file
//! metadata, and JSON persistence of display state.
//!

mod error;
mod loader;
mod mapped;
mod metadata;
mod raster;
mod state;
mod tiff_loader;

pub use error::{LoadError, Result};
pub use loader::{is_image_file, load, ImageLoader, LoaderRegistry, SUPPORTED_EXTENSIONS};
pub use mapped::MappedFile;
pub use metadata::ImageMetadata;
pub use raster::RasterLoader;
pub use state::{StateFile, STATE_VERSION};
pub use tiff_loader::TiffLoader;

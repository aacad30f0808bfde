//! Prioritised image loader registry.

use std::path::Path;

use log::{debug, warn};
use pixelscope_core::Image;

use crate::raster::RasterLoader;
use crate::tiff_loader::TiffLoader;
use crate::{LoadError, Result};

/// File suffixes the default loaders understand.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Lower-cased file suffix, if any.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether `path` has a suffix the default loaders accept.
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// One way of turning a file into an [`Image`].
pub trait ImageLoader: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Cheap check (usually the suffix) deciding whether to try this loader.
    fn can_load(&self, path: &Path) -> bool;

    /// Decode `path`. `Ok(None)` passes the file on to the next loader.
    ///
    /// # Errors
    /// Decoder or I/O failures.
    fn try_load(&self, path: &Path) -> Result<Option<Image>>;
}

/// Loaders tried in descending priority; ties keep registration order.
#[derive(Default)]
pub struct LoaderRegistry {
    entries: Vec<(i32, Box<dyn ImageLoader>)>,
}

impl LoaderRegistry {
    /// Registry with no loaders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TIFF loader ahead of the generic raster loader.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(10, Box::new(TiffLoader));
        registry.register(0, Box::new(RasterLoader));
        registry
    }

    /// Add a loader. Higher priorities are tried first.
    pub fn register(&mut self, priority: i32, loader: Box<dyn ImageLoader>) {
        debug!("registering loader '{}' at priority {priority}", loader.name());
        let index = self
            .entries
            .iter()
            .position(|(p, _)| *p < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, (priority, loader));
    }

    /// Loader names in the order they are tried.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, loader)| loader.name())
    }

    /// Load `path` with the first loader that accepts it.
    ///
    /// # Errors
    /// The last loader's error if every applicable loader failed, or
    /// [`LoadError::Unsupported`] if none applied.
    pub fn load(&self, path: &Path) -> Result<Image> {
        let mut last_error = None;
        for (_, loader) in &self.entries {
            if !loader.can_load(path) {
                continue;
            }
            match loader.try_load(path) {
                Ok(Some(image)) => {
                    debug!(
                        "'{}' loaded {} as {} {}",
                        loader.name(),
                        path.display(),
                        image.shape(),
                        image.dtype()
                    );
                    return Ok(image.with_source(path.display().to_string()));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("loader '{}' failed on {}: {e}", loader.name(), path.display());
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| LoadError::Unsupported(path.to_path_buf())))
    }
}

/// Load with the default registry.
///
/// # Errors
/// See [`LoaderRegistry::load`].
pub fn load(path: &Path) -> Result<Image> {
    LoaderRegistry::with_defaults().load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelscope_core::{DtypeClass, ImageShape, PixelBuffer};
    use std::path::PathBuf;

    struct Fixed {
        name: &'static str,
        value: Option<f64>,
    }

    impl ImageLoader for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn can_load(&self, path: &Path) -> bool {
            extension(path).as_deref() == Some("raw")
        }

        fn try_load(&self, _path: &Path) -> Result<Option<Image>> {
            Ok(self.value.map(|v| {
                Image::new(
                    PixelBuffer::filled(ImageShape::new(1, 1, 1), v, DtypeClass::Float).unwrap(),
                )
            }))
        }
    }

    #[test]
    fn test_priority_order() {
        let mut registry = LoaderRegistry::new();
        registry.register(1, Box::new(Fixed { name: "low", value: Some(1.0) }));
        registry.register(5, Box::new(Fixed { name: "high", value: Some(5.0) }));
        registry.register(5, Box::new(Fixed { name: "high-late", value: Some(6.0) }));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["high", "high-late", "low"]);

        let image = registry.load(Path::new("scan.raw")).unwrap();
        assert_eq!(image.buffer.get(0, 0, 0), Some(5.0));
        assert_eq!(image.source.as_deref(), Some("scan.raw"));
    }

    #[test]
    fn test_none_falls_through() {
        let mut registry = LoaderRegistry::new();
        registry.register(9, Box::new(Fixed { name: "decline", value: None }));
        registry.register(0, Box::new(Fixed { name: "accept", value: Some(2.0) }));
        let image = registry.load(Path::new("a.RAW")).unwrap();
        assert_eq!(image.buffer.get(0, 0, 0), Some(2.0));
    }

    #[test]
    fn test_unsupported() {
        let registry = LoaderRegistry::with_defaults();
        let err = registry.load(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(p) if p == PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/photo.JPG")));
        assert!(is_image_file(Path::new("scan.tiff")));
        assert!(!is_image_file(Path::new("data.npy")));
        assert!(!is_image_file(Path::new("README")));
    }
}

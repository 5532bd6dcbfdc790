use crate::error::{IconifyError, Result};
use crate::imaging;
use crate::resize_mode::ResizeMode;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};

/// Where the master icon comes from
#[derive(Debug, Clone)]
pub enum IconSource {
    Path(PathBuf),
    Buffer(Vec<u8>),
}

impl From<PathBuf> for IconSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for IconSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for IconSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for IconSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

/// Whether a master icon must have equal width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SquarePolicy {
    #[default]
    Require,
    /// Accept any aspect ratio; each output is still resized to its declared square size.
    Allow,
}

/// The decoded source image all generated icons are resized from.
#[derive(Debug, Clone)]
pub struct MasterIcon {
    image: DynamicImage,
    source: IconSource,
}

impl MasterIcon {
    /// Decode the master icon, enforcing `policy` on its dimensions.
    pub fn load(source: IconSource, policy: SquarePolicy) -> Result<Self> {
        let image = match &source {
            IconSource::Path(path) => imaging::decode_path(path)?,
            IconSource::Buffer(bytes) => imaging::decode_bytes(bytes)?,
        };

        let (width, height) = image.dimensions();
        if policy == SquarePolicy::Require && width != height {
            return Err(IconifyError::NotSquare { width, height });
        }

        tracing::debug!(width, height, "loaded master icon");

        Ok(Self { image, source })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn source(&self) -> &IconSource {
        &self.source
    }

    /// Resize a copy of the master to `size`x`size`, bound to `output_path`.
    ///
    /// The output format comes from the extension of `output_path`.
    pub fn resize_square(
        &self,
        size: u32,
        output_path: impl Into<PathBuf>,
        mode: ResizeMode,
    ) -> Result<GeneratedIcon> {
        self.resize(size, size, output_path, mode)
    }

    /// Resize a copy of the master to `width`x`height`, bound to `output_path`.
    ///
    /// Fails before resizing when the output format is unknown or cannot hold
    /// an image of that size.
    pub fn resize(
        &self,
        width: u32,
        height: u32,
        output_path: impl Into<PathBuf>,
        mode: ResizeMode,
    ) -> Result<GeneratedIcon> {
        let output_path = output_path.into();
        let format = imaging::check_target(&output_path, width, height)?;

        Ok(self.resize_as(width, height, output_path, format, mode))
    }

    /// Resize with an already validated output format; cannot fail.
    pub(crate) fn resize_as(
        &self,
        width: u32,
        height: u32,
        output_path: PathBuf,
        format: ImageFormat,
        mode: ResizeMode,
    ) -> GeneratedIcon {
        tracing::debug!(
            path = %output_path.display(),
            width,
            height,
            mode = %mode,
            "resizing master icon"
        );

        GeneratedIcon {
            output_path,
            format,
            image: imaging::resize(&self.image, width, height, mode),
        }
    }
}

/// A resized icon bound to the path it should be written to.
#[derive(Debug, Clone)]
pub struct GeneratedIcon {
    output_path: PathBuf,
    format: ImageFormat,
    image: DynamicImage,
}

impl GeneratedIcon {
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        imaging::mime_type(self.format)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Encode the icon in the format implied by its output path.
    pub fn encode(&self) -> Result<Vec<u8>> {
        imaging::encode(&self.image, self.format).map_err(|source| IconifyError::IconEncode {
            path: self.output_path.clone(),
            source,
        })
    }

    /// Encode and write the icon, creating parent directories as needed.
    pub fn write(&self) -> Result<()> {
        let bytes = self.encode()?;
        self.write_encoded(&bytes)
    }

    /// Write already encoded bytes to the output path.
    pub(crate) fn write_encoded(&self, bytes: &[u8]) -> Result<()> {
        let write_err = |source| IconifyError::IconWrite {
            path: self.output_path.clone(),
            source,
        };

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        std::fs::write(&self.output_path, bytes).map_err(write_err)?;

        Ok(())
    }
}

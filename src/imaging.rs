//! Thin layer over the `image` crate (and `resvg` for vector masters).
//!
//! Nothing here mutates an image in place: resizing always yields a new
//! buffer, so one decoded master can feed any number of resizes.

use crate::error::{IconifyError, Result};
use crate::resize_mode::ResizeMode;
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Minimum length of the longer side when rasterizing an SVG master
const SVG_RASTER_SIZE: f32 = 1024.0;

/// Largest width or height an icon may be resized to
pub const MAX_DIMENSION: u32 = 4096;

/// Decode an in-memory raster or SVG image.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    if image::guess_format(bytes).is_err() && looks_like_svg(bytes) {
        return rasterize_svg(bytes);
    }

    image::load_from_memory(bytes).map_err(|e| IconifyError::IconDecode {
        source: Box::new(e),
    })
}

/// Read and decode an image file.
pub fn decode_path(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).map_err(|source| IconifyError::IconRead {
        path: path.to_path_buf(),
        source,
    })?;

    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("svg") || ext.eq_ignore_ascii_case("svgz"))
        .unwrap_or(false);

    if is_svg {
        rasterize_svg(&bytes)
    } else {
        decode_bytes(&bytes)
    }
}

/// Resample `image` to exactly `width`x`height`, leaving the input untouched.
pub fn resize(image: &DynamicImage, width: u32, height: u32, mode: ResizeMode) -> DynamicImage {
    image.resize_exact(width, height, mode.filter())
}

/// Output format implied by a path's extension, if it can be encoded.
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    ImageFormat::from_path(path)
        .ok()
        .filter(|format| format.writing_enabled())
}

/// Largest side the encoder for `format` accepts, when it is below [`MAX_DIMENSION`].
pub fn encoder_max_dimension(format: ImageFormat) -> Option<u32> {
    match format {
        ImageFormat::Ico => Some(256),
        _ => None,
    }
}

/// Validate a resize target before any pixels are touched.
///
/// Returns the output format for `path` once the dimensions are known to be
/// allocatable and accepted by that format's encoder.
pub fn check_target(path: &Path, width: u32, height: u32) -> Result<ImageFormat> {
    let largest = width.max(height);
    if largest > MAX_DIMENSION {
        return Err(IconifyError::SizeTooLarge {
            size: largest,
            max: MAX_DIMENSION,
        });
    }

    let format = format_for_path(path).ok_or_else(|| IconifyError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    if let Some(max) = encoder_max_dimension(format) {
        if largest > max {
            return Err(IconifyError::SizeNotEncodable {
                path: path.to_path_buf(),
                size: largest,
                max,
            });
        }
    }

    Ok(format)
}

pub fn mime_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}

/// Encode `image` as `format`, converting the pixel layout where the encoder needs it.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> std::result::Result<Vec<u8>, ImageError> {
    let prepared = match format {
        // No alpha channel in these encoders
        ImageFormat::Jpeg | ImageFormat::Pnm => DynamicImage::ImageRgb8(image.to_rgb8()),
        ImageFormat::Farbfeld => DynamicImage::ImageRgba16(image.to_rgba16()),
        ImageFormat::Hdr => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        ImageFormat::OpenExr => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    };

    let mut buffer = Vec::new();
    prepared.write_to(&mut Cursor::new(&mut buffer), format)?;
    Ok(buffer)
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(4096)];
    String::from_utf8_lossy(head).contains("<svg")
}

/// Render an SVG document to RGBA, keeping its aspect ratio.
fn rasterize_svg(bytes: &[u8]) -> Result<DynamicImage> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default()).map_err(|e| {
        IconifyError::IconDecode {
            source: Box::new(e),
        }
    })?;

    let size = tree.size();
    let longer = size.width().max(size.height());
    let scale = (SVG_RASTER_SIZE / longer).max(1.0);
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        IconifyError::IconDecode {
            source: format!("failed to allocate {width}x{height} pixmap for SVG").into(),
        }
    })?;

    let transform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| IconifyError::IconDecode {
        source: "rasterized SVG has an unexpected buffer length".into(),
    })?;
    Ok(DynamicImage::ImageRgba8(image))
}

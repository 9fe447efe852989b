//! # Image export
//!
//! Writes a rendered RGBA8 buffer as PNG or JPEG, picked from the file extension.

use super::atomic::{self, SaveError};
use super::common::CodecError;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("file name is missing an extension")]
    MissingExtension,
    #[error("file extension {:?} is not handled", .0)]
    UnsupportedExtension(String),
    #[error("buffer of {} bytes is not a {}x{} RGBA image", .len, .width, .height)]
    BufferSize { len: usize, width: u32, height: u32 },
    #[error("encoding failed: {}", .0)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ExportFormat {
    /// Lossless, keeps alpha.
    Png,
    /// Alpha is dropped.
    Jpeg,
}
impl ExportFormat {
    /// Pick the format from the last extension of `path`, ignoring case.
    /// # Errors
    /// The path has no extension, or one that isn't an image format we write.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .ok_or(ExportError::MissingExtension)?
            .to_string_lossy()
            .to_lowercase();
        match extension.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(ExportError::UnsupportedExtension(extension)),
        }
    }
}
impl From<ExportFormat> for image::ImageFormat {
    fn from(value: ExportFormat) -> Self {
        match value {
            ExportFormat::Png => Self::Png,
            ExportFormat::Jpeg => Self::Jpeg,
        }
    }
}

/// Encode a tightly packed, row-major RGBA8 buffer.
/// # Errors
/// The buffer doesn't match the dimensions, or the encoder failed.
pub fn encode_image(
    format: ExportFormat,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ExportError> {
    let len = rgba.len();
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4));
    let image = image::RgbaImage::from_raw(width, height, rgba)
        .filter(|_| expected == Some(len))
        .ok_or(ExportError::BufferSize { len, width, height })?;
    let mut out = std::io::Cursor::new(Vec::new());
    let image_format = image::ImageFormat::from(format);
    match format {
        ExportFormat::Png => image.write_to(&mut out, image_format)?,
        ExportFormat::Jpeg => image::DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .write_to(&mut out, image_format)?,
    }
    Ok(out.into_inner())
}

/// Export a rendered canvas to `path`, replacing it atomically.
///
/// The extension is checked before anything touches the disk. Returns the bytes written.
/// # Errors
/// See [`ExportError`]. On error, the file at `path` is untouched.
pub fn export_image(
    path: &Path,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<u64, ExportError> {
    let format = ExportFormat::from_path(path)?;
    let encoded = encode_image(format, rgba, width, height)?;
    let bytes_written = atomic::write_atomic(path, |w| {
        w.write_bytes(&encoded)?;
        Ok::<_, CodecError>(false)
    })?;
    log::info!(
        "exported {width}x{height} {format:?} to {} ({})",
        path.display(),
        human_bytes::human_bytes(bytes_written as f64)
    );
    Ok(bytes_written)
}

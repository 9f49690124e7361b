//! Image transcoding for formats browsers cannot display
//!
//! HEIC/HEIF decoding is pluggable through [`HeicDecoder`]. The `heic` cargo
//! feature provides a libheif-backed implementation; without it no decoder is
//! installed and HEIC files are served as-is.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// JPEG quality used when re-encoding HEIC images
pub const JPEG_QUALITY: u8 = 90;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Image(#[from] image::ImageError),

    #[error("HEIC decode failed: {0}")]
    Decode(String),
}

/// Decodes HEIC/HEIF files into raster images
pub trait HeicDecoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError>;
}

/// Decoder compiled into this build, if any
pub fn default_decoder() -> Option<Arc<dyn HeicDecoder>> {
    #[cfg(feature = "heic")]
    {
        Some(Arc::new(libheif::LibheifDecoder))
    }
    #[cfg(not(feature = "heic"))]
    {
        None
    }
}

/// Decode `path` with `decoder` and re-encode as RGB JPEG
pub fn transcode_to_jpeg(decoder: &dyn HeicDecoder, path: &Path) -> Result<Vec<u8>, CodecError> {
    let image = decoder.decode(path)?;
    encode_jpeg(&image)
}

pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(out)
}

#[cfg(feature = "heic")]
mod libheif {
    use super::{CodecError, HeicDecoder};
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
    use std::path::Path;

    /// HEIC/HEIF decoder backed by the system libheif
    pub struct LibheifDecoder;

    fn decode_error(err: libheif_rs::HeifError) -> CodecError {
        CodecError::Decode(err.to_string())
    }

    impl HeicDecoder for LibheifDecoder {
        fn name(&self) -> &'static str {
            "libheif"
        }

        fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
            let path_str = path
                .to_str()
                .ok_or_else(|| CodecError::Decode(format!("non UTF-8 path {}", path.display())))?;

            let ctx = HeifContext::read_from_file(path_str).map_err(decode_error)?;
            let handle = ctx.primary_image_handle().map_err(decode_error)?;
            let image = LibHeif::new()
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
                .map_err(decode_error)?;

            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| CodecError::Decode("no interleaved RGB plane".to_string()))?;

            let width = plane.width;
            let height = plane.height;
            let row_bytes = width as usize * 3;
            let mut pixels = Vec::with_capacity(row_bytes * height as usize);
            for row in plane.data.chunks(plane.stride).take(height as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }

            RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| CodecError::Decode("truncated pixel data".to_string()))
        }
    }
}

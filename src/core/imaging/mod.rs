//! # Imaging Module
//!
//! Decode collaborator for the derived-image cache.
//!
//! ## Decode paths
//! - **JPEG**: zune-jpeg, falling back to the image crate
//! - **RAW**: largest embedded JPEG preview (memory-mapped scan)
//! - **Everything else**: image crate
//!
//! EXIF orientation is applied after decoding, so every image handed to the
//! cache is upright.

mod fast_decode;
mod fast_resize;
mod orientation;
mod raw_preview;

pub use fast_decode::{FastDecoder, SourceFormat};
pub use fast_resize::{fit_dimensions, FastResizer};
pub use orientation::{apply_orientation, read_orientation};
pub use raw_preview::embedded_jpegs;

use crate::error::DecodeError;
use image::DynamicImage;
use std::path::Path;

/// Turns a source file into upright pixels.
///
/// Implement this trait to plug in a different decoder (a real RAW
/// developer, or a counting mock in tests).
pub trait ImageDecoder: Send + Sync {
    fn decode_with_orientation(&self, path: &Path) -> Result<DynamicImage, DecodeError>;
}

/// Default decoder built on [`FastDecoder`] and the EXIF orientation tag
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl ImageDecoder for StandardDecoder {
    fn decode_with_orientation(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let image = FastDecoder::decode(path)?;
        let orientation = read_orientation(path);
        if orientation != 1 {
            tracing::debug!("Applying orientation {} to {}", orientation, path.display());
        }
        Ok(apply_orientation(image, orientation))
    }
}

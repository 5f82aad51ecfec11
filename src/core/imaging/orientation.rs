//! EXIF orientation handling.
//!
//! Cameras store pixels in sensor order and record how the body was held in
//! the Orientation tag (1-8). Renditions are written upright, so the tag is
//! applied once at decode time and never copied into the artifact.

use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Orientation tag of a file, 1 (upright) when absent or unreadable
pub fn read_orientation(path: &Path) -> u16 {
    let Ok(file) = File::open(path) else {
        return 1;
    };

    let mut bufreader = BufReader::new(&file);
    let Ok(exif) = Reader::new().read_from_container(&mut bufreader) else {
        return 1;
    };

    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(|value| u16::try_from(value).ok())
        .filter(|value| (1..=8).contains(value))
        .unwrap_or(1)
}

/// Rotate/flip decoded pixels so they display upright
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn landscape() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(40, 10, Rgb([1, 2, 3])))
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        for orientation in [5, 6, 7, 8] {
            let rotated = apply_orientation(landscape(), orientation);
            assert_eq!((rotated.width(), rotated.height()), (10, 40));
        }
    }

    #[test]
    fn flips_and_half_turn_keep_dimensions() {
        for orientation in [1, 2, 3, 4] {
            let image = apply_orientation(landscape(), orientation);
            assert_eq!((image.width(), image.height()), (40, 10));
        }
    }

    #[test]
    fn rotate90_moves_top_left_pixel_to_top_right() {
        let mut buffer = ImageBuffer::from_pixel(4, 2, Rgb([0u8, 0, 0]));
        buffer.put_pixel(0, 0, Rgb([255, 0, 0]));

        let rotated = apply_orientation(DynamicImage::ImageRgb8(buffer), 6).to_rgb8();

        assert_eq!(rotated.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn unknown_orientation_is_ignored() {
        let image = apply_orientation(landscape(), 42);
        assert_eq!((image.width(), image.height()), (40, 10));
    }

    #[test]
    fn file_without_exif_is_upright() {
        assert_eq!(read_orientation(Path::new("/nonexistent/a.jpg")), 1);
    }
}

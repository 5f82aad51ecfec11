//! Embedded preview extraction from RAW files.
//!
//! Nearly every RAW container carries one or more full JPEG renditions
//! written by the camera. Finding the largest one is far cheaper than
//! demosaicing and is good enough for culling.
//!
//! Large files are memory-mapped so scanning a 60 MB RAW does not copy it
//! into the heap first.

use crate::error::DecodeError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Embedded JPEGs smaller than this are EXIF thumbnails, not previews
const MIN_PREVIEW_BYTES: usize = 8 * 1024;

/// Give up after this many start markers
const MAX_CANDIDATES: usize = 16;

const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];
const JPEG_EOI: &[u8] = &[0xFF, 0xD9];

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

/// Read a file, mapping it when it is large
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, DecodeError> {
    let io_error = |e: std::io::Error| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DecodeError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DecodeError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    };

    let metadata = std::fs::metadata(path).map_err(io_error)?;
    if metadata.len() < MMAP_THRESHOLD {
        return std::fs::read(path).map(FileBytes::Vec).map_err(io_error);
    }

    let file = File::open(path).map_err(io_error)?;
    // SAFETY: read-only mapping; the handle outlives the map. The file may be
    // truncated underneath us, which is the accepted single-process risk.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    Ok(FileBytes::Mmap(mmap))
}

/// Embedded JPEG streams, largest first.
pub fn embedded_jpegs(data: &[u8]) -> Vec<&[u8]> {
    let mut found = Vec::new();
    let mut pos = 0;

    while found.len() < MAX_CANDIDATES {
        let Some(start) = find(&data[pos..], JPEG_SOI).map(|offset| pos + offset) else {
            break;
        };
        let Some(end) = find(&data[start..], JPEG_EOI).map(|offset| start + offset + JPEG_EOI.len())
        else {
            break;
        };

        if end - start >= MIN_PREVIEW_BYTES {
            found.push(&data[start..end]);
        }
        pos = end;
    }

    found.sort_by_key(|jpeg| std::cmp::Reverse(jpeg.len()));
    found
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

//! Classifies folder entries as RAW, processed image, or something else.

use std::path::Path;

/// RAW formats from the common camera vendors
const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "dng", "raf", "orf", "rw2", "pef",
    "srw", "x3f", "3fr", "iiq", "rwl",
];

/// Processed formats, in the order a sibling lookup prefers them
const PROCESSED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "heic", "heif", "webp",
];

/// What a folder entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Raw,
    Processed,
    Other,
}

/// Extension-based photo classifier
pub struct PhotoFilter {
    raw_extensions: Vec<String>,
    processed_extensions: Vec<String>,
    include_hidden: bool,
}

impl PhotoFilter {
    /// Filter with the default RAW and processed extensions
    pub fn new() -> Self {
        Self {
            raw_extensions: RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            processed_extensions: PROCESSED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether the file should be ignored entirely (not even reported)
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.include_hidden {
            return false;
        }
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Classify a file by extension (case-insensitive)
    pub fn classify(&self, path: &Path) -> FileKind {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileKind::Other;
        };
        let ext = ext.to_lowercase();

        if self.raw_extensions.contains(&ext) {
            FileKind::Raw
        } else if self.processed_extensions.contains(&ext) {
            FileKind::Processed
        } else {
            FileKind::Other
        }
    }
}

impl Default for PhotoFilter {
    fn default() -> Self {
        Self::new()
    }
}

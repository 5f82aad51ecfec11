//! On-disk layout of the application data directory.
//!
//! ```text
//! <root>/settings.json
//! <root>/cache/<sanitized-folder>.selections.json
//! <root>/thumbnails/<sanitized-folder>/{thumb|preview}_<address>.jpg
//! ```
//!
//! `<root>` is `~/.fotofilter` unless a caller supplies another one.

use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Longest file-system name produced by [`sanitize_folder_name`]
pub const MAX_SAFE_NAME_LEN: usize = 100;

const SELECTIONS_SUFFIX: &str = ".selections.json";

/// Resolved locations of everything the library persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Use an explicit data directory (tests, `--root`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.fotofilter`, or `None` when the home directory is unknown
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".fotofilter")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one selection document per project
    pub fn selections_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Directory holding one artifact directory per project
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join("thumbnails")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Artifact directory of a project
    pub fn project_cache_dir(&self, project: &Path) -> PathBuf {
        self.thumbnails_dir().join(sanitize_folder_name(project))
    }

    /// Selection document of a project
    pub fn selections_file(&self, folder: &Path) -> PathBuf {
        self.selections_dir()
            .join(format!("{}{}", sanitize_folder_name(folder), SELECTIONS_SUFFIX))
    }

    /// Whether a directory entry looks like a selection document
    pub fn is_selections_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SELECTIONS_SUFFIX))
    }
}

/// Absolute form of a path without resolving symlinks.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Turn an absolute folder path into a single safe file name.
///
/// Separators, colons and spaces become `_`. Names longer than
/// [`MAX_SAFE_NAME_LEN`] are cut and suffixed with a hash of the full
/// path, so two long folders sharing a prefix still get distinct names.
pub fn sanitize_folder_name(path: &Path) -> String {
    let full = absolute_path(path).to_string_lossy().into_owned();
    let safe: String = full
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | ' ' => '_',
            other => other,
        })
        .collect();

    if safe.chars().count() <= MAX_SAFE_NAME_LEN {
        return safe;
    }

    let suffix = format!("-{:016x}", xxh3_64(full.as_bytes()));
    let keep = MAX_SAFE_NAME_LEN - suffix.len();
    let mut truncated: String = safe.chars().take(keep).collect();
    truncated.push_str(&suffix);
    truncated
}

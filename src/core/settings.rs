//! User-tunable settings.
//!
//! Loaded from `<root>/settings.json`. Missing keys take their defaults and
//! an unreadable file falls back to defaults entirely.

use super::paths::AppPaths;
use crate::error::FotoFilterError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Tunable constants of the cache and the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Longest side of a thumbnail in pixels
    pub thumbnail_size: u32,
    /// Longest side of a preview in pixels
    pub preview_size: u32,
    /// JPEG quality of generated artifacts (1-100)
    pub jpeg_quality: u8,
    /// Worker threads for rendering (0 = one per core)
    pub workers: usize,
    /// Thumbnails preloaded on each side of the selected photo
    pub preload_window: usize,
    /// Previews preloaded on each side of the selected photo
    pub preview_radius: usize,
    /// How long the export/delete summary stays up before resetting
    pub completion_delay_ms: u64,
    /// Selection documents untouched for longer than this are dropped
    pub selection_max_age_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thumbnail_size: 200,
            preview_size: 1200,
            jpeg_quality: 85,
            workers: 0,
            preload_window: 20,
            preview_radius: 3,
            completion_delay_ms: 1500,
            selection_max_age_days: 30,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults on any problem
    pub fn load(paths: &AppPaths) -> Self {
        let path = paths.settings_file();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(settings) => Self::sanitized(settings),
            Err(e) => {
                tracing::debug!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON, replacing the old file atomically
    pub fn save(&self, paths: &AppPaths) -> Result<(), FotoFilterError> {
        let config = |e: std::io::Error| FotoFilterError::Config(e.to_string());
        let path = paths.settings_file();
        let dir = path
            .parent()
            .ok_or_else(|| FotoFilterError::Config(format!("No parent for {}", path.display())))?;
        fs::create_dir_all(dir).map_err(config)?;

        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| FotoFilterError::Config(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(config)?;
        tmp.write_all(&content).map_err(config)?;
        tmp.persist(&path).map_err(|e| config(e.error))?;
        Ok(())
    }

    /// Settings with unusable values replaced.
    ///
    /// Zero rendition sizes take their defaults and JPEG quality is clamped
    /// to 1..=100.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            thumbnail_size: match self.thumbnail_size {
                0 => defaults.thumbnail_size,
                size => size,
            },
            preview_size: match self.preview_size {
                0 => defaults.preview_size,
                size => size,
            },
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            ..self
        }
    }

    /// Resolved worker budget
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }
}

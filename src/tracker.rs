//! Conversion tracking for incremental batch runs.
//!
//! Stores hashes of input and output files in a .stencil/ directory so a
//! batch run can skip documents whose conversion is already up to date.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const TRACKER_DIR: &str = ".stencil";
const TRACKER_FILE: &str = "conversions.json";

/// Tracks a single document conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTrack {
    /// Hash of the source document
    pub input_hash: String,
    /// Hash of the converted template
    pub output_hash: String,
    /// Timestamp of last conversion
    pub timestamp: String,
}

/// Per-directory conversion cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversionTracker {
    /// Maps: document file name -> FileTrack
    tracks: HashMap<String, FileTrack>,
    #[serde(skip)]
    root: PathBuf,
}

impl ConversionTracker {
    /// Load the tracker stored under `root`, or create a new one
    pub fn load(root: &Path) -> Result<Self> {
        let tracker_path = Self::tracker_path(root);

        let mut tracker = if tracker_path.exists() {
            let content =
                fs::read_to_string(&tracker_path).context("Failed to read conversion tracker")?;
            serde_json::from_str(&content).context("Failed to parse conversion tracker")?
        } else {
            ConversionTracker::default()
        };
        tracker.root = root.to_path_buf();
        Ok(tracker)
    }

    /// Save the tracker under its root directory
    pub fn save(&self) -> Result<()> {
        let tracker_dir = self.root.join(TRACKER_DIR);
        fs::create_dir_all(&tracker_dir).context("Failed to create .stencil directory")?;

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize conversion tracker")?;
        fs::write(Self::tracker_path(&self.root), content)
            .context("Failed to write conversion tracker")?;

        Ok(())
    }

    fn tracker_path(root: &Path) -> PathBuf {
        root.join(TRACKER_DIR).join(TRACKER_FILE)
    }

    /// Check if a document needs to be converted again
    ///
    /// Returns true if:
    /// - The output file doesn't exist
    /// - There's no previous track record
    /// - The source document has changed since the last run
    pub fn needs_conversion(
        &self,
        name: &str,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<bool> {
        if !output_path.exists() {
            return Ok(true);
        }

        let Some(track) = self.tracks.get(name) else {
            return Ok(true);
        };

        let current_input_hash = Self::hash_file(input_path)?;
        Ok(current_input_hash != track.input_hash)
    }

    /// Record a completed conversion
    pub fn record(&mut self, name: &str, input_path: &Path, output_path: &Path) -> Result<()> {
        let input_hash = Self::hash_file(input_path)?;
        // Output may be missing when the run was dry; an empty hash forces a
        // real conversion next time.
        let output_hash = if output_path.exists() {
            Self::hash_file(output_path)?
        } else {
            String::new()
        };
        let timestamp = chrono::Utc::now().to_rfc3339();

        self.tracks.insert(
            name.to_string(),
            FileTrack {
                input_hash,
                output_hash,
                timestamp,
            },
        );

        Ok(())
    }

    /// Compute SHA256 hash of a file
    fn hash_file(path: &Path) -> Result<String> {
        let content =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

        let mut hasher = Sha256::new();
        hasher.update(&content);
        let result = hasher.finalize();

        Ok(hex::encode(result))
    }

    /// Get a summary of tracked conversions
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Conversion Tracker Summary:".to_string());

        let mut names: Vec<&String> = self.tracks.keys().collect();
        names.sort();
        for name in names {
            let track = &self.tracks[name];
            lines.push(format!("  {} (converted: {})", name, track.timestamp));
        }

        if self.tracks.is_empty() {
            lines.push("  No tracked conversions".to_string());
        }

        lines.join("\n")
    }

    /// Clear all cached conversions. Returns number of entries removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.tracks.len();
        self.tracks.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stencil_tracker_{}_{}", std::process::id(), suffix));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_hash_file() {
        let root = temp_root("hash");
        let test_file = root.join("doc.txt");

        fs::write(&test_file, "hello world").unwrap();

        let hash1 = ConversionTracker::hash_file(&test_file).unwrap();
        let hash2 = ConversionTracker::hash_file(&test_file).unwrap();

        assert_eq!(hash1, hash2); // Same content should give same hash

        fs::write(&test_file, "different").unwrap();
        let hash3 = ConversionTracker::hash_file(&test_file).unwrap();

        assert_ne!(hash1, hash3); // Different content should give different hash

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_needs_conversion_transitions() {
        let root = temp_root("needs");
        let input = root.join("lease.txt");
        let output = root.join("lease.converted.txt");
        fs::write(&input, "Pay ____ monthly").unwrap();

        let mut tracker = ConversionTracker::load(&root).unwrap();

        // No output file yet
        assert!(tracker.needs_conversion("lease.txt", &input, &output).unwrap());

        fs::write(&output, "Pay {{ field_1 }} monthly").unwrap();

        // Output exists but nothing recorded
        assert!(tracker.needs_conversion("lease.txt", &input, &output).unwrap());

        tracker.record("lease.txt", &input, &output).unwrap();
        assert!(!tracker.needs_conversion("lease.txt", &input, &output).unwrap());

        // Touching the source invalidates the record
        fs::write(&input, "Pay ____ monthly to [PAYEE]").unwrap();
        assert!(tracker.needs_conversion("lease.txt", &input, &output).unwrap());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_save_and_reload() {
        let root = temp_root("reload");
        let input = root.join("notice.txt");
        let output = root.join("notice.converted.txt");
        fs::write(&input, "source").unwrap();
        fs::write(&output, "converted").unwrap();

        let mut tracker = ConversionTracker::load(&root).unwrap();
        tracker.record("notice.txt", &input, &output).unwrap();
        tracker.save().unwrap();

        let reloaded = ConversionTracker::load(&root).unwrap();
        assert!(reloaded.tracks.contains_key("notice.txt"));
        assert!(!reloaded.needs_conversion("notice.txt", &input, &output).unwrap());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let root = temp_root("clear");
        let input = root.join("a.txt");
        fs::write(&input, "a").unwrap();

        let mut tracker = ConversionTracker::load(&root).unwrap();
        tracker.record("a.txt", &input, &root.join("a.converted.txt")).unwrap();
        assert_eq!(tracker.clear(), 1);
        assert!(tracker.needs_conversion("a.txt", &input, &input).unwrap());

        fs::remove_dir_all(&root).ok();
    }
}

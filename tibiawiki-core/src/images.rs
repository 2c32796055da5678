//! Local image cache keyed by wiki upload timestamp.
//!
//! Each folder under `images/` carries a `cache_info.json` manifest mapping
//! stored file name to the upload timestamp it was fetched at. A file is
//! only re-downloaded when the wiki reports a different timestamp. The
//! manifest is read once when the folder is opened and written once by
//! [`ImageCache::save`] at the end of the folder's stage.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_NAME: &str = "cache_info.json";

/// The on-disk manifest: stored file name to the RFC 3339 upload timestamp
/// it was fetched at.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct Manifest {
    entries: HashMap<String, String>,
}

pub struct ImageCache {
    folder: PathBuf,
    manifest: Manifest,
    dirty: bool,
}

impl ImageCache {
    pub fn open(root: &Path, folder: &str) -> Result<Self> {
        let folder = root.join(folder);
        fs::create_dir_all(&folder)?;
        let manifest_path = folder.join(MANIFEST_NAME);
        let manifest = if manifest_path.exists() {
            let raw = fs::read_to_string(&manifest_path)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    "Discarding unreadable manifest {}: {}",
                    manifest_path.display(),
                    e
                );
                Manifest::default()
            })
        } else {
            Manifest::default()
        };
        Ok(ImageCache {
            folder,
            manifest,
            dirty: false,
        })
    }

    /// True when the cached copy is absent or was fetched at a different
    /// upload timestamp.
    pub fn needs_fetch(&self, file_name: &str, timestamp: &DateTime<Utc>) -> bool {
        match self.manifest.entries.get(file_name) {
            Some(cached) => cached != &timestamp.to_rfc3339() || !self.path_for(file_name).exists(),
            None => true,
        }
    }

    pub fn load(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(file_name);
        if path.exists() {
            Ok(Some(fs::read(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn store(&mut self, file_name: &str, timestamp: &DateTime<Utc>, bytes: &[u8]) -> Result<()> {
        fs::write(self.path_for(file_name), bytes)?;
        self.manifest
            .entries
            .insert(file_name.to_string(), timestamp.to_rfc3339());
        self.dirty = true;
        Ok(())
    }

    /// Write the manifest back if anything changed.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let path = self.folder.join(MANIFEST_NAME);
        fs::write(&path, serde_json::to_string_pretty(&self.manifest)?)?;
        self.dirty = false;
        Ok(())
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        // Slashes in wiki file names would escape the folder.
        self.folder.join(file_name.replace(['/', '\\'], "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fresh_cache_fetches_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::open(dir.path(), "creature").unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(cache.needs_fetch("Dragon.gif", &ts));
    }

    #[test]
    fn stored_file_is_reused_until_timestamp_moves() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        {
            let mut cache = ImageCache::open(dir.path(), "creature").unwrap();
            cache.store("Dragon.gif", &ts, b"gifbytes").unwrap();
            cache.save().unwrap();
        }
        // Reopen: the manifest round-trips through disk.
        let cache = ImageCache::open(dir.path(), "creature").unwrap();
        assert!(!cache.needs_fetch("Dragon.gif", &ts));
        assert!(cache.needs_fetch("Dragon.gif", &later));
        assert_eq!(cache.load("Dragon.gif").unwrap().unwrap(), b"gifbytes");
    }

    #[test]
    fn manifest_file_is_a_plain_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut cache = ImageCache::open(dir.path(), "map").unwrap();
        cache.store("Map floor 7.png", &ts, b"png").unwrap();
        cache.save().unwrap();

        let raw = fs::read_to_string(dir.path().join("map").join(MANIFEST_NAME)).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["Map floor 7.png"], ts.to_rfc3339());
    }

    #[test]
    fn manifest_entry_without_file_forces_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut cache = ImageCache::open(dir.path(), "item").unwrap();
        cache.store("Sword.gif", &ts, b"x").unwrap();
        cache.save().unwrap();
        fs::remove_file(dir.path().join("item").join("Sword.gif")).unwrap();
        let cache = ImageCache::open(dir.path(), "item").unwrap();
        assert!(cache.needs_fetch("Sword.gif", &ts));
    }
}

//! JSON file backing the geocode cache.
//!
//! Format: `{"Chicago": [41.8781, -87.6298], ...}`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use freight_tracker_core::Coordinates;

use super::GeocodeError;

#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the mapping. A missing file is an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Io` or `GeocodeError::Parse`.
    pub async fn load(&self) -> Result<BTreeMap<String, Coordinates>, GeocodeError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents atomically (write to a sibling, then rename).
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Io` or `GeocodeError::Parse`.
    pub async fn save(&self, entries: &BTreeMap<String, Coordinates>) -> Result<(), GeocodeError> {
        let json = serde_json::to_vec_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("freight-cachefile-{}-{}", std::process::id(), rand::random::<u32>()))
            .join(name)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let file = CacheFile::new(temp_path("missing.json"));
        assert!(file.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = temp_path("geocodeCache.json");
        let file = CacheFile::new(path.clone());

        let mut entries = BTreeMap::new();
        entries.insert("Chicago".to_string(), Coordinates::new(41.8781, -87.6298));
        entries.insert("Denver".to_string(), Coordinates::new(39.7392, -104.9903));
        file.save(&entries).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(raw["Chicago"], serde_json::json!([41.8781, -87.6298]));

        assert_eq!(file.load().await.unwrap(), entries);
        assert!(!path.with_extension("json.tmp").exists());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = temp_path("broken.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"[1, 2").await.unwrap();

        let file = CacheFile::new(path.clone());
        assert!(matches!(file.load().await, Err(GeocodeError::Parse(_))));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}

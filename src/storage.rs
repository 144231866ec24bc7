//! Flat JSON file persistence for the questionnaire stats and scoreboard.
//!
//! Each file holds one whole document. Writes go to a sibling temp file
//! first and are renamed into place so a crash never leaves half a file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _doc: PhantomData<T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _doc: PhantomData }
    }

    /// Read the document. A missing file is an empty document.
    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like [`load`](Self::load) but never fails; problems are logged.
    pub fn load_or_default(&self) -> T {
        match self.load() {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to load, starting empty");
                T::default()
            }
        }
    }

    pub fn save(&self, doc: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Save, logging instead of failing. Request handlers use this.
    pub fn save_logged(&self, doc: &T) {
        if let Err(e) = self.save(doc) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Doc = BTreeMap<u32, u64>;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Doc> = JsonFile::new(dir.path().join("none.json"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Doc> = JsonFile::new(dir.path().join("nested/stats.json"));
        let mut doc = Doc::new();
        doc.insert(3, 9);
        file.save(&doc).unwrap();
        assert_eq!(file.load().unwrap(), doc);
        assert!(!dir.path().join("nested/stats.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let file: JsonFile<Doc> = JsonFile::new(&path);
        assert!(file.load().is_err());
        assert!(file.load_or_default().is_empty());
    }
}

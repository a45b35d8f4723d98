//! Atomic single-document storage.
//!
//! Each gateway document (the conversation ledger, the durable state
//! record) lives in its own file and is replaced wholesale on every save:
//! serialize to a temporary sibling, fsync, rename. A torn write can
//! never leave a half-document behind.

use elysian_core::error::{ElysianError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn read_if_present(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content))
}

/// A handle to one JSON document on disk.
pub struct JsonDocument<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the document; `None` when the file is
    /// missing or empty.
    pub fn load(&self) -> Result<Option<T>> {
        match read_if_present(&self.path)? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    /// Serializes and saves the document atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(data)?;
        write_atomic(&self.path, content.as_bytes())
    }
}

/// A handle to one TOML document on disk.
pub struct TomlDocument<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> TomlDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the document; `None` when the file is
    /// missing or empty.
    pub fn load(&self) -> Result<Option<T>> {
        match read_if_present(&self.path)? {
            Some(content) => Ok(Some(toml::from_str(&content)?)),
            None => Ok(None),
        }
    }

    /// Serializes and saves the document atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let content = toml::to_string_pretty(data).map_err(ElysianError::from)?;
        write_atomic(&self.path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_json_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Sample> = JsonDocument::new(dir.path().join("missing.json"));
        assert!(doc.load().unwrap().is_none());
    }

    #[test]
    fn test_json_save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let doc = JsonDocument::new(dir.path().join("nested/dir/sample.json"));
        let sample = Sample {
            name: "gateway".to_string(),
            count: 7,
        };

        doc.save(&sample).unwrap();
        assert_eq!(doc.load().unwrap(), Some(sample));
    }

    #[test]
    fn test_json_save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let doc = JsonDocument::new(dir.path().join("sample.json"));

        doc.save(&Sample {
            name: "first".to_string(),
            count: 1,
        })
        .unwrap();
        doc.save(&Sample {
            name: "second".to_string(),
            count: 2,
        })
        .unwrap();

        assert_eq!(doc.load().unwrap().unwrap().name, "second");
    }

    #[test]
    fn test_json_empty_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "  \n").unwrap();

        let doc: JsonDocument<Sample> = JsonDocument::new(path);
        assert!(doc.load().unwrap().is_none());
    }

    #[test]
    fn test_json_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{not json").unwrap();

        let doc: JsonDocument<Sample> = JsonDocument::new(path);
        assert!(doc.load().unwrap_err().is_serialization());
    }

    #[test]
    fn test_toml_save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let doc = TomlDocument::new(dir.path().join("sample.toml"));
        let sample = Sample {
            name: "gateway".to_string(),
            count: 3,
        };

        doc.save(&sample).unwrap();
        assert_eq!(doc.load().unwrap(), Some(sample));
    }
}

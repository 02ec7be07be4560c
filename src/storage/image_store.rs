// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem-backed blob store for cover and chapter images.
//!
//! Keys have the form `{folder}/{filename}`. Folders are a closed set and
//! filenames are restricted to a safe character set, so a key can never
//! escape the uploads directory.

use std::fmt;
use std::io;
use std::path::PathBuf;

use tokio::fs;

use super::StoragePaths;

/// Maximum filename length accepted by the store.
pub const MAX_FILENAME_LEN: usize = 255;

/// Error type for image store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("image not found: {0}")]
    NotFound(String),

    #[error("unknown image folder: {0}")]
    UnknownFolder(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("health check data mismatch")]
    IntegrityViolation,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Top-level image folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFolder {
    Covers,
    Chapters,
}

impl ImageFolder {
    pub const ALL: [ImageFolder; 2] = [ImageFolder::Covers, ImageFolder::Chapters];

    pub fn parse(raw: &str) -> StorageResult<Self> {
        match raw {
            "covers" => Ok(Self::Covers),
            "chapters" => Ok(Self::Chapters),
            other => Err(StorageError::UnknownFolder(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Covers => "covers",
            Self::Chapters => "chapters",
        }
    }
}

fn validate_filename(raw: &str) -> StorageResult<()> {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_FILENAME_LEN
        && !raw.starts_with('.')
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidFilename(raw.to_string()))
    }
}

/// A validated image key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    folder: ImageFolder,
    filename: String,
}

impl ImageKey {
    pub fn new(folder: &str, filename: &str) -> StorageResult<Self> {
        let folder = ImageFolder::parse(folder)?;
        validate_filename(filename)?;
        Ok(Self {
            folder,
            filename: filename.to_string(),
        })
    }

    /// Parse a `{folder}/{filename}` key.
    pub fn parse(key: &str) -> StorageResult<Self> {
        let (folder, filename) = key
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidFilename(key.to_string()))?;
        Self::new(folder, filename)
    }

    pub fn folder(&self) -> ImageFolder {
        self.folder
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// MIME type derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            Some("avif") => "image/avif",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder.as_str(), self.filename)
    }
}

/// Image blob store rooted at `<data>/uploads`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    paths: StoragePaths,
}

impl ImageStore {
    /// Does not touch the filesystem. Call `init()` before use.
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    fn path_of(&self, key: &ImageKey) -> PathBuf {
        self.paths.image_file(key.folder.as_str(), &key.filename)
    }

    /// Create the folder structure. Safe to call multiple times.
    pub async fn init(&self) -> StorageResult<()> {
        for folder in ImageFolder::ALL {
            fs::create_dir_all(self.paths.image_folder(folder.as_str())).await?;
        }
        Ok(())
    }

    /// Write-read-delete probe under the uploads directory.
    pub async fn health_check(&self) -> StorageResult<()> {
        let probe = self.paths.uploads_dir().join(".health_check");
        let data = b"health_check_data";

        fs::write(&probe, data).await?;
        let read_back = fs::read(&probe).await?;
        fs::remove_file(&probe).await?;

        if read_back != data {
            return Err(StorageError::IntegrityViolation);
        }
        Ok(())
    }

    /// Store an image, replacing any previous content. Returns the key.
    ///
    /// Writes to a hidden temp file and renames it into place, so readers see
    /// either the old or the new content.
    pub async fn put(&self, key: &ImageKey, bytes: &[u8]) -> StorageResult<String> {
        let folder = self.paths.image_folder(key.folder.as_str());
        fs::create_dir_all(&folder).await?;

        let final_path = self.path_of(key);
        let tmp_path = folder.join(format!(".{}.{}.tmp", key.filename, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp_path, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        Ok(key.to_string())
    }

    /// Read a whole image into memory.
    pub async fn get(&self, key: &ImageKey) -> StorageResult<Vec<u8>> {
        match fs::read(self.path_of(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open an image for streaming. Returns the file and its length.
    pub async fn open(&self, key: &ImageKey) -> StorageResult<(fs::File, u64)> {
        let file = match fs::File::open(self.path_of(key)).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Delete an image. Returns `false` if it did not exist.
    pub async fn delete(&self, key: &ImageKey) -> StorageResult<bool> {
        match fs::remove_file(self.path_of(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Sorted keys of all images in a folder. A missing folder is empty.
    pub async fn list(&self, folder: ImageFolder) -> StorageResult<Vec<String>> {
        let dir = self.paths.image_folder(folder.as_str());
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skips temp files and anything not written through `put`
            if validate_filename(name).is_ok() {
                keys.push(format!("{}/{}", folder.as_str(), name));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (ImageStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(StoragePaths::new(temp.path()));
        store.init().await.unwrap();
        (store, temp)
    }

    fn key(raw: &str) -> ImageKey {
        ImageKey::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn init_creates_folders() {
        let (store, temp) = test_store().await;
        assert!(temp.path().join("uploads/covers").is_dir());
        assert!(temp.path().join("uploads/chapters").is_dir());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn put_get_delete() {
        let (store, _temp) = test_store().await;
        let k = key("covers/one-piece.png");

        assert_eq!(store.put(&k, b"png-bytes").await.unwrap(), "covers/one-piece.png");
        assert_eq!(store.get(&k).await.unwrap(), b"png-bytes");

        store.put(&k, b"replaced").await.unwrap();
        assert_eq!(store.get(&k).await.unwrap(), b"replaced");

        assert!(store.delete(&k).await.unwrap());
        assert!(!store.delete(&k).await.unwrap());
        assert!(matches!(store.get(&k).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn open_reports_length() {
        let (store, _temp) = test_store().await;
        let k = key("chapters/p01.webp");
        store.put(&k, &[0u8; 42]).await.unwrap();

        let (_file, len) = store.open(&k).await.unwrap();
        assert_eq!(len, 42);
        assert!(matches!(
            store.open(&key("chapters/missing.webp")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_and_skips_temp_files() {
        let (store, temp) = test_store().await;
        store.put(&key("chapters/b.png"), b"b").await.unwrap();
        store.put(&key("chapters/a.png"), b"a").await.unwrap();
        std::fs::write(temp.path().join("uploads/chapters/.c.png.tmp"), b"c").unwrap();

        assert_eq!(
            store.list(ImageFolder::Chapters).await.unwrap(),
            vec!["chapters/a.png", "chapters/b.png"]
        );
        assert!(store.list(ImageFolder::Covers).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_of_missing_folder_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(StoragePaths::new(temp.path()));
        assert!(store.list(ImageFolder::Covers).await.unwrap().is_empty());
    }

    #[test]
    fn keys_are_validated() {
        assert!(matches!(
            ImageKey::parse("avatars/x.png"),
            Err(StorageError::UnknownFolder(_))
        ));
        for bad in ["covers/", "covers/.hidden", "covers/a b.png", "covers/../x", "nofolder"] {
            assert!(ImageKey::parse(bad).is_err(), "{bad} should be rejected");
        }
        assert!(ImageKey::new("covers", &"a".repeat(MAX_FILENAME_LEN + 1)).is_err());
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(key("covers/a.PNG").content_type(), "image/png");
        assert_eq!(key("covers/a.jpeg").content_type(), "image/jpeg");
        assert_eq!(key("covers/a.bin").content_type(), "application/octet-stream");
    }
}

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed JSON in '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A value persisted as a single JSON document.
///
/// Every `store` rewrites the whole document: the new content goes to a
/// sibling `.tmp` file which is then renamed over the target, so readers of
/// the file see either the previous document or the new one.
pub struct JsonFileStorage<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonFileStorage<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<T, StorageError> {
        let file = File::open(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    pub fn store(&self, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec(value).map_err(|source| StorageError::Encode {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.tmp_path();
        self.write_file(&tmp_path, &data)
            .and_then(|()| fs::rename(&tmp_path, &self.path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp_path);
                StorageError::Write {
                    path: self.path.clone(),
                    source,
                }
            })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(data)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

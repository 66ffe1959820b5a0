use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::prelude::SurveyResult;
use crate::survey::store::SurveyStore;

/// The JSON file backing one survey, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct SurveyFile {
    path: PathBuf,
}

impl SurveyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<title>.json` in the current directory.
    pub fn for_title(title: &str) -> Self {
        Self::new(format!("{title}.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous contents, or `None` if the survey has never been saved.
    pub fn read(&self) -> SurveyResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the file atomically: readers see the old or the new
    /// contents, never a partial write.
    pub fn write(&self, bytes: &[u8]) -> SurveyResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    pub fn load_store(&self) -> SurveyResult<SurveyStore> {
        Ok(match self.read()? {
            Some(bytes) => SurveyStore::from_points(SurveyStore::load(&bytes)?),
            None => SurveyStore::new(),
        })
    }

    /// Serialize first so an encoding failure leaves the file untouched.
    pub fn save_store(&self, store: &SurveyStore) -> SurveyResult<()> {
        let bytes = store.serialize()?;
        self.write(&bytes)
    }
}

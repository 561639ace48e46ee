use crate::error::{Error, Result};
use crate::job::FetchJob;
use crate::naming::{generate_filename, NameFormat};
use std::path::{Path, PathBuf};

/// Writes fetched EAD documents as `<dir>/<derived name>.xml`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
    format: NameFormat,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>, format: NameFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Creates the output directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, job: &FetchJob) -> PathBuf {
        let name = generate_filename(&job.record, &self.format);
        self.dir.join(format!("{}.xml", name))
    }

    pub async fn write(&self, job: &FetchJob, body: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(job);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| Error::DocumentWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Local profile persistence in a small JSON file
use log::debug;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Profile;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("Profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Profile file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProfileStore { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the stored fields. A missing file is an empty profile.
    pub async fn load(&self) -> Result<Profile, ProfileStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No profile at {}", self.path.display());
                Ok(Profile::default())
            }
            Err(source) => Err(ProfileStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replace the stored fields.
    pub async fn save(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        let contents = serde_json::to_string_pretty(profile)?;
        let staging = self.path.with_extension("tmp");
        let io_err = |source: std::io::Error| ProfileStoreError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&staging, contents).await.map_err(io_err)?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(io_err)?;
        Ok(())
    }

    /// Whether name, email and serial are all on file.
    pub async fn is_registered(&self) -> Result<bool, ProfileStoreError> {
        Ok(self.load().await?.is_complete())
    }
}

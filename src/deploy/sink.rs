//! Delivery of generated artifacts.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::SinkError;

use super::bundle::{Artifact, CONFIG_DIR};

/// Receives generated artifacts for packaging or download.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store one artifact. Implementations may overwrite an earlier artifact
    /// with the same name.
    async fn put(&self, artifact: &Artifact) -> Result<(), SinkError>;

    /// Store every artifact in order, stopping at the first failure.
    async fn put_all(&self, artifacts: &[Artifact]) -> Result<(), SinkError> {
        for artifact in artifacts {
            self.put(artifact).await?;
        }
        Ok(())
    }
}

/// Writes artifacts under `<root>/config/`.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// Full path an artifact is written to. Only plain file names are accepted.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, SinkError> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.config_dir().join(file_name)),
            _ => Err(SinkError::InvalidFileName(file_name.to_string())),
        }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn put(&self, artifact: &Artifact) -> Result<(), SinkError> {
        let path = self.resolve(&artifact.file_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &artifact.contents).await?;
        tracing::info!(path = %path.display(), bytes = artifact.contents.len(), "artifact written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sink() -> (DirectorySink, TempDir) {
        let dir = TempDir::new().unwrap();
        (DirectorySink::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn writes_under_config_dir() {
        let (sink, dir) = sink();
        sink.put(&Artifact::new("pool-config.toml", "x = 1\n"))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("config/pool-config.toml")).unwrap();
        assert_eq!(written, "x = 1\n");
    }

    #[tokio::test]
    async fn overwrites_existing_artifact() {
        let (sink, dir) = sink();
        sink.put_all(&[
            Artifact::new("a.toml", "first"),
            Artifact::new("a.toml", "second"),
        ])
        .await
        .unwrap();
        let written = std::fs::read_to_string(dir.path().join("config/a.toml")).unwrap();
        assert_eq!(written, "second");
    }

    #[tokio::test]
    async fn rejects_paths_outside_config_dir() {
        let (sink, _dir) = sink();
        for name in ["../escape.toml", "/etc/passwd", "nested/file.toml", ""] {
            let err = sink.put(&Artifact::new(name, "x")).await.unwrap_err();
            assert!(matches!(err, SinkError::InvalidFileName(_)), "{name}");
        }
    }
}

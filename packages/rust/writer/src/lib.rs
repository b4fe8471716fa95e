//! Filesystem persistence for generated personas.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use personakit_shared::{PersistenceSink, PersonaKitError, Result, SubjectId};

/// Writes each persona to `<output_dir>/<subject>_persona.txt`,
/// overwriting any earlier file for the same subject.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target path for a subject's persona file.
    pub fn path_for(&self, subject: &SubjectId) -> PathBuf {
        self.output_dir.join(format!("{}_persona.txt", subject.as_str()))
    }
}

#[async_trait]
impl PersistenceSink for FileSink {
    #[instrument(skip_all, fields(subject = %subject))]
    async fn save(&self, subject: &SubjectId, text: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PersonaKitError::io(&self.output_dir, e))?;

        let path = self.path_for(subject);
        debug!(path = %path.display(), bytes = text.len(), "writing persona");
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| PersonaKitError::io(&path, e))?;

        info!(path = %path.display(), "saved persona");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SubjectId {
        SubjectId::parse("alice").unwrap()
    }

    #[tokio::test]
    async fn save_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path().join("nested").join("outputs"));

        let path = sink.save(&alice(), "Alice is curious.").await.unwrap();

        assert_eq!(path, sink.output_dir().join("alice_persona.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Alice is curious.");
    }

    #[tokio::test]
    async fn save_overwrites_previous_persona() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());

        sink.save(&alice(), "first draft").await.unwrap();
        let path = sink.save(&alice(), "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[tokio::test]
    async fn save_into_a_file_path_fails_with_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();
        let sink = FileSink::new(&blocker);

        let err = sink.save(&alice(), "text").await.unwrap_err();

        assert!(matches!(err, PersonaKitError::Io { .. }));
    }
}

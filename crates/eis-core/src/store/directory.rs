use super::WaveformStore;
use super::codec::{decode_columns, encode_columns};
use crate::domain::{EisError, EisResult, Waveform};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) const WAVEFORM_ARTIFACT: &str = "waveform.bin";

/// One directory per path segment, with the group's columns in
/// `waveform.bin` inside the innermost directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_dir(&self, path: &str) -> EisResult<PathBuf> {
        let mut dir = self.root.clone();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(EisError::input_validation(
                    "INPUT.STORE_PATH",
                    format!("invalid segment '{}' in store path '{}'", segment, path),
                ));
            }
            dir.push(segment);
        }
        Ok(dir)
    }
}

impl WaveformStore for DirectoryStore {
    fn write(&mut self, path: &str, waveform: &Waveform) -> EisResult<()> {
        let dir = self.group_dir(path)?;
        fs::create_dir_all(&dir).map_err(|source| {
            EisError::io_system(
                "IO.STORE_DIRECTORY",
                format!(
                    "failed to create store directory '{}': {}",
                    dir.display(),
                    source
                ),
            )
        })?;

        let artifact = dir.join(WAVEFORM_ARTIFACT);
        let bytes = encode_columns(&waveform.clone().into_columns());
        fs::write(&artifact, &bytes).map_err(|source| {
            EisError::io_system(
                "IO.STORE_WRITE",
                format!("failed to write waveform '{}': {}", artifact.display(), source),
            )
        })?;
        debug!(path, bytes = bytes.len(), "stored waveform");
        Ok(())
    }

    fn read(&self, path: &str) -> EisResult<Waveform> {
        let artifact = self.group_dir(path)?.join(WAVEFORM_ARTIFACT);
        let bytes = fs::read(&artifact).map_err(|source| {
            EisError::io_system(
                "IO.STORE_READ",
                format!("failed to read waveform '{}': {}", artifact.display(), source),
            )
        })?;
        let columns = decode_columns(path, &bytes)?;
        debug!(path, bytes = bytes.len(), "loaded waveform");
        Waveform::from_columns(&columns)
    }

    fn list_children(&self, path: &str) -> EisResult<Vec<String>> {
        let dir = self.group_dir(path)?;
        let entries = fs::read_dir(&dir).map_err(|source| {
            EisError::io_system(
                "IO.STORE_LIST",
                format!("failed to list store group '{}': {}", dir.display(), source),
            )
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| {
                EisError::io_system(
                    "IO.STORE_LIST",
                    format!("failed to list store group '{}': {}", dir.display(), source),
                )
            })?;
            if entry.path().is_dir() {
                children.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        children.sort();
        Ok(children)
    }
}

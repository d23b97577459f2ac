//! Assembled audio artifacts.
//!
//! An artifact is the playable result of one capture session: the encoded
//! bytes, the negotiated MIME type, and a download filename embedding locale
//! and timestamp. Downloads are spooled to a file on demand; `release`
//! consumes the handle and removes the spooled file, so a superseded
//! artifact can be released exactly once.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::locale::Locale;

use super::format::NegotiatedFormat;

/// Errors that can occur while spooling an artifact for download.
#[derive(Debug)]
pub enum ArtifactError {
    SpoolFailed(String),
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactError::SpoolFailed(e) => write!(f, "Failed to spool artifact: {}", e),
        }
    }
}

impl std::error::Error for ArtifactError {}

/// A playable, downloadable capture result.
#[derive(Debug)]
pub struct Artifact {
    bytes: Vec<u8>,
    mime: String,
    extension: String,
    filename: String,
    spooled: Option<PathBuf>,
}

impl Artifact {
    /// Assemble buffered chunks into an artifact under the session format.
    pub(crate) fn assemble(chunks: Vec<Vec<u8>>, format: &NegotiatedFormat, locale: Locale) -> Self {
        let bytes = chunks.concat();
        let timestamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let filename = format!(
            "selftalk-practice-{}-{}.{}",
            locale, timestamp, format.extension
        );
        Self {
            bytes,
            mime: format.mime_or_default().to_string(),
            extension: format.extension.clone(),
            filename,
            spooled: None,
        }
    }

    /// The encoded audio, for playback.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Download filename: `selftalk-practice-<locale>-<timestamp>.<ext>`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn spooled_path(&self) -> Option<&Path> {
        self.spooled.as_deref()
    }

    /// Write the artifact into the default download directory.
    pub fn spool(&mut self) -> Result<&Path, ArtifactError> {
        let dir = artifact_dir();
        self.spool_to(dir)
    }

    /// Write the artifact into `dir`, creating it if needed. Repeated calls
    /// return the already spooled path.
    pub fn spool_to(&mut self, dir: impl Into<PathBuf>) -> Result<&Path, ArtifactError> {
        if self.spooled.is_none() {
            let dir = dir.into();
            fs::create_dir_all(&dir)
                .map_err(|e| ArtifactError::SpoolFailed(format!("{:?}: {}", dir, e)))?;
            let path = dir.join(&self.filename);
            fs::write(&path, &self.bytes)
                .map_err(|e| ArtifactError::SpoolFailed(format!("{:?}: {}", path, e)))?;
            log::info!("Artifact spooled: {:?}", path);
            self.spooled = Some(path);
        }
        Ok(self.spooled.as_deref().expect("just spooled"))
    }

    /// Release the artifact, removing any spooled file. Consumes the handle,
    /// so a release can happen at most once.
    pub fn release(mut self) {
        if let Some(path) = self.spooled.take() {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Artifact released: {:?}", path),
                Err(e) => log::warn!("Failed to remove spooled artifact {:?}: {}", path, e),
            }
        }
    }
}

/// Default download directory:
/// `<data_local_dir>/selftalk-practice/artifacts/`.
fn artifact_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("selftalk-practice")
        .join("artifacts")
}

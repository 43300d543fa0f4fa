//! Media artifacts produced during a pipeline run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Logical role of a file inside the run's working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// Downloaded input (audio, video chunk, fallback video)
    Source,
    /// Segment derived from a source
    Chunk,
    /// Clip returned by the generation API
    Generated,
    /// Output of a concatenation or trim
    Concatenated,
    /// Muxed file that gets uploaded
    Final,
}

impl ArtifactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::Source => "source",
            ArtifactRole::Chunk => "chunk",
            ArtifactRole::Generated => "generated",
            ArtifactRole::Concatenated => "concatenated",
            ArtifactRole::Final => "final",
        }
    }
}

/// A file on disk with its role. Artifacts are never modified once
/// created; every step writes a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    path: PathBuf,
    role: ArtifactRole,
}

impl MediaArtifact {
    pub fn new(path: impl Into<PathBuf>, role: ArtifactRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> ArtifactRole {
        self.role
    }

    /// File extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl AsRef<Path> for MediaArtifact {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

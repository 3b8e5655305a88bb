use crate::config::ConfigError;
use crate::io::manifest::ManifestError;
use crate::io::xyz::XyzError;
use crate::workspace::WorkspaceError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything the pipeline can fail with before or during script
/// generation. Submission failures are deliberately NOT part of this enum:
/// they are per-job data (`SubmissionOutcome`) so that one rejected job
/// cannot abort the rest of the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Geometry(#[from] XyzError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Failed to write '{path}': {source}", path = path.display())]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

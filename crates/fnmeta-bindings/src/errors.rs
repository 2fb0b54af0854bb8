use fnmeta_manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a module run
///
/// Problems in user code are never errors here; they surface as diagnostics.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Generation was cancelled")]
    Cancelled,

    #[error("Symbol document {0} does not name an assembly")]
    MissingAssembly(PathBuf),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

//! Error types for the command-line driver
//!
//! Library errors are wrapped as-is so their messages reach the user unchanged.

use std::path::PathBuf;
use thiserror::Error;

use fnmeta_bindings::PipelineError;
use fnmeta_config::ConfigError;
use fnmeta_manifest::ManifestError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generation reported {0} error diagnostic(s)")]
    DiagnosticErrors(usize),

    #[error("No symbol documents found under {0}")]
    NoInput(PathBuf),

    #[error("No provider documents found in {0}")]
    NoDocuments(String),

    #[error("{failed} of {total} function(s) failed binding validation")]
    InvalidDocument { failed: usize, total: usize },
}

//! Provider document reader/writer for arbitrary paths
//!
//! Provider documents are pretty-printed JSON so they diff cleanly between builds.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::metadata::ProviderDocument;

/// File suffix used for provider documents written by the generator
pub const DOCUMENT_SUFFIX: &str = ".metadata.json";

/// Write a provider document, creating parent directories as needed
pub fn write_to_path(document: &ProviderDocument, output_path: &Path) -> Result<()> {
    debug!("Writing provider document to: {:?}", output_path);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(document)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!(
        "Provider document written to {:?} ({} functions)",
        output_path,
        document.functions.len()
    );

    Ok(())
}

/// Read a provider document
pub fn read_from_path(document_path: &Path) -> Result<ProviderDocument> {
    debug!("Reading provider document from: {:?}", document_path);

    let content = fs::read_to_string(document_path)
        .with_context(|| format!("Failed to read {}", document_path.display()))?;
    let document: ProviderDocument = serde_json::from_str(&content)
        .with_context(|| format!("Invalid provider document {}", document_path.display()))?;

    info!(
        "Loaded provider {} with {} functions",
        document.namespace,
        document.functions.len()
    );

    Ok(document)
}

/// Conventional file name for an assembly's provider document
pub fn document_file_name(assembly_name: &str) -> String {
    format!("{}{}", assembly_name, DOCUMENT_SUFFIX)
}

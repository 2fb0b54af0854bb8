//! Symbol document loading
//!
//! The host exports one JSON symbol document per module. A path given to the generator is
//! either such a document or a directory searched recursively for `*.symbols.json`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::errors::PipelineError;
use crate::symbols::ModuleSymbols;

/// File suffix of host symbol documents
pub const SYMBOLS_SUFFIX: &str = ".symbols.json";

/// Load and check one symbol document
pub fn load_module(path: &Path) -> Result<ModuleSymbols> {
    debug!("Loading symbol document {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let module: ModuleSymbols = serde_json::from_str(&content)
        .with_context(|| format!("Invalid symbol document {}", path.display()))?;

    if module.assembly_name.trim().is_empty() {
        return Err(PipelineError::MissingAssembly(path.to_path_buf()).into());
    }

    info!(
        "Loaded {} with {} candidate methods",
        module.assembly_name,
        module.functions.len()
    );
    Ok(module)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_symbol_document(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(SYMBOLS_SUFFIX))
}

/// Symbol documents under `root`, sorted by path
///
/// A file is returned as-is whatever its name. Hidden directories are not searched.
pub fn discover_modules(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut documents: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_symbol_document(entry.path()))
        .map(DirEntry::into_path)
        .collect();
    documents.sort();

    debug!("Found {} symbol documents under {:?}", documents.len(), root);
    documents
}

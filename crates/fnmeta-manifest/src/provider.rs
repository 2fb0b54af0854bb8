//! Metadata providers and the cross-module aggregator
//!
//! Each module contributes one provider. The aggregator composes every visible provider,
//! including ones reached through referenced modules, into a single function list.

use parking_lot::RwLock;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::document::read_from_path;
use crate::errors::ManifestError;
use crate::metadata::{FunctionMetadata, ProviderDocument};

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Source of function metadata for one module
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    fn function_metadata(&self) -> Result<Vec<FunctionMetadata>, ManifestError>;
}

// =============================================================================
// STATIC PROVIDER
// =============================================================================

/// Provider over an in-memory document
pub struct StaticProvider {
    name: Arc<str>,
    functions: Vec<FunctionMetadata>,
}

impl StaticProvider {
    pub fn new(name: impl Into<Arc<str>>, functions: Vec<FunctionMetadata>) -> Self {
        StaticProvider {
            name: name.into(),
            functions,
        }
    }

    pub fn from_document(document: ProviderDocument) -> Self {
        StaticProvider {
            name: document.namespace,
            functions: document.functions,
        }
    }
}

impl MetadataProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_metadata(&self) -> Result<Vec<FunctionMetadata>, ManifestError> {
        Ok(self.functions.clone())
    }
}

// =============================================================================
// FILE PROVIDER
// =============================================================================

/// Provider backed by a document on disk, loaded on first use
pub struct FileProvider {
    name: String,
    path: PathBuf,
    loaded: RwLock<Option<Arc<ProviderDocument>>>,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        FileProvider {
            name: path.display().to_string(),
            path,
            loaded: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> Result<Arc<ProviderDocument>, ManifestError> {
        // Fast path: read lock
        if let Some(document) = self.loaded.read().as_ref() {
            return Ok(Arc::clone(document));
        }

        // Slow path: write lock
        let mut loaded = self.loaded.write();
        if let Some(document) = loaded.as_ref() {
            return Ok(Arc::clone(document));
        }
        let document = read_from_path(&self.path).map_err(|e| ManifestError::Provider {
            name: self.name.clone(),
            message: format!("{:#}", e),
        })?;
        let document = Arc::new(document);
        *loaded = Some(Arc::clone(&document));
        Ok(document)
    }
}

impl MetadataProvider for FileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_metadata(&self) -> Result<Vec<FunctionMetadata>, ManifestError> {
        Ok(self.document()?.functions.clone())
    }
}

// =============================================================================
// AGGREGATOR
// =============================================================================

/// Composes providers from every visible module
///
/// A single provider is delegated to directly. Several providers are invoked in parallel and
/// their results flattened in provider order; the first failure fails the whole aggregation.
pub struct MetadataAggregator {
    name: Arc<str>,
    providers: Vec<Arc<dyn MetadataProvider>>,
}

impl MetadataAggregator {
    /// Build from possibly-absent providers; absent entries are dropped
    pub fn new<I>(providers: I) -> Self
    where
        I: IntoIterator<Item = Option<Arc<dyn MetadataProvider>>>,
    {
        MetadataAggregator {
            name: Arc::from("aggregate"),
            providers: providers.into_iter().flatten().collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }
}

impl MetadataProvider for MetadataAggregator {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_metadata(&self) -> Result<Vec<FunctionMetadata>, ManifestError> {
        match self.providers.as_slice() {
            [] => Ok(Vec::new()),
            [single] => {
                debug!("Delegating to single provider {}", single.name());
                single.function_metadata()
            }
            providers => {
                debug!("Aggregating {} providers", providers.len());
                let per_provider = providers
                    .par_iter()
                    .map(|provider| provider.function_metadata())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(per_provider.into_iter().flatten().collect())
            }
        }
    }
}

//! Per-module metadata emission
//!
//! Turns accepted `FunctionDeclaration`s into a `ProviderDocument`:
//! 1. Skip emission entirely when no function was accepted
//! 2. Pick the rich form for functions whose bindings all resolved to a known shape
//! 3. Fall back to the minimal form (raw bindings only) otherwise

use std::sync::Arc;
use tracing::debug;

use crate::errors::ManifestError;
use crate::hash::FunctionIdentityHasher;
use crate::metadata::{FunctionMetadata, ProviderDocument, LANGUAGE};
use crate::types::{Binding, FunctionDeclaration};

/// Namespace root used when the build does not choose one
pub const DEFAULT_NAMESPACE_ROOT: &str = "AzureFunctionInternals";

/// Module-level facts shared by every function in one provider
#[derive(Debug, Clone)]
pub struct ModuleContext {
    pub assembly_name: Arc<str>,
    pub script_file: Arc<str>,
    pub namespace_root: Arc<str>,
    pub auto_register: bool,
}

impl ModuleContext {
    /// Context with the default script file (`<assembly>.dll`) and namespace root
    pub fn new(assembly_name: impl Into<Arc<str>>) -> Self {
        let assembly_name = assembly_name.into();
        ModuleContext {
            script_file: Arc::from(format!("{}.dll", assembly_name)),
            assembly_name,
            namespace_root: Arc::from(DEFAULT_NAMESPACE_ROOT),
            auto_register: false,
        }
    }

    pub fn with_script_file(mut self, script_file: Option<&str>) -> Self {
        if let Some(script_file) = script_file.filter(|s| !s.trim().is_empty()) {
            self.script_file = Arc::from(script_file.trim());
        }
        self
    }

    pub fn with_namespace_root(mut self, root: Option<&str>) -> Self {
        if let Some(root) = root.filter(|s| !s.trim().is_empty()) {
            self.namespace_root = Arc::from(root.trim());
        }
        self
    }

    pub fn with_auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    /// `<namespace root>.<assembly name>`
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.namespace_root, self.assembly_name)
    }
}

/// Renders accepted declarations into provider documents
pub struct MetadataEmitter {
    context: ModuleContext,
}

impl MetadataEmitter {
    pub fn new(context: ModuleContext) -> Self {
        MetadataEmitter { context }
    }

    pub fn context(&self) -> &ModuleContext {
        &self.context
    }

    /// Build the provider document, `None` when there is nothing to emit
    pub fn emit(
        &self,
        declarations: &[FunctionDeclaration],
    ) -> Result<Option<ProviderDocument>, ManifestError> {
        if declarations.is_empty() {
            debug!(
                "No functions accepted for {}, skipping provider",
                self.context.assembly_name
            );
            return Ok(None);
        }

        let functions = declarations
            .iter()
            .map(|declaration| self.function_metadata(declaration))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ProviderDocument {
            namespace: Arc::from(self.context.namespace()),
            assembly_name: Arc::clone(&self.context.assembly_name),
            auto_register: self.context.auto_register,
            generated_at: Arc::from(chrono::Utc::now().to_rfc3339()),
            functions,
        }))
    }

    /// Metadata for a single declaration in rich or minimal form
    pub fn function_metadata(
        &self,
        declaration: &FunctionDeclaration,
    ) -> Result<FunctionMetadata, ManifestError> {
        let raw_bindings = declaration
            .bindings
            .iter()
            .map(Binding::raw_json)
            .collect::<Result<Vec<_>, _>>()?;

        let mut metadata = FunctionMetadata {
            function_id: None,
            is_proxy: None,
            language: Arc::from(LANGUAGE),
            managed_dependency_enabled: None,
            name: Arc::clone(&declaration.function_name),
            entry_point: Arc::clone(&declaration.method_name),
            script_file: Arc::clone(&self.context.script_file),
            raw_bindings,
            generated_bindings: None,
            retry: declaration.retry,
        };

        if declaration.is_parsable() {
            metadata.function_id = FunctionIdentityHasher::function_id(
                Some(declaration.function_name.as_ref()),
                Some(self.context.script_file.as_ref()),
                Some(declaration.method_name.as_ref()),
            )
            .map(Arc::from);
            metadata.is_proxy = Some(false);
            metadata.managed_dependency_enabled = Some(false);
            metadata.generated_bindings = Some(
                declaration
                    .bindings
                    .iter()
                    .map(Binding::generated_form)
                    .collect(),
            );
        } else {
            debug!(
                "Function {} has unresolved bindings, emitting minimal metadata",
                declaration.function_name
            );
        }

        Ok(metadata)
    }
}

//! Binding generators and the registry that selects them
//!
//! A generator turns one annotation on one target (parameter, return-type property or the
//! method itself) into bindings plus diagnostics. Generators never share state; the caller
//! concatenates their outputs. The registry picks a generator by the annotation's kind tag and
//! falls back to `DefaultBindingGenerator` for any tag nobody registered.

use ahash::AHashMap;
use std::sync::Arc;
use tracing::debug;

use fnmeta_manifest::diagnostics::has_errors;
use fnmeta_manifest::{Binding, BindingKind, Diagnostic};

use crate::cache::SymbolCache;
use crate::symbols::{AnnotationSymbol, TypeSymbol};

mod default;
mod http;

pub use default::DefaultBindingGenerator;
pub use http::HttpTriggerGenerator;

#[cfg(test)]
mod tests;

/// What an annotation is attached to
#[derive(Debug, Clone, Copy)]
pub struct BindingTarget<'a> {
    /// Binding name: parameter name, property name or `$return`
    pub name: &'a str,
    pub ty: &'a TypeSymbol,
    pub location: Option<&'a Arc<str>>,
}

/// Inputs for a single generation
#[derive(Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub annotation: &'a AnnotationSymbol,
    pub kind: BindingKind,
    pub target: BindingTarget<'a>,
    pub cache: &'a SymbolCache,
}

impl GeneratorContext<'_> {
    /// Where diagnostics point: the target, else the annotation itself
    pub fn location(&self) -> Option<Arc<str>> {
        self.target
            .location
            .or(self.annotation.location.as_ref())
            .cloned()
    }
}

/// Bindings and diagnostics produced by one generator call
#[derive(Debug, Default)]
pub struct GeneratorOutput {
    pub bindings: Vec<Binding>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratorOutput {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    /// Append another output, keeping order
    pub fn merge(&mut self, other: GeneratorOutput) {
        self.bindings.extend(other.bindings);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Produces bindings for annotations of one kind
pub trait BindingGenerator: Send + Sync {
    fn generate(&self, context: &GeneratorContext<'_>) -> GeneratorOutput;
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Generators keyed by annotation kind tag
pub struct GeneratorRegistry {
    generators: AHashMap<Arc<str>, Arc<dyn BindingGenerator>>,
    fallback: Arc<dyn BindingGenerator>,
}

impl GeneratorRegistry {
    /// Registry with only the default generator
    pub fn empty() -> Self {
        GeneratorRegistry {
            generators: AHashMap::new(),
            fallback: Arc::new(DefaultBindingGenerator),
        }
    }

    /// Registry with the built-in binding-specific generators
    pub fn new() -> Self {
        GeneratorRegistry::empty()
            .with_generator(HttpTriggerGenerator::KIND_TAG, Arc::new(HttpTriggerGenerator))
    }

    /// Register a generator, returning the one it replaced
    pub fn register(
        &mut self,
        kind_tag: impl Into<Arc<str>>,
        generator: Arc<dyn BindingGenerator>,
    ) -> Option<Arc<dyn BindingGenerator>> {
        self.generators.insert(kind_tag.into(), generator)
    }

    pub fn with_generator(
        mut self,
        kind_tag: impl Into<Arc<str>>,
        generator: Arc<dyn BindingGenerator>,
    ) -> Self {
        self.register(kind_tag, generator);
        self
    }

    pub fn is_registered(&self, kind_tag: &str) -> bool {
        self.generators.contains_key(kind_tag)
    }

    pub fn resolve(&self, kind_tag: &str) -> &dyn BindingGenerator {
        self.generators
            .get(kind_tag)
            .map_or(self.fallback.as_ref(), |g| g.as_ref())
    }

    /// Run the generator matching the context's annotation
    pub fn generate(&self, context: &GeneratorContext<'_>) -> GeneratorOutput {
        let kind_tag = context.annotation.kind_tag();
        debug!(
            "Generating {:?} binding '{}' with {} generator",
            context.kind,
            context.target.name,
            if self.is_registered(&kind_tag) {
                kind_tag.as_str()
            } else {
                "default"
            }
        );
        self.resolve(&kind_tag).generate(context)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Per-run symbol cache
//!
//! The same handful of type names (`string`, `Task<T>`, `IEnumerable<T>`) and annotation classes
//! are queried for nearly every function of a module. Results are memoized by name so each
//! distinct type or class is inspected once. The cache is passed explicitly to the classifier and
//! the generators and is safe to share between worker threads.

use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use fnmeta_manifest::ParsedType;

use crate::naming::{
    BINDING_BASE, BINDING_CAPABILITIES, CARDINALITY_MARKER, FUNCTION_LEVEL_RETRY,
    INPUT_BINDING_BASE, OUTPUT_BINDING_BASE, TRIGGER_BINDING_BASE,
};
use crate::symbols::{AnnotationSymbol, ArgumentValue};

/// Declaration-driven facts about an annotation class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCapabilities {
    /// Class derives from one of the binding bases
    pub is_binding: bool,
    pub is_input: bool,
    /// Class derives from the output binding base
    pub is_output: bool,
    /// Class implements the cardinality marker, so `isBatched` applies
    pub supports_cardinality: bool,
    /// Class declares function-level retry in its binding capabilities
    pub supports_retry: bool,
}

impl AnnotationCapabilities {
    pub fn of(annotation: &AnnotationSymbol) -> Self {
        let is_input = annotation.inherits_from(INPUT_BINDING_BASE);
        let is_output = annotation.inherits_from(OUTPUT_BINDING_BASE);
        AnnotationCapabilities {
            is_binding: is_input
                || is_output
                || annotation.inherits_from(TRIGGER_BINDING_BASE)
                || annotation.inherits_from(BINDING_BASE),
            is_input,
            is_output,
            supports_cardinality: annotation.implements(CARDINALITY_MARKER),
            supports_retry: annotation
                .class_annotations
                .iter()
                .filter(|c| c.qualified_name() == BINDING_CAPABILITIES)
                .flat_map(|c| c.arguments.iter().map(|a| &a.value))
                .any(lists_function_level_retry),
        }
    }
}

fn lists_function_level_retry(value: &ArgumentValue) -> bool {
    match value {
        ArgumentValue::String(capability) => capability.as_ref() == FUNCTION_LEVEL_RETRY,
        ArgumentValue::Array(items) => items.iter().any(lists_function_level_retry),
        _ => false,
    }
}

/// Memoized type shapes and annotation capabilities
pub struct SymbolCache {
    types: RwLock<AHashMap<Arc<str>, ParsedType>>,
    capabilities: RwLock<AHashMap<Arc<str>, AnnotationCapabilities>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        SymbolCache {
            types: RwLock::new(AHashMap::new()),
            capabilities: RwLock::new(AHashMap::new()),
        }
    }

    /// Previously classified shape of a type name
    pub fn parsed_type(&self, type_name: &str) -> Option<ParsedType> {
        self.types.read().get(type_name).cloned()
    }

    /// Store a shape, returning the entry that ends up cached
    pub fn remember_type(&self, type_name: &Arc<str>, parsed: ParsedType) -> ParsedType {
        let mut types = self.types.write();
        types
            .entry(Arc::clone(type_name))
            .or_insert(parsed)
            .clone()
    }

    /// Capabilities of an annotation class, computed on first use
    pub fn capabilities(&self, annotation: &AnnotationSymbol) -> AnnotationCapabilities {
        let key = annotation.qualified_name();

        // Fast path: read lock
        {
            let capabilities = self.capabilities.read();
            if let Some(found) = capabilities.get(key.as_str()) {
                return *found;
            }
        }

        // Slow path: write lock
        trace!("Inspecting annotation class {}", key);
        let mut capabilities = self.capabilities.write();
        *capabilities
            .entry(Arc::from(key))
            .or_insert_with(|| AnnotationCapabilities::of(annotation))
    }

    /// Number of cached type shapes
    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }

    /// Number of cached annotation classes
    pub fn annotation_count(&self) -> usize {
        self.capabilities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_count() == 0 && self.annotation_count() == 0
    }

    pub fn clear(&self) {
        self.types.write().clear();
        self.capabilities.write().clear();
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::ABSTRACTIONS_NAMESPACE;

    fn retry_capable_trigger() -> AnnotationSymbol {
        AnnotationSymbol::new("Microsoft.Azure.Functions.Worker", "KafkaTriggerAttribute")
            .with_interface(CARDINALITY_MARKER)
            .with_class_annotation(
                AnnotationSymbol::new(ABSTRACTIONS_NAMESPACE, "BindingCapabilitiesAttribute")
                    .with_argument(
                        "capabilities",
                        ArgumentValue::Array(vec![ArgumentValue::String(Arc::from(
                            FUNCTION_LEVEL_RETRY,
                        ))]),
                    ),
            )
    }

    #[test]
    fn test_capabilities_follow_declarations() {
        let capabilities = AnnotationCapabilities::of(&retry_capable_trigger());
        assert!(capabilities.supports_retry);
        assert!(capabilities.supports_cardinality);
        assert!(!capabilities.is_output);

        let output = AnnotationSymbol::new("Microsoft.Azure.Functions.Worker", "QueueOutputAttribute")
            .with_base_type(OUTPUT_BINDING_BASE);
        let capabilities = AnnotationCapabilities::of(&output);
        assert!(capabilities.is_output);
        assert!(capabilities.is_binding);
        assert!(!capabilities.supports_retry);

        let input = AnnotationSymbol::new("Microsoft.Azure.Functions.Worker", "BlobInputAttribute")
            .with_base_type(INPUT_BINDING_BASE)
            .with_base_type(BINDING_BASE);
        let capabilities = AnnotationCapabilities::of(&input);
        assert!(capabilities.is_input && capabilities.is_binding);
        assert!(!capabilities.is_output);
    }

    #[test]
    fn test_capability_marker_in_other_namespace_is_ignored() {
        let lookalike = AnnotationSymbol::new("Microsoft.Azure.Functions.Worker", "QueueTriggerAttribute")
            .with_class_annotation(
                AnnotationSymbol::new("Contoso.Extensions", "BindingCapabilitiesAttribute").with_argument(
                    "capabilities",
                    ArgumentValue::String(Arc::from(FUNCTION_LEVEL_RETRY)),
                ),
            );
        assert!(!AnnotationCapabilities::of(&lookalike).supports_retry);
    }

    #[test]
    fn test_capabilities_are_memoized_by_class() {
        let cache = SymbolCache::new();
        assert!(cache.is_empty());
        let first = cache.capabilities(&retry_capable_trigger());
        let second = cache.capabilities(&retry_capable_trigger());
        assert_eq!(first, second);
        assert_eq!(cache.annotation_count(), 1);
    }

    #[test]
    fn test_first_remembered_shape_wins() {
        let cache = SymbolCache::new();
        let name: Arc<str> = Arc::from("string");
        cache.remember_type(&name, ParsedType::plain("string"));
        let kept = cache.remember_type(&name, ParsedType::plain("other"));
        assert_eq!(kept.raw_type.as_ref(), "string");
        assert_eq!(cache.parsed_type("string").map(|p| p.raw_type), Some(Arc::from("string")));
        cache.clear();
        assert!(cache.parsed_type("string").is_none());
    }
}

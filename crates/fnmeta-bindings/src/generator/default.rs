//! Generic binding generator
//!
//! Treats any annotation as an opaque binding descriptor:
//! 1. Seed `name`, `type` and `direction`
//! 2. Copy positional then named arguments as camel-cased entries
//! 3. Replace `isBatched` with `cardinality` when the class supports it
//! 4. Classify the target type and reject awaitable triggers
//! 5. Unwrap the per-item type of batched bindings for the data type hint

use std::sync::Arc;
use tracing::trace;

use fnmeta_manifest::types::{DIRECTION_KEY, NAME_KEY, TYPE_KEY};
use fnmeta_manifest::{Binding, BindingKind, DataTypeHint, Diagnostic, DiagnosticId, PropertyMap};

use super::{BindingGenerator, GeneratorContext, GeneratorOutput};
use crate::classifier::TypeShapeClassifier;
use crate::naming::to_camel_case;
use crate::symbols::ArgumentValue;

const IS_BATCHED_KEY: &str = "isBatched";
const CARDINALITY_KEY: &str = "cardinality";

/// Fallback generator for every annotation kind without a dedicated one
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindingGenerator;

impl DefaultBindingGenerator {
    /// Entry map seeded with the well-known keys and the annotation arguments
    fn entries(context: &GeneratorContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> PropertyMap {
        let annotation = context.annotation;
        let mut entries = PropertyMap::new();
        entries.insert(NAME_KEY, context.target.name);
        entries.insert(TYPE_KEY, annotation.kind_tag());
        entries.insert(DIRECTION_KEY, context.kind.default_direction().as_str());

        for (argument, value) in annotation.entries() {
            let key = to_camel_case(argument);
            if [NAME_KEY, TYPE_KEY, DIRECTION_KEY].contains(&key.as_str()) {
                trace!("Ignoring reserved argument '{}' on {}", argument, annotation.class_name);
                continue;
            }
            if matches!(value, ArgumentValue::Null) {
                continue;
            }
            match value.to_binding_text() {
                Some(text) => {
                    entries.insert(key, text);
                }
                None => diagnostics.push(Diagnostic::new(
                    DiagnosticId::InvalidBindingAttributeArgument,
                    context.location(),
                    &[argument, context.target.name],
                )),
            }
        }

        entries
    }

    /// Swap `isBatched` for `cardinality`, returning whether the binding is batched
    fn cardinality(
        entries: &mut PropertyMap,
        location: Option<Arc<str>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let is_batched = match entries.remove(IS_BATCHED_KEY) {
            None => false,
            Some(text) if text.eq_ignore_ascii_case("true") => true,
            Some(text) if text.eq_ignore_ascii_case("false") => false,
            Some(_) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::SymbolNotFound,
                    location,
                    &["bool value"],
                ));
                false
            }
        };
        entries.insert(CARDINALITY_KEY, if is_batched { "Many" } else { "One" });
        is_batched
    }
}

impl BindingGenerator for DefaultBindingGenerator {
    fn generate(&self, context: &GeneratorContext<'_>) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();
        let location = context.location();

        let mut entries = Self::entries(context, &mut output.diagnostics);

        let capabilities = context.cache.capabilities(context.annotation);
        let is_batched = capabilities.supports_cardinality
            && Self::cardinality(&mut entries, location.clone(), &mut output.diagnostics);

        let classifier = TypeShapeClassifier::new(context.cache);
        let parsed = match classifier.classify_at(context.target.ty, location.as_ref()) {
            Ok(parsed) => parsed,
            Err(diagnostic) => {
                output.diagnostics.push(diagnostic);
                return output;
            }
        };

        if context.kind != BindingKind::Output && parsed.is_async_operation() {
            output.diagnostics.push(Diagnostic::new(
                DiagnosticId::InvalidBindingType,
                location,
                &["Task, ValueTask, Task<T>, ValueTask<T>", "input trigger"],
            ));
            return output;
        }

        let data_type = if is_batched {
            match TypeShapeClassifier::batched_element(context.target.ty, &parsed) {
                Ok(element) => DataTypeHint::from_type_name(&element.name),
                Err(error) => {
                    output.diagnostics.push(error.into_diagnostic(location));
                    return output;
                }
            }
        } else {
            parsed.data_type_hint()
        };

        output.bindings.push(
            Binding::new(context.target.name, context.kind, parsed, entries)
                .with_data_type(data_type)
                .with_parsable(data_type != DataTypeHint::Undefined)
                .with_retry_support(capabilities.supports_retry),
        );
        output
    }
}

//! HTTP trigger generator
//!
//! Same entries as the default generator, with stricter arguments: the authorization level
//! must name a known level (numeric levels are mapped to their names) and every HTTP method must
//! be a non-empty string. An empty method list is dropped so the host applies its defaults.

use std::sync::Arc;

use fnmeta_manifest::{Diagnostic, DiagnosticId};

use super::{BindingGenerator, DefaultBindingGenerator, GeneratorContext, GeneratorOutput};
use crate::symbols::{AnnotationSymbol, ArgumentValue};

const AUTH_LEVEL: &str = "authLevel";
const METHODS: &str = "methods";
const AUTHORIZATION_LEVELS: [&str; 5] = ["Anonymous", "User", "Function", "System", "Admin"];

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTriggerGenerator;

impl HttpTriggerGenerator {
    pub const KIND_TAG: &'static str = "httpTrigger";

    /// Normalized copy of the annotation, or the name of the first invalid argument
    fn normalize(annotation: &AnnotationSymbol) -> Result<AnnotationSymbol, Arc<str>> {
        let mut normalized = annotation.clone();

        for argument in &mut normalized.arguments {
            if argument.parameter.eq_ignore_ascii_case(AUTH_LEVEL) {
                argument.value = auth_level(&argument.value).ok_or_else(|| Arc::clone(&argument.parameter))?;
            } else if argument.parameter.eq_ignore_ascii_case(METHODS) && !valid_methods(&argument.value) {
                return Err(Arc::clone(&argument.parameter));
            }
        }
        for argument in &mut normalized.named_arguments {
            if argument.name.eq_ignore_ascii_case(AUTH_LEVEL) {
                argument.value = auth_level(&argument.value).ok_or_else(|| Arc::clone(&argument.name))?;
            } else if argument.name.eq_ignore_ascii_case(METHODS) && !valid_methods(&argument.value) {
                return Err(Arc::clone(&argument.name));
            }
        }

        normalized
            .arguments
            .retain(|a| !(a.parameter.eq_ignore_ascii_case(METHODS) && is_empty_array(&a.value)));
        normalized
            .named_arguments
            .retain(|a| !(a.name.eq_ignore_ascii_case(METHODS) && is_empty_array(&a.value)));

        Ok(normalized)
    }
}

fn auth_level(value: &ArgumentValue) -> Option<ArgumentValue> {
    let member = match value {
        ArgumentValue::Null => return Some(ArgumentValue::Null),
        ArgumentValue::Int(level) => usize::try_from(*level)
            .ok()
            .and_then(|idx| AUTHORIZATION_LEVELS.get(idx).copied())?,
        ArgumentValue::Enum {
            member: Some(member),
            ..
        }
        | ArgumentValue::String(member) => AUTHORIZATION_LEVELS
            .iter()
            .find(|level| level.eq_ignore_ascii_case(member))
            .copied()?,
        _ => return None,
    };
    Some(ArgumentValue::String(Arc::from(member)))
}

fn valid_methods(value: &ArgumentValue) -> bool {
    match value {
        ArgumentValue::Null => true,
        ArgumentValue::Array(items) => items
            .iter()
            .all(|item| item.as_str().is_some_and(|m| !m.trim().is_empty())),
        _ => false,
    }
}

fn is_empty_array(value: &ArgumentValue) -> bool {
    matches!(value, ArgumentValue::Array(items) if items.is_empty())
}

impl BindingGenerator for HttpTriggerGenerator {
    fn generate(&self, context: &GeneratorContext<'_>) -> GeneratorOutput {
        match Self::normalize(context.annotation) {
            Ok(annotation) => DefaultBindingGenerator.generate(&GeneratorContext {
                annotation: &annotation,
                ..*context
            }),
            Err(argument) => GeneratorOutput {
                bindings: Vec::new(),
                diagnostics: vec![Diagnostic::new(
                    DiagnosticId::InvalidBindingAttributeArgument,
                    context.location(),
                    &[argument.as_ref(), context.target.name],
                )],
            },
        }
    }
}

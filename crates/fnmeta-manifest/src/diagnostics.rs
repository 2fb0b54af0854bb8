//! Diagnostic catalog and records
//!
//! Every diagnostic has a stable code, a fixed severity and a message template with
//! positional `{0}`, `{1}` placeholders. Error severity suppresses emission of the owning
//! function; warnings and infos are reported but never block emission on their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const HELP_LINK_BASE: &str = "https://fnmeta.dev/rules/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Static description of one diagnostic kind
#[derive(Debug)]
pub struct Descriptor {
    pub code: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub template: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticId {
    #[serde(rename = "FNM0005")]
    MultipleBindingsGroupedTogether,
    #[serde(rename = "FNM0006")]
    SymbolNotFound,
    #[serde(rename = "FNM0008")]
    InvalidCardinality,
    #[serde(rename = "FNM0012")]
    InvalidRetryOptions,
    #[serde(rename = "FNM0013")]
    InvalidBindingAttributeArgument,
    #[serde(rename = "FNM0014")]
    InconclusiveAttribute,
    #[serde(rename = "FNM0016")]
    InvalidInputTriggerCount,
    #[serde(rename = "FNM0018")]
    AsyncVoidIsNotAllowed,
    #[serde(rename = "FNM0019")]
    InvalidBindingType,
    #[serde(rename = "FNM0020")]
    InconclusiveOutputBinding,
    #[serde(rename = "FNM0021")]
    InvalidRetryArgument,
}

impl DiagnosticId {
    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            DiagnosticId::MultipleBindingsGroupedTogether => &Descriptor {
                code: "FNM0005",
                title: "Multiple bindings grouped together",
                severity: Severity::Error,
                template: "Only one {0} binding attribute is allowed on '{1}'.",
            },
            DiagnosticId::SymbolNotFound => &Descriptor {
                code: "FNM0006",
                title: "Symbol not found",
                severity: Severity::Warning,
                template: "The symbol '{0}' could not be found.",
            },
            DiagnosticId::InvalidCardinality => &Descriptor {
                code: "FNM0008",
                title: "Invalid cardinality",
                severity: Severity::Error,
                template: "The cardinality of the input or trigger binding on parameter '{0}' is invalid. IsBatched may be used incorrectly.",
            },
            DiagnosticId::InvalidRetryOptions => &Descriptor {
                code: "FNM0012",
                title: "Invalid retry options",
                severity: Severity::Error,
                template: "Invalid use of a retry attribute. Check that the attribute is used on a trigger that supports function-level retry.",
            },
            DiagnosticId::InvalidBindingAttributeArgument => &Descriptor {
                code: "FNM0013",
                title: "Invalid binding attribute argument",
                severity: Severity::Error,
                template: "The value of the argument '{0}' could not be serialized for binding '{1}'.",
            },
            DiagnosticId::InconclusiveAttribute => &Descriptor {
                code: "FNM0014",
                title: "Inconclusive attribute",
                severity: Severity::Error,
                template: "Found more than one '{0}' attribute on '{1}'.",
            },
            DiagnosticId::InvalidInputTriggerCount => &Descriptor {
                code: "FNM0016",
                title: "Invalid trigger count",
                severity: Severity::Error,
                template: "Functions must have exactly 1 trigger binding. The function has {0} triggers.",
            },
            DiagnosticId::AsyncVoidIsNotAllowed => &Descriptor {
                code: "FNM0018",
                title: "Async void is not allowed",
                severity: Severity::Error,
                template: "Function '{0}' is async void. Return Task or ValueTask instead.",
            },
            DiagnosticId::InvalidBindingType => &Descriptor {
                code: "FNM0019",
                title: "Invalid binding type",
                severity: Severity::Error,
                template: "Binding type does not allow {0} as {1} type.",
            },
            DiagnosticId::InconclusiveOutputBinding => &Descriptor {
                code: "FNM0020",
                title: "Inconclusive output binding",
                severity: Severity::Error,
                template: "Function '{0}' declares output bindings on both the method and its return type properties.",
            },
            DiagnosticId::InvalidRetryArgument => &Descriptor {
                code: "FNM0021",
                title: "Invalid retry argument",
                severity: Severity::Error,
                template: "Invalid retry, {0} must be {1}.",
            },
        }
    }

    pub fn code(self) -> &'static str {
        self.descriptor().code
    }

    pub fn severity(self) -> Severity {
        self.descriptor().severity
    }
}

/// One reported problem, bound to a source location supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Arc<str>>,
}

impl Diagnostic {
    /// Build a diagnostic, substituting `args` into the descriptor template
    pub fn new(id: DiagnosticId, location: Option<Arc<str>>, args: &[&str]) -> Self {
        let descriptor = id.descriptor();
        Diagnostic {
            id,
            severity: descriptor.severity,
            message: format_template(descriptor.template, args),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }

    pub fn help_link(&self) -> String {
        format!("{}{}", HELP_LINK_BASE, self.id.code())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id.code(), self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// True if any diagnostic blocks emission
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

fn format_template(template: &str, args: &[&str]) -> String {
    let mut message = template.to_string();
    for (idx, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", idx), arg);
    }
    message
}

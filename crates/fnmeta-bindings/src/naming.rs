//! Naming utilities for binding keys and well-known host type names
//!
//! This module provides:
//! - Case conversion for annotation parameter and class names
//! - Fully qualified names the assembler and classifier recognize in host symbols

/// Namespace of the worker SDK
pub const WORKER_NAMESPACE: &str = "Microsoft.Azure.Functions.Worker";
/// Namespace shared by every binding extension
pub const ABSTRACTIONS_NAMESPACE: &str = "Microsoft.Azure.Functions.Worker.Extensions.Abstractions";

pub const FUNCTION_ATTRIBUTE: &str = "FunctionAttribute";
pub const FIXED_DELAY_RETRY_ATTRIBUTE: &str = "FixedDelayRetryAttribute";
pub const EXPONENTIAL_BACKOFF_RETRY_ATTRIBUTE: &str = "ExponentialBackoffRetryAttribute";

pub const BINDING_BASE: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.BindingAttribute";
pub const INPUT_BINDING_BASE: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.InputBindingAttribute";
pub const TRIGGER_BINDING_BASE: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.TriggerBindingAttribute";
pub const OUTPUT_BINDING_BASE: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.OutputBindingAttribute";
pub const CARDINALITY_MARKER: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.ISupportCardinality";
pub const BINDING_CAPABILITIES: &str =
    "Microsoft.Azure.Functions.Worker.Extensions.Abstractions.BindingCapabilitiesAttribute";
pub const FUNCTION_LEVEL_RETRY: &str = "FunctionLevelRetry";

pub const VOID: &str = "void";
pub const STRING: &str = "string";
pub const TASK: &str = "System.Threading.Tasks.Task";
pub const VALUE_TASK: &str = "System.Threading.Tasks.ValueTask";
pub const AWAITABLE_WRAPPERS: [&str; 2] = [TASK, VALUE_TASK];
pub const ENUMERABLE: &str = "System.Collections.IEnumerable";
pub const GENERIC_ENUMERABLE: &str = "System.Collections.Generic.IEnumerable";
pub const ASYNC_ENUMERABLE: &str = "System.Collections.Generic.IAsyncEnumerable";

/// Binding name used for outputs declared on the method itself
pub const RETURN_BINDING_NAME: &str = "$return";

/// Lower-case the first character, leaving the rest untouched
///
/// - QueueName -> queueName
/// - isBatched -> isBatched
/// - URL -> uRL
pub fn to_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Binding `type` value for an annotation class
///
/// - ServiceBusTriggerAttribute -> serviceBusTrigger
/// - BlobOutputAttribute -> blobOutput
/// - HttpTrigger -> httpTrigger
pub fn binding_type_tag(class_name: &str) -> String {
    to_camel_case(&class_name.replace("Attribute", ""))
}

/// Join a namespace and a simple name
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(namespace) => format!("{}.{}", namespace, name),
        None => name.to_string(),
    }
}

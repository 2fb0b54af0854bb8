use super::*;
use crate::naming::{
    ABSTRACTIONS_NAMESPACE, CARDINALITY_MARKER, ENUMERABLE, GENERIC_ENUMERABLE,
    OUTPUT_BINDING_BASE, TASK, WORKER_NAMESPACE,
};
use crate::symbols::ArgumentValue;
use fnmeta_manifest::{BindingDirection, DataTypeHint, DiagnosticId, Severity};

fn text(value: &str) -> ArgumentValue {
    ArgumentValue::String(Arc::from(value))
}

fn string_list() -> TypeSymbol {
    let element = TypeSymbol::named("string");
    TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element.clone()]).with_interfaces(vec![
        TypeSymbol::named(ENUMERABLE),
        TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element]),
    ])
}

fn service_bus_trigger(is_batched: Option<ArgumentValue>) -> AnnotationSymbol {
    let annotation = AnnotationSymbol::new(WORKER_NAMESPACE, "ServiceBusTriggerAttribute")
        .with_interface(CARDINALITY_MARKER)
        .with_argument("queueName", text("queueName"));
    match is_batched {
        Some(value) => annotation.with_named_argument("IsBatched", value),
        None => annotation,
    }
}

fn generate(
    registry: &GeneratorRegistry,
    annotation: &AnnotationSymbol,
    kind: BindingKind,
    name: &str,
    ty: &TypeSymbol,
) -> GeneratorOutput {
    let cache = SymbolCache::new();
    let context = GeneratorContext {
        annotation,
        kind,
        target: BindingTarget {
            name,
            ty,
            location: None,
        },
        cache: &cache,
    };
    registry.generate(&context)
}

fn ids(output: &GeneratorOutput) -> Vec<DiagnosticId> {
    output.diagnostics.iter().map(|d| d.id).collect()
}

#[test]
fn test_batched_service_bus_trigger() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(Some(ArgumentValue::Bool(true))),
        BindingKind::Trigger,
        "value",
        &string_list(),
    );
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.bindings.len(), 1);

    let binding = &output.bindings[0];
    assert_eq!(binding.name(), "value");
    assert_eq!(binding.kind(), BindingKind::Trigger);
    assert_eq!(binding.data_type(), DataTypeHint::String);
    assert!(binding.is_parsable());

    let raw = binding.raw_json().unwrap_or_default();
    assert_eq!(
        raw,
        r#"{"name":"value","type":"serviceBusTrigger","direction":"In","queueName":"queueName","cardinality":"Many"}"#
    );
}

#[test]
fn test_unbatched_trigger_reports_single_cardinality() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(None),
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert_eq!(output.bindings.len(), 1);
    assert_eq!(output.bindings[0].properties().get("cardinality"), Some("One"));
}

#[test]
fn test_non_boolean_is_batched_is_a_warning() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(Some(text("sometimes"))),
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert_eq!(ids(&output), vec![DiagnosticId::SymbolNotFound]);
    assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    assert!(!output.has_errors());
    assert_eq!(output.bindings.len(), 1);
    let properties = output.bindings[0].properties();
    assert!(!properties.contains_key("isBatched"));
    assert_eq!(properties.get("cardinality"), Some("One"));
}

#[test]
fn test_is_batched_text_is_case_insensitive() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(Some(text("True"))),
        BindingKind::Trigger,
        "messages",
        &TypeSymbol::array(TypeSymbol::named("byte")),
    );
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.bindings[0].data_type(), DataTypeHint::Binary);
}

#[test]
fn test_batched_on_single_item_is_rejected() {
    let registry = GeneratorRegistry::new();
    for name in ["Orders.Order", "int", "System.Guid"] {
        let output = generate(
            &registry,
            &service_bus_trigger(Some(ArgumentValue::Bool(true))),
            BindingKind::Trigger,
            "message",
            &TypeSymbol::named(name),
        );
        assert!(output.bindings.is_empty());
        assert_eq!(ids(&output), vec![DiagnosticId::InvalidCardinality]);
    }
}

#[test]
fn test_awaitable_trigger_is_rejected() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(None),
        BindingKind::Trigger,
        "message",
        &TypeSymbol::generic(TASK, vec![TypeSymbol::named("string")]),
    );
    assert!(output.bindings.is_empty());
    assert_eq!(ids(&output), vec![DiagnosticId::InvalidBindingType]);
    assert!(output.diagnostics[0].message.contains("input trigger"));
}

#[test]
fn test_unserializable_argument_skips_entry() {
    let registry = GeneratorRegistry::new();
    let annotation = AnnotationSymbol::new(WORKER_NAMESPACE, "QueueTriggerAttribute")
        .with_argument("queueName", ArgumentValue::Unresolved(Arc::from("Settings.Queue()")))
        .with_named_argument("Connection", text("Storage"))
        .with_named_argument("Extra", ArgumentValue::Null);
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert_eq!(ids(&output), vec![DiagnosticId::InvalidBindingAttributeArgument]);
    assert_eq!(output.bindings.len(), 1);
    let properties = output.bindings[0].properties();
    assert!(!properties.contains_key("queueName"));
    assert!(!properties.contains_key("extra"));
    assert_eq!(properties.get("connection"), Some("Storage"));
    // no cardinality marker, so isBatched-style handling does not apply
    assert!(!properties.contains_key("cardinality"));
}

#[test]
fn test_output_binding_unwraps_awaited_return() {
    let registry = GeneratorRegistry::new();
    let annotation = AnnotationSymbol::new(WORKER_NAMESPACE, "QueueOutputAttribute")
        .with_base_type(OUTPUT_BINDING_BASE)
        .with_argument("queueName", text("out"));
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Output,
        "$return",
        &TypeSymbol::generic(TASK, vec![TypeSymbol::named("string")]),
    );
    assert!(output.diagnostics.is_empty());
    let binding = &output.bindings[0];
    assert_eq!(binding.direction(), BindingDirection::Out);
    assert_eq!(binding.binding_type(), "queueOutput");
    assert_eq!(binding.data_type(), DataTypeHint::String);
}

#[test]
fn test_model_typed_binding_is_not_parsable() {
    let registry = GeneratorRegistry::new();
    let output = generate(
        &registry,
        &service_bus_trigger(None),
        BindingKind::Trigger,
        "order",
        &TypeSymbol::named("Orders.Order"),
    );
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.bindings[0].data_type(), DataTypeHint::Undefined);
    assert!(!output.bindings[0].is_parsable());
}

#[test]
fn test_retry_support_comes_from_class_capabilities() {
    let registry = GeneratorRegistry::new();
    let annotation = service_bus_trigger(None).with_class_annotation(
        AnnotationSymbol::new(ABSTRACTIONS_NAMESPACE, "BindingCapabilitiesAttribute")
            .with_argument("capabilities", ArgumentValue::Array(vec![text("FunctionLevelRetry")])),
    );
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert!(output.bindings[0].is_retry_supported());

    let output = generate(
        &registry,
        &service_bus_trigger(None),
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert!(!output.bindings[0].is_retry_supported());
}

// =============================================================================
// REGISTRY
// =============================================================================

struct FixedGenerator;

impl BindingGenerator for FixedGenerator {
    fn generate(&self, context: &GeneratorContext<'_>) -> GeneratorOutput {
        let properties = [("name", context.target.name), ("type", "fixed"), ("direction", "In")]
            .into_iter()
            .collect();
        GeneratorOutput {
            bindings: vec![Binding::new(
                context.target.name,
                context.kind,
                fnmeta_manifest::ParsedType::plain("string"),
                properties,
            )],
            diagnostics: Vec::new(),
        }
    }
}

#[test]
fn test_registry_dispatches_on_kind_tag() {
    let mut registry = GeneratorRegistry::empty();
    assert!(!registry.is_registered("serviceBusTrigger"));
    assert!(registry
        .register("serviceBusTrigger", Arc::new(FixedGenerator))
        .is_none());

    let output = generate(
        &registry,
        &service_bus_trigger(None),
        BindingKind::Trigger,
        "message",
        &TypeSymbol::named("string"),
    );
    assert_eq!(output.bindings[0].binding_type(), "fixed");

    // anything else still goes through the default generator
    let other = AnnotationSymbol::new(WORKER_NAMESPACE, "TimerTriggerAttribute")
        .with_argument("schedule", text("0 */5 * * * *"));
    let output = generate(
        &registry,
        &other,
        BindingKind::Trigger,
        "timer",
        &TypeSymbol::named("Microsoft.Azure.Functions.Worker.TimerInfo"),
    );
    assert_eq!(output.bindings[0].binding_type(), "timerTrigger");
    assert_eq!(
        output.bindings[0].properties().get("schedule"),
        Some("0 */5 * * * *")
    );
}

#[test]
fn test_merge_keeps_order() {
    let mut first = GeneratorOutput::default();
    first.diagnostics.push(Diagnostic::new(DiagnosticId::SymbolNotFound, None, &["a"]));
    let mut second = GeneratorOutput::default();
    second
        .diagnostics
        .push(Diagnostic::new(DiagnosticId::InvalidCardinality, None, &["b"]));
    first.merge(second);
    assert_eq!(
        ids(&first),
        vec![DiagnosticId::SymbolNotFound, DiagnosticId::InvalidCardinality]
    );
    assert!(first.has_errors());
}

// =============================================================================
// HTTP
// =============================================================================

fn http_trigger() -> AnnotationSymbol {
    AnnotationSymbol::new(WORKER_NAMESPACE, "HttpTriggerAttribute")
}

#[test]
fn test_http_numeric_auth_level_is_named() {
    let registry = GeneratorRegistry::new();
    let annotation = http_trigger()
        .with_argument("authLevel", ArgumentValue::Int(0))
        .with_argument("methods", ArgumentValue::Array(vec![text("get"), text("post")]));
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "req",
        &TypeSymbol::named("Microsoft.Azure.Functions.Worker.Http.HttpRequestData"),
    );
    assert!(output.diagnostics.is_empty());
    let raw = output.bindings[0].raw_json().unwrap_or_default();
    assert_eq!(
        raw,
        r#"{"name":"req","type":"httpTrigger","direction":"In","authLevel":"Anonymous","methods":"[\"get\",\"post\"]"}"#
    );
}

#[test]
fn test_http_unknown_auth_level_is_rejected() {
    let registry = GeneratorRegistry::new();
    let annotation = http_trigger().with_argument(
        "authLevel",
        ArgumentValue::Enum {
            type_name: Arc::from("AuthorizationLevel"),
            member: None,
        },
    );
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "req",
        &TypeSymbol::named("string"),
    );
    assert!(output.bindings.is_empty());
    assert_eq!(ids(&output), vec![DiagnosticId::InvalidBindingAttributeArgument]);
    assert!(output.diagnostics[0].message.contains("'authLevel'"));
}

#[test]
fn test_http_empty_methods_are_dropped() {
    let registry = GeneratorRegistry::new();
    let annotation = http_trigger()
        .with_argument(
            "authLevel",
            ArgumentValue::Enum {
                type_name: Arc::from("AuthorizationLevel"),
                member: Some(Arc::from("Function")),
            },
        )
        .with_argument("methods", ArgumentValue::Array(Vec::new()))
        .with_named_argument("Route", text("orders/{id}"));
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "req",
        &TypeSymbol::named("string"),
    );
    let properties = output.bindings[0].properties();
    assert!(!properties.contains_key("methods"));
    assert_eq!(properties.get("authLevel"), Some("Function"));
    assert_eq!(properties.get("route"), Some("orders/{id}"));
}

#[test]
fn test_http_blank_method_is_rejected() {
    let registry = GeneratorRegistry::new();
    let annotation = http_trigger()
        .with_argument("methods", ArgumentValue::Array(vec![text("get"), text(" ")]));
    let output = generate(
        &registry,
        &annotation,
        BindingKind::Trigger,
        "req",
        &TypeSymbol::named("string"),
    );
    assert!(output.bindings.is_empty());
    assert!(output.has_errors());
}

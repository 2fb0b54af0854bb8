//! Per-function binding assembly
//!
//! Every function walks the same states:
//! 1. `CollectingTriggers`: each binding annotation on a parameter runs its generator
//! 2. `CollectingOutputs`: return-type properties first, then method-level `$return` outputs
//! 3. `Validating`: any error rejects, otherwise exactly one trigger is required
//! 4. `Accepted` or `Rejected`
//!
//! Retry is resolved once validation passes and can still reject the function. Diagnostics are
//! kept for both outcomes, only accepted functions carry a declaration.

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use fnmeta_manifest::diagnostics::has_errors;
use fnmeta_manifest::{
    Binding, BindingKind, Diagnostic, DiagnosticId, FunctionDeclaration, RetryPolicy,
};

use crate::cache::SymbolCache;
use crate::cancel::CancellationToken;
use crate::classifier::TypeShapeClassifier;
use crate::errors::PipelineError;
use crate::generator::{BindingTarget, GeneratorContext, GeneratorOutput, GeneratorRegistry};
use crate::naming::{FUNCTION_ATTRIBUTE, RETURN_BINDING_NAME, VOID, WORKER_NAMESPACE};
use crate::retry::RetryPolicyResolver;
use crate::symbols::{AnnotationSymbol, ArgumentValue, FunctionSymbol};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    CollectingTriggers,
    CollectingOutputs,
    Validating,
    Accepted,
    Rejected,
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyState::CollectingTriggers => write!(f, "collecting triggers"),
            AssemblyState::CollectingOutputs => write!(f, "collecting outputs"),
            AssemblyState::Validating => write!(f, "validating"),
            AssemblyState::Accepted => write!(f, "accepted"),
            AssemblyState::Rejected => write!(f, "rejected"),
        }
    }
}

/// Final state of one function
#[derive(Debug)]
pub struct AssemblyOutcome {
    pub function_name: Arc<str>,
    pub state: AssemblyState,
    /// Present only when accepted
    pub declaration: Option<FunctionDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AssemblyOutcome {
    pub fn is_accepted(&self) -> bool {
        self.state == AssemblyState::Accepted
    }
}

/// Bindings and diagnostics gathered while a function moves through its states
struct Assembly<'f> {
    function: &'f FunctionSymbol,
    function_name: Arc<str>,
    state: AssemblyState,
    parameter_bindings: Vec<Binding>,
    output_bindings: Vec<Binding>,
    diagnostics: Vec<Diagnostic>,
}

impl<'f> Assembly<'f> {
    fn new(function: &'f FunctionSymbol, function_name: Arc<str>) -> Self {
        Assembly {
            function,
            function_name,
            state: AssemblyState::CollectingTriggers,
            parameter_bindings: Vec::new(),
            output_bindings: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn transition(&mut self, next: AssemblyState) {
        trace!("{}: {} -> {}", self.function_name, self.state, next);
        self.state = next;
    }

    fn location(&self) -> Option<Arc<str>> {
        self.function.location.clone()
    }

    fn report(&mut self, id: DiagnosticId, args: &[&str]) {
        let diagnostic = Diagnostic::new(id, self.location(), args);
        self.diagnostics.push(diagnostic);
    }

    fn reject(mut self) -> AssemblyOutcome {
        self.transition(AssemblyState::Rejected);
        debug!(
            "Rejected function {} with {} diagnostics",
            self.function_name,
            self.diagnostics.len()
        );
        AssemblyOutcome {
            function_name: self.function_name,
            state: self.state,
            declaration: None,
            diagnostics: self.diagnostics,
        }
    }

    /// Trigger first, then inputs and outputs in discovery order
    fn accept(mut self, retry: Option<RetryPolicy>) -> AssemblyOutcome {
        self.transition(AssemblyState::Accepted);
        let (mut bindings, inputs): (Vec<Binding>, Vec<Binding>) = self
            .parameter_bindings
            .into_iter()
            .partition(|b| b.kind() == BindingKind::Trigger);
        bindings.extend(inputs);
        bindings.extend(self.output_bindings);

        debug!(
            "Accepted function {} with {} bindings",
            self.function_name,
            bindings.len()
        );
        AssemblyOutcome {
            declaration: Some(FunctionDeclaration {
                function_name: Arc::clone(&self.function_name),
                method_name: Arc::clone(&self.function.method_name),
                containing_type_name: Arc::clone(&self.function.containing_type),
                bindings,
                retry,
            }),
            function_name: self.function_name,
            state: self.state,
            diagnostics: self.diagnostics,
        }
    }

    fn trigger_count(&self) -> usize {
        self.parameter_bindings
            .iter()
            .filter(|b| b.kind() == BindingKind::Trigger)
            .count()
    }
}

/// Runs one function through trigger, output and retry validation
pub struct FunctionBindingAssembler<'a> {
    registry: &'a GeneratorRegistry,
    cache: &'a SymbolCache,
    cancellation: Option<&'a CancellationToken>,
}

impl<'a> FunctionBindingAssembler<'a> {
    pub fn new(registry: &'a GeneratorRegistry, cache: &'a SymbolCache) -> Self {
        FunctionBindingAssembler {
            registry,
            cache,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: &'a CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Assemble a function, `None` for methods without the function annotation
    ///
    /// Cancellation is checked before each parameter and return-type property; a cancelled
    /// run returns an error and never a partial declaration.
    pub fn assemble(
        &self,
        function: &FunctionSymbol,
    ) -> Result<Option<AssemblyOutcome>, PipelineError> {
        self.check_cancelled()?;

        let function_name = match resolve_function_name(function) {
            Ok(Some(name)) => name,
            Ok(None) => {
                trace!("Skipping {}: no function annotation", function.method_name);
                return Ok(None);
            }
            Err(diagnostic) => {
                let mut assembly = Assembly::new(function, Arc::clone(&function.method_name));
                assembly.diagnostics.push(diagnostic);
                return Ok(Some(assembly.reject()));
            }
        };

        let mut assembly = Assembly::new(function, function_name);
        self.collect_triggers(&mut assembly)?;

        if function.is_async && function.return_type.name.as_ref() == VOID {
            let name = Arc::clone(&assembly.function_name);
            assembly.report(DiagnosticId::AsyncVoidIsNotAllowed, &[name.as_ref()]);
            return Ok(Some(assembly.reject()));
        }

        assembly.transition(AssemblyState::CollectingOutputs);
        self.collect_outputs(&mut assembly)?;

        assembly.transition(AssemblyState::Validating);
        Ok(Some(Self::validate(assembly)))
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        match self.cancellation {
            Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn generate(
        &self,
        annotation: &AnnotationSymbol,
        kind: BindingKind,
        target: BindingTarget<'_>,
    ) -> GeneratorOutput {
        self.registry.generate(&GeneratorContext {
            annotation,
            kind,
            target,
            cache: self.cache,
        })
    }

    fn collect_triggers(&self, assembly: &mut Assembly<'_>) -> Result<(), PipelineError> {
        let function = assembly.function;
        for parameter in &function.parameters {
            self.check_cancelled()?;

            let annotations: SmallVec<[&AnnotationSymbol; 2]> = parameter
                .annotations
                .iter()
                .filter(|a| {
                    let capabilities = self.cache.capabilities(a);
                    capabilities.is_binding && !capabilities.is_output
                })
                .collect();

            if annotations.len() > 1 {
                assembly.report(
                    DiagnosticId::MultipleBindingsGroupedTogether,
                    &["input or trigger", parameter.name.as_ref()],
                );
                continue;
            }

            let target = BindingTarget {
                name: &parameter.name,
                ty: &parameter.ty,
                location: parameter.location.as_ref().or(function.location.as_ref()),
            };
            for annotation in annotations {
                let kind = if self.cache.capabilities(annotation).is_input {
                    BindingKind::Input
                } else {
                    BindingKind::Trigger
                };
                let output = self.generate(annotation, kind, target);
                assembly.parameter_bindings.extend(output.bindings);
                assembly.diagnostics.extend(output.diagnostics);
            }
        }
        Ok(())
    }

    /// Output generators for every output annotation in `annotations`
    fn generate_outputs(
        &self,
        annotations: &[AnnotationSymbol],
        target: BindingTarget<'_>,
    ) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();
        for annotation in annotations
            .iter()
            .filter(|a| self.cache.capabilities(a).is_output)
        {
            output.merge(self.generate(annotation, BindingKind::Output, target));
        }
        output
    }

    fn collect_outputs(&self, assembly: &mut Assembly<'_>) -> Result<(), PipelineError> {
        let function = assembly.function;
        let location = function.location.as_ref();

        let classifier = TypeShapeClassifier::new(self.cache);
        let return_shape = match classifier.classify_at(&function.return_type, location) {
            Ok(parsed) => parsed,
            Err(diagnostic) => {
                assembly.diagnostics.push(diagnostic);
                return Ok(());
            }
        };

        let mut nested = GeneratorOutput::default();
        for property in &TypeShapeClassifier::raw_symbol(&function.return_type).properties {
            self.check_cancelled()?;

            let property_output = self.generate_outputs(
                &property.annotations,
                BindingTarget {
                    name: &property.name,
                    ty: &property.ty,
                    location: property.location.as_ref().or(location),
                },
            );
            if property_output.bindings.is_empty() {
                assembly.diagnostics.extend(property_output.diagnostics);
                continue;
            }
            if return_shape.is_collection() {
                assembly.diagnostics.extend(nested.diagnostics);
                assembly.diagnostics.extend(property_output.diagnostics);
                assembly.report(
                    DiagnosticId::InvalidBindingType,
                    &["IAsyncEnumerable or IEnumerable", "multi-binding return"],
                );
                return Ok(());
            }
            nested.merge(property_output);
        }

        let method_level = self.generate_outputs(
            &function.annotations,
            BindingTarget {
                name: RETURN_BINDING_NAME,
                ty: &function.return_type,
                location,
            },
        );

        if nested.bindings.is_empty() {
            assembly.output_bindings.extend(method_level.bindings);
            assembly.diagnostics.extend(method_level.diagnostics);
            return Ok(());
        }

        assembly.output_bindings.extend(nested.bindings);
        assembly.diagnostics.extend(nested.diagnostics);
        assembly.diagnostics.extend(method_level.diagnostics);
        if !method_level.bindings.is_empty() {
            let name = Arc::clone(&assembly.function_name);
            assembly.report(DiagnosticId::InconclusiveOutputBinding, &[name.as_ref()]);
        }
        Ok(())
    }

    fn validate(mut assembly: Assembly<'_>) -> AssemblyOutcome {
        if has_errors(&assembly.diagnostics) {
            return assembly.reject();
        }

        let trigger_count = assembly.trigger_count();
        if trigger_count != 1 {
            let count = trigger_count.to_string();
            assembly.report(DiagnosticId::InvalidInputTriggerCount, &[count.as_str()]);
            return assembly.reject();
        }

        // Every binding of the function has to opt in, not just the trigger
        let retry_supported = assembly
            .parameter_bindings
            .iter()
            .chain(&assembly.output_bindings)
            .all(Binding::is_retry_supported);
        let function = assembly.function;
        let resolver = RetryPolicyResolver::new(function.location.as_ref());
        match resolver.resolve(&function.annotations, retry_supported) {
            Ok(retry) => assembly.accept(retry),
            Err(diagnostic) => {
                assembly.diagnostics.push(diagnostic);
                assembly.reject()
            }
        }
    }
}

/// Name from the single function annotation
///
/// `Ok(None)` when the method carries no function annotation at all.
fn resolve_function_name(function: &FunctionSymbol) -> Result<Option<Arc<str>>, Diagnostic> {
    let mut attributes = function
        .annotations
        .iter()
        .filter(|a| a.is(WORKER_NAMESPACE, FUNCTION_ATTRIBUTE));
    let Some(attribute) = attributes.next() else {
        return Ok(None);
    };
    if attributes.next().is_some() {
        return Err(Diagnostic::new(
            DiagnosticId::InconclusiveAttribute,
            function.location.clone(),
            &[FUNCTION_ATTRIBUTE, function.method_name.as_ref()],
        ));
    }

    attribute
        .argument("name")
        .or_else(|| attribute.arguments.first().map(|a| &a.value))
        .and_then(ArgumentValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Some(Arc::from(name)))
        .ok_or_else(|| {
            Diagnostic::new(
                DiagnosticId::SymbolNotFound,
                function.location.clone(),
                &["Name"],
            )
        })
}

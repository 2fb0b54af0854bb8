//! Module-level generation driver
//!
//! Assembles every function of a module, then hands the accepted declarations to the
//! `MetadataEmitter`. Functions are assembled in parallel; the emitted list keeps the order in
//! which the host listed them.

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use fnmeta_manifest::diagnostics::has_errors;
use fnmeta_manifest::{Diagnostic, MetadataEmitter, ModuleContext, ProviderDocument};

use crate::assembler::{AssemblyOutcome, FunctionBindingAssembler};
use crate::cache::SymbolCache;
use crate::cancel::CancellationToken;
use crate::errors::PipelineError;
use crate::generator::GeneratorRegistry;
use crate::symbols::ModuleSymbols;

/// Everything one module run produced
#[derive(Debug)]
pub struct ModuleOutcome {
    pub assembly_name: Arc<str>,
    /// `None` when no function was accepted
    pub document: Option<ProviderDocument>,
    pub diagnostics: Vec<Diagnostic>,
    pub accepted: usize,
    pub rejected: usize,
}

impl ModuleOutcome {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

/// Runs the binding pipeline over whole modules
///
/// The symbol cache lives as long as the generator, so well-known types and annotation
/// classes are classified once across every module it processes.
pub struct ModuleGenerator {
    registry: GeneratorRegistry,
    cache: SymbolCache,
    cancellation: CancellationToken,
}

impl ModuleGenerator {
    pub fn new() -> Self {
        ModuleGenerator {
            registry: GeneratorRegistry::new(),
            cache: SymbolCache::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Token that cancels runs of this generator
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    /// Generate the provider document for one module
    pub fn run(
        &self,
        module: &ModuleSymbols,
        context: ModuleContext,
    ) -> Result<ModuleOutcome, PipelineError> {
        let start = Instant::now();
        info!(
            "Generating metadata for {} ({} candidate methods)",
            module.assembly_name,
            module.functions.len()
        );

        // 1. Assemble every function, order preserved by the indexed collect
        let assembler = FunctionBindingAssembler::new(&self.registry, &self.cache)
            .with_cancellation(&self.cancellation);
        let outcomes: Vec<Option<AssemblyOutcome>> = module
            .functions
            .par_iter()
            .map(|function| assembler.assemble(function))
            .collect::<Result<_, _>>()?;

        // 2. A cancel that raced the last function still discards the whole module
        if self.cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // 3. Split accepted declarations from surfaced diagnostics
        let mut declarations = Vec::new();
        let mut diagnostics = Vec::new();
        let mut rejected = 0;
        for outcome in outcomes.into_iter().flatten() {
            diagnostics.extend(outcome.diagnostics);
            match outcome.declaration {
                Some(declaration) => declarations.push(declaration),
                None => rejected += 1,
            }
        }

        // 4. Emit
        let accepted = declarations.len();
        let document = MetadataEmitter::new(context).emit(&declarations)?;

        debug!(
            "Module {}: {} accepted, {} rejected, {} diagnostics in {:.2}ms",
            module.assembly_name,
            accepted,
            rejected,
            diagnostics.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ModuleOutcome {
            assembly_name: Arc::clone(&module.assembly_name),
            document,
            diagnostics,
            accepted,
            rejected,
        })
    }
}

impl Default for ModuleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{
        BINDING_BASE, CARDINALITY_MARKER, ENUMERABLE, FUNCTION_ATTRIBUTE, GENERIC_ENUMERABLE,
        TRIGGER_BINDING_BASE, WORKER_NAMESPACE,
    };
    use crate::symbols::{AnnotationSymbol, ArgumentValue, FunctionSymbol, ParameterSymbol, TypeSymbol};

    fn text(value: &str) -> ArgumentValue {
        ArgumentValue::String(Arc::from(value))
    }

    fn service_bus_function(function_name: &str, method_name: &str) -> FunctionSymbol {
        let element = TypeSymbol::named("string");
        let messages = TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element.clone()]).with_interfaces(vec![
            TypeSymbol::named(ENUMERABLE),
            TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element]),
        ]);
        let trigger = AnnotationSymbol::new(WORKER_NAMESPACE, "ServiceBusTriggerAttribute")
            .with_base_type(TRIGGER_BINDING_BASE)
            .with_base_type(BINDING_BASE)
            .with_interface(CARDINALITY_MARKER)
            .with_argument("queueName", text("queueName"))
            .with_named_argument("IsBatched", ArgumentValue::Bool(true));

        FunctionSymbol {
            method_name: Arc::from(method_name),
            containing_type: Arc::from("TestProject.ServiceBusFunctions"),
            annotations: vec![AnnotationSymbol::new(WORKER_NAMESPACE, FUNCTION_ATTRIBUTE)
                .with_argument("name", text(function_name))],
            parameters: vec![ParameterSymbol {
                name: Arc::from("value"),
                ty: messages,
                annotations: vec![trigger],
                location: None,
            }],
            return_type: TypeSymbol::void(),
            is_async: false,
            location: None,
        }
    }

    fn module(functions: Vec<FunctionSymbol>) -> ModuleSymbols {
        ModuleSymbols {
            assembly_name: Arc::from("TestProject"),
            script_file: None,
            functions,
        }
    }

    #[test]
    fn test_service_bus_module_emits_rich_form() {
        let generator = ModuleGenerator::new();
        let Ok(outcome) = generator.run(
            &module(vec![service_bus_function("Run", "Run")]),
            ModuleContext::new("TestProject"),
        ) else {
            panic!("module run should succeed");
        };
        assert!(!outcome.has_errors());
        assert_eq!((outcome.accepted, outcome.rejected), (1, 0));

        let Some(document) = outcome.document else {
            panic!("one accepted function emits a document");
        };
        assert_eq!(document.namespace.as_ref(), "AzureFunctionInternals.TestProject");
        let function = &document.functions[0];
        assert_eq!(function.function_id.as_deref(), Some("2882587761"));
        assert_eq!(function.script_file.as_ref(), "TestProject.dll");
        assert!(function.is_rich());
        assert!(function.raw_bindings[0].contains(r#""cardinality":"Many""#));
    }

    #[test]
    fn test_rejected_functions_keep_siblings_and_order() {
        let mut broken = service_bus_function("Broken", "Broken");
        broken.parameters[0].annotations.clear();

        let generator = ModuleGenerator::new();
        let Ok(outcome) = generator.run(
            &module(vec![
                service_bus_function("First", "First"),
                broken,
                service_bus_function("Second", "Second"),
            ]),
            ModuleContext::new("TestProject"),
        ) else {
            panic!("module run should succeed");
        };
        assert!(outcome.has_errors());
        assert_eq!((outcome.accepted, outcome.rejected), (2, 1));

        let names: Vec<String> = outcome
            .document
            .map(|d| d.functions.iter().map(|f| f.name.to_string()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_no_accepted_functions_emits_nothing() {
        let generator = ModuleGenerator::new();
        let result = generator.run(&module(Vec::new()), ModuleContext::new("TestProject"));
        assert!(result.is_ok_and(|outcome| outcome.document.is_none()));
    }

    #[test]
    fn test_cancelled_run_has_no_output() {
        let token = CancellationToken::new();
        let generator = ModuleGenerator::new().with_cancellation(token.clone());
        token.cancel();
        let result = generator.run(
            &module(vec![service_bus_function("Run", "Run")]),
            ModuleContext::new("TestProject"),
        );
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_cache_is_shared_across_functions() {
        let generator = ModuleGenerator::new();
        let functions = (0..4)
            .map(|i| service_bus_function(&format!("F{}", i), &format!("M{}", i)))
            .collect();
        let result = generator.run(&module(functions), ModuleContext::new("TestProject"));
        assert!(result.is_ok());
        assert_eq!(generator.cache().annotation_count(), 2);
    }
}

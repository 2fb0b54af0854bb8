//! Binding classification and function assembly
//!
//! This crate turns host symbol documents into validated function declarations:
//! 1. Classifying declared types into awaitable / enumerable shapes
//! 2. Generating bindings from annotations through a registry keyed by kind tag
//! 3. Assembling each function and enforcing trigger and output arity
//! 4. Resolving the function-level retry policy
//! 5. Driving whole modules in parallel and emitting their provider documents
//!
//! Problems in user code are reported as `Diagnostic`s and only reject the owning function.
pub mod assembler;
pub mod cache;
pub mod cancel;
pub mod classifier;
pub mod errors;
pub mod generator;
pub mod input;
pub mod naming;
pub mod pipeline;
pub mod retry;
pub mod symbols;

pub use assembler::{AssemblyOutcome, AssemblyState, FunctionBindingAssembler};
pub use cache::{AnnotationCapabilities, SymbolCache};
pub use cancel::CancellationToken;
pub use classifier::{ShapeError, TypeShapeClassifier};
pub use errors::PipelineError;
pub use generator::{
    BindingGenerator, BindingTarget, DefaultBindingGenerator, GeneratorContext, GeneratorOutput,
    GeneratorRegistry, HttpTriggerGenerator,
};
pub use input::{discover_modules, load_module};
pub use pipeline::{ModuleGenerator, ModuleOutcome};
pub use retry::RetryPolicyResolver;
pub use symbols::{
    AnnotationSymbol, ArgumentValue, FunctionSymbol, ModuleSymbols, ParameterSymbol,
    PropertySymbol, TypeSymbol,
};

//! fnmeta Manifest
//!
//! This crate holds the data model shared by every stage of binding metadata generation:
//! classified types, bindings, function declarations, retry policies and diagnostics.
//!
//! It also owns the output side of the pipeline: the deterministic function identity hash,
//! the per-module provider document, and the aggregator that merges providers from several
//! modules into one function list.

pub mod binding_info;
pub mod diagnostics;
pub mod document;
pub mod emitter;
pub mod errors;
pub mod hash;
pub mod metadata;
pub mod provider;
pub mod timespan;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticId, Severity};
pub use emitter::{MetadataEmitter, ModuleContext};
pub use errors::ManifestError;
pub use hash::FunctionIdentityHasher;
pub use metadata::{FunctionMetadata, GeneratedBinding, ProviderDocument};
pub use provider::{FileProvider, MetadataAggregator, MetadataProvider, StaticProvider};
pub use types::{
    Binding, BindingDirection, BindingKind, DataTypeHint, FunctionDeclaration, ParsedType,
    PropertyMap, RetryPolicy,
};

// Re-export document helpers for custom paths
pub use document::{read_from_path, write_to_path};

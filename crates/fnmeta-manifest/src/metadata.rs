//! Emitted metadata records
//!
//! These are the serialized shapes consumed by the function host: structured generated
//! bindings, per-function records in rich or minimal form, and the per-module provider
//! document that groups them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{BindingDirection, DataTypeHint, PropertyMap, RetryPolicy};

/// Worker language reported for every emitted function
pub const LANGUAGE: &str = "dotnet-isolated";

/// Structured binding record, present only in the rich form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBinding {
    pub name: Arc<str>,
    pub direction: BindingDirection,
    pub binding_type: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataTypeHint>,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
}

/// Metadata for one function
///
/// The rich form carries `functionId`, `isProxy`, `managedDependencyEnabled` and
/// `generatedBindings`. The minimal form leaves them out and the host re-derives what it
/// needs from `rawBindings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_id: Option<Arc<str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_proxy: Option<bool>,
    pub language: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_dependency_enabled: Option<bool>,
    pub name: Arc<str>,
    pub entry_point: Arc<str>,
    pub script_file: Arc<str>,
    #[serde(default)]
    pub raw_bindings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_bindings: Option<Vec<GeneratedBinding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl FunctionMetadata {
    pub fn is_rich(&self) -> bool {
        self.generated_bindings.is_some()
    }
}

/// Per-module provider, the unit the aggregator merges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDocument {
    pub namespace: Arc<str>,
    pub assembly_name: Arc<str>,
    #[serde(default)]
    pub auto_register: bool,
    pub generated_at: Arc<str>,
    #[serde(default)]
    pub functions: Vec<FunctionMetadata>,
}

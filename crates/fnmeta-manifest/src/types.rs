//! Data model for classified types, bindings and function declarations
//!
//! This module provides:
//! - ParsedType and DataTypeHint describing the shape of a declared type
//! - PropertyMap, an insertion-ordered string map used for binding entries
//! - Binding records produced by binding generators
//! - FunctionDeclaration and RetryPolicy produced by the assembler

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::metadata::GeneratedBinding;
use crate::timespan;

/// Well-known binding entry keys. These never appear in generated `properties`.
pub const NAME_KEY: &str = "name";
pub const TYPE_KEY: &str = "type";
pub const DIRECTION_KEY: &str = "direction";

// =============================================================================
// PARSED TYPE
// =============================================================================

/// Shape of a declared parameter or return type after classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedType {
    /// Element type name with any awaitable wrapper removed
    pub raw_type: Arc<str>,
    /// Type name as declared, wrapper included
    pub full_type: Arc<str>,
    #[serde(default)]
    pub is_awaitable: bool,
    #[serde(default)]
    pub is_enumerable: bool,
    #[serde(default)]
    pub is_async_enumerable: bool,
}

impl ParsedType {
    /// A type with no wrapper and no collection shape
    pub fn plain(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        ParsedType {
            raw_type: Arc::clone(&name),
            full_type: name,
            is_awaitable: false,
            is_enumerable: false,
            is_async_enumerable: false,
        }
    }

    /// True when the declared type was an awaitable wrapper
    pub fn is_async_operation(&self) -> bool {
        self.is_awaitable
    }

    /// Either kind of collection shape
    pub fn is_collection(&self) -> bool {
        self.is_enumerable || self.is_async_enumerable
    }

    pub fn data_type_hint(&self) -> DataTypeHint {
        DataTypeHint::from_type_name(&self.raw_type)
    }
}

// =============================================================================
// DATA TYPE HINT
// =============================================================================

/// Coarse payload type reported to the host for a binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeHint {
    String,
    Binary,
    #[default]
    Undefined,
}

impl DataTypeHint {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "string" | "string[]" => DataTypeHint::String,
            "byte" | "byte[]" | "byte[][]" | "System.ReadOnlyMemory<byte>" => DataTypeHint::Binary,
            _ => DataTypeHint::Undefined,
        }
    }

    /// Case-insensitive parse of a serialized hint
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [
            DataTypeHint::String,
            DataTypeHint::Binary,
            DataTypeHint::Undefined,
        ]
        .into_iter()
        .find(|hint| hint.as_str().eq_ignore_ascii_case(value))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataTypeHint::String => "String",
            DataTypeHint::Binary => "Binary",
            DataTypeHint::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for DataTypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BINDING KIND / DIRECTION
// =============================================================================

/// Role a binding plays for its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Trigger,
    Input,
    Output,
}

impl BindingKind {
    pub fn default_direction(&self) -> BindingDirection {
        match self {
            BindingKind::Trigger | BindingKind::Input => BindingDirection::In,
            BindingKind::Output => BindingDirection::Out,
        }
    }
}

/// Data flow direction of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingDirection {
    In,
    Out,
    InOut,
}

impl BindingDirection {
    /// Case-insensitive parse, as hosts accept `in`, `In` and `IN`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [
            BindingDirection::In,
            BindingDirection::Out,
            BindingDirection::InOut,
        ]
        .into_iter()
        .find(|direction| direction.as_str().eq_ignore_ascii_case(value))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingDirection::In => "In",
            BindingDirection::Out => "Out",
            BindingDirection::InOut => "InOut",
        }
    }
}

impl fmt::Display for BindingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PROPERTY MAP - Insertion ordered, inline for typical binding sizes
// =============================================================================

/// Ordered string-to-string map
///
/// Keys keep their first insertion position; inserting an existing key replaces its value
/// in place. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: SmallVec<[(Arc<str>, Arc<str>); 8]>,
}

impl PropertyMap {
    pub fn new() -> Self {
        PropertyMap::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(
        &mut self,
        key: impl Into<Arc<str>>,
        value: impl Into<Arc<str>>,
    ) -> Option<Arc<str>> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<str>> {
        let idx = self.entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_ref())
    }

    /// Copy of this map without the given keys, order preserved
    pub fn without(&self, keys: &[&str]) -> PropertyMap {
        PropertyMap {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_ref()))
                .cloned()
                .collect(),
        }
    }

    /// Compact JSON object text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyMap
where
    K: Into<Arc<str>>,
    V: Into<Arc<str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_ref(), value.as_ref())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string properties")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PropertyMap, A::Error> {
                let mut properties = PropertyMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    properties.insert(key, value);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}

// =============================================================================
// BINDING
// =============================================================================

/// One validated binding of a function
///
/// Built in a single step by a binding generator and never mutated afterwards.
/// `properties` holds the full entry map, including `name`, `type` and `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    name: Arc<str>,
    kind: BindingKind,
    declared_type: ParsedType,
    data_type: DataTypeHint,
    is_retry_supported: bool,
    is_parsable: bool,
    properties: PropertyMap,
}

impl Binding {
    /// Create a binding whose data type hint is derived from `declared_type`
    pub fn new(
        name: impl Into<Arc<str>>,
        kind: BindingKind,
        declared_type: ParsedType,
        properties: PropertyMap,
    ) -> Self {
        let data_type = declared_type.data_type_hint();
        Binding {
            name: name.into(),
            kind,
            declared_type,
            data_type,
            is_retry_supported: false,
            is_parsable: true,
            properties,
        }
    }

    /// Override the hint, used when batching unwraps the per-item type
    pub fn with_data_type(mut self, data_type: DataTypeHint) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_retry_support(mut self, supported: bool) -> Self {
        self.is_retry_supported = supported;
        self
    }

    pub fn with_parsable(mut self, parsable: bool) -> Self {
        self.is_parsable = parsable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn declared_type(&self) -> &ParsedType {
        &self.declared_type
    }

    pub fn data_type(&self) -> DataTypeHint {
        self.data_type
    }

    pub fn is_retry_supported(&self) -> bool {
        self.is_retry_supported
    }

    /// False when the binding shape could not be resolved statically
    pub fn is_parsable(&self) -> bool {
        self.is_parsable
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn binding_type(&self) -> &str {
        self.properties.get(TYPE_KEY).unwrap_or_default()
    }

    pub fn direction(&self) -> BindingDirection {
        self.properties
            .get(DIRECTION_KEY)
            .and_then(BindingDirection::parse)
            .unwrap_or_else(|| self.kind.default_direction())
    }

    /// Full entry map as compact JSON
    pub fn raw_json(&self) -> Result<String, serde_json::Error> {
        self.properties.to_json()
    }

    /// Structured form with the well-known keys lifted out of `properties`
    pub fn generated_form(&self) -> GeneratedBinding {
        GeneratedBinding {
            name: Arc::clone(&self.name),
            direction: self.direction(),
            binding_type: Arc::from(self.binding_type()),
            data_type: Some(self.data_type),
            properties: self.properties.without(&[NAME_KEY, TYPE_KEY, DIRECTION_KEY]),
        }
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Function-level retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RetryPolicy {
    FixedDelay {
        max_retry_count: u32,
        #[serde(with = "timespan::serde_interval")]
        delay_interval: Duration,
    },
    ExponentialBackoff {
        max_retry_count: u32,
        #[serde(with = "timespan::serde_interval")]
        minimum_interval: Duration,
        #[serde(with = "timespan::serde_interval")]
        maximum_interval: Duration,
    },
}

impl RetryPolicy {
    pub fn max_retry_count(&self) -> u32 {
        match self {
            RetryPolicy::FixedDelay {
                max_retry_count, ..
            }
            | RetryPolicy::ExponentialBackoff {
                max_retry_count, ..
            } => *max_retry_count,
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::FixedDelay {
                max_retry_count,
                delay_interval,
            } => write!(
                f,
                "FixedDelay {}, {}",
                max_retry_count,
                timespan::format_interval(*delay_interval)
            ),
            RetryPolicy::ExponentialBackoff {
                max_retry_count,
                minimum_interval,
                maximum_interval,
            } => write!(
                f,
                "ExponentialBackoff {}, {} to {}",
                max_retry_count,
                timespan::format_interval(*minimum_interval),
                timespan::format_interval(*maximum_interval)
            ),
        }
    }
}

// =============================================================================
// FUNCTION DECLARATION
// =============================================================================

/// A fully validated function, ready for emission
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub function_name: Arc<str>,
    pub method_name: Arc<str>,
    pub containing_type_name: Arc<str>,
    pub bindings: Vec<Binding>,
    pub retry: Option<RetryPolicy>,
}

impl FunctionDeclaration {
    pub fn trigger(&self) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.kind() == BindingKind::Trigger)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Binding> {
        self.bindings
            .iter()
            .filter(|b| b.kind() == BindingKind::Output)
    }

    /// Every binding resolved to a known shape, so the rich form can be emitted
    pub fn is_parsable(&self) -> bool {
        self.bindings.iter().all(Binding::is_parsable)
    }
}

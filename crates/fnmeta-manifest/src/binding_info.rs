//! Host-side binding resolution
//!
//! Resolves emitted function metadata back into per-binding descriptors the way a host does
//! when it loads a provider: rich records through `generatedBindings`, minimal records by
//! parsing every raw binding. Used to validate documents before they are shipped.

use ahash::AHashSet;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::ManifestError;
use crate::metadata::{FunctionMetadata, GeneratedBinding};
use crate::types::{BindingDirection, DataTypeHint, PropertyMap, DIRECTION_KEY, NAME_KEY, TYPE_KEY};

const DATA_TYPE_KEY: &str = "dataType";

/// Binding descriptor as seen by the host
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    pub name: Arc<str>,
    pub direction: BindingDirection,
    pub binding_type: Arc<str>,
    pub data_type: Option<DataTypeHint>,
    pub properties: PropertyMap,
}

/// Resolve every binding of a function, keyed by binding name in declaration order
pub fn resolve_bindings(function: &FunctionMetadata) -> Result<Vec<BindingInfo>, ManifestError> {
    let bindings = match &function.generated_bindings {
        Some(generated) => generated
            .iter()
            .map(from_generated)
            .collect::<Result<Vec<_>, _>>()?,
        None => function
            .raw_bindings
            .iter()
            .map(|raw| parse_raw_binding(raw))
            .collect::<Result<Vec<_>, _>>()?,
    };

    if bindings.is_empty() {
        return Err(ManifestError::NoBindings);
    }

    let mut seen = AHashSet::with_capacity(bindings.len());
    for binding in &bindings {
        if !seen.insert(Arc::clone(&binding.name)) {
            return Err(ManifestError::DuplicateBinding(binding.name.to_string()));
        }
    }

    Ok(bindings)
}

/// Parse one raw binding JSON object
pub fn parse_raw_binding(json: &str) -> Result<BindingInfo, ManifestError> {
    let Value::Object(entries) = serde_json::from_str::<Value>(json)? else {
        return Err(ManifestError::MissingDirectionOrType);
    };

    let direction = entries
        .get(DIRECTION_KEY)
        .and_then(json_text)
        .and_then(|text| BindingDirection::parse(&text))
        .ok_or(ManifestError::MissingDirectionOrType)?;
    let binding_type = entries
        .get(TYPE_KEY)
        .and_then(json_text)
        .ok_or(ManifestError::MissingDirectionOrType)?;

    let data_type = match entries.get(DATA_TYPE_KEY) {
        Some(value) => Some(parse_data_type(json_text(value).as_deref())?),
        None => None,
    };

    let properties = entries
        .iter()
        .filter(|(key, _)| ![NAME_KEY, TYPE_KEY, DIRECTION_KEY, DATA_TYPE_KEY].contains(&key.as_str()))
        .filter_map(|(key, value)| json_text(value).map(|text| (key.clone(), text)))
        .collect();

    Ok(BindingInfo {
        name: Arc::from(entries.get(NAME_KEY).and_then(json_text).unwrap_or_default()),
        direction,
        binding_type: Arc::from(binding_type),
        data_type,
        properties,
    })
}

fn from_generated(binding: &GeneratedBinding) -> Result<BindingInfo, ManifestError> {
    let data_type = binding
        .data_type
        .ok_or_else(|| ManifestError::InvalidDataType(String::new()))?;

    Ok(BindingInfo {
        name: Arc::clone(&binding.name),
        direction: binding.direction,
        binding_type: Arc::clone(&binding.binding_type),
        data_type: Some(data_type),
        properties: binding.properties.clone(),
    })
}

fn parse_data_type(text: Option<&str>) -> Result<DataTypeHint, ManifestError> {
    text.and_then(DataTypeHint::parse)
        .ok_or_else(|| ManifestError::InvalidDataType(text.unwrap_or_default().to_string()))
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::LANGUAGE;

    fn minimal(raw_bindings: &[&str]) -> FunctionMetadata {
        FunctionMetadata {
            function_id: None,
            is_proxy: None,
            language: Arc::from(LANGUAGE),
            managed_dependency_enabled: None,
            name: Arc::from("F"),
            entry_point: Arc::from("F"),
            script_file: Arc::from("App.dll"),
            raw_bindings: raw_bindings.iter().map(|s| s.to_string()).collect(),
            generated_bindings: None,
            retry: None,
        }
    }

    #[test]
    fn test_parse_raw_binding() {
        let parsed = parse_raw_binding(
            r#"{"name":"req","type":"httpTrigger","direction":"in","methods":"[\"get\"]","dataType":"string"}"#,
        );
        let Ok(info) = parsed else {
            panic!("raw binding should parse");
        };
        assert_eq!(info.name.as_ref(), "req");
        assert_eq!(info.direction, BindingDirection::In);
        assert_eq!(info.binding_type.as_ref(), "httpTrigger");
        assert_eq!(info.data_type, Some(DataTypeHint::String));
        assert_eq!(info.properties.get("methods"), Some(r#"["get"]"#));
    }

    #[test]
    fn test_raw_binding_requires_direction_and_type() {
        let missing_direction = parse_raw_binding(r#"{"name":"a","type":"queue"}"#);
        assert!(matches!(
            missing_direction,
            Err(ManifestError::MissingDirectionOrType)
        ));

        let bad_direction = parse_raw_binding(r#"{"name":"a","type":"queue","direction":"up"}"#);
        assert!(matches!(bad_direction, Err(ManifestError::MissingDirectionOrType)));

        let missing_type = parse_raw_binding(r#"{"name":"a","direction":"Out"}"#);
        assert!(matches!(missing_type, Err(ManifestError::MissingDirectionOrType)));
    }

    #[test]
    fn test_raw_binding_rejects_unknown_data_type() {
        let parsed =
            parse_raw_binding(r#"{"name":"a","type":"queue","direction":"Out","dataType":"Xml"}"#);
        assert!(matches!(parsed, Err(ManifestError::InvalidDataType(ref v)) if v == "Xml"));
    }

    #[test]
    fn test_function_without_bindings() {
        assert!(matches!(
            resolve_bindings(&minimal(&[])),
            Err(ManifestError::NoBindings)
        ));
        assert_eq!(
            ManifestError::NoBindings.to_string(),
            "At least one binding must be declared in a Function."
        );
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let function = minimal(&[
            r#"{"name":"a","type":"queueTrigger","direction":"In"}"#,
            r#"{"name":"a","type":"queue","direction":"Out"}"#,
        ]);
        assert!(matches!(
            resolve_bindings(&function),
            Err(ManifestError::DuplicateBinding(ref name)) if name == "a"
        ));
    }

    #[test]
    fn test_generated_bindings_need_data_type() {
        let mut function = minimal(&[]);
        function.generated_bindings = Some(vec![GeneratedBinding {
            name: Arc::from("a"),
            direction: BindingDirection::In,
            binding_type: Arc::from("queueTrigger"),
            data_type: None,
            properties: PropertyMap::new(),
        }]);
        assert!(matches!(
            resolve_bindings(&function),
            Err(ManifestError::InvalidDataType(_))
        ));

        if let Some(generated) = function.generated_bindings.as_mut() {
            generated[0].data_type = Some(DataTypeHint::Undefined);
        }
        let resolved = resolve_bindings(&function).unwrap_or_default();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].data_type, Some(DataTypeHint::Undefined));
    }
}

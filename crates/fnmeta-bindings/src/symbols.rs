//! Host symbol model
//!
//! The compiler host exports one `ModuleSymbols` document per module. It describes every
//! candidate method with its annotations, parameters and return type. Types carry just enough
//! structure for shape classification: a display name, the generic definition, type arguments,
//! array element type, the transitive interface list and (for return types) the properties.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::naming::{self, ENUMERABLE, GENERIC_ENUMERABLE, VOID};

// =============================================================================
// TYPES
// =============================================================================

/// A type as seen at one declaration site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSymbol {
    /// Display name, type arguments included (`System.Threading.Tasks.Task<string>`)
    pub name: Arc<str>,
    /// Fully qualified generic definition without type arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Arc<str>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeSymbol>,
    /// Element type, arrays only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<TypeSymbol>>,
    /// Every implemented interface, transitively
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertySymbol>,
}

impl TypeSymbol {
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        TypeSymbol {
            name: name.into(),
            ..TypeSymbol::default()
        }
    }

    pub fn void() -> Self {
        TypeSymbol::named(VOID)
    }

    /// Constructed generic such as `System.Collections.Generic.IEnumerable<string>`
    pub fn generic(definition: &str, type_arguments: Vec<TypeSymbol>) -> Self {
        let arguments = type_arguments
            .iter()
            .map(|t| t.name.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        TypeSymbol {
            name: Arc::from(format!("{}<{}>", definition, arguments)),
            definition: Some(Arc::from(definition)),
            type_arguments,
            ..TypeSymbol::default()
        }
    }

    /// Array of `element`, implementing both enumerable interfaces
    pub fn array(element: TypeSymbol) -> Self {
        TypeSymbol {
            name: Arc::from(format!("{}[]", element.name)),
            interfaces: vec![
                TypeSymbol::named(ENUMERABLE),
                TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element.clone()]),
            ],
            element_type: Some(Box::new(element)),
            ..TypeSymbol::default()
        }
    }

    pub fn with_interfaces(mut self, interfaces: Vec<TypeSymbol>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_properties(mut self, properties: Vec<PropertySymbol>) -> Self {
        self.properties = properties;
        self
    }

    /// Generic definition when known, otherwise the display name
    pub fn definition_name(&self) -> &str {
        self.definition.as_deref().unwrap_or(&self.name)
    }

    pub fn is_array(&self) -> bool {
        self.element_type.is_some()
    }

    /// The single type argument when this type is `definition<T>`
    pub fn generic_argument_of(&self, definition: &str) -> Option<&TypeSymbol> {
        match self.type_arguments.as_slice() {
            [argument] if self.definition_name() == definition => Some(argument),
            _ => None,
        }
    }

    pub fn implements(&self, definition: &str) -> bool {
        self.interfaces
            .iter()
            .any(|i| i.definition_name() == definition)
    }

    /// This type and its interfaces that are `definition<T>` with exactly one argument
    pub fn generic_implementations<'a>(
        &'a self,
        definition: &'a str,
    ) -> impl Iterator<Item = &'a TypeSymbol> + 'a {
        std::iter::once(self)
            .chain(self.interfaces.iter())
            .filter(move |t| t.generic_argument_of(definition).is_some())
    }
}

/// Property of a return type, candidate for a nested output binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySymbol {
    pub name: Arc<str>,
    #[serde(rename = "type")]
    pub ty: TypeSymbol,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationSymbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Arc<str>>,
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// Constant value of an annotation argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    content = "value",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ArgumentValue {
    Null,
    String(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Type reference, carried by its display name
    Type(Arc<str>),
    /// `member` is absent when the value matches no declared member
    Enum {
        type_name: Arc<str>,
        #[serde(default)]
        member: Option<Arc<str>>,
    },
    Array(Vec<ArgumentValue>),
    /// Expression the host could not evaluate, kept as source text
    Unresolved(Arc<str>),
}

impl ArgumentValue {
    /// Text stored in a binding entry, `None` when the value cannot be serialized
    pub fn to_binding_text(&self) -> Option<String> {
        match self {
            ArgumentValue::String(text) | ArgumentValue::Type(text) => Some(text.to_string()),
            ArgumentValue::Int(value) => Some(value.to_string()),
            ArgumentValue::Float(value) => Some(value.to_string()),
            ArgumentValue::Bool(value) => Some(value.to_string()),
            ArgumentValue::Enum { member, .. } => member.as_ref().map(|m| m.to_string()),
            ArgumentValue::Array(items) => {
                let items = items
                    .iter()
                    .map(ArgumentValue::to_binding_text)
                    .collect::<Option<Vec<_>>>()?;
                serde_json::to_string(&items).ok()
            }
            ArgumentValue::Null | ArgumentValue::Unresolved(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Integer value; numeric strings are accepted as well
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgumentValue::Int(value) => Some(*value),
            ArgumentValue::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionalArgument {
    /// Constructor parameter name
    pub parameter: Arc<str>,
    pub value: ArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedArgument {
    pub name: Arc<str>,
    pub value: ArgumentValue,
}

/// One annotation occurrence together with facts about its class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSymbol {
    /// Simple class name (`ServiceBusTriggerAttribute`)
    pub class_name: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Arc<str>>,
    /// Fully qualified base classes, nearest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_types: Vec<Arc<str>>,
    /// Fully qualified interfaces implemented by the class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Arc<str>>,
    /// Annotations declared on the annotation class itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_annotations: Vec<AnnotationSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PositionalArgument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named_arguments: Vec<NamedArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Arc<str>>,
}

impl AnnotationSymbol {
    pub fn new(namespace: &str, class_name: &str) -> Self {
        AnnotationSymbol {
            class_name: Arc::from(class_name),
            namespace: Some(Arc::from(namespace)),
            ..AnnotationSymbol::default()
        }
    }

    pub fn with_argument(mut self, parameter: &str, value: ArgumentValue) -> Self {
        self.arguments.push(PositionalArgument {
            parameter: Arc::from(parameter),
            value,
        });
        self
    }

    pub fn with_named_argument(mut self, name: &str, value: ArgumentValue) -> Self {
        self.named_arguments.push(NamedArgument {
            name: Arc::from(name),
            value,
        });
        self
    }

    pub fn with_base_type(mut self, base_type: &str) -> Self {
        self.base_types.push(Arc::from(base_type));
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(Arc::from(interface));
        self
    }

    pub fn with_class_annotation(mut self, annotation: AnnotationSymbol) -> Self {
        self.class_annotations.push(annotation);
        self
    }

    pub fn qualified_name(&self) -> String {
        naming::qualify(self.namespace.as_deref(), &self.class_name)
    }

    pub fn is(&self, namespace: &str, class_name: &str) -> bool {
        self.class_name.as_ref() == class_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Registry key and binding `type` value
    pub fn kind_tag(&self) -> String {
        naming::binding_type_tag(&self.class_name)
    }

    pub fn inherits_from(&self, qualified_name: &str) -> bool {
        self.base_types.iter().any(|b| b.as_ref() == qualified_name)
    }

    pub fn implements(&self, qualified_name: &str) -> bool {
        self.interfaces.iter().any(|i| i.as_ref() == qualified_name)
    }

    /// Positional argument by constructor parameter name, then named argument
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments
            .iter()
            .find(|a| a.parameter.eq_ignore_ascii_case(name))
            .map(|a| &a.value)
            .or_else(|| {
                self.named_arguments
                    .iter()
                    .find(|a| a.name.eq_ignore_ascii_case(name))
                    .map(|a| &a.value)
            })
    }

    /// Positional arguments in declaration order, then named arguments
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.arguments
            .iter()
            .map(|a| (a.parameter.as_ref(), &a.value))
            .chain(
                self.named_arguments
                    .iter()
                    .map(|a| (a.name.as_ref(), &a.value)),
            )
    }
}

// =============================================================================
// FUNCTIONS AND MODULES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSymbol {
    pub name: Arc<str>,
    #[serde(rename = "type")]
    pub ty: TypeSymbol,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationSymbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Arc<str>>,
}

/// A candidate method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSymbol {
    pub method_name: Arc<str>,
    /// Fully qualified containing type
    pub containing_type: Arc<str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSymbol>,
    #[serde(default = "TypeSymbol::void")]
    pub return_type: TypeSymbol,
    /// Declared with the async modifier
    #[serde(default)]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Arc<str>>,
}

/// Everything the host exported for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSymbols {
    pub assembly_name: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_file: Option<Arc<str>>,
    #[serde(default)]
    pub functions: Vec<FunctionSymbol>,
}

//! Type shape classification
//!
//! Classification runs in three steps:
//! 1. Shortcuts for `void`, `string` and the bare awaitable wrappers
//! 2. One level of `Task<T>` / `ValueTask<T>` unwrapping, shape computed on `T`
//! 3. Direct classification for everything else
//!
//! An awaitable around an async-enumerable is rejected, never unwrapped twice.

use smallvec::SmallVec;
use std::sync::Arc;

use fnmeta_manifest::{Diagnostic, DiagnosticId, ParsedType};

use crate::cache::SymbolCache;
use crate::naming::{ASYNC_ENUMERABLE, AWAITABLE_WRAPPERS, ENUMERABLE, GENERIC_ENUMERABLE, STRING, VOID};
use crate::symbols::TypeSymbol;

/// Why a type cannot take the shape a binding requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// `Task<IAsyncEnumerable<T>>` and friends
    AwaitedAsyncEnumerable { full_type: Arc<str> },
    /// More than one distinct element type for batched unwrapping
    AmbiguousElementType { interface: &'static str },
    /// Batched binding on something that is not a collection
    NotACollection { type_name: Arc<str> },
}

impl ShapeError {
    pub fn into_diagnostic(self, location: Option<Arc<str>>) -> Diagnostic {
        match self {
            ShapeError::AwaitedAsyncEnumerable { full_type } => Diagnostic::new(
                DiagnosticId::InvalidBindingType,
                location,
                &[full_type.as_ref(), "return"],
            ),
            ShapeError::AmbiguousElementType { interface } => {
                let subject = format!("more than 1 implementation of {}", interface);
                Diagnostic::new(
                    DiagnosticId::InvalidBindingType,
                    location,
                    &[subject.as_str(), "batched trigger"],
                )
            }
            ShapeError::NotACollection { type_name } => Diagnostic::new(
                DiagnosticId::InvalidCardinality,
                location,
                &[type_name.as_ref()],
            ),
        }
    }
}

/// Classifies declared types, memoizing through a shared `SymbolCache`
pub struct TypeShapeClassifier<'a> {
    cache: &'a SymbolCache,
}

impl<'a> TypeShapeClassifier<'a> {
    pub fn new(cache: &'a SymbolCache) -> Self {
        TypeShapeClassifier { cache }
    }

    pub fn classify(&self, ty: &TypeSymbol) -> Result<ParsedType, ShapeError> {
        if let Some(parsed) = self.cache.parsed_type(&ty.name) {
            return Ok(parsed);
        }
        let parsed = shape(ty)?;
        Ok(self.cache.remember_type(&ty.name, parsed))
    }

    /// Classify, reporting failures as a diagnostic at `location`
    pub fn classify_at(
        &self,
        ty: &TypeSymbol,
        location: Option<&Arc<str>>,
    ) -> Result<ParsedType, Diagnostic> {
        self.classify(ty)
            .map_err(|e| e.into_diagnostic(location.cloned()))
    }

    /// The symbol `raw_type` refers to: `T` for `Task<T>` / `ValueTask<T>`, else `ty` itself
    pub fn raw_symbol(ty: &TypeSymbol) -> &TypeSymbol {
        awaited_inner(ty).unwrap_or(ty)
    }

    /// Per-item type of a batched binding
    ///
    /// Awaitable wrappers are looked through first. Async-enumerables yield their `T`, arrays
    /// their element type, other enumerables the `T` of their single `IEnumerable<T>`.
    pub fn batched_element<'t>(
        ty: &'t TypeSymbol,
        parsed: &ParsedType,
    ) -> Result<&'t TypeSymbol, ShapeError> {
        let ty = Self::raw_symbol(ty);

        if parsed.is_async_enumerable {
            return single_element(ty, ASYNC_ENUMERABLE);
        }
        if parsed.is_enumerable {
            if let Some(element) = &ty.element_type {
                return Ok(element.as_ref());
            }
            return single_element(ty, GENERIC_ENUMERABLE);
        }
        Err(ShapeError::NotACollection {
            type_name: Arc::clone(&ty.name),
        })
    }
}

fn shape(ty: &TypeSymbol) -> Result<ParsedType, ShapeError> {
    let name = ty.name.as_ref();
    if name == VOID || name == STRING {
        return Ok(ParsedType::plain(Arc::clone(&ty.name)));
    }

    if AWAITABLE_WRAPPERS.contains(&name) {
        return Ok(ParsedType {
            is_awaitable: true,
            ..ParsedType::plain(Arc::clone(&ty.name))
        });
    }

    if let Some(inner) = awaited_inner(ty) {
        if is_async_enumerable(inner) {
            return Err(ShapeError::AwaitedAsyncEnumerable {
                full_type: Arc::clone(&ty.name),
            });
        }
        return Ok(ParsedType {
            raw_type: Arc::clone(&inner.name),
            full_type: Arc::clone(&ty.name),
            is_awaitable: true,
            is_enumerable: is_enumerable(inner),
            is_async_enumerable: false,
        });
    }

    Ok(ParsedType {
        is_enumerable: is_enumerable(ty),
        is_async_enumerable: is_async_enumerable(ty),
        ..ParsedType::plain(Arc::clone(&ty.name))
    })
}

fn awaited_inner(ty: &TypeSymbol) -> Option<&TypeSymbol> {
    AWAITABLE_WRAPPERS
        .iter()
        .find_map(|wrapper| ty.generic_argument_of(wrapper))
}

fn is_enumerable(ty: &TypeSymbol) -> bool {
    ty.is_array() || ty.implements(ENUMERABLE)
}

fn is_async_enumerable(ty: &TypeSymbol) -> bool {
    ty.generic_implementations(ASYNC_ENUMERABLE).next().is_some()
}

fn single_element<'t>(
    ty: &'t TypeSymbol,
    interface: &'static str,
) -> Result<&'t TypeSymbol, ShapeError> {
    let mut candidates: SmallVec<[&TypeSymbol; 2]> = SmallVec::new();
    for element in ty
        .generic_implementations(interface)
        .filter_map(|t| t.generic_argument_of(interface))
    {
        if !candidates.iter().any(|c| c.name == element.name) {
            candidates.push(element);
        }
    }

    match candidates.as_slice() {
        [element] => Ok(*element),
        [] => Err(ShapeError::NotACollection {
            type_name: Arc::clone(&ty.name),
        }),
        _ => Err(ShapeError::AmbiguousElementType { interface }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{TASK, VALUE_TASK};
    use fnmeta_manifest::DataTypeHint;

    fn string_list() -> TypeSymbol {
        let element = TypeSymbol::named("string");
        TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element.clone()]).with_interfaces(vec![
            TypeSymbol::named(ENUMERABLE),
            TypeSymbol::generic(GENERIC_ENUMERABLE, vec![element]),
        ])
    }

    fn async_stream(element: &str) -> TypeSymbol {
        TypeSymbol::generic(ASYNC_ENUMERABLE, vec![TypeSymbol::named(element)])
    }

    #[test]
    fn test_awaitable_wrappers_unwrap_one_level() {
        let cache = SymbolCache::new();
        let classifier = TypeShapeClassifier::new(&cache);
        for wrapper in [TASK, VALUE_TASK] {
            for inner in ["string", "byte[]", "Orders.Order"] {
                let ty = TypeSymbol::generic(wrapper, vec![TypeSymbol::named(inner)]);
                let Ok(parsed) = classifier.classify(&ty) else {
                    panic!("{} should classify", ty.name);
                };
                assert!(parsed.is_awaitable);
                assert_eq!(parsed.raw_type.as_ref(), inner);
                assert_eq!(parsed.full_type.as_ref(), format!("{}<{}>", wrapper, inner));
            }
        }
    }

    #[test]
    fn test_awaited_async_enumerable_is_rejected() {
        let cache = SymbolCache::new();
        let classifier = TypeShapeClassifier::new(&cache);
        let ty = TypeSymbol::generic(TASK, vec![async_stream("string")]);
        let result = classifier.classify_at(&ty, None);
        let Err(diagnostic) = result else {
            panic!("nested async enumerable must not classify");
        };
        assert_eq!(diagnostic.id, DiagnosticId::InvalidBindingType);
        assert!(diagnostic.message.contains("as return type"));
        assert_eq!(cache.type_count(), 0);
    }

    #[test]
    fn test_shortcuts() {
        let cache = SymbolCache::new();
        let classifier = TypeShapeClassifier::new(&cache);

        let bare = classifier.classify(&TypeSymbol::named(TASK));
        assert!(bare.is_ok_and(|p| p.is_awaitable && !p.is_collection()));

        // string implements IEnumerable but is never a collection
        let string = TypeSymbol::named("string").with_interfaces(vec![TypeSymbol::named(ENUMERABLE)]);
        let parsed = classifier.classify(&string);
        assert!(parsed.is_ok_and(|p| !p.is_enumerable && p.data_type_hint() == DataTypeHint::String));
    }

    #[test]
    fn test_direct_classification() {
        let cache = SymbolCache::new();
        let classifier = TypeShapeClassifier::new(&cache);

        let array = classifier.classify(&TypeSymbol::array(TypeSymbol::named("byte")));
        assert!(array.is_ok_and(|p| p.is_enumerable && p.data_type_hint() == DataTypeHint::Binary));

        let stream = classifier.classify(&async_stream("Orders.Order"));
        assert!(stream.is_ok_and(|p| p.is_async_enumerable && !p.is_awaitable));

        let model = classifier.classify(&TypeSymbol::named("Orders.Order"));
        assert!(model.is_ok_and(|p| !p.is_collection()));
        assert_eq!(cache.type_count(), 3);
    }

    #[test]
    fn test_batched_element() {
        let list = string_list();
        let parsed = ParsedType {
            is_enumerable: true,
            ..ParsedType::plain(Arc::clone(&list.name))
        };
        let element = TypeShapeClassifier::batched_element(&list, &parsed);
        assert!(element.is_ok_and(|e| e.name.as_ref() == "string"));

        let array = TypeSymbol::array(TypeSymbol::named("byte"));
        let element = TypeShapeClassifier::batched_element(&array, &parsed);
        assert!(element.is_ok_and(|e| e.name.as_ref() == "byte"));

        let stream = async_stream("string");
        let parsed = ParsedType {
            is_async_enumerable: true,
            ..ParsedType::plain(Arc::clone(&stream.name))
        };
        let element = TypeShapeClassifier::batched_element(&stream, &parsed);
        assert!(element.is_ok_and(|e| e.name.as_ref() == "string"));
    }

    #[test]
    fn test_batched_element_requires_collection() {
        for name in ["Orders.Order", "int", "System.Guid"] {
            let ty = TypeSymbol::named(name);
            let result = TypeShapeClassifier::batched_element(&ty, &ParsedType::plain(name));
            assert_eq!(
                result.err(),
                Some(ShapeError::NotACollection {
                    type_name: Arc::from(name)
                })
            );
        }
    }

    #[test]
    fn test_ambiguous_async_enumerable() {
        let ty = TypeSymbol::named("Orders.DualStream").with_interfaces(vec![
            TypeSymbol::named(ENUMERABLE),
            async_stream("string"),
            async_stream("byte[]"),
        ]);
        let cache = SymbolCache::new();
        let parsed = TypeShapeClassifier::new(&cache).classify(&ty);
        let Ok(parsed) = parsed else {
            panic!("shape should classify");
        };
        assert!(parsed.is_enumerable && parsed.is_async_enumerable);

        let result = TypeShapeClassifier::batched_element(&ty, &parsed);
        let Err(error) = result else {
            panic!("two element types must be ambiguous");
        };
        let diagnostic = error.into_diagnostic(None);
        assert_eq!(
            diagnostic.message,
            "Binding type does not allow more than 1 implementation of System.Collections.Generic.IAsyncEnumerable as batched trigger type."
        );
    }
}

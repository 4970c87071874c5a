//! Strategy registry: resolve-once, build-once, reuse-many.
//!
//! The registry is the only shared mutable state in the engine. Lookups are
//! memoized by annotation value so repeated lookups for the same declared
//! field type are O(1) after first resolution. Concurrent first-time lookups
//! for one key take a read-lock fast path, then a write lock with a
//! double-check: at most one strategy instance is ever published per key, and
//! a losing concurrent builder discards its result in favor of the published
//! one.

use super::annotation::{resolve, TypeAnnotation, TypeDescriptor};
use super::strategies::{
    EnumStrategy, MappingStrategy, OptionalStrategy, RecordStrategy, ScalarStrategy,
    SequenceStrategy, SetStrategy, Strategy, TupleStrategy, VariadicTupleStrategy,
};
use crate::error::BindError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Owns every built strategy for its lifetime and hands out stable
/// [`Arc`] handles to them.
///
/// Strategies hold their own handle back to the registry for recursive child
/// lookups, so a registry (and its strategies) lives as long as any strategy
/// handle does; the intended use is one registry per process.
pub struct StrategyRegistry {
    cache: RwLock<HashMap<TypeAnnotation, Arc<dyn Strategy>>>,
}

static DEFAULT_REGISTRY: Lazy<Arc<StrategyRegistry>> = Lazy::new(StrategyRegistry::new);

/// The process-wide registry backing the crate-level [`get_strategy_for`],
/// [`hydrate`] and [`extract`] functions.
///
/// [`get_strategy_for`]: super::get_strategy_for
/// [`hydrate`]: super::hydrate
/// [`extract`]: super::extract
pub fn default_registry() -> &'static Arc<StrategyRegistry> {
    &DEFAULT_REGISTRY
}

impl StrategyRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(StrategyRegistry {
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Return the strategy for an annotation, building and caching it on
    /// first lookup.
    ///
    /// # Errors
    ///
    /// [`BindError::UnsupportedType`] when the annotation resolves to
    /// [`TypeDescriptor::Unknown`]. Nothing is cached for failed lookups.
    pub fn get_strategy_for(
        self: &Arc<Self>,
        annotation: &TypeAnnotation,
    ) -> Result<Arc<dyn Strategy>, BindError> {
        // Fast path: read lock only.
        {
            let cache = self.cache.read().expect("strategy cache lock poisoned");
            if let Some(strategy) = cache.get(annotation) {
                debug!(annotation = %annotation, "strategy cache hit");
                return Ok(Arc::clone(strategy));
            }
        }

        let built = self.build(resolve(annotation))?;

        let mut cache = self.cache.write().expect("strategy cache lock poisoned");
        // Double-check: another thread may have published while we built.
        // Ours is discarded in that case so only one instance is ever shared.
        if let Some(existing) = cache.get(annotation) {
            debug!(annotation = %annotation, "strategy built concurrently, reusing published instance");
            return Ok(Arc::clone(existing));
        }
        cache.insert(annotation.clone(), Arc::clone(&built));
        info!(
            annotation = %annotation,
            cache_size = cache.len(),
            "strategy built and cached"
        );
        Ok(built)
    }

    fn build(
        self: &Arc<Self>,
        descriptor: TypeDescriptor,
    ) -> Result<Arc<dyn Strategy>, BindError> {
        Ok(match descriptor {
            TypeDescriptor::Scalar(kind) => Arc::new(ScalarStrategy { kind }),
            TypeDescriptor::Optional(inner) => Arc::new(OptionalStrategy {
                inner,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Tuple(elements) => Arc::new(TupleStrategy {
                elements,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::VariadicTuple(element) => Arc::new(VariadicTupleStrategy {
                element,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Mapping { key, value, ordered } => Arc::new(MappingStrategy {
                key,
                value,
                ordered,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Sequence(element) => Arc::new(SequenceStrategy {
                element,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Set(element) => Arc::new(SetStrategy {
                element,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Enum(members) => Arc::new(EnumStrategy { members }),
            TypeDescriptor::Record(shape) => Arc::new(RecordStrategy {
                shape,
                registry: Arc::clone(self),
            }),
            TypeDescriptor::Unknown(name) => return Err(BindError::UnsupportedType(name)),
        })
    }

    /// Number of cached strategies.
    pub fn size(&self) -> usize {
        self.cache.read().expect("strategy cache lock poisoned").len()
    }

    /// Drop every cached strategy. Mainly useful in tests.
    pub fn clear(&self) {
        self.cache
            .write()
            .expect("strategy cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Captures the cache hit/publish events emitted under test.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("bindery=debug")
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_lookup_is_memoized() {
        init_tracing();
        let registry = StrategyRegistry::new();
        let annotation = TypeAnnotation::sequence(TypeAnnotation::Int);

        let first = registry.get_strategy_for(&annotation).unwrap();
        assert_eq!(registry.size(), 1);
        let second = registry.get_strategy_for(&annotation).unwrap();
        assert_eq!(registry.size(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_nested_lookups_populate_lazily() {
        let registry = StrategyRegistry::new();
        let annotation = TypeAnnotation::sequence(TypeAnnotation::Int);

        registry.get_strategy_for(&annotation).unwrap();
        // The element strategy is not built until a value flows through.
        assert_eq!(registry.size(), 1);

        let strategy = registry.get_strategy_for(&annotation).unwrap();
        strategy.hydrate(&json!([1, 2])).unwrap();
        assert_eq!(registry.size(), 2);
    }

    #[test]
    fn test_unknown_annotation_rejected() {
        let registry = StrategyRegistry::new();
        let err = registry
            .get_strategy_for(&TypeAnnotation::Unknown("RawSocket".into()))
            .err()
            .unwrap();
        assert_eq!(err, BindError::UnsupportedType("RawSocket".into()));
        assert_eq!(registry.size(), 0, "failed lookups cache nothing");
    }

    #[test]
    fn test_concurrent_first_lookup_publishes_once() {
        init_tracing();
        let registry = StrategyRegistry::new();
        let annotation = TypeAnnotation::sequence(TypeAnnotation::Str);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let annotation = annotation.clone();
                std::thread::spawn(move || {
                    let strategy = registry.get_strategy_for(&annotation).unwrap();
                    Arc::as_ptr(&strategy) as *const () as usize
                })
            })
            .collect();

        let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(
            pointers.windows(2).all(|w| w[0] == w[1]),
            "all callers must observe the same published strategy"
        );
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_clear_resets_cache() {
        let registry = StrategyRegistry::new();
        registry.get_strategy_for(&TypeAnnotation::Int).unwrap();
        registry.get_strategy_for(&TypeAnnotation::Str).unwrap();
        assert_eq!(registry.size(), 2);
        registry.clear();
        assert_eq!(registry.size(), 0);
    }
}

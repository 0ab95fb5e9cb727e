//! Memoized dispatch lookups
//!
//! Method workers resolve the same call targets over and over; the cache
//! remembers every answer. Concurrent misses on one key may both compute it,
//! which only repeats an idempotent insert.

use crate::features::call_linkage::ports::{Definition, DispatchOracle, Implementation};
use crate::shared::models::{ClassId, FieldId, FrameShape, InstanceId, MethodId};
use dashmap::DashMap;
use std::collections::BTreeMap;

type Key = (ClassId, MethodId);

pub struct DispatchCache<O: DispatchOracle> {
    inner: O,
    virtual_targets: DashMap<Key, Option<Vec<Implementation>>>,
    static_targets: DashMap<Key, Option<Vec<Definition>>>,
}

impl<O: DispatchOracle> DispatchCache<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            virtual_targets: DashMap::new(),
            static_targets: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Cached lookups
    pub fn len(&self) -> usize {
        self.virtual_targets.len() + self.static_targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: DispatchOracle> DispatchOracle for DispatchCache<O> {
    fn resolve_virtual(&self, class: ClassId, method: MethodId) -> Option<Vec<Implementation>> {
        if let Some(hit) = self.virtual_targets.get(&(class, method)) {
            return hit.clone();
        }
        let resolved = self.inner.resolve_virtual(class, method);
        self.virtual_targets.insert((class, method), resolved.clone());
        resolved
    }

    fn resolve_static(&self, class: ClassId, method: MethodId) -> Option<Vec<Definition>> {
        if let Some(hit) = self.static_targets.get(&(class, method)) {
            return hit.clone();
        }
        let resolved = self.inner.resolve_static(class, method);
        self.static_targets.insert((class, method), resolved.clone());
        resolved
    }

    fn allocation_id(&self, class: ClassId, method: MethodId, pc: u32) -> InstanceId {
        self.inner.allocation_id(class, method, pc)
    }

    fn field_layout(&self, type_name: &str, instance: InstanceId) -> Option<BTreeMap<FieldId, bool>> {
        self.inner.field_layout(type_name, instance)
    }

    fn is_source(&self, class: ClassId, method: MethodId) -> bool {
        self.inner.is_source(class, method)
    }

    fn is_sink(&self, class: ClassId, method: MethodId) -> bool {
        self.inner.is_sink(class, method)
    }

    fn has_static_initializer(&self, class: ClassId) -> bool {
        self.inner.has_static_initializer(class)
    }

    fn method_shape(&self, class: ClassId, method: MethodId) -> Option<FrameShape> {
        self.inner.method_shape(class, method)
    }

    fn static_field_owner(&self, class: ClassId, field: FieldId) -> Option<ClassId> {
        self.inner.static_field_owner(class, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingOracle {
        calls: AtomicUsize,
    }

    impl DispatchOracle for CountingOracle {
        fn resolve_virtual(&self, class: ClassId, method: MethodId) -> Option<Vec<Implementation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(vec![Implementation {
                class,
                method,
                shape: FrameShape::new(1, 1),
                instances: vec![7],
            }])
        }

        fn resolve_static(&self, _class: ClassId, _method: MethodId) -> Option<Vec<Definition>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            None
        }

        fn field_layout(&self, _: &str, _: InstanceId) -> Option<BTreeMap<FieldId, bool>> {
            None
        }

        fn is_source(&self, _: ClassId, _: MethodId) -> bool {
            false
        }

        fn is_sink(&self, _: ClassId, _: MethodId) -> bool {
            false
        }

        fn has_static_initializer(&self, _: ClassId) -> bool {
            false
        }

        fn method_shape(&self, _: ClassId, _: MethodId) -> Option<FrameShape> {
            None
        }
    }

    #[test]
    fn test_lookups_are_memoized() {
        let cache = DispatchCache::new(CountingOracle::default());
        for _ in 0..3 {
            assert_eq!(cache.resolve_virtual(1, 2).unwrap()[0].instances, vec![7]);
            assert!(cache.resolve_static(1, 2).is_none());
        }
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }
}

use crate::metadata::{MetadataKey, Target};
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

type Fact = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactKey {
    target: Target,
    key: MetadataKey,
    member: Option<String>,
}

impl FactKey {
    fn new(target: Target, key: MetadataKey, member: Option<&str>) -> Self {
        Self {
            target,
            key,
            member: member.map(str::to_owned),
        }
    }
}

/// Thread-safe metadata container.
///
/// Stores one type-erased fact per `(target, key, member)` tuple;
/// re-defining the same tuple overwrites. Lookups never fail: absence is
/// always an explicit `None`/`false`.
///
/// Rust has no prototype chain, so inheritance is modelled explicitly: a
/// target registered as deriving from another (see [`set_parent`]) resolves
/// facts it does not own itself through [`get`]/[`has`], while [`get_own`]
/// only ever consults the exact target.
///
/// [`set_parent`]: Container::set_parent
/// [`get`]: Container::get
/// [`get_own`]: Container::get_own
/// [`has`]: Container::has
pub struct Container {
    facts: DashMap<FactKey, Fact>,
    parents: DashMap<Target, Target>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            facts: DashMap::new(),
            parents: DashMap::new(),
        }
    }

    /// Store `value` under the `(target, key, member)` tuple, overwriting
    /// any prior fact at that exact tuple.
    pub fn define<T: Send + Sync + 'static>(
        &self,
        target: Target,
        value: T,
        key: MetadataKey,
        member: Option<&str>,
    ) {
        self.facts
            .insert(FactKey::new(target, key, member), Arc::new(value));
    }

    /// Declare that facts not owned by `child` resolve through `parent`.
    pub fn set_parent(&self, child: Target, parent: Target) {
        self.parents.insert(child, parent);
    }

    /// Fact visible on `target` or anything it derives from.
    pub fn get<T: Send + Sync + 'static>(
        &self,
        target: Target,
        key: MetadataKey,
        member: Option<&str>,
    ) -> Option<Arc<T>> {
        let mut current = target;
        let mut visited = vec![current];
        loop {
            if let Some(fact) = self.facts.get(&FactKey::new(current, key, member)) {
                return fact.value().clone().downcast::<T>().ok();
            }
            match self.parents.get(&current).map(|p| *p.value()) {
                Some(parent) if !visited.contains(&parent) => {
                    visited.push(parent);
                    current = parent;
                }
                _ => return None,
            }
        }
    }

    /// Fact defined directly on `target`, ignoring anything inherited.
    pub fn get_own<T: Send + Sync + 'static>(
        &self,
        target: Target,
        key: MetadataKey,
        member: Option<&str>,
    ) -> Option<Arc<T>> {
        self.facts
            .get(&FactKey::new(target, key, member))
            .and_then(|fact| fact.value().clone().downcast::<T>().ok())
    }

    /// Presence check with the same inheritance rule as [`get`](Container::get).
    pub fn has(&self, target: Target, key: MetadataKey, member: Option<&str>) -> bool {
        let mut current = target;
        let mut visited = vec![current];
        loop {
            if self.facts.contains_key(&FactKey::new(current, key, member)) {
                return true;
            }
            match self.parents.get(&current).map(|p| *p.value()) {
                Some(parent) if !visited.contains(&parent) => {
                    visited.push(parent);
                    current = parent;
                }
                _ => return false,
            }
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

use crate::di::injectable::{Deps, Injectable, Instance};
use crate::di::token::{Token, get_injector_id, set_injector_id};
use crate::error::{Result, StanzaError};
use crate::metadata::{Container, MetadataKey, Target};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Constructor = Arc<dyn Fn(&Deps<'_>) -> Result<Instance> + Send + Sync>;

/// Something an injection can point at: a registered type or a bare token.
#[derive(Clone, Debug)]
pub enum InjectableKey {
    Target(Target),
    Token(Token),
}

impl From<Target> for InjectableKey {
    fn from(target: Target) -> Self {
        Self::Target(target)
    }
}

impl From<Token> for InjectableKey {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<&Token> for InjectableKey {
    fn from(token: &Token) -> Self {
        Self::Token(token.clone())
    }
}

/// Overwrite a single positional dependency slot, as opposed to type-based
/// auto-wiring which only fills slots nothing claimed yet.
#[derive(Clone, Debug)]
pub struct InjectOverride {
    pub index: usize,
    pub injectable: InjectableKey,
}

#[derive(Clone)]
enum DepSlot {
    /// Wired to a registered identity.
    Bound(Token),
    /// Declared parameter type that had no identity when wired; re-checked
    /// at resolution so registration order does not matter.
    Unbound(Target),
}

struct InjectorRecord {
    type_name: &'static str,
    construct: Constructor,
    deps: Vec<DepSlot>,
    value: Option<Instance>,
}

/// Read-only snapshot of an injector record.
#[derive(Clone, Debug)]
pub struct InjectorInfo {
    pub id: Token,
    pub type_name: &'static str,
    pub dependencies: Vec<Option<Token>>,
    pub resolved: bool,
}

/// The injector registry.
///
/// Owns the [`Container`] holding every declarative fact plus the table of
/// injector records keyed by identity token. Instances are memoized
/// singletons: a constructor runs at most once for the lifetime of the
/// registry, and the registry is never torn down.
///
/// Resolution is meant to run during single-threaded attach-time wiring; the
/// record table is behind one mutex, so concurrent resolution serializes but
/// gains nothing.
pub struct Store {
    container: Container,
    injectors: Mutex<HashMap<Token, InjectorRecord>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
            injectors: Mutex::new(HashMap::new()),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    fn records(&self) -> MutexGuard<'_, HashMap<Token, InjectorRecord>> {
        self.injectors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `T` as injectable: persist its constructor parameter types
    /// and auto-wire every dependency slot not already claimed by an
    /// explicit injection override.
    pub fn define_injectable<T: Injectable>(&self) {
        let target = Target::of::<T>();
        self.container
            .define(target, T::dependencies(), MetadataKey::ParamTypes, None);
        self.ensure_record::<T>();
        self.autowire(target);
    }

    /// Overwrite constructor slot `index` of `T` with an explicit
    /// injectable, creating the record for `T` if it does not exist yet.
    ///
    /// # Errors
    /// Fails with `MissingInjector` when the override points at a target
    /// that was never registered; register the dependency first.
    pub fn define_injection<T: Injectable>(
        &self,
        index: usize,
        injectable: impl Into<InjectableKey>,
    ) -> Result<()> {
        self.ensure_record::<T>();
        self.define_injector(
            Target::of::<T>(),
            Some(InjectOverride {
                index,
                injectable: injectable.into(),
            }),
        )
    }

    /// The type-erased registration entry point.
    ///
    /// With no override this re-runs auto-wiring for `target` (a no-op when
    /// the target has no record yet; the record itself can only be created
    /// through [`define_injectable`](Store::define_injectable), which knows
    /// the constructor). With an override it rewires exactly one slot.
    pub fn define_injector(&self, target: Target, inject: Option<InjectOverride>) -> Result<()> {
        let Some(over) = inject else {
            self.autowire(target);
            return Ok(());
        };

        let id = get_injector_id(&self.container, target).ok_or_else(|| {
            StanzaError::MissingInjector {
                type_name: target.name().to_string(),
            }
        })?;
        let dep_id = self.injector_id(&over.injectable).ok_or_else(|| {
            StanzaError::MissingInjector {
                type_name: key_name(&over.injectable),
            }
        })?;

        let mut records = self.records();
        let record = records.get_mut(&id).ok_or_else(|| StanzaError::MissingInjector {
            type_name: target.name().to_string(),
        })?;
        if record.deps.len() <= over.index {
            record.deps.resize_with(over.index + 1, || DepSlot::Unbound(target));
        }
        record.deps[over.index] = DepSlot::Bound(dep_id);
        Ok(())
    }

    /// Look up the record for a target or token, if one exists.
    pub fn find_injector(&self, injectable: impl Into<InjectableKey>) -> Option<InjectorInfo> {
        let id = self.injector_id(&injectable.into())?;
        let records = self.records();
        records.get(&id).map(|record| InjectorInfo {
            id: id.clone(),
            type_name: record.type_name,
            dependencies: record
                .deps
                .iter()
                .map(|slot| match slot {
                    DepSlot::Bound(token) => Some(token.clone()),
                    DepSlot::Unbound(_) => None,
                })
                .collect(),
            resolved: record.value.is_some(),
        })
    }

    /// Bind a constant instance to an explicit token.
    pub fn bind_value<T: Send + Sync + 'static>(&self, token: &Token, value: T) {
        let instance: Instance = Arc::new(value);
        let cached = instance.clone();
        self.records().insert(
            token.clone(),
            InjectorRecord {
                type_name: std::any::type_name::<T>(),
                construct: Arc::new(move |_deps: &Deps<'_>| Ok(cached.clone())),
                deps: Vec::new(),
                value: Some(instance),
            },
        );
    }

    /// Resolve the singleton for `T`, constructing its whole dependency
    /// subgraph on first use.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_instance(Target::of::<T>())?
            .downcast::<T>()
            .map_err(|_| StanzaError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Type-erased resolution by target.
    pub fn get_instance(&self, target: Target) -> Result<Instance> {
        let id = get_injector_id(&self.container, target).ok_or_else(|| {
            StanzaError::MissingInjector {
                type_name: target.name().to_string(),
            }
        })?;
        self.resolve_token(&id)
    }

    /// Type-erased resolution by identity token.
    pub fn resolve_token(&self, id: &Token) -> Result<Instance> {
        let mut records = self.records();
        if !records.contains_key(id) {
            return Err(StanzaError::MissingInjector {
                type_name: id.name().to_string(),
            });
        }
        let mut resolving = Vec::new();
        self.resolve_record(&mut records, id, &mut resolving)
    }

    fn ensure_record<T: Injectable>(&self) -> Token {
        let target = Target::of::<T>();
        if let Some(id) = get_injector_id(&self.container, target)
            && self.records().contains_key(&id)
        {
            return id;
        }

        let id = set_injector_id(&self.container, target);
        let construct: Constructor =
            Arc::new(|deps: &Deps<'_>| T::construct(deps).map(|value| Arc::new(value) as Instance));
        self.records().insert(
            id.clone(),
            InjectorRecord {
                type_name: target.name(),
                construct,
                deps: Vec::new(),
                value: None,
            },
        );
        id
    }

    /// Fill unclaimed dependency slots from the target's declared parameter
    /// types. Explicitly overridden slots are left alone.
    fn autowire(&self, target: Target) {
        let Some(id) = get_injector_id(&self.container, target) else {
            return;
        };
        let Some(param_types) =
            self.container
                .get::<Vec<Target>>(target, MetadataKey::ParamTypes, None)
        else {
            return;
        };

        let mut records = self.records();
        let Some(record) = records.get_mut(&id) else {
            return;
        };
        for (index, param) in param_types.iter().enumerate() {
            if record.deps.len() <= index {
                record.deps.push(DepSlot::Unbound(*param));
            }
            if let DepSlot::Unbound(_) = record.deps[index] {
                record.deps[index] = match get_injector_id(&self.container, *param) {
                    Some(dep_id) => DepSlot::Bound(dep_id),
                    None => DepSlot::Unbound(*param),
                };
            }
        }
    }

    fn injector_id(&self, injectable: &InjectableKey) -> Option<Token> {
        match injectable {
            InjectableKey::Token(token) => Some(token.clone()),
            InjectableKey::Target(target) => get_injector_id(&self.container, *target),
        }
    }

    fn resolve_record(
        &self,
        records: &mut HashMap<Token, InjectorRecord>,
        id: &Token,
        resolving: &mut Vec<Token>,
    ) -> Result<Instance> {
        if let Some(value) = records.get(id).and_then(|record| record.value.clone()) {
            return Ok(value);
        }
        if resolving.contains(id) {
            let mut names: Vec<&str> = resolving.iter().map(Token::name).collect();
            names.push(id.name());
            return Err(StanzaError::CircularDependency {
                cycle: names.join(" -> "),
            });
        }

        let (owner, construct, dep_slots) = {
            let record = records.get(id).ok_or_else(|| {
                StanzaError::Internal(format!("no injector record for token `{}`", id.name()))
            })?;
            (record.type_name, record.construct.clone(), record.deps.clone())
        };

        resolving.push(id.clone());
        let mut resolved = Vec::with_capacity(dep_slots.len());
        for (index, slot) in dep_slots.iter().enumerate() {
            let dep_id = match slot {
                DepSlot::Bound(token) => token.clone(),
                // A slot wired before its parameter type was registered;
                // give it one last chance now.
                DepSlot::Unbound(param) => {
                    match get_injector_id(&self.container, *param) {
                        Some(token) => {
                            if let Some(record) = records.get_mut(id) {
                                record.deps[index] = DepSlot::Bound(token.clone());
                            }
                            token
                        }
                        None => {
                            return Err(StanzaError::MissingDependency {
                                owner: owner.to_string(),
                                dependency: param.short_name().to_string(),
                                index,
                            });
                        }
                    }
                }
            };
            if !records.contains_key(&dep_id) {
                return Err(StanzaError::MissingDependency {
                    owner: owner.to_string(),
                    dependency: dep_id.name().to_string(),
                    index,
                });
            }
            resolved.push(self.resolve_record(records, &dep_id, resolving)?);
        }
        resolving.pop();

        let value = (construct)(&Deps::new(&resolved))?;
        if let Some(record) = records.get_mut(id) {
            record.value = Some(value.clone());
        }
        Ok(value)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

fn key_name(injectable: &InjectableKey) -> String {
    match injectable {
        InjectableKey::Target(target) => target.name().to_string(),
        InjectableKey::Token(token) => token.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Leaf;

    impl Injectable for Leaf {
        fn construct(_deps: &Deps<'_>) -> Result<Self> {
            Ok(Self)
        }
    }

    struct Consumer {
        leaf: Arc<Leaf>,
    }

    impl Injectable for Consumer {
        fn dependencies() -> Vec<Target> {
            vec![Target::of::<Leaf>()]
        }

        fn construct(deps: &Deps<'_>) -> Result<Self> {
            Ok(Self { leaf: deps.get(0)? })
        }
    }

    #[test]
    fn singleton_is_constructed_at_most_once() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        struct Lone;

        impl Injectable for Lone {
            fn construct(_deps: &Deps<'_>) -> Result<Self> {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                Ok(Self)
            }
        }

        let store = Store::new();
        store.define_injectable::<Lone>();

        let first = store.resolve::<Lone>().unwrap();
        let second = store.resolve::<Lone>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dependencies_share_the_singleton() {
        let store = Store::new();
        store.define_injectable::<Leaf>();
        store.define_injectable::<Consumer>();

        let consumer = store.resolve::<Consumer>().unwrap();
        let leaf = store.resolve::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&consumer.leaf, &leaf));
    }

    #[test]
    fn wiring_survives_reversed_registration_order() {
        let store = Store::new();
        // Consumer first: its Leaf slot cannot be bound yet.
        store.define_injectable::<Consumer>();
        store.define_injectable::<Leaf>();

        let consumer = store.resolve::<Consumer>().unwrap();
        assert!(Arc::ptr_eq(&consumer.leaf, &store.resolve::<Leaf>().unwrap()));
    }

    #[test]
    fn unregistered_target_fails_with_missing_injector() {
        struct Unregistered;

        let store = Store::new();
        let err = store.get_instance(Target::of::<Unregistered>()).unwrap_err();
        assert!(matches!(err, StanzaError::MissingInjector { .. }));
    }

    #[test]
    fn unregistered_dependency_fails_with_missing_dependency() {
        struct Orphan;

        #[derive(Debug)]
        struct Needy;

        impl Injectable for Needy {
            fn dependencies() -> Vec<Target> {
                vec![Target::of::<Orphan>()]
            }

            fn construct(_deps: &Deps<'_>) -> Result<Self> {
                Ok(Self)
            }
        }

        let store = Store::new();
        store.define_injectable::<Needy>();

        match store.resolve::<Needy>().unwrap_err() {
            StanzaError::MissingDependency { dependency, index, .. } => {
                assert_eq!(dependency, "Orphan");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cycles_fail_fast() {
        #[derive(Debug)]
        struct Yin;

        struct Yang;

        impl Injectable for Yin {
            fn dependencies() -> Vec<Target> {
                vec![Target::of::<Yang>()]
            }

            fn construct(_deps: &Deps<'_>) -> Result<Self> {
                Ok(Self)
            }
        }

        impl Injectable for Yang {
            fn dependencies() -> Vec<Target> {
                vec![Target::of::<Yin>()]
            }

            fn construct(_deps: &Deps<'_>) -> Result<Self> {
                Ok(Self)
            }
        }

        let store = Store::new();
        store.define_injectable::<Yin>();
        store.define_injectable::<Yang>();

        match store.resolve::<Yin>().unwrap_err() {
            StanzaError::CircularDependency { cycle } => {
                assert_eq!(cycle, "Yin -> Yang -> Yin");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_injection_overrides_one_slot() {
        struct Flag {
            marker: u8,
        }

        impl Injectable for Flag {
            fn construct(_deps: &Deps<'_>) -> Result<Self> {
                Ok(Self { marker: 1 })
            }
        }

        struct Holder {
            flag: Arc<Flag>,
        }

        impl Injectable for Holder {
            fn dependencies() -> Vec<Target> {
                vec![Target::of::<Flag>()]
            }

            fn construct(deps: &Deps<'_>) -> Result<Self> {
                Ok(Self { flag: deps.get(0)? })
            }
        }

        let store = Store::new();
        store.define_injectable::<Flag>();
        let replacement = Token::new("REPLACEMENT_FLAG");
        store.bind_value(&replacement, Flag { marker: 2 });
        store.define_injection::<Holder>(0, &replacement).unwrap();
        store.define_injectable::<Holder>();

        let holder = store.resolve::<Holder>().unwrap();
        assert_eq!(holder.flag.marker, 2);
        // Auto-wiring must not clobber the explicit override.
        assert!(!Arc::ptr_eq(&holder.flag, &store.resolve::<Flag>().unwrap()));
    }

    #[test]
    fn bound_values_resolve_by_token() {
        let store = Store::new();
        let token = Token::new("CONFIG");
        store.bind_value(&token, "value".to_string());

        let first = store.resolve_token(&token).unwrap();
        let second = store.resolve_token(&token).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.downcast::<String>().unwrap().as_str(), "value");
    }

    #[test]
    fn find_injector_reports_wiring() {
        let store = Store::new();
        store.define_injectable::<Leaf>();
        store.define_injectable::<Consumer>();

        let info = store.find_injector(Target::of::<Consumer>()).unwrap();
        assert_eq!(info.dependencies.len(), 1);
        assert!(info.dependencies[0].is_some());
        assert!(!info.resolved);

        store.resolve::<Consumer>().unwrap();
        let info = store.find_injector(Target::of::<Consumer>()).unwrap();
        assert!(info.resolved);

        struct Unknown;
        assert!(store.find_injector(Target::of::<Unknown>()).is_none());
    }
}

//! Injector and module registries.

use std::collections::HashMap;
use std::sync::Arc;

use jacket_core::{BoxError, Contract, ModuleValue};

use crate::injector::{Injector, InjectorObject};

/// An insertion-ordered mapping from module name to injector.
///
/// Iteration follows registration order, so when several injectors provide the same contract
/// the one registered first wins, on every run.
#[derive(Debug, Default)]
pub struct InjectorMap {
    entries: Vec<(String, Arc<InjectorObject>)>,
}

impl InjectorMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers an injector, builder style.
    #[must_use]
    pub fn with<Args, I>(mut self, name: impl Into<String>, injector: I) -> Self
    where
        I: Injector<Args>,
    {
        self.insert(name, injector);
        self
    }

    /// Registers an injector under `name`, replacing the previous one in place.
    pub fn insert<Args, I>(&mut self, name: impl Into<String>, injector: I)
    where
        I: Injector<Args>,
    {
        self.insert_object(name.into(), Arc::new(InjectorObject::new(injector)));
    }

    pub(crate) fn insert_object(&mut self, name: String, injector: Arc<InjectorObject>) {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            *slot = injector;
        } else {
            self.entries.push((name, injector));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<InjectorObject>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<InjectorObject>)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), i))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Eager and lazy injectors, plus the bootstrap injector of the config module.
#[derive(Debug, Default)]
pub(crate) struct InjectorRegistry {
    eager: InjectorMap,
    lazy: InjectorMap,
    bootstrap: Option<(String, Arc<InjectorObject>)>,
}

impl InjectorRegistry {
    pub(crate) fn register(&mut self, name: String, injector: Arc<InjectorObject>, eager: bool) {
        if eager {
            self.eager.insert_object(name, injector);
        } else {
            self.lazy.insert_object(name, injector);
        }
    }

    pub(crate) fn set_eager(&mut self, injectors: InjectorMap) {
        self.eager = injectors;
    }

    pub(crate) fn set_lazy(&mut self, injectors: InjectorMap) {
        self.lazy = injectors;
    }

    pub(crate) fn set_bootstrap(&mut self, name: &str, injector: InjectorObject) {
        self.bootstrap = Some((name.to_owned(), Arc::new(injector)));
    }

    pub(crate) const fn eager(&self) -> &InjectorMap {
        &self.eager
    }

    /// Eager injectors win over lazy ones, which win over the bootstrap injector.
    pub(crate) fn get(&self, name: &str) -> Option<Arc<InjectorObject>> {
        self.eager
            .get(name)
            .or_else(|| self.lazy.get(name))
            .or_else(|| {
                self.bootstrap
                    .as_ref()
                    .filter(|(n, _)| n == name)
                    .map(|(_, i)| i)
            })
            .cloned()
    }

    /// Every effective injector: eager ones first, then lazy ones not shadowed by an eager
    /// entry, then the bootstrap injector if nothing shadows it.
    pub(crate) fn all(&self) -> impl Iterator<Item = (&str, &Arc<InjectorObject>)> {
        let lazy = self
            .lazy
            .iter()
            .filter(|(name, _)| !self.eager.contains(name));
        let bootstrap = self
            .bootstrap
            .iter()
            .map(|(n, i)| (n.as_str(), i))
            .filter(|(name, _)| !self.eager.contains(name) && !self.lazy.contains(name));

        self.eager.iter().chain(lazy).chain(bootstrap)
    }

    /// Returns `true` if neither the eager nor the lazy map holds an injector.
    pub(crate) fn is_empty(&self) -> bool {
        self.eager.is_empty() && self.lazy.is_empty()
    }
}

/// A module built by a [`Container`](crate::Container).
#[derive(Clone, Debug)]
pub struct Instance {
    name: String,
    value: ModuleValue,
}

impl Instance {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn contract(&self) -> &Contract {
        self.value.contract()
    }

    #[inline]
    pub const fn value(&self) -> &ModuleValue {
        &self.value
    }

    /// Returns a clone of the module if its contract is `T`.
    #[inline]
    pub fn downcast<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.value.downcast()
    }

    pub(crate) fn close(&self) -> Result<(), BoxError> {
        self.value.close()
    }
}

/// Built modules, kept in creation order.
#[derive(Debug, Default)]
pub(crate) struct ModuleRegistry {
    created: Vec<Instance>,
    by_name: HashMap<String, usize>,
}

impl ModuleRegistry {
    /// Records a freshly built module. Recording a name twice keeps the first instance.
    pub(crate) fn record(&mut self, name: &str, value: ModuleValue) -> Instance {
        if let Some(existing) = self.get(name) {
            return existing.clone();
        }

        let instance = Instance {
            name: name.to_owned(),
            value,
        };
        self.by_name.insert(name.to_owned(), self.created.len());
        self.created.push(instance.clone());
        instance
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Instance> {
        self.by_name.get(name).map(|&i| &self.created[i])
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.created.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.created.len()
    }

    /// Empties the registry, oldest module first.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Instance> {
        self.by_name.clear();
        self.created.drain(..)
    }
}

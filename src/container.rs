//! The container and its resolution engine.

use std::sync::Arc;

use jacket_config::{Config, LayeredConfig};
use jacket_core::{Contract, Erased};

use crate::activation::{Activation, BOOTSTRAP_MODULE};
use crate::error::{Error, Result};
use crate::injector::{Injector, InjectorObject, check_injection_result};
use crate::registry::{InjectorMap, InjectorRegistry, Instance, ModuleRegistry};

/// A container of modules wired from injectors.
///
/// Injectors are registered under module names, either as eager (built by
/// [`do_wire`](Self::do_wire)) or lazy (built when another module depends on them, or when
/// requested). Only modules named in the [`Activation`] are built. Every module is built at
/// most once and closed by [`close`](Self::close) in creation order.
///
/// The container is meant to be driven from a single thread. Wrap it in a lock, or use
/// [`global`](crate::global), to share it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use jacket::config::LayeredConfig;
/// use jacket::{BoxError, Container, Module};
///
/// trait Database: Module {
///     fn address(&self) -> String;
/// }
///
/// struct MemoryDb(String);
///
/// impl Module for MemoryDb {
///     fn close(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// impl Database for MemoryDb {
///     fn address(&self) -> String {
///         self.0.clone()
///     }
/// }
///
/// trait Server: Module {}
///
/// struct Api(Arc<dyn Database>);
///
/// impl Module for Api {
///     fn close(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// impl Server for Api {}
///
/// let config = LayeredConfig::empty().with_value("address", "localhost:3306");
///
/// let mut container = Container::builder()
///     .config(Arc::new(config))
///     .activating_modules(["db", "api"])
///     .injector("db", |config: Arc<dyn jacket::config::Config>| -> Arc<dyn Database> {
///         Arc::new(MemoryDb(config.get_string("address", "")))
///     })
///     .eager_injector("api", |db: Arc<dyn Database>| -> Arc<dyn Server> { Arc::new(Api(db)) })
///     .build();
///
/// container.do_wire()?;
///
/// let db = container.get::<Arc<dyn Database>>("db").unwrap();
/// assert_eq!(db.address(), "localhost:3306");
///
/// container.close()?;
/// # Ok::<(), jacket::Error>(())
/// ```
pub struct Container {
    service_name: Option<String>,
    config: Arc<dyn Config>,
    injectors: InjectorRegistry,
    modules: ModuleRegistry,
    activation: Activation,
    resolving: Vec<String>,
}

/// A builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    service_name: Option<String>,
    config: Option<Arc<dyn Config>>,
    activation: Option<Activation>,
    lazy: InjectorMap,
    eager: InjectorMap,
}

impl ContainerBuilder {
    /// Sets the service name. It names the default config file (`{service_name}.conf`) and the
    /// config key of the activated modules (`{service_name}_modules`).
    #[must_use]
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Uses `config` instead of loading a [`LayeredConfig`] from the process arguments and
    /// environment.
    #[must_use]
    pub fn config(mut self, config: Arc<dyn Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the activated modules instead of reading them from the config.
    #[must_use]
    pub fn activating_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activation = Some(Activation::new(names));
        self
    }

    /// Registers a lazy injector.
    #[must_use]
    pub fn injector<Args, I>(mut self, name: impl Into<String>, injector: I) -> Self
    where
        I: Injector<Args>,
    {
        self.lazy.insert(name, injector);
        self
    }

    /// Registers an eager injector.
    #[must_use]
    pub fn eager_injector<Args, I>(mut self, name: impl Into<String>, injector: I) -> Self
    where
        I: Injector<Args>,
    {
        self.eager.insert(name, injector);
        self
    }

    /// Replaces the lazy injectors.
    #[must_use]
    pub fn injectors(mut self, injectors: InjectorMap) -> Self {
        self.lazy = injectors;
        self
    }

    /// Replaces the eager injectors.
    #[must_use]
    pub fn eager_injectors(mut self, injectors: InjectorMap) -> Self {
        self.eager = injectors;
        self
    }

    /// Finalizes the container.
    ///
    /// Without an explicit config, a [`LayeredConfig`] is loaded from `--config` (or the
    /// default file) and the process environment. A missing config file is logged, not fatal.
    #[must_use]
    pub fn build(self) -> Container {
        let Self {
            service_name,
            config,
            activation,
            lazy,
            eager,
        } = self;

        let config = config.unwrap_or_else(|| {
            let config = LayeredConfig::from_process(service_name.as_deref());
            if let Err(err) = config.load() {
                warn!(error = %err, "failed to load config, defaults will be used");
            }
            Arc::new(config) as Arc<dyn Config>
        });

        let activation = activation
            .unwrap_or_else(|| Activation::from_config(&*config, service_name.as_deref()));

        let mut injectors = InjectorRegistry::default();
        injectors.set_lazy(lazy);
        injectors.set_eager(eager);
        let bootstrap = Arc::clone(&config);
        injectors.set_bootstrap(
            BOOTSTRAP_MODULE,
            InjectorObject::new(move || Arc::clone(&bootstrap)),
        );

        Container {
            service_name,
            config,
            injectors,
            modules: ModuleRegistry::default(),
            activation,
            resolving: Vec::new(),
        }
    }
}

impl Container {
    /// Returns a new builder for `Container`.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Creates an empty container configured from the process arguments and environment.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates an empty container for `service_name`, see [`ContainerBuilder::service_name`].
    #[must_use]
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self::builder().service_name(service_name).build()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// The config facade, also available to injectors as the `viperconfig` module.
    pub fn config(&self) -> Arc<dyn Config> {
        Arc::clone(&self.config)
    }

    pub const fn activation(&self) -> &Activation {
        &self.activation
    }

    /// Replaces the activated modules. Modules already built stay built.
    pub fn set_activating_modules<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activation = Activation::new(names);
    }

    /// Registers a lazy injector, replacing any lazy injector of the same name.
    pub fn add_injector<Args, I>(&mut self, name: impl Into<String>, injector: I)
    where
        I: Injector<Args>,
    {
        self.injectors
            .register(name.into(), Arc::new(InjectorObject::new(injector)), false);
    }

    /// Registers an eager injector, replacing any eager injector of the same name.
    pub fn add_eager_injector<Args, I>(&mut self, name: impl Into<String>, injector: I)
    where
        I: Injector<Args>,
    {
        self.injectors
            .register(name.into(), Arc::new(InjectorObject::new(injector)), true);
    }

    /// Replaces all lazy injectors.
    pub fn set_injectors(&mut self, injectors: InjectorMap) {
        self.injectors.set_lazy(injectors);
    }

    /// Replaces all eager injectors.
    pub fn set_eager_injectors(&mut self, injectors: InjectorMap) {
        self.injectors.set_eager(injectors);
    }

    /// Builds every activated eager module, and their dependencies.
    ///
    /// Eager injectors whose module is not activated are skipped. Without any eager injector,
    /// every activated module is built instead, see [`wire_all`](Self::wire_all).
    ///
    /// # Errors
    ///
    /// Fails fast on the first module that cannot be built, with the error wrapped in
    /// [`Error::Wiring`]. Modules built before the failure stay registered.
    pub fn do_wire(&mut self) -> Result<()> {
        if self.injectors.is_empty() {
            return Err(Error::NoInjectorsRegistered);
        }
        if self.activation.is_empty() {
            return Err(Error::NoActivatingModules);
        }
        if self.injectors.eager().is_empty() {
            return self.wire_all();
        }

        let names: Vec<String> = self.injectors.eager().names().map(str::to_owned).collect();
        for name in names {
            if !self.activation.contains(&name) {
                debug!(module = %name, "eager module is not activated, skipping");
                continue;
            }
            self.build_module(&name).map_err(|err| err.wiring(&name))?;
        }

        info!(modules = self.modules.len(), "wiring done");
        Ok(())
    }

    /// Builds every activated module.
    ///
    /// Pending modules are built in passes: each pass builds the modules whose dependencies
    /// are all satisfied by modules built so far, until a pass makes no progress. Whatever is
    /// left is then resolved recursively, which either builds it or reports why it cannot be
    /// built.
    ///
    /// # Errors
    ///
    /// Fails fast like [`do_wire`](Self::do_wire).
    pub fn wire_all(&mut self) -> Result<()> {
        let mut pending: Vec<String> = self
            .activation
            .names()
            .iter()
            .filter(|name| !self.modules.contains(name))
            .cloned()
            .collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::with_capacity(before);
            for name in pending {
                if self.is_ready(&name) {
                    self.build_module(&name).map_err(|err| err.wiring(&name))?;
                } else {
                    deferred.push(name);
                }
            }
            pending = deferred;

            if pending.len() == before {
                break;
            }
        }

        for name in pending {
            if !self.modules.contains(&name) {
                self.build_module(&name).map_err(|err| err.wiring(&name))?;
            }
        }

        info!(modules = self.modules.len(), "wiring done");
        Ok(())
    }

    /// Returns `true` if `name` has an injector whose dependencies are all built.
    fn is_ready(&self, name: &str) -> bool {
        self.injectors.get(name).is_some_and(|injector| {
            injector
                .dependencies()
                .iter()
                .all(|dependency| self.find_built(dependency).is_some())
        })
    }

    /// Builds the module `name` and its dependencies, unless it is already built.
    ///
    /// Each parameter of the injector is satisfied by an activated module already built for
    /// the same contract, or else by building the module of an injector declaring that
    /// contract as its return type. Injectors of activated modules are preferred, then
    /// registration order decides.
    ///
    /// # Errors
    ///
    /// - [`Error::NotActivated`] if `name`, or a dependency picked to be built, is not
    ///   activated.
    /// - [`Error::NoInjector`] if `name` has no injector.
    /// - [`Error::UnresolvedDependency`] if no injector provides a parameter contract.
    /// - [`Error::DependencyCycle`] if `name` transitively depends on itself.
    /// - [`Error::InjectionFailed`] if the injector returned an error or an invalid shape. The
    ///   module is not recorded in that case.
    pub fn build_module(&mut self, name: &str) -> Result<Instance> {
        if let Some(instance) = self.modules.get(name) {
            return Ok(instance.clone());
        }
        if !self.activation.contains(name) {
            return Err(Error::NotActivated(name.to_owned()));
        }
        let injector = self
            .injectors
            .get(name)
            .ok_or_else(|| Error::NoInjector(name.to_owned()))?;

        if let Some(start) = self.resolving.iter().position(|n| n == name) {
            let mut cycle = self.resolving[start..].to_vec();
            cycle.push(name.to_owned());
            return Err(Error::DependencyCycle(cycle));
        }

        self.resolving.push(name.to_owned());
        let res = self.construct(name, &injector);
        self.resolving.pop();
        res
    }

    fn construct(&mut self, name: &str, injector: &InjectorObject) -> Result<Instance> {
        let mut args = Vec::with_capacity(injector.dependencies().len());
        for dependency in injector.dependencies() {
            args.push(self.resolve(dependency)?);
        }

        let values = injector.call(args)?;
        let value = check_injection_result(values).map_err(|source| Error::InjectionFailed {
            module: name.to_owned(),
            source,
        })?;

        debug!(module = name, contract = %value.contract(), "module built");
        Ok(self.modules.record(name, value))
    }

    fn resolve(&mut self, dependency: &Contract) -> Result<Erased> {
        if let Some(instance) = self.find_built(dependency) {
            return Ok(instance.value().value().clone());
        }

        let provider = self
            .find_provider(dependency)
            .ok_or(Error::UnresolvedDependency(*dependency))?;
        debug!(dependency = %dependency, module = %provider, "resolving dependency");

        let instance = self.build_module(&provider)?;
        Ok(instance.value().value().clone())
    }

    /// The oldest activated module built for `contract`.
    fn find_built(&self, contract: &Contract) -> Option<&Instance> {
        self.modules.iter().find(|instance| {
            instance.contract().matches(contract) && self.activation.contains(instance.name())
        })
    }

    /// The name of the injector declaring `contract` as its return type.
    fn find_provider(&self, contract: &Contract) -> Option<String> {
        let mut candidates = self
            .injectors
            .all()
            .filter(|(_, injector)| injector.provides_contract(contract))
            .map(|(name, _)| name);

        let first = candidates.next()?;
        if self.activation.contains(first) {
            return Some(first.to_owned());
        }
        Some(
            candidates
                .find(|name| self.activation.contains(name))
                .unwrap_or(first)
                .to_owned(),
        )
    }

    /// Returns the module `name`, building it on demand.
    ///
    /// Returns `None` if there is no injector for it or it failed to build; use
    /// [`build_module`](Self::build_module) to get the reason.
    pub fn module(&mut self, name: &str) -> Option<Instance> {
        if let Some(instance) = self.modules.get(name) {
            return Some(instance.clone());
        }
        self.injectors.get(name)?;

        match self.build_module(name) {
            Ok(instance) => Some(instance),
            Err(err) => {
                debug!(module = name, error = %err, "failed to build module on demand");
                None
            }
        }
    }

    /// Returns the module `name` as `T`, building it on demand.
    pub fn get<T>(&mut self, name: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.module(name)?.downcast()
    }

    /// Returns the first built module matching `contract`, building the module of an
    /// injector returning `contract` on demand.
    ///
    /// Returns `None` if no injector returns `contract`.
    pub fn module_by_type(&mut self, contract: &Contract) -> Option<Instance> {
        let provider = self.find_provider(contract)?;
        if let Err(err) = self.build_module(&provider) {
            debug!(module = %provider, error = %err, "failed to build module on demand");
        }

        self.modules
            .iter()
            .find(|instance| instance.contract().matches(contract))
            .cloned()
    }

    /// Typed variant of [`module_by_type`](Self::module_by_type).
    pub fn get_by_type<T>(&mut self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.module_by_type(&Contract::of::<T>())?.downcast()
    }

    /// Returns `true` if `name` has been built.
    pub fn is_built(&self, name: &str) -> bool {
        self.modules.contains(name)
    }

    /// The built modules, oldest first.
    pub fn modules(&self) -> impl Iterator<Item = &Instance> {
        self.modules.iter()
    }

    /// Closes every built module, oldest first, and empties the container.
    ///
    /// A module failing to close is logged and does not stop the others from being closed.
    ///
    /// # Errors
    ///
    /// Never fails. The [`Result`] is kept so callers can treat shutdown like any other
    /// fallible step.
    pub fn close(&mut self) -> Result<()> {
        for instance in self.modules.drain() {
            match instance.close() {
                Ok(()) => debug!(module = instance.name(), "module closed"),
                Err(err) => {
                    error!(module = instance.name(), error = %err, "failed to close module");
                }
            }
        }
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_name", &self.service_name)
            .field("activation", &self.activation)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

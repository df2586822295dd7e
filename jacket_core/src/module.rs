//! The module capability contract and the shapes injectors may return.

use std::sync::Arc;

use crate::contract::Contract;
use crate::erased::Erased;

/// A boxed error produced by user code, e.g. a failing injector or [`Module::close`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A component built by an injector.
///
/// Every module exposes a single capability: it can be closed gracefully. Capability contracts
/// are expressed as subtraits of `Module`, and modules are shared as `Arc<dyn Subtrait>`:
///
/// ```
/// use jacket_core::{BoxError, Module};
///
/// trait Database: Module {
///     fn connect(&self) -> Result<(), BoxError>;
/// }
/// ```
pub trait Module: Send + Sync + 'static {
    /// Closes the module.
    ///
    /// # Errors
    ///
    /// Returns whatever error the module encountered while releasing its resources. Closing is
    /// not required to be idempotent.
    fn close(&self) -> Result<(), BoxError>;
}

impl<M> Module for Arc<M>
where
    M: ?Sized + Module,
{
    #[inline]
    fn close(&self) -> Result<(), BoxError> {
        (**self).close()
    }
}

impl<M> Module for Box<M>
where
    M: ?Sized + Module,
{
    #[inline]
    fn close(&self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// A built module together with its contract.
#[derive(Clone)]
pub struct ModuleValue {
    contract: Contract,
    value: Erased,
    closer: Arc<dyn Module>,
}

impl ModuleValue {
    /// Wraps a shared module. Its contract is `Arc<M>`.
    pub fn new<M>(module: Arc<M>) -> Self
    where
        M: ?Sized + Module,
    {
        let value = Erased::new(Arc::clone(&module));
        let closer: Arc<dyn Module> = Arc::new(module);

        Self {
            contract: Contract::of::<Arc<M>>(),
            value,
            closer,
        }
    }

    #[inline]
    pub const fn contract(&self) -> &Contract {
        &self.contract
    }

    #[inline]
    pub const fn value(&self) -> &Erased {
        &self.value
    }

    /// Returns a clone of the module if its contract is `T`.
    pub fn downcast<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.value.downcast_ref::<T>().cloned()
    }

    /// Closes the underlying module.
    ///
    /// # Errors
    ///
    /// Forwards the error returned by [`Module::close`].
    #[inline]
    pub fn close(&self) -> Result<(), BoxError> {
        self.closer.close()
    }
}

impl std::fmt::Debug for ModuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleValue")
            .field("contract", &self.contract.name())
            .finish_non_exhaustive()
    }
}

/// One value returned by an injector call.
#[derive(Debug)]
pub enum ReturnValue {
    Module(ModuleValue),
    Error(BoxError),
    /// A `None` module or a successful error slot.
    Absent,
}

/// Return types accepted from injectors.
///
/// An injector returns either one value, the module, or two values, the module and an error.
/// The implementations below cover:
///
/// | Return type                  | Values                    |
/// |------------------------------|---------------------------|
/// | `Arc<M>`                     | `(module)`                |
/// | `Option<Arc<M>>`             | `(module or absent)`      |
/// | `Result<Arc<M>, E>`          | `(module, error)`         |
/// | `Result<Option<Arc<M>>, E>`  | `(module, error)`         |
/// | `()`                         | nothing                   |
///
/// Shapes are only checked when the injector is called, so an injector returning `()` or
/// `Ok(None)` can be registered but will never build.
pub trait Returns: Send + 'static {
    /// The contract of the returned module, if the shape carries one.
    fn contract() -> Option<Contract>;

    /// Splits `self` into the values seen by the resolution engine.
    fn into_values(self) -> Vec<ReturnValue>;
}

impl<M> Returns for Arc<M>
where
    M: ?Sized + Module,
{
    fn contract() -> Option<Contract> {
        Some(Contract::of::<Self>())
    }

    fn into_values(self) -> Vec<ReturnValue> {
        vec![ReturnValue::Module(ModuleValue::new(self))]
    }
}

impl<M> Returns for Option<Arc<M>>
where
    M: ?Sized + Module,
{
    fn contract() -> Option<Contract> {
        Some(Contract::of::<Arc<M>>())
    }

    fn into_values(self) -> Vec<ReturnValue> {
        vec![self.map_or(ReturnValue::Absent, |m| {
            ReturnValue::Module(ModuleValue::new(m))
        })]
    }
}

impl<M, E> Returns for Result<Arc<M>, E>
where
    M: ?Sized + Module,
    E: Into<BoxError> + Send + 'static,
{
    fn contract() -> Option<Contract> {
        Some(Contract::of::<Arc<M>>())
    }

    fn into_values(self) -> Vec<ReturnValue> {
        match self {
            Ok(m) => vec![ReturnValue::Module(ModuleValue::new(m)), ReturnValue::Absent],
            Err(e) => vec![ReturnValue::Absent, ReturnValue::Error(e.into())],
        }
    }
}

impl<M, E> Returns for Result<Option<Arc<M>>, E>
where
    M: ?Sized + Module,
    E: Into<BoxError> + Send + 'static,
{
    fn contract() -> Option<Contract> {
        Some(Contract::of::<Arc<M>>())
    }

    fn into_values(self) -> Vec<ReturnValue> {
        match self {
            Ok(m) => vec![
                m.map_or(ReturnValue::Absent, |m| {
                    ReturnValue::Module(ModuleValue::new(m))
                }),
                ReturnValue::Absent,
            ],
            Err(e) => vec![ReturnValue::Absent, ReturnValue::Error(e.into())],
        }
    }
}

impl Returns for () {
    fn contract() -> Option<Contract> {
        None
    }

    fn into_values(self) -> Vec<ReturnValue> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    trait Cache: Module {
        fn hits(&self) -> usize;
    }

    #[derive(Default)]
    struct MemoryCache {
        closed: AtomicUsize,
    }

    impl Module for MemoryCache {
        fn close(&self) -> Result<(), BoxError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Cache for MemoryCache {
        fn hits(&self) -> usize {
            3
        }
    }

    fn cache() -> Arc<dyn Cache> {
        Arc::new(MemoryCache::default())
    }

    #[test]
    fn test_module_value_keeps_contract() {
        let value = ModuleValue::new(cache());
        assert!(value.contract().is::<Arc<dyn Cache>>());
        assert_eq!(value.downcast::<Arc<dyn Cache>>().unwrap().hits(), 3);
        assert!(value.downcast::<Arc<MemoryCache>>().is_none());
    }

    #[test]
    fn test_module_value_close_reaches_module() {
        let concrete = Arc::new(MemoryCache::default());
        let value = ModuleValue::new(Arc::clone(&concrete) as Arc<dyn Cache>);
        value.close().unwrap();
        value.clone().close().unwrap();
        assert_eq!(concrete.closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_single_value_shapes() {
        assert_eq!(
            <Arc<dyn Cache> as Returns>::contract(),
            Some(Contract::of::<Arc<dyn Cache>>())
        );
        assert!(matches!(cache().into_values().as_slice(), [ReturnValue::Module(_)]));
        assert!(matches!(
            Option::<Arc<dyn Cache>>::None.into_values().as_slice(),
            [ReturnValue::Absent]
        ));
    }

    #[test]
    fn test_result_shapes() {
        let ok: Result<Arc<dyn Cache>, BoxError> = Ok(cache());
        assert!(matches!(
            ok.into_values().as_slice(),
            [ReturnValue::Module(_), ReturnValue::Absent]
        ));

        let err: Result<Arc<dyn Cache>, &str> = Err("boom");
        match err.into_values().as_slice() {
            [ReturnValue::Absent, ReturnValue::Error(e)] => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected values: {other:?}"),
        }

        let none: Result<Option<Arc<dyn Cache>>, BoxError> = Ok(None);
        assert!(matches!(
            none.into_values().as_slice(),
            [ReturnValue::Absent, ReturnValue::Absent]
        ));
        assert_eq!(
            <Result<Option<Arc<dyn Cache>>, BoxError> as Returns>::contract(),
            Some(Contract::of::<Arc<dyn Cache>>())
        );
    }

    #[test]
    fn test_unit_has_no_values() {
        assert!(<() as Returns>::contract().is_none());
        assert!(().into_values().is_empty());
    }
}

//! Injector functions and their type-erased form.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

use jacket_core::{Contract, Erased, ModuleValue, ReturnValue, Returns};

use crate::error::{Error, Result};

/// [`Injector`] describes how to build a module out of its dependencies.
///
/// In most cases, you don't need to implement this trait manually, as it is implemented on
/// every `Fn(T1, ..., Tn) -> O` with up to 12 parameters, where each parameter is a cloneable
/// capability contract (usually `Arc<dyn Trait>`) and `O` implements [`Returns`].
///
/// ```
/// use std::sync::Arc;
///
/// use jacket::{BoxError, Module};
///
/// trait Database: Module {}
/// trait Blockchain: Module {}
///
/// struct Chain(Arc<dyn Database>);
///
/// impl Module for Chain {
///     fn close(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// impl Blockchain for Chain {}
///
/// fn inject_chain(db: Arc<dyn Database>) -> Result<Arc<dyn Blockchain>, BoxError> {
///     Ok(Arc::new(Chain(db)))
/// }
///
/// # fn is_injector<A, I: jacket::Injector<A>>(_: I) {}
/// # is_injector(inject_chain);
/// ```
pub trait Injector<Args>: Send + Sync + 'static {
    /// The return shape of the injector.
    type Output: Returns;

    /// The contracts of the parameters, in declaration order.
    fn dependencies() -> Vec<Contract>;

    /// Calls the injector with resolved arguments, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDependency`] if an argument is missing or is not of the
    /// declared parameter type.
    fn inject(&self, args: Vec<Erased>) -> Result<Self::Output>;
}

fn take_arg<T>(args: &mut impl Iterator<Item = Erased>) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    args.next()
        .and_then(|arg| arg.downcast::<T>().ok())
        .ok_or_else(Error::unresolved_dependency::<T>)
}

impl<F, O> Injector<()> for F
where
    F: Fn() -> O + Send + Sync + 'static,
    O: Returns,
{
    type Output = O;

    fn dependencies() -> Vec<Contract> {
        Vec::new()
    }

    fn inject(&self, _args: Vec<Erased>) -> Result<Self::Output> {
        Ok(self())
    }
}

macro_rules! impl_injector_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, O, $($ty,)*> Injector<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> O + Send + Sync + 'static,
            O: Returns,
            $( $ty: Clone + Send + Sync + 'static, )*
        {
            type Output = O;

            fn dependencies() -> Vec<Contract> {
                vec![$( Contract::of::<$ty>(), )*]
            }

            fn inject(&self, args: Vec<Erased>) -> Result<Self::Output> {
                let mut args = args.into_iter();
                $( let $ty = take_arg::<$ty>(&mut args)?; )*
                Ok(self($($ty,)*))
            }
        }
    };
}

apply_tuples!(impl_injector_fn);

type BoxedInjectFn = Box<dyn Fn(Vec<Erased>) -> Result<Vec<ReturnValue>> + Send + Sync>;

/// A dispatchable [`Injector`] with its signature captured at registration time.
pub struct InjectorObject {
    dependencies: Vec<Contract>,
    provides: Option<Contract>,
    boxed: BoxedInjectFn,
    concrete_type: &'static str,
}

impl InjectorObject {
    /// Erases a concrete injector.
    pub fn new<Args, I>(injector: I) -> Self
    where
        I: Injector<Args>,
    {
        Self {
            dependencies: I::dependencies(),
            provides: <I::Output as Returns>::contract(),
            boxed: Box::new(move |args| injector.inject(args).map(Returns::into_values)),
            concrete_type: type_name::<I>(),
        }
    }

    /// The contracts the injector needs, in parameter order.
    #[inline]
    pub fn dependencies(&self) -> &[Contract] {
        &self.dependencies
    }

    /// The contract of the module the injector declares to return.
    #[inline]
    pub const fn provides(&self) -> Option<&Contract> {
        self.provides.as_ref()
    }

    /// Returns `true` if the declared return contract matches `declared`.
    pub fn provides_contract(&self, declared: &Contract) -> bool {
        self.provides.is_some_and(|c| c.matches(declared))
    }

    pub(crate) fn call(&self, args: Vec<Erased>) -> Result<Vec<ReturnValue>> {
        (self.boxed)(args)
    }
}

impl std::fmt::Debug for InjectorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectorObject")
            .field("concrete_type", &self.concrete_type)
            .field("provides", &self.provides.map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

fn shape(msg: impl Into<String>) -> Arc<dyn StdError + Send + Sync + 'static> {
    Arc::new(Error::InvalidReturnShape(msg.into()))
}

/// Checks the values returned by an injector call.
///
/// One value must be a module. Two values are read as `(module, error)`: a present error is the
/// failure, otherwise the first value must be a module. Any other arity is invalid.
pub(crate) fn check_injection_result(
    values: Vec<ReturnValue>,
) -> Result<ModuleValue, Arc<dyn StdError + Send + Sync + 'static>> {
    let mut values = values.into_iter();
    match (values.next(), values.next(), values.next()) {
        (Some(ReturnValue::Module(module)), None, None)
        | (Some(ReturnValue::Module(module)), Some(ReturnValue::Absent), None) => Ok(module),
        (Some(_), None, None) => Err(shape("returned value is not a module")),
        (Some(_), Some(ReturnValue::Error(err)), None) => Err(Arc::from(err)),
        (Some(_), Some(ReturnValue::Absent), None) => {
            Err(shape("returned value is not a module"))
        }
        (Some(_), Some(ReturnValue::Module(_)), None) => {
            Err(shape("second returned value is not an error"))
        }
        (first, second, third) => {
            let len = [first.is_some(), second.is_some(), third.is_some()]
                .into_iter()
                .filter(|present| *present)
                .count()
                + values.count();
            Err(shape(format!("expected 1 or 2 returned values, got {len}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use jacket_core::{BoxError, Module};

    use super::*;

    trait Database: Module {}
    trait Ledger: Module {}

    struct Memory;

    impl Module for Memory {
        fn close(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Database for Memory {}
    impl Ledger for Memory {}

    fn db() -> Arc<dyn Database> {
        Arc::new(Memory)
    }

    fn ledger(_db: Arc<dyn Database>) -> Result<Arc<dyn Ledger>, BoxError> {
        Ok(Arc::new(Memory))
    }

    #[test]
    fn test_signature_is_captured() {
        let object = InjectorObject::new(ledger);
        assert_eq!(object.dependencies(), &[Contract::of::<Arc<dyn Database>>()]);
        assert!(object.provides_contract(&Contract::of::<Arc<dyn Ledger>>()));
        assert!(!object.provides_contract(&Contract::of::<Arc<dyn Database>>()));

        let object = InjectorObject::new(db);
        assert!(object.dependencies().is_empty());
        assert!(object.provides().unwrap().is::<Arc<dyn Database>>());
    }

    #[test]
    fn test_closure_injector() {
        let object = InjectorObject::new(|_: Arc<dyn Database>, _: Arc<dyn Ledger>| ());
        assert_eq!(object.dependencies().len(), 2);
        assert!(object.provides().is_none());
    }

    #[test]
    fn test_call_with_wrong_argument() {
        let object = InjectorObject::new(ledger);
        let err = object.call(vec![Erased::new(7_u32)]).unwrap_err();
        assert!(err.is_unresolved_dependency_for::<Arc<dyn Database>>());

        let err = object.call(Vec::new()).unwrap_err();
        assert!(err.is_unresolved_dependency());
    }

    #[test]
    fn test_check_single_module() {
        let values = InjectorObject::new(db).call(Vec::new()).unwrap();
        let module = check_injection_result(values).unwrap();
        assert!(module.contract().is::<Arc<dyn Database>>());
    }

    #[test]
    fn test_check_module_and_error() {
        let values = InjectorObject::new(ledger)
            .call(vec![Erased::new(db())])
            .unwrap();
        assert!(check_injection_result(values).is_ok());

        let failing = || -> Result<Arc<dyn Database>, BoxError> { Err("boom".into()) };
        let values = InjectorObject::new(failing).call(Vec::new()).unwrap();
        let err = check_injection_result(values).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_check_invalid_shapes() {
        let is_shape = |err: Arc<dyn StdError + Send + Sync>| {
            err.downcast_ref::<Error>()
                .is_some_and(Error::is_invalid_return_shape)
        };

        assert!(is_shape(check_injection_result(Vec::new()).unwrap_err()));
        assert!(is_shape(
            check_injection_result(vec![ReturnValue::Absent]).unwrap_err()
        ));
        assert!(is_shape(
            check_injection_result(vec![ReturnValue::Absent, ReturnValue::Absent]).unwrap_err()
        ));
        assert!(is_shape(
            check_injection_result(vec![
                ReturnValue::Module(ModuleValue::new(db())),
                ReturnValue::Absent,
                ReturnValue::Absent,
            ])
            .unwrap_err()
        ));
        assert!(is_shape(
            check_injection_result(vec![
                ReturnValue::Module(ModuleValue::new(db())),
                ReturnValue::Module(ModuleValue::new(db())),
            ])
            .unwrap_err()
        ));
    }
}

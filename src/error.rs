//! Error types.

use std::error::Error as StdError;
use std::sync::Arc;

use jacket_core::Contract;

/// [`Error`] is an error that can be raised while wiring or querying a
/// [`Container`](crate::Container).
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("no injectors are registered")]
    NoInjectorsRegistered,

    #[error("no modules are activated")]
    NoActivatingModules,

    #[error("module `{0}` is not activated")]
    NotActivated(String),

    #[error("no injector is registered for module `{0}`")]
    NoInjector(String),

    #[error("no injector provides dependency `{0}`")]
    UnresolvedDependency(Contract),

    #[error("invalid injector return shape: {0}")]
    InvalidReturnShape(String),

    #[error("failed to inject module `{module}`: {source}")]
    InjectionFailed {
        module: String,
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A failure of the eager wiring pass, attributed to the module being wired.
    #[error("[{module}] {source}")]
    Wiring { module: String, source: Box<Error> },
}

impl Error {
    pub fn unresolved_dependency<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self::UnresolvedDependency(Contract::of::<T>())
    }

    pub(crate) fn wiring(self, module: &str) -> Self {
        Self::Wiring {
            module: module.to_owned(),
            source: Box::new(self),
        }
    }

    /// Strips [`Wiring`](Self::Wiring) context and returns the error that caused it.
    pub fn root(&self) -> &Self {
        match self {
            Self::Wiring { source, .. } => source.root(),
            _ => self,
        }
    }

    pub fn is_not_activated(&self) -> bool {
        matches!(self.root(), Self::NotActivated(_))
    }

    pub fn is_not_activated_for(&self, name: &str) -> bool {
        matches!(self.root(), Self::NotActivated(n) if n == name)
    }

    pub fn is_no_injector(&self) -> bool {
        matches!(self.root(), Self::NoInjector(_))
    }

    pub fn is_unresolved_dependency(&self) -> bool {
        matches!(self.root(), Self::UnresolvedDependency(_))
    }

    pub fn is_unresolved_dependency_for<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        matches!(self.root(), Self::UnresolvedDependency(c) if c.is::<T>())
    }

    pub fn is_injection_failed(&self) -> bool {
        matches!(self.root(), Self::InjectionFailed { .. })
    }

    pub fn is_dependency_cycle(&self) -> bool {
        matches!(self.root(), Self::DependencyCycle(_))
    }

    /// Returns `true` for a return shape violation, whether raised directly or as the cause of
    /// an [`InjectionFailed`](Self::InjectionFailed).
    pub fn is_invalid_return_shape(&self) -> bool {
        match self.root() {
            Self::InvalidReturnShape(_) => true,
            Self::InjectionFailed { source, .. } => source
                .downcast_ref::<Self>()
                .is_some_and(Self::is_invalid_return_shape),
            _ => false,
        }
    }

    /// The error reported by the injector, for [`InjectionFailed`](Self::InjectionFailed).
    pub fn injection_cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self.root() {
            Self::InjectionFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// [`Result`] is an alias to [`core::result::Result`] with [`Error`] as the
/// default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_root_unwraps_wiring() {
        let err = Error::NotActivated("db".into())
            .wiring("chain")
            .wiring("server");
        assert!(err.is_not_activated_for("db"));
        assert!(!err.is_not_activated_for("chain"));
        assert_eq!(err.to_string(), "[server] [chain] module `db` is not activated");
    }

    #[test]
    fn test_unresolved_dependency_for() {
        let err = Error::unresolved_dependency::<Arc<String>>();
        assert!(err.is_unresolved_dependency_for::<Arc<String>>());
        assert!(!err.is_unresolved_dependency_for::<Arc<u8>>());
    }

    #[test]
    fn test_invalid_return_shape_through_injection_failed() {
        let err = Error::InjectionFailed {
            module: "db".into(),
            source: Arc::new(Error::InvalidReturnShape("no values".into())),
        };
        assert!(err.is_injection_failed());
        assert!(err.is_invalid_return_shape());
        assert_eq!(
            err.to_string(),
            "failed to inject module `db`: invalid injector return shape: no values"
        );
    }

    #[test]
    fn test_injection_cause() {
        let source: Box<dyn StdError + Send + Sync> = "boom".into();
        let err = Error::InjectionFailed {
            module: "db".into(),
            source: Arc::from(source),
        };
        assert_eq!(err.injection_cause().unwrap().to_string(), "boom");
        assert!(!err.is_invalid_return_shape());
    }

    #[test]
    fn test_dependency_cycle_display() {
        let err = Error::DependencyCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }
}

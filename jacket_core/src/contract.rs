//! Nominal identity of capability contracts.

use std::any::{TypeId, type_name};
use std::hash::{Hash, Hasher};

/// The identity of a capability contract type.
///
/// A contract is usually an `Arc<dyn Trait>` where `Trait` is a [`Module`](crate::Module)
/// subtrait. Two contracts match when they denote the very same type, that is the same name
/// declared in the same crate and module path. There is no structural fallback: an
/// `Arc<Concrete>` never satisfies an `Arc<dyn Trait>` request, even if `Concrete: Trait`.
#[derive(Clone, Copy, Debug)]
pub struct Contract {
    id: TypeId,
    name: &'static str,
}

impl Contract {
    /// Returns the contract of type `T`.
    #[inline]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified name of the contract type, for diagnostics only.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if a value of this contract can be passed where `declared` is expected.
    #[inline]
    pub fn matches(&self, declared: &Self) -> bool {
        self.id == declared.id
    }

    /// Returns `true` if this contract is the contract of `T`.
    #[inline]
    pub fn is<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.id == TypeId::of::<T>()
    }
}

/// Free-standing form of [`Contract::matches`].
#[inline]
pub fn matches(candidate: &Contract, declared: &Contract) -> bool {
    candidate.matches(declared)
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contract {}

impl Hash for Contract {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

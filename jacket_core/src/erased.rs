//! Module values with their concrete type erased.

use std::any::{Any, type_name};

/// Clones a value behind a trait object into a new [`Box`].
///
/// [`Clone`] requires [`Sized`], so it cannot be used on `dyn` values directly.
trait CloneBoxed: Any + Send + Sync {
    fn clone_boxed(&self) -> Box<dyn CloneBoxed>;
}

impl<T> CloneBoxed for T
where
    T: Any + Clone + Send + Sync,
{
    fn clone_boxed(&self) -> Box<dyn CloneBoxed> {
        Box::new(self.clone())
    }
}

/// A cloneable value of an arbitrary `'static` type.
///
/// Injector arguments and built modules travel through the resolution engine as [`Erased`]
/// values, and are recovered with [`downcast`](Self::downcast) or
/// [`downcast_ref`](Self::downcast_ref) right before they are handed to user code.
pub struct Erased {
    inner: Box<dyn CloneBoxed>,
    type_name: &'static str,
}

impl Erased {
    /// Erases the type of `value`.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// The name of the concrete type of the erased value.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the erased value is of type `T`.
    #[inline]
    pub fn is<T>(&self) -> bool
    where
        T: 'static,
    {
        self.as_any().is::<T>()
    }

    /// Returns a reference to the erased value as [`Any`].
    #[inline]
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }

    /// Returns a reference to the value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: 'static,
    {
        self.as_any().downcast_ref()
    }

    /// Unwraps the value if it is of type `T`.
    ///
    /// # Errors
    ///
    /// Gives `self` back if the value is of any other type.
    pub fn downcast<T>(self) -> Result<T, Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.is::<T>() {
            return Err(self);
        }

        #[expect(clippy::missing_panics_doc, reason = "already checked")]
        let concrete = (self.inner as Box<dyn Any + Send + Sync>)
            .downcast::<T>()
            .expect("the erased value should be of type `T` as it was checked before");
        Ok(*concrete)
    }
}

impl Clone for Erased {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_name: self.type_name,
        }
    }
}

impl std::fmt::Debug for Erased {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erased")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Erased;

    #[allow(dead_code)]
    fn test_implements_send_and_sync() -> impl Send + Sync {
        Erased::new("Hello".to_string())
    }

    #[test]
    fn test_downcast() {
        let erased = Erased::new("Hello".to_string());
        let got = erased.downcast::<String>().unwrap();
        assert_eq!(got, "Hello");
    }

    #[test]
    fn test_downcast_err_gives_value_back() {
        let erased = Erased::new("Hello".to_string());
        let err = erased.downcast::<i32>().unwrap_err();
        assert_eq!(err.downcast::<String>().unwrap(), "Hello");
    }

    #[test]
    fn test_downcast_ref() {
        let erased = Erased::new(Arc::new(7_u8));
        assert_eq!(**erased.downcast_ref::<Arc<u8>>().unwrap(), 7);
        assert!(erased.downcast_ref::<u8>().is_none());
    }

    #[test]
    fn test_type_name() {
        let erased = Erased::new(Arc::new(7_u8));
        assert!(erased.type_name().contains("Arc"));
        assert!(erased.is::<Arc<u8>>());
    }

    #[test]
    fn test_clone_shares_arc() {
        let a = Arc::new(100);
        let erased = Erased::new(Arc::clone(&a));
        assert_eq!(Arc::strong_count(&a), 2);

        let cloned = erased.clone();
        assert_eq!(Arc::strong_count(&a), 3);

        drop(cloned);
        drop(erased);
        assert_eq!(Arc::strong_count(&a), 1);
    }
}

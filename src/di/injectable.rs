use crate::error::{Result, StanzaError};
use crate::metadata::Target;
use std::any::Any;
use std::sync::Arc;

/// A memoized, type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Positional view over the resolved constructor arguments of an injectable.
pub struct Deps<'a> {
    items: &'a [Instance],
}

impl<'a> Deps<'a> {
    pub(crate) fn new(items: &'a [Instance]) -> Self {
        Self { items }
    }

    /// The resolved instance at constructor slot `index`.
    ///
    /// # Errors
    /// Fails if the slot is out of range or holds a different type than the
    /// one requested (a miswired injection override).
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let instance = self.items.get(index).ok_or_else(|| {
            StanzaError::Internal(format!("constructor slot {index} out of range"))
        })?;
        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| StanzaError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Trait for types constructible by the injector registry.
///
/// This is the explicit replacement for constructor reflection: the
/// dependency list mirrors the constructor parameter types in order, and
/// `construct` receives the resolved instances positionally.
///
/// # Example
/// ```
/// use stanza::prelude::*;
///
/// pub struct UserRepository;
///
/// impl Injectable for UserRepository {
///     fn construct(_deps: &Deps<'_>) -> stanza::Result<Self> {
///         Ok(Self)
///     }
/// }
///
/// pub struct UserService {
///     repository: Arc<UserRepository>,
/// }
///
/// impl Injectable for UserService {
///     fn dependencies() -> Vec<Target> {
///         vec![Target::of::<UserRepository>()]
///     }
///
///     fn construct(deps: &Deps<'_>) -> stanza::Result<Self> {
///         Ok(Self { repository: deps.get(0)? })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Constructor parameter types, in declaration order. Defaults to none.
    fn dependencies() -> Vec<Target> {
        Vec::new()
    }

    /// Create an instance from the resolved dependency instances.
    ///
    /// # Errors
    /// Returns an error if a dependency slot does not hold the expected type.
    fn construct(deps: &Deps<'_>) -> Result<Self>;
}

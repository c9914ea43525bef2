use crate::metadata::{Container, MetadataKey, Target};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct TokenInner {
    name: String,
}

/// An unforgeable injector identity.
///
/// The name is a diagnostic label only; two tokens are equal iff they are
/// the same allocation. Names may collide across modules, which is exactly
/// why equality is never name-based.
#[derive(Clone)]
pub struct Token {
    inner: Arc<TokenInner>,
}

impl Token {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TokenInner { name: name.into() }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("name", &self.inner.name)
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

/// Mint a fresh identity for `target`, labelled with its short type name,
/// and persist it under [`MetadataKey::InjectableId`].
///
/// Calling this twice on the same target overwrites the stored identity;
/// callers that need a stable identity across calls must guard against
/// double registration themselves.
pub fn set_injector_id(container: &Container, target: Target) -> Token {
    let id = Token::new(target.short_name());
    container.define(target, id.clone(), MetadataKey::InjectableId, None);
    id
}

/// Read back the identity stored for `target`, if any.
pub fn get_injector_id(container: &Container, target: Target) -> Option<Token> {
    container
        .get::<Token>(target, MetadataKey::InjectableId, None)
        .map(|token| (*token).clone())
}

mod injectable;
mod store;
mod token;

pub use injectable::{Deps, Injectable, Instance};
pub use store::{InjectOverride, InjectableKey, InjectorInfo, Store};
pub use token::{Token, get_injector_id, set_injector_id};

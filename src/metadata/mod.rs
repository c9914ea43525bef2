mod container;
mod key;
mod target;

pub use container::Container;
pub use key::MetadataKey;
pub use target::Target;

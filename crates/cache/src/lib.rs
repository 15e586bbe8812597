//! Cache backends for Relaycord.

pub mod file_backend;
pub mod in_memory;
pub mod noop;

pub use file_backend::FileCache;
pub use in_memory::InMemoryCache;
pub use noop::NoopCache;

//! Session-scoped dataset store and Lua script execution engine.

pub mod bindings;
pub mod error;
pub mod libs;
pub mod runtime;
pub mod session;
pub mod store;

pub use error::EngineError;
pub use runtime::{ScriptRunner, NO_OUTPUT};
pub use session::{Session, SharedSession};
pub use store::{DatasetStore, LoadResult};

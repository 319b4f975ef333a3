mod cache;
mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode, CoreWarning};
pub use types::{CacheStats, DEFAULT_CACHE_CAPACITY, EngineConfig, ItemSource};

pub mod errors;
pub mod handler;
pub mod local;
pub mod remote;

pub use errors::{CacheError, CacheResult};
pub use handler::CacheHandler;
pub use local::LocalCache;
pub use remote::{InMemoryRemoteCache, RemoteCache};

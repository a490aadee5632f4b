//! Node-registry aggregation: merges the heartbeat, statistics, staking
//! queue, ownership and auction feeds into one cached snapshot and serves
//! filtered, sorted, paginated views of it.

pub mod auctions;
pub mod config;
pub mod errors;
pub mod filter;
pub mod keys;
pub mod merge;
pub mod resolvers;
pub mod service;

#[cfg(any(test, feature = "dev-context"))]
pub mod testing;

pub use config::NodesConfig;
pub use errors::{NodesError, NodesResult};
pub use resolvers::{EpochResolver, StakeEntry, StakeResolver, UnbondPeriodResolver};
pub use service::NodeService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shardview_gateway::types::Auction;

use crate::errors::NodesResult;

/// Aggregate stake figures for one address or one BLS key, as reported by
/// the stake resolver collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeEntry {
    #[serde(default)]
    pub bls: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub stake: String,
    pub top_up: String,
    pub locked: String,
}

impl Default for StakeEntry {
    fn default() -> Self {
        Self {
            bls: None,
            address: None,
            stake: "0".to_string(),
            top_up: "0".to_string(),
            locked: "0".to_string(),
        }
    }
}

/// Stake/top-up figures per address, plus the auction qualification floor.
#[async_trait]
pub trait StakeResolver: Send + Sync + 'static {
    async fn get_stakes(&self, addresses: &[String]) -> NodesResult<Vec<StakeEntry>>;

    /// The smallest stake that still wins a slot given the current auction
    /// list, as a decimal string.
    async fn get_minimum_auction_stake(&self, auctions: &[Auction]) -> NodesResult<String>;
}

#[async_trait]
pub trait EpochResolver: Send + Sync + 'static {
    async fn get_current_epoch(&self) -> NodesResult<u32>;
}

/// Per-key unbonding lookup for nodes on their way out of the validator
/// set.
#[async_trait]
pub trait UnbondPeriodResolver: Send + Sync + 'static {
    async fn get_remaining_unbond_period(&self, bls: &str) -> NodesResult<Option<u64>>;
}

use std::collections::HashMap;

use async_trait::async_trait;
use shardview_gateway::types::Auction;

use crate::{
    errors::NodesResult,
    resolvers::{EpochResolver, StakeEntry, StakeResolver, UnbondPeriodResolver},
};

// -----------------
// StakeResolverMock
// -----------------
/// [StakeResolver] serving canned per-address stake entries and a fixed
/// auction minimum.
pub struct StakeResolverMock {
    stakes: HashMap<String, Vec<StakeEntry>>,
    minimum_auction_stake: String,
}

impl Default for StakeResolverMock {
    fn default() -> Self {
        Self {
            stakes: HashMap::new(),
            minimum_auction_stake: "0".to_string(),
        }
    }
}

impl StakeResolverMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stake(mut self, address: &str, entries: Vec<StakeEntry>) -> Self {
        self.stakes.insert(address.to_string(), entries);
        self
    }

    pub fn with_minimum_auction_stake(mut self, minimum: &str) -> Self {
        self.minimum_auction_stake = minimum.to_string();
        self
    }
}

#[async_trait]
impl StakeResolver for StakeResolverMock {
    async fn get_stakes(&self, addresses: &[String]) -> NodesResult<Vec<StakeEntry>> {
        Ok(addresses
            .iter()
            .flat_map(|address| self.stakes.get(address).cloned().unwrap_or_default())
            .collect())
    }

    async fn get_minimum_auction_stake(&self, _auctions: &[Auction]) -> NodesResult<String> {
        Ok(self.minimum_auction_stake.clone())
    }
}

// -----------------
// EpochResolverMock
// -----------------
pub struct EpochResolverMock {
    epoch: u32,
}

impl EpochResolverMock {
    pub fn new(epoch: u32) -> Self {
        Self { epoch }
    }
}

#[async_trait]
impl EpochResolver for EpochResolverMock {
    async fn get_current_epoch(&self) -> NodesResult<u32> {
        Ok(self.epoch)
    }
}

// -----------------
// UnbondPeriodResolverMock
// -----------------
#[derive(Default)]
pub struct UnbondPeriodResolverMock {
    periods: HashMap<String, u64>,
}

impl UnbondPeriodResolverMock {
    pub fn with_period(mut self, bls: &str, period: u64) -> Self {
        self.periods.insert(bls.to_string(), period);
        self
    }
}

#[async_trait]
impl UnbondPeriodResolver for UnbondPeriodResolverMock {
    async fn get_remaining_unbond_period(&self, bls: &str) -> NodesResult<Option<u64>> {
        Ok(self.periods.get(bls).copied())
    }
}

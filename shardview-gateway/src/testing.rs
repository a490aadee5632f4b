use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    client::{ChainGateway, VmQueryClient},
    errors::{GatewayError, GatewayResult},
    types::{Auction, HeartbeatEntry, NetworkConfig, TrieStatistics, ValidatorStatistics},
};

// -----------------
// ChainGatewayMock
// -----------------
#[derive(Default)]
pub struct ChainGatewayMockBuilder {
    heartbeats: Vec<HeartbeatEntry>,
    statistics: ValidatorStatistics,
    network_config: NetworkConfig,
    trie_statistics: HashMap<u32, TrieStatistics>,
    auctions: Vec<Auction>,
}

impl ChainGatewayMockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heartbeats(mut self, heartbeats: Vec<HeartbeatEntry>) -> Self {
        self.heartbeats = heartbeats;
        self
    }

    pub fn statistics(mut self, statistics: ValidatorStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn network_config(mut self, config: NetworkConfig) -> Self {
        self.network_config = config;
        self
    }

    pub fn trie_statistics(mut self, shard: u32, stats: TrieStatistics) -> Self {
        self.trie_statistics.insert(shard, stats);
        self
    }

    pub fn auctions(mut self, auctions: Vec<Auction>) -> Self {
        self.auctions = auctions;
        self
    }

    pub fn build(self) -> ChainGatewayMock {
        ChainGatewayMock {
            heartbeats: self.heartbeats,
            statistics: self.statistics,
            network_config: self.network_config,
            trie_statistics: self.trie_statistics,
            auctions: self.auctions,
            heartbeat_calls: AtomicU64::default(),
            statistics_calls: AtomicU64::default(),
            auction_calls: AtomicU64::default(),
        }
    }
}

/// [ChainGateway] serving canned responses and counting calls, so tests can
/// assert how often the aggregation pipeline actually hits the upstream.
pub struct ChainGatewayMock {
    heartbeats: Vec<HeartbeatEntry>,
    statistics: ValidatorStatistics,
    network_config: NetworkConfig,
    trie_statistics: HashMap<u32, TrieStatistics>,
    auctions: Vec<Auction>,
    heartbeat_calls: AtomicU64,
    statistics_calls: AtomicU64,
    auction_calls: AtomicU64,
}

impl ChainGatewayMock {
    pub fn heartbeat_calls(&self) -> u64 {
        self.heartbeat_calls.load(Ordering::SeqCst)
    }

    pub fn statistics_calls(&self) -> u64 {
        self.statistics_calls.load(Ordering::SeqCst)
    }

    pub fn auction_calls(&self) -> u64 {
        self.auction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainGateway for ChainGatewayMock {
    async fn get_node_heartbeat_status(&self) -> GatewayResult<Vec<HeartbeatEntry>> {
        self.heartbeat_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.heartbeats.clone())
    }

    async fn get_validator_statistics(&self) -> GatewayResult<ValidatorStatistics> {
        self.statistics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.statistics.clone())
    }

    async fn get_network_config(&self) -> GatewayResult<NetworkConfig> {
        Ok(self.network_config.clone())
    }

    async fn get_trie_statistics(&self, shard: u32) -> GatewayResult<TrieStatistics> {
        self.trie_statistics.get(&shard).cloned().ok_or_else(|| {
            GatewayError::Gateway {
                endpoint: format!("network/trie-statistics/{shard}"),
                message: "no trie statistics configured".to_string(),
            }
        })
    }

    async fn get_validator_auctions(&self) -> GatewayResult<Vec<Auction>> {
        self.auction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.auctions.clone())
    }
}

// -----------------
// VmQueryClientMock
// -----------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVmCall {
    pub contract: String,
    pub function: String,
    pub caller: Option<String>,
    pub args: Vec<String>,
}

#[derive(Default)]
pub struct VmQueryClientMockBuilder {
    responses: HashMap<(String, Vec<String>), Vec<String>>,
}

impl VmQueryClientMockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the return data for an exact (function, args) pair.
    pub fn response(
        mut self,
        function: &str,
        args: Vec<String>,
        return_data: Vec<String>,
    ) -> Self {
        self.responses
            .insert((function.to_string(), args), return_data);
        self
    }

    pub fn build(self) -> VmQueryClientMock {
        VmQueryClientMock {
            responses: self.responses,
            calls: Mutex::default(),
        }
    }
}

/// [VmQueryClient] answering from a canned (function, args) table and
/// recording every call for assertion.
pub struct VmQueryClientMock {
    responses: HashMap<(String, Vec<String>), Vec<String>>,
    calls: Mutex<Vec<RecordedVmCall>>,
}

impl VmQueryClientMock {
    pub fn calls(&self) -> Vec<RecordedVmCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .filter(|call| call.function == function)
            .count()
    }
}

#[async_trait]
impl VmQueryClient for VmQueryClientMock {
    async fn vm_query(
        &self,
        contract: &str,
        function: &str,
        caller: Option<&str>,
        args: &[String],
    ) -> GatewayResult<Vec<String>> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedVmCall {
                contract: contract.to_string(),
                function: function.to_string(),
                caller: caller.map(str::to_string),
                args: args.to_vec(),
            });

        self.responses
            .get(&(function.to_string(), args.to_vec()))
            .cloned()
            .ok_or_else(|| GatewayError::VmQueryFailed {
                function: function.to_string(),
                code: "user error".to_string(),
            })
    }
}

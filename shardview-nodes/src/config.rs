use std::time::Duration;

/// Aggregation-engine configuration. TTLs bound how long each cached
/// concept survives before the next rebuild or re-resolution.
#[derive(Debug, Clone)]
pub struct NodesConfig {
    /// Address of the staking contract answering owner/queue queries.
    pub staking_contract: String,
    /// Address of the auction contract, used as the caller for staking
    /// queries.
    pub auction_contract: String,
    /// Whether staking-v4 auction processing is enabled at all.
    pub staking_v4_enabled: bool,
    /// First epoch in which auction processing applies.
    pub staking_v4_activation_epoch: u32,
    /// TTL of the full node snapshot.
    pub nodes_ttl: Duration,
    /// TTL of the version histogram.
    pub versions_ttl: Duration,
    /// TTL of per-(epoch, BLS key) owner entries.
    pub owner_ttl: Duration,
    /// TTL of per-address stake figures.
    pub stake_ttl: Duration,
    /// Bound on concurrent upstream lookups within one pipeline stage.
    pub max_concurrent_lookups: usize,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            staking_contract: String::new(),
            auction_contract: String::new(),
            staking_v4_enabled: false,
            staking_v4_activation_epoch: 0,
            nodes_ttl: Duration::from_secs(60),
            versions_ttl: Duration::from_secs(300),
            owner_ttl: Duration::from_secs(600),
            stake_ttl: Duration::from_secs(900),
            max_concurrent_lookups: 5,
        }
    }
}

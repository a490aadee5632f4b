use async_trait::async_trait;

use crate::{
    errors::GatewayResult,
    types::{Auction, HeartbeatEntry, NetworkConfig, TrieStatistics, ValidatorStatistics},
};

/// Read access to the blockchain observer gateway. The aggregation engine
/// only depends on these response shapes, never on the transport.
#[async_trait]
pub trait ChainGateway: Send + Sync + 'static {
    async fn get_node_heartbeat_status(&self) -> GatewayResult<Vec<HeartbeatEntry>>;

    async fn get_validator_statistics(&self) -> GatewayResult<ValidatorStatistics>;

    async fn get_network_config(&self) -> GatewayResult<NetworkConfig>;

    async fn get_trie_statistics(&self, shard: u32) -> GatewayResult<TrieStatistics>;

    async fn get_validator_auctions(&self) -> GatewayResult<Vec<Auction>>;
}

/// Read-only smart-contract view calls against the staking/auction
/// contracts. Each returned element is a base64-encoded return value;
/// decoding is the caller's concern (see `shardview-codec`).
#[async_trait]
pub trait VmQueryClient: Send + Sync + 'static {
    async fn vm_query(
        &self,
        contract: &str,
        function: &str,
        caller: Option<&str>,
        args: &[String],
    ) -> GatewayResult<Vec<String>>;
}

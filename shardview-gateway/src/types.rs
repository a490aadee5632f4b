use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One node as reported by the heartbeat feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatEntry {
    pub public_key: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub peer_type: String,
    #[serde(default)]
    pub shard_id: Option<u32>,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub node_display_name: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub num_instances: u64,
    /// Observers exposing the full chain history report a non-zero sub type.
    #[serde(default)]
    pub peer_sub_type: u32,
}

/// Per-BLS-key record from the validator statistics feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorStatisticsEntry {
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub temp_rating: f64,
    #[serde(default)]
    pub rating_modifier: f64,
    #[serde(default)]
    pub shard_id: Option<u32>,
    #[serde(default)]
    pub validator_status: String,
    #[serde(default)]
    pub num_leader_success: u64,
    #[serde(default)]
    pub num_leader_failure: u64,
    #[serde(default)]
    pub num_validator_success: u64,
    #[serde(default)]
    pub num_validator_failure: u64,
    #[serde(default)]
    pub num_validator_ignored_signatures: u64,
}

pub type ValidatorStatistics = HashMap<String, ValidatorStatisticsEntry>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "erd_latest_tag_software_version", default)]
    pub latest_tag_software_version: String,
    #[serde(rename = "erd_num_shards_without_meta", default)]
    pub num_shards_without_meta: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrieStatistics {
    #[serde(rename = "accounts_snapshot_num_nodes", default)]
    pub accounts_snapshot_num_nodes: u64,
}

/// One staking unit's slice of the validator auction list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    #[serde(default)]
    pub qualified_top_up: String,
    #[serde(default)]
    pub nodes: Vec<AuctionNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionNode {
    pub bls_key: String,
    #[serde(default)]
    pub qualified: bool,
}

use serde::{Deserialize, Serialize};

/// One logical staking unit competing in the validator auction: all
/// auction-status nodes sharing the same (provider-or-owner, stake, top-up)
/// composite key, aggregated into per-unit counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAuction {
    pub identity: Option<String>,
    pub name: Option<String>,
    pub provider: Option<String>,
    /// Set only when the unit is a single node with neither provider nor
    /// identity; provider/identity-level units omit it.
    pub bls: Option<String>,
    pub stake: String,
    pub top_up: String,
    pub auction_top_up: String,
    pub qualified_stake: String,
    pub auction_validators: u64,
    pub qualified_auction_validators: u64,
    pub dropped_validators: u64,
    pub danger_zone_validators: u64,
}

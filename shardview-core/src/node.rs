use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Validator,
    Observer,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Validator => write!(f, "validator"),
            NodeType::Observer => write!(f, "observer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    New,
    Unknown,
    Waiting,
    Eligible,
    Jailed,
    Queued,
    Leaving,
    Inactive,
    Auction,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::New => "new",
            NodeStatus::Unknown => "unknown",
            NodeStatus::Waiting => "waiting",
            NodeStatus::Eligible => "eligible",
            NodeStatus::Jailed => "jailed",
            NodeStatus::Queued => "queued",
            NodeStatus::Leaving => "leaving",
            NodeStatus::Inactive => "inactive",
            NodeStatus::Auction => "auction",
        };
        write!(f, "{s}")
    }
}

impl FromStr for NodeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(NodeStatus::New),
            "unknown" => Ok(NodeStatus::Unknown),
            "waiting" => Ok(NodeStatus::Waiting),
            "eligible" => Ok(NodeStatus::Eligible),
            "jailed" => Ok(NodeStatus::Jailed),
            "queued" => Ok(NodeStatus::Queued),
            "leaving" => Ok(NodeStatus::Leaving),
            "inactive" => Ok(NodeStatus::Inactive),
            "auction" => Ok(NodeStatus::Auction),
            _ => Err(()),
        }
    }
}

/// The canonical network node entity, assembled once per aggregation cycle
/// from heartbeat telemetry, validator statistics, the staking queue and
/// chained contract lookups.
///
/// The BLS public key is the stable identifier; it is unique within one
/// aggregation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub bls: String,
    pub name: String,
    pub version: String,
    pub rating: f64,
    pub temp_rating: f64,
    pub rating_modifier: f64,
    /// Absent for nodes whose type could not be resolved at snapshot build
    /// time (queued and jailed nodes).
    pub shard: Option<u32>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub status: Option<NodeStatus>,
    pub online: bool,
    pub nonce: u64,
    pub instances: u64,
    pub owner: String,
    /// Staking provider contract address; empty when the node is self-owned.
    pub provider: String,
    pub identity: Option<String>,
    /// Decimal strings representing unsigned big integers. Non-validator
    /// nodes keep these at "0".
    pub stake: String,
    pub top_up: String,
    pub locked: String,
    pub leader_failure: u64,
    pub leader_success: u64,
    pub validator_failure: u64,
    pub validator_ignored_signatures: u64,
    pub validator_success: u64,
    pub issues: Vec<String>,
    /// 1-based position in the staking queue; 0 when not queued.
    pub position: u64,
    pub full_history: bool,
    // Auction-derived fields are populated as a group from a single
    // auction-list pass, and only while staking-v4 auctions are active.
    pub auctioned: Option<bool>,
    pub auction_position: Option<u64>,
    pub auction_top_up: Option<String>,
    pub auction_qualified: Option<bool>,
    pub qualified_stake: Option<String>,
    pub is_in_danger_zone: bool,
    pub remaining_un_bond_period: Option<u64>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            bls: String::new(),
            name: String::new(),
            version: String::new(),
            rating: 0.0,
            temp_rating: 0.0,
            rating_modifier: 0.0,
            shard: None,
            node_type: None,
            status: None,
            online: false,
            nonce: 0,
            instances: 0,
            owner: String::new(),
            provider: String::new(),
            identity: None,
            stake: "0".to_string(),
            top_up: "0".to_string(),
            locked: "0".to_string(),
            leader_failure: 0,
            leader_success: 0,
            validator_failure: 0,
            validator_ignored_signatures: 0,
            validator_success: 0,
            issues: vec![],
            position: 0,
            full_history: false,
            auctioned: None,
            auction_position: None,
            auction_top_up: None,
            auction_qualified: None,
            qualified_stake: None,
            is_in_danger_zone: false,
            remaining_un_bond_period: None,
        }
    }
}

impl Node {
    pub fn is_validator(&self) -> bool {
        self.node_type == Some(NodeType::Validator)
    }

    /// The address stake figures are attributed to: the provider contract
    /// when one is set, the natural owner otherwise.
    pub fn provider_or_owner(&self) -> &str {
        if self.provider.is_empty() {
            &self.owner
        } else {
            &self.provider
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            NodeStatus::New,
            NodeStatus::Unknown,
            NodeStatus::Waiting,
            NodeStatus::Eligible,
            NodeStatus::Jailed,
            NodeStatus::Queued,
            NodeStatus::Leaving,
            NodeStatus::Inactive,
            NodeStatus::Auction,
        ] {
            assert_eq!(status.to_string().parse::<NodeStatus>(), Ok(status));
        }
        assert!("validating".parse::<NodeStatus>().is_err());
    }

    #[test]
    fn default_node_keeps_zero_stake_fields() {
        let node = Node::default();
        assert_eq!(node.stake, "0");
        assert_eq!(node.top_up, "0");
        assert_eq!(node.locked, "0");
    }

    #[test]
    fn provider_takes_precedence_over_owner() {
        let node = Node {
            owner: "owner".to_string(),
            provider: "provider".to_string(),
            ..Default::default()
        };
        assert_eq!(node.provider_or_owner(), "provider");

        let node = Node {
            owner: "owner".to_string(),
            ..Default::default()
        };
        assert_eq!(node.provider_or_owner(), "owner");
    }
}

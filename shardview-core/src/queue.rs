use serde::{Deserialize, Serialize};

/// One entry of the staking queue, rebuilt on every aggregation cycle from
/// the queue contract's register contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub bls: String,
    pub nonce: u64,
    pub reward_address: String,
    /// 1-based position within the queue.
    pub position: u64,
}

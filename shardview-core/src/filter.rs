use serde::{Deserialize, Serialize};

use crate::node::{NodeStatus, NodeType};

/// Sortable node fields. Comparison is a case-insensitive string comparison
/// on the field's textual value, except for `locked` which is compared as an
/// unsigned big integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeSort {
    Name,
    Version,
    TempRating,
    LeaderSuccess,
    LeaderFailure,
    ValidatorSuccess,
    ValidatorFailure,
    Position,
    AuctionPosition,
    Locked,
    QualifiedStake,
}

impl NodeSort {
    /// The field's wire name, matching its serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeSort::Name => "name",
            NodeSort::Version => "version",
            NodeSort::TempRating => "tempRating",
            NodeSort::LeaderSuccess => "leaderSuccess",
            NodeSort::LeaderFailure => "leaderFailure",
            NodeSort::ValidatorSuccess => "validatorSuccess",
            NodeSort::ValidatorFailure => "validatorFailure",
            NodeSort::Position => "position",
            NodeSort::AuctionPosition => "auctionPosition",
            NodeSort::Locked => "locked",
            NodeSort::QualifiedStake => "qualifiedStake",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Immutable query descriptor used to derive a filtered, sorted view from
/// the full node set. All active predicates are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Case-insensitive substring match against BLS key, name and version.
    pub search: Option<String>,
    pub online: Option<bool>,
    pub node_type: Option<NodeType>,
    pub status: Option<NodeStatus>,
    pub shard: Option<u32>,
    pub identity: Option<String>,
    pub provider: Option<String>,
    pub owner: Option<String>,
    pub auctioned: Option<bool>,
    pub full_history: Option<bool>,
    pub qualified: Option<bool>,
    pub danger_zone: Option<bool>,
    pub sort: Option<NodeSort>,
    pub order: Option<SortOrder>,
}

impl NodeFilter {
    pub fn with_status(status: NodeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_shard(shard: u32) -> Self {
        Self {
            shard: Some(shard),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub from: usize,
    pub size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { from: 0, size: 25 }
    }
}

impl Pagination {
    pub fn new(from: usize, size: usize) -> Self {
        Self { from, size }
    }

    /// Slices a collection into the requested page, cloning only the page.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.from)
            .take(self.size)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_names_match_their_serialized_form() {
        for (sort, expected) in [
            (NodeSort::Name, "\"name\""),
            (NodeSort::TempRating, "\"tempRating\""),
            (NodeSort::QualifiedStake, "\"qualifiedStake\""),
        ] {
            assert_eq!(
                serde_json::to_string(&sort).unwrap(),
                expected,
                "wire form of {}",
                sort.as_str()
            );
            assert_eq!(format!("\"{}\"", sort.as_str()), expected);
        }
    }

    #[test]
    fn pagination_slices_within_bounds() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(Pagination::new(0, 3).slice(&items), vec![0, 1, 2]);
        assert_eq!(Pagination::new(8, 5).slice(&items), vec![8, 9]);
        assert!(Pagination::new(12, 5).slice(&items).is_empty());
    }
}

use std::cmp::Ordering;

use num_bigint::BigUint;
use shardview_core::{Node, NodeFilter, NodeSort, SortOrder};

/// Pure, order-preserving linear scan applying every active predicate as an
/// AND, followed by an optional stable sort.
pub fn filter_nodes(nodes: &[Node], filter: &NodeFilter) -> Vec<Node> {
    let mut filtered: Vec<Node> = nodes
        .iter()
        .filter(|node| matches(node, filter))
        .cloned()
        .collect();

    if let Some(sort) = filter.sort {
        sort_nodes(&mut filtered, sort, filter.order.unwrap_or_default());
    }

    filtered
}

fn matches(node: &Node, filter: &NodeFilter) -> bool {
    if let Some(search) = &filter.search {
        let search = search.to_lowercase();
        let hit = node.bls.to_lowercase().contains(&search)
            || node.name.to_lowercase().contains(&search)
            || node.version.to_lowercase().contains(&search);
        if !hit {
            return false;
        }
    }
    if let Some(online) = filter.online {
        if node.online != online {
            return false;
        }
    }
    if let Some(node_type) = filter.node_type {
        if node.node_type != Some(node_type) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if node.status != Some(status) {
            return false;
        }
    }
    if let Some(shard) = filter.shard {
        if node.shard != Some(shard) {
            return false;
        }
    }
    if let Some(identity) = &filter.identity {
        let matches_identity = node
            .identity
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(identity));
        if !matches_identity {
            return false;
        }
    }
    if let Some(provider) = &filter.provider {
        if &node.provider != provider {
            return false;
        }
    }
    if let Some(owner) = &filter.owner {
        if &node.owner != owner {
            return false;
        }
    }
    if let Some(auctioned) = filter.auctioned {
        if node.auctioned.unwrap_or(false) != auctioned {
            return false;
        }
    }
    if let Some(full_history) = filter.full_history {
        if node.full_history != full_history {
            return false;
        }
    }
    if let Some(qualified) = filter.qualified {
        if node.auction_qualified.unwrap_or(false) != qualified {
            return false;
        }
    }
    if let Some(danger_zone) = filter.danger_zone {
        if node.is_in_danger_zone != danger_zone {
            return false;
        }
    }
    true
}

/// Stable ascending sort on the chosen field; descending order is the
/// reversal of the ascending result, NOT a reversed comparator. The two
/// differ in how ties come out, and the reversal behavior is the one
/// callers observe today.
pub fn sort_nodes(nodes: &mut [Node], sort: NodeSort, order: SortOrder) {
    nodes.sort_by(|a, b| compare(a, b, sort));
    if order == SortOrder::Desc {
        nodes.reverse();
    }
}

fn compare(a: &Node, b: &Node, sort: NodeSort) -> Ordering {
    match sort {
        // The only field compared numerically; everything else is a
        // case-insensitive string comparison of the field's textual value.
        NodeSort::Locked => locked_value(a).cmp(&locked_value(b)),
        _ => sort_text(a, sort).cmp(&sort_text(b, sort)),
    }
}

fn locked_value(node: &Node) -> BigUint {
    node.locked.parse().unwrap_or_default()
}

fn sort_text(node: &Node, sort: NodeSort) -> String {
    let text = match sort {
        NodeSort::Name => node.name.clone(),
        NodeSort::Version => node.version.clone(),
        NodeSort::TempRating => node.temp_rating.to_string(),
        NodeSort::LeaderSuccess => node.leader_success.to_string(),
        NodeSort::LeaderFailure => node.leader_failure.to_string(),
        NodeSort::ValidatorSuccess => node.validator_success.to_string(),
        NodeSort::ValidatorFailure => node.validator_failure.to_string(),
        NodeSort::Position => node.position.to_string(),
        NodeSort::AuctionPosition => node.auction_position.unwrap_or(0).to_string(),
        NodeSort::Locked => node.locked.clone(),
        NodeSort::QualifiedStake => node
            .qualified_stake
            .clone()
            .unwrap_or_else(|| "0".to_string()),
    };
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use shardview_core::{NodeStatus, NodeType};

    use super::*;

    fn node(bls: &str, status: NodeStatus, shard: u32, locked: &str) -> Node {
        Node {
            bls: bls.to_string(),
            name: format!("name-{bls}"),
            status: Some(status),
            node_type: Some(NodeType::Validator),
            shard: Some(shard),
            locked: locked.to_string(),
            ..Default::default()
        }
    }

    fn fixture() -> Vec<Node> {
        vec![
            node("aa01", NodeStatus::Eligible, 1, "500"),
            node("aa02", NodeStatus::Eligible, 0, "2500"),
            node("aa03", NodeStatus::Waiting, 1, "1000"),
            node("aa04", NodeStatus::Eligible, 1, "1000"),
        ]
    }

    #[test]
    fn filters_compose_as_set_intersection() {
        let nodes = fixture();
        let by_status = filter_nodes(&nodes, &NodeFilter::with_status(NodeStatus::Eligible));
        let by_shard = filter_nodes(&nodes, &NodeFilter::with_shard(1));

        let combined = filter_nodes(
            &nodes,
            &NodeFilter {
                status: Some(NodeStatus::Eligible),
                shard: Some(1),
                ..Default::default()
            },
        );

        let expected: Vec<&Node> = by_status
            .iter()
            .filter(|n| by_shard.iter().any(|m| m.bls == n.bls))
            .collect();
        assert_eq!(
            combined.iter().map(|n| &n.bls).collect::<Vec<_>>(),
            expected.iter().map(|n| &n.bls).collect::<Vec<_>>()
        );
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn search_is_a_case_insensitive_substring_match() {
        let mut nodes = fixture();
        nodes[2].name = "Stakers United".to_string();
        let found = filter_nodes(
            &nodes,
            &NodeFilter {
                search: Some("stakers".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bls, "aa03");
    }

    #[test]
    fn locked_sorts_numerically_not_lexicographically() {
        let mut nodes = vec![
            node("aa01", NodeStatus::Eligible, 0, "900"),
            node("aa02", NodeStatus::Eligible, 0, "2500"),
            node("aa03", NodeStatus::Eligible, 0, "10000"),
        ];
        sort_nodes(&mut nodes, NodeSort::Locked, SortOrder::Asc);
        let order: Vec<&str> = nodes.iter().map(|n| n.bls.as_str()).collect();
        // Lexicographic ordering would put "10000" before "2500".
        assert_eq!(order, vec!["aa01", "aa02", "aa03"]);
    }

    #[test]
    fn sort_desc_matches_descending_comparator_without_ties() {
        let mut reversed = vec![
            node("aa01", NodeStatus::Eligible, 0, "500"),
            node("aa02", NodeStatus::Eligible, 0, "2500"),
            node("aa03", NodeStatus::Eligible, 0, "1000"),
        ];
        sort_nodes(&mut reversed, NodeSort::Locked, SortOrder::Desc);

        let mut direct = reversed.clone();
        direct.sort_by(|a, b| locked_value(b).cmp(&locked_value(a)));

        assert_eq!(reversed, direct);
    }

    /// Regression pin: with duplicate values, descending order is the
    /// reversal of the stable ascending sort, which reverses ties too. A
    /// genuinely descending stable sort would keep ties in input order.
    #[test]
    fn sort_desc_reverses_ascending_ties() {
        let mut nodes = vec![
            node("aa01", NodeStatus::Eligible, 0, "500"),
            node("aa02", NodeStatus::Eligible, 0, "1000"),
            node("aa03", NodeStatus::Eligible, 0, "500"),
        ];
        sort_nodes(&mut nodes, NodeSort::Locked, SortOrder::Desc);
        let order: Vec<&str> = nodes.iter().map(|n| n.bls.as_str()).collect();
        // Ascending: aa01, aa03, aa02 (stable keeps aa01 before aa03);
        // reversal flips the tie: aa03 now precedes aa01.
        assert_eq!(order, vec!["aa02", "aa03", "aa01"]);
    }

    #[test]
    fn boolean_predicates_match_their_fields() {
        let mut nodes = fixture();
        nodes[0].online = true;
        nodes[1].full_history = true;
        nodes[2].is_in_danger_zone = true;

        let online = filter_nodes(
            &nodes,
            &NodeFilter {
                online: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].bls, "aa01");

        let full_history = filter_nodes(
            &nodes,
            &NodeFilter {
                full_history: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(full_history.len(), 1);
        assert_eq!(full_history[0].bls, "aa02");

        let danger = filter_nodes(
            &nodes,
            &NodeFilter {
                danger_zone: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(danger.len(), 1);
        assert_eq!(danger[0].bls, "aa03");
    }
}

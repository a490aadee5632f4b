use num_bigint::BigUint;
use shardview_core::{Node, NodeAuction, NodeStatus};
use shardview_gateway::types::Auction;

/// A qualified auctioned node whose stake sits below 105% of the minimum
/// auction stake risks being displaced at the next epoch change.
pub const DANGER_ZONE_PERCENT: u32 = 105;

fn biguint(value: &str) -> BigUint {
    value.parse().unwrap_or_default()
}

/// Stage 7: stamps auction-derived fields onto matching nodes and flags the
/// danger zone.
///
/// The auction position is 1-based and increments across the entire
/// auction-list traversal, including pairs that match no node. That
/// numbering looks unintentional but is the behavior callers observe, so it
/// is preserved (see `auction_position_counts_non_matching_entries`).
pub fn process_auctions(nodes: &mut [Node], auctions: &[Auction], minimum_auction_stake: &str) {
    let danger_zone_threshold =
        biguint(minimum_auction_stake) * DANGER_ZONE_PERCENT / 100u32;

    let mut position = 0u64;
    for auction in auctions {
        for auction_node in &auction.nodes {
            position += 1;
            if let Some(node) = nodes
                .iter_mut()
                .find(|node| node.bls == auction_node.bls_key)
            {
                // Populated transitively as a group, all from this one pass.
                node.auctioned = Some(true);
                node.auction_position = Some(position);
                node.auction_top_up = Some(auction.qualified_top_up.clone());
                node.auction_qualified = Some(auction_node.qualified);
                node.qualified_stake = Some(
                    (biguint(&node.stake) + biguint(&auction.qualified_top_up)).to_string(),
                );
            }
        }
    }

    for node in nodes.iter_mut() {
        node.is_in_danger_zone = node.status == Some(NodeStatus::Auction)
            && node.auction_qualified == Some(true)
            && biguint(&node.stake) + biguint(&node.top_up) < danger_zone_threshold;
    }
}

/// Groups all auction-status nodes by (provider-or-owner, stake, top-up);
/// nodes sharing that composite key are assumed to belong to the same
/// logical staking unit. First-seen order is preserved.
pub fn group_auctions(nodes: &[Node]) -> Vec<NodeAuction> {
    type GroupKey = (String, String, String);
    let mut groups: Vec<(GroupKey, Vec<&Node>)> = Vec::new();

    for node in nodes
        .iter()
        .filter(|node| node.status == Some(NodeStatus::Auction))
    {
        let key = (
            node.provider_or_owner().to_string(),
            node.stake.clone(),
            node.top_up.clone(),
        );
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(node),
            None => groups.push((key, vec![node])),
        }
    }

    groups
        .into_iter()
        .map(|(_, members)| {
            let first = members[0];
            let total = members.len() as u64;
            let qualified = members
                .iter()
                .filter(|node| node.auction_qualified == Some(true))
                .count() as u64;
            let danger_zone = members
                .iter()
                .filter(|node| node.is_in_danger_zone)
                .count() as u64;

            // A unit of exactly one node without provider or identity is
            // node-level: surface its BLS key. Anything else is a
            // provider/identity-level unit.
            let bls = (total == 1 && first.provider.is_empty() && first.identity.is_none())
                .then(|| first.bls.clone());

            NodeAuction {
                identity: first.identity.clone(),
                name: (!first.name.is_empty()).then(|| first.name.clone()),
                provider: (!first.provider.is_empty()).then(|| first.provider.clone()),
                bls,
                stake: first.stake.clone(),
                top_up: first.top_up.clone(),
                auction_top_up: first
                    .auction_top_up
                    .clone()
                    .unwrap_or_else(|| "0".to_string()),
                qualified_stake: first
                    .qualified_stake
                    .clone()
                    .unwrap_or_else(|| first.stake.clone()),
                auction_validators: total,
                qualified_auction_validators: qualified,
                dropped_validators: total - qualified,
                danger_zone_validators: danger_zone,
            }
        })
        .collect()
}

/// Default auction ordering when the caller requests no explicit sort:
/// descending by qualified stake, ties broken by presence of qualified
/// validators, then by fewest dropped validators.
pub fn sort_auctions_default(auctions: &mut [NodeAuction]) {
    auctions.sort_by(|a, b| {
        biguint(&b.qualified_stake)
            .cmp(&biguint(&a.qualified_stake))
            .then_with(|| {
                (b.qualified_auction_validators > 0).cmp(&(a.qualified_auction_validators > 0))
            })
            .then_with(|| a.dropped_validators.cmp(&b.dropped_validators))
    });
}

#[cfg(test)]
mod tests {
    use shardview_gateway::types::AuctionNode;
    use shardview_core::NodeType;

    use super::*;

    fn auction_node(bls: &str, stake: &str, top_up: &str) -> Node {
        Node {
            bls: bls.to_string(),
            node_type: Some(NodeType::Validator),
            status: Some(NodeStatus::Auction),
            stake: stake.to_string(),
            top_up: top_up.to_string(),
            ..Default::default()
        }
    }

    fn auction(top_up: &str, entries: &[(&str, bool)]) -> Auction {
        Auction {
            qualified_top_up: top_up.to_string(),
            nodes: entries
                .iter()
                .map(|(bls, qualified)| AuctionNode {
                    bls_key: bls.to_string(),
                    qualified: *qualified,
                })
                .collect(),
        }
    }

    #[test]
    fn auction_fields_are_stamped_as_a_group() {
        let mut nodes = vec![auction_node("aa01", "2500", "0")];
        let auctions = vec![auction("600", &[("aa01", true)])];
        process_auctions(&mut nodes, &auctions, "2500");

        let node = &nodes[0];
        assert_eq!(node.auctioned, Some(true));
        assert_eq!(node.auction_position, Some(1));
        assert_eq!(node.auction_top_up, Some("600".to_string()));
        assert_eq!(node.auction_qualified, Some(true));
        assert_eq!(node.qualified_stake, Some("3100".to_string()));
    }

    #[test]
    fn auction_position_counts_non_matching_entries() {
        // Pins observed numbering: the counter advances on every
        // (auction, auction-node) pair, whether or not a node matches.
        let mut nodes = vec![auction_node("aa03", "2500", "0")];
        let auctions = vec![
            auction("0", &[("zz01", false), ("zz02", false)]),
            auction("100", &[("zz03", false), ("aa03", true)]),
        ];
        process_auctions(&mut nodes, &auctions, "2500");
        assert_eq!(nodes[0].auction_position, Some(4));
    }

    #[test]
    fn danger_zone_thresholds_at_105_percent_of_minimum_stake() {
        // minimum 2000 -> threshold 2100
        let mut nodes = vec![
            auction_node("aa01", "2000", "99"),  // 2099 < 2100 -> in danger
            auction_node("aa02", "2000", "100"), // 2100 == threshold -> safe
            auction_node("aa03", "2000", "500"), // well above -> safe
            auction_node("aa04", "2000", "0"),   // below, but not qualified
        ];
        let auctions = vec![auction(
            "0",
            &[
                ("aa01", true),
                ("aa02", true),
                ("aa03", true),
                ("aa04", false),
            ],
        )];
        process_auctions(&mut nodes, &auctions, "2000");

        assert!(nodes[0].is_in_danger_zone);
        assert!(!nodes[1].is_in_danger_zone);
        assert!(!nodes[2].is_in_danger_zone);
        assert!(!nodes[3].is_in_danger_zone);
    }

    #[test]
    fn groups_by_provider_or_owner_and_stake_figures() {
        let mut one = auction_node("aa01", "2500", "100");
        one.owner = "ownerA".to_string();
        let mut two = auction_node("aa02", "2500", "100");
        two.owner = "ownerA".to_string();
        let mut other = auction_node("aa03", "2500", "200");
        other.owner = "ownerA".to_string();

        one.auction_qualified = Some(true);
        two.auction_qualified = Some(false);
        two.is_in_danger_zone = false;

        let groups = group_auctions(&[one, two, other]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].auction_validators, 2);
        assert_eq!(groups[0].qualified_auction_validators, 1);
        assert_eq!(groups[0].dropped_validators, 1);
        assert_eq!(groups[1].auction_validators, 1);
    }

    #[test]
    fn single_member_group_without_provider_or_identity_surfaces_bls() {
        let mut solo = auction_node("aa01", "2500", "0");
        solo.owner = "ownerA".to_string();

        let mut provided = auction_node("aa02", "2500", "0");
        provided.owner = "ownerB".to_string();
        provided.provider = "providerB".to_string();

        let mut identified = auction_node("aa03", "3000", "0");
        identified.owner = "ownerC".to_string();
        identified.identity = Some("staking-co".to_string());

        let groups = group_auctions(&[solo, provided, identified]);
        assert_eq!(groups[0].bls, Some("aa01".to_string()));
        assert_eq!(groups[1].bls, None);
        assert_eq!(groups[2].bls, None);
    }

    #[test]
    fn default_order_is_qualified_stake_desc_with_tiebreaks() {
        let make = |stake: &str, qualified: u64, dropped: u64| NodeAuction {
            identity: None,
            name: None,
            provider: None,
            bls: None,
            stake: stake.to_string(),
            top_up: "0".to_string(),
            auction_top_up: "0".to_string(),
            qualified_stake: stake.to_string(),
            auction_validators: qualified + dropped,
            qualified_auction_validators: qualified,
            dropped_validators: dropped,
            danger_zone_validators: 0,
        };

        let mut auctions = vec![
            make("1000", 0, 2), // same stake, no qualified, more dropped
            make("1000", 1, 1), // same stake, has qualified -> first of ties
            make("5000", 1, 0), // highest stake -> first overall
            make("1000", 0, 1), // same stake, no qualified, fewer dropped
        ];
        sort_auctions_default(&mut auctions);

        let summary: Vec<(String, u64, u64)> = auctions
            .iter()
            .map(|a| {
                (
                    a.qualified_stake.clone(),
                    a.qualified_auction_validators,
                    a.dropped_validators,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("5000".to_string(), 1, 0),
                ("1000".to_string(), 1, 1),
                ("1000".to_string(), 0, 1),
                ("1000".to_string(), 0, 2),
            ]
        );
    }
}

use std::collections::HashSet;

use shardview_core::{Node, NodeStatus, NodeType, QueueEntry};
use shardview_gateway::types::{HeartbeatEntry, ValidatorStatistics, ValidatorStatisticsEntry};

pub const ISSUE_VERSION_MISMATCH: &str = "versionMismatch";

/// Peer type × validator sub-status → (type, status) decision table.
///
/// Explicit validator sub-statuses win; an observer peer type maps to an
/// observer with no status; anything else is a validator carrying whatever
/// status string was reported.
pub fn derive_type_and_status(
    peer_type: Option<&str>,
    validator_status: Option<&str>,
) -> (Option<NodeType>, Option<NodeStatus>) {
    if let Some(status) = validator_status {
        let explicit = match status {
            "new" => Some(NodeStatus::New),
            "auction" => Some(NodeStatus::Auction),
            "jailed" => Some(NodeStatus::Jailed),
            "inactive" => Some(NodeStatus::Inactive),
            s if s.contains("leaving") => Some(NodeStatus::Leaving),
            _ => None,
        };
        if let Some(explicit) = explicit {
            return (Some(NodeType::Validator), Some(explicit));
        }
    }

    if peer_type == Some("observer") {
        return (Some(NodeType::Observer), None);
    }

    match validator_status.or(peer_type) {
        Some(status) => (Some(NodeType::Validator), status.parse().ok()),
        None => (None, None),
    }
}

/// Strips release-candidate/patch suffixes and path segments from a raw
/// version string: "v1.4.8-rc1/go1.20" becomes "v1.4.8".
pub fn normalize_version(raw: &str) -> String {
    raw.split('/')
        .next()
        .unwrap_or_default()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Stage 1 of the build pipeline: union of the heartbeat and validator
/// statistics feeds. Heartbeat fields take precedence for liveness and
/// identity, statistics fields for rating and success/failure counters.
///
/// Heartbeat order is preserved; statistics-only keys are appended in
/// lexicographic order so two builds over identical feeds produce identical
/// collections.
pub fn merge_heartbeat_and_statistics(
    heartbeats: &[HeartbeatEntry],
    statistics: &ValidatorStatistics,
    latest_tag: &str,
) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(heartbeats.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(heartbeats.len());

    for heartbeat in heartbeats {
        seen.insert(heartbeat.public_key.as_str());
        nodes.push(build_node(
            &heartbeat.public_key,
            Some(heartbeat),
            statistics.get(&heartbeat.public_key),
            latest_tag,
        ));
    }

    let mut statistics_only: Vec<&String> = statistics
        .keys()
        .filter(|bls| !seen.contains(bls.as_str()))
        .collect();
    statistics_only.sort();
    for bls in statistics_only {
        nodes.push(build_node(bls, None, statistics.get(bls), latest_tag));
    }

    nodes
}

fn build_node(
    bls: &str,
    heartbeat: Option<&HeartbeatEntry>,
    statistics: Option<&ValidatorStatisticsEntry>,
    latest_tag: &str,
) -> Node {
    let peer_type = heartbeat
        .map(|hb| hb.peer_type.as_str())
        .filter(|pt| !pt.is_empty());
    let validator_status = statistics
        .map(|st| st.validator_status.as_str())
        .filter(|vs| !vs.is_empty());
    let (node_type, status) = derive_type_and_status(peer_type, validator_status);

    let mut node = Node {
        bls: bls.to_string(),
        ..Default::default()
    };

    if let Some(heartbeat) = heartbeat {
        node.name = heartbeat.node_display_name.clone();
        node.version = normalize_version(&heartbeat.version_number);
        node.online = heartbeat.is_active;
        node.nonce = heartbeat.nonce;
        node.instances = heartbeat.num_instances;
        node.full_history = heartbeat.peer_sub_type != 0;
        node.shard = heartbeat.shard_id;
        if !heartbeat.identity.is_empty() {
            node.identity = Some(heartbeat.identity.to_lowercase());
        }
    }

    if let Some(statistics) = statistics {
        node.rating = statistics.rating;
        node.temp_rating = statistics.temp_rating;
        node.rating_modifier = statistics.rating_modifier;
        node.leader_success = statistics.num_leader_success;
        node.leader_failure = statistics.num_leader_failure;
        node.validator_success = statistics.num_validator_success;
        node.validator_failure = statistics.num_validator_failure;
        node.validator_ignored_signatures = statistics.num_validator_ignored_signatures;
        if node.shard.is_none() {
            node.shard = statistics.shard_id;
        }
    }

    node.node_type = node_type;
    node.status = status;
    // Type resolution for jailed nodes happens at queue/auction time; their
    // shard assignment is not trustworthy in this snapshot.
    if node.status == Some(NodeStatus::Jailed) {
        node.shard = None;
    }

    if !node.version.is_empty() && !latest_tag.is_empty() && node.version != latest_tag {
        node.issues.push(ISSUE_VERSION_MISMATCH.to_string());
    }

    node
}

/// Stage 2: staking-queue precedence. Queue membership overrides whatever
/// type/status stage 1 derived; queue-only keys materialize as minimal
/// queued nodes.
pub fn merge_queue(nodes: &mut Vec<Node>, queue: &[QueueEntry]) {
    for entry in queue {
        if let Some(node) = nodes.iter_mut().find(|node| node.bls == entry.bls) {
            node.node_type = Some(NodeType::Validator);
            node.status = Some(NodeStatus::Queued);
            node.position = entry.position;
            node.shard = None;
        } else {
            nodes.push(Node {
                bls: entry.bls.clone(),
                node_type: Some(NodeType::Validator),
                status: Some(NodeStatus::Queued),
                position: entry.position,
                ..Default::default()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(bls: &str, peer_type: &str, shard: Option<u32>) -> HeartbeatEntry {
        HeartbeatEntry {
            public_key: bls.to_string(),
            is_active: true,
            peer_type: peer_type.to_string(),
            shard_id: shard,
            version_number: "v1.4.8/go1.20".to_string(),
            node_display_name: format!("node-{bls}"),
            identity: String::new(),
            nonce: 100,
            num_instances: 1,
            peer_sub_type: 0,
        }
    }

    fn statistics(validator_status: &str, shard: Option<u32>) -> ValidatorStatisticsEntry {
        ValidatorStatisticsEntry {
            rating: 100.0,
            temp_rating: 99.5,
            validator_status: validator_status.to_string(),
            shard_id: shard,
            num_leader_success: 10,
            ..Default::default()
        }
    }

    #[test]
    fn decision_table_prefers_explicit_validator_sub_statuses() {
        use NodeStatus::*;
        use NodeType::*;

        for (sub_status, expected) in [
            ("new", New),
            ("auction", Auction),
            ("jailed", Jailed),
            ("inactive", Inactive),
            ("leaving", Leaving),
            ("forcedToLeaving", Leaving),
        ] {
            assert_eq!(
                derive_type_and_status(Some("observer"), Some(sub_status)),
                (Some(Validator), Some(expected)),
                "sub-status {sub_status}"
            );
        }

        assert_eq!(
            derive_type_and_status(Some("observer"), None),
            (Some(Observer), None)
        );
        assert_eq!(
            derive_type_and_status(Some("eligible"), None),
            (Some(Validator), Some(Eligible))
        );
        assert_eq!(
            derive_type_and_status(None, Some("waiting")),
            (Some(Validator), Some(Waiting))
        );
        assert_eq!(derive_type_and_status(None, None), (None, None));
    }

    #[test]
    fn version_normalization_strips_suffixes_and_paths() {
        assert_eq!(normalize_version("v1.4.8/go1.20"), "v1.4.8");
        assert_eq!(normalize_version("v1.4.8-rc1"), "v1.4.8");
        assert_eq!(normalize_version("v1.4.8"), "v1.4.8");
        assert_eq!(normalize_version(""), "");
    }

    #[test]
    fn merge_unions_both_feeds_deterministically() {
        let heartbeats = vec![heartbeat("aa02", "eligible", Some(1))];
        let mut stats = ValidatorStatistics::new();
        stats.insert("aa02".to_string(), statistics("eligible", Some(1)));
        stats.insert("aa03".to_string(), statistics("waiting", Some(0)));
        stats.insert("aa01".to_string(), statistics("waiting", Some(2)));

        let nodes = merge_heartbeat_and_statistics(&heartbeats, &stats, "v1.4.8");

        // Heartbeat order first, then statistics-only keys sorted.
        let keys: Vec<&str> = nodes.iter().map(|n| n.bls.as_str()).collect();
        assert_eq!(keys, vec!["aa02", "aa01", "aa03"]);

        let merged = &nodes[0];
        assert!(merged.online);
        assert_eq!(merged.name, "node-aa02");
        assert_eq!(merged.rating, 100.0);
        assert_eq!(merged.leader_success, 10);
        assert_eq!(merged.status, Some(NodeStatus::Eligible));
        assert!(merged.issues.is_empty());

        let stats_only = &nodes[1];
        assert!(!stats_only.online);
        assert_eq!(stats_only.status, Some(NodeStatus::Waiting));
        assert_eq!(stats_only.shard, Some(2));
    }

    #[test]
    fn version_mismatch_is_reported_as_issue() {
        let heartbeats = vec![heartbeat("aa01", "eligible", Some(0))];
        let nodes =
            merge_heartbeat_and_statistics(&heartbeats, &ValidatorStatistics::new(), "v1.4.9");
        assert_eq!(nodes[0].issues, vec![ISSUE_VERSION_MISMATCH.to_string()]);
    }

    #[test]
    fn jailed_nodes_lose_their_shard_assignment() {
        let heartbeats = vec![heartbeat("aa01", "eligible", Some(1))];
        let mut stats = ValidatorStatistics::new();
        stats.insert("aa01".to_string(), statistics("jailed", Some(1)));

        let nodes = merge_heartbeat_and_statistics(&heartbeats, &stats, "");
        assert_eq!(nodes[0].status, Some(NodeStatus::Jailed));
        assert_eq!(nodes[0].shard, None);
    }

    #[test]
    fn queue_overrides_existing_nodes_and_materializes_missing_ones() {
        let heartbeats = vec![heartbeat("aa01", "eligible", Some(1))];
        let mut nodes =
            merge_heartbeat_and_statistics(&heartbeats, &ValidatorStatistics::new(), "");

        let queue = vec![
            QueueEntry {
                bls: "aa01".to_string(),
                nonce: 5,
                reward_address: "reward".to_string(),
                position: 1,
            },
            QueueEntry {
                bls: "aa09".to_string(),
                nonce: 6,
                reward_address: "reward".to_string(),
                position: 2,
            },
        ];
        merge_queue(&mut nodes, &queue);

        let existing = nodes.iter().find(|n| n.bls == "aa01").unwrap();
        assert_eq!(existing.node_type, Some(NodeType::Validator));
        assert_eq!(existing.status, Some(NodeStatus::Queued));
        assert_eq!(existing.position, 1);
        assert_eq!(existing.shard, None);

        let synthesized = nodes.iter().find(|n| n.bls == "aa09").unwrap();
        assert_eq!(synthesized.status, Some(NodeStatus::Queued));
        assert_eq!(synthesized.position, 2);
        assert_eq!(synthesized.stake, "0");
    }
}

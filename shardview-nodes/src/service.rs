use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures_util::{stream, StreamExt};
use itertools::Itertools;
use log::*;
use num_bigint::BigUint;
use shardview_cache::CacheHandler;
use shardview_codec::{address_to_hex, decode_address, decode_hex_key, decode_u64};
use shardview_core::{
    Node, NodeAuction, NodeFilter, NodeSort, NodeStatus, Pagination, QueueEntry, SortOrder,
};
use shardview_gateway::{ChainGateway, VmQueryClient};

use crate::{
    auctions,
    config::NodesConfig,
    errors::{NodesError, NodesResult},
    filter::filter_nodes,
    keys, merge,
    resolvers::{EpochResolver, StakeEntry, StakeResolver, UnbondPeriodResolver},
};

const FN_QUEUE_SIZE: &str = "getQueueSize";
const FN_QUEUE_REGISTER: &str = "getQueueRegisterNonceAndRewardAddress";
const FN_OWNER: &str = "getOwner";
const FN_BLS_KEYS_STATUS: &str = "getBlsKeysStatus";

// -----------------
// NodeService
// -----------------
/// The aggregation engine: assembles the canonical node snapshot from the
/// gateway feeds, the staking queue, cached identity/owner/provider lookups,
/// stake figures and the staking-v4 auction list, then serves filtered views
/// of it.
///
/// The snapshot is built at most once per TTL window; concurrent callers
/// share the in-flight build through the cache handler.
pub struct NodeService<G, V> {
    gateway: Arc<G>,
    vm: Arc<V>,
    cache: Arc<CacheHandler>,
    stakes: Arc<dyn StakeResolver>,
    epochs: Arc<dyn EpochResolver>,
    unbonding: Arc<dyn UnbondPeriodResolver>,
    config: NodesConfig,
}

impl<G: ChainGateway, V: VmQueryClient> NodeService<G, V> {
    pub fn new(
        gateway: Arc<G>,
        vm: Arc<V>,
        cache: Arc<CacheHandler>,
        stakes: Arc<dyn StakeResolver>,
        epochs: Arc<dyn EpochResolver>,
        unbonding: Arc<dyn UnbondPeriodResolver>,
        config: NodesConfig,
    ) -> Self {
        Self {
            gateway,
            vm,
            cache,
            stakes,
            epochs,
            unbonding,
            config,
        }
    }

    // -----------------
    // Query surface
    // -----------------

    pub async fn get_all_nodes(&self) -> NodesResult<Vec<Node>> {
        self.cache
            .get_or_set(&keys::all_nodes(), self.config.nodes_ttl, || {
                self.build_all_nodes()
            })
            .await
    }

    pub async fn get_node(&self, bls: &str) -> NodesResult<Option<Node>> {
        Ok(self
            .get_all_nodes()
            .await?
            .into_iter()
            .find(|node| node.bls == bls))
    }

    pub async fn get_nodes(
        &self,
        pagination: Pagination,
        filter: &NodeFilter,
    ) -> NodesResult<Vec<Node>> {
        let nodes = self.get_all_nodes().await?;
        Ok(pagination.slice(&filter_nodes(&nodes, filter)))
    }

    pub async fn get_node_count(&self, filter: &NodeFilter) -> NodesResult<usize> {
        Ok(filter_nodes(&self.get_all_nodes().await?, filter).len())
    }

    /// Share of each version among versioned nodes, keyed by normalized
    /// version string.
    pub async fn get_node_versions(&self) -> NodesResult<BTreeMap<String, f64>> {
        self.cache
            .get_or_set(
                &keys::node_versions(),
                self.config.versions_ttl,
                || async {
                    let nodes = self.get_all_nodes().await?;
                    Ok(version_histogram(&nodes))
                },
            )
            .await
    }

    /// Auction view: all auction-status nodes collapsed into staking units,
    /// optionally searched and filtered by qualification, paged. Explicit
    /// sorting covers the fields a unit actually has (name, qualified
    /// stake); any other sort field is rejected.
    pub async fn get_nodes_auctions(
        &self,
        pagination: Pagination,
        filter: &NodeFilter,
    ) -> NodesResult<Vec<NodeAuction>> {
        let nodes = self.get_all_nodes().await?;
        let mut groups = auctions::group_auctions(&nodes);

        if let Some(search) = &filter.search {
            let search = search.to_lowercase();
            groups.retain(|group| {
                group
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&search))
                    || group
                        .identity
                        .as_deref()
                        .is_some_and(|identity| identity.to_lowercase().contains(&search))
                    || group
                        .bls
                        .as_deref()
                        .is_some_and(|bls| bls.to_lowercase().contains(&search))
            });
        }
        if let Some(qualified) = filter.qualified {
            groups.retain(|group| (group.qualified_auction_validators > 0) == qualified);
        }

        match (filter.sort, filter.order) {
            (None, None) => auctions::sort_auctions_default(&mut groups),
            (sort, order) => {
                match sort {
                    None | Some(NodeSort::QualifiedStake) => groups
                        .sort_by(|a, b| qualified_stake_of(a).cmp(&qualified_stake_of(b))),
                    Some(NodeSort::Name) => groups.sort_by(|a, b| {
                        let left = a.name.as_deref().unwrap_or_default().to_lowercase();
                        let right = b.name.as_deref().unwrap_or_default().to_lowercase();
                        left.cmp(&right)
                    }),
                    Some(other) => {
                        return Err(NodesError::UnsupportedAuctionSort(
                            other.as_str().to_string(),
                        ))
                    }
                }
                if order == Some(SortOrder::Desc) {
                    groups.reverse();
                }
            }
        }

        Ok(pagination.slice(&groups))
    }

    /// Drops the cached owner entry of every BLS key the given address
    /// controls, forcing re-resolution on the next snapshot build. Returns
    /// the keys actually invalidated.
    pub async fn delete_owners_for_address_in_cache(
        &self,
        address: &str,
    ) -> NodesResult<Vec<String>> {
        let epoch = self.epochs.get_current_epoch().await?;
        let owned = self.owned_bls_keys(address).await?;

        let mut invalidated = Vec::with_capacity(owned.len());
        for bls in owned {
            invalidated.extend(
                self.cache
                    .delete_in_cache(&keys::owner(epoch, &bls))
                    .await?,
            );
        }
        Ok(invalidated)
    }

    // -----------------
    // Snapshot build pipeline
    // -----------------

    async fn build_all_nodes(&self) -> NodesResult<Vec<Node>> {
        let (heartbeats, statistics, network_config) = tokio::try_join!(
            self.gateway.get_node_heartbeat_status(),
            self.gateway.get_validator_statistics(),
            self.gateway.get_network_config(),
        )?;

        let mut nodes = merge::merge_heartbeat_and_statistics(
            &heartbeats,
            &statistics,
            &network_config.latest_tag_software_version,
        );

        let queue = self.fetch_staking_queue().await?;
        merge::merge_queue(&mut nodes, &queue);

        self.resolve_identities(&mut nodes).await;

        let epoch = self.epochs.get_current_epoch().await?;
        self.resolve_owners(&mut nodes, epoch).await?;
        self.resolve_providers(&mut nodes).await;
        self.apply_stakes(&mut nodes).await?;
        self.apply_auctions(&mut nodes, epoch).await?;
        self.apply_unbond_periods(&mut nodes).await;

        debug!("Built node snapshot with {} entries", nodes.len());
        Ok(nodes)
    }

    /// The queue register is a flat list of (key, reward address, nonce)
    /// triplets; positions are 1-based in register order. Queue failures
    /// fail the whole build; a snapshot silently missing its queued nodes
    /// would be served for a full TTL window.
    async fn fetch_staking_queue(&self) -> NodesResult<Vec<QueueEntry>> {
        let data = self
            .vm
            .vm_query(
                &self.config.staking_contract,
                FN_QUEUE_SIZE,
                Some(&self.config.auction_contract),
                &[],
            )
            .await?;
        let size = match data.first() {
            Some(encoded) => decode_u64(encoded)?,
            None => 0,
        };
        if size == 0 {
            return Ok(vec![]);
        }

        let data = self
            .vm
            .vm_query(
                &self.config.staking_contract,
                FN_QUEUE_REGISTER,
                Some(&self.config.auction_contract),
                &[],
            )
            .await?;
        if data.len() % 3 != 0 {
            return Err(NodesError::MalformedContractResponse {
                function: FN_QUEUE_REGISTER.to_string(),
                reason: format!("expected triplets, got {} values", data.len()),
            });
        }

        let mut queue = Vec::with_capacity(data.len() / 3);
        for (idx, (bls, reward, nonce)) in data.iter().tuples().enumerate() {
            queue.push(QueueEntry {
                bls: decode_hex_key(bls)?,
                reward_address: decode_address(reward)?,
                nonce: decode_u64(nonce)?,
                position: idx as u64 + 1,
            });
        }
        Ok(queue)
    }

    /// Overlays identities confirmed out-of-band over whatever the heartbeat
    /// reported. Purely best-effort.
    async fn resolve_identities(&self, nodes: &mut [Node]) {
        let candidates: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.status != Some(NodeStatus::Inactive))
            .map(|(idx, _)| idx)
            .collect();
        let cache_keys: Vec<String> = candidates
            .iter()
            .map(|&idx| keys::confirmed_identity(&nodes[idx].bls))
            .collect();

        match self.cache.get_remote_many::<String>(&cache_keys).await {
            Ok(values) => {
                for (&idx, identity) in candidates.iter().zip(values) {
                    if let Some(identity) = identity {
                        nodes[idx].identity = Some(identity.to_lowercase());
                    }
                }
            }
            Err(err) => warn!("Confirmed identity lookup failed: {err}"),
        }
    }

    /// Owner entries are cached per (epoch, key); only cache misses reach
    /// the contract, and each contract round trip resolves the owner's
    /// entire key set at once.
    async fn resolve_owners(&self, nodes: &mut [Node], epoch: u32) -> NodesResult<()> {
        let candidates: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_validator())
            .map(|(idx, _)| idx)
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let cache_keys: Vec<String> = candidates
            .iter()
            .map(|&idx| keys::owner(epoch, &nodes[idx].bls))
            .collect();
        let cached = self.cache.get_remote_many::<String>(&cache_keys).await?;

        let mut owners: HashMap<String, String> = HashMap::new();
        let mut missing: Vec<String> = vec![];
        for (&idx, value) in candidates.iter().zip(cached) {
            match value {
                Some(owner) => {
                    owners.insert(nodes[idx].bls.clone(), owner);
                }
                None => missing.push(nodes[idx].bls.clone()),
            }
        }

        let mut fresh: Vec<(String, String)> = vec![];
        for bls in missing {
            if owners.contains_key(&bls) {
                // Already resolved as a sibling of an earlier miss.
                continue;
            }
            match self.resolve_owner_amortized(&bls).await {
                Ok(resolved) => {
                    for (sibling, owner) in resolved {
                        fresh.push((keys::owner(epoch, &sibling), owner.clone()));
                        owners.insert(sibling, owner);
                    }
                }
                Err(err) => warn!("Owner resolution for '{bls}' failed: {err}"),
            }
        }

        if !fresh.is_empty() {
            if let Err(err) = self
                .cache
                .set_remote_many(&fresh, self.config.owner_ttl)
                .await
            {
                warn!("Failed to cache resolved owners: {err}");
            }
        }

        for &idx in &candidates {
            if let Some(owner) = owners.get(&nodes[idx].bls) {
                nodes[idx].owner = owner.clone();
            }
        }
        Ok(())
    }

    /// getOwner for one key, then getBlsKeysStatus to claim every sibling
    /// key that owner controls in the same round trip.
    async fn resolve_owner_amortized(&self, bls: &str) -> NodesResult<Vec<(String, String)>> {
        let data = self
            .vm
            .vm_query(
                &self.config.staking_contract,
                FN_OWNER,
                Some(&self.config.auction_contract),
                &[bls.to_string()],
            )
            .await?;
        let owner = match data.first() {
            Some(encoded) => decode_address(encoded)?,
            None => {
                return Err(NodesError::MalformedContractResponse {
                    function: FN_OWNER.to_string(),
                    reason: "empty return data".to_string(),
                })
            }
        };

        match self.owned_bls_keys(&owner).await {
            Ok(siblings) if !siblings.is_empty() => Ok(siblings
                .into_iter()
                .map(|sibling| (sibling, owner.clone()))
                .collect()),
            Ok(_) => Ok(vec![(bls.to_string(), owner)]),
            Err(err) => {
                warn!("Key enumeration for owner '{owner}' failed: {err}");
                Ok(vec![(bls.to_string(), owner)])
            }
        }
    }

    /// All BLS keys registered to `owner`, from the (key, status) pair list
    /// the staking contract returns.
    async fn owned_bls_keys(&self, owner: &str) -> NodesResult<Vec<String>> {
        let data = self
            .vm
            .vm_query(
                &self.config.staking_contract,
                FN_BLS_KEYS_STATUS,
                None,
                &[address_to_hex(owner)?],
            )
            .await?;
        if data.len() % 2 != 0 {
            return Err(NodesError::MalformedContractResponse {
                function: FN_BLS_KEYS_STATUS.to_string(),
                reason: format!("expected pairs, got {} values", data.len()),
            });
        }

        data.iter()
            .tuples()
            .map(|(key, _status)| decode_hex_key(key).map_err(NodesError::from))
            .collect()
    }

    /// When a resolved owner turns out to be a staking provider contract,
    /// the node is re-attributed: the contract becomes the provider and its
    /// own owner becomes the node owner.
    async fn resolve_providers(&self, nodes: &mut [Node]) {
        let mut owners: Vec<String> = nodes
            .iter()
            .map(|node| node.owner.clone())
            .filter(|owner| !owner.is_empty())
            .collect();
        owners.sort();
        owners.dedup();
        if owners.is_empty() {
            return;
        }

        let cache_keys: Vec<String> = owners.iter().map(|owner| keys::provider_owner(owner)).collect();
        match self.cache.get_remote_many::<String>(&cache_keys).await {
            Ok(values) => {
                let upstream: HashMap<String, String> = owners
                    .into_iter()
                    .zip(values)
                    .filter_map(|(owner, value)| value.map(|value| (owner, value)))
                    .collect();
                for node in nodes.iter_mut() {
                    if let Some(owner) = upstream.get(&node.owner) {
                        node.provider = std::mem::replace(&mut node.owner, owner.clone());
                    }
                }
            }
            Err(err) => warn!("Provider ownership lookup failed: {err}"),
        }
    }

    /// Stake figures are cached per address and fetched in one batch; the
    /// per-address computation is isolated so a single failing address
    /// costs only its own figures.
    async fn apply_stakes(&self, nodes: &mut [Node]) -> NodesResult<()> {
        let mut addresses: Vec<String> = nodes
            .iter()
            .filter(|node| node.is_validator())
            .map(|node| node.provider_or_owner().to_string())
            .filter(|address| !address.is_empty())
            .collect();
        addresses.sort();
        addresses.dedup();
        if addresses.is_empty() {
            return Ok(());
        }

        let stakes = self.stakes.clone();
        let concurrency = self.config.max_concurrent_lookups;
        let batches: Vec<Vec<StakeEntry>> = self
            .cache
            .batch_process(
                &addresses,
                |address| keys::stake(address),
                self.config.stake_ttl,
                move |missing| async move {
                    let entries: Vec<Vec<StakeEntry>> = stream::iter(missing)
                        .map(|address| {
                            let stakes = stakes.clone();
                            async move {
                                match stakes.get_stakes(std::slice::from_ref(&address)).await {
                                    Ok(entries) => entries,
                                    Err(err) => {
                                        warn!("Stake lookup for '{address}' failed: {err}");
                                        vec![]
                                    }
                                }
                            }
                        })
                        .buffered(concurrency)
                        .collect()
                        .await;
                    Ok::<_, NodesError>(entries)
                },
            )
            .await?;
        let entries: Vec<StakeEntry> = batches.into_iter().flatten().collect();

        for node in nodes.iter_mut().filter(|node| node.is_validator()) {
            let target = node.provider_or_owner().to_string();
            // Jailed keys are absent from the contract's per-key figures;
            // only they fall back to their address aggregate. Everything
            // else matches per key or keeps its zeros.
            let entry = if node.status == Some(NodeStatus::Jailed) {
                entries
                    .iter()
                    .find(|entry| entry.address.as_deref() == Some(target.as_str()))
            } else {
                entries
                    .iter()
                    .find(|entry| entry.bls.as_deref() == Some(node.bls.as_str()))
            };
            if let Some(entry) = entry {
                node.stake = entry.stake.clone();
                node.top_up = entry.top_up.clone();
                node.locked = entry.locked.clone();
            }
        }
        Ok(())
    }

    async fn apply_auctions(&self, nodes: &mut [Node], epoch: u32) -> NodesResult<()> {
        if !self.config.staking_v4_enabled || epoch < self.config.staking_v4_activation_epoch {
            return Ok(());
        }

        let auction_list = self.gateway.get_validator_auctions().await?;
        let minimum = self.stakes.get_minimum_auction_stake(&auction_list).await?;
        auctions::process_auctions(nodes, &auction_list, &minimum);
        Ok(())
    }

    async fn apply_unbond_periods(&self, nodes: &mut [Node]) {
        let candidates: Vec<(usize, String)> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                matches!(
                    node.status,
                    Some(NodeStatus::Leaving | NodeStatus::Inactive)
                )
            })
            .map(|(idx, node)| (idx, node.bls.clone()))
            .collect();
        if candidates.is_empty() {
            return;
        }

        let unbonding = self.unbonding.clone();
        let periods: Vec<(usize, NodesResult<Option<u64>>)> = stream::iter(candidates)
            .map(|(idx, bls)| {
                let unbonding = unbonding.clone();
                async move { (idx, unbonding.get_remaining_unbond_period(&bls).await) }
            })
            .buffered(self.config.max_concurrent_lookups)
            .collect()
            .await;

        for (idx, period) in periods {
            match period {
                Ok(period) => nodes[idx].remaining_un_bond_period = period,
                Err(err) => warn!(
                    "Unbond period lookup for '{}' failed: {err}",
                    nodes[idx].bls
                ),
            }
        }
    }
}

fn qualified_stake_of(auction: &NodeAuction) -> BigUint {
    auction.qualified_stake.parse().unwrap_or_default()
}

/// Share of each normalized version among versioned nodes, rounded to two
/// decimals; the rounding remainder is folded into the largest bucket so
/// the shares sum to exactly 1.
fn version_histogram(nodes: &[Node]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for node in nodes {
        if !node.version.is_empty() {
            *counts.entry(node.version.clone()).or_default() += 1;
        }
    }
    let total: u64 = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }

    let mut shares: BTreeMap<String, f64> = counts
        .iter()
        .map(|(version, &count)| (version.clone(), round2(count as f64 / total as f64)))
        .collect();

    let remainder = 1.0 - shares.values().sum::<f64>();
    if remainder.abs() > f64::EPSILON {
        if let Some(largest) = counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(version, _)| version.clone())
        {
            let share = shares[&largest];
            shares.insert(largest, round2(share + remainder));
        }
    }
    shares
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Deterministic, human-readable cache keys encoding the cached concept and
//! its parameters.

pub fn all_nodes() -> String {
    "nodes".to_string()
}

pub fn node_versions() -> String {
    "nodeVersions".to_string()
}

pub fn owner(epoch: u32, bls: &str) -> String {
    format!("owner:{epoch}:{bls}")
}

pub fn stake(address: &str) -> String {
    format!("stake:{address}")
}

/// Populated by the out-of-band identity confirmation process; this crate
/// only ever reads it.
pub fn confirmed_identity(bls: &str) -> String {
    format!("confirmedIdentity:{bls}")
}

/// Populated by the provider-ownership feed; this crate only ever reads it.
pub fn provider_owner(address: &str) -> String {
    format!("providerOwner:{address}")
}

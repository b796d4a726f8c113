//! Loopback address allocation.
//!
//! Every node receives a loopback address used as its UDP tunnel endpoint,
//! allocated deterministically in declaration order. The reserved blackhole
//! address terminates interfaces that are not cabled to any peer.

use std::collections::HashMap;

/// Network portion of the per-node loopback addresses
pub const LOOPBACK_NETWORK: &str = "127.255.1";

/// Reserved name for the blackhole terminator
pub const BLACKHOLE_NAME: &str = "blackhole";

/// Loopback address of the blackhole terminator
pub const BLACKHOLE_ADDR: &str = "127.6.6.6";

/// Generate the loopback address map for the given node names.
///
/// Nodes are numbered from 1 in declaration order, so `sw01, sw02` maps to
/// `127.255.1.1, 127.255.1.2`. The blackhole entry is always included.
pub fn generate_loopbacks(node_names: &[String]) -> Result<HashMap<String, String>, String> {
    if node_names.is_empty() {
        return Err("list of nodes is empty".to_string());
    }
    if node_names.len() > 254 {
        return Err(format!(
            "cannot allocate loopbacks for {} nodes, maximum is 254",
            node_names.len()
        ));
    }

    let mut loopbacks: HashMap<String, String> = node_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), format!("{}.{}", LOOPBACK_NETWORK, i + 1)))
        .collect();
    loopbacks.insert(BLACKHOLE_NAME.to_string(), BLACKHOLE_ADDR.to_string());

    Ok(loopbacks)
}

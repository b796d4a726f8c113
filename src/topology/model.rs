//! Topology model construction and validation.
//!
//! [`TopologyModel::load`] turns a parsed spec into the immutable in-memory
//! model: it resolves resource profiles, allocates loopback addresses,
//! matches declared interface pairs into links, derives each side's tunnel
//! parameters, and pads unused NIC slots with blackhole interfaces. MAC
//! addresses are deliberately not assigned here; that happens at planning
//! time so randomness stays behind a single injectable seam.

use crate::config::Spec;
use crate::mac::{AddressError, OuiPrefix, DEFAULT_OUI};
use crate::topology::loopbacks::{generate_loopbacks, BLACKHOLE_ADDR};
use crate::topology::types::{
    Endpoint, HookAction, Interface, Link, LinkId, Node, ResourceProfile, TunnelParams,
    DEFAULT_ENCAPSULATION,
};
use crate::utils::ports::{explode_port, BLACKHOLE_SLOT, DATA_BASE_PORT};
use std::collections::{HashMap, HashSet};

/// Errors raised while building the topology model.
///
/// All of these are fatal: no partial model is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error(transparent)]
    InvalidPrefix(#[from] AddressError),
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),
    #[error("duplicate interface name '{interface}' on node '{node}'")]
    DuplicateInterface { node: String, interface: String },
    #[error("malformed link at {node}:{interface}: {reason}")]
    MalformedLink {
        node: String,
        interface: String,
        reason: String,
    },
    #[error("invalid slot {slot} for {node}:{interface}: {reason}")]
    InvalidSlot {
        node: String,
        interface: String,
        slot: u16,
        reason: String,
    },
    #[error("loopback allocation failed: {0}")]
    LoopbackAllocation(String),
}

/// Immutable in-memory topology: nodes in declaration order plus the links
/// joining their interfaces.
#[derive(Debug)]
pub struct TopologyModel {
    /// OUI prefix for MAC addresses generated at planning time
    pub oui: OuiPrefix,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl TopologyModel {
    /// Build and validate the model from a parsed spec.
    pub fn load(spec: &Spec) -> Result<TopologyModel, TopologyError> {
        let oui: OuiPrefix = spec
            .mac_oui
            .as_deref()
            .unwrap_or(DEFAULT_OUI)
            .parse()?;

        // Node names must be unique before anything else can be resolved
        let mut seen_nodes = HashSet::new();
        for node in &spec.nodes {
            if !seen_nodes.insert(node.name.as_str()) {
                return Err(TopologyError::DuplicateNode(node.name.clone()));
            }
        }

        let node_names: Vec<String> = spec.nodes.iter().map(|n| n.name.clone()).collect();
        let loopbacks = generate_loopbacks(&node_names).map_err(TopologyError::LoopbackAllocation)?;

        validate_interfaces(spec)?;
        let (links, link_ids) = match_links(spec)?;

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for node_spec in &spec.nodes {
            let loopback = loopbacks[&node_spec.name].clone();
            let nic_slots = node_spec.effective_nic_slots();

            let mut interfaces = Vec::new();
            let mut occupied_slots = HashSet::new();
            for iface_spec in &node_spec.interfaces {
                let link_id = link_ids[&(node_spec.name.clone(), iface_spec.name.clone())];
                let link = &links[link_id.0];
                let peer = link
                    .peer_of(&node_spec.name, &iface_spec.name)
                    .expect("link endpoints resolved during matching");
                let peer_slot = interface_slot(spec, &peer.node, &peer.interface)
                    .expect("peer interface resolved during matching");

                let tunnel = TunnelParams {
                    encapsulation: DEFAULT_ENCAPSULATION.to_string(),
                    local_addr: loopback.clone(),
                    local_port: exploded(node_spec, iface_spec.name.as_str(), iface_spec.slot)?,
                    remote_addr: loopbacks[&peer.node].clone(),
                    remote_port: exploded(node_spec, iface_spec.name.as_str(), peer_slot)?,
                };

                // A tunnel whose two ends coincide can never carry traffic
                if tunnel.local_addr == tunnel.remote_addr && tunnel.local_port == tunnel.remote_port
                {
                    return Err(TopologyError::MalformedLink {
                        node: node_spec.name.clone(),
                        interface: iface_spec.name.clone(),
                        reason: format!(
                            "tunnel endpoints are identical ({}:{})",
                            tunnel.local_addr, tunnel.local_port
                        ),
                    });
                }

                occupied_slots.insert(iface_spec.slot);
                interfaces.push(Interface {
                    name: iface_spec.name.clone(),
                    slot: iface_spec.slot,
                    mac: iface_spec.mac,
                    link: Some(link_id),
                    tunnel,
                });
            }

            // Pad the remaining NIC slots with blackhole interfaces so the
            // backend sees a fully populated adapter list
            for slot in 1..=nic_slots {
                if occupied_slots.contains(&slot) {
                    continue;
                }
                let name = format!("bh-int{}", slot);
                interfaces.push(Interface {
                    name: name.clone(),
                    slot,
                    mac: None,
                    link: None,
                    tunnel: TunnelParams {
                        encapsulation: DEFAULT_ENCAPSULATION.to_string(),
                        local_addr: loopback.clone(),
                        local_port: exploded(node_spec, &name, slot)?,
                        remote_addr: BLACKHOLE_ADDR.to_string(),
                        remote_port: DATA_BASE_PORT + BLACKHOLE_SLOT,
                    },
                });
                log::debug!("Padded {}:{} as blackhole interface", node_spec.name, name);
            }

            let pre_hooks = node_spec
                .hooks
                .before_provision
                .iter()
                .enumerate()
                .map(|(i, h)| HookAction {
                    name: h.effective_name("before-provision", i),
                    command: h.run.clone(),
                })
                .collect();
            let post_hooks = node_spec
                .hooks
                .after_teardown
                .iter()
                .enumerate()
                .map(|(i, h)| HookAction {
                    name: h.effective_name("after-teardown", i),
                    command: h.run.clone(),
                })
                .collect();

            nodes.push(Node {
                name: node_spec.name.clone(),
                box_image: node_spec.box_image.clone(),
                profile: ResourceProfile {
                    cpus: node_spec.effective_cpus(&spec.defaults),
                    memory_mb: node_spec.effective_memory_mb(&spec.defaults),
                },
                loopback,
                nic_slots,
                interfaces,
                pre_hooks,
                post_hooks,
            });
        }

        log::info!(
            "Built topology model: {} node(s), {} link(s)",
            nodes.len(),
            links.len()
        );

        Ok(TopologyModel { oui, nodes, links })
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Look up a link by its identifier
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }
}

/// Per-node interface checks: unique names, unique and in-range slots.
fn validate_interfaces(spec: &Spec) -> Result<(), TopologyError> {
    for node in &spec.nodes {
        let mut seen_names = HashSet::new();
        let mut seen_slots = HashMap::new();
        let nic_slots = node.effective_nic_slots();

        for iface in &node.interfaces {
            if !seen_names.insert(iface.name.as_str()) {
                return Err(TopologyError::DuplicateInterface {
                    node: node.name.clone(),
                    interface: iface.name.clone(),
                });
            }

            if iface.slot == BLACKHOLE_SLOT {
                return Err(TopologyError::InvalidSlot {
                    node: node.name.clone(),
                    interface: iface.name.clone(),
                    slot: iface.slot,
                    reason: format!("slot {} is reserved for blackhole interfaces", BLACKHOLE_SLOT),
                });
            }
            if iface.slot == 0 || iface.slot > 99 {
                return Err(TopologyError::InvalidSlot {
                    node: node.name.clone(),
                    interface: iface.name.clone(),
                    slot: iface.slot,
                    reason: "cabled slots must be in the range 1..=99".to_string(),
                });
            }
            if iface.slot > nic_slots {
                return Err(TopologyError::InvalidSlot {
                    node: node.name.clone(),
                    interface: iface.name.clone(),
                    slot: iface.slot,
                    reason: format!("node declares only {} NIC slot(s)", nic_slots),
                });
            }

            if let Some(other) = seen_slots.insert(iface.slot, iface.name.clone()) {
                return Err(TopologyError::InvalidSlot {
                    node: node.name.clone(),
                    interface: iface.name.clone(),
                    slot: iface.slot,
                    reason: format!("slot already occupied by interface '{}'", other),
                });
            }
        }
    }

    Ok(())
}

/// Match declared interface pairs into links.
///
/// Both sides must declare each other; anything else (missing peer node,
/// missing peer interface, self-loop, asymmetric declaration) is a
/// malformed link. The A side of each link is the endpoint encountered
/// first in declaration order.
fn match_links(
    spec: &Spec,
) -> Result<(Vec<Link>, HashMap<(String, String), LinkId>), TopologyError> {
    // Index of every declared endpoint to its declared peer
    let mut declared_peers: HashMap<(&str, &str), (&str, &str)> = HashMap::new();
    for node in &spec.nodes {
        for iface in &node.interfaces {
            declared_peers.insert(
                (node.name.as_str(), iface.name.as_str()),
                (iface.peer_node.as_str(), iface.peer_interface.as_str()),
            );
        }
    }

    let malformed = |node: &str, interface: &str, reason: String| TopologyError::MalformedLink {
        node: node.to_string(),
        interface: interface.to_string(),
        reason,
    };

    let mut links = Vec::new();
    let mut link_ids: HashMap<(String, String), LinkId> = HashMap::new();

    for node in &spec.nodes {
        for iface in &node.interfaces {
            let local = (node.name.as_str(), iface.name.as_str());
            let peer = (iface.peer_node.as_str(), iface.peer_interface.as_str());

            if peer == local {
                return Err(malformed(
                    local.0,
                    local.1,
                    "interface is cabled to itself".to_string(),
                ));
            }

            let peers_peer = match declared_peers.get(&peer) {
                Some(p) => *p,
                None => {
                    let reason = if spec.nodes.iter().any(|n| n.name == peer.0) {
                        format!("peer interface '{}:{}' is not declared", peer.0, peer.1)
                    } else {
                        format!("peer node '{}' is not declared", peer.0)
                    };
                    return Err(malformed(local.0, local.1, reason));
                }
            };

            if peers_peer != local {
                return Err(malformed(
                    local.0,
                    local.1,
                    format!(
                        "peer '{}:{}' is cabled to '{}:{}', not back to '{}:{}'",
                        peer.0, peer.1, peers_peer.0, peers_peer.1, local.0, local.1
                    ),
                ));
            }

            // Create the link on the first endpoint encountered
            let key = (local.0.to_string(), local.1.to_string());
            if link_ids.contains_key(&key) {
                continue;
            }
            let id = LinkId(links.len());
            links.push(Link {
                a: Endpoint {
                    node: local.0.to_string(),
                    interface: local.1.to_string(),
                },
                b: Endpoint {
                    node: peer.0.to_string(),
                    interface: peer.1.to_string(),
                },
            });
            link_ids.insert(key, id);
            link_ids.insert((peer.0.to_string(), peer.1.to_string()), id);
        }
    }

    Ok((links, link_ids))
}

/// Slot number of a declared interface
fn interface_slot(spec: &Spec, node: &str, interface: &str) -> Option<u16> {
    spec.nodes
        .iter()
        .find(|n| n.name == node)?
        .interfaces
        .iter()
        .find(|i| i.name == interface)
        .map(|i| i.slot)
}

/// Map a slot through the data port range, attributing errors to the interface
fn exploded(
    node: &crate::config::NodeSpec,
    interface: &str,
    slot: u16,
) -> Result<u16, TopologyError> {
    explode_port(slot, DATA_BASE_PORT).map_err(|reason| TopologyError::InvalidSlot {
        node: node.name.clone(),
        interface: interface.to_string(),
        slot,
        reason,
    })
}

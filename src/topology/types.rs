//! Topology type definitions.
//!
//! In-memory representation of the declared lab: nodes with resource
//! profiles and ordered interfaces, and the point-to-point links joining
//! interface pairs. Constructed once by the loader and never mutated
//! afterwards; the planner consumes it by reference.

use crate::mac::MacAddress;
use serde::{Deserialize, Serialize};

/// UDP encapsulation, the only tunnel transport currently emitted
pub const DEFAULT_ENCAPSULATION: &str = "udp";

/// Compute resources assigned to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub cpus: u32,
    pub memory_mb: u64,
}

/// Identifier of a link within its owning model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);

/// One side's tunnel transport parameters.
///
/// The local address/port belong to the owning interface; the remote pair
/// points at the peer (or at the blackhole terminator for uncabled slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelParams {
    pub encapsulation: String,
    pub local_addr: String,
    pub local_port: u16,
    pub remote_addr: String,
    pub remote_port: u16,
}

/// A network interface on a node
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    /// Adapter slot the interface occupies
    pub slot: u16,
    /// Pinned MAC address; `None` means the planner draws one
    pub mac: Option<MacAddress>,
    /// Link this interface is cabled into; `None` for blackhole padding
    pub link: Option<LinkId>,
    /// This side's tunnel transport parameters
    pub tunnel: TunnelParams,
}

impl Interface {
    /// Returns true if this is a blackhole padding interface
    pub fn is_blackhole(&self) -> bool {
        self.link.is_none()
    }
}

/// A declared node with its interfaces and lifecycle hooks
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub box_image: String,
    pub profile: ResourceProfile,
    /// Loopback address used as this node's tunnel endpoint
    pub loopback: String,
    pub nic_slots: u16,
    pub interfaces: Vec<Interface>,
    pub pre_hooks: Vec<HookAction>,
    pub post_hooks: Vec<HookAction>,
}

impl Node {
    /// Find an interface by name
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// One endpoint of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node: String,
    pub interface: String,
}

/// A point-to-point link between two interfaces.
///
/// The A side is the endpoint that appears first in declaration order.
#[derive(Debug, Clone)]
pub struct Link {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Link {
    /// The endpoint opposite the given one, if the link contains it
    pub fn peer_of(&self, node: &str, interface: &str) -> Option<&Endpoint> {
        if self.a.node == node && self.a.interface == interface {
            Some(&self.b)
        } else if self.b.node == node && self.b.interface == interface {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// A scheduled side-effect command attached to a node lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookAction {
    pub name: String,
    pub command: String,
}

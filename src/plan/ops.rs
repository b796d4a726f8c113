//! Provisioning operation records.
//!
//! A plan is an ordered sequence of these tagged records. They serialize
//! with an `op` tag so an external backend dispatcher can execute the plan
//! verbatim without knowing anything about this crate's internals.

use crate::mac::MacAddress;
use crate::topology::TunnelParams;
use serde::{Deserialize, Serialize};

/// Node lifecycle phase a hook is scheduled against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    /// Runs before the node's first interface is attached
    PreProvision,
    /// Runs after the node's teardown point
    PostTeardown,
}

/// One side of an established tunnel, attributed to its owning node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    pub node: String,
    pub interface: String,
    pub addr: String,
    pub port: u16,
}

/// A single backend operation.
///
/// Ordering within a plan is significant: operations execute in emitted
/// order, and an `EstablishTunnel` never precedes the `AttachInterface` of
/// either of its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProvisionOp {
    DefineNode {
        node: String,
        #[serde(rename = "box")]
        box_image: String,
        cpus: u32,
        memory_mb: u64,
    },
    AttachInterface {
        node: String,
        interface: String,
        mac: MacAddress,
        tunnel: TunnelParams,
    },
    EstablishTunnel {
        encapsulation: String,
        a: TunnelEndpoint,
        b: TunnelEndpoint,
    },
    RunHook {
        node: String,
        phase: HookPhase,
        name: String,
        command: String,
    },
}

impl ProvisionOp {
    /// Returns true for hook operations, which execute best-effort
    pub fn is_hook(&self) -> bool {
        matches!(self, ProvisionOp::RunHook { .. })
    }

    /// The node an operation belongs to, if it is node-scoped
    pub fn node(&self) -> Option<&str> {
        match self {
            ProvisionOp::DefineNode { node, .. }
            | ProvisionOp::AttachInterface { node, .. }
            | ProvisionOp::RunHook { node, .. } => Some(node),
            ProvisionOp::EstablishTunnel { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_serialization_tags() {
        let op = ProvisionOp::DefineNode {
            node: "sw01".to_string(),
            box_image: "arista/veos".to_string(),
            cpus: 2,
            memory_mb: 2048,
        };

        let yaml = serde_yaml::to_string(&op).unwrap();
        assert!(yaml.contains("op: define_node"));
        assert!(yaml.contains("box: arista/veos"));

        let back: ProvisionOp = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_hook_phase_serialization() {
        let op = ProvisionOp::RunHook {
            node: "sw01".to_string(),
            phase: HookPhase::PreProvision,
            name: "add-volume-1".to_string(),
            command: "virsh vol-create-as default sw01-volume1.qcow2 10000".to_string(),
        };

        let yaml = serde_yaml::to_string(&op).unwrap();
        assert!(yaml.contains("op: run_hook"));
        assert!(yaml.contains("phase: pre_provision"));
        assert!(op.is_hook());
    }

    #[test]
    fn test_node_attribution() {
        let op = ProvisionOp::EstablishTunnel {
            encapsulation: "udp".to_string(),
            a: TunnelEndpoint {
                node: "sw01".to_string(),
                interface: "eth1".to_string(),
                addr: "127.255.1.1".to_string(),
                port: 10001,
            },
            b: TunnelEndpoint {
                node: "sw02".to_string(),
                interface: "eth1".to_string(),
                addr: "127.255.1.2".to_string(),
                port: 10001,
            },
        };
        assert_eq!(op.node(), None);
        assert!(!op.is_hook());
    }
}

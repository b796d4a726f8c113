//! Provisioning plan compilation.
//!
//! The planner walks the topology model in declaration order and emits the
//! backend operation sequence. It is a pure function of the model and the
//! address generator's random stream: same model, same seed, same plan.
//!
//! Ordering rules:
//! - nodes are defined in declaration order, interfaces attached in
//!   declaration order within their node;
//! - a node's pre-provision hooks run immediately before its first
//!   interface attach (or right after its define when it has none);
//! - a tunnel is established at the point the second of its two interfaces
//!   has been attached, so the backend never sees a tunnel referencing an
//!   interface that does not exist yet;
//! - post-teardown hooks are appended after every node is complete, nodes
//!   in declaration order.

use crate::mac::AddressGenerator;
use crate::plan::ops::{HookPhase, ProvisionOp, TunnelEndpoint};
use crate::topology::TopologyModel;

/// Per-node lifecycle state during plan compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Declared,
    Defined,
    InterfacesAttached,
    Hooked,
    Ready,
}

/// Errors raised during plan compilation.
///
/// These indicate an internally inconsistent model; a model built through
/// [`TopologyModel::load`] cannot trigger them.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("node '{node}' finished planning in state {state:?}, expected Ready")]
    IncompleteNode { node: String, state: NodeState },
    #[error("tunnel for {node}:{interface} never saw its second interface attached")]
    DanglingTunnel { node: String, interface: String },
}

/// Compile the topology model into an ordered operation sequence.
///
/// Interfaces without a pinned MAC address receive one from `generator`
/// under the model's OUI prefix, in attach order.
pub fn plan(
    model: &TopologyModel,
    generator: &mut AddressGenerator,
) -> Result<Vec<ProvisionOp>, PlanError> {
    let mut ops = Vec::new();
    let mut states = vec![NodeState::Declared; model.nodes.len()];
    // First-attached endpoint of each link, consumed when the second side attaches
    let mut pending_tunnels: Vec<Option<TunnelEndpoint>> = vec![None; model.links.len()];

    for (node_index, node) in model.nodes.iter().enumerate() {
        ops.push(ProvisionOp::DefineNode {
            node: node.name.clone(),
            box_image: node.box_image.clone(),
            cpus: node.profile.cpus,
            memory_mb: node.profile.memory_mb,
        });
        states[node_index] = NodeState::Defined;

        let mut first_attach_pending = true;
        for interface in &node.interfaces {
            if first_attach_pending {
                emit_hooks(&mut ops, node, HookPhase::PreProvision);
                first_attach_pending = false;
            }

            let mac = interface
                .mac
                .unwrap_or_else(|| generator.generate(&model.oui));
            log::debug!(
                "Attaching {}:{} with MAC {} (slot {})",
                node.name,
                interface.name,
                mac,
                interface.slot
            );
            ops.push(ProvisionOp::AttachInterface {
                node: node.name.clone(),
                interface: interface.name.clone(),
                mac,
                tunnel: interface.tunnel.clone(),
            });

            // Blackhole interfaces terminate locally and never get a tunnel op
            let link_id = match interface.link {
                Some(id) => id,
                None => continue,
            };

            let endpoint = TunnelEndpoint {
                node: node.name.clone(),
                interface: interface.name.clone(),
                addr: interface.tunnel.local_addr.clone(),
                port: interface.tunnel.local_port,
            };
            match pending_tunnels[link_id.0].take() {
                // Second side attached: the tunnel can now be established
                Some(first) => ops.push(ProvisionOp::EstablishTunnel {
                    encapsulation: interface.tunnel.encapsulation.clone(),
                    a: first,
                    b: endpoint,
                }),
                None => pending_tunnels[link_id.0] = Some(endpoint),
            }
        }

        // A node without interfaces still runs its pre-provision hooks
        if first_attach_pending {
            emit_hooks(&mut ops, node, HookPhase::PreProvision);
        }
        states[node_index] = NodeState::InterfacesAttached;
    }

    if let Some(endpoint) = pending_tunnels.into_iter().flatten().next() {
        return Err(PlanError::DanglingTunnel {
            node: endpoint.node,
            interface: endpoint.interface,
        });
    }

    // Teardown section: post hooks per node, declaration order
    for (node_index, node) in model.nodes.iter().enumerate() {
        if !node.post_hooks.is_empty() {
            emit_hooks(&mut ops, node, HookPhase::PostTeardown);
            states[node_index] = NodeState::Hooked;
        }
        states[node_index] = NodeState::Ready;
    }

    for (node_index, state) in states.iter().enumerate() {
        if *state != NodeState::Ready {
            return Err(PlanError::IncompleteNode {
                node: model.nodes[node_index].name.clone(),
                state: *state,
            });
        }
    }

    log::info!("Compiled plan with {} operation(s)", ops.len());

    Ok(ops)
}

fn emit_hooks(ops: &mut Vec<ProvisionOp>, node: &crate::topology::Node, phase: HookPhase) {
    let hooks = match phase {
        HookPhase::PreProvision => &node.pre_hooks,
        HookPhase::PostTeardown => &node.post_hooks,
    };
    for hook in hooks {
        ops.push(ProvisionOp::RunHook {
            node: node.name.clone(),
            phase,
            name: hook.name.clone(),
            command: hook.command.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Spec;
    use crate::mac::AddressGenerator;
    use crate::topology::TopologyModel;

    fn plan_for(yaml: &str, seed: u64) -> Vec<ProvisionOp> {
        let spec: Spec = serde_yaml::from_str(yaml).unwrap();
        let model = TopologyModel::load(&spec).unwrap();
        let mut generator = AddressGenerator::from_seed(seed);
        plan(&model, &mut generator).unwrap()
    }

    const TWO_SWITCH_YAML: &str = r#"
mac_oui: "28:b7:ad"
nodes:
  - name: sw01
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw02
        peer_interface: eth1
      - name: eth2
        slot: 2
        peer_node: sw02
        peer_interface: eth2
  - name: sw02
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw01
        peer_interface: eth1
      - name: eth2
        slot: 2
        peer_node: sw01
        peer_interface: eth2
"#;

    /// Short textual shape of an op, for order assertions
    fn shape(op: &ProvisionOp) -> String {
        match op {
            ProvisionOp::DefineNode { node, .. } => format!("define {}", node),
            ProvisionOp::AttachInterface {
                node, interface, ..
            } => format!("attach {}:{}", node, interface),
            ProvisionOp::EstablishTunnel { a, b, .. } => {
                format!("tunnel {}:{}<->{}:{}", a.node, a.interface, b.node, b.interface)
            }
            ProvisionOp::RunHook { node, name, .. } => format!("hook {}:{}", node, name),
        }
    }

    #[test]
    fn test_two_switch_plan_shape() {
        let ops = plan_for(TWO_SWITCH_YAML, 1);
        let shapes: Vec<String> = ops.iter().map(shape).collect();

        assert_eq!(
            shapes,
            vec![
                "define sw01",
                "attach sw01:eth1",
                "attach sw01:eth2",
                "define sw02",
                "attach sw02:eth1",
                "tunnel sw01:eth1<->sw02:eth1",
                "attach sw02:eth2",
                "tunnel sw01:eth2<->sw02:eth2",
            ]
        );
    }

    #[test]
    fn test_op_counts() {
        let ops = plan_for(TWO_SWITCH_YAML, 1);

        let defines = ops
            .iter()
            .filter(|op| matches!(op, ProvisionOp::DefineNode { .. }))
            .count();
        let attaches = ops
            .iter()
            .filter(|op| matches!(op, ProvisionOp::AttachInterface { .. }))
            .count();
        let tunnels = ops
            .iter()
            .filter(|op| matches!(op, ProvisionOp::EstablishTunnel { .. }))
            .count();

        assert_eq!(defines, 2);
        assert_eq!(attaches, 4);
        assert_eq!(tunnels, 2);
        assert_eq!(ops.len(), 8);
    }

    #[test]
    fn test_tunnel_follows_both_attaches() {
        let ops = plan_for(TWO_SWITCH_YAML, 1);

        for (index, op) in ops.iter().enumerate() {
            if let ProvisionOp::EstablishTunnel { a, b, .. } = op {
                for endpoint in [a, b] {
                    let attach_index = ops
                        .iter()
                        .position(|other| {
                            matches!(
                                other,
                                ProvisionOp::AttachInterface { node, interface, .. }
                                    if *node == endpoint.node && *interface == endpoint.interface
                            )
                        })
                        .expect("every tunnel endpoint has an attach op");
                    assert!(
                        attach_index < index,
                        "tunnel at {} precedes attach of {}:{}",
                        index,
                        endpoint.node,
                        endpoint.interface
                    );
                }
            }
        }
    }

    #[test]
    fn test_plan_is_deterministic_per_seed() {
        let first = plan_for(TWO_SWITCH_YAML, 42);
        let second = plan_for(TWO_SWITCH_YAML, 42);
        assert_eq!(first, second);

        let third = plan_for(TWO_SWITCH_YAML, 7);
        assert_ne!(first, third);
    }

    #[test]
    fn test_macs_carry_model_oui() {
        let ops = plan_for(TWO_SWITCH_YAML, 1);

        for op in &ops {
            if let ProvisionOp::AttachInterface { mac, .. } = op {
                assert_eq!(mac.oui(), [0x28, 0xb7, 0xad]);
            }
        }
    }

    #[test]
    fn test_pinned_mac_not_regenerated() {
        let yaml = r#"
nodes:
  - name: sw01
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw02
        peer_interface: eth1
        mac: "28:b7:ad:00:00:01"
  - name: sw02
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw01
        peer_interface: eth1
"#;
        let ops = plan_for(yaml, 99);

        let mut macs = ops.iter().filter_map(|op| match op {
            ProvisionOp::AttachInterface { node, mac, .. } => Some((node.clone(), *mac)),
            _ => None,
        });
        let (node, mac) = macs.next().unwrap();
        assert_eq!(node, "sw01");
        assert_eq!(mac.to_string(), "28:b7:ad:00:00:01");
    }

    #[test]
    fn test_pre_hooks_before_first_attach() {
        let yaml = r#"
nodes:
  - name: sw01
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw02
        peer_interface: eth1
    hooks:
      before_provision:
        - name: add-volume-1
          run: "virsh vol-create-as default sw01-volume1.qcow2 10000"
        - run: "sleep 1"
  - name: sw02
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw01
        peer_interface: eth1
"#;
        let ops = plan_for(yaml, 1);
        let shapes: Vec<String> = ops.iter().map(shape).collect();

        // Hooks sit between the define and the first attach, in declared order
        assert_eq!(shapes[0], "define sw01");
        assert_eq!(shapes[1], "hook sw01:add-volume-1");
        assert_eq!(shapes[2], "hook sw01:before-provision-2");
        assert_eq!(shapes[3], "attach sw01:eth1");
    }

    #[test]
    fn test_post_hooks_after_all_nodes_ready() {
        let yaml = r#"
nodes:
  - name: sw01
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw02
        peer_interface: eth1
    hooks:
      after_teardown:
        - name: remove-volume-1
          run: "virsh vol-delete sw01-volume1.qcow2 default"
  - name: sw02
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw01
        peer_interface: eth1
"#;
        let ops = plan_for(yaml, 1);

        // The teardown hook is the very last op, after both nodes' sections
        match ops.last().unwrap() {
            ProvisionOp::RunHook { node, phase, name, .. } => {
                assert_eq!(node, "sw01");
                assert_eq!(*phase, HookPhase::PostTeardown);
                assert_eq!(name, "remove-volume-1");
            }
            other => panic!("expected trailing RunHook, got {:?}", other),
        }
    }

    #[test]
    fn test_node_without_interfaces_still_runs_hooks() {
        let yaml = r#"
nodes:
  - name: util01
    box: "generic/ubuntu2204"
    hooks:
      before_provision:
        - run: "echo prepare"
"#;
        let ops = plan_for(yaml, 1);
        let shapes: Vec<String> = ops.iter().map(shape).collect();

        assert_eq!(shapes, vec!["define util01", "hook util01:before-provision-1"]);
    }

    #[test]
    fn test_blackhole_interfaces_get_macs_but_no_tunnel() {
        let yaml = r#"
nodes:
  - name: sw01
    box: "arista/veos"
    nic_slots: 3
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw02
        peer_interface: eth1
  - name: sw02
    box: "arista/veos"
    interfaces:
      - name: eth1
        slot: 1
        peer_node: sw01
        peer_interface: eth1
"#;
        let ops = plan_for(yaml, 1);

        let attaches = ops
            .iter()
            .filter(|op| matches!(op, ProvisionOp::AttachInterface { .. }))
            .count();
        let tunnels = ops
            .iter()
            .filter(|op| matches!(op, ProvisionOp::EstablishTunnel { .. }))
            .count();

        // 1 cabled + 2 blackhole on sw01, 1 cabled on sw02; only one tunnel
        assert_eq!(attaches, 4);
        assert_eq!(tunnels, 1);

        let blackhole_attach = ops.iter().find_map(|op| match op {
            ProvisionOp::AttachInterface {
                interface, tunnel, ..
            } if interface == "bh-int2" => Some(tunnel.clone()),
            _ => None,
        });
        let tunnel = blackhole_attach.expect("blackhole interface is attached");
        assert_eq!(tunnel.remote_addr, "127.6.6.6");
        assert_eq!(tunnel.remote_port, 10666);
    }
}

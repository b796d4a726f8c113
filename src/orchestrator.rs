//! Plan generation orchestrator.
//!
//! This module coordinates the overall generation process, managing the
//! flow from spec parsing through plan compilation and artifact output.

use crate::config::Spec;
use crate::mac::{AddressGenerator, MacAddress};
use crate::plan::{plan, ProvisionOp};
use crate::topology::{TopologyModel, TunnelParams};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Wrapper serialized as the plan artifact
#[derive(Serialize, Debug)]
struct PlanDocument<'a> {
    operations: &'a [ProvisionOp],
}

/// One interface's resolved identity, written to the interface registry.
///
/// Backends and lab tooling read this to map interfaces to the MAC
/// addresses and tunnel endpoints the plan assigned them.
#[derive(Serialize, Debug)]
pub struct InterfaceRecord {
    pub node: String,
    pub interface: String,
    pub mac: MacAddress,
    /// True for padding interfaces terminated at the blackhole address
    pub blackhole: bool,
    pub tunnel: TunnelParams,
}

/// Registry of all interfaces in the plan.
///
/// Written to `interfaces.json` next to the plan for use by external
/// tooling.
#[derive(Serialize, Debug)]
pub struct InterfaceRegistry {
    pub interfaces: Vec<InterfaceRecord>,
}

/// Paths and counts produced by a generation run
#[derive(Debug)]
pub struct PlanArtifacts {
    pub plan_path: PathBuf,
    pub registry_path: PathBuf,
    pub operations: usize,
    pub nodes: usize,
    pub links: usize,
}

/// Generate the provisioning plan and its artifacts for a loaded spec.
///
/// Compiles the spec into a plan and writes two files into `output_dir`:
/// `plan.yaml` (the ordered operation sequence) and `interfaces.json` (the
/// resolved interface/address registry). A fixed `seed` reproduces the MAC
/// assignment exactly; `None` draws from OS entropy.
pub fn generate_plan_artifacts(
    spec: &Spec,
    output_dir: &Path,
    seed: Option<u64>,
) -> color_eyre::Result<(Vec<ProvisionOp>, PlanArtifacts)> {
    let model = TopologyModel::load(spec)?;

    let mut generator = match seed {
        Some(seed) => {
            log::info!("Using fixed MAC generator seed {}", seed);
            AddressGenerator::from_seed(seed)
        }
        None => AddressGenerator::new(),
    };

    let ops = plan(&model, &mut generator)?;

    std::fs::create_dir_all(output_dir).map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to create output directory '{}': {}",
            output_dir.display(),
            e
        )
    })?;

    // Write the plan
    let plan_path = output_dir.join("plan.yaml");
    let plan_yaml = serde_yaml::to_string(&PlanDocument { operations: &ops })?;
    std::fs::write(&plan_path, plan_yaml)?;

    // Write the interface registry, derived from the attach operations so
    // it reflects exactly what the plan will provision
    let registry = InterfaceRegistry {
        interfaces: ops
            .iter()
            .filter_map(|op| match op {
                ProvisionOp::AttachInterface {
                    node,
                    interface,
                    mac,
                    tunnel,
                } => Some(InterfaceRecord {
                    node: node.clone(),
                    interface: interface.clone(),
                    mac: *mac,
                    blackhole: model
                        .node(node)
                        .and_then(|n| n.interface(interface))
                        .map(|i| i.is_blackhole())
                        .unwrap_or(false),
                    tunnel: tunnel.clone(),
                }),
                _ => None,
            })
            .collect(),
    };
    let registry_path = output_dir.join("interfaces.json");
    let registry_json = serde_json::to_string_pretty(&registry)?;
    std::fs::write(&registry_path, &registry_json)?;

    println!("Generated provisioning plan at {:?}", plan_path);
    println!("  - Nodes: {}", model.nodes.len());
    println!("  - Links: {}", model.links.len());
    println!("  - Operations: {}", ops.len());
    println!("  - Interface registry created at {:?}", registry_path);

    let artifacts = PlanArtifacts {
        plan_path,
        registry_path,
        operations: ops.len(),
        nodes: model.nodes.len(),
        links: model.links.len(),
    };

    Ok((ops, artifacts))
}

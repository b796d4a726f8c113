//! # Topolab - Provisioning planner for virtual network-appliance labs
//!
//! This library provides core functionality for compiling declarative
//! virtual network lab topologies into ordered provisioning plans for an
//! external virtualization backend.
//!
//! ## Overview
//!
//! Topolab enables repeatable multi-node network labs without hand-writing
//! per-machine configuration. A single YAML spec declares the nodes, the
//! interface pairs cabled between them, and optional lifecycle hooks; the
//! planner resolves everything the backend needs — MAC addresses, loopback
//! tunnel endpoints, UDP tunnel ports — and emits an operation sequence the
//! backend can execute verbatim.
//!
//! ## Key Features
//!
//! - **Declarative Topologies**: Nodes and point-to-point links from one YAML file
//! - **Deterministic Identity**: Seedable MAC generation for reproducible plans
//! - **UDP Tunnel Links**: Per-link endpoint and port derivation over loopbacks
//! - **Blackhole Padding**: Unused NIC slots terminated at a blackhole address
//! - **Lifecycle Hooks**: Best-effort side actions before provision / after teardown
//! - **Backend Agnostic**: Plans are plain tagged records behind a dispatch trait
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe spec structures and YAML parsing
//! - `config_loader`: Spec file loading
//! - `mac`: MAC address types and the injectable-random address generator
//! - `topology`: Topology model, link matching, and loopback allocation
//! - `plan`: Provisioning operation records and the planner
//! - `dispatch`: Backend boundary and best-effort plan execution
//! - `orchestrator`: High-level orchestration of plan generation
//! - `utils`: Tunnel port mapping helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use topolab::{config_loader, orchestrator};
//!
//! // Load the topology spec from a YAML file
//! let spec = config_loader::load_spec(Path::new("topology.yaml"))?;
//!
//! // Compile the plan and write the artifacts
//! let (ops, artifacts) =
//!     orchestrator::generate_plan_artifacts(&spec, Path::new("plan_output"), Some(1))?;
//!
//! // The plan_output directory now contains:
//! // - plan.yaml: ordered provisioning operations
//! // - interfaces.json: resolved interface/address registry
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Spec Format
//!
//! ```yaml
//! mac_oui: "28:b7:ad"
//! defaults:
//!   cpus: 2
//!   memory_mb: 2048
//!
//! nodes:
//!   - name: sw01
//!     box: "arista/veos"
//!     interfaces:
//!       - name: eth1
//!         slot: 1
//!         peer_node: sw02
//!         peer_interface: eth1
//!   - name: sw02
//!     box: "arista/veos"
//!     interfaces:
//!       - name: eth1
//!         slot: 1
//!         peer_node: sw01
//!         peer_interface: eth1
//! ```
//!
//! ## Error Handling
//!
//! Spec and topology problems are typed (`thiserror`) and fatal: no partial
//! plan is ever produced. Application-level flows wrap errors with
//! `color_eyre` for contextual reports. Hook failures at execution time are
//! the one non-fatal case; they are logged and the remaining same-phase
//! hooks still run.

pub mod config;
pub mod config_loader;
pub mod dispatch;
pub mod mac;
pub mod orchestrator;
pub mod plan;
pub mod topology;
pub mod utils;

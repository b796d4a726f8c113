//! Network topology module.
//!
//! This module contains the in-memory topology model (nodes, interfaces,
//! links), loopback address allocation for tunnel endpoints, and the loader
//! that builds and validates the model from a declared spec.

pub mod loopbacks;
pub mod model;
pub mod types;

// Re-export key types and functions for easier access
pub use loopbacks::{generate_loopbacks, BLACKHOLE_ADDR, BLACKHOLE_NAME, LOOPBACK_NETWORK};
pub use model::{TopologyError, TopologyModel};
pub use types::{
    Endpoint, HookAction, Interface, Link, LinkId, Node, ResourceProfile, TunnelParams,
    DEFAULT_ENCAPSULATION,
};

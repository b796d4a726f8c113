use crate::mac::MacAddress;
use serde::{Deserialize, Serialize};

/// Fallback CPU count when neither the node nor the spec defaults set one
pub const DEFAULT_CPUS: u32 = 1;

/// Fallback memory size when neither the node nor the spec defaults set one
pub const DEFAULT_MEMORY_MB: u64 = 1024;

/// Declarative topology specification parsed from YAML
#[derive(Debug, Serialize, Deserialize)]
pub struct Spec {
    /// OUI prefix for generated MAC addresses (e.g. "28:b7:ad")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_oui: Option<String>,
    /// Resource profile defaults applied to nodes that omit their own values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<ResourceDefaults>,
    pub nodes: Vec<NodeSpec>,
}

impl Spec {
    /// Validate the spec's surface structure.
    ///
    /// Cross-node consistency (duplicate names, link matching) is checked
    /// by the topology loader; this only rejects specs that are malformed
    /// on their face.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.nodes.is_empty() {
            return Err(ValidationError::InvalidSpec(
                "nodes cannot be empty".to_string(),
            ));
        }

        for node in &self.nodes {
            node.validate()?;
        }

        Ok(())
    }
}

/// Spec-level resource defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResourceDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
}

/// A single declared node
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    /// Box/image reference understood by the virtualization backend
    #[serde(rename = "box")]
    pub box_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    /// Total NIC adapter slots; slots without a cabled interface are
    /// padded with blackhole interfaces. Defaults to the smallest count
    /// covering every declared interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic_slots: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceSpec>,
    #[serde(default, skip_serializing_if = "NodeHooks::is_empty")]
    pub hooks: NodeHooks,
}

impl NodeSpec {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::InvalidNode(
                "node name cannot be empty".to_string(),
            ));
        }
        if self.box_image.is_empty() {
            return Err(ValidationError::InvalidNode(format!(
                "node '{}' has an empty box reference",
                self.name
            )));
        }

        if let Some(slots) = self.nic_slots {
            if slots > 99 {
                return Err(ValidationError::InvalidNode(format!(
                    "node '{}' declares {} NIC slots, maximum is 99",
                    self.name, slots
                )));
            }
            if (slots as usize) < self.interfaces.len() {
                return Err(ValidationError::InvalidNode(format!(
                    "node '{}' declares {} NIC slots but {} interfaces",
                    self.name,
                    slots,
                    self.interfaces.len()
                )));
            }
        }

        for interface in &self.interfaces {
            interface.validate(&self.name)?;
        }

        for hook in self
            .hooks
            .before_provision
            .iter()
            .chain(self.hooks.after_teardown.iter())
        {
            if hook.run.is_empty() {
                return Err(ValidationError::InvalidHook(format!(
                    "node '{}' declares a hook with an empty command",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// CPU count after applying spec defaults
    pub fn effective_cpus(&self, defaults: &Option<ResourceDefaults>) -> u32 {
        self.cpus
            .or_else(|| defaults.as_ref().and_then(|d| d.cpus))
            .unwrap_or(DEFAULT_CPUS)
    }

    /// Memory size after applying spec defaults
    pub fn effective_memory_mb(&self, defaults: &Option<ResourceDefaults>) -> u64 {
        self.memory_mb
            .or_else(|| defaults.as_ref().and_then(|d| d.memory_mb))
            .unwrap_or(DEFAULT_MEMORY_MB)
    }

    /// NIC slot count: the declared value, or enough slots to cover every
    /// cabled interface (highest slot number, at least the interface count)
    pub fn effective_nic_slots(&self) -> u16 {
        let max_slot = self.interfaces.iter().map(|i| i.slot).max().unwrap_or(0);
        self.nic_slots
            .unwrap_or_else(|| max_slot.max(self.interfaces.len() as u16))
    }
}

/// A declared interface and the peer it is cabled to
#[derive(Debug, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub name: String,
    /// Adapter slot number, mapped to a UDP tunnel port at load time
    pub slot: u16,
    pub peer_node: String,
    pub peer_interface: String,
    /// Optional pinned MAC address; generated at planning time when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddress>,
}

impl InterfaceSpec {
    fn validate(&self, node: &str) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::InvalidInterface(format!(
                "node '{}' declares an interface with an empty name",
                node
            )));
        }
        if self.peer_node.is_empty() || self.peer_interface.is_empty() {
            return Err(ValidationError::InvalidInterface(format!(
                "interface '{}' on node '{}' has an empty peer reference",
                self.name, node
            )));
        }
        Ok(())
    }
}

/// Ordered lifecycle hook lists for a node
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct NodeHooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_provision: Vec<HookSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_teardown: Vec<HookSpec>,
}

impl NodeHooks {
    pub fn is_empty(&self) -> bool {
        self.before_provision.is_empty() && self.after_teardown.is_empty()
    }
}

/// A single hook: a shell command with an optional display name
#[derive(Debug, Serialize, Deserialize)]
pub struct HookSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub run: String,
}

impl HookSpec {
    /// Declared name, or an index-based one ("before-provision-1", ...)
    pub fn effective_name(&self, phase_prefix: &str, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", phase_prefix, index + 1))
    }
}

/// Spec validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid spec: {0}")]
    InvalidSpec(String),
    #[error("Invalid node configuration: {0}")]
    InvalidNode(String),
    #[error("Invalid interface configuration: {0}")]
    InvalidInterface(String),
    #[error("Invalid hook configuration: {0}")]
    InvalidHook(String),
}

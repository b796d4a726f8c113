//! MAC address generation module.
//!
//! This module owns the single randomness seam of the crate: interface MAC
//! addresses are drawn here and nowhere else, so a fixed seed reproduces a
//! whole provisioning plan bit for bit.

pub mod generator;

// Re-export commonly used types
pub use generator::{AddressError, AddressGenerator, MacAddress, OuiPrefix, DEFAULT_OUI};

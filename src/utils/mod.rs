//! Shared utilities: tunnel port mapping.

pub mod ports;

pub use ports::{explode_port, BLACKHOLE_SLOT, DATA_BASE_PORT, INTERNAL_BASE_PORT, RESERVED_BASE_PORT};

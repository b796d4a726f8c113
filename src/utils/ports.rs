//! UDP tunnel port mapping.
//!
//! Declared interface slots are small integers; the virtualization backend
//! expects real UDP ports. Each interface class owns a port range above a
//! fixed base, and a slot maps into that range by simple addition.

/// Base port for cabled data interfaces.
pub const DATA_BASE_PORT: u16 = 10000;

/// Base port for box-internal interfaces (e.g. dual-VM appliances).
pub const INTERNAL_BASE_PORT: u16 = 11000;

/// Base port for reserved interface slots.
pub const RESERVED_BASE_PORT: u16 = 12000;

/// Slot number reserved for blackhole interfaces.
pub const BLACKHOLE_SLOT: u16 = 666;

/// Map an interface slot to a UDP tunnel port above `base_port`.
///
/// Valid slots are `0..=99` plus the reserved blackhole slot `666`.
///
/// # Examples
/// ```
/// use topolab::utils::ports::{explode_port, DATA_BASE_PORT};
///
/// assert_eq!(explode_port(1, DATA_BASE_PORT), Ok(10001));
/// assert_eq!(explode_port(666, DATA_BASE_PORT), Ok(10666));
/// assert!(explode_port(100, DATA_BASE_PORT).is_err());
/// ```
pub fn explode_port(slot: u16, base_port: u16) -> Result<u16, String> {
    if slot == BLACKHOLE_SLOT {
        return Ok(base_port + BLACKHOLE_SLOT);
    }

    if slot >= 100 {
        return Err(format!(
            "slot must be an integer from 0 to 99 or {}, got {}",
            BLACKHOLE_SLOT, slot
        ));
    }

    Ok(base_port + slot)
}

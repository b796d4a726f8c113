//! MAC address types and the random address generator.
//!
//! Generated addresses combine a fixed organizationally-unique identifier
//! (OUI) with three randomly drawn NIC octets. The random source is owned
//! by [`AddressGenerator`] and can be seeded, so tests and reproducible
//! runs get identical address sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default OUI used when the spec does not configure one.
pub const DEFAULT_OUI: &str = "28:b7:ad";

/// Errors raised while parsing address components.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid OUI prefix '{0}': expected exactly 3 colon-separated hex octets")]
    InvalidPrefix(String),
    #[error("invalid MAC address '{0}': expected exactly 6 colon-separated hex octets")]
    InvalidMac(String),
}

/// Parse a single colon-separated hex octet (1 or 2 digits).
fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(part, 16).ok()
}

/// A 3-octet organizationally-unique identifier, the fixed first half of
/// every generated MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuiPrefix([u8; 3]);

impl OuiPrefix {
    /// The prefix octets.
    pub fn octets(&self) -> [u8; 3] {
        self.0
    }
}

impl FromStr for OuiPrefix {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(AddressError::InvalidPrefix(s.to_string()));
        }

        let mut octets = [0u8; 3];
        for (i, part) in parts.iter().enumerate() {
            octets[i] = parse_octet(part).ok_or_else(|| AddressError::InvalidPrefix(s.to_string()))?;
        }

        Ok(OuiPrefix(octets))
    }
}

impl fmt::Display for OuiPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}:{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// A 6-octet MAC address.
///
/// The display form is lowercase zero-padded hex joined by colons, which is
/// also the serialized representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The first three octets of the address.
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(AddressError::InvalidMac(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            octets[i] = parse_octet(part).ok_or_else(|| AddressError::InvalidMac(s.to_string()))?;
        }

        Ok(MacAddress(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Random MAC address generator with an injectable random source.
///
/// Every call to [`generate`](Self::generate) is an independent draw; the
/// generator keeps no record of previously issued addresses, so uniqueness
/// across calls is probabilistic only. Callers that need guaranteed
/// uniqueness must track issued addresses themselves.
#[derive(Debug)]
pub struct AddressGenerator {
    rng: StdRng,
}

impl AddressGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        AddressGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a fixed seed. Two generators constructed
    /// with the same seed produce identical address sequences.
    pub fn from_seed(seed: u64) -> Self {
        AddressGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a fresh MAC address under the given OUI prefix.
    ///
    /// The three NIC octets are drawn independently and uniformly from
    /// `0x00..=0xff`.
    pub fn generate(&mut self, prefix: &OuiPrefix) -> MacAddress {
        let oui = prefix.octets();
        MacAddress([
            oui[0],
            oui[1],
            oui[2],
            self.rng.gen::<u8>(),
            self.rng.gen::<u8>(),
            self.rng.gen::<u8>(),
        ])
    }
}

impl Default for AddressGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//! Network topology primitives.
//!
//! Devices, connect points, links and computed paths as seen by the intent
//! framework, plus the topology events the recovery engine reacts to.

mod events;

pub use events::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a forwarding device (e.g., "of:0000000000000001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Port number on a device.
pub type PortNumber = u32;

/// A (device, port) attachment point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectPoint {
    pub device: DeviceId,
    pub port: PortNumber,
}

impl ConnectPoint {
    pub fn new(device: impl Into<String>, port: PortNumber) -> Self {
        Self {
            device: DeviceId::new(device),
            port,
        }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

/// Operational state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    #[default]
    Active,
    Inactive,
}

/// A unidirectional infrastructure link.
///
/// Identity is the (src, dst) pair; two values differing only in `state`
/// compare equal, so a path computed while the link was active still matches
/// the link reported in a later INACTIVE update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    #[serde(default)]
    pub state: LinkState,
}

impl Link {
    pub fn new(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self {
            src,
            dst,
            state: LinkState::Active,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: LinkState) -> Self {
        self.state = state;
        self
    }

    /// Whether either end of the link sits on `device`.
    pub fn touches(&self, device: &DeviceId) -> bool {
        &self.src.device == device || &self.dst.device == device
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.dst == other.dst
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.src.hash(state);
        self.dst.hash(state);
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// An ordered sequence of links computed by the path engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkPath {
    pub links: Vec<Link>,
}

impl NetworkPath {
    pub fn new(links: Vec<Link>) -> Self {
        Self { links }
    }

    pub fn contains(&self, link: &Link) -> bool {
        self.links.iter().any(|l| l == link)
    }

    pub fn traverses(&self, device: &DeviceId) -> bool {
        self.links.iter().any(|l| l.touches(device))
    }
}

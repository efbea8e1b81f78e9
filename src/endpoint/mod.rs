//! Connection points and their concrete endpoints.
//!
//! A [`ConnectionPoint`] is the abstract name a service request refers to.
//! The [`EndpointRegistry`] resolves it to the physical attachments
//! ([`EndPoint`]) intents are built from.

mod error;
mod prefix;

pub use error::*;
pub use prefix::IpPrefix;

use crate::topology::{ConnectPoint, DeviceId, PortNumber};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named logical endpoint of a service request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionPoint(String);

impl ConnectionPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host identity used by legacy connectivity intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

impl HostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete attachment point resolved from a [`ConnectionPoint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EndPoint {
    /// Layer-3 attachment identified by a CIDR prefix
    Ip {
        prefix: IpPrefix,
        device: DeviceId,
        port: PortNumber,
    },
    /// Layer-2 attachment identified by MAC and optional VLAN
    Eth {
        mac: String,
        vlan: Option<u16>,
        device: DeviceId,
        port: PortNumber,
    },
    /// Optical channel on a lambda-switched port
    Lambda {
        device: DeviceId,
        port: PortNumber,
        channel: u32,
    },
    /// Raw fiber port
    Fiber { device: DeviceId, port: PortNumber },
}

impl EndPoint {
    pub fn ip(prefix: IpPrefix, device: impl Into<String>, port: PortNumber) -> Self {
        EndPoint::Ip {
            prefix,
            device: DeviceId::new(device),
            port,
        }
    }

    pub fn connect_point(&self) -> ConnectPoint {
        let (device, port) = match self {
            EndPoint::Ip { device, port, .. }
            | EndPoint::Eth { device, port, .. }
            | EndPoint::Lambda { device, port, .. }
            | EndPoint::Fiber { device, port } => (device, port),
        };
        ConnectPoint {
            device: device.clone(),
            port: *port,
        }
    }

    /// Host identity, for endpoints that carry an address.
    pub fn host_id(&self) -> Option<HostId> {
        match self {
            EndPoint::Ip { prefix, .. } => Some(HostId(prefix.to_string())),
            EndPoint::Eth { mac, vlan, .. } => Some(HostId(match vlan {
                Some(vlan) => format!("{mac}/{vlan}"),
                None => format!("{mac}/None"),
            })),
            EndPoint::Lambda { .. } | EndPoint::Fiber { .. } => None,
        }
    }

    pub fn ip_prefix(&self) -> Option<&IpPrefix> {
        match self {
            EndPoint::Ip { prefix, .. } => Some(prefix),
            _ => None,
        }
    }

    /// Whether a packet intent can select traffic for this endpoint.
    pub fn is_addressable(&self) -> bool {
        self.host_id().is_some()
    }
}

impl fmt::Display for EndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndPoint::Ip { prefix, .. } => write!(f, "ip:{prefix}@{}", self.connect_point()),
            EndPoint::Eth { mac, .. } => write!(f, "eth:{mac}@{}", self.connect_point()),
            EndPoint::Lambda { channel, .. } => {
                write!(f, "lambda:{channel}@{}", self.connect_point())
            }
            EndPoint::Fiber { .. } => write!(f, "fiber@{}", self.connect_point()),
        }
    }
}

/// Resolves connection point names to endpoints.
#[async_trait]
pub trait EndpointRegistry: Send + Sync + 'static {
    /// Resolve a connection point. Unknown names resolve to an empty list.
    async fn resolve(&self, point: &ConnectionPoint) -> Result<Vec<EndPoint>, EndpointError>;
}

/// Endpoint registry backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryEndpointRegistry {
    points: DashMap<ConnectionPoint, Vec<EndPoint>>,
}

impl InMemoryEndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the endpoints behind a connection point.
    pub fn register(&self, point: ConnectionPoint, endpoints: Vec<EndPoint>) {
        tracing::debug!(
            connection_point = %point,
            endpoints = endpoints.len(),
            "Registered connection point"
        );
        self.points.insert(point, endpoints);
    }

    pub fn unregister(&self, point: &ConnectionPoint) -> Option<Vec<EndPoint>> {
        self.points.remove(point).map(|(_, endpoints)| endpoints)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
impl EndpointRegistry for InMemoryEndpointRegistry {
    async fn resolve(&self, point: &ConnectionPoint) -> Result<Vec<EndPoint>, EndpointError> {
        Ok(self
            .points
            .get(point)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

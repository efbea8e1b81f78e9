//! Topology event types

use super::{DeviceId, Link, LinkState};

/// Events emitted by the topology service for links and devices.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    /// A new link was detected
    LinkAdded { link: Link },
    /// A link disappeared from the topology
    LinkRemoved { link: Link },
    /// A link changed; `link.state` carries the new state
    LinkUpdated { link: Link },
    /// A device joined the topology
    DeviceAdded { device: DeviceId },
    /// A device was removed from the topology
    DeviceRemoved { device: DeviceId },
    /// A device became reachable or unreachable
    DeviceAvailabilityChanged { device: DeviceId, available: bool },
}

/// A resource whose loss invalidates computed paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailedResource {
    Link(Link),
    Device(DeviceId),
}

impl FailedResource {
    /// Whether a path crossing `link` is broken by this failure.
    pub fn breaks(&self, link: &Link) -> bool {
        match self {
            FailedResource::Link(failed) => failed == link,
            FailedResource::Device(device) => link.touches(device),
        }
    }
}

impl TopologyEvent {
    /// The failed resource this event reports, if any.
    ///
    /// Additions and restorations yield `None`.
    pub fn failure(&self) -> Option<FailedResource> {
        match self {
            TopologyEvent::LinkRemoved { link } => Some(FailedResource::Link(link.clone())),
            TopologyEvent::LinkUpdated { link } if link.state == LinkState::Inactive => {
                Some(FailedResource::Link(link.clone()))
            }
            TopologyEvent::DeviceRemoved { device } => Some(FailedResource::Device(device.clone())),
            TopologyEvent::DeviceAvailabilityChanged {
                device,
                available: false,
            } => Some(FailedResource::Device(device.clone())),
            TopologyEvent::LinkAdded { .. }
            | TopologyEvent::LinkUpdated { .. }
            | TopologyEvent::DeviceAdded { .. }
            | TopologyEvent::DeviceAvailabilityChanged { .. } => None,
        }
    }
}

//! Service identifiers, low-level intents and their lifecycle.
//!
//! A service decomposes into one or more [`LowLevelIntent`]s, each
//! identified by an [`IntentKey`] derived from the service id. Intents come
//! in two shapes selected by [`IntentModel`]: legacy host-to-host
//! connectivity and path-aware (ACI-PP) intents that carry a computed path.

mod error;
mod service;

pub use error::*;
pub use service::*;

use crate::abstraction::AbstractionLink;
use crate::constraint::Constraint;
use crate::endpoint::{HostId, IpPrefix};
use crate::topology::{ConnectPoint, Link, NetworkPath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a top-level service request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidServiceId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidServiceId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceId {
    type Error = InvalidServiceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ServiceId::new(value)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

impl FromStr for ServiceId {
    type Err = InvalidServiceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceId::new(s)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application owning submitted intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId {
    pub id: u16,
    pub name: String,
}

impl ApplicationId {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Key of a low-level intent: owning application plus a discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentKey {
    pub app: ApplicationId,
    pub name: String,
}

impl IntentKey {
    pub fn new(app: ApplicationId, name: impl Into<String>) -> Self {
        Self {
            app,
            name: name.into(),
        }
    }

    /// Key of the `n`-th intent derived from `service`: `"<service>-<n>"`.
    pub fn for_service(app: &ApplicationId, service: &ServiceId, n: usize) -> Self {
        Self::new(app.clone(), format!("{service}-{n}"))
    }
}

impl fmt::Display for IntentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lifecycle status of a low-level intent as reported by the intent framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    InstallReq,
    Installed,
    Failed,
    WithdrawReq,
    Withdrawn,
    Corrupt,
    Purged,
    NegotiationReq,
    InstallationAnchored,
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentStatus::InstallReq => "INSTALL_REQ",
            IntentStatus::Installed => "INSTALLED",
            IntentStatus::Failed => "FAILED",
            IntentStatus::WithdrawReq => "WITHDRAW_REQ",
            IntentStatus::Withdrawn => "WITHDRAWN",
            IntentStatus::Corrupt => "CORRUPT",
            IntentStatus::Purged => "PURGED",
            IntentStatus::NegotiationReq => "NEGOTIATION_REQ",
            IntentStatus::InstallationAnchored => "INSTALLATION_ANCHORED",
        };
        f.write_str(s)
    }
}

/// Which low-level intent representation decomposition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentModel {
    /// Host-to-host connectivity intents
    #[default]
    Legacy,
    /// Path-aware intents carrying a computed path
    AciPp,
}

impl FromStr for IntentModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "legacy" => Ok(IntentModel::Legacy),
            "aci_pp" | "acipp" => Ok(IntentModel::AciPp),
            _ => Err(format!("Invalid intent model: {}", s)),
        }
    }
}

/// Packet header match for an intent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrafficSelector {
    pub ip_src: Option<IpPrefix>,
    pub ip_dst: Option<IpPrefix>,
}

/// Payload of a path-aware intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIntent {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    pub path: Option<NetworkPath>,
    pub backup_path: Option<NetworkPath>,
    /// Whether `path` holds a computation the framework considers current
    pub calculated: bool,
}

impl PathIntent {
    /// Whether the primary or backup path crosses a link matching `pred`.
    pub fn uses(&self, pred: impl Fn(&Link) -> bool) -> bool {
        [&self.path, &self.backup_path]
            .into_iter()
            .flatten()
            .any(|p| p.links.iter().any(&pred))
    }
}

/// Representation-specific part of a low-level intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum IntentPayload {
    /// Legacy host-to-host connectivity
    Connectivity { one: HostId, two: HostId },
    /// Path-aware intent
    PathAware(PathIntent),
}

/// A concrete intent submitted to the intent framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowLevelIntent {
    pub key: IntentKey,
    pub selector: TrafficSelector,
    pub constraints: Vec<Constraint>,
    pub priority: u16,
    pub payload: IntentPayload,
}

impl LowLevelIntent {
    /// Build an intent for `link` in the requested representation.
    ///
    /// Returns `None` when an endpoint of the link carries no address the
    /// intent could select on.
    pub fn from_link(
        key: IntentKey,
        link: &AbstractionLink,
        model: IntentModel,
        constraints: Vec<Constraint>,
        priority: u16,
    ) -> Option<Self> {
        let payload = match model {
            IntentModel::Legacy => IntentPayload::Connectivity {
                one: link.src.host_id()?,
                two: link.dst.host_id()?,
            },
            IntentModel::AciPp => {
                if !link.src.is_addressable() || !link.dst.is_addressable() {
                    return None;
                }
                IntentPayload::PathAware(PathIntent {
                    src: link.src.connect_point(),
                    dst: link.dst.connect_point(),
                    path: None,
                    backup_path: None,
                    calculated: false,
                })
            }
        };
        Some(Self {
            key,
            selector: TrafficSelector {
                ip_src: link.src.ip_prefix().copied(),
                ip_dst: link.dst.ip_prefix().copied(),
            },
            constraints,
            priority,
            payload,
        })
    }

    /// Rebuild this intent, same key and representation, over another link.
    pub fn rebuild_over(&self, link: &AbstractionLink) -> Option<Self> {
        Self::from_link(
            self.key.clone(),
            link,
            self.model(),
            self.constraints.clone(),
            self.priority,
        )
    }

    pub fn model(&self) -> IntentModel {
        match self.payload {
            IntentPayload::Connectivity { .. } => IntentModel::Legacy,
            IntentPayload::PathAware(_) => IntentModel::AciPp,
        }
    }

    pub fn as_path_aware(&self) -> Option<&PathIntent> {
        match &self.payload {
            IntentPayload::PathAware(p) => Some(p),
            IntentPayload::Connectivity { .. } => None,
        }
    }

    /// Calculated flag reported to the service state machine.
    ///
    /// Legacy intents have no path computation step and count as calculated.
    pub fn is_calculated(&self) -> bool {
        self.as_path_aware().is_none_or(|p| p.calculated)
    }

    /// Copy with computed paths cleared so the framework recomputes them.
    #[must_use]
    pub fn for_recomputation(&self) -> Self {
        let mut intent = self.clone();
        if let IntentPayload::PathAware(p) = &mut intent.payload {
            p.path = None;
            p.backup_path = None;
            p.calculated = false;
        }
        intent
    }
}

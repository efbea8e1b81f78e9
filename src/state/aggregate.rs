use crate::intent::IntentStatus;
use crate::store::ServiceRecord;
use serde::{Deserialize, Serialize};

/// Service-level lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFsmEvent {
    InstallationSuccess,
    InstallationFailed,
    WithdrawalSuccess,
    SubmitForInstallation,
    SubmitForWithdrawal,
    Negotiation,
    NoChange,
}

#[derive(Debug, Default, Clone, Copy)]
struct Seen {
    removed: bool,
    withdraw_req: bool,
    failed: bool,
    install_req: bool,
    negotiation: bool,
    installed: bool,
}

impl Seen {
    fn of(record: &ServiceRecord) -> Self {
        let mut seen = Seen::default();
        for entry in record {
            match entry.status() {
                IntentStatus::Withdrawn | IntentStatus::Purged => seen.removed = true,
                IntentStatus::WithdrawReq => seen.withdraw_req = true,
                IntentStatus::Failed | IntentStatus::Corrupt => seen.failed = true,
                IntentStatus::InstallReq | IntentStatus::InstallationAnchored => {
                    seen.install_req = true
                }
                IntentStatus::NegotiationReq => seen.negotiation = true,
                IntentStatus::Installed => seen.installed = true,
            }
        }
        seen
    }

    fn only_removed(&self) -> bool {
        self.removed
            && !(self.withdraw_req
                || self.failed
                || self.install_req
                || self.negotiation
                || self.installed)
    }
}

/// Reduce a service record to one event.
///
/// Rules are checked in priority order:
///
/// 1. every entry withdrawn or purged: `WithdrawalSuccess`
/// 2. any withdrawal requested: `SubmitForWithdrawal`
/// 3. any failed or corrupt: `Negotiation` while some sibling still
///    negotiates, otherwise `InstallationFailed`
/// 4. any install requested or anchored: `SubmitForInstallation`
/// 5. any negotiating: `Negotiation`
/// 6. any installed, with `is_calculated`: `InstallationSuccess`
/// 7. otherwise `NoChange`
///
/// Withdrawn siblings never block success, so an installed intent next to a
/// withdrawn one reports `InstallationSuccess`.
pub fn aggregate(record: &ServiceRecord, is_calculated: bool) -> ServiceFsmEvent {
    let seen = Seen::of(record);

    if seen.only_removed() {
        ServiceFsmEvent::WithdrawalSuccess
    } else if seen.withdraw_req {
        ServiceFsmEvent::SubmitForWithdrawal
    } else if seen.failed {
        if seen.negotiation {
            ServiceFsmEvent::Negotiation
        } else {
            ServiceFsmEvent::InstallationFailed
        }
    } else if seen.install_req {
        ServiceFsmEvent::SubmitForInstallation
    } else if seen.negotiation {
        ServiceFsmEvent::Negotiation
    } else if seen.installed && is_calculated {
        ServiceFsmEvent::InstallationSuccess
    } else {
        ServiceFsmEvent::NoChange
    }
}

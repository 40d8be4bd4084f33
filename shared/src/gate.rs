use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::camera::PermissionStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    #[default]
    Unknown,
    Denied,
    Granted,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => PermissionState::Granted,
            PermissionStatus::NotDetermined => PermissionState::Unknown,
            PermissionStatus::Denied
            | PermissionStatus::DeniedPermanently
            | PermissionStatus::Restricted => PermissionState::Denied,
        }
    }
}

/// Camera permission as seen by one screen.
///
/// The only automatic request is the one issued on mount while the state is
/// still unknown; everything after that is user-initiated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGate {
    state: PermissionState,
    request_in_flight: bool,
    mount_request_issued: bool,
}

impl CapabilityGate {
    pub fn current(&self) -> PermissionState {
        self.state
    }

    pub fn is_requesting(&self) -> bool {
        self.request_in_flight
    }

    pub fn capture_allowed(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Returns true when the caller should ask the OS for permission now.
    pub fn on_mount(&mut self) -> bool {
        if self.mount_request_issued || self.state != PermissionState::Unknown {
            return false;
        }
        self.mount_request_issued = true;
        self.begin_request()
    }

    /// Marks a request as started. Returns false if one is already pending.
    pub fn begin_request(&mut self) -> bool {
        if self.request_in_flight {
            debug!("permission request already pending");
            return false;
        }
        self.request_in_flight = true;
        true
    }

    pub fn resolve(&mut self, status: PermissionStatus) -> PermissionState {
        self.request_in_flight = false;
        self.state = status.into();
        self.state
    }

    /// A request that errored out counts as a refusal.
    pub fn resolve_failed(&mut self) -> PermissionState {
        self.request_in_flight = false;
        self.state = PermissionState::Denied;
        self.state
    }
}

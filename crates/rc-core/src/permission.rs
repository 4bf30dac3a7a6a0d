//! Permission broker
//!
//! Wraps the browser permission service with the extension's failure rules:
//! a failed request counts as a denial, a failed revoke is ignored, and only
//! the query reports errors so callers can tell "absent" from "unknown".

use crate::error::HostError;
use crate::host::PermissionService;
use crate::origin::Origin;

pub struct PermissionBroker<'a, P> {
    service: &'a P,
}

impl<'a, P: PermissionService> PermissionBroker<'a, P> {
    pub fn new(service: &'a P) -> Self {
        Self { service }
    }

    /// Ask for the origin's host permission. Already-granted origins resolve
    /// without a prompt.
    pub async fn request_permission(&self, origin: &Origin) -> bool {
        match self.service.request(&origin.match_pattern()).await {
            Ok(granted) => {
                log::debug!("permission request for {}: granted={}", origin, granted);
                granted
            }
            Err(e) => {
                log::warn!("permission request for {} failed: {}", origin, e);
                false
            }
        }
    }

    /// Best-effort revoke.
    pub async fn revoke_permission(&self, origin: &Origin) {
        match self.service.remove(&origin.match_pattern()).await {
            Ok(true) => log::debug!("revoked permission for {}", origin),
            Ok(false) => log::debug!("no permission to revoke for {}", origin),
            Err(e) => log::warn!("revoking permission for {} failed: {}", origin, e),
        }
    }

    pub async fn revoke_all(&self, origins: &[Origin]) {
        for origin in origins {
            self.revoke_permission(origin).await;
        }
    }

    pub async fn has_permission(&self, origin: &Origin) -> Result<bool, HostError> {
        self.service.contains(&origin.match_pattern()).await
    }
}

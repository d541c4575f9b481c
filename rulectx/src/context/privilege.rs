//! Single-slot privilege marker.
//!
//! A privilege lets trusted collaborator code (hooks run while a caller
//! already holds context state) re-enter state accessors for a named
//! region. There is exactly one slot: granting a new region replaces the
//! old one, with no nesting or counting.
//!
//! Region checks by name are convention only. A [`PrivilegeGrant`] carries
//! a process-unique serial, so code that kept the grant can verify it is
//! still the active one. Neither form is a security boundary.

use crate::errors::PrivilegeError;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Proof of a privilege grant, returned by `Context::grant_privilege`.
///
/// Grants cannot be cloned or constructed outside this crate.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a grant does not revoke it"]
pub struct PrivilegeGrant {
    region: String,
    serial: u64,
}

impl PrivilegeGrant {
    /// The region this grant covers.
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveGrant {
    region: String,
    serial: u64,
}

/// The privilege state of one context. Guarded by the context's lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct PrivilegeSlot {
    active: Option<ActiveGrant>,
}

impl PrivilegeSlot {
    /// Activates `region`, replacing any active grant.
    ///
    /// The empty region clears the slot; its grant is never active.
    pub(crate) fn grant(&mut self, region: &str) -> PrivilegeGrant {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        self.active = (!region.is_empty()).then(|| ActiveGrant {
            region: region.to_string(),
            serial,
        });
        PrivilegeGrant {
            region: region.to_string(),
            serial,
        }
    }

    pub(crate) fn revoke(&mut self) {
        self.active = None;
    }

    /// Revokes only if `grant` is the active grant.
    pub(crate) fn revoke_grant(&mut self, grant: &PrivilegeGrant) -> Result<(), PrivilegeError> {
        if self.holds(grant) {
            self.active = None;
            Ok(())
        } else {
            Err(PrivilegeError::Stale {
                region: grant.region.clone(),
            })
        }
    }

    pub(crate) fn is_privileged(&self, region: &str) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.region == region)
    }

    pub(crate) fn holds(&self, grant: &PrivilegeGrant) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.serial == grant.serial && active.region == grant.region)
    }

    pub(crate) fn region(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.region.as_str())
    }
}

//! Core type definitions for Reclaim
//!
//! These types cross the boundary between the controller, the browser host
//! and the popup/options surfaces.

use serde::Serialize;
use ts_rs::TS;

use crate::origin::Origin;

/// Browser tab identifier.
pub type TabId = i32;

/// Snapshot of a tab as reported by the tab service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    /// `None` when the browser withholds the URL (no host access) or the tab
    /// has not committed a navigation yet.
    pub url: Option<String>,
}

impl Tab {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self { id, url: Some(url.into()) }
    }
}

// =============================================================================
// Status and actions
// =============================================================================

/// Derived state of the active tab, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct TabStatus {
    pub origin: Option<Origin>,
    pub enabled: bool,
    /// `false` for pages the extension can never act on; the UI hides the toggle.
    pub supported: bool,
}

impl TabStatus {
    pub fn unsupported() -> Self {
        Self { origin: None, enabled: false, supported: false }
    }
}

/// Explicit intent for the active tab's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Enable,
    Disable,
}

impl Action {
    /// The transition that moves away from `enabled`.
    #[inline]
    pub fn opposite_of(enabled: bool) -> Self {
        if enabled { Self::Disable } else { Self::Enable }
    }
}

/// Result of an enable/disable/toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct ActionOutcome {
    pub success: bool,
    /// Allow-list membership after the action.
    pub enabled: bool,
}

impl ActionOutcome {
    /// Nothing changed and the origin is not enabled.
    pub const REJECTED: Self = Self { success: false, enabled: false };
}

/// Toolbar badge indicator for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeState {
    On,
    Off,
}

impl From<bool> for BadgeState {
    fn from(enabled: bool) -> Self {
        if enabled { Self::On } else { Self::Off }
    }
}

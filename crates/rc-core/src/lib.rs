//! Reclaim Core Library
//!
//! This crate holds everything the Reclaim extension decides without touching
//! a browser API: which origins are allowed, how enabling and disabling an
//! origin is sequenced, how navigation events reconcile stored state with the
//! browser's permission grants, and what the page payload installs.
//!
//! # Architecture
//!
//! Browser services (storage, permissions, tabs, scripting, badge) are traits
//! in [`host`]. The [`controller::ActivationController`] drives them; the
//! `rc-wasm` crate implements them over the `chrome.*` APIs, tests implement
//! them in memory.
//!
//! # Modules
//!
//! - `origin`: URL to canonical origin resolution
//! - `store`: allow-list persistence over a key-value service
//! - `permission`: per-origin permission grants
//! - `controller`: enable / disable / toggle state machine
//! - `lifecycle`: navigation and tab-activation observers
//! - `injection`: best-effort payload delivery
//! - `protocol`: popup/options message protocol
//! - `config`: user settings
//! - `payload`: DOM-independent parts of the page override engine
//! - `types`: shared type definitions

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod injection;
pub mod lifecycle;
pub mod origin;
pub mod payload;
pub mod permission;
pub mod protocol;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{BadgeConfig, ExtensionConfig, PayloadConfig};
pub use controller::ActivationController;
pub use error::{ActivationError, HostError};
pub use host::Host;
pub use origin::{resolve_origin, resolve_tab_origin, Origin};
pub use protocol::{dispatch, Request, Response};
pub use types::{Action, ActionOutcome, BadgeState, Tab, TabId, TabStatus};

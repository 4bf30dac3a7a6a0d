//! Browser service boundary
//!
//! Each trait is one external collaborator. Methods are async because every
//! browser call is a suspension point; other event callbacks may run while a
//! call is in flight, so callers re-read state after awaiting rather than
//! trusting earlier reads. Futures are not `Send`: the extension runs on a
//! single-threaded event loop.

#![allow(async_fn_in_trait)]

use serde_json::Value;

use crate::config::{BadgeConfig, PayloadConfig};
use crate::error::HostError;
use crate::types::{BadgeState, Tab, TabId};

/// Durable key-value storage.
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), HostError>;
}

/// Per-origin host permissions, keyed by match pattern (`https://a.example/*`).
pub trait PermissionService {
    /// Must be reached from a user gesture; the platform denies it otherwise.
    async fn request(&self, pattern: &str) -> Result<bool, HostError>;
    async fn remove(&self, pattern: &str) -> Result<bool, HostError>;
    async fn contains(&self, pattern: &str) -> Result<bool, HostError>;
}

pub trait TabService {
    /// Active tab of the last focused window.
    async fn active_tab(&self) -> Result<Option<Tab>, HostError>;
    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError>;
    async fn reload(&self, tab_id: TabId) -> Result<(), HostError>;
}

/// Runs the override payload in a tab's main world (shared page globals).
pub trait ScriptInjector {
    async fn inject_main_world(
        &self,
        tab_id: TabId,
        script: &str,
        config: &PayloadConfig,
    ) -> Result<(), HostError>;
}

pub trait BadgeService {
    async fn set_badge(
        &self,
        tab_id: TabId,
        state: BadgeState,
        config: &BadgeConfig,
    ) -> Result<(), HostError>;
}

/// Everything the controller needs from the browser.
pub trait Host: KeyValueStore + PermissionService + TabService + ScriptInjector + BadgeService {}

impl<T> Host for T where T: KeyValueStore + PermissionService + TabService + ScriptInjector + BadgeService {}

//! Activation controller
//!
//! Per-origin state is never stored as an enum. It is derived from two
//! sources: allow-list membership and the browser's permission grant.
//!
//! | allow-list | grant   | state        |
//! |------------|---------|--------------|
//! | absent     | any     | Disabled     |
//! | present    | present | Enabled      |
//! | present    | absent  | Inconsistent |
//!
//! `Inconsistent` heals to `Disabled` at the next navigation observation
//! (see [`crate::lifecycle`]).
//!
//! Every operation re-reads the active tab and the allow-list right before
//! acting; the popup's view may be stale by the time a click arrives.

use std::cell::OnceCell;

use futures_util::join;

use crate::config::ExtensionConfig;
use crate::error::{ActivationError, HostError};
use crate::host::Host;
use crate::injection::InjectionService;
use crate::origin::{resolve_origin, resolve_tab_origin, Origin};
use crate::permission::PermissionBroker;
use crate::store::OriginStore;
use crate::types::{Action, ActionOutcome, BadgeState, Tab, TabId, TabStatus};

pub struct ActivationController<H> {
    host: H,
    config: OnceCell<ExtensionConfig>,
}

impl<H: Host> ActivationController<H> {
    pub fn new(host: H, config: ExtensionConfig) -> Self {
        Self { host, config: OnceCell::from(config) }
    }

    /// Build a controller whose settings are read from the host's storage on
    /// first use. Nothing is read here, so an enable reaches the permission
    /// request right after the tab query.
    pub fn from_storage(host: H) -> Self {
        Self { host, config: OnceCell::new() }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn config(&self) -> &ExtensionConfig {
        if let Some(config) = self.config.get() {
            return config;
        }
        let loaded = ExtensionConfig::load(&self.host).await;
        self.config.get_or_init(|| loaded)
    }

    pub(crate) fn store(&self) -> OriginStore<'_, H> {
        OriginStore::new(&self.host)
    }

    pub(crate) fn broker(&self) -> PermissionBroker<'_, H> {
        PermissionBroker::new(&self.host)
    }

    pub(crate) async fn injection(&self) -> InjectionService<'_, H> {
        InjectionService::new(&self.host, self.config().await)
    }

    /// Best-effort badge update.
    pub(crate) async fn update_badge(&self, tab_id: TabId, state: BadgeState) {
        let badge = &self.config().await.badge;
        if let Err(e) = self.host.set_badge(tab_id, state, badge).await {
            log::warn!("badge update for tab {} failed: {}", tab_id, e);
        }
    }

    /// Fresh read of the active tab and its origin.
    async fn active_origin(&self) -> Result<Option<(Tab, Origin)>, HostError> {
        let Some(tab) = self.host.active_tab().await? else {
            return Ok(None);
        };
        let origin = resolve_tab_origin(tab.url.as_deref());
        Ok(origin.map(|origin| (tab, origin)))
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub async fn get_status(&self) -> Result<TabStatus, ActivationError> {
        let Some((_, origin)) = self.active_origin().await? else {
            return Ok(TabStatus::unsupported());
        };
        let enabled = self.store().contains(&origin).await?;
        Ok(TabStatus { origin: Some(origin), enabled, supported: true })
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Apply an explicit intent to the active tab's origin.
    ///
    /// On enable the permission request is issued in the same turn as the
    /// first browser call after the tab lookup, so it stays inside the
    /// user-gesture window.
    pub async fn set_action(&self, action: Action) -> Result<ActionOutcome, ActivationError> {
        let Some((tab, origin)) = self.active_origin().await? else {
            log::debug!("{:?} ignored: active tab is not a supported page", action);
            return Ok(ActionOutcome::REJECTED);
        };
        self.apply(&tab, &origin, action).await
    }

    /// Flip the active tab's origin, computed from current membership.
    pub async fn toggle(&self) -> Result<ActionOutcome, ActivationError> {
        let Some((tab, origin)) = self.active_origin().await? else {
            log::debug!("toggle ignored: active tab is not a supported page");
            return Ok(ActionOutcome::REJECTED);
        };
        let enabled = self.store().contains(&origin).await?;
        self.apply(&tab, &origin, Action::opposite_of(enabled)).await
    }

    async fn apply(
        &self,
        tab: &Tab,
        origin: &Origin,
        action: Action,
    ) -> Result<ActionOutcome, ActivationError> {
        match action {
            Action::Enable => self.enable(tab, origin).await,
            Action::Disable => self.disable(tab, origin).await,
        }
    }

    async fn enable(&self, tab: &Tab, origin: &Origin) -> Result<ActionOutcome, ActivationError> {
        let broker = self.broker();
        // Both calls start in one poll; the query sees the pre-request grant.
        let (had_grant, granted) =
            join!(broker.has_permission(origin), broker.request_permission(origin));
        if !granted {
            log::info!("permission for {} denied", origin);
            return Ok(ActionOutcome::REJECTED);
        }

        if let Err(e) = self.store().add(origin).await {
            match had_grant {
                Ok(true) => log::debug!("keeping pre-existing grant for {}", origin),
                _ => broker.revoke_permission(origin).await,
            }
            return Err(e);
        }
        log::info!("enabled {}", origin);

        self.injection().await.inject(tab.id).await;
        self.update_badge(tab.id, BadgeState::On).await;
        Ok(ActionOutcome { success: true, enabled: true })
    }

    async fn disable(&self, tab: &Tab, origin: &Origin) -> Result<ActionOutcome, ActivationError> {
        let listed = self.store().contains(origin).await?;
        if listed {
            self.store().remove(origin).await?;
            log::info!("disabled {}", origin);
        }
        self.broker().revoke_permission(origin).await;

        // Patched prototypes only go away with a fresh page context. A page
        // that was never enabled has nothing to undo.
        if listed {
            if let Err(e) = self.host.reload(tab.id).await {
                log::warn!("reloading tab {} failed: {}", tab.id, e);
            }
        }
        self.update_badge(tab.id, BadgeState::Off).await;
        Ok(ActionOutcome { success: true, enabled: false })
    }

    // =========================================================================
    // Allow-list management
    // =========================================================================

    pub async fn enabled_origins(&self) -> Result<Vec<Origin>, ActivationError> {
        Ok(self.store().load().await?)
    }

    /// Remove one origin by its string form and revoke its permission.
    ///
    /// Returns whether the input named a supported origin, plus the
    /// resulting allow-list.
    pub async fn remove_origin(&self, raw: &str) -> Result<(bool, Vec<Origin>), ActivationError> {
        let Some(origin) = resolve_origin(raw) else {
            log::warn!("removeOrigin: '{}' is not a supported origin", raw);
            return Ok((false, self.store().load().await?));
        };
        let origins = self.store().remove(&origin).await?;
        self.broker().revoke_permission(&origin).await;
        log::info!("removed {}", origin);
        Ok((true, origins))
    }

    pub async fn remove_all_origins(&self) -> Result<(), ActivationError> {
        let removed = self.store().clear().await?;
        self.broker().revoke_all(&removed).await;
        log::info!("removed all {} origins", removed.len());
        Ok(())
    }
}

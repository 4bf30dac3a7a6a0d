//! Tab lifecycle observers
//!
//! Navigation and tab switches never change permissions on their own; they
//! re-apply the payload and refresh the badge. Navigation is also where an
//! allow-listed origin whose grant was revoked outside the extension gets
//! dropped from the allow-list.

use crate::controller::ActivationController;
use crate::host::{Host, TabService};
use crate::origin::resolve_tab_origin;
use crate::types::{BadgeState, Tab, TabId};

impl<H: Host> ActivationController<H> {
    /// A tab finished loading. Returns whether the payload was injected.
    pub async fn on_navigation_complete(&self, tab: &Tab) -> bool {
        let Some(origin) = resolve_tab_origin(tab.url.as_deref()) else {
            self.update_badge(tab.id, BadgeState::Off).await;
            return false;
        };

        let listed = match self.store().contains(&origin).await {
            Ok(listed) => listed,
            Err(e) => {
                log::warn!("reading allow-list on navigation to {} failed: {}", origin, e);
                return false;
            }
        };
        if !listed {
            self.update_badge(tab.id, BadgeState::Off).await;
            return false;
        }

        match self.broker().has_permission(&origin).await {
            Ok(true) => {
                let injected = self.injection().await.inject(tab.id).await;
                self.update_badge(tab.id, BadgeState::On).await;
                injected
            }
            Ok(false) => {
                log::info!("permission for {} was revoked externally, disabling", origin);
                if let Err(e) = self.store().remove(&origin).await {
                    log::warn!("dropping {} from allow-list failed: {}", origin, e);
                }
                self.update_badge(tab.id, BadgeState::Off).await;
                false
            }
            Err(e) => {
                // Unknown grant state: leave the allow-list alone and retry next time.
                log::warn!("permission query for {} failed: {}", origin, e);
                false
            }
        }
    }

    /// The user switched to `tab_id`; refresh its badge.
    pub async fn on_tab_activated(&self, tab_id: TabId) {
        let tab = match TabService::get(self.host(), tab_id).await {
            Ok(Some(tab)) => tab,
            Ok(None) => return,
            Err(e) => {
                log::warn!("looking up activated tab {} failed: {}", tab_id, e);
                return;
            }
        };

        let enabled = match resolve_tab_origin(tab.url.as_deref()) {
            Some(origin) => self.store().contains(&origin).await.unwrap_or_else(|e| {
                log::warn!("reading allow-list for {} failed: {}", origin, e);
                false
            }),
            None => false,
        };
        self.update_badge(tab.id, BadgeState::from(enabled)).await;
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ExtensionConfig;
    use crate::controller::ActivationController;
    use crate::store::ALLOWED_ORIGINS_KEY;
    use crate::testing::{origin, FakeHost};
    use crate::types::{BadgeState, Tab};
    use serde_json::json;

    fn controller(host: FakeHost) -> ActivationController<FakeHost> {
        ActivationController::new(host, ExtensionConfig::default())
    }

    #[tokio::test]
    async fn test_navigation_to_enabled_origin_injects() {
        let host = FakeHost::with_active_tab(4, "https://a.example/next");
        host.put(ALLOWED_ORIGINS_KEY, json!(["https://a.example"]));
        host.grant("https://a.example/*");
        let ctl = controller(host);

        assert!(ctl.on_navigation_complete(&Tab::new(4, "https://a.example/next")).await);
        assert_eq!(ctl.host().injected(), vec![4]);
        assert_eq!(ctl.host().badge(4), Some(BadgeState::On));
    }

    #[tokio::test]
    async fn test_navigation_reconciles_revoked_permission() {
        let host = FakeHost::with_active_tab(4, "https://a.example/");
        host.put(ALLOWED_ORIGINS_KEY, json!(["https://a.example", "https://b.example"]));
        host.grant("https://b.example/*");
        let ctl = controller(host);

        assert!(!ctl.on_navigation_complete(&Tab::new(4, "https://a.example/")).await);
        assert_eq!(ctl.enabled_origins().await.unwrap(), vec![origin("https://b.example")]);
        assert_eq!(ctl.host().badge(4), Some(BadgeState::Off));
        assert!(ctl.host().injected().is_empty());
    }

    #[tokio::test]
    async fn test_external_revoke_after_enable_heals_on_navigation() {
        let ctl = controller(FakeHost::with_active_tab(4, "https://a.example/"));
        ctl.set_action(crate::types::Action::Enable).await.unwrap();

        ctl.host().revoke_externally("https://a.example/*");
        assert!(ctl.get_status().await.unwrap().enabled);

        ctl.on_navigation_complete(&Tab::new(4, "https://a.example/reload")).await;
        assert!(!ctl.get_status().await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_failed_permission_query_keeps_allow_list() {
        let host = FakeHost::with_active_tab(4, "https://a.example/");
        host.put(ALLOWED_ORIGINS_KEY, json!(["https://a.example"]));
        host.fail_permission_queries(true);
        let ctl = controller(host);

        assert!(!ctl.on_navigation_complete(&Tab::new(4, "https://a.example/")).await);
        assert_eq!(ctl.enabled_origins().await.unwrap(), vec![origin("https://a.example")]);
    }

    #[tokio::test]
    async fn test_navigation_to_other_pages_turns_badge_off() {
        let ctl = controller(FakeHost::with_active_tab(4, "https://c.example/"));
        assert!(!ctl.on_navigation_complete(&Tab::new(4, "https://c.example/")).await);
        assert_eq!(ctl.host().badge(4), Some(BadgeState::Off));

        assert!(!ctl.on_navigation_complete(&Tab { id: 5, url: None }).await);
        assert_eq!(ctl.host().badge(5), Some(BadgeState::Off));
        assert!(!ctl.host().calls().contains(&"permissions.contains"));
    }

    #[tokio::test]
    async fn test_tab_activation_updates_badge_only() {
        let host = FakeHost::new();
        host.put(ALLOWED_ORIGINS_KEY, json!(["https://a.example"]));
        host.grant("https://a.example/*");
        host.open_tab(1, "https://a.example/");
        host.open_tab(2, "https://b.example/");
        let ctl = controller(host);

        ctl.on_tab_activated(1).await;
        ctl.on_tab_activated(2).await;
        ctl.on_tab_activated(99).await;

        assert_eq!(ctl.host().badge(1), Some(BadgeState::On));
        assert_eq!(ctl.host().badge(2), Some(BadgeState::Off));
        assert_eq!(ctl.host().badge(99), None);
        assert!(ctl.host().injected().is_empty());
    }
}

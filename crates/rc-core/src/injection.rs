//! Payload delivery
//!
//! Injection is best-effort: closed tabs, privileged pages and navigations
//! racing the call all fail, and none of them should fail the caller. The
//! stored allow-list stays the source of truth; the next completed navigation
//! injects again. Double delivery into one page is harmless because the
//! payload checks its own marker.

use crate::config::ExtensionConfig;
use crate::host::ScriptInjector;
use crate::types::TabId;

pub struct InjectionService<'a, I> {
    injector: &'a I,
    config: &'a ExtensionConfig,
}

impl<'a, I: ScriptInjector> InjectionService<'a, I> {
    pub fn new(injector: &'a I, config: &'a ExtensionConfig) -> Self {
        Self { injector, config }
    }

    /// Returns whether the script was delivered; failures are only logged.
    pub async fn inject(&self, tab_id: TabId) -> bool {
        let result = self
            .injector
            .inject_main_world(tab_id, &self.config.payload_script, &self.config.payload)
            .await;
        match result {
            Ok(()) => {
                log::debug!("payload delivered to tab {}", tab_id);
                true
            }
            Err(e) => {
                log::warn!("payload injection into tab {} failed: {}", tab_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    #[tokio::test]
    async fn test_inject_uses_configured_script() {
        let host = FakeHost::with_active_tab(3, "https://a.example/");
        let config = ExtensionConfig { payload_script: "dist/payload.js".into(), ..Default::default() };

        assert!(InjectionService::new(&host, &config).inject(3).await);
        assert_eq!(host.injected_scripts(), vec!["dist/payload.js".to_string()]);
    }

    #[tokio::test]
    async fn test_inject_failure_is_swallowed() {
        let host = FakeHost::new();
        let config = ExtensionConfig::default();
        assert!(!InjectionService::new(&host, &config).inject(99).await);
        assert!(host.injected().is_empty());
    }
}

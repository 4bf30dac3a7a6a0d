//! In-memory host used by the unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::config::{BadgeConfig, PayloadConfig};
use crate::error::HostError;
use crate::host::{BadgeService, KeyValueStore, PermissionService, ScriptInjector, TabService};
use crate::origin::{resolve_origin, Origin};
use crate::types::{BadgeState, Tab, TabId};

pub(crate) fn origin(url: &str) -> Origin {
    resolve_origin(url).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PermissionAnswer {
    Grant,
    Deny,
    Fail,
}

struct State {
    storage: HashMap<String, Value>,
    writes: usize,
    fail_writes: bool,
    grants: BTreeSet<String>,
    answer: PermissionAnswer,
    prompts: usize,
    fail_queries: bool,
    tabs: BTreeMap<TabId, Tab>,
    active: Option<TabId>,
    injected: Vec<(TabId, String)>,
    fail_injection: bool,
    reloads: Vec<TabId>,
    badges: BTreeMap<TabId, BadgeState>,
    calls: Vec<&'static str>,
}

pub(crate) struct FakeHost {
    state: RefCell<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                storage: HashMap::new(),
                writes: 0,
                fail_writes: false,
                grants: BTreeSet::new(),
                answer: PermissionAnswer::Grant,
                prompts: 0,
                fail_queries: false,
                tabs: BTreeMap::new(),
                active: None,
                injected: Vec::new(),
                fail_injection: false,
                reloads: Vec::new(),
                badges: BTreeMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Host with one active tab at `url`.
    pub fn with_active_tab(id: TabId, url: &str) -> Self {
        let host = Self::new();
        host.open_tab(id, url);
        host
    }

    // --- storage ---

    pub fn put(&self, key: &str, value: Value) {
        self.state.borrow_mut().storage.insert(key.to_string(), value);
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.state.borrow().storage.get(key).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    // --- permissions ---

    pub fn grant(&self, pattern: &str) {
        self.state.borrow_mut().grants.insert(pattern.to_string());
    }

    /// Revocation that happens outside the extension (browser settings).
    pub fn revoke_externally(&self, pattern: &str) {
        self.state.borrow_mut().grants.remove(pattern);
    }

    pub fn has_grant(&self, pattern: &str) -> bool {
        self.state.borrow().grants.contains(pattern)
    }

    pub fn grants(&self) -> Vec<String> {
        self.state.borrow().grants.iter().cloned().collect()
    }

    pub fn answer_requests(&self, answer: PermissionAnswer) {
        self.state.borrow_mut().answer = answer;
    }

    pub fn prompt_count(&self) -> usize {
        self.state.borrow().prompts
    }

    pub fn fail_permission_queries(&self, fail: bool) {
        self.state.borrow_mut().fail_queries = fail;
    }

    // --- tabs ---

    pub fn open_tab(&self, id: TabId, url: &str) {
        let mut state = self.state.borrow_mut();
        state.tabs.insert(id, Tab::new(id, url));
        state.active = Some(id);
    }

    pub fn activate(&self, id: TabId) {
        self.state.borrow_mut().active = Some(id);
    }

    pub fn close_all_tabs(&self) {
        let mut state = self.state.borrow_mut();
        state.tabs.clear();
        state.active = None;
    }

    pub fn fail_injection(&self, fail: bool) {
        self.state.borrow_mut().fail_injection = fail;
    }

    pub fn injected(&self) -> Vec<TabId> {
        self.state.borrow().injected.iter().map(|(id, _)| *id).collect()
    }

    pub fn injected_scripts(&self) -> Vec<String> {
        self.state.borrow().injected.iter().map(|(_, script)| script.clone()).collect()
    }

    pub fn reloads(&self) -> Vec<TabId> {
        self.state.borrow().reloads.clone()
    }

    pub fn badge(&self, id: TabId) -> Option<BadgeState> {
        self.state.borrow().badges.get(&id).copied()
    }

    /// Browser calls in the order they were made.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: &'static str) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl KeyValueStore for FakeHost {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        self.record("storage.get");
        Ok(self.stored(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        self.record("storage.set");
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(HostError::Api { api: "storage.set", message: "quota exceeded".into() });
        }
        state.writes += 1;
        state.storage.insert(key.to_string(), value);
        Ok(())
    }
}

impl PermissionService for FakeHost {
    async fn request(&self, pattern: &str) -> Result<bool, HostError> {
        self.record("permissions.request");
        let mut state = self.state.borrow_mut();
        if state.grants.contains(pattern) {
            return Ok(true);
        }
        match state.answer {
            PermissionAnswer::Grant => {
                state.prompts += 1;
                state.grants.insert(pattern.to_string());
                Ok(true)
            }
            PermissionAnswer::Deny => {
                state.prompts += 1;
                Ok(false)
            }
            PermissionAnswer::Fail => Err(HostError::Api {
                api: "permissions.request",
                message: "not in a user gesture".into(),
            }),
        }
    }

    async fn remove(&self, pattern: &str) -> Result<bool, HostError> {
        self.record("permissions.remove");
        Ok(self.state.borrow_mut().grants.remove(pattern))
    }

    async fn contains(&self, pattern: &str) -> Result<bool, HostError> {
        self.record("permissions.contains");
        let state = self.state.borrow();
        if state.fail_queries {
            return Err(HostError::Unavailable("permissions.contains"));
        }
        Ok(state.grants.contains(pattern))
    }
}

impl TabService for FakeHost {
    async fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        self.record("tabs.query");
        let state = self.state.borrow();
        Ok(state.active.and_then(|id| state.tabs.get(&id).cloned()))
    }

    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError> {
        self.record("tabs.get");
        Ok(self.state.borrow().tabs.get(&tab_id).cloned())
    }

    async fn reload(&self, tab_id: TabId) -> Result<(), HostError> {
        self.record("tabs.reload");
        self.state.borrow_mut().reloads.push(tab_id);
        Ok(())
    }
}

impl ScriptInjector for FakeHost {
    async fn inject_main_world(
        &self,
        tab_id: TabId,
        script: &str,
        _config: &PayloadConfig,
    ) -> Result<(), HostError> {
        self.record("scripting.executeScript");
        let mut state = self.state.borrow_mut();
        if state.fail_injection || !state.tabs.contains_key(&tab_id) {
            return Err(HostError::Api {
                api: "scripting.executeScript",
                message: format!("no tab with id {tab_id}"),
            });
        }
        state.injected.push((tab_id, script.to_string()));
        Ok(())
    }
}

impl BadgeService for FakeHost {
    async fn set_badge(
        &self,
        tab_id: TabId,
        badge: BadgeState,
        _config: &BadgeConfig,
    ) -> Result<(), HostError> {
        self.record("action.setBadgeText");
        self.state.borrow_mut().badges.insert(tab_id, badge);
        Ok(())
    }
}

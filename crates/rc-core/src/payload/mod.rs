//! Page override engine, DOM-independent half
//!
//! The payload that runs inside a page lives in `rc-wasm`. Everything it
//! decides without touching the DOM is here so it can be tested natively:
//!
//! - `events`: the event types whose default action is protected
//! - `patches`: prototype members neutralized in the page
//! - `style`: the forced stylesheet
//! - `overlay`: right-click rescue planning over an element stack
//! - `deferred`: keyed, generation-stamped delayed actions

pub mod deferred;
pub mod events;
pub mod overlay;
pub mod patches;
pub mod style;

pub use deferred::DeferredRegistry;
pub use events::BlockedEvents;
pub use overlay::{plan_rescue, RescuePlan, StackEntry};

/// Page-global flag set once the payload has been applied to a page context.
pub const INJECTION_MARKER: &str = "__reclaimOverridesApplied";

/// Page-global the injector stages the JSON payload config under.
pub const CONFIG_GLOBAL: &str = "__reclaimPayloadConfig";

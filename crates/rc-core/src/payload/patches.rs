//! Prototype members the payload neutralizes.
//!
//! Patching the shared prototypes rather than individual listeners means
//! page handlers registered later, inline attribute handlers and handlers
//! that run before ours all lose the ability to cancel the protected
//! defaults.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Method call is skipped when the receiver is a protected event.
    EventGuard,
    /// `returnValue = false` is ignored for protected events.
    ReturnValueGuard,
    /// Method becomes an unconditional no-op.
    NoOp,
    /// `addEventListener` calls for intercepted types are discarded.
    RegistrationGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrototypePatch {
    /// Global constructor whose `prototype` is patched.
    pub interface: &'static str,
    pub member: &'static str,
    pub kind: PatchKind,
}

const fn patch(interface: &'static str, member: &'static str, kind: PatchKind) -> PrototypePatch {
    PrototypePatch { interface, member, kind }
}

/// Cancel-default and selection-clearing capabilities.
pub const CAPABILITY_PATCHES: &[PrototypePatch] = &[
    patch("Event", "preventDefault", PatchKind::EventGuard),
    patch("MouseEvent", "preventDefault", PatchKind::EventGuard),
    patch("PointerEvent", "preventDefault", PatchKind::EventGuard),
    patch("DragEvent", "preventDefault", PatchKind::EventGuard),
    patch("ClipboardEvent", "preventDefault", PatchKind::EventGuard),
    patch("KeyboardEvent", "preventDefault", PatchKind::EventGuard),
    patch("Event", "returnValue", PatchKind::ReturnValueGuard),
    patch("Selection", "removeAllRanges", PatchKind::NoOp),
    patch("Selection", "empty", PatchKind::NoOp),
];

/// Listener-registration entry point.
pub const REGISTRATION_PATCH: PrototypePatch =
    patch("EventTarget", "addEventListener", PatchKind::RegistrationGuard);

// Synchronous, priority-ordered extension points for payment operations
// Callbacks run inline on the caller's thread; a `before_*` callback can
// veto the in-flight operation by returning an error.

pub mod manager;
pub mod point;

pub use manager::{HookHandle, HookManager, HookRegistrationInfo, DEFAULT_HOOK_PRIORITY};
pub use point::{HookContext, HookPoint};

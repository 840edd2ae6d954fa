//! Per-message dispatch.
//!
//! - [`dispatcher`]: the state machine from raw text to a scheduled handler
//! - [`context`]: `DispatchContext` (one per message) and `Invocation`
//!   (what a handler receives)
//! - [`help`]: usage and index rendering
//! - [`waiters`]: follow-up message waits

pub mod context;
pub mod dispatcher;
pub mod help;
pub mod waiters;

pub use context::{DispatchContext, Invocation};
pub use dispatcher::{Dispatcher, Outcome, Rejection};
pub use waiters::{ReplyWaiters, WaitOutcome};

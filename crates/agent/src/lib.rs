//! The turn pipeline of the Mini-Jira admin agent.
//!
//! Each turn follows a fixed path:
//!
//! 1. **Compact** the caller's history to the configured window and budget
//! 2. **Classify** the new message with one model call into an intent + args
//! 3. **Dispatch** to the tool serving that intent (or pass a reply through)
//! 4. **Append** the user message and exactly one assistant reply
//!
//! There is no loop: a turn never calls the model twice.

pub mod classifier;
pub mod compactor;
pub mod dispatcher;
pub mod prompt;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classifier::IntentClassifier;
pub use compactor::{HistoryLimits, compact};
pub use dispatcher::{Dispatcher, Route, TurnOutcome, route};

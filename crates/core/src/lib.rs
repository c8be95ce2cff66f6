//! # Mini-Jira Core
//!
//! Domain types, traits, and error definitions for the Mini-Jira admin agent.
//! This crate has **no framework dependencies**: it defines the domain model
//! every other crate implements against.
//!
//! Each collaborator of the turn pipeline is a trait here
//! ([`Provider`], [`Tool`], [`TicketStore`]) so implementations can be
//! swapped by configuration and replaced by scripted fakes in tests.

pub mod error;
pub mod intent;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, ProviderError, StoreError, StoreErrorClass, ToolError};
pub use intent::{Args, DecisionError, Intent, RouterDecision};
pub use message::{Conversation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::{Ticket, TicketFilter, TicketStatus, TicketStore, User};
pub use tool::{Tool, ToolRegistry, ToolResult, ToolSpec};

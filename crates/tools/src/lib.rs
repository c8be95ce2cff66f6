//! Domain tools for Mini-Jira.
//!
//! One tool per actionable intent, each a single request/response operation
//! against a [`TicketStore`]. Tools never fail for domain reasons: bad
//! arguments and rule violations come back as rejection text. Only an
//! unreachable store is an error.

pub mod admin;
pub mod args;
mod outcome;
pub mod table;
pub mod tickets;
pub mod users;

use minijira_core::store::TicketStore;
use minijira_core::tool::ToolRegistry;
use std::sync::Arc;

/// Create the registry holding all nine domain tools, sharing one store.
pub fn default_registry(store: Arc<dyn TicketStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(users::AddUserTool::new(store.clone())));
    registry.register(Box::new(users::ShowUsersTool::new(store.clone())));
    registry.register(Box::new(users::DeleteUserTool::new(store.clone())));
    registry.register(Box::new(tickets::CreateTicketTool::new(store.clone())));
    registry.register(Box::new(tickets::ViewTicketTool::new(store.clone())));
    registry.register(Box::new(tickets::UpdateStatusTool::new(store.clone())));
    registry.register(Box::new(tickets::ListTicketsTool::new(store.clone())));
    registry.register(Box::new(tickets::DeleteTicketTool::new(store.clone())));
    registry.register(Box::new(admin::ResetDatabaseTool::new(store)));
    registry
}

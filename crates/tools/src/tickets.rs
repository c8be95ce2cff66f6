//! Ticket tools: create, view, update status, list, delete.
//!
//! A user owns at most one ticket, so every lookup after creation is keyed
//! by the owner's `user_id`.

use async_trait::async_trait;
use minijira_core::error::{StoreError, ToolError};
use minijira_core::store::{TicketFilter, TicketStatus, TicketStore};
use minijira_core::tool::{Tool, ToolResult};
use minijira_core::Args;
use std::sync::Arc;

use crate::args::{self, ArgError};
use crate::outcome::from_store;
use crate::table;
use crate::users::user_id_rejection;

/// Creates an OPEN ticket for an existing user, looked up by name.
pub struct CreateTicketTool {
    store: Arc<dyn TicketStore>,
}

impl CreateTicketTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateTicketTool {
    fn name(&self) -> &str {
        "create_ticket"
    }

    fn description(&self) -> &str {
        "Create a new ticket with a title and assign it to an existing user by name."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["title", "assignee_name"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let (Ok(title), Ok(assignee)) = (
            args::string(&arguments, "title"),
            args::string(&arguments, "assignee_name"),
        ) else {
            return Ok(ToolResult::rejected(
                "Please provide both a title and an assignee name, e.g., `create ticket \"Fix login\" for Alice`.",
            ));
        };

        let result = self.store.create_ticket(&title, &assignee).await;
        from_store(self.name(), "creating the ticket", result, |ticket| {
            format!("Ticket created with id {}.", ticket.id)
        })
    }
}

/// Shows the title of the ticket a user owns.
pub struct ViewTicketTool {
    store: Arc<dyn TicketStore>,
}

impl ViewTicketTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ViewTicketTool {
    fn name(&self) -> &str {
        "view_ticket"
    }

    fn description(&self) -> &str {
        "View a ticket title by user_id."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["user_id"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let user_id = match args::int(&arguments, "user_id") {
            Ok(id) => id,
            Err(e) => return Ok(user_id_rejection(e, "view ticket 1")),
        };

        let result = self.store.ticket_for_user(user_id).await;
        from_store(self.name(), "loading the ticket", result, |ticket| ticket.title)
    }
}

/// Moves a user's ticket to another status.
pub struct UpdateStatusTool {
    store: Arc<dyn TicketStore>,
}

impl UpdateStatusTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateStatusTool {
    fn name(&self) -> &str {
        "update_status"
    }

    fn description(&self) -> &str {
        "Update ticket status to OPEN | IN_PROGRESS | CLOSED."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["user_id", "status"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let user_id = match args::int(&arguments, "user_id") {
            Ok(id) => id,
            Err(e) => return Ok(user_id_rejection(e, "update status 1 CLOSED")),
        };

        // Absent, blank and unknown statuses all get the same hint.
        let status = match args::string(&arguments, "status") {
            Ok(raw) => TicketStatus::parse(&raw),
            Err(_) => Err(StoreError::InvalidStatus(String::new())),
        };
        let status = match status {
            Ok(status) => status,
            Err(e) => return Ok(ToolResult::rejected(e.to_string())),
        };

        let result = self.store.update_status(user_id, status).await;
        from_store(self.name(), "updating the ticket", result, |_| {
            format!("Ticket with user id {user_id} status updated to {status}.")
        })
    }
}

/// Lists tickets as a markdown table, optionally filtered by status.
pub struct ListTicketsTool {
    store: Arc<dyn TicketStore>,
}

impl ListTicketsTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListTicketsTool {
    fn name(&self) -> &str {
        "list_tickets"
    }

    fn description(&self) -> &str {
        "List tickets as a table. kind = all | OPEN | IN_PROGRESS | CLOSED."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["kind"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let filter = match args::optional_string(&arguments, "kind") {
            Ok(None) => TicketFilter::All,
            Ok(Some(kind)) => match TicketFilter::parse(&kind) {
                Ok(filter) => filter,
                Err(_) => return Ok(unknown_filter(&kind)),
            },
            Err(_) => {
                let raw = arguments.get("kind").map(ToString::to_string).unwrap_or_default();
                return Ok(unknown_filter(&raw));
            }
        };

        let result = self.store.list_tickets(filter).await;
        from_store(self.name(), "listing tickets", result, |tickets| {
            if tickets.is_empty() {
                "No tickets found.".to_string()
            } else {
                table::tickets(&tickets)
            }
        })
    }
}

fn unknown_filter(kind: &str) -> ToolResult {
    ToolResult::rejected(format!(
        "Unknown ticket filter '{kind}'. Use all, OPEN, IN_PROGRESS, or CLOSED."
    ))
}

/// Deletes the ticket a user owns; the user stays.
pub struct DeleteTicketTool {
    store: Arc<dyn TicketStore>,
}

impl DeleteTicketTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteTicketTool {
    fn name(&self) -> &str {
        "delete_ticket"
    }

    fn description(&self) -> &str {
        "Delete a ticket by its owner's user_id."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["user_id"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let user_id = match args::int(&arguments, "user_id") {
            Ok(id) => id,
            Err(e) => return Ok(user_id_rejection(e, "delete ticket 1")),
        };

        match self.store.delete_ticket(user_id).await {
            Err(StoreError::TicketNotFound(id)) => Ok(ToolResult::rejected(format!(
                "Ticket with user_id {id} does not exist."
            ))),
            result => from_store(self.name(), "deleting the ticket", result, |_| {
                format!("Ticket with user_id {user_id} deleted successfully.")
            }),
        }
    }
}

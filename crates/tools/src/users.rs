//! User tools: add, show, delete.

use async_trait::async_trait;
use minijira_core::error::ToolError;
use minijira_core::store::TicketStore;
use minijira_core::tool::{Tool, ToolResult};
use minijira_core::Args;
use std::sync::Arc;

use crate::args::{self, ArgError};
use crate::outcome::from_store;

/// Adds a user with a caller-chosen id.
pub struct AddUserTool {
    store: Arc<dyn TicketStore>,
}

impl AddUserTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddUserTool {
    fn name(&self) -> &str {
        "add_user"
    }

    fn description(&self) -> &str {
        "Add a new user by (user_id, name)."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["user_id", "name"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let (user_id, name) = match (args::int(&arguments, "user_id"), args::string(&arguments, "name")) {
            (Err(ArgError::Missing(_)), _) | (_, Err(ArgError::Missing(_))) => {
                return Ok(ToolResult::rejected(
                    "Please provide both user_id and name, e.g., `add user 1 Alice`.",
                ));
            }
            (Err(ArgError::Invalid(_)), _) => {
                return Ok(ToolResult::rejected("user_id must be an integer."));
            }
            (_, Err(ArgError::Invalid(_))) => {
                return Ok(ToolResult::rejected("name must be text."));
            }
            (Ok(id), Ok(name)) => (id, name),
        };

        let result = self.store.add_user(user_id, &name).await;
        from_store(self.name(), "adding the user", result, |_| "The user is added.".to_string())
    }
}

/// Lists every user.
pub struct ShowUsersTool {
    store: Arc<dyn TicketStore>,
}

impl ShowUsersTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ShowUsersTool {
    fn name(&self) -> &str {
        "show_users"
    }

    fn description(&self) -> &str {
        "Show all users currently in the system."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &[]
    }

    async fn execute(&self, _arguments: Args) -> Result<ToolResult, ToolError> {
        let result = self.store.list_users().await;
        from_store(self.name(), "listing users", result, |users| {
            if users.is_empty() {
                return "No users found.".to_string();
            }
            let lines: Vec<String> = users
                .iter()
                .map(|u| format!("{}: {}", u.user_id, u.name))
                .collect();
            format!("Users:\n{}", lines.join("\n"))
        })
    }
}

/// Deletes a user and, by cascade, their ticket.
pub struct DeleteUserTool {
    store: Arc<dyn TicketStore>,
}

impl DeleteUserTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteUserTool {
    fn name(&self) -> &str {
        "delete_user"
    }

    fn description(&self) -> &str {
        "Delete a user (and their tickets) by user_id."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &["user_id"]
    }

    async fn execute(&self, arguments: Args) -> Result<ToolResult, ToolError> {
        let user_id = match args::int(&arguments, "user_id") {
            Ok(id) => id,
            Err(e) => return Ok(user_id_rejection(e, "delete user 1")),
        };

        let result = self.store.delete_user(user_id).await;
        from_store(self.name(), "deleting the user", result, |_| {
            format!("User with id {user_id} (and their tickets) deleted successfully.")
        })
    }
}

/// Rejection for a bad or absent `user_id`, with a usage hint.
pub(crate) fn user_id_rejection(err: ArgError, example: &str) -> ToolResult {
    match err {
        ArgError::Missing(_) => {
            ToolResult::rejected(format!("Please provide a user_id, e.g., `{example}`."))
        }
        ArgError::Invalid(_) => ToolResult::rejected("user_id must be an integer."),
    }
}

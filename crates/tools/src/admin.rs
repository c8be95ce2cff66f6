//! Database administration.

use async_trait::async_trait;
use minijira_core::error::ToolError;
use minijira_core::store::TicketStore;
use minijira_core::tool::{Tool, ToolResult};
use minijira_core::Args;
use std::sync::Arc;

use crate::outcome::from_store;

/// Deletes all users and tickets and restarts ticket ids.
pub struct ResetDatabaseTool {
    store: Arc<dyn TicketStore>,
}

impl ResetDatabaseTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ResetDatabaseTool {
    fn name(&self) -> &str {
        "reset_database"
    }

    fn description(&self) -> &str {
        "Reset the database by deleting all users and tickets."
    }

    fn required_args(&self) -> &'static [&'static str] {
        &[]
    }

    async fn execute(&self, _arguments: Args) -> Result<ToolResult, ToolError> {
        let result = self.store.reset().await;
        from_store(self.name(), "resetting the database", result, |_| {
            "Database reset: all users and tickets deleted.".to_string()
        })
    }
}

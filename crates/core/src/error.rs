//! Error types for the Mini-Jira domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The only tool failure that crosses the tool boundary: everything else
/// is reported to the user as a [`ToolResult`](crate::tool::ToolResult).
#[derive(Debug, Error)]
pub enum ToolError {
    /// The store behind a tool could not be reached.
    #[error("Store unavailable while running {tool_name}: {reason}")]
    StoreUnavailable { tool_name: String, reason: String },
}

/// Errors raised by a [`TicketStore`](crate::store::TicketStore).
///
/// The variants fall into three classes, see [`StoreError::class`].
/// The `Display` text of every violation is the reply shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    // --- Domain violations (expected, user-facing) ---
    #[error("User ID already exists.")]
    UserIdTaken(i64),

    #[error("Username already exists.")]
    UsernameTaken(String),

    #[error("User with id {0} does not exist.")]
    UserNotFound(i64),

    #[error("Cannot create ticket: user '{0}' does not exist.")]
    UnknownAssignee(String),

    #[error("Cannot create ticket: duplicate title.")]
    DuplicateTitle(String),

    #[error("Cannot create ticket: user '{0}' already has a ticket.")]
    AssigneeHasTicket(String),

    #[error("Ticket with user id {0} does not exist.")]
    TicketNotFound(i64),

    #[error("Invalid status. Use OPEN, IN_PROGRESS, or CLOSED.")]
    InvalidStatus(String),

    // --- Unexpected faults ---
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    // --- Infrastructure ---
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// How a [`StoreError`] should be handled at the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorClass {
    /// Reported to the user verbatim.
    Violation,
    /// Logged; the user gets a generic failure reply.
    Fault,
    /// Propagated to the caller as a hard failure.
    Infrastructure,
}

impl StoreError {
    pub fn class(&self) -> StoreErrorClass {
        match self {
            Self::UserIdTaken(_)
            | Self::UsernameTaken(_)
            | Self::UserNotFound(_)
            | Self::UnknownAssignee(_)
            | Self::DuplicateTitle(_)
            | Self::AssigneeHasTicket(_)
            | Self::TicketNotFound(_)
            | Self::InvalidStatus(_) => StoreErrorClass::Violation,
            Self::QueryFailed(_) | Self::MigrationFailed(_) => StoreErrorClass::Fault,
            Self::Unavailable(_) => StoreErrorClass::Infrastructure,
        }
    }
}

/// Errors that end a turn without an assistant reply.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The language model could not be reached or rejected the request.
    #[error("Model unavailable: {0}")]
    Model(#[from] ProviderError),

    /// The domain store could not be reached.
    #[error("{0}")]
    Tool(#[from] ToolError),
}

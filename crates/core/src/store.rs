//! TicketStore trait — the abstraction over the users/tickets database.
//!
//! Every operation is one logical mutation or query and must be atomic.
//! Expected domain outcomes (duplicates, missing rows) come back as
//! violation variants of [`StoreError`]; see [`StoreError::class`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// A user of the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub name: String,
}

/// Workflow state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [Self::Open, Self::InProgress, Self::Closed];

    /// Canonical upper-case form, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Closed => "CLOSED",
        }
    }

    /// Lenient parse: case-insensitive, `-` and spaces count as `_`.
    ///
    /// `"in-progress"`, `"In Progress"` and `"IN_PROGRESS"` all parse to
    /// [`TicketStatus::InProgress`].
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == normalized)
            .ok_or_else(|| StoreError::InvalidStatus(raw.to_string()))
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A ticket joined with its assignee's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub assignee_id: i64,
    pub assignee: String,
    pub status: TicketStatus,
}

/// Which tickets a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketFilter {
    #[default]
    All,
    Status(TicketStatus),
}

impl TicketFilter {
    /// Parse `all` or any status spelling accepted by [`TicketStatus::parse`].
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        TicketStatus::parse(raw).map(Self::Status)
    }
}

/// The domain store consumed by the tools and the direct API.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a user; both id and name must be unused.
    async fn add_user(&self, user_id: i64, name: &str) -> Result<User, StoreError>;

    /// Insert an OPEN ticket for an existing user (looked up by exact name).
    async fn create_ticket(&self, title: &str, assignee_name: &str) -> Result<Ticket, StoreError>;

    /// The ticket owned by `user_id`.
    async fn ticket_for_user(&self, user_id: i64) -> Result<Ticket, StoreError>;

    /// Set the status of the ticket owned by `user_id`.
    async fn update_status(&self, user_id: i64, status: TicketStatus) -> Result<(), StoreError>;

    /// Tickets matching `filter`, ordered by ticket id ascending.
    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, StoreError>;

    /// All users, ordered by id ascending.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Delete a user and cascade-delete their ticket.
    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError>;

    /// Delete the ticket owned by `user_id`.
    async fn delete_ticket(&self, user_id: i64) -> Result<(), StoreError>;

    /// Delete everything and restart id sequences.
    async fn reset(&self) -> Result<(), StoreError>;
}

//! Shared data models for the studyhall API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Identity ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub is_instructor: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

// --- Courses ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor: UserSummary,
    pub enrolled_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub id: String,
    pub course: Course,
    pub enrolled_at: DateTime<Utc>,
}

// --- Messages, statuses, notifications ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub author: UserSummary,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPost {
    pub id: String,
    pub author: UserSummary,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub reply_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub verb: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMessageRequest {
    pub body: String,
    /// Client-generated nonce so the server can deduplicate retried posts.
    pub nonce: String,
}

impl CreateMessageRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateStatusRequest {
    pub body: String,
}

// --- Pagination ---

/// Paged list envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> PagedResponse<T> {
    /// Cursor for the page after this one, `None` when exhausted.
    pub fn next_cursor(&self) -> Option<PageCursor> {
        self.next.as_ref().map(|url| PageCursor::Url(url.clone()))
    }
}

/// Opaque pointer to the next page of a paginated collection.
///
/// List endpoints disagree on how they paginate (a full `next` URL, a page
/// number, or an offset); consumers treat all three as one opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Url(String),
    Page(u32),
    Offset(u64),
}

impl PageCursor {
    /// Resolve this cursor against a list endpoint path.
    ///
    /// `Url` cursors already point at the next page and replace the path
    /// entirely; the other flavors attach a query parameter.
    pub fn apply(&self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        match self {
            PageCursor::Url(url) => url.clone(),
            PageCursor::Page(page) => format!("{path}{sep}page={page}"),
            PageCursor::Offset(offset) => format!("{path}{sep}offset={offset}"),
        }
    }
}

// --- Realtime frames ---

/// Events pushed on a chat room channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageCreated { message: ChatMessage },
    MessageUpdated { message: ChatMessage },
    MessageDeleted { id: String },
}

/// Events pushed on a user's notification channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    Notification { notification: Notification },
}

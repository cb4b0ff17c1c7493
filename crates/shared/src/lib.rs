//! Shared wire models for the studyhall platform.
//!
//! Everything in this crate mirrors what the API server sends and accepts:
//! domain objects, pagination envelopes, realtime frames, and the error
//! envelope. The client crate builds its stores and transports on top of
//! these types.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{try_problem_detail, ApiError, ProblemDetails};
pub use models::{
    ChatEvent, ChatMessage, Course, CreateMessageRequest, CreateStatusRequest, Enrollment,
    Notification, NotificationEvent, PageCursor, PagedResponse, StatusPost, UpdateProfileRequest,
    UserProfile, UserSummary,
};
pub use protocol::{
    channel_path, is_terminal_close, CLOSE_ABNORMAL, CLOSE_FORBIDDEN, CLOSE_NORMAL,
    CLOSE_UNAUTHORIZED,
};

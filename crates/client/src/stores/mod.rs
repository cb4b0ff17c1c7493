//! Client-side stores fed by page fetches and realtime events.

pub mod timeline;

pub use timeline::{apply_chat_event, apply_notification_event, Timeline, TimelineEntry};

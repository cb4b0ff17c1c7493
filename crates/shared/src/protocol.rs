//! Realtime protocol constants shared between channel endpoints.

/// Normal closure, sent when the client deliberately disconnects.
pub const CLOSE_NORMAL: u16 = 1000;

/// Abnormal closure, reported when a connection drops without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Server rejected the subscription because the session is not authenticated.
pub const CLOSE_UNAUTHORIZED: u16 = 4401;

/// Server rejected the subscription because the user may not see the resource.
pub const CLOSE_FORBIDDEN: u16 = 4403;

/// Whether a close code means the subscription must not be retried.
pub fn is_terminal_close(code: u16) -> bool {
    matches!(code, CLOSE_UNAUTHORIZED | CLOSE_FORBIDDEN)
}

/// Path of the websocket endpoint for one subscribable resource,
/// e.g. `/ws/chat/42/` or `/ws/notifications/u7/`.
pub fn channel_path(resource: &str, id: &str) -> String {
    format!("/ws/{resource}/{id}/")
}

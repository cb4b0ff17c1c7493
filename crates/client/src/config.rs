//! API endpoint configuration and URL building.

use studyhall_shared::protocol::channel_path;

/// Where the API lives. Owned by the app shell and cloned into the
/// clients and channels that need to build URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_base: String,
    pub ws_base: String,
}

impl ApiConfig {
    /// Build a config from the HTTP base URL; the websocket base is derived
    /// by scheme substitution (`https` -> `wss`).
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        let ws_base = http_to_ws(&api_base);
        Self { api_base, ws_base }
    }

    /// Override the derived websocket base, for deployments that serve the
    /// realtime endpoint from a different host.
    pub fn with_ws_base(mut self, ws_base: impl Into<String>) -> Self {
        self.ws_base = ws_base.into();
        self
    }

    /// Join a path onto the API base. Absolute URLs pass through untouched
    /// so paginated `next` links can be followed directly.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Websocket URL for one subscription, with the session token attached
    /// as a query parameter when present.
    pub fn ws_url(&self, endpoint: &ChannelEndpoint, token: Option<&str>) -> String {
        let base = self.ws_base.trim_end_matches('/');
        let mut url = format!("{base}{}", endpoint.path());
        if let Some(token) = token {
            url.push_str(&format!("?token={}", urlencoding::encode(token)));
        }
        url
    }
}

/// Swap an HTTP(S) scheme for the matching websocket scheme.
fn http_to_ws(base: &str) -> String {
    if let Ok(mut parsed) = url::Url::parse(base) {
        let scheme = match parsed.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => other,
        }
        .to_string();
        if parsed.set_scheme(&scheme).is_ok() {
            return parsed.to_string().trim_end_matches('/').to_string();
        }
    }
    base.replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1)
}

/// Identifies one realtime subscription: a subscribable resource kind plus
/// the resource id. Immutable for the lifetime of a connection; switching
/// chats means tearing the channel down and building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpoint {
    pub resource: String,
    pub id: String,
}

impl ChannelEndpoint {
    pub fn chat(chat_id: impl Into<String>) -> Self {
        Self {
            resource: "chat".into(),
            id: chat_id.into(),
        }
    }

    pub fn notifications(user_id: impl Into<String>) -> Self {
        Self {
            resource: "notifications".into(),
            id: user_id.into(),
        }
    }

    pub fn path(&self) -> String {
        channel_path(&self.resource, &self.id)
    }
}

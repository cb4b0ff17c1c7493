//! HTTP API client for the studyhall REST endpoints.

use std::cell::Cell;
use std::rc::Rc;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use studyhall_shared::{
    ApiError, ChatMessage, Course, CreateMessageRequest, CreateStatusRequest, Enrollment,
    Notification, PageCursor, PagedResponse, StatusPost, UpdateProfileRequest, UserProfile,
};

/// Endpoint the bootstrap guard primes before the first mutating request.
const BOOTSTRAP_PATH: &str = "/api/auth/csrf/";

/// HTTP client for making API requests.
///
/// Cheap to clone; clones share the bootstrap guard, so session-cookie
/// priming happens once per logical client rather than once per view.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    ready: Rc<Cell<bool>>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            token: None,
            ready: Rc::new(Cell::new(false)),
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach a session token sent as a bearer credential
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => rb.header("Authorization", format!("Bearer {token}")),
            None => rb,
        }
    }

    /// One-time bootstrap call that primes the session cookie. Idempotent:
    /// after the first success every later call is free.
    pub async fn ensure_ready(&self) -> Result<(), ApiError> {
        if self.ready.get() {
            return Ok(());
        }
        let url = self.url(BOOTSTRAP_PATH);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        self.ready.set(true);
        Ok(())
    }

    async fn read_body(resp: Response) -> Result<String, ApiError> {
        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;
        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(text: String) -> Result<T, ApiError> {
        let body = if text.is_empty() { "null" } else { &text };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make a GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let rb = self.authorize(self.client.get(self.url(path)));
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(Self::read_body(resp).await?)
    }

    /// Make a POST request with JSON body
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        self.ensure_ready().await?;
        let rb = self.authorize(self.client.post(self.url(path))).json(body);
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(Self::read_body(resp).await?)
    }

    /// Make a PATCH request with JSON body
    pub async fn patch_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        self.ensure_ready().await?;
        let rb = self.authorize(self.client.patch(self.url(path))).json(body);
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(Self::read_body(resp).await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.ensure_ready().await?;
        let rb = self.authorize(self.client.delete(self.url(path)));
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_body(resp).await?;
        Ok(())
    }

    /// Fetch one page of a list endpoint, following the cursor when given.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<T>, ApiError> {
        let path = match cursor {
            Some(cursor) => cursor.apply(path),
            None => path.to_string(),
        };
        self.get_json(&path).await
    }

    // --- Courses & enrollment ---

    pub async fn list_courses(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<Course>, ApiError> {
        self.get_page("/api/courses/", cursor).await
    }

    pub async fn get_course(&self, course_id: &str) -> Result<Course, ApiError> {
        self.get_json(&format!("/api/courses/{course_id}/")).await
    }

    pub async fn list_enrollments(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<Enrollment>, ApiError> {
        self.get_page("/api/enrollments/", cursor).await
    }

    pub async fn enroll(&self, course_id: &str) -> Result<Enrollment, ApiError> {
        self.post_json("/api/enrollments/", &serde_json::json!({ "course": course_id }))
            .await
    }

    // --- Chat ---

    pub async fn list_chat_messages(
        &self,
        chat_id: &str,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<ChatMessage>, ApiError> {
        self.get_page(&format!("/api/chats/{chat_id}/messages/"), cursor)
            .await
    }

    /// Post a message. The caller refreshes or waits for the realtime create
    /// event; there is no optimistic insert.
    pub async fn create_chat_message(
        &self,
        chat_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ChatMessage, ApiError> {
        self.post_json(&format!("/api/chats/{chat_id}/messages/"), request)
            .await
    }

    // --- Status feed ---

    pub async fn list_statuses(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<StatusPost>, ApiError> {
        self.get_page("/api/statuses/", cursor).await
    }

    pub async fn create_status(
        &self,
        request: &CreateStatusRequest,
    ) -> Result<StatusPost, ApiError> {
        self.post_json("/api/statuses/", request).await
    }

    // --- Notifications ---

    pub async fn list_notifications(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<PagedResponse<Notification>, ApiError> {
        self.get_page("/api/notifications/", cursor).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<Notification, ApiError> {
        self.patch_json(
            &format!("/api/notifications/{id}/"),
            &serde_json::json!({ "read": true }),
        )
        .await
    }

    // --- Profile ---

    pub async fn get_me(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/api/me/profile/").await
    }

    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        self.patch_json("/api/me/profile/", update).await
    }

    pub async fn get_user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.get_json(&format!("/api/users/{username}/profile/")).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

//! Studyhall client core.
//!
//! The browser-facing data layer of the studyhall e-learning platform: a
//! reconnecting realtime channel for chat rooms and notification streams,
//! the incremental pagination controller shared by every list view, and
//! the timeline store that reconciles both write paths into one ordered,
//! duplicate-free collection. Rendering lives elsewhere; everything here
//! is UI-framework-agnostic and single-threaded.

pub mod api_client;
pub mod config;
pub mod loader;
pub mod logging;
pub mod realtime;
pub mod session;
pub mod stores;
pub mod task;

pub use api_client::ApiClient;
pub use config::{ApiConfig, ChannelEndpoint};
pub use loader::{FetchError, FetchRequest, IncrementalListLoader, ListState, Page};
pub use realtime::{ChannelError, ConnectionState, RealtimeChannel, ReconnectConfig};
pub use session::{channel_url_builder, AuthSession, SessionHandle};
pub use stores::{Timeline, TimelineEntry};

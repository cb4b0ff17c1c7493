//! Realtime subscription channel with state management and auto-reconnect.
//!
//! One `RealtimeChannel` owns one websocket subscription (a chat room or a
//! notification stream). The connection lifecycle is a pure state machine
//! in [`transition`]; the channel driver executes its effects against
//! injected transport and timer implementations, so the whole lifecycle is
//! testable without a socket. Platform-specific socket code lives in the
//! conditionally compiled siblings.

mod channel;
mod timer;
mod transition;
mod transport;

#[cfg(target_arch = "wasm32")]
mod socket_wasm;
#[cfg(target_arch = "wasm32")]
pub use socket_wasm::PlatformConnector;

#[cfg(not(target_arch = "wasm32"))]
mod socket_native;
#[cfg(not(target_arch = "wasm32"))]
pub use socket_native::PlatformConnector;

pub use channel::RealtimeChannel;
pub use timer::PlatformTimers;
pub use transition::{transition, ChannelInput, Effect};
pub use transport::{Connector, TimerHandle, TimerScheduler, Transport, TransportSink};

/// Connection state for a realtime channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    /// `attempt` counts consecutive failures since the channel was last open.
    Reconnecting { attempt: u32 },
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failed attempts before giving up
    /// (0 = retry forever)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    /// Fixed 3 second interval, five strikes.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 3000,
            max_delay_ms: 3000,
            backoff_multiplier: 1.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> u32 {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        (delay as u32).min(self.max_delay_ms)
    }
}

/// Failures a channel can surface. Transport and parse problems are local
/// and non-fatal; the last two end the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Socket failed to establish; the reconnect policy takes it from here.
    TransportOpen(String),
    /// Undecodable push payload, logged and dropped.
    MalformedEvent(String),
    /// Transport-level error; the close event that follows drives the
    /// state machine.
    Transport(String),
    /// Server closed the channel for a non-retriable reason.
    TerminalClose { code: u16, reason: String },
    /// Retry budget consumed; the channel stays closed until reconnected
    /// explicitly.
    ReconnectExhausted { attempts: u32 },
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::TransportOpen(msg) => write!(f, "failed to open transport: {msg}"),
            ChannelError::MalformedEvent(msg) => write!(f, "malformed event dropped: {msg}"),
            ChannelError::Transport(msg) => write!(f, "transport error: {msg}"),
            ChannelError::TerminalClose { code, reason } => {
                write!(f, "channel closed by server (code {code}): {reason}")
            }
            ChannelError::ReconnectExhausted { attempts } => {
                write!(f, "gave up reconnecting after {attempts} failed attempts")
            }
        }
    }
}

impl std::error::Error for ChannelError {}

//! Transport and timer seams for the realtime channel.
//!
//! The channel never touches a platform API directly; production wires in
//! the websocket connector and event-loop timers, tests drive it with
//! fakes.

use std::cell::Cell;
use std::rc::Rc;

/// Callbacks a transport uses to report socket events back to its channel.
/// Fields are `Rc` closures so the sink can be cloned into the handlers of
/// the underlying socket.
#[derive(Clone)]
pub struct TransportSink {
    pub on_open: Rc<dyn Fn()>,
    pub on_message: Rc<dyn Fn(String)>,
    pub on_close: Rc<dyn Fn(u16, String)>,
    pub on_error: Rc<dyn Fn(String)>,
}

/// Handle to one live socket.
pub trait Transport {
    /// Close the underlying socket with the given code. The channel ignores
    /// any events the socket reports after a local close.
    fn close(&self, code: u16);
}

/// Opens sockets for a channel.
pub trait Connector {
    fn connect(&self, url: &str, sink: TransportSink) -> Result<Box<dyn Transport>, String>;
}

/// Cancellation token for a scheduled callback.
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle {
    pub fn new(cancelled: Rc<Cell<bool>>) -> Self {
        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

/// One-shot timer scheduling. Implementations must check the handle's flag
/// at fire time so a cancelled callback never runs.
pub trait TimerScheduler {
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle;
}

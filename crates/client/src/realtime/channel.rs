//! Realtime channel driver.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use studyhall_shared::protocol::CLOSE_ABNORMAL;

use super::transition::{transition, ChannelInput, Effect};
use super::transport::{Connector, TimerHandle, TimerScheduler, Transport, TransportSink};
use super::{ChannelError, ConnectionState, ReconnectConfig};
use crate::{log_debug, log_info, log_warn};

/// One realtime subscription with automatic recovery from transient
/// disconnects.
///
/// A channel is owned by exactly one view. Dropping it disconnects, so a
/// reconnect timer can never fire for a view that has unmounted.
pub struct RealtimeChannel<E: 'static> {
    inner: Rc<ChannelInner<E>>,
}

struct ChannelInner<E: 'static> {
    name: String,
    config: ReconnectConfig,
    connector: Rc<dyn Connector>,
    timers: Rc<dyn TimerScheduler>,
    url_builder: Box<dyn Fn() -> Option<String>>,
    parse: Box<dyn Fn(&str) -> Result<E, String>>,
    on_event: Box<dyn Fn(E)>,
    on_open: RefCell<Option<Box<dyn Fn()>>>,
    on_error: RefCell<Option<Box<dyn Fn(ChannelError)>>>,
    on_state: RefCell<Option<Box<dyn Fn(ConnectionState)>>>,
    state: RefCell<ConnectionState>,
    transport: RefCell<Option<Box<dyn Transport>>>,
    pending_retry: RefCell<Option<TimerHandle>>,
    /// Bumped whenever the active socket changes; callbacks from an older
    /// socket carry a stale value and are dropped.
    epoch: Cell<u64>,
}

impl<E: DeserializeOwned + 'static> RealtimeChannel<E> {
    /// Create a channel. The URL builder runs on every (re)connect attempt
    /// and returns `None` while no authenticated session exists; inbound
    /// frames are JSON-decoded into `E` and handed to `on_event`.
    pub fn new(
        name: impl Into<String>,
        config: ReconnectConfig,
        connector: Rc<dyn Connector>,
        timers: Rc<dyn TimerScheduler>,
        url_builder: impl Fn() -> Option<String> + 'static,
        on_event: impl Fn(E) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                name: name.into(),
                config,
                connector,
                timers,
                url_builder: Box::new(url_builder),
                parse: Box::new(|text| serde_json::from_str::<E>(text).map_err(|e| e.to_string())),
                on_event: Box::new(on_event),
                on_open: RefCell::new(None),
                on_error: RefCell::new(None),
                on_state: RefCell::new(None),
                state: RefCell::new(ConnectionState::Idle),
                transport: RefCell::new(None),
                pending_retry: RefCell::new(None),
                epoch: Cell::new(0),
            }),
        }
    }

    /// Channel wired to the platform socket and timer implementations.
    pub fn with_platform(
        name: impl Into<String>,
        config: ReconnectConfig,
        url_builder: impl Fn() -> Option<String> + 'static,
        on_event: impl Fn(E) + 'static,
    ) -> Self {
        Self::new(
            name,
            config,
            Rc::new(super::PlatformConnector),
            Rc::new(super::PlatformTimers),
            url_builder,
            on_event,
        )
    }
}

impl<E: 'static> RealtimeChannel<E> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    /// Called once the connection is established, and again after every
    /// successful reconnect.
    pub fn set_on_open(&self, f: impl Fn() + 'static) {
        *self.inner.on_open.borrow_mut() = Some(Box::new(f));
    }

    pub fn set_on_error(&self, f: impl Fn(ChannelError) + 'static) {
        *self.inner.on_error.borrow_mut() = Some(Box::new(f));
    }

    /// Observe state transitions, e.g. for a connection indicator.
    pub fn set_on_state(&self, f: impl Fn(ConnectionState) + 'static) {
        *self.inner.on_state.borrow_mut() = Some(Box::new(f));
    }

    /// Open the subscription. No-op while a connection attempt is live;
    /// logs and stays idle when no authenticated URL is available, since
    /// callers gate subscribing on their auth state.
    pub fn connect(&self) {
        let state = self.state();
        if state.is_open() || state.is_connecting() {
            log_debug!(
                "channel {}: connect ignored in state {:?}",
                self.inner.name,
                state
            );
            return;
        }
        if (self.inner.url_builder)().is_none() {
            log_warn!(
                "channel {}: no authenticated session, not connecting",
                self.inner.name
            );
            return;
        }
        ChannelInner::apply(&self.inner, ChannelInput::ConnectRequested);
    }

    /// Tear the subscription down. Idempotent; any pending reconnect is
    /// cancelled synchronously, so no timer fires after this returns.
    pub fn disconnect(&self) {
        ChannelInner::apply(&self.inner, ChannelInput::DisconnectRequested);
    }
}

impl<E: 'static> Drop for RealtimeChannel<E> {
    fn drop(&mut self) {
        ChannelInner::apply(&self.inner, ChannelInput::DisconnectRequested);
    }
}

impl<E: 'static> ChannelInner<E> {
    /// Run one input through the state machine and execute its effects.
    /// Borrows are scoped so effects may re-enter `apply`.
    fn apply(inner: &Rc<Self>, input: ChannelInput) {
        let (next, effects) = {
            let state = inner.state.borrow();
            transition(&state, input, &inner.config)
        };
        let changed = {
            let mut state = inner.state.borrow_mut();
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        };
        for effect in effects {
            Self::run(inner, effect);
        }
        if changed {
            if let Some(f) = inner.on_state.borrow().as_ref() {
                f(next);
            }
        }
    }

    fn run(inner: &Rc<Self>, effect: Effect) {
        match effect {
            Effect::OpenTransport => Self::open_transport(inner),
            Effect::CloseTransport { code } => {
                inner.epoch.set(inner.epoch.get() + 1);
                if let Some(transport) = inner.transport.borrow_mut().take() {
                    transport.close(code);
                }
            }
            Effect::CancelRetry => {
                if let Some(timer) = inner.pending_retry.borrow_mut().take() {
                    timer.cancel();
                }
            }
            Effect::ScheduleRetry { delay_ms } => {
                // only one reconnect may be pending at a time
                if let Some(timer) = inner.pending_retry.borrow_mut().take() {
                    timer.cancel();
                }
                log_info!(
                    "channel {}: reconnecting in {}ms",
                    inner.name,
                    delay_ms
                );
                let weak = Rc::downgrade(inner);
                let handle = inner.timers.schedule(
                    delay_ms,
                    Box::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            Self::apply(&inner, ChannelInput::RetryElapsed);
                        }
                    }),
                );
                *inner.pending_retry.borrow_mut() = Some(handle);
            }
            Effect::NotifyOpen => {
                log_info!("channel {}: connected", inner.name);
                if let Some(f) = inner.on_open.borrow().as_ref() {
                    f();
                }
            }
            Effect::NotifyError(err) => {
                log_warn!("channel {}: {}", inner.name, err);
                if let Some(f) = inner.on_error.borrow().as_ref() {
                    f(err);
                }
            }
        }
    }

    fn open_transport(inner: &Rc<Self>) {
        let Some(url) = (inner.url_builder)() else {
            log_warn!(
                "channel {}: session went away, abandoning connection attempt",
                inner.name
            );
            Self::apply(
                inner,
                ChannelInput::TransportClosed {
                    code: CLOSE_ABNORMAL,
                    reason: "no session".into(),
                },
            );
            return;
        };
        let epoch = inner.epoch.get() + 1;
        inner.epoch.set(epoch);
        let sink = Self::sink(inner, epoch);
        match inner.connector.connect(&url, sink) {
            Ok(transport) => {
                *inner.transport.borrow_mut() = Some(transport);
            }
            Err(err) => {
                Self::run(
                    inner,
                    Effect::NotifyError(ChannelError::TransportOpen(err.clone())),
                );
                Self::apply(
                    inner,
                    ChannelInput::TransportClosed {
                        code: CLOSE_ABNORMAL,
                        reason: err,
                    },
                );
            }
        }
    }

    /// Sink handed to a new socket. Callbacks hold a weak reference and the
    /// socket's epoch, so a torn-down channel or a replaced socket cannot
    /// re-enter the state machine.
    fn sink(inner: &Rc<Self>, epoch: u64) -> TransportSink {
        let on_open = Rc::downgrade(inner);
        let on_message = Rc::downgrade(inner);
        let on_close = Rc::downgrade(inner);
        let on_error = Rc::downgrade(inner);
        TransportSink {
            on_open: Rc::new(move || {
                if let Some(inner) = on_open.upgrade().filter(|i| i.epoch.get() == epoch) {
                    Self::apply(&inner, ChannelInput::TransportOpened);
                }
            }),
            on_message: Rc::new(move |text: String| {
                if let Some(inner) = on_message.upgrade().filter(|i| i.epoch.get() == epoch) {
                    inner.handle_frame(&text);
                }
            }),
            on_close: Rc::new(move |code: u16, reason: String| {
                if let Some(inner) = on_close.upgrade().filter(|i| i.epoch.get() == epoch) {
                    inner.transport.borrow_mut().take();
                    Self::apply(&inner, ChannelInput::TransportClosed { code, reason });
                }
            }),
            on_error: Rc::new(move |message: String| {
                if let Some(inner) = on_error.upgrade().filter(|i| i.epoch.get() == epoch) {
                    Self::apply(&inner, ChannelInput::TransportErrored { message });
                }
            }),
        }
    }

    fn handle_frame(&self, text: &str) {
        match (self.parse)(text) {
            Ok(event) => (self.on_event)(event),
            Err(err) => {
                // one bad frame must never take the subscription down
                log_warn!(
                    "channel {}: {}",
                    self.name,
                    ChannelError::MalformedEvent(err)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use studyhall_shared::models::ChatEvent;
    use studyhall_shared::protocol::{CLOSE_FORBIDDEN, CLOSE_NORMAL};

    use super::*;

    #[derive(Default)]
    struct FakeNet {
        sinks: Vec<TransportSink>,
        closes: Vec<u16>,
        attempts: usize,
        fail_connect: bool,
    }

    #[derive(Clone, Default)]
    struct FakeConnector {
        net: Rc<RefCell<FakeNet>>,
    }

    impl FakeConnector {
        fn last_sink(&self) -> TransportSink {
            self.net.borrow().sinks.last().expect("no socket opened").clone()
        }

        fn attempts(&self) -> usize {
            self.net.borrow().attempts
        }

        fn closes(&self) -> Vec<u16> {
            self.net.borrow().closes.clone()
        }
    }

    impl Connector for FakeConnector {
        fn connect(&self, _url: &str, sink: TransportSink) -> Result<Box<dyn Transport>, String> {
            let mut net = self.net.borrow_mut();
            net.attempts += 1;
            if net.fail_connect {
                return Err("connection refused".into());
            }
            net.sinks.push(sink);
            Ok(Box::new(FakeTransport {
                net: self.net.clone(),
            }))
        }
    }

    struct FakeTransport {
        net: Rc<RefCell<FakeNet>>,
    }

    impl Transport for FakeTransport {
        fn close(&self, code: u16) {
            self.net.borrow_mut().closes.push(code);
        }
    }

    type TimerEntry = (Rc<Cell<bool>>, Option<Box<dyn FnOnce()>>);

    #[derive(Clone, Default)]
    struct ManualTimers {
        queue: Rc<RefCell<Vec<TimerEntry>>>,
    }

    impl ManualTimers {
        fn pending(&self) -> usize {
            self.queue
                .borrow()
                .iter()
                .filter(|(cancelled, cb)| !cancelled.get() && cb.is_some())
                .count()
        }

        fn fire_next(&self) {
            let entry = {
                let mut queue = self.queue.borrow_mut();
                queue
                    .iter_mut()
                    .find(|(cancelled, cb)| !cancelled.get() && cb.is_some())
                    .map(|(_, cb)| cb.take())
            };
            if let Some(Some(callback)) = entry {
                callback();
            }
        }
    }

    impl TimerScheduler for ManualTimers {
        fn schedule(&self, _delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
            let cancelled = Rc::new(Cell::new(false));
            self.queue
                .borrow_mut()
                .push((cancelled.clone(), Some(callback)));
            TimerHandle::new(cancelled)
        }
    }

    struct Harness {
        connector: FakeConnector,
        timers: ManualTimers,
        events: Rc<RefCell<Vec<ChatEvent>>>,
        errors: Rc<RefCell<Vec<ChannelError>>>,
        channel: RealtimeChannel<ChatEvent>,
    }

    fn harness_with(config: ReconnectConfig, url: Option<&'static str>) -> Harness {
        let connector = FakeConnector::default();
        let timers = ManualTimers::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let event_log = events.clone();
        let channel = RealtimeChannel::new(
            "chat/7",
            config,
            Rc::new(connector.clone()),
            Rc::new(timers.clone()),
            move || url.map(str::to_string),
            move |event| event_log.borrow_mut().push(event),
        );
        let error_log = errors.clone();
        channel.set_on_error(move |err| error_log.borrow_mut().push(err));
        Harness {
            connector,
            timers,
            events,
            errors,
            channel,
        }
    }

    fn harness() -> Harness {
        harness_with(ReconnectConfig::default(), Some("ws://test/ws/chat/7/"))
    }

    fn open(h: &Harness) -> TransportSink {
        h.channel.connect();
        let sink = h.connector.last_sink();
        (*sink.on_open)();
        sink
    }

    #[test]
    fn connect_reaches_open_through_the_transport() {
        let h = harness();
        h.channel.connect();
        assert_eq!(h.channel.state(), ConnectionState::Connecting);
        (*h.connector.last_sink().on_open)();
        assert_eq!(h.channel.state(), ConnectionState::Open);
        assert_eq!(h.connector.attempts(), 1);
    }

    #[test]
    fn connect_is_a_noop_while_active() {
        let h = harness();
        h.channel.connect();
        h.channel.connect();
        assert_eq!(h.connector.attempts(), 1);
        (*h.connector.last_sink().on_open)();
        h.channel.connect();
        assert_eq!(h.connector.attempts(), 1);
    }

    #[test]
    fn without_a_session_connect_stays_idle() {
        let h = harness_with(ReconnectConfig::default(), None);
        h.channel.connect();
        assert_eq!(h.channel.state(), ConnectionState::Idle);
        assert_eq!(h.connector.attempts(), 0);
    }

    #[test]
    fn events_reach_the_subscriber_in_arrival_order() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_message)(r#"{"type":"message_deleted","id":"m1"}"#.into());
        (*sink.on_message)(r#"{"type":"message_deleted","id":"m2"}"#.into());
        assert_eq!(
            *h.events.borrow(),
            vec![
                ChatEvent::MessageDeleted { id: "m1".into() },
                ChatEvent::MessageDeleted { id: "m2".into() },
            ]
        );
    }

    #[test]
    fn a_malformed_frame_is_dropped_and_the_subscription_survives() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_message)("{definitely not json".into());
        assert_eq!(h.channel.state(), ConnectionState::Open);
        assert!(h.events.borrow().is_empty());
        (*sink.on_message)(r#"{"type":"message_deleted","id":"m3"}"#.into());
        assert_eq!(h.events.borrow().len(), 1);
    }

    #[test]
    fn normal_close_never_reconnects() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_close)(CLOSE_NORMAL, String::new());
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.timers.pending(), 0);
        assert_eq!(h.connector.attempts(), 1);
    }

    #[test]
    fn disconnect_is_idempotent_and_closes_normally() {
        let h = harness();
        open(&h);
        h.channel.disconnect();
        h.channel.disconnect();
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.connector.closes(), vec![CLOSE_NORMAL]);
    }

    #[test]
    fn disconnect_cancels_a_pending_reconnect() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_close)(1006, "connection reset".into());
        assert_eq!(h.channel.state(), ConnectionState::Reconnecting { attempt: 1 });
        assert_eq!(h.timers.pending(), 1);

        h.channel.disconnect();
        assert_eq!(h.timers.pending(), 0);
        h.timers.fire_next();
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.connector.attempts(), 1);
    }

    #[test]
    fn terminal_close_surfaces_and_never_retries() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_close)(CLOSE_FORBIDDEN, "not enrolled".into());
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.timers.pending(), 0);
        assert_eq!(
            *h.errors.borrow(),
            vec![ChannelError::TerminalClose {
                code: CLOSE_FORBIDDEN,
                reason: "not enrolled".into(),
            }]
        );
    }

    #[test]
    fn reconnects_after_an_abnormal_close() {
        let h = harness();
        let sink = open(&h);
        (*sink.on_close)(1006, String::new());
        assert_eq!(h.channel.state(), ConnectionState::Reconnecting { attempt: 1 });

        h.timers.fire_next();
        assert_eq!(h.connector.attempts(), 2);
        (*h.connector.last_sink().on_open)();
        assert_eq!(h.channel.state(), ConnectionState::Open);

        // the failure streak restarts after a successful reconnect
        (*h.connector.last_sink().on_close)(1006, String::new());
        assert_eq!(h.channel.state(), ConnectionState::Reconnecting { attempt: 1 });
    }

    #[test]
    fn retry_budget_exhausts_into_closed_with_one_signal() {
        let h = harness();
        h.channel.connect();
        (*h.connector.last_sink().on_close)(1006, String::new());
        for _ in 0..4 {
            h.timers.fire_next();
            (*h.connector.last_sink().on_close)(1006, String::new());
        }
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.timers.pending(), 0);
        let exhausted: Vec<_> = h
            .errors
            .borrow()
            .iter()
            .filter(|e| matches!(e, ChannelError::ReconnectExhausted { .. }))
            .cloned()
            .collect();
        assert_eq!(
            exhausted,
            vec![ChannelError::ReconnectExhausted { attempts: 5 }]
        );
    }

    #[test]
    fn failed_opens_follow_the_retry_policy() {
        let h = harness();
        h.connector.net.borrow_mut().fail_connect = true;
        h.channel.connect();
        assert_eq!(h.channel.state(), ConnectionState::Reconnecting { attempt: 1 });
        assert!(matches!(
            h.errors.borrow()[0],
            ChannelError::TransportOpen(_)
        ));

        h.connector.net.borrow_mut().fail_connect = false;
        h.timers.fire_next();
        assert_eq!(h.connector.attempts(), 2);
        (*h.connector.last_sink().on_open)();
        assert_eq!(h.channel.state(), ConnectionState::Open);
    }

    #[test]
    fn stale_socket_events_are_ignored_after_disconnect() {
        let h = harness();
        let sink = open(&h);
        h.channel.disconnect();
        (*sink.on_open)();
        (*sink.on_close)(1006, String::new());
        assert_eq!(h.channel.state(), ConnectionState::Closed);
        assert_eq!(h.timers.pending(), 0);
    }

    #[test]
    fn dropping_the_channel_disconnects() {
        let h = harness();
        open(&h);
        let connector = h.connector.clone();
        let timers = h.timers.clone();
        drop(h);
        assert_eq!(connector.closes(), vec![CLOSE_NORMAL]);
        assert_eq!(timers.pending(), 0);
    }
}

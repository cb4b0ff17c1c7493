//! Pure connection state machine.
//!
//! Transport callbacks, timers, and the public API feed [`ChannelInput`]s
//! in; the returned [`Effect`]s are executed by the channel driver.

use studyhall_shared::protocol::{is_terminal_close, CLOSE_NORMAL};

use super::{ChannelError, ConnectionState, ReconnectConfig};

/// One lifecycle stimulus.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelInput {
    ConnectRequested,
    TransportOpened,
    TransportClosed { code: u16, reason: String },
    TransportErrored { message: String },
    RetryElapsed,
    DisconnectRequested,
}

/// Side effects the driver performs after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenTransport,
    CloseTransport { code: u16 },
    ScheduleRetry { delay_ms: u32 },
    CancelRetry,
    NotifyOpen,
    NotifyError(ChannelError),
}

/// Advance the lifecycle by one input.
///
/// Invariants encoded here rather than in the driver:
/// - a normal or terminal close is never retried
/// - `Reconnecting.attempt` counts consecutive failures, and once it
///   reaches `max_attempts` the channel settles in `Closed` with a single
///   `ReconnectExhausted`
/// - closes observed while `Idle` or `Closed` are stale and ignored
pub fn transition(
    state: &ConnectionState,
    input: ChannelInput,
    config: &ReconnectConfig,
) -> (ConnectionState, Vec<Effect>) {
    use self::ConnectionState::*;

    match input {
        ChannelInput::ConnectRequested => match state {
            Idle | Closed => (Connecting, vec![Effect::OpenTransport]),
            _ => (state.clone(), Vec::new()),
        },

        ChannelInput::TransportOpened => match state {
            Connecting | Reconnecting { .. } => (Open, vec![Effect::NotifyOpen]),
            _ => (state.clone(), Vec::new()),
        },

        ChannelInput::TransportClosed { code, reason } => match state {
            Idle | Closed => (state.clone(), Vec::new()),
            _ if code == CLOSE_NORMAL => (Closed, Vec::new()),
            _ if is_terminal_close(code) => (
                Closed,
                vec![Effect::NotifyError(ChannelError::TerminalClose {
                    code,
                    reason,
                })],
            ),
            _ => {
                let failures = match state {
                    Reconnecting { attempt } => attempt + 1,
                    _ => 1,
                };
                if config.max_attempts > 0 && failures >= config.max_attempts {
                    (
                        Closed,
                        vec![Effect::NotifyError(ChannelError::ReconnectExhausted {
                            attempts: failures,
                        })],
                    )
                } else {
                    (
                        Reconnecting { attempt: failures },
                        vec![Effect::ScheduleRetry {
                            delay_ms: config.delay_for_attempt(failures - 1),
                        }],
                    )
                }
            }
        },

        ChannelInput::TransportErrored { message } => match state {
            Idle | Closed => (state.clone(), Vec::new()),
            _ => (
                state.clone(),
                vec![Effect::NotifyError(ChannelError::Transport(message))],
            ),
        },

        ChannelInput::RetryElapsed => match state {
            Reconnecting { .. } => (state.clone(), vec![Effect::OpenTransport]),
            _ => (state.clone(), Vec::new()),
        },

        ChannelInput::DisconnectRequested => match state {
            Idle | Closed => (Closed, Vec::new()),
            _ => (
                Closed,
                vec![
                    Effect::CancelRetry,
                    Effect::CloseTransport { code: CLOSE_NORMAL },
                ],
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use studyhall_shared::protocol::CLOSE_FORBIDDEN;

    use super::*;
    use super::ConnectionState::*;

    fn closed(code: u16) -> ChannelInput {
        ChannelInput::TransportClosed {
            code,
            reason: String::new(),
        }
    }

    fn config() -> ReconnectConfig {
        ReconnectConfig::default()
    }

    #[test]
    fn connect_from_idle_opens_the_transport() {
        let (state, effects) = transition(&Idle, ChannelInput::ConnectRequested, &config());
        assert_eq!(state, Connecting);
        assert_eq!(effects, vec![Effect::OpenTransport]);
    }

    #[test]
    fn connect_is_a_noop_while_active() {
        for state in [Connecting, Open, Reconnecting { attempt: 2 }] {
            let (next, effects) = transition(&state, ChannelInput::ConnectRequested, &config());
            assert_eq!(next, state);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn opening_notifies_and_resets_the_failure_streak() {
        let (state, effects) = transition(
            &Reconnecting { attempt: 3 },
            ChannelInput::TransportOpened,
            &config(),
        );
        assert_eq!(state, Open);
        assert_eq!(effects, vec![Effect::NotifyOpen]);

        // a later drop starts counting from one again
        let (state, _) = transition(&state, closed(1006), &config());
        assert_eq!(state, Reconnecting { attempt: 1 });
    }

    #[test]
    fn normal_close_never_schedules_a_retry() {
        let (state, effects) = transition(&Open, closed(CLOSE_NORMAL), &config());
        assert_eq!(state, Closed);
        assert!(effects.is_empty());

        // and a timer that somehow fires afterwards does nothing
        let (state, effects) = transition(&state, ChannelInput::RetryElapsed, &config());
        assert_eq!(state, Closed);
        assert!(effects.is_empty());
    }

    #[test]
    fn terminal_close_surfaces_and_stops() {
        let (state, effects) = transition(
            &Open,
            ChannelInput::TransportClosed {
                code: CLOSE_FORBIDDEN,
                reason: "not enrolled".into(),
            },
            &config(),
        );
        assert_eq!(state, Closed);
        assert_eq!(
            effects,
            vec![Effect::NotifyError(ChannelError::TerminalClose {
                code: CLOSE_FORBIDDEN,
                reason: "not enrolled".into(),
            })]
        );
    }

    #[test]
    fn abnormal_close_schedules_the_fixed_interval() {
        let (state, effects) = transition(&Open, closed(1006), &config());
        assert_eq!(state, Reconnecting { attempt: 1 });
        assert_eq!(effects, vec![Effect::ScheduleRetry { delay_ms: 3000 }]);
    }

    #[test]
    fn consecutive_failures_exhaust_the_budget_once() {
        let config = config();
        let mut state = Connecting;
        let mut exhausted = 0;
        for _ in 0..config.max_attempts {
            let (next, effects) = transition(&state, closed(1006), &config);
            for effect in &effects {
                match effect {
                    Effect::NotifyError(ChannelError::ReconnectExhausted { .. }) => exhausted += 1,
                    Effect::ScheduleRetry { .. } => {}
                    other => panic!("unexpected effect {other:?}"),
                }
            }
            state = transition(&next, ChannelInput::RetryElapsed, &config).0;
        }
        assert_eq!(state, Closed);
        assert_eq!(exhausted, 1);

        // further closes are stale
        let (state, effects) = transition(&state, closed(1006), &config);
        assert_eq!(state, Closed);
        assert!(effects.is_empty());
    }

    #[test]
    fn disconnect_cancels_retry_and_closes_normally() {
        let (state, effects) = transition(
            &Reconnecting { attempt: 2 },
            ChannelInput::DisconnectRequested,
            &config(),
        );
        assert_eq!(state, Closed);
        assert_eq!(
            effects,
            vec![
                Effect::CancelRetry,
                Effect::CloseTransport { code: CLOSE_NORMAL },
            ]
        );

        // idempotent
        let (state, effects) = transition(&state, ChannelInput::DisconnectRequested, &config());
        assert_eq!(state, Closed);
        assert!(effects.is_empty());
    }

    #[test]
    fn transport_errors_do_not_transition() {
        let (state, effects) = transition(
            &Open,
            ChannelInput::TransportErrored {
                message: "tls hiccup".into(),
            },
            &config(),
        );
        assert_eq!(state, Open);
        assert_eq!(
            effects,
            vec![Effect::NotifyError(ChannelError::Transport(
                "tls hiccup".into()
            ))]
        );
    }

    #[test]
    fn unbounded_policy_keeps_retrying() {
        let config = ReconnectConfig {
            max_attempts: 0,
            ..ReconnectConfig::default()
        };
        let (state, effects) = transition(&Reconnecting { attempt: 99 }, closed(1006), &config);
        assert_eq!(state, Reconnecting { attempt: 100 });
        assert_eq!(effects, vec![Effect::ScheduleRetry { delay_ms: 3000 }]);
    }
}

use thiserror::Error;

use crate::{
    topics::{TOPIC_ALARM_REQUEST, TOPIC_TEMPERATURE},
    types::ConnectionState,
};

/// A connection attempt the broker declined, carrying its last status
/// code. This is a reported value, not a hard failure; the next
/// `ensure_connected` call simply tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("broker refused connection (rc={code})")]
pub struct ConnectError {
    pub code: i32,
}

/// Transport seam between the core and whatever broker client the runtime
/// uses. Both methods are required to be non-blocking: one bounded attempt
/// each, never an internal retry or sleep.
pub trait BrokerSession {
    fn connect(&mut self) -> Result<(), ConnectError>;
    fn subscribe(&mut self, topic: &str) -> bool;
}

/// Outcome of one `ensure_connected` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    AlreadyConnected,
    Connected {
        temperature_ok: bool,
        alarm_ok: bool,
    },
    Failed(i32),
}

/// Owns the broker connection state. Re-attempts happen only when the
/// caller ticks this again; there is no internal backoff timer, so the
/// call cadence is entirely the main loop's decision.
#[derive(Debug, Clone)]
pub struct ConnectivityManager {
    state: ConnectionState,
}

impl ConnectivityManager {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// At most one connection handshake per call. On success the two
    /// inbound subscriptions are (re-)issued and their per-topic outcomes
    /// reported; on failure the broker's status code is reported and the
    /// state stays Disconnected.
    pub fn ensure_connected<S: BrokerSession>(&mut self, session: &mut S) -> LinkStatus {
        if self.state == ConnectionState::Connected {
            return LinkStatus::AlreadyConnected;
        }

        match session.connect() {
            Ok(()) => {
                let temperature_ok = session.subscribe(TOPIC_TEMPERATURE);
                let alarm_ok = session.subscribe(TOPIC_ALARM_REQUEST);
                self.state = ConnectionState::Connected;
                LinkStatus::Connected {
                    temperature_ok,
                    alarm_ok,
                }
            }
            Err(err) => LinkStatus::Failed(err.code),
        }
    }

    /// Called by the runtime when the session drops, so the next
    /// `ensure_connected` attempts a fresh handshake.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSession {
        connect_results: Vec<Result<(), ConnectError>>,
        connect_calls: usize,
        subscribed: Vec<String>,
        fail_subscribe_for: Option<&'static str>,
    }

    impl FakeSession {
        fn new(connect_results: Vec<Result<(), ConnectError>>) -> Self {
            Self {
                connect_results,
                connect_calls: 0,
                subscribed: Vec::new(),
                fail_subscribe_for: None,
            }
        }
    }

    impl BrokerSession for FakeSession {
        fn connect(&mut self) -> Result<(), ConnectError> {
            let result = self.connect_results.remove(0);
            self.connect_calls += 1;
            result
        }

        fn subscribe(&mut self, topic: &str) -> bool {
            if self.fail_subscribe_for == Some(topic) {
                return false;
            }
            self.subscribed.push(topic.to_string());
            true
        }
    }

    #[test]
    fn successful_attempt_subscribes_both_topics() {
        let mut manager = ConnectivityManager::new();
        let mut session = FakeSession::new(vec![Ok(())]);

        let status = manager.ensure_connected(&mut session);

        assert_eq!(
            status,
            LinkStatus::Connected {
                temperature_ok: true,
                alarm_ok: true,
            }
        );
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(
            session.subscribed,
            vec![TOPIC_TEMPERATURE.to_string(), TOPIC_ALARM_REQUEST.to_string()]
        );
    }

    #[test]
    fn failed_attempt_reports_status_code_and_stays_disconnected() {
        let mut manager = ConnectivityManager::new();
        let mut session = FakeSession::new(vec![Err(ConnectError { code: -2 })]);

        let status = manager.ensure_connected(&mut session);

        assert_eq!(status, LinkStatus::Failed(-2));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(session.subscribed.is_empty());
    }

    #[test]
    fn one_attempt_per_call_no_internal_retry() {
        let mut manager = ConnectivityManager::new();
        let mut session =
            FakeSession::new(vec![Err(ConnectError { code: -4 }), Ok(())]);

        let _ = manager.ensure_connected(&mut session);
        assert_eq!(session.connect_calls, 1);

        // The external tick decides when to try again.
        let status = manager.ensure_connected(&mut session);
        assert_eq!(session.connect_calls, 2);
        assert!(matches!(status, LinkStatus::Connected { .. }));
    }

    #[test]
    fn no_attempt_while_already_connected() {
        let mut manager = ConnectivityManager::new();
        let mut session = FakeSession::new(vec![Ok(())]);

        let _ = manager.ensure_connected(&mut session);
        let status = manager.ensure_connected(&mut session);

        assert_eq!(status, LinkStatus::AlreadyConnected);
        assert_eq!(session.connect_calls, 1);
    }

    #[test]
    fn reattempts_after_mark_disconnected() {
        let mut manager = ConnectivityManager::new();
        let mut session = FakeSession::new(vec![Ok(()), Ok(())]);

        let _ = manager.ensure_connected(&mut session);
        manager.mark_disconnected();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        let status = manager.ensure_connected(&mut session);
        assert!(matches!(status, LinkStatus::Connected { .. }));
        assert_eq!(session.connect_calls, 2);
    }

    #[test]
    fn per_topic_subscribe_failure_is_reported() {
        let mut manager = ConnectivityManager::new();
        let mut session = FakeSession::new(vec![Ok(())]);
        session.fail_subscribe_for = Some(TOPIC_ALARM_REQUEST);

        let status = manager.ensure_connected(&mut session);

        assert_eq!(
            status,
            LinkStatus::Connected {
                temperature_ok: true,
                alarm_ok: false,
            }
        );
    }
}

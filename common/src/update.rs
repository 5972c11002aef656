use crate::types::{UpdateErrorKind, UpdateKind, UpdatePhase};

/// Lifecycle event reported by the platform update subsystem. The adapter
/// at that boundary translates its callbacks into these; the coordinator
/// itself only knows "transition on event".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Started(UpdateKind),
    Progress { transferred: u64, total: u64 },
    Finished,
    Failed(UpdateErrorKind),
}

/// What the display should show in response to an event. One indication
/// per event; progress is re-rendered on every report, not rate-limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateIndication {
    Begin(UpdateKind),
    Progress(u8),
    Done,
    Error(&'static str),
}

/// Firmware-update state machine. While a transfer is in flight it owns
/// the shared display/indicator; `DeviceCore` checks `is_busy` and keeps
/// the alarm engine off the hardware until the update ends either way.
#[derive(Debug, Clone)]
pub struct UpdateCoordinator {
    phase: UpdatePhase,
    last_error: Option<UpdateErrorKind>,
}

impl UpdateCoordinator {
    pub fn new() -> Self {
        Self {
            phase: UpdatePhase::Idle,
            last_error: None,
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Error that aborted the most recent attempt, if any. A failure never
    /// poisons future attempts; the next `Started` proceeds normally.
    pub fn last_error(&self) -> Option<UpdateErrorKind> {
        self.last_error
    }

    pub fn handle_event(&mut self, event: UpdateEvent) -> Option<UpdateIndication> {
        match event {
            UpdateEvent::Started(kind) => {
                self.phase = UpdatePhase::Starting(kind);
                Some(UpdateIndication::Begin(kind))
            }
            UpdateEvent::Progress { transferred, total } => {
                let percent = progress_percent(transferred, total);
                self.phase = UpdatePhase::InProgress(percent);
                Some(UpdateIndication::Progress(percent))
            }
            UpdateEvent::Finished => {
                // The device restarts right after this; Completed is
                // terminal for the remainder of this boot.
                self.phase = UpdatePhase::Completed;
                Some(UpdateIndication::Done)
            }
            UpdateEvent::Failed(kind) => {
                self.phase = UpdatePhase::Idle;
                self.last_error = Some(kind);
                Some(UpdateIndication::Error(kind.as_str()))
            }
        }
    }
}

impl Default for UpdateCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion percentage clamped to 0..=100. Uses floating-point division
/// so small transfers (total below 100 bytes, or zero) cannot divide by
/// zero the way naive integer bucketing would.
fn progress_percent(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((transferred as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_lifecycle_renders_begin_progress_done() {
        let mut coordinator = UpdateCoordinator::new();

        assert_eq!(
            coordinator.handle_event(UpdateEvent::Started(UpdateKind::Firmware)),
            Some(UpdateIndication::Begin(UpdateKind::Firmware))
        );
        assert!(coordinator.is_busy());

        assert_eq!(
            coordinator.handle_event(UpdateEvent::Progress {
                transferred: 50,
                total: 100,
            }),
            Some(UpdateIndication::Progress(50))
        );
        assert_eq!(coordinator.phase(), UpdatePhase::InProgress(50));

        assert_eq!(
            coordinator.handle_event(UpdateEvent::Finished),
            Some(UpdateIndication::Done)
        );
        assert_eq!(coordinator.phase(), UpdatePhase::Completed);
        assert!(!coordinator.is_busy());
    }

    #[test]
    fn every_progress_report_is_rendered() {
        let mut coordinator = UpdateCoordinator::new();
        coordinator.handle_event(UpdateEvent::Started(UpdateKind::Filesystem));

        for transferred in [10u64, 10, 11] {
            let indication = coordinator.handle_event(UpdateEvent::Progress {
                transferred,
                total: 100,
            });
            assert!(matches!(indication, Some(UpdateIndication::Progress(_))));
        }
    }

    #[test]
    fn failure_renders_fixed_string_and_returns_to_idle() {
        let mut coordinator = UpdateCoordinator::new();
        coordinator.handle_event(UpdateEvent::Started(UpdateKind::Firmware));

        let indication =
            coordinator.handle_event(UpdateEvent::Failed(UpdateErrorKind::ConnectFailed));

        assert_eq!(indication, Some(UpdateIndication::Error("Connect Failed")));
        assert_eq!(coordinator.phase(), UpdatePhase::Idle);
        assert_eq!(
            coordinator.last_error(),
            Some(UpdateErrorKind::ConnectFailed)
        );
    }

    #[test]
    fn failure_does_not_poison_the_next_attempt() {
        let mut coordinator = UpdateCoordinator::new();
        coordinator.handle_event(UpdateEvent::Started(UpdateKind::Firmware));
        coordinator.handle_event(UpdateEvent::Failed(UpdateErrorKind::ReceiveFailed));

        assert_eq!(
            coordinator.handle_event(UpdateEvent::Started(UpdateKind::Firmware)),
            Some(UpdateIndication::Begin(UpdateKind::Firmware))
        );
        assert!(coordinator.is_busy());
    }

    #[test]
    fn all_error_kinds_map_to_fixed_strings() {
        let expected = [
            (UpdateErrorKind::AuthenticationFailed, "Auth Failed"),
            (UpdateErrorKind::BeginFailed, "Begin Failed"),
            (UpdateErrorKind::ConnectFailed, "Connect Failed"),
            (UpdateErrorKind::ReceiveFailed, "Receive Failed"),
            (UpdateErrorKind::EndFailed, "End Failed"),
        ];
        for (kind, text) in expected {
            assert_eq!(kind.as_str(), text);
        }
    }

    #[test]
    fn small_totals_do_not_panic() {
        let mut coordinator = UpdateCoordinator::new();
        coordinator.handle_event(UpdateEvent::Started(UpdateKind::Firmware));

        // total below 100 bytes: exact value is a convention, absence of a
        // divide-by-zero is the contract.
        let indication = coordinator.handle_event(UpdateEvent::Progress {
            transferred: 25,
            total: 50,
        });
        assert_eq!(indication, Some(UpdateIndication::Progress(50)));

        let indication = coordinator.handle_event(UpdateEvent::Progress {
            transferred: 25,
            total: 0,
        });
        assert_eq!(indication, Some(UpdateIndication::Progress(0)));
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(progress_percent(200, 100), 100);
        assert_eq!(progress_percent(0, 100), 0);
        assert_eq!(progress_percent(100, 100), 100);
    }
}

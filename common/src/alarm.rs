use crate::{config::AlarmConfig, types::AlarmState};

/// Actuation requests produced by the engine. The runtime owns the actual
/// buzzer GPIO and RGB indicator and executes these in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    BuzzerOn,
    BuzzerOff,
    IndicatorOn,
    IndicatorClear,
}

/// Alarm state machine. Active/Inactive transitions come from validated
/// broker commands only; the blinking cadence comes from `tick`, which the
/// caller is expected to invoke frequently (there are no timer interrupts
/// in the execution model, so the period is re-evaluated every call).
#[derive(Debug, Clone)]
pub struct AlarmEngine {
    state: AlarmState,
    toggle_on: bool,
    last_toggle_ms: u64,
    toggle_period_ms: u64,
}

impl AlarmEngine {
    pub fn new(mut config: AlarmConfig) -> Self {
        config.sanitize();
        Self {
            state: AlarmState::Inactive,
            toggle_on: false,
            last_toggle_ms: 0,
            toggle_period_ms: config.toggle_period_ms,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == AlarmState::Active
    }

    pub fn toggle_on(&self) -> bool {
        self.toggle_on
    }

    /// Arms the alarm and restarts the toggle timer at `now_ms`. The first
    /// audible/visible pulse happens one full period later; activation
    /// itself drives nothing.
    pub fn activate(&mut self, now_ms: u64) -> Vec<AlarmAction> {
        self.state = AlarmState::Active;
        self.last_toggle_ms = now_ms;
        Vec::new()
    }

    /// Disarms the alarm and forces both outputs to their rest state. The
    /// clear actions are returned unconditionally so the runtime commits
    /// them synchronously rather than waiting for the next tick.
    pub fn deactivate(&mut self) -> Vec<AlarmAction> {
        self.state = AlarmState::Inactive;
        self.toggle_on = false;
        vec![AlarmAction::BuzzerOff, AlarmAction::IndicatorClear]
    }

    /// Advances the blink/beep cadence. No-op while Inactive; while Active,
    /// flips the outputs once per toggle period and otherwise leaves them
    /// alone.
    pub fn tick(&mut self, now_ms: u64) -> Vec<AlarmAction> {
        if self.state != AlarmState::Active {
            return Vec::new();
        }

        if now_ms.saturating_sub(self.last_toggle_ms) < self.toggle_period_ms {
            return Vec::new();
        }

        self.toggle_on = !self.toggle_on;
        self.last_toggle_ms = now_ms;

        if self.toggle_on {
            vec![AlarmAction::BuzzerOn, AlarmAction::IndicatorOn]
        } else {
            vec![AlarmAction::BuzzerOff, AlarmAction::IndicatorClear]
        }
    }
}

impl Default for AlarmEngine {
    fn default() -> Self {
        Self::new(AlarmConfig::default())
    }
}

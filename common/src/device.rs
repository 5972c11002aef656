use crate::{
    alarm::{AlarmAction, AlarmEngine},
    config::AlarmConfig,
    topics::{TOPIC_ALARM_REQUEST, TOPIC_TEMPERATURE},
    types::AlarmCommand,
    update::{UpdateCoordinator, UpdateEvent, UpdateIndication},
};

/// Maps an alarm-request payload onto a command. Matching is exact and
/// case-sensitive; the literal sets are a wire compatibility contract, so
/// `"ON"` or `"2"` fall through to None and are silently dropped.
pub fn parse_alarm_command(payload: &str) -> Option<AlarmCommand> {
    match payload {
        "on" | "1" | "true" => Some(AlarmCommand::Activate),
        "off" | "0" | "false" => Some(AlarmCommand::Deactivate),
        _ => None,
    }
}

/// The device context: one struct owning everything the router, the alarm
/// engine, and the update coordinator mutate, passed by reference into
/// every entry point. All calls run to completion on the single logical
/// thread of control, so none of this needs interior locking.
#[derive(Debug, Clone, Default)]
pub struct DeviceCore {
    alarm: AlarmEngine,
    update: UpdateCoordinator,
    temperature: String,
}

impl DeviceCore {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            alarm: AlarmEngine::new(config),
            update: UpdateCoordinator::new(),
            temperature: String::new(),
        }
    }

    pub fn alarm(&self) -> &AlarmEngine {
        &self.alarm
    }

    pub fn update(&self) -> &UpdateCoordinator {
        &self.update
    }

    /// Last payload received on the temperature topic, verbatim. Cached
    /// display data only; control logic never reads it.
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    /// Routes one inbound broker message. Pure dispatch: the returned
    /// actions (only deactivation produces any) are for the caller to
    /// commit to the actuation sink immediately.
    pub fn handle_message(&mut self, topic: &str, payload: &str, now_ms: u64) -> Vec<AlarmAction> {
        match topic {
            TOPIC_TEMPERATURE => {
                // Unvalidated by design; whatever the feed sends is what
                // the display shows.
                self.temperature = payload.to_string();
                Vec::new()
            }
            TOPIC_ALARM_REQUEST => match parse_alarm_command(payload) {
                Some(AlarmCommand::Activate) => self.alarm.activate(now_ms),
                Some(AlarmCommand::Deactivate) => self.alarm.deactivate(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// One cooperative tick. While an update is in flight the coordinator
    /// owns the display/indicator, so the alarm cadence is held off until
    /// the update ends or fails.
    pub fn tick(&mut self, now_ms: u64) -> Vec<AlarmAction> {
        if self.update.is_busy() {
            return Vec::new();
        }
        self.alarm.tick(now_ms)
    }

    pub fn handle_update_event(&mut self, event: UpdateEvent) -> Option<UpdateIndication> {
        self.update.handle_event(event)
    }
}

pub const TOPIC_TEMPERATURE: &str = "homeassistant/bresser61/Temperature0";
pub const TOPIC_ALARM_REQUEST: &str = "alarmclock/alarmrequest";

// Reserved for acknowledging alarm requests back to the broker. Declared so
// both ends agree on the name; nothing publishes to it yet.
pub const TOPIC_ALARM_CONFIRM: &str = "alarmclock/alarmconfirm";

pub mod alarm;
pub mod config;
pub mod device;
pub mod link;
pub mod topics;
pub mod types;
pub mod update;

pub use alarm::{AlarmAction, AlarmEngine};
pub use config::{AlarmConfig, BrokerConfig, RuntimeConfig};
pub use device::{parse_alarm_command, DeviceCore};
pub use link::{BrokerSession, ConnectError, ConnectivityManager, LinkStatus};
pub use topics::*;
pub use types::{
    AlarmCommand, AlarmState, ConnectionState, UpdateErrorKind, UpdateKind, UpdatePhase,
};
pub use update::{UpdateCoordinator, UpdateEvent, UpdateIndication};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connected => "CONNECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmState {
    Inactive,
    Active,
}

impl AlarmState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
        }
    }
}

/// Normalized form of an alarm-request payload. Anything that does not map
/// to one of these is dropped by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCommand {
    Activate,
    Deactivate,
}

/// What an in-flight update is replacing. Display-only distinction; both
/// kinds behave identically otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Firmware,
    Filesystem,
}

impl UpdateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firmware => "firmware",
            Self::Filesystem => "filesystem",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateErrorKind {
    AuthenticationFailed,
    BeginFailed,
    ConnectFailed,
    ReceiveFailed,
    EndFailed,
}

impl UpdateErrorKind {
    /// Fixed human-readable strings rendered on the device display.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "Auth Failed",
            Self::BeginFailed => "Begin Failed",
            Self::ConnectFailed => "Connect Failed",
            Self::ReceiveFailed => "Receive Failed",
            Self::EndFailed => "End Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdatePhase {
    Idle,
    Starting(UpdateKind),
    InProgress(u8),
    Completed,
    Failed(UpdateErrorKind),
}

impl UpdatePhase {
    /// True while the coordinator holds the shared display/indicator.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Starting(_) | Self::InProgress(_))
    }
}

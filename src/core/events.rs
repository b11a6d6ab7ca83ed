// src/core/events.rs

//! Alarm/event reporting surface.
//!
//! The daemon raises alarms rather than returning errors for anything that
//! is a node-maintenance condition rather than a programming bug. The wire
//! format of the alarm backend is out of scope; `AlarmSink` is the seam.

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEvent {
    MnfaEnter { iface: String, host_count: u32 },
    MnfaExit { iface: String, forced: bool },
    HostFailed { hostname: String },
    HostDegraded { hostname: String, reason: String },
    HostAvailable { hostname: String },
    BmcLost { hostname: String },
    BmcRestored { hostname: String },
    AutoRecoveryDisabled { hostname: String, action: String },
}

pub trait AlarmSink: Send + Sync {
    fn raise(&self, event: AlarmEvent);
}

/// Default sink used when no external alarm manager is wired in: logs at
/// `warn` so the condition is still visible in the daemon's own log stream.
#[derive(Debug, Default)]
pub struct LoggingAlarmSink;

impl AlarmSink for LoggingAlarmSink {
    fn raise(&self, event: AlarmEvent) {
        match event {
            AlarmEvent::MnfaEnter { iface, host_count } => {
                warn!(iface, host_count, "MNFA entered");
            }
            AlarmEvent::MnfaExit { iface, forced } => {
                warn!(iface, forced, "MNFA exited");
            }
            AlarmEvent::HostFailed { hostname } => {
                warn!(hostname, "host failed");
            }
            AlarmEvent::HostDegraded { hostname, reason } => {
                warn!(hostname, reason, "host degraded");
            }
            AlarmEvent::HostAvailable { hostname } => {
                warn!(hostname, "host available");
            }
            AlarmEvent::BmcLost { hostname } => {
                warn!(hostname, "BMC access lost");
            }
            AlarmEvent::BmcRestored { hostname } => {
                warn!(hostname, "BMC access restored");
            }
            AlarmEvent::AutoRecoveryDisabled { hostname, action } => {
                warn!(hostname, action, "auto recovery disabled");
            }
        }
    }
}

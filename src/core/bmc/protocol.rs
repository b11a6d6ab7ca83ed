// src/core/bmc/protocol.rs

//! Protocol selection and the two verb tables.
//!
//! Grounded on `mtce-common/src/common/bmcUtil.cpp`: `bmcUtil_request_str_array`
//! (one label per `BMC_THREAD_CMD`, used only for logging) and
//! `bmcUtil_action_str_array` (present-participle form, e.g. "power
//! cycling", used in the task string). The original's `bmcUtil_getAction_str`
//! indexes the request array by mistake (`spec.md` §9 Open Questions); this
//! implementation keeps the two tables distinct and correctly indexed.

use crate::core::bmc::types::BmcCommand;
use crate::core::node::types::{ActionVerbSlot, Protocol};

pub fn request_label(cmd: BmcCommand) -> &'static str {
    match cmd {
        BmcCommand::PowerReset => "Power-Reset",
        BmcCommand::PowerOn => "Power-On",
        BmcCommand::PowerOff => "Power-Off",
        BmcCommand::PowerCycle => "Power-Cycle",
        BmcCommand::BmcQuery => "BMC-Query",
        BmcCommand::BmcInfo => "BMC-Info",
        BmcCommand::PowerStatus => "Power-Status",
        BmcCommand::RestartCause => "Restart-Cause",
        BmcCommand::BootDevPxe => "Boot-Dev-PXE",
        BmcCommand::ReadSensors => "Read-Sensors",
    }
}

pub fn action_verb(cmd: BmcCommand) -> &'static str {
    match cmd {
        BmcCommand::PowerReset => "resetting",
        BmcCommand::PowerOn => "powering on",
        BmcCommand::PowerOff => "powering off",
        BmcCommand::PowerCycle => "power cycling",
        BmcCommand::BmcQuery => "querying",
        BmcCommand::BmcInfo => "gathering info from",
        BmcCommand::PowerStatus => "checking power status of",
        BmcCommand::RestartCause => "querying restart cause of",
        BmcCommand::BootDevPxe => "setting PXE boot device on",
        BmcCommand::ReadSensors => "reading sensors of",
    }
}

/// Fixed ipmi verb table: ipmitool's verbs never vary by board.
pub fn ipmi_verbs() -> (ActionVerbSlot, ActionVerbSlot, ActionVerbSlot) {
    (
        ActionVerbSlot {
            graceful: Some("chassis power reset".to_string()),
            immediate: Some("chassis power cycle".to_string()),
        },
        ActionVerbSlot {
            graceful: Some("chassis power on".to_string()),
            immediate: Some("chassis power on".to_string()),
        },
        ActionVerbSlot {
            graceful: Some("chassis power soft".to_string()),
            immediate: Some("chassis power off".to_string()),
        },
    )
}

/// Outcome of the root capability probe used to decide redfish vs ipmi.
/// Parsed straight from the `BmcQuery` result payload.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RootQueryResponse {
    pub redfish_version: Option<String>,
    pub actions_graceful_reset: Option<String>,
    pub actions_immediate_reset: Option<String>,
}

/// `spec.md` §4.2 protocol selection, step 2-3: adopt redfish if the
/// declared version meets the configured minimum major.minor, else fall
/// back to ipmi with its fixed verb table.
pub fn select_protocol(
    probe: Option<&RootQueryResponse>,
    min_major: u32,
    min_minor: u32,
) -> (Protocol, ActionVerbSlot, ActionVerbSlot, ActionVerbSlot) {
    if let Some(probe) = probe {
        if let Some(version) = &probe.redfish_version {
            if let Some((major, minor)) = parse_version(version) {
                if major > min_major || (major == min_major && minor >= min_minor) {
                    let reset = ActionVerbSlot {
                        graceful: probe.actions_graceful_reset.clone(),
                        immediate: probe.actions_immediate_reset.clone(),
                    };
                    let poweron = ActionVerbSlot {
                        graceful: Some("On".to_string()),
                        immediate: Some("On".to_string()),
                    };
                    let poweroff = ActionVerbSlot {
                        graceful: Some("GracefulShutdown".to_string()),
                        immediate: Some("ForceOff".to_string()),
                    };
                    return (Protocol::Redfish, reset, poweron, poweroff);
                }
            }
        }
    }
    let (reset, poweron, poweroff) = ipmi_verbs();
    (Protocol::Ipmi, reset, poweron, poweroff)
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// For reset/power-on/power-off, pick the verb the FSM should use: graceful
/// for normal lifecycle transitions, immediate for fault recovery. Warns
/// (returns `None` is handled by the caller) if the preferred verb is
/// unavailable but the other is, errors if neither is cached.
pub fn pick_verb(slot: &ActionVerbSlot, command: BmcCommand) -> Option<&str> {
    if slot.is_empty() {
        return None;
    }
    if command.is_fault_recovery() {
        slot.immediate.as_deref().or(slot.graceful.as_deref())
    } else {
        slot.graceful.as_deref().or(slot.immediate.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_redfish_when_version_meets_minimum() {
        let probe = RootQueryResponse {
            redfish_version: Some("1.0.1".to_string()),
            actions_graceful_reset: Some("GracefulRestart".to_string()),
            actions_immediate_reset: Some("ForceRestart".to_string()),
        };
        let (protocol, reset, _, _) = select_protocol(Some(&probe), 1, 0);
        assert_eq!(protocol, Protocol::Redfish);
        assert_eq!(reset.graceful.as_deref(), Some("GracefulRestart"));
    }

    #[test]
    fn falls_back_to_ipmi_on_probe_error() {
        let (protocol, reset, _, _) = select_protocol(None, 1, 0);
        assert_eq!(protocol, Protocol::Ipmi);
        assert!(reset.graceful.is_some());
    }

    #[test]
    fn falls_back_to_ipmi_below_minimum_version() {
        let probe = RootQueryResponse {
            redfish_version: Some("0.9.0".to_string()),
            actions_graceful_reset: None,
            actions_immediate_reset: None,
        };
        let (protocol, _, _, _) = select_protocol(Some(&probe), 1, 0);
        assert_eq!(protocol, Protocol::Ipmi);
    }

    #[test]
    fn action_and_request_tables_stay_distinct() {
        assert_ne!(
            request_label(BmcCommand::PowerCycle),
            action_verb(BmcCommand::PowerCycle)
        );
    }
}

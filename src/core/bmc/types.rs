// src/core/bmc/types.rs

//! Request/result objects the BMC worker pool exchanges with the main
//! loop. Workers never touch node records directly (`spec.md` §4.2
//! "threading discipline"); they read an immutable `BmcRequest` and write a
//! `BmcResult`.

use crate::core::node::types::Protocol;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum BmcCommand {
    PowerReset,
    PowerOn,
    PowerOff,
    PowerCycle,
    BmcQuery,
    BmcInfo,
    PowerStatus,
    RestartCause,
    BootDevPxe,
    ReadSensors,
}

impl BmcCommand {
    /// `true` for actions the FSM drives with the *immediate* verb variant
    /// instead of *graceful* (fault recovery, not normal lifecycle).
    pub fn is_fault_recovery(self) -> bool {
        matches!(self, BmcCommand::PowerReset | BmcCommand::PowerCycle)
    }
}

#[derive(Debug, Clone)]
pub struct BmcRequest {
    pub id: Uuid,
    pub hostname: String,
    pub bmc_ip: String,
    pub bmc_username: String,
    pub protocol: Protocol,
    pub command: BmcCommand,
    /// Path to the ephemeral credential file the worker passes as the
    /// tool's credential argument. Created by the executor just before
    /// dispatch, removed after the result is reaped (`spec.md` §4.2).
    pub credential_path: std::path::PathBuf,
}

#[derive(Debug, Clone)]
pub enum BmcOutcome {
    Success { payload: Option<String> },
    ProtocolDowngraded,
    Transient(String),
    Fatal(String),
    /// The FSM moved on before the worker finished; result is discarded.
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct BmcResult {
    pub request_id: Uuid,
    pub hostname: String,
    pub command: BmcCommand,
    pub outcome: BmcOutcome,
}

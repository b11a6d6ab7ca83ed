// src/core/node/record.rs

//! The node record and its per-handler stage enums.
//!
//! Ported from the original's `nodeLinkClass` per-node fields
//! (`mtcNodeFsm.cpp`, `mtcNodeHdlrs.h`): stage counters are now distinct
//! Rust enums (one per action handler) instead of an integer compared
//! against `#define`d stage constants.

use crate::core::bmc::types::{BmcCommand, BmcRequest};
use crate::core::node::types::*;
use crate::core::secret::SecretFetcher;
use crate::core::timer::Timer;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnableStage {
    #[default]
    Start,
    RetryWait,
    IntestStart,
    HeartbeatCheck,
    HeartbeatWait,
    StateChange,
    GoenabledCheck,
    GoenabledWait,
    HostServicesStart,
    HostServicesWait,
    ConfigCheck,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisableStage {
    #[default]
    Start,
    HostServicesStop,
    HostServicesWait,
    StateChange,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryStage {
    #[default]
    Start,
    BmcRequestWait,
    RebootWait,
    EnableWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetStage {
    #[default]
    Start,
    BmcRequestWait,
    ResetWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebootStage {
    #[default]
    Start,
    BmcRequestWait,
    RebootWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerStage {
    #[default]
    Start,
    BmcRequestWait,
    PowerWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReinstallStage {
    #[default]
    Start,
    BmcRequestWait,
    InstallWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwactStage {
    #[default]
    Start,
    PreSwactWait,
    SwactRequest,
    SwactWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigStage {
    #[default]
    Start,
    RequestWait,
    Done,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddStage {
    #[default]
    Start,
    ProvisionWait,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteStage {
    #[default]
    Start,
    DriveOosWait,
    Done,
}

/// Per-action stage counters. The invariant from `spec.md` §3 is that
/// exactly one `adminAction` is in flight: re-issuing the same action
/// coalesces (no stage reset), a different action resets only that new
/// action's stage and leaves the others at their default/idle value.
#[derive(Debug, Clone, Default)]
pub struct Stages {
    pub enable: EnableStage,
    pub disable: DisableStage,
    pub recovery: RecoveryStage,
    pub reset: ResetStage,
    pub reboot: RebootStage,
    pub power: PowerStage,
    pub reinstall: ReinstallStage,
    pub swact: SwactStage,
    pub config: ConfigStage,
    pub add: AddStage,
    pub delete: DeleteStage,
}

#[derive(Debug, Clone, Default)]
pub struct HeartbeatState {
    pub hbs_minor: HashMap<Iface, bool>,
    pub hbs_minor_count: HashMap<Iface, u32>,
}

impl HeartbeatState {
    pub fn is_minor(&self, iface: Iface) -> bool {
        *self.hbs_minor.get(&iface).unwrap_or(&false)
    }

    pub fn set_minor(&mut self, iface: Iface, value: bool) {
        self.hbs_minor.insert(iface, value);
    }
}

#[derive(Debug, Clone, Default)]
pub struct BmcState {
    pub protocol_resolved: Option<Protocol>,
    pub connected: bool,
    pub was_connected: bool,
    pub powered_on: bool,
    pub reset_verbs: ActionVerbSlot,
    pub poweron_verbs: ActionVerbSlot,
    pub poweroff_verbs: ActionVerbSlot,
    pub last_query_secs: Option<u64>,
    /// Set once a `BmcCommand` is in flight for this node, cleared when the
    /// daemon tick reaps its result. Stops a handler's `BmcRequestWait`
    /// stage from resubmitting the same command on every tick.
    pub request_in_flight: bool,
    /// Set while a `BmcQuery` protocol-discovery request is outstanding,
    /// independent of `request_in_flight` since discovery runs from
    /// `bmc_handler` rather than an action handler.
    pub protocol_query_in_flight: bool,
    /// Two-stage password fetch gating BMC commands that need a
    /// credential; lazily constructed once `bmc_ip` is known
    /// (`core::node::handlers::bmc_handler`).
    pub secret: Option<SecretFetcher>,
}

impl BmcState {
    /// `true` when nothing is blocking a new BMC command from being
    /// submitted: no request already in flight, and the secret fetcher (if
    /// one exists yet) has a usable payload.
    pub fn ready_to_submit(&self) -> bool {
        !self.request_in_flight && self.secret.as_ref().map(SecretFetcher::ready).unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub hostname: String,
    pub uuid: Uuid,
    pub mgmt_ip: String,
    pub cluster_host_ip: String,
    pub bmc_ip: Option<String>,
    pub bmc_username: Option<String>,
    pub bmc_protocol: Protocol,

    pub admin_state: AdminState,
    pub oper_state: OperState,
    pub avail_status: AvailStatus,
    pub admin_action: AdminAction,

    pub stages: Stages,
    pub heartbeat: HeartbeatState,

    pub mnfa_graceful_recovery: bool,
    pub degrade_mask: DegradeMask,
    pub bmc: BmcState,

    pub task: Task,
    pub clear_task: bool,
    /// Set by the inventory reconcile path to request an install/change
    /// password pass (`spec.md` §4.4 step 10), independent of `adminAction`.
    pub config_action_pending: bool,

    pub ar_disabled: bool,
    pub recovery_attempts: u32,
    /// Shared by whichever handler currently owns the in-flight action;
    /// invariant 1 guarantees only one action is in flight per node.
    pub stage_timer: Timer,

    /// Set when a power-cycle is in flight, gating the auto-poweron escape
    /// hatch in the dispatch table (`spec.md` §4.4 row 9,
    /// `SPEC_FULL.md` §4.4).
    pub powercycle_in_progress: bool,

    /// Periodic in-service/out-of-service test cadence, independent of the
    /// action stage timer since insv-test/oos-test run concurrently with
    /// (or instead of) an action handler.
    pub test_timer: Timer,
    /// Consecutive audit passes the online handler has observed a
    /// heartbeat, before promoting `offline -> online`; debounces flapping.
    pub online_debounce: u32,
}

impl NodeRecord {
    pub fn new(hostname: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            hostname: hostname.into(),
            uuid,
            mgmt_ip: String::new(),
            cluster_host_ip: String::new(),
            bmc_ip: None,
            bmc_username: None,
            bmc_protocol: Protocol::Dynamic,
            admin_state: AdminState::Locked,
            oper_state: OperState::Disabled,
            avail_status: AvailStatus::Offline,
            admin_action: AdminAction::None,
            stages: Stages::default(),
            heartbeat: HeartbeatState::default(),
            mnfa_graceful_recovery: false,
            degrade_mask: DegradeMask::empty(),
            bmc: BmcState::default(),
            task: Task::None,
            clear_task: false,
            config_action_pending: false,
            ar_disabled: false,
            recovery_attempts: 0,
            stage_timer: Timer::new(),
            powercycle_in_progress: false,
            test_timer: Timer::new(),
            online_debounce: 0,
        }
    }

    /// Builds a `BmcRequest` for `command` against this node's cached BMC
    /// address/credentials, or `None` if it has no BMC configured at all.
    /// Uses the resolved protocol once `bmc_handler` has discovered one,
    /// falling back to `bmc_protocol` (typically `Dynamic`) before then.
    pub fn bmc_request(&self, command: BmcCommand) -> Option<BmcRequest> {
        let bmc_ip = self.bmc_ip.clone()?;
        let bmc_username = self.bmc_username.clone().unwrap_or_default();
        Some(BmcRequest {
            id: Uuid::new_v4(),
            hostname: self.hostname.clone(),
            bmc_ip,
            bmc_username,
            protocol: self.bmc.protocol_resolved.unwrap_or(self.bmc_protocol),
            command,
            credential_path: std::path::PathBuf::new(),
        })
    }

    pub fn is_in_service(&self) -> bool {
        self.admin_state == AdminState::Unlocked
            && self.oper_state == OperState::Enabled
            && matches!(self.avail_status, AvailStatus::Available | AvailStatus::Degraded)
    }

    pub fn is_out_of_service(&self) -> bool {
        self.admin_state == AdminState::Locked
            && self.oper_state == OperState::Disabled
            && matches!(
                self.avail_status,
                AvailStatus::Offline
                    | AvailStatus::Online
                    | AvailStatus::Offduty
                    | AvailStatus::PoweredOff
            )
    }

    /// Invariant 2: `available` implies `degrade_mask == 0`.
    pub fn set_available(&mut self) {
        debug_assert!(self.avail_status != AvailStatus::Available || self.degrade_mask.is_empty());
        self.avail_status = AvailStatus::Available;
        self.degrade_mask = DegradeMask::empty();
    }

    pub fn set_task(&mut self, task: Task) {
        self.task = task;
    }

    pub fn maybe_clear_task(&mut self) {
        if self.clear_task {
            self.task = Task::None;
            self.clear_task = false;
        }
    }

    /// Assigns a new admin action, resetting only that action's own stage.
    /// Re-issuing the same action is coalesced (no reset) per invariant 1.
    pub fn set_admin_action(&mut self, action: AdminAction) {
        if self.admin_action == action {
            return;
        }
        self.admin_action = action;
        match action {
            AdminAction::Unlock | AdminAction::Enable | AdminAction::EnableSubf => {
                // Admin intent applies immediately; oper/avail lag behind
                // until the enable handler finishes its stages.
                self.admin_state = AdminState::Unlocked;
                self.stages.enable = EnableStage::Start;
            }
            AdminAction::Lock | AdminAction::ForceLock => {
                self.admin_state = AdminState::Locked;
                self.stages.disable = DisableStage::Start;
            }
            AdminAction::Recover => {
                self.stages.recovery = RecoveryStage::Start;
            }
            AdminAction::Reset => {
                self.stages.reset = ResetStage::Start;
            }
            AdminAction::Reboot => {
                self.stages.reboot = RebootStage::Start;
            }
            AdminAction::Poweron | AdminAction::Poweroff | AdminAction::Powercycle => {
                self.stages.power = PowerStage::Start;
            }
            AdminAction::Reinstall => {
                self.stages.reinstall = ReinstallStage::Start;
            }
            AdminAction::Swact | AdminAction::ForceSwact => {
                self.stages.swact = SwactStage::Start;
            }
            AdminAction::Add => {
                self.stages.add = AddStage::Start;
            }
            AdminAction::Delete => {
                self.stages.delete = DeleteStage::Start;
            }
            AdminAction::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_service_requires_full_triple() {
        let mut n = NodeRecord::new("compute-0", Uuid::new_v4());
        assert!(!n.is_in_service());
        n.admin_state = AdminState::Unlocked;
        n.oper_state = OperState::Enabled;
        n.avail_status = AvailStatus::Available;
        assert!(n.is_in_service());
        n.avail_status = AvailStatus::Degraded;
        assert!(n.is_in_service());
        n.avail_status = AvailStatus::Failed;
        assert!(!n.is_in_service());
    }

    #[test]
    fn same_action_reissue_is_coalesced() {
        let mut n = NodeRecord::new("compute-0", Uuid::new_v4());
        n.set_admin_action(AdminAction::Unlock);
        n.stages.enable = EnableStage::GoenabledWait;
        n.set_admin_action(AdminAction::Unlock);
        assert_eq!(n.stages.enable, EnableStage::GoenabledWait);
    }

    #[test]
    fn different_action_resets_only_its_own_stage() {
        let mut n = NodeRecord::new("compute-0", Uuid::new_v4());
        n.set_admin_action(AdminAction::Unlock);
        n.stages.enable = EnableStage::GoenabledWait;
        n.set_admin_action(AdminAction::Lock);
        assert_eq!(n.stages.disable, DisableStage::Start);
        assert_eq!(n.stages.enable, EnableStage::GoenabledWait);
    }
}

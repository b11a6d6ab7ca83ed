// src/core/node/types.rs

//! X.731 state lattice and the other small tagged-variant types used by the
//! FSM. `spec.md` §9 calls out "stringly-typed actions/states" as a thing to
//! replace with tagged variants plus an `as_str()` used only for logging;
//! this module is that replacement.

use bitflags::bitflags;
use strum_macros::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AdminState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperState {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AvailStatus {
    Available,
    Degraded,
    Failed,
    Offline,
    Online,
    Offduty,
    PoweredOff,
    Intest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AdminAction {
    None,
    Unlock,
    Lock,
    ForceLock,
    Reset,
    Reboot,
    Reinstall,
    Poweron,
    Poweroff,
    Powercycle,
    Swact,
    ForceSwact,
    Recover,
    Enable,
    EnableSubf,
    Add,
    Delete,
}

impl Default for AdminAction {
    fn default() -> Self {
        AdminAction::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Iface {
    Management,
    ClusterHost,
}

impl Iface {
    pub const ALL: [Iface; 2] = [Iface::Management, Iface::ClusterHost];
}

/// BMC out-of-band management protocol. `Dynamic` triggers the discovery
/// sequence in `core::bmc::protocol`; once resolved the node record's
/// `protocol` field is left as `Dynamic` (the selector), while the
/// discovered protocol is cached separately so re-discovery can be retried
/// if the BMC is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Ipmi,
    Redfish,
    Dynamic,
}

/// Whether the platform is a simplex all-in-one (combined controller +
/// compute on a single host) or a standard multi-host system. Referenced by
/// the FSM dispatch table's CPE-simplex no-op row (`spec.md` §4.4); carried
/// on the daemon context, not per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemType {
    Simplex,
    Standard,
}

bitflags! {
    /// Independent reasons a node can be degraded. `degrade_mask == 0` is
    /// the invariant gating return to `available` (`spec.md` §3 invariant 2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DegradeMask: u32 {
        const HEARTBEAT_MGMT    = 1 << 0;
        const HEARTBEAT_CLUSTER = 1 << 1;
        const BMC               = 1 << 2;
        const CONFIG            = 1 << 3;
        const RESOURCE          = 1 << 4;
    }
}

/// Cached graceful/immediate verb pair for a power-control action, learned
/// either from static ipmi defaults or from a redfish `Actions` probe.
/// Ported from `bmcUtil_info_init`'s `power_ctrl` struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionVerbSlot {
    pub graceful: Option<String>,
    pub immediate: Option<String>,
}

impl ActionVerbSlot {
    pub fn is_empty(&self) -> bool {
        self.graceful.is_none() && self.immediate.is_none()
    }
}

/// Canonical task-string constants mirrored into the inventory mutator.
/// Kept as a small fixed set rather than arbitrary strings so the MNFA
/// controller and FSM handlers can compare tasks without string literals
/// scattered through the codebase; `as_str()` is the only place these
/// become strings, matching the `spec.md` §9 guidance on stringly-typed
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    None,
    RecoveryWait,
    Enabling,
    Disabling,
    Resetting,
    Rebooting,
    PowerCycling,
    Reinstalling,
    Swacting,
    Testing,
    ConfigUpdate,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::None => "",
            Task::RecoveryWait => "recovery wait",
            Task::Enabling => "enabling",
            Task::Disabling => "disabling",
            Task::Resetting => "resetting",
            Task::Rebooting => "rebooting",
            Task::PowerCycling => "power cycling",
            Task::Reinstalling => "reinstalling",
            Task::Swacting => "swacting",
            Task::Testing => "testing",
            Task::ConfigUpdate => "config update",
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Task::None
    }
}

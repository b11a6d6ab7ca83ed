// src/core/node/handlers/mod.rs

//! Per-action handlers: one sub-FSM per `AdminAction`, each with its own
//! stage enum (see `core::node::record`). `spec.md` §4.4: "each handler is
//! itself a sub-FSM with explicit stages... stages are monotone within a
//! given action and always reset on action change."

pub mod add;
pub mod bmc_handler;
pub mod config_action;
pub mod degrade;
pub mod delete;
pub mod disable;
pub mod enable;
pub mod insv_test;
pub mod offline;
pub mod online;
pub mod oos_test;
pub mod power;
pub mod reboot;
pub mod recovery;
pub mod reinstall;
pub mod reset;
pub mod swact;

use crate::config::DaemonConfig;
use crate::core::bmc::executor::BmcHandle;
use crate::core::events::AlarmSink;
use crate::core::external::{HeartbeatCommander, InventoryMutator};
use crate::core::node::record::NodeRecord;
use std::sync::Arc;

/// Shared read-only collaborators every handler needs. Cheap to clone
/// (all fields are `Arc`, `BmcHandle` wraps an `mpsc::Sender`), passed by
/// value into each handler call so handlers don't need a lifetime
/// parameter tying them to the daemon.
#[derive(Clone)]
pub struct HandlerContext {
    pub config: Arc<DaemonConfig>,
    pub inventory: Arc<dyn InventoryMutator>,
    pub heartbeat: Arc<dyn HeartbeatCommander>,
    pub alarms: Arc<dyn AlarmSink>,
    pub bmc: BmcHandle,
}

/// Result of stepping a handler for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Stage advanced or is waiting; action still in flight.
    InProgress,
    /// Action reached its terminal success stage.
    Done,
    /// Action reached its terminal failure stage.
    Failed,
}

/// Reports the admin/oper/avail triple to the inventory database. Fired
/// off with `tokio::spawn` the same way `core::mnfa`'s `enter`/`exit` drive
/// `HeartbeatCommander` calls, so handler `tick()` stays synchronous.
pub fn notify_states(ctx: &HandlerContext, node: &NodeRecord) {
    let inventory = Arc::clone(&ctx.inventory);
    let hostname = node.hostname.clone();
    let admin = node.admin_state.as_ref().to_string();
    let oper = node.oper_state.as_ref().to_string();
    let avail = node.avail_status.as_ref().to_string();
    tokio::spawn(async move {
        inventory.update_states(&hostname, &admin, &oper, &avail).await;
    });
}

/// Reports the current task string to the inventory database.
pub fn notify_task(ctx: &HandlerContext, node: &NodeRecord) {
    let inventory = Arc::clone(&ctx.inventory);
    let hostname = node.hostname.clone();
    let task = node.task.as_str().to_string();
    tokio::spawn(async move {
        inventory.update_task(&hostname, &task).await;
    });
}

// src/core/node/fsm.rs

//! The per-node FSM tick: ordering and dispatch table from `spec.md` §4.4.
//!
//! Steps 2-4 (HTTP work queue, command queue, BMC thread handler step) are
//! owned by the daemon loop (`daemon::tick`) since they touch shared
//! executor/channel state rather than a single node's fields; `fsm::tick`
//! covers steps 1 and 5-11, which are pure per-node logic.

use super::handlers::{
    add, bmc_handler, config_action, degrade, delete, disable, enable, insv_test, offline, online,
    oos_test, power, reboot, recovery, reinstall, reset, swact, HandlerContext, HandlerOutcome,
};
use crate::core::node::record::NodeRecord;
use crate::core::node::types::{AdminAction, AdminState, AvailStatus, OperState, SystemType};

/// One tick of the per-node FSM. `system_type` is a daemon-context field,
/// not a per-node one (`SPEC_FULL.md` §3).
pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext, system_type: SystemType) {
    // 1. Clear any pending task string if the clear_task flag is set.
    node.maybe_clear_task();

    // Steps 2-4 (HTTP queue, command queue, BMC thread step) happen in
    // daemon::tick before this function is called.

    // 5. BMC handler.
    bmc_handler::tick(node, ctx);

    // 6. Degrade handler.
    degrade::tick(node, ctx);

    // 7. Offline handler.
    offline::tick(node, ctx);

    // 8. Online handler.
    online::tick(node, ctx);

    // 9. Delete short-circuits everything else.
    if node.admin_action == AdminAction::Delete {
        delete::tick(node, ctx);
        return;
    }

    // 10. Config handler, independent of adminAction.
    if node.config_action_pending
        || matches!(node.task, crate::core::node::types::Task::ConfigUpdate)
    {
        if let HandlerOutcome::Done | HandlerOutcome::Failed = config_action::tick(node, ctx) {
            node.config_action_pending = false;
        }
    }

    // 11. Dispatch table.
    dispatch(node, ctx, system_type);
}

fn dispatch(node: &mut NodeRecord, ctx: &HandlerContext, system_type: SystemType) {
    use AdminAction::*;

    if node.admin_action == Add {
        add::tick(node, ctx);
        return;
    }

    if node.is_in_service() && node.admin_action == None {
        insv_test::tick(node, ctx);
        return;
    }

    if node.admin_action == Powercycle {
        let outcome = power::tick(node, ctx);
        if let HandlerOutcome::Done | HandlerOutcome::Failed = outcome {
            oos_test::tick(node, ctx);
        }
        finish_action(node, outcome);
        return;
    }

    if node.admin_action == Reset {
        let outcome = reset::tick(node, ctx);
        if let HandlerOutcome::Done | HandlerOutcome::Failed = outcome {
            oos_test::tick(node, ctx);
        }
        finish_action(node, outcome);
        return;
    }

    if node.admin_action == Reboot {
        reboot::tick(node, ctx);
        return;
    }

    let steady_failed = node.is_in_service() && node.avail_status == AvailStatus::Failed;
    if steady_failed || node.admin_action == Enable {
        finish_action(node, enable::tick(node, ctx));
        return;
    }

    if node.admin_state == AdminState::Locked
        && node.oper_state == OperState::Disabled
        && matches!(
            node.avail_status,
            AvailStatus::Offline | AvailStatus::Online | AvailStatus::Offduty | AvailStatus::PoweredOff
        )
    {
        oos_test::tick(node, ctx);
        return;
    }

    if node.admin_action == Recover && node.admin_state == AdminState::Unlocked {
        finish_action(node, recovery::tick(node, ctx));
        return;
    }

    if node.admin_state == AdminState::Unlocked
        && node.oper_state == OperState::Disabled
        && matches!(
            node.avail_status,
            AvailStatus::Failed | AvailStatus::Intest | AvailStatus::Offline | AvailStatus::Online
        )
    {
        finish_action(node, enable::tick(node, ctx));
        return;
    }

    if node.admin_state == AdminState::Unlocked
        && node.avail_status == AvailStatus::PoweredOff
        && !node.powercycle_in_progress
    {
        node.admin_action = AdminAction::Poweron;
        return;
    }

    if node.admin_action == Unlock {
        finish_action(node, enable::tick(node, ctx));
        return;
    }

    if node.admin_action == EnableSubf {
        finish_action(node, enable::tick(node, ctx));
        return;
    }

    if matches!(node.admin_action, Lock | ForceLock) {
        finish_action(node, disable::tick(node, ctx));
        return;
    }

    if node.admin_state == AdminState::Unlocked
        && matches!(node.admin_action, Poweroff | Reset | Reboot | Reinstall)
    {
        node.clear_task = true;
        node.maybe_clear_task();
        node.admin_action = AdminAction::None;
        return;
    }

    if node.admin_action == Reinstall {
        finish_action(node, reinstall::tick(node, ctx));
        return;
    }

    if system_type == SystemType::Simplex
        && node.admin_action == AdminAction::None
        && node.admin_state == AdminState::Locked
    {
        insv_test::tick(node, ctx);
        oos_test::tick(node, ctx);
        return;
    }

    if node.admin_action == Poweroff {
        let outcome = power::tick(node, ctx);
        if let HandlerOutcome::Done | HandlerOutcome::Failed = outcome {
            oos_test::tick(node, ctx);
        }
        finish_action(node, outcome);
        return;
    }

    if node.admin_action == Poweron {
        let outcome = power::tick(node, ctx);
        if let HandlerOutcome::Done | HandlerOutcome::Failed = outcome {
            oos_test::tick(node, ctx);
        }
        finish_action(node, outcome);
        return;
    }

    if matches!(node.admin_action, Swact | ForceSwact) {
        finish_action(node, swact::tick(node, ctx));
        return;
    }

    if node.avail_status == AvailStatus::Degraded && node.admin_action == AdminAction::None {
        // no-op; handled by in-service test above on the next in-service pass
        return;
    }

    auto_correct(node);
}

/// Clears `admin_action` once its handler reaches a terminal stage, so the
/// dispatch table falls back to the periodic insv-test/oos-test rows
/// instead of re-invoking an already-finished handler forever.
fn finish_action(node: &mut NodeRecord, outcome: HandlerOutcome) {
    if matches!(outcome, HandlerOutcome::Done | HandlerOutcome::Failed) {
        node.admin_action = AdminAction::None;
    }
}

/// Last dispatch row: clamp to a known-good lattice point and force the
/// matching admin action, since the reached state is not one the table
/// names explicitly.
fn auto_correct(node: &mut NodeRecord) {
    if node.admin_state == AdminState::Unlocked {
        node.oper_state = OperState::Disabled;
        node.avail_status = AvailStatus::Online;
        node.admin_action = AdminAction::Unlock;
    } else {
        node.oper_state = OperState::Disabled;
        node.avail_status = AvailStatus::Offline;
        node.admin_action = AdminAction::ForceLock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use crate::core::events::LoggingAlarmSink;
    use crate::core::external::{LoggingHeartbeatCommander, LoggingInventoryMutator};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn ctx() -> HandlerContext {
        HandlerContext {
            config: Arc::new(DaemonConfig {
                stage_timeout: Duration::from_millis(1),
                ..Default::default()
            }),
            inventory: Arc::new(LoggingInventoryMutator),
            heartbeat: Arc::new(LoggingHeartbeatCommander),
            alarms: Arc::new(LoggingAlarmSink),
            bmc: crate::core::bmc::BmcHandle::detached(),
        }
    }

    #[test]
    fn unlock_then_lock_round_trip_leaves_no_task() {
        let ctx = ctx();
        let mut node = NodeRecord::new("compute-0", Uuid::new_v4());
        node.set_admin_action(AdminAction::Unlock);

        for _ in 0..64 {
            tick(&mut node, &ctx, SystemType::Standard);
            std::thread::sleep(Duration::from_millis(2));
            if node.is_in_service() {
                break;
            }
        }
        assert!(node.is_in_service());

        node.set_admin_action(AdminAction::Lock);
        for _ in 0..64 {
            tick(&mut node, &ctx, SystemType::Standard);
            std::thread::sleep(Duration::from_millis(2));
            if node.stages.disable == crate::core::node::record::DisableStage::Done {
                break;
            }
        }
        tick(&mut node, &ctx, SystemType::Standard);
        assert_eq!(node.admin_state, AdminState::Locked);
        assert_eq!(node.oper_state, OperState::Disabled);
        assert!(matches!(
            node.avail_status,
            AvailStatus::Online | AvailStatus::Offline
        ));
        assert_eq!(node.task.as_str(), "");
    }

    #[test]
    fn unreachable_lattice_point_is_auto_corrected() {
        let ctx = ctx();
        let mut node = NodeRecord::new("compute-0", Uuid::new_v4());
        node.admin_state = AdminState::Unlocked;
        node.oper_state = OperState::Enabled;
        node.avail_status = AvailStatus::Offduty;
        node.admin_action = AdminAction::None;

        tick(&mut node, &ctx, SystemType::Standard);
        assert_eq!(node.admin_state, AdminState::Unlocked);
        assert_eq!(node.avail_status, AvailStatus::Online);
        assert_eq!(node.admin_action, AdminAction::Unlock);
    }
}

// src/core/node/handlers/disable.rs

//! The disable handler, driven by `adminAction ∈ {lock, force_lock}`.

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::node::record::{DisableStage, NodeRecord};
use crate::core::node::types::{AdminAction, AvailStatus, OperState, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.disable {
        DisableStage::Start => {
            node.set_task(Task::Disabling);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.disable = DisableStage::HostServicesStop;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        DisableStage::HostServicesStop => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.disable = DisableStage::HostServicesWait;
            HandlerOutcome::InProgress
        }
        DisableStage::HostServicesWait => {
            // force_lock skips the graceful wait, matching the original's
            // handling of an operator-forced lock on an unresponsive host.
            if node.stage_timer.ring() || node.admin_action == AdminAction::ForceLock {
                node.stages.disable = DisableStage::StateChange;
            }
            HandlerOutcome::InProgress
        }
        DisableStage::StateChange => {
            node.oper_state = OperState::Disabled;
            node.avail_status = AvailStatus::Online;
            node.degrade_mask = crate::core::node::types::DegradeMask::empty();
            node.stages.disable = DisableStage::Done;
            notify_states(ctx, node);
            HandlerOutcome::InProgress
        }
        DisableStage::Done => {
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
    }
}

// src/core/node/handlers/reinstall.rs

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::node::record::{NodeRecord, ReinstallStage};
use crate::core::node::types::{AvailStatus, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.reinstall {
        ReinstallStage::Start => {
            node.set_task(Task::Reinstalling);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.reinstall = ReinstallStage::BmcRequestWait;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        ReinstallStage::BmcRequestWait => {
            if node.bmc.connected {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.reinstall = ReinstallStage::InstallWait;
            } else if node.stage_timer.ring() {
                node.stages.reinstall = ReinstallStage::Failure;
            } else if node.bmc.ready_to_submit() {
                if let Some(request) = node.bmc_request(BmcCommand::BootDevPxe) {
                    if ctx.bmc.submit(request).is_ok() {
                        node.bmc.request_in_flight = true;
                    }
                }
            }
            HandlerOutcome::InProgress
        }
        ReinstallStage::InstallWait => {
            if node.stage_timer.ring() {
                node.avail_status = AvailStatus::Offline;
                node.stages.reinstall = ReinstallStage::Done;
            }
            HandlerOutcome::InProgress
        }
        ReinstallStage::Done => {
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        ReinstallStage::Failure => {
            node.avail_status = AvailStatus::Failed;
            node.task = Task::None;
            notify_states(ctx, node);
            HandlerOutcome::Failed
        }
    }
}

// src/core/node/handlers/reboot.rs

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::node::record::{NodeRecord, RebootStage};
use crate::core::node::types::{AvailStatus, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.reboot {
        RebootStage::Start => {
            node.set_task(Task::Rebooting);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.reboot = RebootStage::BmcRequestWait;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        RebootStage::BmcRequestWait => {
            if node.bmc.connected {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.reboot = RebootStage::RebootWait;
            } else if node.stage_timer.ring() {
                node.stages.reboot = RebootStage::Failure;
            } else if node.bmc.ready_to_submit() {
                if let Some(request) = node.bmc_request(BmcCommand::PowerReset) {
                    if ctx.bmc.submit(request).is_ok() {
                        node.bmc.request_in_flight = true;
                    }
                }
            }
            HandlerOutcome::InProgress
        }
        RebootStage::RebootWait => {
            if node.stage_timer.ring() {
                node.avail_status = AvailStatus::Online;
                node.stages.reboot = RebootStage::Done;
            }
            HandlerOutcome::InProgress
        }
        RebootStage::Done => {
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        RebootStage::Failure => {
            node.avail_status = AvailStatus::Failed;
            node.task = Task::None;
            notify_states(ctx, node);
            HandlerOutcome::Failed
        }
    }
}

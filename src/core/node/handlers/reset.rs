// src/core/node/handlers/reset.rs

//! The reset handler, driven by `adminAction == reset`. Followed by
//! oos-test per the dispatch table (`spec.md` §4.4 row 4).

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::node::record::{NodeRecord, ResetStage};
use crate::core::node::types::{AvailStatus, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.reset {
        ResetStage::Start => {
            node.set_task(Task::Resetting);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.reset = ResetStage::BmcRequestWait;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        ResetStage::BmcRequestWait => {
            // Gated on the BMC executor having reaped a power-reset result;
            // the daemon tick sets `node.bmc.connected` from that result.
            if node.bmc.connected {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.reset = ResetStage::ResetWait;
            } else if node.stage_timer.ring() {
                node.stages.reset = ResetStage::Failure;
            } else if node.bmc.ready_to_submit() {
                if let Some(request) = node.bmc_request(BmcCommand::PowerReset) {
                    if ctx.bmc.submit(request).is_ok() {
                        node.bmc.request_in_flight = true;
                    }
                }
            }
            HandlerOutcome::InProgress
        }
        ResetStage::ResetWait => {
            if node.stage_timer.ring() {
                node.avail_status = AvailStatus::Offline;
                node.stages.reset = ResetStage::Done;
            }
            HandlerOutcome::InProgress
        }
        ResetStage::Done => {
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        ResetStage::Failure => {
            node.avail_status = AvailStatus::Failed;
            node.task = Task::None;
            notify_states(ctx, node);
            HandlerOutcome::Failed
        }
    }
}

// src/core/node/handlers/power.rs

//! The power handler, shared by `poweron`, `poweroff`, `powercycle`.
//! Followed by oos-test per the dispatch table (`spec.md` §4.4 rows 23/24).

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::node::record::{NodeRecord, PowerStage};
use crate::core::node::types::{AdminAction, AvailStatus, Task};

fn bmc_command(admin_action: AdminAction) -> BmcCommand {
    match admin_action {
        AdminAction::Poweroff => BmcCommand::PowerOff,
        AdminAction::Poweron => BmcCommand::PowerOn,
        _ => BmcCommand::PowerCycle,
    }
}

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    if node.admin_action == AdminAction::Powercycle {
        node.powercycle_in_progress = !matches!(node.stages.power, PowerStage::Done);
    }

    match node.stages.power {
        PowerStage::Start => {
            node.set_task(Task::PowerCycling);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.power = PowerStage::BmcRequestWait;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        PowerStage::BmcRequestWait => {
            if node.bmc.connected {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.power = PowerStage::PowerWait;
            } else if node.stage_timer.ring() {
                node.stages.power = PowerStage::Failure;
            } else if node.bmc.ready_to_submit() {
                if let Some(request) = node.bmc_request(bmc_command(node.admin_action)) {
                    if ctx.bmc.submit(request).is_ok() {
                        node.bmc.request_in_flight = true;
                    }
                }
            }
            HandlerOutcome::InProgress
        }
        PowerStage::PowerWait => {
            if node.stage_timer.ring() {
                node.avail_status = match node.admin_action {
                    AdminAction::Poweroff => AvailStatus::PoweredOff,
                    _ => AvailStatus::Online,
                };
                node.bmc.powered_on = node.admin_action != AdminAction::Poweroff;
                node.stages.power = PowerStage::Done;
            }
            HandlerOutcome::InProgress
        }
        PowerStage::Done => {
            node.powercycle_in_progress = false;
            node.task = Task::None;
            notify_states(ctx, node);
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        PowerStage::Failure => {
            node.powercycle_in_progress = false;
            node.avail_status = AvailStatus::Failed;
            node.task = Task::None;
            notify_states(ctx, node);
            HandlerOutcome::Failed
        }
    }
}

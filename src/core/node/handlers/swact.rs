// src/core/node/handlers/swact.rs

//! Controller-pair activity switch, driven by `adminAction ∈ {swact,
//! force_swact}`. `force_swact` skips the pre-swact readiness wait.

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::{NodeRecord, SwactStage};
use crate::core::node::types::{AdminAction, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.swact {
        SwactStage::Start => {
            node.set_task(Task::Swacting);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.swact = SwactStage::PreSwactWait;
            HandlerOutcome::InProgress
        }
        SwactStage::PreSwactWait => {
            if node.stage_timer.ring() || node.admin_action == AdminAction::ForceSwact {
                node.stages.swact = SwactStage::SwactRequest;
            }
            HandlerOutcome::InProgress
        }
        SwactStage::SwactRequest => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.swact = SwactStage::SwactWait;
            HandlerOutcome::InProgress
        }
        SwactStage::SwactWait => {
            if node.stage_timer.ring() {
                node.stages.swact = SwactStage::Done;
            }
            HandlerOutcome::InProgress
        }
        SwactStage::Done => {
            node.task = Task::None;
            HandlerOutcome::Done
        }
        SwactStage::Failure => {
            node.task = Task::None;
            HandlerOutcome::Failed
        }
    }
}

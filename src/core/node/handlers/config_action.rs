// src/core/node/handlers/config_action.rs

//! The config handler, stepped when a `configAction` (install/change
//! password) is pending (`spec.md` §4.4 step 10). Runs ahead of the main
//! dispatch table, independent of `adminAction`.

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::{ConfigStage, NodeRecord};
use crate::core::node::types::Task;

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.config {
        ConfigStage::Start => {
            node.set_task(Task::ConfigUpdate);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.config = ConfigStage::RequestWait;
            HandlerOutcome::InProgress
        }
        ConfigStage::RequestWait => {
            if node.stage_timer.ring() {
                node.stages.config = ConfigStage::Done;
            }
            HandlerOutcome::InProgress
        }
        ConfigStage::Done => {
            node.task = Task::None;
            HandlerOutcome::Done
        }
        ConfigStage::Failure => {
            node.task = Task::None;
            HandlerOutcome::Failed
        }
    }
}

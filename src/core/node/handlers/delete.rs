// src/core/node/handlers/delete.rs

//! The delete handler. A node may only be destroyed once it has been driven
//! to `locked, disabled, offline|online` (`spec.md` §3 Lifecycle).

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::{DeleteStage, NodeRecord};
use crate::core::node::types::{AdminAction, AdminState, OperState};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.delete {
        DeleteStage::Start => {
            if node.is_out_of_service() {
                node.stages.delete = DeleteStage::Done;
            } else {
                node.admin_state = AdminState::Locked;
                node.oper_state = OperState::Disabled;
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.delete = DeleteStage::DriveOosWait;
            }
            HandlerOutcome::InProgress
        }
        DeleteStage::DriveOosWait => {
            if node.stage_timer.ring() || node.is_out_of_service() {
                node.stages.delete = DeleteStage::Done;
            }
            HandlerOutcome::InProgress
        }
        DeleteStage::Done => {
            node.admin_action = AdminAction::None;
            HandlerOutcome::Done
        }
    }
}

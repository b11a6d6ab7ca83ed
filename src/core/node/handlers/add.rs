// src/core/node/handlers/add.rs

//! The add handler. Nodes are created by an add action from inventory
//! reconcile and enter provisioning, becoming eligible for unlock once
//! this handler reaches `Done` (`spec.md` §3 Lifecycle).

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::{AddStage, NodeRecord};
use crate::core::node::types::{AdminAction, AvailStatus};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.add {
        AddStage::Start => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.add = AddStage::ProvisionWait;
            HandlerOutcome::InProgress
        }
        AddStage::ProvisionWait => {
            if node.stage_timer.ring() {
                node.avail_status = AvailStatus::Offline;
                node.stages.add = AddStage::Done;
            }
            HandlerOutcome::InProgress
        }
        AddStage::Done => {
            node.admin_action = AdminAction::None;
            HandlerOutcome::Done
        }
    }
}

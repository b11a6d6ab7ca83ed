// src/core/node/handlers/offline.rs

//! The offline handler (`spec.md` §4.4 step 7): "no-op unless fault
//! handling". Marks an in-service host offline when the BMC connection
//! that backs its heartbeat path has been lost entirely, a condition
//! distinct from ordinary heartbeat-minor degrade.

use super::{HandlerContext, HandlerOutcome};
use crate::core::events::AlarmEvent;
use crate::core::node::record::NodeRecord;
use crate::core::node::types::AvailStatus;

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    if node.is_in_service() && !node.bmc.connected && node.bmc.protocol_resolved.is_some() {
        node.avail_status = AvailStatus::Failed;
        ctx.alarms.raise(AlarmEvent::BmcLost {
            hostname: node.hostname.clone(),
        });
    }
    HandlerOutcome::InProgress
}

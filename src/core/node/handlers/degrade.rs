// src/core/node/handlers/degrade.rs

//! The degrade handler (`spec.md` §4.4 step 6): promotes a node from
//! `degraded` back to `available` once `degrade_mask` clears, and demotes
//! from `available` to `degraded` the instant a cause is raised.

use super::{HandlerContext, HandlerOutcome};
use crate::core::events::AlarmEvent;
use crate::core::node::record::NodeRecord;
use crate::core::node::types::AvailStatus;

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    match node.avail_status {
        AvailStatus::Degraded if node.degrade_mask.is_empty() => {
            node.set_available();
            ctx.alarms.raise(AlarmEvent::HostAvailable {
                hostname: node.hostname.clone(),
            });
        }
        AvailStatus::Available if !node.degrade_mask.is_empty() => {
            node.avail_status = AvailStatus::Degraded;
            ctx.alarms.raise(AlarmEvent::HostDegraded {
                hostname: node.hostname.clone(),
                reason: format!("{:?}", node.degrade_mask),
            });
        }
        _ => {}
    }
    HandlerOutcome::InProgress
}

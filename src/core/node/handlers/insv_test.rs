// src/core/node/handlers/insv_test.rs

//! Periodic in-service test: runs whenever a node is steady in-service
//! (unlocked+enabled+{available,degraded}) with no action pending
//! (`spec.md` §4.4 dispatch table row 2). Confirms heartbeat health and
//! clears degrade bits once `degrade_mask == 0`.

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::NodeRecord;
use crate::core::node::types::{AvailStatus, DegradeMask, Iface};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.test_timer.poll();
    if !node.test_timer.is_running() {
        node.test_timer.start(ctx.config.stage_timeout);
    }
    if !node.test_timer.ring() {
        return HandlerOutcome::InProgress;
    }
    node.test_timer.start(ctx.config.stage_timeout);

    let mgmt_minor = node.heartbeat.is_minor(Iface::Management);
    let cluster_minor = node.heartbeat.is_minor(Iface::ClusterHost);

    if mgmt_minor {
        node.degrade_mask.insert(DegradeMask::HEARTBEAT_MGMT);
    }
    if cluster_minor {
        node.degrade_mask.insert(DegradeMask::HEARTBEAT_CLUSTER);
    }

    if node.degrade_mask.is_empty() {
        node.set_available();
    } else if node.avail_status == AvailStatus::Available {
        node.avail_status = AvailStatus::Degraded;
    }

    HandlerOutcome::InProgress
}

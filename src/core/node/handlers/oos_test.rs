// src/core/node/handlers/oos_test.rs

//! Out-of-service test: runs for locked+disabled hosts
//! (`{offline,online,offduty,powered_off}`) and after reset/reboot/power
//! actions complete (`spec.md` §4.4 dispatch table rows 6, 4, 23, 24).
//! Probes BMC reachability and promotes `offline -> online`.

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::NodeRecord;
use crate::core::node::types::AvailStatus;

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.test_timer.poll();
    if !node.test_timer.is_running() {
        node.test_timer.start(ctx.config.stage_timeout);
    }
    if !node.test_timer.ring() {
        return HandlerOutcome::InProgress;
    }
    node.test_timer.start(ctx.config.stage_timeout);

    if node.avail_status == AvailStatus::Offline && node.bmc.connected {
        node.avail_status = AvailStatus::Online;
    }

    HandlerOutcome::InProgress
}

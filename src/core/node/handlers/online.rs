// src/core/node/handlers/online.rs

//! The online handler (`spec.md` §4.4 step 8): audit-driven online/offline
//! transitions with debounce, for out-of-service hosts.

use super::{HandlerContext, HandlerOutcome};
use crate::core::node::record::NodeRecord;
use crate::core::node::types::AvailStatus;

const ONLINE_DEBOUNCE_THRESHOLD: u32 = 3;

pub fn tick(node: &mut NodeRecord, _ctx: &HandlerContext) -> HandlerOutcome {
    if !node.is_out_of_service() {
        node.online_debounce = 0;
        return HandlerOutcome::InProgress;
    }

    if node.bmc.connected {
        node.online_debounce += 1;
        if node.online_debounce >= ONLINE_DEBOUNCE_THRESHOLD
            && node.avail_status == AvailStatus::Offline
        {
            node.avail_status = AvailStatus::Online;
        }
    } else {
        node.online_debounce = 0;
        if node.avail_status == AvailStatus::Online {
            node.avail_status = AvailStatus::Offline;
        }
    }

    HandlerOutcome::InProgress
}

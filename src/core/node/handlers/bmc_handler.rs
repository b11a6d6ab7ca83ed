// src/core/node/handlers/bmc_handler.rs

//! The BMC handler (`spec.md` §4.4 step 5): manages connection state and
//! board-management alarms. Runs every tick, ahead of the action dispatch,
//! reconciling the node's cached `bmc` state against the most recent
//! `core::bmc::executor` result the daemon tick applied this pass.

use super::{HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::events::AlarmEvent;
use crate::core::node::record::NodeRecord;
use crate::core::secret::SecretFetcher;

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    if node.bmc_ip.is_none() {
        return HandlerOutcome::InProgress;
    }

    if node.bmc.secret.is_none() {
        node.bmc.secret = Some(SecretFetcher::new(
            ctx.config.secret_store_url.clone(),
            node.uuid,
            "bmc",
            ctx.config.secret_retry_delay,
        ));
    }

    if node.bmc.protocol_resolved.is_none() && !node.bmc.protocol_query_in_flight {
        if let Some(request) = node.bmc_request(BmcCommand::BmcQuery) {
            if ctx.bmc.submit(request).is_ok() {
                node.bmc.protocol_query_in_flight = true;
            }
        }
    }

    // Connection state itself is set by the daemon tick from executor
    // results before this handler runs; `was_connected` is the value as of
    // the previous tick, so this only reacts to the transition.
    if node.bmc.was_connected && !node.bmc.connected {
        ctx.alarms.raise(AlarmEvent::BmcLost {
            hostname: node.hostname.clone(),
        });
    } else if !node.bmc.was_connected && node.bmc.connected {
        ctx.alarms.raise(AlarmEvent::BmcRestored {
            hostname: node.hostname.clone(),
        });
    }
    node.bmc.was_connected = node.bmc.connected;

    HandlerOutcome::InProgress
}

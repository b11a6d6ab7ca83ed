// src/core/node/handlers/recovery.rs

//! The recovery handler, driven by `adminAction == recover` on an unlocked
//! host, and by the MNFA graceful-recovery path (`core::mnfa`).

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::bmc::types::BmcCommand;
use crate::core::node::record::{NodeRecord, RecoveryStage};
use crate::core::node::types::{AvailStatus, OperState, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.recovery {
        RecoveryStage::Start => {
            node.set_task(Task::RecoveryWait);
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.recovery = RecoveryStage::BmcRequestWait;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        RecoveryStage::BmcRequestWait => {
            if node.mnfa_graceful_recovery || node.bmc.connected {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.recovery = RecoveryStage::RebootWait;
            } else if node.stage_timer.ring() {
                node.stages.recovery = RecoveryStage::Failure;
            } else if node.bmc.ready_to_submit() {
                if let Some(request) = node.bmc_request(BmcCommand::PowerReset) {
                    if ctx.bmc.submit(request).is_ok() {
                        node.bmc.request_in_flight = true;
                    }
                }
            }
            HandlerOutcome::InProgress
        }
        RecoveryStage::RebootWait => {
            if node.stage_timer.ring() {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.recovery = RecoveryStage::EnableWait;
            }
            HandlerOutcome::InProgress
        }
        RecoveryStage::EnableWait => {
            if node.stage_timer.ring() {
                node.oper_state = OperState::Enabled;
                node.set_available();
                node.stages.recovery = RecoveryStage::Done;
                notify_states(ctx, node);
            }
            HandlerOutcome::InProgress
        }
        RecoveryStage::Done => {
            node.mnfa_graceful_recovery = false;
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        RecoveryStage::Failure => {
            node.mnfa_graceful_recovery = false;
            node.avail_status = AvailStatus::Failed;
            node.recovery_attempts += 1;
            ctx.alarms.raise(crate::core::events::AlarmEvent::HostFailed {
                hostname: node.hostname.clone(),
            });
            notify_states(ctx, node);
            if node.recovery_attempts >= ctx.config.max_auto_recovery_attempts {
                node.ar_disabled = true;
                ctx.alarms.raise(crate::core::events::AlarmEvent::AutoRecoveryDisabled {
                    hostname: node.hostname.clone(),
                    action: "recovery".to_string(),
                });
            }
            node.task = Task::None;
            HandlerOutcome::Failed
        }
    }
}

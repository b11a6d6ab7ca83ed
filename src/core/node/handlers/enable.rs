// src/core/node/handlers/enable.rs

//! The enable handler: START → RETRY_WAIT → INTEST_START → HEARTBEAT_CHECK →
//! HEARTBEAT_WAIT → STATE_CHANGE → GOENABLED_CHECK → GOENABLED_WAIT →
//! HOST_SERVICES_START → HOST_SERVICES_WAIT → CONFIG_CHECK → DONE | FAILURE.
//!
//! Ported from the original's `MTC_ENABLE__*` stage constants in
//! `mtcNodeFsm.cpp`. Each wait stage arms `node.stage_timer` and only
//! advances once it rings, matching the "no handler may block" rule.

use super::{notify_states, notify_task, HandlerContext, HandlerOutcome};
use crate::core::node::record::{EnableStage, NodeRecord};
use crate::core::node::types::{AvailStatus, OperState, Task};

pub fn tick(node: &mut NodeRecord, ctx: &HandlerContext) -> HandlerOutcome {
    node.stage_timer.poll();

    match node.stages.enable {
        EnableStage::Start => {
            node.set_task(Task::Enabling);
            node.recovery_attempts = 0;
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::IntestStart;
            notify_task(ctx, node);
            HandlerOutcome::InProgress
        }
        EnableStage::RetryWait => {
            if node.stage_timer.ring() {
                if node.recovery_attempts >= ctx.config.max_auto_recovery_attempts {
                    node.stages.enable = EnableStage::Failure;
                } else {
                    node.stages.enable = EnableStage::IntestStart;
                }
            }
            HandlerOutcome::InProgress
        }
        EnableStage::IntestStart => {
            node.avail_status = AvailStatus::Intest;
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::HeartbeatCheck;
            HandlerOutcome::InProgress
        }
        EnableStage::HeartbeatCheck => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::HeartbeatWait;
            HandlerOutcome::InProgress
        }
        EnableStage::HeartbeatWait => {
            if node.stage_timer.ring() {
                node.stages.enable = EnableStage::StateChange;
            }
            HandlerOutcome::InProgress
        }
        EnableStage::StateChange => {
            node.oper_state = OperState::Enabled;
            node.set_available();
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::GoenabledCheck;
            notify_states(ctx, node);
            HandlerOutcome::InProgress
        }
        EnableStage::GoenabledCheck => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::GoenabledWait;
            HandlerOutcome::InProgress
        }
        EnableStage::GoenabledWait => {
            if node.stage_timer.ring() {
                node.stages.enable = EnableStage::HostServicesStart;
            }
            HandlerOutcome::InProgress
        }
        EnableStage::HostServicesStart => {
            node.stage_timer.start(ctx.config.stage_timeout);
            node.stages.enable = EnableStage::HostServicesWait;
            HandlerOutcome::InProgress
        }
        EnableStage::HostServicesWait => {
            if node.stage_timer.ring() {
                node.stages.enable = EnableStage::ConfigCheck;
            }
            HandlerOutcome::InProgress
        }
        EnableStage::ConfigCheck => {
            node.stages.enable = EnableStage::Done;
            HandlerOutcome::InProgress
        }
        EnableStage::Done => {
            node.task = Task::None;
            notify_task(ctx, node);
            HandlerOutcome::Done
        }
        EnableStage::Failure => {
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
                    action: "enable".to_string(),
                });
                HandlerOutcome::Failed
            } else {
                node.stage_timer.start(ctx.config.stage_timeout);
                node.stages.enable = EnableStage::RetryWait;
                HandlerOutcome::InProgress
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use crate::core::events::LoggingAlarmSink;
    use crate::core::external::{LoggingHeartbeatCommander, LoggingInventoryMutator};
    use crate::core::node::record::NodeRecord;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn ctx() -> HandlerContext {
        HandlerContext {
            config: Arc::new(DaemonConfig {
                stage_timeout: Duration::from_millis(1),
                ..Default::default()
            }),
            inventory: Arc::new(LoggingInventoryMutator),
            heartbeat: Arc::new(LoggingHeartbeatCommander),
            alarms: Arc::new(LoggingAlarmSink),
            bmc: crate::core::bmc::BmcHandle::detached(),
        }
    }

    #[test]
    fn runs_to_done() {
        let ctx = ctx();
        let mut node = NodeRecord::new("compute-0", Uuid::new_v4());
        node.set_admin_action(crate::core::node::types::AdminAction::Unlock);

        let mut outcome = HandlerOutcome::InProgress;
        for _ in 0..64 {
            outcome = tick(&mut node, &ctx);
            if outcome != HandlerOutcome::InProgress {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(outcome, HandlerOutcome::Done);
        assert_eq!(node.oper_state, OperState::Enabled);
        assert_eq!(node.avail_status, AvailStatus::Available);
    }
}

// src/core/mnfa.rs

//! Multi-Node Failure Avoidance controller.
//!
//! Collapses a storm of simultaneous heartbeat failures into one
//! coordinated recovery episode instead of letting each node run its own
//! enable-from-failed path, which would otherwise look like a reboot storm
//! when the real cause is a single switch or control-plane partition.
//! Ported from `mtcNodeMnfa.cpp`'s `mnfa_add_host` / `mnfa_enter` /
//! `mnfa_exit` / `mnfa_cancel` / `mnfa_recover_host`.

use crate::config::{DaemonConfig, HbsFailureAction};
use crate::core::events::{AlarmEvent, AlarmSink};
use crate::core::external::HeartbeatCommander;
use crate::core::node::record::{NodeRecord, RecoveryStage};
use crate::core::node::types::{AdminAction, AvailStatus, DegradeMask, Iface, OperState, Task};
use crate::core::timer::Timer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnfaState {
    Inactive,
    Active,
}

pub struct MnfaController {
    state: MnfaState,
    host_count: HashMap<Iface, u32>,
    awol: Vec<String>,
    timer: Timer,
    debounce: Timer,
    occurrences: u32,
    failure_action: HbsFailureAction,
    threshold: u32,
    timeout: Duration,
    heartbeat: Arc<dyn HeartbeatCommander>,
    alarms: Arc<dyn AlarmSink>,
}

impl MnfaController {
    pub fn new(
        config: &DaemonConfig,
        heartbeat: Arc<dyn HeartbeatCommander>,
        alarms: Arc<dyn AlarmSink>,
    ) -> Self {
        Self {
            state: MnfaState::Inactive,
            host_count: HashMap::new(),
            awol: Vec::new(),
            timer: Timer::new(),
            debounce: Timer::new(),
            occurrences: 0,
            failure_action: config.hbs_failure_action(),
            threshold: config.mnfa_threshold,
            timeout: config.mnfa_timeout,
            heartbeat,
            alarms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == MnfaState::Active
    }

    pub fn host_count(&self, iface: Iface) -> u32 {
        *self.host_count.get(&iface).unwrap_or(&0)
    }

    pub fn awol_list(&self) -> &[String] {
        &self.awol
    }

    /// Must be called once per tick from the daemon loop; drives the forced
    /// (timeout) exit and the post-exit heartbeat-recover debounce.
    pub fn poll(&mut self, nodes: &mut HashMap<String, NodeRecord>) {
        self.timer.poll();
        self.debounce.poll();

        if self.state == MnfaState::Active && self.timer.ring() {
            self.exit(nodes, true);
        }

        if self.debounce.ring() {
            self.debounce.stop();
            self.heartbeat_recover_all();
        }
    }

    /// On first heartbeat-minor observation for `iface` on `node`.
    pub fn add_host(&mut self, node: &mut NodeRecord, iface: Iface) {
        if matches!(
            self.failure_action,
            HbsFailureAction::Alarm | HbsFailureAction::None
        ) {
            return;
        }

        if node.heartbeat.is_minor(iface) {
            return;
        }
        node.heartbeat.set_minor(iface, true);
        *node.heartbeat.hbs_minor_count.entry(iface).or_insert(0) += 1;
        *self.host_count.entry(iface).or_insert(0) += 1;

        if self.state == MnfaState::Active {
            node.mnfa_graceful_recovery = true;
            node.set_task(Task::RecoveryWait);
            if !self.awol.contains(&node.hostname) {
                self.awol.push(node.hostname.clone());
            }
            return;
        }

        if self.host_count(iface) >= self.threshold {
            self.enter(node.hostname.as_str(), iface);
        }
    }

    fn enter(&mut self, _trigger_host: &str, iface: Iface) {
        self.alarms.raise(AlarmEvent::MnfaEnter {
            iface: iface.as_ref().to_string(),
            host_count: self.host_count(iface),
        });
        self.state = MnfaState::Active;
        let hb = Arc::clone(&self.heartbeat);
        tokio::spawn(async move {
            hb.backoff_heartbeat("*", "*").await;
        });
        self.timer.start(self.timeout);
    }

    /// Walks the full node arena and pulls in every enabled node with
    /// `hbs_minor` set on any interface, marking it AWOL. Call immediately
    /// after `add_host` triggers `enter` on the daemon's node arena.
    pub fn sweep_into_entry(&mut self, nodes: &mut HashMap<String, NodeRecord>) {
        if self.state != MnfaState::Active {
            return;
        }
        for (hostname, node) in nodes.iter_mut() {
            if node.oper_state != OperState::Enabled {
                continue;
            }
            let minor_any = Iface::ALL.iter().any(|i| node.heartbeat.is_minor(*i));
            if minor_any && !node.mnfa_graceful_recovery {
                node.mnfa_graceful_recovery = true;
                node.set_task(Task::RecoveryWait);
                if !self.awol.contains(hostname) {
                    self.awol.push(hostname.clone());
                }
            }
        }
    }

    pub fn exit(&mut self, nodes: &mut HashMap<String, NodeRecord>, force: bool) {
        if self.state != MnfaState::Active {
            return;
        }
        self.occurrences += 1;
        self.state = MnfaState::Inactive;

        for hostname in &self.awol {
            let Some(node) = nodes.get_mut(hostname) else {
                continue;
            };
            for iface in Iface::ALL {
                node.heartbeat.set_minor(iface, false);
            }

            if force {
                node.avail_status = AvailStatus::Failed;
                node.set_admin_action(AdminAction::Enable);
                node.stages.enable = crate::core::node::record::EnableStage::Start;
            } else {
                if node.avail_status == AvailStatus::Degraded && node.degrade_mask.is_empty() {
                    node.set_available();
                }
                if !node.mnfa_graceful_recovery {
                    node.mnfa_graceful_recovery = true;
                    node.stages.recovery = RecoveryStage::Start;
                }
            }
        }

        self.alarms.raise(AlarmEvent::MnfaExit {
            iface: "all".to_string(),
            forced: force,
        });

        self.timer.stop();
        self.debounce.start(Duration::from_secs(2));
        self.host_count.clear();
        self.awol.clear();
    }

    fn heartbeat_recover_all(&self) {
        let hb = Arc::clone(&self.heartbeat);
        tokio::spawn(async move {
            hb.recover_heartbeat("*", "*").await;
        });
    }

    pub fn cancel(&mut self, nodes: &mut HashMap<String, NodeRecord>) {
        if self.state != MnfaState::Active {
            return;
        }
        for hostname in &self.awol {
            let Some(node) = nodes.get_mut(hostname) else {
                continue;
            };
            for iface in Iface::ALL {
                node.heartbeat.set_minor(iface, false);
            }
            node.mnfa_graceful_recovery = false;
            node.degrade_mask = DegradeMask::empty();
            node.task = Task::None;
        }
        self.heartbeat_recover_all();
        self.host_count.clear();
        self.state = MnfaState::Inactive;
        self.awol.clear();
        self.timer.stop();
    }

    pub fn recover_host(&mut self, node: &mut NodeRecord) {
        if node.avail_status == AvailStatus::Degraded && node.degrade_mask.is_empty() {
            node.set_available();
        }
        if node.mnfa_graceful_recovery {
            node.stages.recovery = RecoveryStage::Start;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::LoggingAlarmSink;
    use crate::core::external::LoggingHeartbeatCommander;
    use uuid::Uuid;

    fn controller(threshold: u32) -> MnfaController {
        let config = DaemonConfig {
            mnfa_threshold: threshold,
            mnfa_timeout: Duration::from_secs(60),
            ..Default::default()
        };
        MnfaController::new(
            &config,
            Arc::new(LoggingHeartbeatCommander),
            Arc::new(LoggingAlarmSink),
        )
    }

    fn node(name: &str) -> NodeRecord {
        let mut n = NodeRecord::new(name, Uuid::new_v4());
        n.admin_state = crate::core::node::types::AdminState::Unlocked;
        n.oper_state = OperState::Enabled;
        n.avail_status = AvailStatus::Available;
        n
    }

    #[tokio::test]
    async fn enters_at_exact_threshold() {
        let mut mnfa = controller(3);
        let mut a = node("a");
        let mut b = node("b");
        let mut c = node("c");

        mnfa.add_host(&mut a, Iface::Management);
        assert!(!mnfa.is_active());
        mnfa.add_host(&mut b, Iface::Management);
        assert!(!mnfa.is_active());
        mnfa.add_host(&mut c, Iface::Management);
        assert!(mnfa.is_active());
        assert_eq!(mnfa.host_count(Iface::Management), 3);
    }

    #[tokio::test]
    async fn exit_clears_awol_and_counts() {
        let mut mnfa = controller(1);
        let mut nodes = HashMap::new();
        nodes.insert("a".to_string(), node("a"));

        {
            let n = nodes.get_mut("a").unwrap();
            mnfa.add_host(n, Iface::Management);
        }
        mnfa.sweep_into_entry(&mut nodes);
        assert!(mnfa.is_active());
        assert_eq!(mnfa.awol_list().len(), 1);

        mnfa.exit(&mut nodes, false);
        assert!(!mnfa.is_active());
        assert_eq!(mnfa.awol_list().len(), 0);
        assert_eq!(mnfa.host_count(Iface::Management), 0);
    }

    #[tokio::test]
    async fn forced_exit_fails_and_restarts_enable() {
        let mut mnfa = controller(1);
        let mut nodes = HashMap::new();
        nodes.insert("a".to_string(), node("a"));

        {
            let n = nodes.get_mut("a").unwrap();
            mnfa.add_host(n, Iface::Management);
        }
        mnfa.sweep_into_entry(&mut nodes);

        mnfa.exit(&mut nodes, true);
        let n = nodes.get("a").unwrap();
        assert_eq!(n.avail_status, AvailStatus::Failed);
        assert_eq!(n.admin_action, AdminAction::Enable);
    }
}

// src/daemon.rs

//! The node-maintenance daemon: owns the node arena, the BMC executor, and
//! the MNFA controller, and drives the per-tick sequence from `spec.md`
//! §2/§4.4. Single `tokio` task, matching `core::warden::run`'s top-level
//! shape (load config, build shared state, loop forever) but with the node
//! arena owned by value instead of behind `Arc<Mutex<_>>`, since only the
//! BMC executor and MNFA controller need cross-task synchronization
//! (`SPEC_FULL.md` §5).

use crate::config::DaemonConfig;
use crate::core::bmc::executor::{BmcExecutor, ShellProtocolRunner};
use crate::core::bmc::protocol::{select_protocol, RootQueryResponse};
use crate::core::bmc::types::{BmcCommand, BmcOutcome};
use crate::core::errors::MtceResult;
use crate::core::events::{AlarmSink, LoggingAlarmSink};
use crate::core::external::{
    HeartbeatCommander, InventoryMutator, LoggingHeartbeatCommander, LoggingInventoryMutator,
};
use crate::core::mnfa::MnfaController;
use crate::core::node::handlers::HandlerContext;
use crate::core::node::record::NodeRecord;
use crate::core::node::types::SystemType;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

pub struct DaemonContext {
    pub nodes: HashMap<String, NodeRecord>,
    pub mnfa: MnfaController,
    pub bmc: BmcExecutor,
    pub handler_ctx: HandlerContext,
    pub system_type: SystemType,
}

impl DaemonContext {
    pub fn new(config: Arc<DaemonConfig>) -> Self {
        let inventory: Arc<dyn InventoryMutator> = Arc::new(LoggingInventoryMutator);
        let heartbeat: Arc<dyn HeartbeatCommander> = Arc::new(LoggingHeartbeatCommander);
        let alarms: Arc<dyn AlarmSink> = Arc::new(LoggingAlarmSink);

        let mnfa = MnfaController::new(&config, Arc::clone(&heartbeat), Arc::clone(&alarms));
        let bmc = BmcExecutor::spawn(
            config.bmc_worker_pool_size,
            config.bmc_retry_limit,
            PathBuf::from(&config.bmc_redfish_credential_dir),
            PathBuf::from(&config.bmc_ipmi_credential_dir),
            Arc::new(ShellProtocolRunner),
        );

        let handler_ctx = HandlerContext {
            config: Arc::clone(&config),
            inventory,
            heartbeat,
            alarms,
            bmc: bmc.handle(),
        };

        Self {
            nodes: HashMap::new(),
            mnfa,
            bmc,
            handler_ctx,
            system_type: SystemType::Standard,
        }
    }

    /// One pass of the main loop's ordered steps (`spec.md` §2, §4.4
    /// steps 2-4 plus the per-node FSM tick). Async only to step each
    /// node's `SecretFetcher`, whose two HTTP round-trips can't run from a
    /// handler's synchronous `tick()`; the FSM dispatch itself stays fully
    /// synchronous.
    pub async fn tick(&mut self) {
        // Step 4: drain BMC executor results and apply them to node state
        // under single-threaded discipline.
        for result in self.bmc.drain() {
            let Some(node) = self.nodes.get_mut(&result.hostname) else {
                continue;
            };

            if result.command == BmcCommand::BmcQuery {
                node.bmc.protocol_query_in_flight = false;
                match result.outcome {
                    BmcOutcome::Success { payload } => {
                        let probe = payload
                            .as_deref()
                            .and_then(|p| serde_json::from_str::<RootQueryResponse>(p).ok());
                        let (protocol, reset, poweron, poweroff) = select_protocol(
                            probe.as_ref(),
                            self.handler_ctx.config.bmc_redfish_min_major,
                            self.handler_ctx.config.bmc_redfish_min_minor,
                        );
                        node.bmc.protocol_resolved = Some(protocol);
                        node.bmc.reset_verbs = reset;
                        node.bmc.poweron_verbs = poweron;
                        node.bmc.poweroff_verbs = poweroff;
                        node.bmc.connected = true;
                    }
                    BmcOutcome::ProtocolDowngraded => node.bmc.connected = true,
                    BmcOutcome::Transient(_) => {
                        debug!(hostname = %node.hostname, "transient BMC query result");
                    }
                    BmcOutcome::Fatal(_) => node.bmc.connected = false,
                    BmcOutcome::Abandoned => {}
                }
                continue;
            }

            node.bmc.request_in_flight = false;
            match result.outcome {
                BmcOutcome::Success { .. } => {
                    node.bmc.connected = true;
                }
                BmcOutcome::ProtocolDowngraded => {
                    node.bmc.connected = true;
                }
                BmcOutcome::Transient(_) => {
                    debug!(hostname = %node.hostname, "transient BMC result");
                }
                BmcOutcome::Fatal(_) => {
                    node.bmc.connected = false;
                }
                BmcOutcome::Abandoned => {}
            }
        }

        for node in self.nodes.values_mut() {
            if let Some(secret) = node.bmc.secret.as_mut() {
                secret.tick().await;
            }
        }

        self.mnfa.poll(&mut self.nodes);

        for node in self.nodes.values_mut() {
            crate::core::node::fsm::tick(node, &self.handler_ctx, self.system_type);
        }
    }

    /// Ingests a heartbeat-minor observation from the external heartbeat
    /// service, mutating the MNFA controller (`spec.md` §4.5).
    pub fn on_heartbeat_minor(&mut self, hostname: &str, iface: crate::core::node::types::Iface) {
        if let Some(node) = self.nodes.get_mut(hostname) {
            self.mnfa.add_host(node, iface);
            self.mnfa.sweep_into_entry(&mut self.nodes);
        }
    }
}

pub async fn run(config: DaemonConfig) -> MtceResult<()> {
    let config = Arc::new(config);
    let mut ctx = DaemonContext::new(Arc::clone(&config));

    info!("node maintenance daemon entering main loop");
    let mut tick_interval = interval(Duration::from_millis(250));
    loop {
        tick_interval.tick().await;
        ctx.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn tick_runs_fsm_for_every_node() {
        let config = Arc::new(DaemonConfig::default());
        let mut ctx = DaemonContext::new(config);
        ctx.nodes.insert(
            "compute-0".to_string(),
            NodeRecord::new("compute-0", Uuid::new_v4()),
        );
        ctx.tick().await;
        assert!(ctx.nodes.contains_key("compute-0"));
    }
}

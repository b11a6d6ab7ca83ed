// src/core/external.rs

//! External collaborator traits.
//!
//! Inventory database access, the upward-facing REST/CLI surface, and the
//! heartbeat service's own wire protocol are all out of scope for this
//! crate. These traits are the seam: the FSM and MNFA controller talk to
//! `dyn InventoryMutator` / `dyn HeartbeatCommander`, never to a concrete
//! HTTP client, so the rest of the system can be exercised without a live
//! inventory or heartbeat backend.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait InventoryMutator: Send + Sync {
    async fn update_states(&self, hostname: &str, admin: &str, oper: &str, avail: &str);
    async fn update_task(&self, hostname: &str, task: &str);
    async fn update_value(&self, hostname: &str, key: &str, value: &str);
}

#[async_trait]
pub trait HeartbeatCommander: Send + Sync {
    async fn backoff_heartbeat(&self, hostname: &str, iface: &str);
    async fn recover_heartbeat(&self, hostname: &str, iface: &str);
    async fn start_heartbeat(&self, hostname: &str);
    async fn stop_heartbeat(&self, hostname: &str);
    async fn restart_heartbeat(&self, hostname: &str);
}

#[derive(Debug, Default)]
pub struct LoggingInventoryMutator;

#[async_trait]
impl InventoryMutator for LoggingInventoryMutator {
    async fn update_states(&self, hostname: &str, admin: &str, oper: &str, avail: &str) {
        info!(hostname, admin, oper, avail, "inventory: update_states");
    }

    async fn update_task(&self, hostname: &str, task: &str) {
        info!(hostname, task, "inventory: update_task");
    }

    async fn update_value(&self, hostname: &str, key: &str, value: &str) {
        info!(hostname, key, value, "inventory: update_value");
    }
}

#[derive(Debug, Default)]
pub struct LoggingHeartbeatCommander;

#[async_trait]
impl HeartbeatCommander for LoggingHeartbeatCommander {
    async fn backoff_heartbeat(&self, hostname: &str, iface: &str) {
        info!(hostname, iface, "heartbeat: backoff");
    }

    async fn recover_heartbeat(&self, hostname: &str, iface: &str) {
        info!(hostname, iface, "heartbeat: recover");
    }

    async fn start_heartbeat(&self, hostname: &str) {
        info!(hostname, "heartbeat: start");
    }

    async fn stop_heartbeat(&self, hostname: &str) {
        info!(hostname, "heartbeat: stop");
    }

    async fn restart_heartbeat(&self, hostname: &str) {
        info!(hostname, "heartbeat: restart");
    }
}

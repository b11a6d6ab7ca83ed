// src/config.rs

//! Configuration loading.
//!
//! TOML files loaded with `serde` + `toml`, durations via `humantime-serde`,
//! same mechanism as the teacher's `core::warden::config::WardenConfig`
//! (`tokio::fs::read_to_string` + `toml::from_str`). This is ambient
//! scaffolding only: the inventory/heartbeat/alarm wire formats themselves
//! stay out of scope.

use crate::core::errors::{MtceError, MtceResult};
use serde::Deserialize;
use std::time::Duration;

/// Minimum kernel watchdog update period honored by the host watchdog; below
/// this the kernel watchdog is left disabled regardless of
/// `hostwd_use_kern_wd`. Mirrors `HOSTW_MIN_KERN_UPDATE_PERIOD` in the
/// original hostw daemon.
pub const HOSTW_MIN_KERN_UPDATE_PERIOD: Duration = Duration::from_secs(2);

pub const FORCE_REBOOT_DELAY: Duration = Duration::from_secs(10);
pub const GRACEFUL_REBOOT_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HbsFailureAction {
    Fail,
    Degrade,
    Alarm,
    None,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mnfa_threshold() -> u32 {
    3
}

fn default_mnfa_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_bmc_redfish_min_major() -> u32 {
    1
}

fn default_bmc_redfish_min_minor() -> u32 {
    0
}

fn default_bmc_retry_limit() -> u32 {
    3
}

fn default_bmc_worker_pool_size() -> usize {
    4
}

fn default_bmc_redfish_credential_dir() -> String {
    "/var/run/mtce/redfishtool".to_string()
}

fn default_bmc_ipmi_credential_dir() -> String {
    "/var/run/mtce/ipmitool".to_string()
}

fn default_secret_store_url() -> String {
    "http://localhost:9311/v1/secrets".to_string()
}

fn default_secret_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_stage_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_auto_recovery_attempts() -> u32 {
    3
}

/// Top-level configuration for the node maintenance daemon (FSM + MNFA +
/// BMC executor + secret fetcher). Host watchdog configuration is separate
/// (`HostwdConfig`) because it runs as its own process, same split as
/// `mtce`/`hostw` in the original.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_mnfa_threshold")]
    pub mnfa_threshold: u32,

    #[serde(default = "default_mnfa_timeout", with = "humantime_serde")]
    pub mnfa_timeout: Duration,

    #[serde(default)]
    pub hbs_failure_action: Option<HbsFailureActionConfig>,

    #[serde(default = "default_bmc_redfish_min_major")]
    pub bmc_redfish_min_major: u32,

    #[serde(default = "default_bmc_redfish_min_minor")]
    pub bmc_redfish_min_minor: u32,

    #[serde(default = "default_bmc_retry_limit")]
    pub bmc_retry_limit: u32,

    #[serde(default = "default_bmc_worker_pool_size")]
    pub bmc_worker_pool_size: usize,

    /// Mirrors the original's `REDFISHTOOL_OUTPUT_DIR`: redfish credential
    /// files never share a directory with ipmi's.
    #[serde(default = "default_bmc_redfish_credential_dir")]
    pub bmc_redfish_credential_dir: String,

    /// Mirrors the original's `IPMITOOL_OUTPUT_DIR`.
    #[serde(default = "default_bmc_ipmi_credential_dir")]
    pub bmc_ipmi_credential_dir: String,

    #[serde(default = "default_secret_store_url")]
    pub secret_store_url: String,

    #[serde(default = "default_secret_retry_delay", with = "humantime_serde")]
    pub secret_retry_delay: Duration,

    #[serde(default = "default_stage_timeout", with = "humantime_serde")]
    pub stage_timeout: Duration,

    #[serde(default = "default_max_auto_recovery_attempts")]
    pub max_auto_recovery_attempts: u32,
}

/// Mirrors `hbs_failure_action` but kept as a plain string wrapper at the
/// config layer so unknown values fail config loading with a clear message
/// rather than a generic deserialize error; converted into
/// `HbsFailureAction` by the daemon at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct HbsFailureActionConfig(pub HbsFailureAction);

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mnfa_threshold: default_mnfa_threshold(),
            mnfa_timeout: default_mnfa_timeout(),
            hbs_failure_action: None,
            bmc_redfish_min_major: default_bmc_redfish_min_major(),
            bmc_redfish_min_minor: default_bmc_redfish_min_minor(),
            bmc_retry_limit: default_bmc_retry_limit(),
            bmc_worker_pool_size: default_bmc_worker_pool_size(),
            bmc_redfish_credential_dir: default_bmc_redfish_credential_dir(),
            bmc_ipmi_credential_dir: default_bmc_ipmi_credential_dir(),
            secret_store_url: default_secret_store_url(),
            secret_retry_delay: default_secret_retry_delay(),
            stage_timeout: default_stage_timeout(),
            max_auto_recovery_attempts: default_max_auto_recovery_attempts(),
        }
    }
}

impl DaemonConfig {
    pub async fn from_file(path: &str) -> MtceResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MtceError::Config(format!("reading {path}: {e}")))?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn hbs_failure_action(&self) -> HbsFailureAction {
        self.hbs_failure_action
            .as_ref()
            .map(|w| w.0)
            .unwrap_or(HbsFailureAction::Fail)
    }
}

fn default_hostwd_failure_threshold() -> u32 {
    4
}

fn default_hostwd_update_period() -> Duration {
    Duration::from_secs(5)
}

fn default_kernwd_update_period() -> Duration {
    Duration::from_secs(5)
}

fn default_hostwd_console_path() -> String {
    "/dev/console".to_string()
}

/// Configuration for the host watchdog daemon, loaded separately from
/// `DaemonConfig` because it is started with `--hostwd` as its own process.
#[derive(Debug, Clone, Deserialize)]
pub struct HostwdConfig {
    #[serde(default = "default_hostwd_failure_threshold")]
    pub hostwd_failure_threshold: u32,

    #[serde(default)]
    pub hostwd_reboot_on_err: bool,

    #[serde(default)]
    pub hostwd_use_kern_wd: bool,

    #[serde(default)]
    pub hostwd_kdump_on_stall: bool,

    #[serde(default = "default_hostwd_console_path")]
    pub hostwd_console_path: String,

    #[serde(default = "default_hostwd_update_period", with = "humantime_serde")]
    pub hostwd_update_period: Duration,

    #[serde(default = "default_kernwd_update_period", with = "humantime_serde")]
    pub kernwd_update_period: Duration,

    #[serde(default)]
    pub locked_node_marker_path: Option<String>,
}

impl Default for HostwdConfig {
    fn default() -> Self {
        Self {
            hostwd_failure_threshold: default_hostwd_failure_threshold(),
            hostwd_reboot_on_err: false,
            hostwd_use_kern_wd: false,
            hostwd_kdump_on_stall: false,
            hostwd_console_path: default_hostwd_console_path(),
            hostwd_update_period: default_hostwd_update_period(),
            kernwd_update_period: default_kernwd_update_period(),
            locked_node_marker_path: None,
        }
    }
}

impl HostwdConfig {
    pub async fn from_file(path: &str) -> MtceResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MtceError::Config(format!("reading {path}: {e}")))?;
        let config: HostwdConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective kernel watchdog period honoring `HOSTW_MIN_KERN_UPDATE_PERIOD`.
    pub fn kernel_watchdog_enabled(&self) -> bool {
        self.hostwd_use_kern_wd && self.kernwd_update_period >= HOSTW_MIN_KERN_UPDATE_PERIOD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = DaemonConfig::default();
        assert_eq!(cfg.mnfa_threshold, 3);
        assert_eq!(cfg.hbs_failure_action(), HbsFailureAction::Fail);
    }

    #[test]
    fn kernel_watchdog_disabled_below_minimum() {
        let mut cfg = HostwdConfig {
            hostwd_use_kern_wd: true,
            kernwd_update_period: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(!cfg.kernel_watchdog_enabled());
        cfg.kernwd_update_period = Duration::from_secs(2);
        assert!(cfg.kernel_watchdog_enabled());
    }
}

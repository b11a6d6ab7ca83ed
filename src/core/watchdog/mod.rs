// src/core/watchdog/mod.rs

//! The host watchdog daemon: pets the kernel watchdog, listens for PMON
//! liveness messages on an abstract Unix datagram socket, and forces a
//! crash dump or reboot when quorum is lost. Ported from
//! `hostw/hostwHdlr.cpp` / `hostwInit.cpp`.

pub mod kernel;
pub mod pmon;

use crate::config::HostwdConfig;
use crate::core::errors::MtceResult;
use crate::core::timer::Timer;
use kernel::KernelWatchdog;
use pmon::{PmonListener, PmonMessage};
use std::path::Path;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

pub const FORCE_REBOOT_DELAY: Duration = Duration::from_secs(10);
pub const GRACEFUL_REBOOT_DELAY: Duration = Duration::from_secs(60);
pub const HOSTWD_SOCKET_NAME: &str = "hostwd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuorumState {
    Healthy,
    Failed,
}

struct HostWatchdog {
    config: HostwdConfig,
    kernel: Option<KernelWatchdog>,
    listener: PmonListener,
    grace_loops: u32,
    update_timer: Timer,
    pet_interval: tokio::time::Interval,
    quorum: QuorumState,
    forced_reset_timer: Timer,
    graceful_reboot_timer: Timer,
    kdump_supported: bool,
}

impl HostWatchdog {
    async fn new(config: HostwdConfig) -> MtceResult<Self> {
        let kernel = if config.kernel_watchdog_enabled() {
            Some(KernelWatchdog::open(config.kernwd_update_period)?)
        } else {
            None
        };

        let listener = PmonListener::bind(HOSTWD_SOCKET_NAME)?;
        let kdump_supported = probe_kdump_support().await;

        let mut update_timer = Timer::new();
        update_timer.start(config.hostwd_update_period * 2);

        Ok(Self {
            grace_loops: config.hostwd_failure_threshold,
            update_timer,
            pet_interval: interval(Duration::from_secs(1)),
            quorum: QuorumState::Healthy,
            forced_reset_timer: Timer::new(),
            graceful_reboot_timer: Timer::new(),
            kdump_supported,
            kernel,
            listener,
            config,
        })
    }

    fn locked_marker_present(&self) -> bool {
        self.config
            .locked_node_marker_path
            .as_deref()
            .map(|p| Path::new(p).exists())
            .unwrap_or(false)
    }

    async fn run(mut self) -> MtceResult<()> {
        info!("host watchdog starting");
        loop {
            tokio::select! {
                _ = self.pet_interval.tick() => {
                    if let Some(kernel) = &self.kernel {
                        if let Err(e) = kernel.pet() {
                            error!("failed to pet kernel watchdog: {e}");
                        }
                    }
                }
                message = self.listener.recv() => {
                    self.handle_message(message);
                }
            }

            self.update_timer.poll();
            if self.update_timer.ring() {
                self.update_timer.start(self.config.hostwd_update_period * 2);
                if !self.locked_marker_present() {
                    self.decrement_grace();
                }
            }

            self.forced_reset_timer.poll();
            self.graceful_reboot_timer.poll();
            if self.forced_reset_timer.ring() || self.graceful_reboot_timer.ring() {
                self.reboot_now();
            }
        }
    }

    fn handle_message(&mut self, message: std::io::Result<PmonMessage>) {
        match message {
            Ok(PmonMessage::Healthy) => {
                self.grace_loops = self.config.hostwd_failure_threshold;
            }
            Ok(PmonMessage::Critical) => {
                self.declare_unhealthy();
            }
            Err(e) => {
                warn!("PMON datagram rejected: {e}");
            }
        }
    }

    fn decrement_grace(&mut self) {
        if self.grace_loops == 0 {
            self.declare_unhealthy();
            return;
        }
        self.grace_loops -= 1;
        if self.grace_loops == 0 {
            self.declare_unhealthy();
        }
    }

    fn declare_unhealthy(&mut self) {
        if self.locked_marker_present() {
            warn!("PMON quorum lost but node is locked; suppressing reboot");
            self.grace_loops = self.config.hostwd_failure_threshold;
            return;
        }

        if self.kdump_supported && self.config.hostwd_kdump_on_stall {
            self.force_crashdump();
        }

        self.emergency_log();
        self.forced_reset_timer.start(FORCE_REBOOT_DELAY);
        self.graceful_reboot_timer.start(GRACEFUL_REBOOT_DELAY);

        if !self.config.hostwd_reboot_on_err && !self.config.hostwd_kdump_on_stall {
            self.manage_quorum_failed();
        }
    }

    fn force_crashdump(&self) {
        if let Err(e) = kernel::force_crashdump() {
            error!("failed to force crash dump: {e}");
        }
    }

    fn emergency_log(&self) {
        if let Err(e) = kernel::emergency_log(&self.config.hostwd_console_path, "host watchdog: quorum failed") {
            error!("failed to write emergency log: {e}");
        }
    }

    /// `spec.md` §4.6 step 6: if neither crash-dump nor reboot-on-error is
    /// configured, allow the quorum-failed condition to clear instead of
    /// spinning forever.
    fn manage_quorum_failed(&mut self) {
        self.quorum = QuorumState::Healthy;
        self.grace_loops = self.config.hostwd_failure_threshold;
        self.forced_reset_timer.stop();
        self.graceful_reboot_timer.stop();
    }

    fn reboot_now(&mut self) {
        self.quorum = QuorumState::Failed;
        error!("host watchdog forcing reboot after quorum failure");
        if let Err(e) = kernel::sysrq_trigger('b') {
            error!("failed to trigger sysrq reboot: {e}");
        }
    }
}

async fn probe_kdump_support() -> bool {
    match tokio::process::Command::new("systemctl")
        .args(["is-active", "kdump"])
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

pub async fn run(config: HostwdConfig) -> anyhow::Result<()> {
    let watchdog = HostWatchdog::new(config).await?;
    watchdog.run().await?;
    Ok(())
}

// src/core/watchdog/kernel.rs

//! Kernel watchdog ioctl wrapper and sysrq-based crash-dump/reboot
//! triggers. Ported from `hostwHdlr.cpp`'s `kernel_watchdog_*` helpers.

use crate::core::errors::{MtceError, MtceResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

const WATCHDOG_PATH: &str = "/dev/watchdog";

// ioctl request codes from linux/watchdog.h (WDIOC_SETTIMEOUT / WDIOC_KEEPALIVE).
const WDIOC_KEEPALIVE: libc::c_ulong = 0x8004_5705;
const WDIOC_SETTIMEOUT: libc::c_ulong = 0xc004_5706;

pub struct KernelWatchdog {
    file: std::fs::File,
}

impl KernelWatchdog {
    pub fn open(period: Duration) -> MtceResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(WATCHDOG_PATH)
            .map_err(MtceError::from)?;

        let mut timeout: libc::c_int = period.as_secs() as libc::c_int;
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), WDIOC_SETTIMEOUT, &mut timeout) };
        if rc != 0 {
            return Err(MtceError::Fatal(format!(
                "WDIOC_SETTIMEOUT failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        Ok(Self { file })
    }

    pub fn pet(&self) -> MtceResult<()> {
        let mut dummy: libc::c_int = 0;
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), WDIOC_KEEPALIVE, &mut dummy) };
        if rc != 0 {
            return Err(MtceError::Fatal(format!(
                "WDIOC_KEEPALIVE failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }

    /// Magic close: writing a single 'V' byte before the descriptor closes
    /// disarms the watchdog instead of leaving it running. This contract
    /// is kernel-observable and the exact byte must not change
    /// (`spec.md` §9).
    pub fn disarm(mut self) -> MtceResult<()> {
        self.file.write_all(b"V").map_err(MtceError::from)?;
        Ok(())
    }
}

pub fn force_crashdump() -> MtceResult<()> {
    write_sysrq("1")?;
    write_sysrq("c")?;
    Ok(())
}

pub fn sysrq_trigger(command: char) -> MtceResult<()> {
    write_sysrq(&command.to_string())
}

fn write_sysrq(value: &str) -> MtceResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .open("/proc/sysrq-trigger")
        .map_err(MtceError::from)?;
    file.write_all(value.as_bytes()).map_err(MtceError::from)?;
    Ok(())
}

pub fn emergency_log(console_path: &str, message: &str) -> MtceResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(console_path)
        .map_err(MtceError::from)?;
    writeln!(file, "{message}").map_err(MtceError::from)?;
    Ok(())
}

/// Checks whether the system is stopping (shutting down) so the daemon
/// can decide whether to disarm the watchdog on exit (`spec.md` §4.6
/// step 7).
pub async fn system_is_stopping() -> bool {
    match tokio::process::Command::new("systemctl")
        .args(["is-system-running"])
        .output()
        .await
    {
        Ok(output) => {
            let state = String::from_utf8_lossy(&output.stdout);
            state.trim() == "stopping"
        }
        Err(_) => false,
    }
}

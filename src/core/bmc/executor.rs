// src/core/bmc/executor.rs

//! The BMC worker pool: a bounded set of async workers that shell out to an
//! out-of-band management CLI, exactly the "fork a helper process" pattern
//! `spec.md` §9 says to keep, wrapped as a typed request submitted to a
//! bounded pool rather than invoked inline.

use crate::core::bmc::types::{BmcCommand, BmcOutcome, BmcRequest, BmcResult};
use crate::core::errors::MtceError;
use crate::core::node::types::Protocol;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};
use uuid::Uuid;

/// Runs a BMC request using the platform protocol tool. Abstracted behind
/// a trait so tests can substitute a fake without shelling out.
#[async_trait::async_trait]
pub trait ProtocolRunner: Send + Sync {
    async fn run(&self, request: &BmcRequest) -> Result<Option<String>, MtceError>;
}

/// Default runner: shells out to the protocol CLI. Left unimplemented at
/// the process-spawn boundary deliberately — `spec.md` §1 scopes "the
/// implementation of the two BMC protocol tools" out; callers needing real
/// hardware access provide their own `ProtocolRunner`.
#[derive(Debug, Default)]
pub struct ShellProtocolRunner;

#[async_trait::async_trait]
impl ProtocolRunner for ShellProtocolRunner {
    async fn run(&self, request: &BmcRequest) -> Result<Option<String>, MtceError> {
        debug!(
            hostname = %request.hostname,
            command = request.command.as_ref(),
            "shelling out to BMC protocol tool"
        );
        Err(MtceError::Transient("no protocol runner configured".to_string()))
    }
}

/// Cheap, `Clone`-able submission handle into a running `BmcExecutor`'s
/// request channel. Handed to `HandlerContext` so sync handler `tick()`
/// code can enqueue a request without needing `&mut BmcExecutor` or an
/// `.await` point of its own.
#[derive(Clone)]
pub struct BmcHandle {
    pub(crate) sender: mpsc::Sender<BmcRequest>,
}

impl BmcHandle {
    /// Builds a handle backed by a channel with no worker draining it.
    /// Only useful where a `HandlerContext` needs *a* handle and the test
    /// never expects a submitted request to be serviced.
    #[cfg(test)]
    pub fn detached() -> Self {
        let (sender, _rx) = mpsc::channel(16);
        Self { sender }
    }

    /// Non-blocking enqueue. `Transient` if the pool is momentarily
    /// saturated (caller's stage timer will retry it next tick), `Fatal`
    /// if every worker has gone away.
    pub fn submit(&self, request: BmcRequest) -> Result<(), MtceError> {
        self.sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                MtceError::Transient("BMC executor queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                MtceError::Fatal("BMC executor pool closed".to_string())
            }
        })
    }
}

pub struct BmcExecutor {
    handle: BmcHandle,
    results: mpsc::Receiver<BmcResult>,
}

impl BmcExecutor {
    /// `redfish_dir`/`ipmi_dir` mirror the original's
    /// `REDFISHTOOL_OUTPUT_DIR` / `IPMITOOL_OUTPUT_DIR` split
    /// (`mtce-common/src/common/bmcUtil.cpp`): each protocol's credential
    /// file lands in its own directory rather than sharing one.
    pub fn spawn(
        pool_size: usize,
        retry_limit: u32,
        redfish_dir: PathBuf,
        ipmi_dir: PathBuf,
        runner: Arc<dyn ProtocolRunner>,
    ) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<BmcRequest>(256);
        let (res_tx, res_rx) = mpsc::channel::<BmcResult>(256);
        let req_rx = Arc::new(tokio::sync::Mutex::new(req_rx));
        let permits = Arc::new(Semaphore::new(pool_size));

        for worker_id in 0..pool_size {
            let req_rx = Arc::clone(&req_rx);
            let res_tx = res_tx.clone();
            let runner = Arc::clone(&runner);
            let permits = Arc::clone(&permits);
            let redfish_dir = redfish_dir.clone();
            let ipmi_dir = ipmi_dir.clone();
            tokio::spawn(async move {
                loop {
                    let request = {
                        let mut rx = req_rx.lock().await;
                        rx.recv().await
                    };
                    let Some(request) = request else {
                        break;
                    };
                    let _permit = permits.acquire().await.expect("semaphore closed");
                    debug!(worker_id, hostname = %request.hostname, "BMC worker picked up request");
                    let outcome = run_with_retry(
                        runner.as_ref(),
                        &request,
                        retry_limit,
                        &redfish_dir,
                        &ipmi_dir,
                    )
                    .await;
                    let result = BmcResult {
                        request_id: request.id,
                        hostname: request.hostname.clone(),
                        command: request.command,
                        outcome,
                    };
                    if res_tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }

        Self {
            handle: BmcHandle { sender: req_tx },
            results: res_rx,
        }
    }

    pub fn handle(&self) -> BmcHandle {
        self.handle.clone()
    }

    /// Drains all results currently available without blocking, for the
    /// daemon tick's "step the BMC executor's thread handler" step
    /// (`spec.md` §4.4 step 4).
    pub fn drain(&mut self) -> Vec<BmcResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.results.try_recv() {
            results.push(result);
        }
        results
    }
}

async fn run_with_retry(
    runner: &dyn ProtocolRunner,
    request: &BmcRequest,
    retry_limit: u32,
    redfish_dir: &Path,
    ipmi_dir: &Path,
) -> BmcOutcome {
    let credential_dir = match request.protocol {
        Protocol::Ipmi => ipmi_dir,
        Protocol::Redfish | Protocol::Dynamic => redfish_dir,
    };
    let credential = match write_credential_file(credential_dir, &request.hostname).await {
        Ok(path) => path,
        Err(e) => return BmcOutcome::Fatal(format!("credential file: {e}")),
    };

    let mut request = request.clone();
    request.credential_path = credential.clone();

    let mut attempt = 0;
    let outcome = loop {
        attempt += 1;
        match runner.run(&request).await {
            Ok(payload) => break BmcOutcome::Success { payload },
            Err(MtceError::Transient(_)) if attempt <= retry_limit => {
                warn!(hostname = %request.hostname, attempt, "transient BMC failure, retrying");
                continue;
            }
            Err(MtceError::Transient(msg)) => break BmcOutcome::Transient(msg),
            Err(e) => break BmcOutcome::Fatal(e.to_string()),
        }
    };

    // Removed after the worker reaps the result, per the resolution in
    // DESIGN.md of the unlink-timing open question.
    if let Err(e) = tokio::fs::remove_file(&credential).await {
        warn!(path = %credential.display(), error = %e, "failed to remove BMC credential file");
    }

    outcome
}

async fn write_credential_file(dir: &Path, hostname: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let suffix = Uuid::new_v4().simple().to_string();
    let path = dir.join(format!(".bmc-{hostname}-{suffix}"));
    tokio::fs::write(&path, b"").await?;
    let mut perms = tokio::fs::metadata(&path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(&path, perms).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyRunner {
        failures_before_success: AtomicU32,
    }

    #[async_trait]
    impl ProtocolRunner for FlakyRunner {
        async fn run(&self, _request: &BmcRequest) -> Result<Option<String>, MtceError> {
            let remaining = self.failures_before_success.fetch_update(
                Ordering::SeqCst,
                Ordering::SeqCst,
                |v| if v == 0 { None } else { Some(v - 1) },
            );
            if remaining.is_ok() {
                Err(MtceError::Transient("tool exited non-zero".to_string()))
            } else {
                Ok(Some("ok".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let redfish_dir = tempfile::tempdir().unwrap();
        let ipmi_dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FlakyRunner {
            failures_before_success: AtomicU32::new(2),
        });
        let mut executor = BmcExecutor::spawn(
            2,
            5,
            redfish_dir.path().to_path_buf(),
            ipmi_dir.path().to_path_buf(),
            runner,
        );

        executor
            .handle()
            .submit(BmcRequest {
                id: Uuid::new_v4(),
                hostname: "compute-0".to_string(),
                bmc_ip: "10.0.0.5".to_string(),
                bmc_username: "root".to_string(),
                protocol: Protocol::Ipmi,
                command: BmcCommand::PowerStatus,
                credential_path: PathBuf::new(),
            })
            .unwrap();

        let mut results = Vec::new();
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            results.append(&mut executor.drain());
            if !results.is_empty() {
                break;
            }
        }
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].outcome, BmcOutcome::Success { .. }));
    }
}

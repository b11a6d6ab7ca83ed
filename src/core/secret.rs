// src/core/secret.rs

//! The secret-fetch state machine: two HTTP round-trips per host uuid
//! against a Barbican-like secret store, gating BMC operations that need a
//! password. Ported from `secretUtil.cpp`'s `MTC_SECRET__*` stages.

use crate::core::errors::MtceError;
use crate::core::timer::Timer;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStage {
    Start,
    GetRef,
    GetRefRecv,
    GetRefFail,
    GetPwd,
    GetPwdRecv,
    GetPwdFail,
}

#[derive(Debug, Deserialize)]
struct SecretRefResponse {
    #[serde(rename = "secret_ref")]
    secret_ref: Option<String>,
    secrets: Option<Vec<SecretRefEntry>>,
}

#[derive(Debug, Deserialize)]
struct SecretRefEntry {
    secret_ref: String,
}

#[derive(Debug, Clone)]
pub struct SecretFetcher {
    client: reqwest::Client,
    base_url: String,
    host_uuid: Uuid,
    secret_name: String,
    stage: SecretStage,
    timer: Timer,
    retry_delay: Duration,
    reference_id: Option<String>,
    payload: Option<String>,
}

impl SecretFetcher {
    pub fn new(
        base_url: impl Into<String>,
        host_uuid: Uuid,
        secret_name: impl Into<String>,
        retry_delay: Duration,
    ) -> Self {
        let mut fetcher = Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            host_uuid,
            secret_name: secret_name.into(),
            stage: SecretStage::Start,
            timer: Timer::new(),
            retry_delay,
            reference_id: None,
            payload: None,
        };
        fetcher.timer.start(Duration::from_millis(1));
        fetcher
    }

    pub fn stage(&self) -> SecretStage {
        self.stage
    }

    /// `true` once the fetcher has a usable (possibly empty, meaning "use
    /// local credentials") payload the FSM may schedule a BMC command
    /// against (`spec.md` §4.3 contract).
    pub fn ready(&self) -> bool {
        self.stage == SecretStage::GetPwdRecv
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Steps the state machine once. Must be called every tick; actual
    /// network I/O only happens when the armed timer rings, keeping this
    /// non-blocking from the caller's perspective.
    pub async fn tick(&mut self) {
        self.timer.poll();
        if !self.timer.ring() {
            return;
        }

        match self.stage {
            SecretStage::Start | SecretStage::GetRefFail => {
                self.fetch_reference().await;
            }
            SecretStage::GetRefRecv | SecretStage::GetPwdFail => {
                self.fetch_payload().await;
            }
            _ => {}
        }
    }

    async fn fetch_reference(&mut self) {
        self.stage = SecretStage::GetRef;
        let url = format!("{}?name={}", self.base_url, self.secret_name);
        match self.get_json::<SecretRefResponse>(&url).await {
            Ok(body) => {
                let reference = body
                    .secret_ref
                    .or_else(|| body.secrets.and_then(|mut s| s.pop().map(|e| e.secret_ref)))
                    .and_then(|url| url.rsplit('/').next().map(str::to_string));
                match reference {
                    Some(reference) => {
                        self.reference_id = Some(reference);
                        self.stage = SecretStage::GetRefRecv;
                        self.timer.start(Duration::from_millis(1));
                    }
                    None => self.fail(SecretStage::GetRefFail),
                }
            }
            Err(_) => self.fail(SecretStage::GetRefFail),
        }
    }

    async fn fetch_payload(&mut self) {
        let Some(reference) = self.reference_id.clone() else {
            self.fail(SecretStage::GetRefFail);
            return;
        };
        self.stage = SecretStage::GetPwd;
        let url = format!("{}/{reference}/payload", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                self.payload = Some(String::new());
                self.stage = SecretStage::GetPwdRecv;
            }
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => {
                    self.payload = Some(text);
                    self.stage = SecretStage::GetPwdRecv;
                }
                Err(_) => self.fail(SecretStage::GetPwdFail),
            },
            _ => self.fail(SecretStage::GetPwdFail),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, MtceError> {
        let resp = self.client.get(url).send().await?;
        let body = resp.json::<T>().await?;
        Ok(body)
    }

    fn fail(&mut self, stage: SecretStage) {
        self.stage = stage;
        self.timer.start(self.retry_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_in_start_stage_and_not_ready() {
        let fetcher = SecretFetcher::new(
            "http://localhost:9311/v1/secrets",
            Uuid::new_v4(),
            "bmc-pw",
            Duration::from_secs(10),
        );
        assert_eq!(fetcher.stage(), SecretStage::Start);
        assert!(!fetcher.ready());
    }

    #[tokio::test]
    async fn timer_ring_advances_from_start_to_get_ref() {
        let mut fetcher = SecretFetcher::new(
            "http://127.0.0.1:1".to_string(),
            Uuid::new_v4(),
            "bmc-pw",
            Duration::from_secs(10),
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
        fetcher.tick().await;
        // connection refused -> GetRefFail, not stuck in Start.
        assert_eq!(fetcher.stage(), SecretStage::GetRefFail);
    }
}

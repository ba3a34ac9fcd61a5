//! Blocking client for the remote agent service.
use crate::msg::{Ack, ActionBatch, EnvironmentBatch, ExchangeBatch};
use log::warn;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

/// Deadline applied to action exchanges until [`AgentClient::set_timeout`]
/// is called.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks to the remote agent over two blocking unary calls.
///
/// The client is a thin transport wrapper: it never retries and it never
/// returns an error to the caller. A transport failure, a non-success
/// status, a timeout, or an undecodable body all collapse to "no response";
/// what to do about that is the orchestrator's decision.
pub struct AgentClient {
    client: Client,

    /// Base URL of the agent service.
    base_url: String,

    /// Per-call deadline for action exchanges.
    timeout: Duration,
}

impl AgentClient {
    /// Creates a client for the agent service at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.as_ref().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the deadline for [`AgentClient::send_action_results`].
    ///
    /// Takes effect from the next call on; an in-flight call keeps the
    /// deadline it started with.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The currently configured exchange deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delivers the per-entity environment descriptors.
    ///
    /// Returns `false` on transport failure, a non-success status, or a
    /// missing/negative acknowledgment. Must be called at most once per
    /// episode, before any exchange.
    pub fn send_environments(&self, envs: &EnvironmentBatch) -> bool {
        match self.post(self.url("environments"), envs, None) {
            Ok(resp) if resp.status().is_success() => match resp.json::<Ack>() {
                Ok(ack) => {
                    if !ack.success {
                        warn!("remote agent refused the environment descriptors");
                    }
                    ack.success
                }
                Err(e) => {
                    warn!("undecodable environment acknowledgment: {}", e);
                    false
                }
            },
            Ok(resp) => {
                warn!("environment delivery failed with status {}", resp.status());
                false
            }
            Err(e) => {
                warn!("environment delivery failed: {}", e);
                false
            }
        }
    }

    /// Reports accumulated rewards and observations, blocking up to the
    /// configured deadline for the agent's actions.
    ///
    /// `None` covers every failure uniformly: transport error, non-success
    /// status, deadline expiry, undecodable body. A returned batch carries
    /// no length guarantee; checking the action count against the entity
    /// count is the caller's job.
    pub fn send_action_results(&self, batch: &ExchangeBatch) -> Option<ActionBatch> {
        match self.post(self.url("action-results"), batch, Some(self.timeout)) {
            Ok(resp) if resp.status().is_success() => match resp.json::<ActionBatch>() {
                Ok(actions) => Some(actions),
                Err(e) => {
                    warn!("undecodable action batch: {}", e);
                    None
                }
            },
            Ok(resp) => {
                warn!("exchange failed with status {}", resp.status());
                None
            }
            Err(e) => {
                warn!("exchange failed: {}", e);
                None
            }
        }
    }

    fn url(&self, api: impl AsRef<str>) -> String {
        format!("{}/v1/agent/{}", self.base_url, api.as_ref())
    }

    fn post(
        &self,
        url: String,
        params: &impl Serialize,
        deadline: Option<Duration>,
    ) -> reqwest::Result<reqwest::blocking::Response> {
        let mut req = self.client.post(url).json(params);
        if let Some(deadline) = deadline {
            req = req.timeout(deadline);
        }
        req.send()
    }
}

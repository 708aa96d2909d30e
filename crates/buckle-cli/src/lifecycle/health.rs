//! Readiness polling against the server's HTTP health endpoint.
//!
//! [`HealthWaiter`] repeatedly probes the endpoint until it answers with a
//! success status, the overall budget runs out, the caller's predicate asks it
//! to stop, or the cancellation token fires. Each probe is bounded by the
//! per-request timeout clipped to the remaining budget, so a slow endpoint can
//! never push the wait past its deadline by more than one poll slice.

use std::num::NonZeroU16;
use std::time::{Duration, Instant};

use buckle_config::Config;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::trace;
use url::Url;

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use super::shutdown::CancellationToken;

/// Why a single health probe did not report readiness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ProbeFailure {
    #[error("health endpoint answered with status {status}")]
    Status { status: u16 },
    #[error("health request failed: {message}")]
    Transport { message: String },
}

/// Performs one health request.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait HealthProbe {
    fn probe(&self, url: &Url, timeout: Duration) -> Result<(), ProbeFailure>;
}

/// Blocking HTTP probe. Any 2xx status counts as healthy.
#[derive(Debug, Clone)]
pub(crate) struct HttpHealthProbe {
    client: Client,
}

impl HttpHealthProbe {
    pub(crate) fn new() -> Result<Self, LifecycleError> {
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|source| LifecycleError::HttpClient { source })?;
        Ok(Self { client })
    }
}

impl HealthProbe for HttpHealthProbe {
    fn probe(&self, url: &Url, timeout: Duration) -> Result<(), ProbeFailure> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .map_err(|error| ProbeFailure::Transport {
                message: error.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeFailure::Status {
                status: status.as_u16(),
            })
        }
    }
}

/// Timing knobs for the readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HealthPolicy {
    pub(crate) overall_timeout: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) poll_interval: Duration,
}

impl HealthPolicy {
    pub(crate) const fn from_config(config: &Config) -> Self {
        Self {
            overall_timeout: config.health_timeout(),
            request_timeout: config.health_request_timeout(),
            poll_interval: config.health_poll_interval(),
        }
    }
}

/// Where the server's health endpoint lives, independent of the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HealthEndpoint {
    host: String,
    path: String,
}

impl HealthEndpoint {
    pub(crate) fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(config.health_host(), config.health_path())
    }

    /// Root URL of the server, also used when opening the browser.
    pub(crate) fn base_url(&self, port: NonZeroU16) -> Result<Url, LifecycleError> {
        let address = format!("http://{}:{port}/", self.host);
        Url::parse(&address).map_err(|source| LifecycleError::HealthUrl { address, source })
    }

    pub(crate) fn health_url(&self, port: NonZeroU16) -> Result<Url, LifecycleError> {
        let base = self.base_url(port)?;
        base.join(&self.path)
            .map_err(|source| LifecycleError::HealthUrl {
                address: format!("{base}{}", self.path),
                source,
            })
    }
}

/// Counters describing a finished wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WaitReport {
    pub(crate) attempts: u32,
    pub(crate) elapsed: Duration,
    pub(crate) last_failure: Option<ProbeFailure>,
}

/// Result of [`HealthWaiter::wait_until_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Ready(WaitReport),
    TimedOut(WaitReport),
    /// The cancellation token fired.
    Cancelled,
    /// The caller's predicate asked the wait to stop.
    Abandoned,
}

/// Polls a [`HealthProbe`] under a [`HealthPolicy`].
#[derive(Debug)]
pub(crate) struct HealthWaiter<P> {
    probe: P,
    policy: HealthPolicy,
}

impl<P: HealthProbe> HealthWaiter<P> {
    pub(crate) const fn new(probe: P, policy: HealthPolicy) -> Self {
        Self { probe, policy }
    }

    /// Waits until `url` reports healthy.
    ///
    /// `keep_waiting` is consulted before every attempt; returning `false`
    /// ends the wait with [`WaitOutcome::Abandoned`].
    pub(crate) fn wait_until_ready<F>(
        &self,
        url: &Url,
        cancel: &CancellationToken,
        mut keep_waiting: F,
    ) -> WaitOutcome
    where
        F: FnMut() -> bool,
    {
        let started = Instant::now();
        let deadline = started + self.policy.overall_timeout;
        let mut attempts: u32 = 0;
        let mut last_failure = None;

        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            if !keep_waiting() {
                return WaitOutcome::Abandoned;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            attempts = attempts.saturating_add(1);
            match self
                .probe
                .probe(url, self.policy.request_timeout.min(remaining))
            {
                Ok(()) => {
                    return WaitOutcome::Ready(WaitReport {
                        attempts,
                        elapsed: started.elapsed(),
                        last_failure,
                    });
                }
                Err(failure) => {
                    trace!(
                        target: LIFECYCLE_TARGET,
                        attempt = attempts,
                        url = %url,
                        error = %failure,
                        "health probe failed"
                    );
                    last_failure = Some(failure);
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if !cancel.sleep(self.policy.poll_interval.min(remaining)) {
                return WaitOutcome::Cancelled;
            }
        }

        WaitOutcome::TimedOut(WaitReport {
            attempts,
            elapsed: started.elapsed(),
            last_failure,
        })
    }
}

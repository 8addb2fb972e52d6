//! Poll service configuration.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix of the environment variables read by [`PollServiceConfig::from_env`].
pub const ENV_PREFIX: &str = "POLL_SERVICE_";

/// Configuration for a [`PollServiceManager`](crate::core::PollServiceManager).
///
/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollServiceConfig {
    /// Number of worker threads. Fixed for the life of the service.
    pub worker_count: usize,
    /// How long a request may wait for events, measured from admission (ms).
    pub poll_timeout_ms: u64,
    /// Pause between partition cycles, and the idle wait when the queue is empty (ms).
    pub dispatch_interval_ms: u64,
    /// How long an idle worker blocks before re-checking for shutdown (ms).
    pub worker_idle_ms: u64,
    /// Admission limit for the shared queue. `None` accepts without bound.
    pub max_queue_depth: Option<usize>,
    /// Grace period for each thread to exit during `stop` before it is detached (ms).
    pub shutdown_grace_ms: u64,
    /// Stack size for worker and dispatcher threads (bytes).
    pub thread_stack_size: usize,
    /// Thread name prefix (`{prefix}-worker-{i}`, `{prefix}-dispatcher`).
    pub thread_name_prefix: String,
}

impl Default for PollServiceConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            poll_timeout_ms: 30_000,
            dispatch_interval_ms: 100,
            worker_idle_ms: 50,
            max_queue_depth: None,
            shutdown_grace_ms: 2_000,
            thread_stack_size: 2 * 1024 * 1024,
            thread_name_prefix: "poll".to_string(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{key}: {e}"))
}

impl PollServiceConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout_ms = millis(timeout);
        self
    }

    /// Set the dispatch interval.
    #[must_use]
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval_ms = millis(interval);
        self
    }

    /// Set the worker idle wait.
    #[must_use]
    pub fn with_worker_idle(mut self, idle: Duration) -> Self {
        self.worker_idle_ms = millis(idle);
        self
    }

    /// Bound the shared queue.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = Some(depth);
        self
    }

    /// Set the per-thread shutdown grace period.
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = millis(grace);
        self
    }

    /// Set the thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Poll timeout as a `Duration`.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Dispatch interval as a `Duration`.
    #[must_use]
    pub const fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    /// Worker idle wait as a `Duration`.
    #[must_use]
    pub const fn worker_idle(&self) -> Duration {
        Duration::from_millis(self.worker_idle_ms)
    }

    /// Shutdown grace period as a `Duration`.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.poll_timeout_ms == 0 {
            return Err("poll_timeout_ms must be greater than 0".into());
        }
        if self.dispatch_interval_ms == 0 {
            return Err("dispatch_interval_ms must be greater than 0".into());
        }
        if self.worker_idle_ms == 0 {
            return Err("worker_idle_ms must be greater than 0".into());
        }
        if self.max_queue_depth == Some(0) {
            return Err("max_queue_depth must be greater than 0 when set".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `POLL_SERVICE_*` environment variables over
    /// the defaults, loading a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable variable or invalid field.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Build configuration from a key lookup (keys without the `POLL_SERVICE_` prefix).
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable value or invalid field.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup("WORKER_COUNT") {
            cfg.worker_count = parse_var("WORKER_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("POLL_TIMEOUT_MS") {
            cfg.poll_timeout_ms = parse_var("POLL_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("DISPATCH_INTERVAL_MS") {
            cfg.dispatch_interval_ms = parse_var("DISPATCH_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("WORKER_IDLE_MS") {
            cfg.worker_idle_ms = parse_var("WORKER_IDLE_MS", &raw)?;
        }
        if let Some(raw) = lookup("MAX_QUEUE_DEPTH") {
            cfg.max_queue_depth = Some(parse_var("MAX_QUEUE_DEPTH", &raw)?);
        }
        if let Some(raw) = lookup("SHUTDOWN_GRACE_MS") {
            cfg.shutdown_grace_ms = parse_var("SHUTDOWN_GRACE_MS", &raw)?;
        }
        if let Some(raw) = lookup("THREAD_STACK_SIZE") {
            cfg.thread_stack_size = parse_var("THREAD_STACK_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("THREAD_NAME_PREFIX") {
            cfg.thread_name_prefix = raw;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

//! Health/diagnostic monitor.
//!
//! `Idle -> Sampling -> Idle`. While sampling, a background task emits
//! [`DiagnosticSnapshot`]s (at most one per `sample_interval`) and re-attempts
//! extraction every `reattempt_interval`, giving up after `max_reattempts`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use panelbridge_config::MonitorConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How often the sampler checks its [`RateGate`].
const SAMPLE_POLL: Duration = Duration::from_secs(1);

/// Shortest interval the sampler will run with; `tokio::time::interval`
/// panics on zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Point-in-time view of the host page, for diagnosing failed extractions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub taken_at: DateTime<Utc>,
    pub in_document: bool,
    pub paragraph_count: usize,
    pub body_child_count: usize,
    pub has_editor: bool,
    pub has_content: bool,
    pub consecutive_failures: u32,
}

/// Lets at most one event through per interval.
#[derive(Debug, Clone)]
pub struct RateGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` and records `now` if an interval has passed since the
    /// last admitted event.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// What the sampler needs from the extractor.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn snapshot(&self) -> DiagnosticSnapshot;

    /// Re-run extraction; `true` if it produced content.
    async fn reattempt(&self) -> bool;
}

/// Timings for the sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub sample_interval: Duration,
    pub reattempt_interval: Duration,
    pub max_reattempts: u32,
}

impl MonitorSettings {
    fn clamped(mut self) -> Self {
        self.sample_interval = self.sample_interval.max(MIN_INTERVAL);
        self.reattempt_interval = self.reattempt_interval.max(MIN_INTERVAL);
        self
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            enabled: config.enabled,
            sample_interval: Duration::from_millis(config.sample_interval_ms),
            reattempt_interval: Duration::from_millis(config.reattempt_interval_ms),
            max_reattempts: config.max_reattempts,
        }
        .clamped()
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

struct Active {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct State {
    active: Option<Active>,
    generation: u64,
}

/// Owner of the sampling task. `start` and `stop` are idempotent.
#[derive(Clone)]
pub struct MonitorHandle {
    settings: MonitorSettings,
    state: Arc<Mutex<State>>,
    sink: Option<mpsc::UnboundedSender<DiagnosticSnapshot>>,
}

impl MonitorHandle {
    pub fn new(
        settings: MonitorSettings,
        sink: Option<mpsc::UnboundedSender<DiagnosticSnapshot>>,
    ) -> Self {
        Self {
            settings: settings.clamped(),
            state: Arc::new(Mutex::new(State::default())),
            sink,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Start sampling unless already active. Returns whether a task was
    /// spawned.
    pub fn start(&self, probe: Weak<dyn HealthProbe>) -> bool {
        if !self.settings.enabled {
            return false;
        }

        let (generation, token) = {
            let mut state = self.state.lock();
            if state.active.is_some() {
                return false;
            }
            state.generation += 1;
            let token = CancellationToken::new();
            state.active = Some(Active {
                generation: state.generation,
                token: token.clone(),
            });
            (state.generation, token)
        };

        info!("Extraction failing, starting health monitor");
        let task = Sampler {
            settings: self.settings.clone(),
            state: Arc::clone(&self.state),
            sink: self.sink.clone(),
            probe,
            generation,
            token,
        };
        tokio::spawn(task.run());
        true
    }

    /// Stop sampling if active. Returns whether anything was stopped.
    pub fn stop(&self) -> bool {
        let active = self.state.lock().active.take();
        match active {
            Some(active) => {
                active.token.cancel();
                info!("Extraction recovered, health monitor stopped");
                true
            }
            None => false,
        }
    }
}

struct Sampler {
    settings: MonitorSettings,
    state: Arc<Mutex<State>>,
    sink: Option<mpsc::UnboundedSender<DiagnosticSnapshot>>,
    probe: Weak<dyn HealthProbe>,
    generation: u64,
    token: CancellationToken,
}

impl Sampler {
    async fn run(self) {
        let mut gate = RateGate::new(self.settings.sample_interval);
        let mut sample_tick = interval(SAMPLE_POLL.min(self.settings.sample_interval));
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let reattempt_every = self.settings.reattempt_interval;
        let mut reattempt_tick = interval_at(Instant::now() + reattempt_every, reattempt_every);
        reattempt_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reattempts = 0u32;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = sample_tick.tick() => {
                    if !gate.try_acquire(Instant::now()) {
                        continue;
                    }
                    let Some(probe) = self.probe.upgrade() else { break };
                    let snapshot = probe.snapshot();
                    debug!(
                        in_document = snapshot.in_document,
                        paragraphs = snapshot.paragraph_count,
                        body_children = snapshot.body_child_count,
                        has_editor = snapshot.has_editor,
                        has_content = snapshot.has_content,
                        failures = snapshot.consecutive_failures,
                        "Extraction diagnostics"
                    );
                    if let Some(sink) = &self.sink {
                        let _ = sink.send(snapshot);
                    }
                }
                _ = reattempt_tick.tick() => {
                    if reattempts >= self.settings.max_reattempts {
                        info!(reattempts, "Reattempt limit reached, monitoring stopped");
                        break;
                    }
                    let Some(probe) = self.probe.upgrade() else { break };
                    reattempts += 1;
                    debug!(reattempt = reattempts, "Re-attempting extraction");
                    if probe.reattempt().await {
                        break;
                    }
                    if reattempts >= self.settings.max_reattempts {
                        info!(reattempts, "Reattempt limit reached, monitoring stopped");
                        break;
                    }
                }
            }
        }
    }
}

// Runs on every exit path, including a panic inside the task.
impl Drop for Sampler {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state
            .active
            .as_ref()
            .is_some_and(|a| a.generation == self.generation)
        {
            state.active = None;
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

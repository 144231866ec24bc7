//! ==============================================================================
//! battery.rs - battery lab pressure/charge simulation
//! ==============================================================================
//!
//! purpose:
//!     the battery lab puzzle: players hold a lever to charge a bank of
//!     battery clusters. holding it builds pressure towards 100% over a hidden
//!     window of 3-8 seconds. let go in time and the pressure bleeds off;
//!     hold past the window and every cluster is dumped to 0 and the lever is
//!     locked until the pressure is fully back to 0.
//!
//! design:
//!     pure state machine. callers pass `now` in unix ms to every method,
//!     nothing here reads the clock (apart from the window jitter helper),
//!     so tests can drive it tick by tick.
//!
//! ```text
//!         lever down ──> charging ──(deadline)──> overrun: clusters = 0
//!             │              │                         │ penalty
//!             │          lever up                      ▼
//!             │              └────────> cooldown ──> pressure 0, unlocked
//!             └── ignored while penalty and pressure > 0
//! ```
//!
//! relationships:
//!     - used by: state.rs (behind a tokio Mutex)
//!     - used by: state.rs ticker (feeds show batteryLevel when enabled)
//!     - used by: api.rs (GET /api/battery, POST /api/battery/lever)
//!
//! ==============================================================================

use rand::Rng;
use serde::Serialize;

pub const MIN_WINDOW_MS: u64 = 3_000;
pub const WINDOW_JITTER_MS: u64 = 5_000;
const COOLDOWN_MS: u64 = 5_000;
const PENALTY_COOLDOWN_MS: u64 = 10_000;

// percent per second
const CHARGE_RATE: f64 = 100.0 / 8.0;
const DRAIN_RATE: f64 = 100.0 / 180.0;
const SHUTDOWN_DRAIN_RATE: f64 = 100.0;

const URGENT_PRESSURE: f64 = 70.0;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorPhase {
    Safe,
    Caution,
    Danger,
    Critical,
}

impl ColorPhase {
    pub fn from_pressure(pressure: f64) -> Self {
        if pressure >= 85.0 {
            Self::Critical
        } else if pressure >= 65.0 {
            Self::Danger
        } else if pressure >= 40.0 {
            Self::Caution
        } else {
            Self::Safe
        }
    }
}

/// result of moving the lever
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LeverOutcome {
    /// charging started; overrun happens at `deadline`
    Charging { deadline: u64 },
    /// lever locked by an overrun penalty
    Blocked,
    /// released; pressure bleeds off from here
    Released { pressure: f64 },
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ChargeWindow {
    started_at: u64,
    deadline: u64,
    pressure_at_start: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cooldown {
    started_at: u64,
    from_pressure: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatterySnapshot {
    pub clusters: Vec<f64>,
    pub lever: bool,
    pub is_charging: bool,
    /// first cluster that is not full, if any
    pub current_cluster: Option<usize>,
    pub is_warning: bool,
    pub color_phase: ColorPhase,
    pub cooldown_start_time: Option<u64>,
    pub pressure: f64,
    pub penalty: bool,
    pub all_depleted: bool,
    pub show_urgent_popup: bool,
    pub level: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatteryLab {
    clusters: Vec<f64>,
    lever: bool,
    pressure: f64,
    window: Option<ChargeWindow>,
    cooldown: Option<Cooldown>,
    penalty: bool,
    last_tick: Option<u64>,
}

impl BatteryLab {
    pub fn new(clusters: usize) -> Self {
        Self {
            clusters: vec![100.0; clusters.max(1)],
            lever: false,
            pressure: 0.0,
            window: None,
            cooldown: None,
            penalty: false,
            last_tick: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.clusters.len());
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn is_charging(&self) -> bool {
        self.window.is_some()
    }

    /// Average charge over all clusters, 0-100.
    pub fn level(&self) -> f64 {
        self.clusters.iter().sum::<f64>() / self.clusters.len() as f64
    }

    /// Move the lever. `window_ms` is how long the player may hold it
    /// before overrunning; use [`release_window_ms`] outside tests.
    pub fn set_lever(&mut self, pressed: bool, now: u64, window_ms: u64) -> LeverOutcome {
        if pressed == self.lever {
            return LeverOutcome::Unchanged;
        }
        self.lever = pressed;

        if pressed {
            if self.penalty && self.pressure > 0.0 {
                tracing::info!(pressure = self.pressure, "lever locked until pressure is back to 0");
                return LeverOutcome::Blocked;
            }
            let deadline = now + window_ms;
            self.penalty = false;
            self.cooldown = None;
            self.window = Some(ChargeWindow {
                started_at: now,
                deadline,
                pressure_at_start: self.pressure,
            });
            tracing::debug!(pressure = self.pressure, window_ms, "charging started");
            return LeverOutcome::Charging { deadline };
        }

        // every release bleeds off from wherever the pressure is now,
        // including after an overrun or a blocked press
        if self.window.take().is_some() {
            tracing::debug!(pressure = self.pressure, "released in time");
        }
        self.cooldown = Some(Cooldown { started_at: now, from_pressure: self.pressure });
        LeverOutcome::Released { pressure: self.pressure }
    }

    /// Advance the simulation to `now`.
    pub fn tick(&mut self, now: u64, shutdown: bool) {
        let elapsed_ms = self.last_tick.map_or(0, |last| now.saturating_sub(last));
        self.last_tick = Some(now);

        // the overrun happens at the deadline, however late this tick is
        if let Some(window) = self.window {
            if now >= window.deadline {
                self.overrun(window.deadline);
            }
        }

        self.pressure = self.next_pressure(now).clamp(0.0, 100.0);

        let step = elapsed_ms as f64 / 1000.0;
        if shutdown {
            self.drain(SHUTDOWN_DRAIN_RATE * step);
        } else if self.window.is_some() {
            self.charge(CHARGE_RATE * step);
        } else {
            self.drain(DRAIN_RATE * step);
        }
    }

    fn overrun(&mut self, at: u64) {
        tracing::warn!(at, "lever held too long, clusters discharged");
        self.clusters.iter_mut().for_each(|c| *c = 0.0);
        self.window = None;
        self.penalty = true;
        self.cooldown = Some(Cooldown { started_at: at, from_pressure: 100.0 });
    }

    fn next_pressure(&mut self, now: u64) -> f64 {
        if let Some(w) = self.window {
            let span = w.deadline.saturating_sub(w.started_at).max(1) as f64;
            let progress = (now.saturating_sub(w.started_at) as f64 / span).min(1.0);
            return w.pressure_at_start + (100.0 - w.pressure_at_start) * progress;
        }

        if let Some(c) = self.cooldown {
            let duration = (if self.penalty { PENALTY_COOLDOWN_MS } else { COOLDOWN_MS }) as f64;
            let progress = (now.saturating_sub(c.started_at) as f64 / duration).min(1.0);
            if progress >= 1.0 {
                self.cooldown = None;
                if self.penalty {
                    tracing::info!("pressure back to 0, lever unlocked");
                }
                self.penalty = false;
                return 0.0;
            }
            return c.from_pressure * (1.0 - progress);
        }

        self.pressure
    }

    fn charge(&mut self, amount: f64) {
        if let Some(cluster) = self.clusters.iter_mut().find(|c| **c < 100.0) {
            *cluster = (*cluster + amount).min(100.0);
        }
    }

    fn drain(&mut self, amount: f64) {
        if let Some(cluster) = self.clusters.iter_mut().rev().find(|c| **c > 0.0) {
            *cluster = (*cluster - amount).max(0.0);
        }
    }

    pub fn snapshot(&self) -> BatterySnapshot {
        let charging = self.window.is_some();
        BatterySnapshot {
            clusters: self.clusters.clone(),
            lever: self.lever,
            is_charging: charging,
            current_cluster: self.clusters.iter().position(|c| *c < 100.0),
            is_warning: charging,
            color_phase: ColorPhase::from_pressure(self.pressure),
            cooldown_start_time: self.cooldown.map(|c| c.started_at),
            pressure: self.pressure,
            penalty: self.penalty,
            all_depleted: self.clusters.iter().all(|c| *c <= 0.0),
            show_urgent_popup: charging && !self.penalty && self.pressure >= URGENT_PRESSURE,
            level: self.level(),
        }
    }
}

/// Hidden hold window: 3s plus up to 5s of jitter.
pub fn release_window_ms() -> u64 {
    rand::thread_rng().gen_range(MIN_WINDOW_MS..MIN_WINDOW_MS + WINDOW_JITTER_MS)
}

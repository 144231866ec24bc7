//! Shared application state.
//!
//! One [`AppState`] per process, handed to every request handler and to the
//! battery ticker as an `Arc`. Each concern sits behind its own lock so a
//! slow questionnaire write never stalls the 500ms status polls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::battery::BatteryLab;
use crate::config::HostConfig;
use crate::domain::now_ms;
use crate::errlog::ErrorLog;
use crate::questionnaire::Questionnaire;
use crate::show::ShowState;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    show: RwLock<ShowState>,
    questionnaire: Mutex<Questionnaire>,
    errors: RwLock<ErrorLog>,
    battery: Mutex<BatteryLab>,
    password: String,
    simulate_battery: bool,
}

impl AppState {
    /// Build the state from config, loading persisted questionnaire data.
    pub fn new(config: &HostConfig) -> SharedState {
        Arc::new(Self {
            show: RwLock::new(ShowState::new(&config.show, now_ms())),
            questionnaire: Mutex::new(Questionnaire::open(&config.storage)),
            errors: RwLock::new(ErrorLog::new(config.errors.capacity)),
            battery: Mutex::new(BatteryLab::new(config.battery.clusters)),
            password: config.auth.password.clone(),
            simulate_battery: config.battery.simulate,
        })
    }

    pub fn show(&self) -> &RwLock<ShowState> {
        &self.show
    }

    pub fn questionnaire(&self) -> &Mutex<Questionnaire> {
        &self.questionnaire
    }

    pub fn errors(&self) -> &RwLock<ErrorLog> {
        &self.errors
    }

    pub fn battery(&self) -> &Mutex<BatteryLab> {
        &self.battery
    }

    pub fn simulates_battery(&self) -> bool {
        self.simulate_battery
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        candidate == self.password
    }

    /// Put every screen back to the start of a run.
    ///
    /// Stats, scoreboard and the error log are kept.
    pub async fn reset_all(&self) {
        self.show.write().await.reset(now_ms());
        self.questionnaire.lock().await.reset_session();
        self.battery.lock().await.reset();
        tracing::info!("show reset");
    }

    /// One simulation step; pushes the lab level into the show state.
    pub async fn tick_battery(&self, now: u64) -> f64 {
        let shutdown = self.show.read().await.is_shutdown();
        let level = {
            let mut lab = self.battery.lock().await;
            lab.tick(now, shutdown);
            lab.level()
        };
        if let Err(e) = self.show.write().await.set_battery_level(level) {
            tracing::warn!(level, error = %e, "battery level rejected");
        }
        level
    }
}

/// Battery simulation loop, spawned next to the server when
/// `battery.simulate` is on. Late ticks are skipped, not replayed.
pub async fn run_battery_ticker(state: SharedState, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        state.tick_battery(now_ms()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dir: &tempfile::TempDir) -> SharedState {
        let mut config = HostConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        AppState::new(&config)
    }

    #[test]
    fn test_password_check() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        assert!(state.check_password("1234"));
        assert!(!state.check_password("12345"));
    }

    #[tokio::test]
    async fn test_reset_all_keeps_stats() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.show().write().await.set_shutdown(true);
        {
            let mut q = state.questionnaire().lock().await;
            q.set_team("raptors").unwrap();
            q.submit(&[(1, true)].into_iter().collect(), Some("raptors"), Some(3), 1);
        }

        state.reset_all().await;

        assert!(!state.show().read().await.is_shutdown());
        let q = state.questionnaire().lock().await;
        assert!(!q.session().started);
        assert_eq!(q.stats().len(), 1);
        assert_eq!(q.scores().len(), 1);
    }

    #[tokio::test]
    async fn test_tick_feeds_show_battery_level() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.show().write().await.set_shutdown(true);
        state.tick_battery(10_000).await;
        let level = state.tick_battery(10_250).await;
        assert!((level - 75.0).abs() < 1e-9);
        let status = state.show().read().await.status(0);
        assert!((status.battery_level - 75.0).abs() < 1e-9);
    }
}

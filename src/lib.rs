//! State server for a themed live-event installation.
//!
//! Holds the shared show state (shutdown, camera, phase, vitals, battery,
//! black-screen opacity) plus questionnaire stats, a scoreboard, a shared
//! quiz session and a capped client error log, and serves them as REST/JSON
//! to front-ends that poll every 500ms-3s.

pub mod api;
pub mod battery;
pub mod config;
pub mod domain;
pub mod errlog;
pub mod error;
pub mod logging;
pub mod questionnaire;
pub mod show;
pub mod state;
pub mod storage;

pub use config::HostConfig;
pub use error::{ApiError, Error, Result};
pub use state::{AppState, SharedState};

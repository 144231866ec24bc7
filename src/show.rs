//! ==============================================================================
//! show.rs - the show state record
//! ==============================================================================
//!
//! purpose:
//!     holds the values every screen in the attraction polls: shutdown flag,
//!     selected camera, content phase, vitals, overlay opacity and battery.
//!     every setter validates its input and leaves the record untouched on
//!     rejection. last writer wins.
//!
//! relationships:
//!     - used by: state.rs (behind a tokio RwLock)
//!     - used by: api.rs (one setter per POST route)
//!
//! ==============================================================================

use crate::config::ShowConfig;
use crate::domain::ShowStatus;
use crate::error::ApiError;

#[derive(Clone, Debug, PartialEq)]
pub struct ShowState {
    camera_count: u8,
    is_shutdown: bool,
    black_screen_opacity: f64,
    current_camera: u8,
    start_time: u64,
    phase: u32,
    vitals: Vec<bool>,
    battery_level: f64,
}

impl ShowState {
    pub fn new(config: &ShowConfig, start_time: u64) -> Self {
        Self {
            camera_count: config.camera_count,
            is_shutdown: false,
            black_screen_opacity: 0.0,
            current_camera: 1,
            start_time,
            phase: 0,
            vitals: vec![true; config.vital_count],
            battery_level: 100.0,
        }
    }

    pub fn status(&self, server_time: u64) -> ShowStatus {
        ShowStatus {
            is_shutdown: self.is_shutdown,
            black_screen_opacity: self.black_screen_opacity,
            current_camera: self.current_camera,
            start_time: self.start_time,
            server_time,
            phase: self.phase,
            vitals: self.vitals.clone(),
            battery_level: self.battery_level,
        }
    }

    pub fn camera_count(&self) -> u8 {
        self.camera_count
    }

    pub fn vital_count(&self) -> usize {
        self.vitals.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    pub fn set_shutdown(&mut self, shutdown: bool) -> bool {
        self.is_shutdown = shutdown;
        self.is_shutdown
    }

    pub fn set_camera(&mut self, camera: i64) -> Result<u8, ApiError> {
        if camera < 1 || camera > i64::from(self.camera_count) {
            return Err(camera_error(self.camera_count));
        }
        self.current_camera = camera as u8;
        Ok(self.current_camera)
    }

    pub fn set_phase(&mut self, phase: i64) -> Result<u32, ApiError> {
        let phase = u32::try_from(phase)
            .map_err(|_| ApiError::bad_request("phase must be a non-negative number"))?;
        self.phase = phase;
        Ok(self.phase)
    }

    pub fn set_vitals(&mut self, vitals: Vec<bool>) -> Result<&[bool], ApiError> {
        if vitals.len() != self.vitals.len() {
            return Err(vitals_error(self.vitals.len()));
        }
        self.vitals = vitals;
        Ok(&self.vitals)
    }

    pub fn set_black_screen_opacity(&mut self, opacity: f64) -> Result<f64, ApiError> {
        self.black_screen_opacity = percentage(opacity)
            .ok_or_else(|| ApiError::bad_request("opacity must be a number between 0 and 100"))?;
        Ok(self.black_screen_opacity)
    }

    pub fn set_battery_level(&mut self, level: f64) -> Result<f64, ApiError> {
        self.battery_level = percentage(level)
            .ok_or_else(|| ApiError::bad_request("level must be a number between 0 and 100"))?;
        Ok(self.battery_level)
    }

    /// Back to the opening state of a run, with a fresh start time.
    pub fn reset(&mut self, start_time: u64) {
        let vital_count = self.vitals.len();
        *self = Self::new(
            &ShowConfig { camera_count: self.camera_count, vital_count },
            start_time,
        );
    }
}

pub fn camera_error(camera_count: u8) -> ApiError {
    ApiError::bad_request(format!("camera must be 1-{camera_count}"))
}

pub fn vitals_error(vital_count: usize) -> ApiError {
    ApiError::bad_request(format!("vitals must be an array of {vital_count} booleans"))
}

fn percentage(value: f64) -> Option<f64> {
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

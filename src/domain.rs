use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// unix time in milliseconds
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// snapshot of the show state as served by `GET /api/status`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowStatus {
    pub is_shutdown: bool,
    /// 0-100, how dark the overlay on every screen is
    pub black_screen_opacity: f64,
    pub current_camera: u8,
    /// unix ms when the show was (re)started
    pub start_time: u64,
    /// unix ms at response time, lets clients correct for clock skew
    pub server_time: u64,
    pub phase: u32,
    pub vitals: Vec<bool>,
    /// 0-100
    pub battery_level: f64,
}

/// per-question answer tally
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct QuestionStat {
    pub total: u64,
    pub correct: u64,
}

/// question id -> tally
pub type QuestionStats = BTreeMap<u32, QuestionStat>;

/// one finished team on the scoreboard
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub team_name: String,
    pub score: u32,
    pub timestamp: u64,
}

/// an answer typed on a tablet
/// - single-field questions send a string
/// - multi-field questions send one string per field
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multi(Vec<String>),
}

/// shared record that keeps two quiz tablets in step
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSession {
    pub team_name: String,
    pub answers: BTreeMap<u32, AnswerValue>,
    pub started: bool,
    pub validated: bool,
    pub score: Option<u32>,
    pub stats: Option<QuestionStats>,
}

/// how a browser error was captured
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ClientErrorKind {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "unhandledrejection")]
    UnhandledRejection,
    #[serde(rename = "console.error")]
    ConsoleError,
}

/// an error reported by a front-end page
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ClientError {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// page path the error happened on
    pub source: String,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: ClientErrorKind,
}

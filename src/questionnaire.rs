//! ==============================================================================
//! questionnaire.rs - quiz stats, scoreboard and the shared tablet session
//! ==============================================================================
//!
//! purpose:
//!     - stats: how often each question was answered, and answered right.
//!       persisted so the numbers survive a restart between show days.
//!     - scoreboard: every team that submitted, in submission order.
//!     - session: one shared record the two quiz tablets poll to stay in step.
//!
//! ```text
//!     grading happens on the tablets. the server only tallies the
//!     per-question correctness it is sent.
//! ```
//!
//! relationships:
//!     - uses: storage.rs (stats and scores json files)
//!     - used by: state.rs, api.rs
//!
//! ==============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::StorageConfig;
use crate::domain::{AnswerValue, QuestionStats, QuestionnaireSession, ScoreEntry};
use crate::error::ApiError;
use crate::storage::JsonFile;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// ranked view of the scoreboard, as the scoring screen shows it
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub top: Vec<ScoreEntry>,
    /// most recent submission, shown separately when it did not make the top
    pub last: Option<ScoreEntry>,
    pub last_ranked: bool,
}

pub struct Questionnaire {
    stats: QuestionStats,
    scores: Vec<ScoreEntry>,
    session: QuestionnaireSession,
    stats_file: JsonFile<QuestionStats>,
    scores_file: JsonFile<Vec<ScoreEntry>>,
}

impl Questionnaire {
    /// Load persisted stats and scores. The session always starts empty.
    pub fn open(storage: &StorageConfig) -> Self {
        let stats_file = JsonFile::new(storage.stats_file());
        let scores_file = JsonFile::new(storage.scores_file());
        let stats: QuestionStats = stats_file.load_or_default();
        let scores: Vec<ScoreEntry> = scores_file.load_or_default();
        tracing::info!(questions = stats.len(), scores = scores.len(), "questionnaire data loaded");
        Self {
            stats,
            scores,
            session: QuestionnaireSession::default(),
            stats_file,
            scores_file,
        }
    }

    pub fn stats(&self) -> &QuestionStats {
        &self.stats
    }

    /// Tally one team's results.
    ///
    /// A named team with a score also lands on the scoreboard. The shared
    /// session is marked validated so the second tablet shows the outcome.
    pub fn submit(
        &mut self,
        results: &BTreeMap<u32, bool>,
        team_name: Option<&str>,
        score: Option<u32>,
        now: u64,
    ) -> QuestionStats {
        for (&id, &correct) in results {
            let stat = self.stats.entry(id).or_default();
            stat.total += 1;
            if correct {
                stat.correct += 1;
            }
        }
        self.stats_file.save_logged(&self.stats);

        let team_name = team_name.map(str::trim).filter(|t| !t.is_empty());
        if let (Some(team_name), Some(score)) = (team_name, score) {
            tracing::info!(team = team_name, score, "score recorded");
            self.scores.push(ScoreEntry {
                team_name: team_name.to_string(),
                score,
                timestamp: now,
            });
            self.scores_file.save_logged(&self.scores);
        }

        self.session.validated = true;
        self.session.score = score;
        self.session.stats = Some(self.stats.clone());
        self.stats.clone()
    }

    pub fn reset_stats(&mut self) {
        self.stats.clear();
        self.stats_file.save_logged(&self.stats);
        tracing::info!("questionnaire stats reset");
    }

    pub fn session(&self) -> &QuestionnaireSession {
        &self.session
    }

    /// Name the team and open the session for the second tablet.
    pub fn set_team(&mut self, team_name: &str) -> Result<&QuestionnaireSession, ApiError> {
        let team_name = team_name.trim();
        if team_name.is_empty() {
            return Err(ApiError::bad_request("teamName must be a non-empty string"));
        }
        self.session.team_name = team_name.to_string();
        self.session.started = true;
        Ok(&self.session)
    }

    pub fn set_answer(&mut self, id: u32, value: AnswerValue) -> Result<&QuestionnaireSession, ApiError> {
        if self.session.validated {
            return Err(ApiError::Conflict("session already validated".to_string()));
        }
        self.session.answers.insert(id, value);
        Ok(&self.session)
    }

    pub fn reset_session(&mut self) {
        self.session = QuestionnaireSession::default();
    }

    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Highest score first; ties go to whoever submitted earlier.
    pub fn leaderboard(&self, limit: usize) -> Leaderboard {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp.cmp(&b.timestamp)));
        ranked.truncate(limit);

        let last = self.scores.last().cloned();
        let last_ranked = last.as_ref().is_some_and(|l| ranked.contains(l));
        Leaderboard { top: ranked, last, last_ranked }
    }

    pub fn reset_scores(&mut self) {
        self.scores.clear();
        self.scores_file.save_logged(&self.scores);
        tracing::info!("scoreboard reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionStat;

    fn open(dir: &tempfile::TempDir) -> Questionnaire {
        Questionnaire::open(&StorageConfig { data_dir: dir.path().to_path_buf() })
    }

    fn results(pairs: &[(u32, bool)]) -> BTreeMap<u32, bool> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_submit_tallies_per_question() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.submit(&results(&[(1, true), (2, false)]), None, None, 0);
        let stats = q.submit(&results(&[(1, false), (2, false)]), None, None, 0);
        assert_eq!(stats[&1], QuestionStat { total: 2, correct: 1 });
        assert_eq!(stats[&2], QuestionStat { total: 2, correct: 0 });
        assert!(q.scores().is_empty());
    }

    #[test]
    fn test_stats_and_scores_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut q = open(&dir);
            q.submit(&results(&[(5, true)]), Some("  raptors "), Some(42), 100);
        }
        let q = open(&dir);
        assert_eq!(q.stats()[&5], QuestionStat { total: 1, correct: 1 });
        assert_eq!(q.scores().len(), 1);
        assert_eq!(q.scores()[0].team_name, "raptors");
        assert_eq!(q.scores()[0].score, 42);
    }

    #[test]
    fn test_blank_team_is_not_scored() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.submit(&results(&[(1, true)]), Some("   "), Some(10), 0);
        assert!(q.scores().is_empty());
    }

    #[test]
    fn test_submit_validates_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.set_team("raptors").unwrap();
        q.submit(&results(&[(1, true)]), Some("raptors"), Some(3), 0);
        let session = q.session();
        assert!(session.validated);
        assert_eq!(session.score, Some(3));
        assert_eq!(session.stats.as_ref().unwrap()[&1].correct, 1);
        assert!(q.set_answer(1, AnswerValue::Single("x".into())).is_err());
    }

    #[test]
    fn test_set_team_starts_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        assert!(q.set_team("  ").is_err());
        assert!(!q.session().started);
        let session = q.set_team(" team rex ").unwrap();
        assert!(session.started);
        assert_eq!(session.team_name, "team rex");
    }

    #[test]
    fn test_answers_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.set_answer(2, AnswerValue::Multi(vec!["julia".into()])).unwrap();
        q.set_answer(2, AnswerValue::Multi(vec!["julia".into(), "rico".into()])).unwrap();
        assert_eq!(
            q.session().answers[&2],
            AnswerValue::Multi(vec!["julia".into(), "rico".into()])
        );
        q.reset_session();
        assert_eq!(q.session(), &QuestionnaireSession::default());
    }

    #[test]
    fn test_leaderboard_order_and_last_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.submit(&BTreeMap::new(), Some("a"), Some(10), 1);
        q.submit(&BTreeMap::new(), Some("b"), Some(30), 2);
        q.submit(&BTreeMap::new(), Some("c"), Some(30), 3);
        q.submit(&BTreeMap::new(), Some("d"), Some(5), 4);

        let board = q.leaderboard(2);
        let names: Vec<_> = board.top.iter().map(|e| e.team_name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);
        assert_eq!(board.last.as_ref().unwrap().team_name, "d");
        assert!(!board.last_ranked);

        let board = q.leaderboard(DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(board.top.len(), 4);
        assert!(board.last_ranked);
    }

    #[test]
    fn test_resets_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = open(&dir);
        q.submit(&results(&[(1, true)]), Some("a"), Some(1), 1);
        q.reset_stats();
        q.reset_scores();
        let q = open(&dir);
        assert!(q.stats().is_empty());
        assert!(q.scores().is_empty());
    }
}

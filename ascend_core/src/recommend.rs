//! Recommendation requester.
//!
//! Formats recent history and current levels into a structured request for
//! an external text-generation collaborator and returns its response
//! verbatim. The collaborator is opaque behind [`RecommendationBackend`];
//! any failure degrades to a fixed fallback message, never an error.

use crate::history::HistoryStore;
use crate::levels::LevelStore;
use crate::store::KeyValue;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

/// At most this many history entries are sent with a request
pub const REQUEST_HISTORY_LIMIT: usize = 10;

/// Returned when the collaborator is unavailable or fails
pub const FALLBACK_MESSAGE: &str = "Recommendations are unavailable right now. \
Keep working your current progressions and aim for the rep target before \
moving up a level.";

/// One history line in the collaborator contract
#[derive(Clone, Debug, Serialize)]
pub struct HistoryLine {
    /// `YYYY-MM-DD`
    pub date: String,
    pub category: String,
    pub level: u8,
    pub reps: u32,
}

/// The structured request sent to the collaborator
#[derive(Clone, Debug, Serialize)]
pub struct RecommendationRequest {
    pub workout_history: Vec<HistoryLine>,
    pub current_level: BTreeMap<String, u8>,
    pub target_reps: u32,
}

/// The opaque external text-generation collaborator
pub trait RecommendationBackend {
    fn generate(&self, request: &RecommendationRequest) -> Result<String>;
}

/// Build the collaborator request from the stores and the configured
/// frontier rep target
pub fn build_request<S: KeyValue, H: KeyValue>(
    history: &HistoryStore<H>,
    levels: &LevelStore<S>,
    target_reps: u32,
) -> RecommendationRequest {
    let workout_history = history
        .recent(REQUEST_HISTORY_LIMIT)
        .iter()
        .map(|entry| HistoryLine {
            date: entry.date.format("%Y-%m-%d").to_string(),
            category: entry.category.name().to_string(),
            level: entry.level_achieved,
            // Pure-hold entries report zero reps; the contract's history
            // line carries reps only
            reps: entry.total_reps.unwrap_or(0),
        })
        .collect();

    let current_level = levels
        .all()
        .into_iter()
        .map(|(cat, level)| (cat.name().to_string(), level))
        .collect();

    RecommendationRequest {
        workout_history,
        current_level,
        target_reps,
    }
}

/// Ask the collaborator for recommendations.
///
/// The response is returned unmodified; any backend failure yields
/// [`FALLBACK_MESSAGE`] instead of propagating.
pub fn request_recommendations(
    backend: &dyn RecommendationBackend,
    request: &RecommendationRequest,
) -> String {
    match backend.generate(request) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Recommendation backend failed: {}. Using fallback.", e);
            FALLBACK_MESSAGE.to_string()
        }
    }
}

/// Backend that pipes the JSON request into a configured shell command and
/// returns its stdout
pub struct CommandBackend {
    command: String,
}

impl CommandBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl RecommendationBackend for CommandBackend {
    fn generate(&self, request: &RecommendationRequest) -> Result<String> {
        let payload = serde_json::to_string(request)?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(payload.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(crate::Error::Recommendation(format!(
                "backend command exited with {}",
                output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(crate::Error::Recommendation(
                "backend command produced no output".into(),
            ));
        }
        Ok(text)
    }
}

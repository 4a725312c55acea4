//! Word and pause event records
//!
//! Value records for a single stimulus exposure or a single pause interval,
//! with derived duration accessors and a canonical CSV row projection. The
//! projection always emits the same field order regardless of which optional
//! fields are populated (missing optionals render as empty strings), so the
//! CSV header stays stable across heterogeneous event sets.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stimulus shown to the participant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusType {
    #[default]
    Word,
    Phrase,
    Sentence,
}

impl StimulusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StimulusType::Word => "word",
            StimulusType::Phrase => "phrase",
            StimulusType::Sentence => "sentence",
        }
    }
}

/// Participant response classification for a trial
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Correct,
    Wrong,
    #[default]
    Null,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Correct => "correct",
            ResponseStatus::Wrong => "wrong",
            ResponseStatus::Null => "null",
        }
    }
}

/// Error classification for a wrong or missing response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Omission,
    Commission,
    #[default]
    Null,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Omission => "omission",
            ErrorType::Commission => "commission",
            ErrorType::Null => "null",
        }
    }
}

/// Why presentation was suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    ManualPause,
    FocusLoss,
    TabSwitch,
}

impl PauseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseReason::ManualPause => "manual_pause",
            PauseReason::FocusLoss => "focus_loss",
            PauseReason::TabSwitch => "tab_switch",
        }
    }
}

/// CSV column order for word events. `csv_row` emits values in this order.
pub const WORD_EVENT_CSV_FIELDS: [&str; 17] = [
    "session_id",
    "participant_pseudonym",
    "event_id",
    "trial_index",
    "stimulus_text",
    "stimulus_type",
    "stimulus_source",
    "duration_ms",
    "shown_at_ms",
    "hidden_at_ms",
    "actual_duration_ms",
    "word_level_speed",
    "game_state",
    "response_status",
    "response_time_ms",
    "is_correct",
    "error_type",
];

/// CSV column order for pause events
pub const PAUSE_EVENT_CSV_FIELDS: [&str; 7] = [
    "session_id",
    "participant_pseudonym",
    "pause_id",
    "start_ms",
    "end_ms",
    "duration_ms",
    "reason",
];

/// One stimulus exposure (word, phrase, or sentence).
///
/// Created exactly once per exposure by `SessionLogger::log_word_event` and
/// immutable after creation. Timestamps are monotonic milliseconds sharing
/// the session's epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEvent {
    pub session_id: Option<Uuid>,
    pub event_id: Uuid,
    /// Zero-based sequential position within the session. Derived at
    /// creation time from the number of events already logged.
    pub trial_index: u32,
    pub stimulus_text: String,
    pub stimulus_type: StimulusType,
    pub stimulus_source: String,
    /// Intended display duration
    pub duration_ms: u64,
    pub shown_at_ms: u64,
    pub hidden_at_ms: u64,
    /// Difficulty/speed tier active when the word was shown
    pub word_level_speed: Option<u32>,
    /// Application state tag at time of logging
    pub game_state: Option<String>,
    pub response_status: ResponseStatus,
    pub response_time_ms: Option<u64>,
    pub is_correct: Option<bool>,
    pub error_type: ErrorType,
}

impl Default for WordEvent {
    fn default() -> Self {
        Self {
            session_id: None,
            event_id: Uuid::new_v4(),
            trial_index: 0,
            stimulus_text: String::new(),
            stimulus_type: StimulusType::Word,
            stimulus_source: String::new(),
            duration_ms: 0,
            shown_at_ms: 0,
            hidden_at_ms: 0,
            word_level_speed: None,
            game_state: None,
            response_status: ResponseStatus::Null,
            response_time_ms: None,
            is_correct: None,
            error_type: ErrorType::Null,
        }
    }
}

impl WordEvent {
    /// Measured exposure duration. `None` unless strictly positive, so a
    /// clock reset between shown/hidden never yields a nonsensical duration.
    pub fn actual_duration_ms(&self) -> Option<u64> {
        self.hidden_at_ms
            .checked_sub(self.shown_at_ms)
            .filter(|d| *d > 0)
    }

    /// Canonical CSV row in [`WORD_EVENT_CSV_FIELDS`] order
    pub fn csv_row(&self, participant_pseudonym: Option<u64>) -> Vec<String> {
        vec![
            opt_str(self.session_id.map(|id| id.to_string())),
            opt_num(participant_pseudonym),
            self.event_id.to_string(),
            self.trial_index.to_string(),
            self.stimulus_text.clone(),
            self.stimulus_type.as_str().to_string(),
            self.stimulus_source.clone(),
            self.duration_ms.to_string(),
            self.shown_at_ms.to_string(),
            self.hidden_at_ms.to_string(),
            opt_num(self.actual_duration_ms()),
            opt_num(self.word_level_speed),
            opt_str(self.game_state.clone()),
            self.response_status.as_str().to_string(),
            opt_num(self.response_time_ms),
            opt_str(self.is_correct.map(|b| b.to_string())),
            self.error_type.as_str().to_string(),
        ]
    }
}

/// One contiguous interval during which presentation was suspended.
///
/// Materialized only when a pause closes; an open pause is tracked by the
/// logger as a provisional start timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseEvent {
    pub pause_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub reason: Option<PauseReason>,
}

impl PauseEvent {
    /// Pause duration. `None` when either bound is missing or the end
    /// precedes the start.
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.start_ms, self.end_ms) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }

    /// Canonical CSV row in [`PAUSE_EVENT_CSV_FIELDS`] order
    pub fn csv_row(&self, participant_pseudonym: Option<u64>) -> Vec<String> {
        vec![
            opt_str(self.session_id.map(|id| id.to_string())),
            opt_num(participant_pseudonym),
            opt_str(self.pause_id.map(|id| id.to_string())),
            opt_num(self.start_ms),
            opt_num(self.end_ms),
            opt_num(self.duration_ms()),
            opt_str(self.reason.map(|r| r.as_str().to_string())),
        ]
    }
}

// Null -> empty-string placeholder mapping, centralized so every projection
// renders missing optionals the same way.
fn opt_num<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_str(value: Option<String>) -> String {
    value.unwrap_or_default()
}

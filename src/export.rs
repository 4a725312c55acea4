//! Session export
//!
//! Pure functions turning a `SessionData` and its event collections into
//! CSV files (word events, pause events, one-row summary) and a nested JSON
//! document. Exports carry only pseudonym-based identifiers: the raw
//! participant code and absolute input paths never reach disk.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::LogError;
use crate::events::{
    PauseEvent, PauseReason, WordEvent, PAUSE_EVENT_CSV_FIELDS, WORD_EVENT_CSV_FIELDS,
};
use crate::session::{InputOrigin, SessionData};

/// Paths of the three CSV files produced by one export call
#[derive(Debug, Clone)]
pub struct CsvExportPaths {
    pub word_events: PathBuf,
    pub pause_events: PathBuf,
    pub summary: PathBuf,
}

fn ensure_parent_dir(path: &Path) -> Result<(), LogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn display_name_of(session: &SessionData) -> String {
    session.participant_display_name.clone().unwrap_or_default()
}

/// Export word events to CSV.
///
/// The header is stable regardless of which optional fields are populated;
/// `include_display_name` appends a trailing `participant_display_name`
/// column.
pub fn export_word_events_csv(
    events: &[WordEvent],
    session: &SessionData,
    csv_path: &Path,
    include_display_name: bool,
) -> Result<(), LogError> {
    ensure_parent_dir(csv_path)?;
    let mut writer = csv::Writer::from_path(csv_path)?;

    let mut header: Vec<&str> = WORD_EVENT_CSV_FIELDS.to_vec();
    if include_display_name {
        header.push("participant_display_name");
    }
    writer.write_record(&header)?;

    for event in events {
        let mut row = event.csv_row(session.participant_pseudonym);
        if include_display_name {
            row.push(display_name_of(session));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Export pause events to CSV, same header/column conventions as word events
pub fn export_pause_events_csv(
    events: &[PauseEvent],
    session: &SessionData,
    csv_path: &Path,
    include_display_name: bool,
) -> Result<(), LogError> {
    ensure_parent_dir(csv_path)?;
    let mut writer = csv::Writer::from_path(csv_path)?;

    let mut header: Vec<&str> = PAUSE_EVENT_CSV_FIELDS.to_vec();
    if include_display_name {
        header.push("participant_display_name");
    }
    writer.write_record(&header)?;

    for event in events {
        let mut row = event.csv_row(session.participant_pseudonym);
        if include_display_name {
            row.push(display_name_of(session));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Export a one-row session summary CSV for quick analyses
pub fn export_session_summary_csv(
    session: &SessionData,
    word_events: &[WordEvent],
    pause_events: &[PauseEvent],
    csv_path: &Path,
) -> Result<(), LogError> {
    ensure_parent_dir(csv_path)?;

    let total_trials = word_events.len();
    let total_correct = word_events
        .iter()
        .filter(|e| e.is_correct == Some(true))
        .count();
    let total_wrong = word_events
        .iter()
        .filter(|e| e.is_correct == Some(false))
        .count();

    let response_times: Vec<u64> = word_events
        .iter()
        .filter_map(|e| e.response_time_ms)
        .collect();
    let mean_rt = response_times.iter().sum::<u64>() as f64 / response_times.len().max(1) as f64;

    let total_pause_ms: u64 = pause_events
        .iter()
        .map(|p| p.duration_ms().unwrap_or(0))
        .sum();

    let mut writer = csv::Writer::from_path(csv_path)?;
    writer.write_record([
        "session_id",
        "participant_pseudonym",
        "participant_display_name",
        "total_trials",
        "total_correct",
        "total_wrong",
        "mean_response_time_ms",
        "total_pause_ms",
        "num_pauses",
    ])?;
    writer.write_record([
        session
            .session_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        session
            .participant_pseudonym
            .map(|p| p.to_string())
            .unwrap_or_default(),
        display_name_of(session),
        total_trials.to_string(),
        total_correct.to_string(),
        total_wrong.to_string(),
        format!("{mean_rt:.2}"),
        total_pause_ms.to_string(),
        pause_events.len().to_string(),
    ])?;

    writer.flush()?;
    Ok(())
}

/// Session header as it appears in the JSON export. Built by
/// [`build_session_export`]; deliberately has no field for the raw
/// participant code or any absolute path.
#[derive(Debug, Clone, Serialize)]
pub struct SessionJson {
    pub session_id: Option<String>,
    pub participant_pseudonym: Option<u64>,
    pub participant_display_name: Option<String>,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub date_local: String,
    pub input_file_name: String,
    pub input_file_relpath: String,
    pub input_file_hash: Option<String>,
    pub input_file_size_bytes: Option<u64>,
    pub input_file_origin: InputOrigin,
    pub platform_os: String,
    pub profile_name: Option<String>,
    pub settings_snapshot: Option<serde_json::Value>,
    pub total_words: u32,
    pub total_paused_ms: u64,
    pub total_active_ms: u64,
    pub accuracy: String,
    pub notes: Option<String>,
}

/// Word event as it appears in the JSON export, with the derived duration
/// flattened in
#[derive(Debug, Clone, Serialize)]
pub struct WordEventJson {
    pub session_id: Option<String>,
    pub event_id: String,
    pub trial_index: u32,
    pub stimulus_text: String,
    pub stimulus_type: String,
    pub stimulus_source: String,
    pub duration_ms: u64,
    pub shown_at_ms: u64,
    pub hidden_at_ms: u64,
    pub actual_duration_ms: Option<u64>,
    pub word_level_speed: Option<u32>,
    pub game_state: Option<String>,
    pub response_status: String,
    pub response_time_ms: Option<u64>,
    pub is_correct: Option<bool>,
    pub error_type: String,
}

/// Pause event as it appears in the JSON export
#[derive(Debug, Clone, Serialize)]
pub struct PauseEventJson {
    pub pause_id: Option<String>,
    pub session_id: Option<String>,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub reason: Option<PauseReason>,
}

/// Complete JSON export document
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub session: SessionJson,
    pub word_events: Vec<WordEventJson>,
    pub pause_events: Vec<PauseEventJson>,
}

/// Flatten a session and its events into the JSON export document
pub fn build_session_export(session: &SessionData) -> SessionExport {
    let session_json = SessionJson {
        session_id: session.session_id.map(|id| id.to_string()),
        participant_pseudonym: session.participant_pseudonym,
        participant_display_name: session.participant_display_name.clone(),
        started_at_ms: session.started_at_ms,
        ended_at_ms: session.ended_at_ms,
        date_local: session.date_local.clone(),
        input_file_name: session.input_file_name.clone(),
        input_file_relpath: session.input_file_relpath.clone(),
        input_file_hash: session.input_file_hash.clone(),
        input_file_size_bytes: session.input_file_size_bytes,
        input_file_origin: session.input_file_origin,
        platform_os: session.platform_os.clone(),
        profile_name: session.profile_name.clone(),
        settings_snapshot: session.settings_snapshot.clone(),
        total_words: session.total_words,
        total_paused_ms: session.total_paused_ms,
        total_active_ms: session.total_active_ms,
        accuracy: session.accuracy.clone(),
        notes: session.notes.clone(),
    };

    let word_events = session
        .word_events
        .iter()
        .map(|e| WordEventJson {
            session_id: e.session_id.map(|id| id.to_string()),
            event_id: e.event_id.to_string(),
            trial_index: e.trial_index,
            stimulus_text: e.stimulus_text.clone(),
            stimulus_type: e.stimulus_type.as_str().to_string(),
            stimulus_source: e.stimulus_source.clone(),
            duration_ms: e.duration_ms,
            shown_at_ms: e.shown_at_ms,
            hidden_at_ms: e.hidden_at_ms,
            actual_duration_ms: e.actual_duration_ms(),
            word_level_speed: e.word_level_speed,
            game_state: e.game_state.clone(),
            response_status: e.response_status.as_str().to_string(),
            response_time_ms: e.response_time_ms,
            is_correct: e.is_correct,
            error_type: e.error_type.as_str().to_string(),
        })
        .collect();

    let pause_events = session
        .pause_events
        .iter()
        .map(|p| PauseEventJson {
            pause_id: p.pause_id.map(|id| id.to_string()),
            session_id: p.session_id.map(|id| id.to_string()),
            start_ms: p.start_ms,
            end_ms: p.end_ms,
            duration_ms: p.duration_ms(),
            reason: p.reason,
        })
        .collect();

    SessionExport {
        session: session_json,
        word_events,
        pause_events,
    }
}

/// Write the full session (session + events) as pretty-printed JSON
pub fn export_session_json(session: &SessionData, output_path: &Path) -> Result<(), LogError> {
    ensure_parent_dir(output_path)?;
    let payload = build_session_export(session);
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, &payload)?;
    Ok(())
}

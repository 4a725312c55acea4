//! Session lifecycle logger
//!
//! `SessionLogger` owns a `SessionData` and is its sole mutator: it starts
//! and ends the session, appends word events, tracks the open pause, and
//! produces the CSV/JSON exports. The orchestrator calls it once per
//! discrete application event; everything runs synchronously on the calling
//! thread.

use std::path::{Path, PathBuf};

use log::{debug, info};
use uuid::Uuid;

use crate::error::LogError;
use crate::events::{
    ErrorType, PauseEvent, PauseReason, ResponseStatus, StimulusType, WordEvent,
};
use crate::export::{
    export_pause_events_csv, export_session_json, export_session_summary_csv,
    export_word_events_csv, CsvExportPaths,
};
use crate::session::SessionData;

/// Optional attributes of a word event beyond text and timing
#[derive(Debug, Clone, Default)]
pub struct WordEventParams {
    pub stimulus_type: StimulusType,
    pub stimulus_source: String,
    /// Intended display duration
    pub duration_ms: u64,
    pub word_level_speed: Option<u32>,
    pub game_state: Option<String>,
    pub response_status: ResponseStatus,
    pub response_time_ms: Option<u64>,
    pub is_correct: Option<bool>,
    pub error_type: ErrorType,
}

/// Open-pause tracking. Illegal transitions (double open, close without
/// open) are deliberate no-ops.
#[derive(Debug, Clone, Copy)]
enum PauseTracking {
    NoPause,
    Open {
        start_ms: u64,
        reason: Option<PauseReason>,
    },
}

/// Mutator and lifecycle controller for one `SessionData`
#[derive(Debug)]
pub struct SessionLogger {
    session: SessionData,
    pause: PauseTracking,
}

impl Default for SessionLogger {
    fn default() -> Self {
        Self::new(SessionData::new())
    }
}

impl SessionLogger {
    /// Bind a logger to a session. The logger holds the session exclusively
    /// until [`SessionLogger::into_session`].
    pub fn new(session: SessionData) -> Self {
        Self {
            session,
            pause: PauseTracking::NoPause,
        }
    }

    pub fn session(&self) -> &SessionData {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionData {
        &mut self.session
    }

    /// Release the session, consuming the logger
    pub fn into_session(self) -> SessionData {
        self.session
    }

    /// Bind the session identifier and start time.
    ///
    /// Calling this on an already started session rebinds both values
    /// unconditionally; earlier events keep the identifier they were logged
    /// with.
    pub fn start_session(&mut self, session_id: Uuid, started_at_ms: u64) {
        info!("session {session_id} started at {started_at_ms}ms");
        self.session.session_id = Some(session_id);
        self.session.started_at_ms = started_at_ms;
    }

    /// Trial index for the next word event: the number of events already
    /// logged, so indices are strictly sequential and zero-based
    pub fn trial_index(&self) -> u32 {
        self.session.word_events.len() as u32
    }

    /// Update pause state.
    ///
    /// Entering pause stores the start tick; entering while already paused
    /// keeps the first start. Leaving pause materializes exactly one
    /// `PauseEvent` with the stored reason; leaving while not paused does
    /// nothing.
    pub fn set_in_pause(&mut self, is_in_pause: bool, now_ms: u64, reason: Option<PauseReason>) {
        if is_in_pause {
            if let PauseTracking::NoPause = self.pause {
                self.pause = PauseTracking::Open {
                    start_ms: now_ms,
                    reason,
                };
            }
            return;
        }

        let PauseTracking::Open { start_ms, reason } = self.pause else {
            // Not previously in pause; nothing to close.
            return;
        };

        debug!("pause closed: {start_ms}ms..{now_ms}ms");
        self.session.pause_events.push(PauseEvent {
            pause_id: Some(Uuid::new_v4()),
            session_id: self.session.session_id,
            start_ms: Some(start_ms),
            end_ms: Some(now_ms),
            reason,
        });
        self.pause = PauseTracking::NoPause;
    }

    /// Create and append a word event for one stimulus exposure.
    ///
    /// The session identifier is taken from the bound session (and stays
    /// unset if logging happens before `start_session`); the trial index is
    /// derived from the number of events already logged.
    pub fn log_word_event(
        &mut self,
        stimulus_text: &str,
        shown_at_ms: u64,
        hidden_at_ms: u64,
        params: WordEventParams,
    ) -> &WordEvent {
        let event = WordEvent {
            session_id: self.session.session_id,
            event_id: Uuid::new_v4(),
            trial_index: self.trial_index(),
            stimulus_text: stimulus_text.to_string(),
            stimulus_type: params.stimulus_type,
            stimulus_source: params.stimulus_source,
            duration_ms: params.duration_ms,
            shown_at_ms,
            hidden_at_ms,
            word_level_speed: params.word_level_speed,
            game_state: params.game_state,
            response_status: params.response_status,
            response_time_ms: params.response_time_ms,
            is_correct: params.is_correct,
            error_type: params.error_type,
        };
        self.session.word_events.push(event);
        self.session
            .word_events
            .last()
            .expect("event was just pushed")
    }

    /// Append a pause event with known bounds, bypassing open/close tracking
    pub fn log_pause(
        &mut self,
        start_ms: u64,
        end_ms: u64,
        reason: Option<PauseReason>,
        pause_id: Option<Uuid>,
    ) -> &PauseEvent {
        self.session.pause_events.push(PauseEvent {
            pause_id: Some(pause_id.unwrap_or_else(Uuid::new_v4)),
            session_id: self.session.session_id,
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
            reason,
        });
        self.session
            .pause_events
            .last()
            .expect("event was just pushed")
    }

    /// Finalize the session and compute summary metrics.
    ///
    /// No-op when no session identifier is bound. An open pause is
    /// force-closed at `ended_at_ms` before metrics are computed:
    /// - `total_words` = number of word events
    /// - `total_paused_ms` = sum of closed pause durations (nulls count 0)
    /// - `total_active_ms` = session span minus paused time, clamped >= 0
    /// - `accuracy` = percentage over events with an explicit correctness
    ///   judgment, `"0%"` when none carries one
    pub fn end_session(&mut self, ended_at_ms: u64) {
        if self.session.session_id.is_none() {
            return;
        }

        if matches!(self.pause, PauseTracking::Open { .. }) {
            self.set_in_pause(false, ended_at_ms, None);
        }

        self.session.ended_at_ms = ended_at_ms;
        self.session.total_words = self.session.word_events.len() as u32;

        self.session.total_paused_ms = self
            .session
            .pause_events
            .iter()
            .map(|p| p.duration_ms().unwrap_or(0))
            .sum();

        let span_ms = self
            .session
            .ended_at_ms
            .saturating_sub(self.session.started_at_ms);
        self.session.total_active_ms = span_ms.saturating_sub(self.session.total_paused_ms);

        let mut attempted = 0u32;
        let mut correct = 0u32;
        for event in &self.session.word_events {
            match event.is_correct {
                Some(true) => {
                    attempted += 1;
                    correct += 1;
                }
                Some(false) => attempted += 1,
                None => {}
            }
        }
        self.session.accuracy = if attempted > 0 {
            format!("{:.1}%", correct as f64 / attempted as f64 * 100.0)
        } else {
            "0%".to_string()
        };

        info!(
            "session ended: {} words, {}ms active, accuracy {}",
            self.session.total_words, self.session.total_active_ms, self.session.accuracy
        );
    }

    /// Export the current session to three CSV files under `output_dir`.
    ///
    /// Call after [`SessionLogger::end_session`] so summary metrics are
    /// finalized. File names share the session's local date and identifier.
    pub fn export_csv(
        &self,
        output_dir: &Path,
        include_display_name: bool,
    ) -> Result<CsvExportPaths, LogError> {
        let session_id = self.session.session_id.ok_or(LogError::NoActiveSession)?;

        std::fs::create_dir_all(output_dir)?;
        let date_tag = &self.session.date_local;

        let words_path = output_dir.join(format!("{date_tag}_session-{session_id}_word_events.csv"));
        let pauses_path =
            output_dir.join(format!("{date_tag}_session-{session_id}_pause_events.csv"));
        let summary_path = output_dir.join(format!("{date_tag}_session-{session_id}_summary.csv"));

        export_word_events_csv(
            &self.session.word_events,
            &self.session,
            &words_path,
            include_display_name,
        )?;
        export_pause_events_csv(
            &self.session.pause_events,
            &self.session,
            &pauses_path,
            include_display_name,
        )?;
        export_session_summary_csv(
            &self.session,
            &self.session.word_events,
            &self.session.pause_events,
            &summary_path,
        )?;

        info!("session {session_id} exported to {}", output_dir.display());
        Ok(CsvExportPaths {
            word_events: words_path,
            pause_events: pauses_path,
            summary: summary_path,
        })
    }

    /// Export the full session (session + events) as one JSON document.
    ///
    /// The raw participant code and absolute file paths are never written.
    pub fn export_json(&self, output_path: &Path) -> Result<PathBuf, LogError> {
        if self.session.session_id.is_none() {
            return Err(LogError::NoActiveSession);
        }
        export_session_json(&self.session, output_path)?;
        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn started_logger() -> SessionLogger {
        let mut logger = SessionLogger::default();
        logger.start_session(Uuid::new_v4(), 0);
        logger
    }

    #[test]
    fn test_trial_index_is_sequential() {
        let mut logger = started_logger();
        for (i, word) in ["uno", "due", "tre"].iter().enumerate() {
            let event = logger.log_word_event(word, 0, 100, WordEventParams::default());
            assert_eq!(event.trial_index, i as u32);
        }
        assert_eq!(logger.trial_index(), 3);
    }

    #[test]
    fn test_word_event_before_start_has_no_session_id() {
        let mut logger = SessionLogger::default();
        let event = logger.log_word_event("early", 0, 100, WordEventParams::default());
        assert_eq!(event.session_id, None);
    }

    #[test]
    fn test_pause_open_is_idempotent() {
        let mut logger = started_logger();
        logger.set_in_pause(true, 100, Some(PauseReason::ManualPause));
        // second open keeps the first start
        logger.set_in_pause(true, 150, Some(PauseReason::FocusLoss));
        logger.set_in_pause(false, 300, None);

        let pauses = &logger.session().pause_events;
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].start_ms, Some(100));
        assert_eq!(pauses[0].end_ms, Some(300));
        assert_eq!(pauses[0].reason, Some(PauseReason::ManualPause));
    }

    #[test]
    fn test_spurious_close_is_noop() {
        let mut logger = started_logger();
        logger.set_in_pause(false, 500, None);
        assert!(logger.session().pause_events.is_empty());
    }

    #[test]
    fn test_log_pause_direct_append() {
        let mut logger = started_logger();
        let pause_id = Uuid::new_v4();
        let event = logger.log_pause(10, 40, Some(PauseReason::TabSwitch), Some(pause_id));
        assert_eq!(event.pause_id, Some(pause_id));
        assert_eq!(event.duration_ms(), Some(30));
    }

    #[test]
    fn test_end_session_metrics() {
        let mut logger = started_logger();
        logger.log_pause(100, 300, None, None);

        logger.log_word_event(
            "a",
            0,
            100,
            WordEventParams {
                is_correct: Some(true),
                ..Default::default()
            },
        );
        logger.log_word_event(
            "b",
            100,
            200,
            WordEventParams {
                is_correct: Some(true),
                ..Default::default()
            },
        );
        logger.log_word_event(
            "c",
            200,
            300,
            WordEventParams {
                is_correct: Some(false),
                ..Default::default()
            },
        );

        logger.end_session(1000);
        let session = logger.session();
        assert_eq!(session.ended_at_ms, 1000);
        assert_eq!(session.total_words, 3);
        assert_eq!(session.total_paused_ms, 200);
        assert_eq!(session.total_active_ms, 800);
        assert_eq!(session.accuracy, "66.7%");
    }

    #[test]
    fn test_end_session_accuracy_defaults_to_zero() {
        let mut logger = started_logger();
        logger.log_word_event("a", 0, 100, WordEventParams::default());
        logger.end_session(500);
        assert_eq!(logger.session().accuracy, "0%");
    }

    #[test]
    fn test_end_session_force_closes_open_pause() {
        let mut logger = started_logger();
        logger.set_in_pause(true, 400, Some(PauseReason::FocusLoss));
        logger.end_session(1000);

        let session = logger.session();
        assert_eq!(session.pause_events.len(), 1);
        assert_eq!(session.pause_events[0].end_ms, Some(1000));
        assert_eq!(session.total_paused_ms, 600);
        assert_eq!(session.total_active_ms, 400);
    }

    #[test]
    fn test_end_session_without_start_is_noop() {
        let mut logger = SessionLogger::default();
        logger.log_word_event("a", 0, 100, WordEventParams::default());
        logger.end_session(1000);

        assert_eq!(logger.session().ended_at_ms, 0);
        assert_eq!(logger.session().total_words, 0);
    }

    #[test]
    fn test_active_ms_clamped_at_zero() {
        let mut logger = started_logger();
        logger.log_pause(0, 5000, None, None);
        logger.end_session(1000);
        assert_eq!(logger.session().total_active_ms, 0);
    }

    #[test]
    fn test_export_requires_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let logger = SessionLogger::default();

        assert!(matches!(
            logger.export_csv(dir.path(), true),
            Err(LogError::NoActiveSession)
        ));
        assert!(matches!(
            logger.export_json(&dir.path().join("s.json")),
            Err(LogError::NoActiveSession)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_csv_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = started_logger();
        logger.log_word_event("ciao", 0, 100, WordEventParams::default());
        logger.end_session(500);

        let paths = logger.export_csv(dir.path(), true).unwrap();
        assert!(paths.word_events.exists());
        assert!(paths.pause_events.exists());
        assert!(paths.summary.exists());

        let session_id = logger.session().session_id.unwrap();
        let name = paths.word_events.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.contains(&session_id.to_string()));
        assert!(name.ends_with("_word_events.csv"));
    }
}

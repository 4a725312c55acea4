//! Orchestrator facade
//!
//! `SessionContext` bundles the current logger with the shared registry and
//! run configuration, and exposes the handful of calls an orchestrator (a
//! UI state machine, a headless runner) needs: select the stimulus file,
//! attach a participant, start and end the run, export everything. A new
//! run discards the session wholesale and rebinds a fresh logger.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::LogError;
use crate::export::CsvExportPaths;
use crate::logger::SessionLogger;
use crate::pseudonym::DEFAULT_PSEUDONYM_BITS;
use crate::registry::DisplayNameRegistry;
use crate::session::SessionData;

/// Everything one export call produced
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub word_events_csv: PathBuf,
    pub pause_events_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub session_json: PathBuf,
}

/// Shared, long-lived context holding the current session/logger pair
#[derive(Debug)]
pub struct SessionContext {
    pub logger: SessionLogger,
    pub registry: DisplayNameRegistry,
    secret_key: Vec<u8>,
    pub assets_root: Option<PathBuf>,
    pub selected_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub include_display_name: bool,
}

impl SessionContext {
    pub fn new(secret_key: impl Into<Vec<u8>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            logger: SessionLogger::new(SessionData::new()),
            registry: DisplayNameRegistry::default(),
            secret_key: secret_key.into(),
            assets_root: None,
            selected_file: None,
            output_dir: output_dir.into(),
            include_display_name: true,
        }
    }

    /// Use a registry other than the default per-user one
    pub fn with_registry(mut self, registry: DisplayNameRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Root under which stimulus files count as bundled assets
    pub fn with_assets_root(mut self, assets_root: impl Into<PathBuf>) -> Self {
        self.assets_root = Some(assets_root.into());
        self
    }

    pub fn session(&self) -> &SessionData {
        self.logger.session()
    }

    /// Select the stimulus file and snapshot its metadata into the session
    pub fn select_file(&mut self, file_path: &Path) -> Result<(), LogError> {
        self.logger
            .session_mut()
            .set_input_file(file_path, self.assets_root.as_deref())?;
        self.selected_file = Some(file_path.to_path_buf());
        Ok(())
    }

    /// Attach a new participant; the name doubles as the display label
    pub fn attach_new_participant(&mut self, name: &str) -> Result<(), LogError> {
        self.logger.session_mut().attach_participant(
            name,
            &self.secret_key,
            Some(name),
            &self.registry,
            DEFAULT_PSEUDONYM_BITS,
        )
    }

    /// Attach a participant picked from the saved list
    pub fn attach_existing_participant(
        &mut self,
        pseudonym: u64,
        display_name: Option<&str>,
    ) -> Result<(), LogError> {
        self.logger
            .session_mut()
            .attach_existing_participant(pseudonym, display_name, &self.registry)
    }

    /// Start the run. Requires a selected file and an attached participant.
    pub fn start(&mut self, now_ms: u64, session_id: Option<Uuid>) -> Result<Uuid, LogError> {
        if self.selected_file.is_none() {
            return Err(LogError::NoFileSelected);
        }
        if self.session().participant_pseudonym.is_none() {
            return Err(LogError::NoParticipant);
        }

        let session_id = session_id.unwrap_or_else(Uuid::new_v4);
        self.logger.start_session(session_id, now_ms);
        Ok(session_id)
    }

    pub fn end(&mut self, now_ms: u64) {
        self.logger.end_session(now_ms);
    }

    /// Export the session as three CSV files plus one JSON document under
    /// the output directory
    pub fn export_all(&self) -> Result<ExportPaths, LogError> {
        let session = self.logger.session();
        let session_id = session.session_id.ok_or(LogError::NoActiveSession)?;

        fs::create_dir_all(&self.output_dir)?;
        let csv_paths: CsvExportPaths = self
            .logger
            .export_csv(&self.output_dir, self.include_display_name)?;

        let json_path = self
            .output_dir
            .join(format!("{}_session-{}.json", session.date_local, session_id));
        self.logger.export_json(&json_path)?;

        Ok(ExportPaths {
            word_events_csv: csv_paths.word_events,
            pause_events_csv: csv_paths.pause_events,
            summary_csv: csv_paths.summary,
            session_json: json_path,
        })
    }

    /// Reset to a fresh session and re-bind the logger.
    ///
    /// Call when the user starts a new run; the previous session is
    /// discarded along with its events.
    pub fn new_session(&mut self) {
        self.logger = SessionLogger::new(SessionData::new());
        self.selected_file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::WordEventParams;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn context_in(dir: &tempfile::TempDir) -> SessionContext {
        SessionContext::new(b"secret-key".to_vec(), dir.path().join("out"))
            .with_registry(DisplayNameRegistry::new(dir.path().join("names.json")))
    }

    fn write_stimulus(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("words.txt");
        fs::write(&path, "uno due tre").unwrap();
        path
    }

    #[test]
    fn test_start_requires_file_and_participant() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context_in(&dir);

        assert!(matches!(
            context.start(0, None),
            Err(LogError::NoFileSelected)
        ));

        let stimulus = write_stimulus(&dir);
        context.select_file(&stimulus).unwrap();
        assert!(matches!(
            context.start(0, None),
            Err(LogError::NoParticipant)
        ));

        context.attach_new_participant("Alice").unwrap();
        assert!(context.start(0, None).is_ok());
    }

    #[test]
    fn test_full_run_and_export_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context_in(&dir);
        let stimulus = write_stimulus(&dir);

        context.select_file(&stimulus).unwrap();
        context.attach_new_participant("Alice").unwrap();
        let session_id = context.start(0, None).unwrap();

        context
            .logger
            .log_word_event("uno", 0, 350, WordEventParams::default());
        context.logger.set_in_pause(true, 400, None);
        context.logger.set_in_pause(false, 600, None);
        context.end(1000);

        let paths = context.export_all().unwrap();
        for path in [
            &paths.word_events_csv,
            &paths.pause_events_csv,
            &paths.summary_csv,
            &paths.session_json,
        ] {
            assert!(path.exists(), "missing export: {}", path.display());
        }

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.session_json).unwrap()).unwrap();
        assert_eq!(json["session"]["session_id"], session_id.to_string());
        assert_eq!(json["session"]["total_words"], 1);
        assert_eq!(json["session"]["total_paused_ms"], 200);
    }

    #[test]
    fn test_export_all_without_session_fails() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(&dir);
        assert!(matches!(
            context.export_all(),
            Err(LogError::NoActiveSession)
        ));
    }

    #[test]
    fn test_new_session_discards_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = context_in(&dir);
        let stimulus = write_stimulus(&dir);

        context.select_file(&stimulus).unwrap();
        context.attach_new_participant("Alice").unwrap();
        context.start(0, None).unwrap();
        context
            .logger
            .log_word_event("uno", 0, 350, WordEventParams::default());

        context.new_session();
        assert_eq!(context.selected_file, None);
        assert_eq!(context.session().session_id, None);
        assert!(context.session().word_events.is_empty());
        // the registry survives the session swap
        assert!(context.registry.name_exists("Alice"));
    }
}

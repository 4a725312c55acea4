//! Session aggregate
//!
//! `SessionData` is the aggregate root for one presentation run: identity,
//! participant binding, input-file fingerprint, timing boundaries, the
//! ordered event collections, and summary metrics. It owns its events by
//! composition and is mutated only through `SessionLogger` and its own
//! participant-attachment methods. A new run discards the whole object.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::LogError;
use crate::events::{PauseEvent, WordEvent};
use crate::pseudonym::{pseudonymize, DEFAULT_NAMESPACE};
use crate::registry::DisplayNameRegistry;

/// Chunk size for streamed input-file hashing
const HASH_CHUNK_BYTES: usize = 1024 * 1024;

/// Where the input file was sourced from, relative to the known assets root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    Assets,
    ExternalDrop,
    #[default]
    Unknown,
}

impl InputOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputOrigin::Assets => "assets",
            InputOrigin::ExternalDrop => "external_drop",
            InputOrigin::Unknown => "unknown",
        }
    }
}

/// One presentation run, from participant attachment through export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Unset until `SessionLogger::start_session`
    pub session_id: Option<Uuid>,
    /// Only the pseudonym reaches logs and exports
    pub participant_pseudonym: Option<u64>,
    /// Raw admin-provided code. In-memory only, never serialized.
    #[serde(skip)]
    pub participant_code_raw: Option<String>,
    /// UI label; avoid personal identifiers
    pub participant_display_name: Option<String>,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    /// Local calendar date captured at construction (ISO format)
    pub date_local: String,

    // Input/context, set when a stimulus file is selected
    pub input_file_name: String,
    pub input_file_relpath: String,
    pub input_file_hash: Option<String>,
    pub input_file_size_bytes: Option<u64>,
    pub input_file_origin: InputOrigin,
    pub platform_os: String,

    // Config
    pub profile_name: Option<String>,
    pub settings_snapshot: Option<serde_json::Value>,

    // Events
    pub word_events: Vec<WordEvent>,
    pub pause_events: Vec<PauseEvent>,
    pub notes: Option<String>,

    // Summary metrics, finalized by `SessionLogger::end_session`
    pub total_words: u32,
    pub total_paused_ms: u64,
    pub total_active_ms: u64,
    pub accuracy: String,
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionData {
    pub fn new() -> Self {
        Self {
            session_id: None,
            participant_pseudonym: None,
            participant_code_raw: None,
            participant_display_name: None,
            started_at_ms: 0,
            ended_at_ms: 0,
            date_local: Local::now().date_naive().to_string(),
            input_file_name: String::new(),
            input_file_relpath: String::new(),
            input_file_hash: None,
            input_file_size_bytes: None,
            input_file_origin: InputOrigin::Unknown,
            platform_os: std::env::consts::OS.to_string(),
            profile_name: None,
            settings_snapshot: None,
            word_events: Vec::new(),
            pause_events: Vec::new(),
            notes: None,
            total_words: 0,
            total_paused_ms: 0,
            total_active_ms: 0,
            accuracy: String::new(),
        }
    }

    /// Snapshot the selected stimulus file into this session.
    ///
    /// Streams the content through SHA-256 in fixed-size chunks, captures
    /// size and name, and classifies provenance: a descendant of
    /// `assets_root` records its relative path and origin `assets`, anything
    /// else records origin `external_drop` with an empty relative path.
    pub fn set_input_file(
        &mut self,
        file_path: &Path,
        assets_root: Option<&Path>,
    ) -> Result<(), LogError> {
        let input_err = |source: std::io::Error| LogError::InputFile {
            path: file_path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(file_path).map_err(input_err)?;
        self.input_file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.input_file_size_bytes = Some(metadata.len());

        let mut hasher = Sha256::new();
        let mut file = File::open(file_path).map_err(input_err)?;
        let mut buf = vec![0u8; HASH_CHUNK_BYTES];
        loop {
            let n = file.read(&mut buf).map_err(input_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        self.input_file_hash = Some(hex::encode(hasher.finalize()));

        if let Some(root) = assets_root {
            let resolved = file_path.canonicalize().map_err(input_err)?;
            if let Ok(resolved_root) = root.canonicalize() {
                if let Ok(rel) = resolved.strip_prefix(&resolved_root) {
                    self.input_file_relpath = rel.to_string_lossy().into_owned();
                    self.input_file_origin = InputOrigin::Assets;
                    return Ok(());
                }
            }
        }

        self.input_file_relpath = String::new();
        self.input_file_origin = InputOrigin::ExternalDrop;
        Ok(())
    }

    /// Assign a stable, non-reversible pseudonym for an admin-provided code.
    ///
    /// The raw code is kept in memory only. A supplied display name is
    /// stored locally and upserted into the registry; when omitted, a
    /// previously stored label is looked up instead (and may remain unset).
    pub fn attach_participant(
        &mut self,
        participant_code: &str,
        secret_key: &[u8],
        display_name: Option<&str>,
        registry: &DisplayNameRegistry,
        bits: u32,
    ) -> Result<(), LogError> {
        self.participant_code_raw = Some(participant_code.to_string());
        let pseudonym = pseudonymize(participant_code, secret_key, bits, DEFAULT_NAMESPACE);
        self.participant_pseudonym = Some(pseudonym);

        match display_name {
            Some(name) => {
                self.participant_display_name = Some(name.to_string());
                registry.set_name(pseudonym, name)?;
            }
            None => {
                self.participant_display_name = registry.get_name(pseudonym);
            }
        }
        Ok(())
    }

    /// Bind to an already-known pseudonym without recomputing it.
    ///
    /// Used when the user picks a participant from the saved list; the raw
    /// code remains unset for this path.
    pub fn attach_existing_participant(
        &mut self,
        participant_pseudonym: u64,
        display_name: Option<&str>,
        registry: &DisplayNameRegistry,
    ) -> Result<(), LogError> {
        self.participant_code_raw = None;
        self.participant_pseudonym = Some(participant_pseudonym);

        match display_name {
            Some(name) => {
                self.participant_display_name = Some(name.to_string());
                registry.set_name(participant_pseudonym, name)?;
            }
            None => {
                self.participant_display_name = registry.get_name(participant_pseudonym);
            }
        }
        Ok(())
    }

    /// Mean measured exposure duration over events with a meaningful
    /// duration, 0.0 when there is none
    pub fn avg_actual_duration_ms(&self) -> f64 {
        let durations: Vec<u64> = self
            .word_events
            .iter()
            .filter_map(|event| event.actual_duration_ms())
            .collect();
        if durations.is_empty() {
            return 0.0;
        }
        durations.iter().sum::<u64>() as f64 / durations.len() as f64
    }
}

/// Key-press accuracy over a run: `(correct - wrong) / total * 100`,
/// clamped to 0..=100 and formatted as a percentage. `"0%"` when no words
/// were presented.
pub fn accuracy_from_counts(correct: u32, wrong: u32, total_words: u32) -> String {
    if total_words == 0 {
        return "0%".to_string();
    }
    let score = (correct as f64 - wrong as f64) / total_words as f64 * 100.0;
    format!("{:.1}%", score.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_set_input_file_hash_and_assets_origin() {
        let dir = tempfile::tempdir().unwrap();
        let assets_root = dir.path().join("assets");
        fs::create_dir(&assets_root).unwrap();
        let file_path = assets_root.join("text.txt");
        fs::write(&file_path, b"hello").unwrap();

        let mut session = SessionData::new();
        session
            .set_input_file(&file_path, Some(&assets_root))
            .unwrap();

        assert_eq!(session.input_file_name, "text.txt");
        assert_eq!(session.input_file_size_bytes, Some(5));
        // sha256(b"hello")
        assert_eq!(
            session.input_file_hash.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        assert_eq!(session.input_file_origin, InputOrigin::Assets);
        assert_eq!(session.input_file_relpath, "text.txt");
    }

    #[test]
    fn test_set_input_file_external_drop() {
        let dir = tempfile::tempdir().unwrap();
        let assets_root = dir.path().join("assets");
        fs::create_dir(&assets_root).unwrap();
        let file_path = dir.path().join("external.txt");
        fs::write(&file_path, "x").unwrap();

        let mut session = SessionData::new();
        session
            .set_input_file(&file_path, Some(&assets_root))
            .unwrap();

        assert_eq!(session.input_file_origin, InputOrigin::ExternalDrop);
        assert_eq!(session.input_file_relpath, "");
    }

    #[test]
    fn test_set_input_file_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionData::new();
        let result = session.set_input_file(&dir.path().join("missing.txt"), None);
        assert!(matches!(result, Err(LogError::InputFile { .. })));
    }

    #[test]
    fn test_attach_participant_upserts_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DisplayNameRegistry::new(dir.path().join("names.json"));
        let mut session = SessionData::new();

        session
            .attach_participant("ABC123", b"secret", Some("Alice"), &registry, 63)
            .unwrap();

        let pseudonym = session.participant_pseudonym.unwrap();
        assert_eq!(session.participant_code_raw.as_deref(), Some("ABC123"));
        assert_eq!(session.participant_display_name.as_deref(), Some("Alice"));
        assert_eq!(registry.get_name(pseudonym), Some("Alice".to_string()));
    }

    #[test]
    fn test_attach_participant_looks_up_stored_label() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DisplayNameRegistry::new(dir.path().join("names.json"));
        let pseudonym = crate::pseudonym::pseudonymize_default("ABC123", b"secret");
        registry.set_name(pseudonym, "Stored Label").unwrap();

        let mut session = SessionData::new();
        session
            .attach_participant("ABC123", b"secret", None, &registry, 63)
            .unwrap();

        assert_eq!(
            session.participant_display_name.as_deref(),
            Some("Stored Label")
        );
    }

    #[test]
    fn test_attach_existing_participant_keeps_code_unset() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DisplayNameRegistry::new(dir.path().join("names.json"));
        registry.set_name(99, "User C").unwrap();

        let mut session = SessionData::new();
        session
            .attach_existing_participant(99, None, &registry)
            .unwrap();

        assert_eq!(session.participant_pseudonym, Some(99));
        assert_eq!(session.participant_code_raw, None);
        assert_eq!(session.participant_display_name.as_deref(), Some("User C"));
    }

    #[test]
    fn test_avg_actual_duration() {
        let mut session = SessionData::new();
        session.word_events.push(WordEvent {
            shown_at_ms: 0,
            hidden_at_ms: 100,
            ..Default::default()
        });
        session.word_events.push(WordEvent {
            shown_at_ms: 0,
            hidden_at_ms: 300,
            ..Default::default()
        });
        // negative delta is excluded from the mean
        session.word_events.push(WordEvent {
            shown_at_ms: 100,
            hidden_at_ms: 50,
            ..Default::default()
        });

        assert_eq!(session.avg_actual_duration_ms(), 200.0);
    }

    #[test]
    fn test_accuracy_from_counts() {
        assert_eq!(accuracy_from_counts(8, 2, 10), "60.0%");
        assert_eq!(accuracy_from_counts(0, 5, 10), "0.0%");
        assert_eq!(accuracy_from_counts(10, 0, 10), "100.0%");
        assert_eq!(accuracy_from_counts(1, 0, 0), "0%");
    }

    #[test]
    fn test_raw_code_never_serialized() {
        let mut session = SessionData::new();
        session.participant_code_raw = Some("SECRET-CODE".to_string());
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("SECRET-CODE"));
    }
}

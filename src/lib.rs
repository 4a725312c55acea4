//! Tachylog - Session recording and pseudonymized export engine for
//! tachistoscope reading trainers
//!
//! Tachylog records every word presentation and pause interval during a
//! reading-training run with precise timing semantics, derives
//! accuracy/throughput metrics, pseudonymizes participant identities via
//! keyed HMAC (raw codes never reach persisted artifacts), and exports
//! consistent, cross-referenced CSV/JSON representations of a session.
//!
//! ## Modules
//!
//! - **pseudonym**: deterministic, non-reversible participant identifiers
//! - **registry**: durable pseudonym -> display-name store for labeling
//! - **events**: word/pause event records and their CSV projections
//! - **session**: the per-run aggregate (identity, fingerprint, metrics)
//! - **logger**: session lifecycle, event appends, pause tracking
//! - **export**: CSV and JSON export of a finalized session
//! - **context**: orchestrator-facing facade over one logger/registry pair

pub mod context;
pub mod error;
pub mod events;
pub mod export;
pub mod logger;
pub mod pseudonym;
pub mod registry;
pub mod session;

pub use context::{ExportPaths, SessionContext};
pub use error::LogError;
pub use events::{
    ErrorType, PauseEvent, PauseReason, ResponseStatus, StimulusType, WordEvent,
};
pub use export::{build_session_export, CsvExportPaths, SessionExport};
pub use logger::{SessionLogger, WordEventParams};
pub use pseudonym::{
    pseudonymize, pseudonymize_default, DEFAULT_NAMESPACE, DEFAULT_PSEUDONYM_BITS,
};
pub use registry::DisplayNameRegistry;
pub use session::{accuracy_from_counts, InputOrigin, SessionData};

/// Tachylog version, embedded in the CLI
pub const TACHYLOG_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Longstanding report consolidation engine.
//!
//! Responsibilities:
//! - Classify report files by name into known source layouts
//! - Map each layout onto one canonical schema
//! - Normalize free-text "days" values into numbers
//! - Merge extracted weeks into a persistent master table, replacing reruns
//!
//! CRITICAL: A merge must be IDEMPOTENT.
//! Same weeks + same input files = same master file.

pub mod config;
pub mod days;
pub mod error;
pub mod extract;
pub mod import;
pub mod layout;
pub mod logging;
pub mod merge;
pub mod periods;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod walker;

pub use error::{ConsolidateError, Result};
pub use layout::{FileClassifier, LayoutTag};
pub use merge::{MasterMerger, MasterTable, MergeReport};
pub use pipeline::{ExportConsolidator, RunOutcome, RunSummary};
pub use schema::{CanonicalRecord, Field};

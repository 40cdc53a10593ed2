//! Reload externally referenced resources (families, CAD links, model links)
//! in host documents from a library of replacement files.
//!
//! A reload pass resolves every reference to a unique candidate, reloads it
//! inside its own rollback-safe scope, finds the child types the reload
//! silently introduced, and reports one aggregate [`Outcome`] that records
//! every item without stopping at the first failure.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod library;
pub mod memory;
pub mod outcome;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod transaction;
pub mod types;

pub use engine::{ReloadOptions, ReloadOutcome, ReloadReport, ReloadState, reload_pass, reload_references};
pub use error::{Error, HostError};
pub use host::{Document, Scope};
pub use library::{CandidateFile, FileLister, FsLister, Library};
pub use outcome::Outcome;
pub use resolver::{MatchMode, Resolution};
pub use types::{ElementId, ExternalReference, LoadConfig, NativeLoadResult, ReferenceKind, WorksetOption};

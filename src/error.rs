/// Crate-level error types for linkreload.
use std::path::PathBuf;

use crate::types::ReferenceKind;

/// Failure reported by the host document through one of the collaborator
/// traits. The host's own exception detail is kept verbatim in `message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    /// Exception detail as reported by the host.
    pub message: String,
}

impl HostError {
    /// Wrap a host exception message.
    pub fn new(message: impl Into<String>) -> Self {
        return Self { message: message.into() };
    }
}

/// Errors that stop an operation outright. Per-reference failures during a
/// reload pass are never raised as `Error`; they are folded into the pass
/// outcome instead.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as linkreload::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The report file was parsed but has no header row.
    #[error("report corrupt: {}: {reason}", path.display())]
    CorruptReport {
        /// Report file that failed to parse.
        path: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// Tab-separated report could not be read or written.
    #[error("report: {0}")]
    Csv(
        /// The wrapped csv error.
        #[from]
        csv::Error,
    ),

    /// A library directory could not be listed.
    #[error("cannot list {}: {reason}", directory.display())]
    DirectoryUnreadable {
        /// Directory that failed to list.
        directory: PathBuf,
        /// Underlying reason reported by the file system walk.
        reason: String,
    },

    /// References of a kind could not be enumerated; the pass cannot start.
    #[error("cannot enumerate {} references: {source}", kind.label())]
    Enumeration {
        /// Kind that was being enumerated.
        kind: ReferenceKind,
        /// Host failure detail.
        source: HostError,
    },

    /// The configured name pattern is not a valid regular expression.
    #[error("invalid name pattern `{pattern}`: {source}")]
    InvalidNamePattern {
        /// Pattern as written in the config file.
        pattern: String,
        /// Regex compilation error.
        source: regex::Error,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A report file does not exist on disk.
    #[error("report not found: {}", path.display())]
    ReportNotFound {
        /// Path to the missing report.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}

//! Collaborator traits for the host document.
//!
//! The host owns the in-memory object model and the native transaction
//! primitives. The engine only ever talks to it through these traits and
//! always receives the document as an explicit parameter.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::HostError;
use crate::types::{ElementId, ExternalReference, LoadConfig, NativeLoadResult, ReferenceKind};

/// A named atomic unit of document mutation.
///
/// A scope is independent of the borrow on its document, the same way a host
/// transaction object holds its own handle to the document it was opened on.
pub trait Scope {
    /// Commit everything done since `start`.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the commit was refused.
    fn commit(&mut self) -> Result<(), HostError>;

    /// Undo everything done since `start`.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the rollback itself failed.
    fn rollback(&mut self) -> Result<(), HostError>;

    /// Begin the scope.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the scope could not be started, e.g.
    /// because the document is read-only.
    fn start(&mut self) -> Result<(), HostError>;
}

/// A document holding external references. Single writer: callers must never
/// open a second scope before the first is committed or rolled back.
pub trait Document {
    /// Scope type produced by [`Document::open_scope`].
    type Scope: Scope;

    /// Delete the given elements. Callers batch all ids into one call.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if any element could not be deleted.
    fn delete_elements(&mut self, ids: &[ElementId]) -> Result<(), HostError>;

    /// Ids of the child types currently attached to a reference.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the reference can no longer be read.
    fn child_type_ids(&self, reference: &ExternalReference) -> Result<BTreeSet<ElementId>, HostError>;

    /// All references of a kind, in the host's enumeration order.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the document cannot be scanned.
    fn enumerate_references(&self, kind: ReferenceKind) -> Result<Vec<ExternalReference>, HostError>;

    /// Open (but do not start) a named scope on this document.
    fn open_scope(&self, name: &str) -> Self::Scope;

    /// Read one report column for a reference, e.g. `ISLOADED` or `FILEPATH`.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the value cannot be read; the report
    /// projection substitutes a placeholder.
    fn read_field(&self, reference: &ExternalReference, column: &str) -> Result<String, HostError>;

    /// Reload a reference from a file using the host's native operation.
    ///
    /// # Errors
    ///
    /// Returns the host's failure if the native reload raised.
    fn reload_from(
        &mut self,
        reference: &ExternalReference,
        path: &Path,
        config: LoadConfig,
    ) -> Result<NativeLoadResult, HostError>;
}

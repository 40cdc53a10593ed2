//! Transaction wrapper for document mutations.
//!
//! Every mutation runs inside a named scope on the document. The wrapper
//! guarantees the scope is either committed or rolled back, and it never
//! hands a host failure back to the caller as an error: failures come back
//! as a failed [`Outcome`] so a batch can keep going.
//!
//! ## Usage
//!
//! ```ignore
//! let outcome = run_in_transaction(&mut doc, "Reloading: Door", |doc| {
//!     let result = doc.reload_from(&reference, &path, LoadConfig::ReusePrevious)?;
//!     Ok(Outcome::ok(format!("Door :: {result}")))
//! });
//! ```

use crate::error::HostError;
use crate::host::{Document, Scope};
use crate::outcome::Outcome;
use crate::types::ElementId;

/// Run `work` inside a scope named `scope_name`.
///
/// On `Ok` the scope is committed and the inner outcome is returned
/// unchanged, whatever its status. On any `Err`, including a failure to
/// start or commit the scope, the scope is rolled back and a failed outcome
/// carrying the host detail is returned. A failing rollback is noted in the
/// message, not raised.
pub fn run_in_transaction<D, T, F>(doc: &mut D, scope_name: &str, work: F) -> Outcome<T>
where
    D: Document + ?Sized,
    F: FnOnce(&mut D) -> Result<Outcome<T>, HostError>,
{
    let mut scope = doc.open_scope(scope_name);
    // Nothing to undo if the scope never started.
    if let Err(e) = scope.start() {
        tracing::warn!(scope = scope_name, error = %e, "scope failed to start");
        return Outcome::failed(exception_message(&e));
    }

    let result = work(doc).and_then(|outcome| {
        scope.commit()?;
        Ok(outcome)
    });

    match result {
        Ok(outcome) => {
            tracing::debug!(scope = scope_name, status = outcome.status, "scope committed");
            outcome
        },
        Err(e) => {
            tracing::warn!(scope = scope_name, error = %e, "rolling back scope");
            let mut message = exception_message(&e);
            if let Err(rollback) = scope.rollback() {
                message.push_str(&format!("; rollback failed: {rollback}"));
            }
            Outcome::failed(message)
        },
    }
}

/// Delete `ids` in one scope with a single host call.
///
/// `element_label` names what is being deleted in the outcome message,
/// e.g. "family types".
pub fn delete_by_ids<D>(doc: &mut D, ids: &[ElementId], scope_name: &str, element_label: &str) -> Outcome<()>
where
    D: Document + ?Sized,
{
    run_in_transaction(doc, scope_name, |doc| {
        doc.delete_elements(ids)?;
        Ok(Outcome::ok(format!("Deleted {} {element_label}", ids.len())))
    })
}

/// Message recorded for a host failure inside a scope.
pub fn exception_message(error: &HostError) -> String {
    format!("Failed with exception: {error}")
}

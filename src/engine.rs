//! The reload-and-reconcile pass.
//!
//! For every reference of one kind the engine resolves a candidate file,
//! reloads the reference from it inside its own scope, diffs the child types
//! attached before and after, and folds the item outcome into the pass
//! outcome. Items never abort the pass; only failing to enumerate the
//! references at all does.

use std::fmt;
use std::path::Path;

use crate::error::Error;
use crate::host::Document;
use crate::library::Library;
use crate::outcome::Outcome;
use crate::reconcile;
use crate::resolver::{self, MatchMode, Resolution};
use crate::transaction;
use crate::types::{ElementId, ExternalReference, LoadConfig, ReferenceKind};

/// Maps a reference's display name to the name used for matching.
pub type NameTransform = Box<dyn Fn(&str) -> String>;

/// Chooses the load configuration for a reference's reload.
pub type LoadConfigHook = Box<dyn Fn(&ExternalReference) -> LoadConfig>;

/// Settings for one reload pass.
pub struct ReloadOptions {
    /// Delete child types the reloads introduced once all items are done.
    pub delete_new_types: bool,
    /// Kind of reference this pass reloads.
    pub kind: ReferenceKind,
    /// Load configuration per reference. Defaults to reusing the previous one.
    pub load_config: LoadConfigHook,
    /// How names are compared against the library.
    pub match_mode: MatchMode,
    /// Applied to each display name before matching. Defaults to identity.
    pub normalize_name: NameTransform,
}

impl ReloadOptions {
    /// Defaults for `kind`: identity names, previous load configuration,
    /// the kind's match mode, and new types deleted.
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            delete_new_types: true,
            kind,
            load_config: Box::new(|_: &ExternalReference| LoadConfig::ReusePrevious),
            match_mode: kind.default_match_mode(),
            normalize_name: Box::new(str::to_string),
        }
    }
}

impl fmt::Debug for ReloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadOptions")
            .field("delete_new_types", &self.delete_new_types)
            .field("kind", &self.kind)
            .field("match_mode", &self.match_mode)
            .finish_non_exhaustive()
    }
}

/// Terminal state of one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// Several candidates matched; nothing was reloaded.
    Ambiguous,
    /// A host call raised; the reload scope was rolled back.
    Failed,
    /// No candidate matched; nothing was reloaded.
    NoMatch,
    /// Reloaded and committed.
    Reloaded,
}

/// What the before/after diff found for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Diffed; holds the ids the reload introduced, possibly none.
    Diffed(Vec<ElementId>),
    /// Not diffed: the kind has no child types, or the item never reloaded.
    Skipped,
}

/// Per-reference record of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Name after normalization, as matched against the library.
    pub lookup_name: String,
    /// Display name of the reference.
    pub name: String,
    /// This item's outcome, already merged into the pass outcome.
    pub outcome: Outcome<()>,
    /// Child type diff for this item.
    pub reconciliation: Reconciliation,
    /// Candidate resolution.
    pub resolution: Resolution,
    /// Terminal state.
    pub state: ReloadState,
}

impl ReloadOutcome {
    /// Matched path, or "not found" / "ambiguous".
    pub fn candidate_label(&self) -> String {
        self.resolution.to_string()
    }

    /// Types this item's reload introduced.
    pub fn new_type_ids(&self) -> &[ElementId] {
        match &self.reconciliation {
            Reconciliation::Diffed(ids) => ids,
            Reconciliation::Skipped => &[],
        }
    }
}

/// Everything a pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    /// Per-reference records in processing order.
    pub items: Vec<ReloadOutcome>,
    /// Aggregate outcome. The payload lists every newly introduced type id.
    pub outcome: Outcome<Vec<ElementId>>,
}

impl ReloadReport {
    /// Records that ended in `state`.
    pub fn items_in(&self, state: ReloadState) -> impl Iterator<Item = &ReloadOutcome> {
        self.items.iter().filter(move |item| item.state == state)
    }
}

/// Reload every reference of `options.kind` in the document.
///
/// An empty library fails the pass without touching the document. Each
/// reference is resolved, reloaded in its own scope, and diffed; failures are
/// recorded and the pass moves on. Newly introduced child types are deleted
/// in one final scope when `options.delete_new_types` is set.
///
/// # Errors
///
/// Returns `Error::Enumeration` if the document's references cannot be
/// listed. No reload is attempted in that case.
pub fn reload_pass<D: Document>(doc: &mut D, library: &Library, options: &ReloadOptions) -> Result<ReloadReport, Error> {
    let label = options.kind.label();
    if library.is_empty() {
        tracing::warn!(kind = label, "library is empty");
        return Ok(ReloadReport {
            items: Vec::new(),
            outcome: Outcome::failed("Library is empty!"),
        });
    }
    tracing::info!(candidates = library.len(), kind = label, "found candidates in library");

    let references = doc
        .enumerate_references(options.kind)
        .map_err(|source| Error::Enumeration {
            kind: options.kind,
            source,
        })?;

    if references.is_empty() {
        tracing::info!(kind = label, "no references in document");
        return Ok(ReloadReport {
            items: Vec::new(),
            outcome: Outcome::ok(format!("Found no {label} references in document.")),
        });
    }
    tracing::info!(count = references.len(), kind = label, "found references in document");

    Ok(reload_references(doc, &references, library, options))
}

/// Reload a caller-chosen list of references.
///
/// Same per-item protocol and final delete step as [`reload_pass`], without
/// enumerating the document first.
pub fn reload_references<D: Document>(
    doc: &mut D,
    references: &[ExternalReference],
    library: &Library,
    options: &ReloadOptions,
) -> ReloadReport {
    let mut items = Vec::with_capacity(references.len());
    for reference in references {
        items.push(reload_one(doc, reference, library, options));
    }

    let new_ids: Vec<ElementId> = items
        .iter()
        .flat_map(|item| item.new_type_ids().iter().copied())
        .collect();

    let items_outcome = Outcome::merge_all(items.iter().map(|item| item.outcome.clone()));
    let cleanup = finish_new_types(doc, &new_ids, options);

    ReloadReport {
        items,
        outcome: items_outcome.merge(cleanup).discard_value().with_value(new_ids),
    }
}

/// Final step of a pass: delete, keep, or note the absence of new types.
fn finish_new_types<D: Document>(doc: &mut D, new_ids: &[ElementId], options: &ReloadOptions) -> Outcome<()> {
    if new_ids.is_empty() {
        return Outcome::ok("No need to delete any new types since none were created.");
    }
    if options.delete_new_types {
        return reconcile::delete_new_types(doc, new_ids, options.kind);
    }
    tracing::info!(count = new_ids.len(), "keeping newly introduced types");
    Outcome::ok(format!("Kept {} newly introduced types", new_ids.len()))
}

/// State and failure outcome for a reference that did not resolve uniquely.
fn unresolved(name: &str, resolution: &Resolution) -> (ReloadState, Outcome<()>) {
    match resolution {
        Resolution::Ambiguous(paths) => {
            tracing::info!(reference = %name, matches = paths.len(), "multiple matches");
            (ReloadState::Ambiguous, Outcome::failed(resolver::ambiguity_message(name, paths)))
        },
        Resolution::NotFound | Resolution::Unique(_) => {
            tracing::info!(reference = %name, "no match");
            (
                ReloadState::NoMatch,
                Outcome::failed(format!("{name} :: No match found in provided locations")),
            )
        },
    }
}

/// Run the per-item state machine for one reference.
fn reload_one<D: Document>(
    doc: &mut D,
    reference: &ExternalReference,
    library: &Library,
    options: &ReloadOptions,
) -> ReloadOutcome {
    let name = reference.name.clone();
    let lookup_name = (options.normalize_name)(&name);
    let resolution = library.resolve(&lookup_name, options.match_mode);
    tracing::debug!(reference = %name, lookup = %lookup_name, resolution = %resolution, "resolved");

    let finished = |state, outcome, reconciliation, resolution| ReloadOutcome {
        lookup_name: lookup_name.clone(),
        name: name.clone(),
        outcome,
        reconciliation,
        resolution,
        state,
    };

    let Some(path) = resolution.path().map(Path::to_path_buf) else {
        let (state, outcome) = unresolved(&name, &resolution);
        return finished(state, outcome, Reconciliation::Skipped, resolution);
    };

    let tracks_types = reference.kind.tracks_child_types();
    let before = if tracks_types {
        match doc.child_type_ids(reference) {
            Ok(ids) => Some(ids),
            Err(e) => {
                let outcome = Outcome::failed(format!("{name} :: {}", transaction::exception_message(&e)));
                return finished(ReloadState::Failed, outcome, Reconciliation::Skipped, resolution);
            },
        }
    } else {
        None
    };

    let config = (options.load_config)(reference);
    let scope_name = format!("Reloading: {name}");
    let reload = transaction::run_in_transaction(doc, &scope_name, |doc| {
        let result = doc.reload_from(reference, &path, config)?;
        Ok(Outcome::<()>::ok(format!("{name} :: {result}")))
    });
    if !reload.status {
        tracing::warn!(reference = %name, message = %reload.message, "reload failed");
        let outcome = Outcome::failed(format!("{name} :: {}", reload.message));
        return finished(ReloadState::Failed, outcome, Reconciliation::Skipped, resolution);
    }
    tracing::info!(reference = %name, path = %path.display(), "reloaded");

    let Some(before) = before else {
        let outcome = reload.append_message(&format!("{name} :: no child types to reconcile"));
        return finished(ReloadState::Reloaded, outcome, Reconciliation::Skipped, resolution);
    };

    match doc.child_type_ids(reference) {
        Ok(after) => {
            let introduced = reconcile::new_type_ids(&before, &after);
            if !introduced.is_empty() {
                tracing::info!(reference = %name, count = introduced.len(), "reload introduced new types");
            }
            finished(ReloadState::Reloaded, reload, Reconciliation::Diffed(introduced), resolution)
        },
        Err(e) => {
            // The reload is committed; only the diff is lost.
            let outcome = reload.update_sep(
                false,
                &format!("{name} :: cannot read types after reload: {}", transaction::exception_message(&e)),
            );
            finished(ReloadState::Reloaded, outcome, Reconciliation::Skipped, resolution)
        },
    }
}

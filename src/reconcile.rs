use std::collections::BTreeSet;

use crate::host::Document;
use crate::outcome::Outcome;
use crate::transaction;
use crate::types::{ElementId, ReferenceKind};

/// Type ids present in `after` but not in `before`, in `after`'s order.
///
/// Pure: diffing never touches the document. Deleting what it finds is a
/// separate call to [`delete_new_types`].
pub fn new_type_ids<'a>(
    before: &BTreeSet<ElementId>,
    after: impl IntoIterator<Item = &'a ElementId>,
) -> Vec<ElementId> {
    after.into_iter().filter(|id| !before.contains(id)).copied().collect()
}

/// Delete every newly introduced type in one scope and one host call.
/// An empty id list is a successful no-op.
pub fn delete_new_types<D>(doc: &mut D, ids: &[ElementId], kind: ReferenceKind) -> Outcome<()>
where
    D: Document + ?Sized,
{
    if ids.is_empty() {
        return Outcome::ok("No new types to delete.");
    }
    let label = format!("{} types", kind.label());
    tracing::info!(count = ids.len(), kind = kind.label(), "deleting newly introduced types");
    transaction::delete_by_ids(doc, ids, &format!("Delete new {label}"), &label)
}

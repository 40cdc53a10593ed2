//! In-memory host document.
//!
//! `MemoryDocument` implements [`Document`] over plain collections. It is the
//! host for the test suites and for embedders without a real document.
//! Reloads attach the child types registered for a candidate file. Scopes
//! snapshot state on start and restore it on rollback. Every scope event and
//! delete call is journaled so callers can assert on the exact protocol the
//! engine followed.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::HostError;
use crate::host::{Document, Scope};
use crate::types::{ElementId, ExternalReference, LoadConfig, NativeLoadResult, ReferenceKind};

/// First id handed out to references, kept clear of caller-chosen type ids.
const FIRST_REFERENCE_ID: i64 = 100_000;

/// Load-result code reported for a successful reload unless overridden.
pub const DEFAULT_LOAD_CODE: &str = "LinkLoaded";

/// One journaled scope transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    /// The named scope was committed.
    Committed(String),
    /// The named scope was rolled back.
    RolledBack(String),
    /// The named scope was started.
    Started(String),
}

/// A recorded `reload_from` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadCall {
    /// Load configuration passed by the engine.
    pub config: LoadConfig,
    /// File the reference was reloaded from.
    pub path: PathBuf,
    /// Reference that was reloaded.
    pub reference: ElementId,
}

/// A reference as stored by the memory host.
#[derive(Debug, Clone)]
struct Entry {
    /// Report columns readable through `read_field`.
    fields: BTreeMap<String, String>,
    /// The reference itself; `child_type_ids` is the live set.
    reference: ExternalReference,
}

/// Injected failures.
#[derive(Debug, Default)]
struct Faults {
    /// Message raised by `commit`.
    commit: Option<String>,
    /// Message raised by `enumerate_references`.
    enumeration: Option<String>,
    /// Columns whose read raises, per reference.
    fields: BTreeSet<(ElementId, String)>,
    /// Reference names whose reload raises, with the message.
    reloads: BTreeMap<String, String>,
    /// Message raised by `rollback`.
    rollback: Option<String>,
    /// Message raised by `start`.
    start: Option<String>,
}

/// Shared state behind the document and its scopes.
#[derive(Debug)]
struct State {
    /// Child types each candidate file brings in when loaded.
    candidate_types: BTreeMap<PathBuf, BTreeSet<ElementId>>,
    /// Every `delete_elements` call, in order.
    delete_calls: Vec<Vec<ElementId>>,
    /// References in enumeration order.
    entries: Vec<Entry>,
    /// Injected failures.
    faults: Faults,
    /// Load-result code per candidate file, defaulting to [`DEFAULT_LOAD_CODE`].
    load_codes: BTreeMap<PathBuf, String>,
    /// Next reference id.
    next_id: i64,
    /// Every `reload_from` call, in order.
    reload_calls: Vec<ReloadCall>,
    /// Journal of scope transitions.
    scope_events: Vec<ScopeEvent>,
    /// Entries as they were when the active scope started.
    snapshot: Option<Vec<Entry>>,
}

/// In-memory [`Document`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    /// Shared with every scope opened on this document.
    state: Rc<RefCell<State>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document.
    pub fn new() -> Self {
        let state = State {
            candidate_types: BTreeMap::new(),
            delete_calls: Vec::new(),
            entries: Vec::new(),
            faults: Faults::default(),
            load_codes: BTreeMap::new(),
            next_id: FIRST_REFERENCE_ID,
            reload_calls: Vec::new(),
            scope_events: Vec::new(),
            snapshot: None,
        };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Add a reference with the given child type ids and return its id.
    pub fn add_reference(&mut self, kind: ReferenceKind, name: &str, child_types: &[i64]) -> ElementId {
        let mut state = self.state.borrow_mut();
        let id = ElementId(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        state.entries.push(Entry {
            fields: BTreeMap::new(),
            reference: ExternalReference {
                child_type_ids: child_types.iter().copied().map(ElementId).collect(),
                id,
                kind,
                name: name.to_string(),
            },
        });
        id
    }

    /// Every `delete_elements` call made so far.
    pub fn delete_calls(&self) -> Vec<Vec<ElementId>> {
        self.state.borrow().delete_calls.clone()
    }

    /// Make `commit` raise.
    pub fn fail_commit(&mut self, message: &str) {
        self.state.borrow_mut().faults.commit = Some(message.to_string());
    }

    /// Make `enumerate_references` raise.
    pub fn fail_enumeration(&mut self, message: &str) {
        self.state.borrow_mut().faults.enumeration = Some(message.to_string());
    }

    /// Make reading `column` of `reference` raise.
    pub fn fail_field(&mut self, reference: ElementId, column: &str) {
        self.state
            .borrow_mut()
            .faults
            .fields
            .insert((reference, column.to_string()));
    }

    /// Make reloading the reference named `name` raise.
    pub fn fail_reload(&mut self, name: &str, message: &str) {
        self.state
            .borrow_mut()
            .faults
            .reloads
            .insert(name.to_string(), message.to_string());
    }

    /// Make `rollback` raise.
    pub fn fail_rollback(&mut self, message: &str) {
        self.state.borrow_mut().faults.rollback = Some(message.to_string());
    }

    /// Make `start` raise.
    pub fn fail_scope_start(&mut self, message: &str) {
        self.state.borrow_mut().faults.start = Some(message.to_string());
    }

    /// Every `reload_from` call made so far.
    pub fn reload_calls(&self) -> Vec<ReloadCall> {
        self.state.borrow().reload_calls.clone()
    }

    /// Journal of scope transitions.
    pub fn scope_events(&self) -> Vec<ScopeEvent> {
        self.state.borrow().scope_events.clone()
    }

    /// Register the child types loading `path` brings into a reference.
    pub fn set_candidate_types(&mut self, path: impl Into<PathBuf>, types: &[i64]) {
        self.state
            .borrow_mut()
            .candidate_types
            .insert(path.into(), types.iter().copied().map(ElementId).collect());
    }

    /// Set a report column value for a reference.
    pub fn set_field(&mut self, reference: ElementId, column: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.reference.id == reference) {
            entry.fields.insert(column.to_string(), value.to_string());
        }
    }

    /// Report `code` when reloading from `path`.
    pub fn set_load_code(&mut self, path: impl Into<PathBuf>, code: &str) {
        self.state.borrow_mut().load_codes.insert(path.into(), code.to_string());
    }

    /// Current child types of a reference, sorted.
    pub fn types_of(&self, reference: ElementId) -> Vec<ElementId> {
        self.state
            .borrow()
            .entries
            .iter()
            .find(|e| e.reference.id == reference)
            .map(|e| e.reference.child_type_ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Document for MemoryDocument {
    type Scope = MemoryScope;

    fn child_type_ids(&self, reference: &ExternalReference) -> Result<BTreeSet<ElementId>, HostError> {
        let state = self.state.borrow();
        state
            .entries
            .iter()
            .find(|e| e.reference.id == reference.id)
            .map(|e| e.reference.child_type_ids.clone())
            .ok_or_else(|| HostError::new(format!("element {} does not exist", reference.id)))
    }

    fn delete_elements(&mut self, ids: &[ElementId]) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.delete_calls.push(ids.to_vec());
        if state.snapshot.is_none() {
            return Err(HostError::new("modification outside of a transaction"));
        }
        for id in ids {
            let owner = state
                .entries
                .iter_mut()
                .find(|e| e.reference.child_type_ids.contains(id))
                .ok_or_else(|| HostError::new(format!("element {id} does not exist")))?;
            owner.reference.child_type_ids.remove(id);
        }
        Ok(())
    }

    fn enumerate_references(&self, kind: ReferenceKind) -> Result<Vec<ExternalReference>, HostError> {
        let state = self.state.borrow();
        if let Some(message) = &state.faults.enumeration {
            return Err(HostError::new(message.clone()));
        }
        Ok(state
            .entries
            .iter()
            .filter(|e| e.reference.kind == kind)
            .map(|e| e.reference.clone())
            .collect())
    }

    fn open_scope(&self, name: &str) -> MemoryScope {
        MemoryScope {
            name: name.to_string(),
            state: Rc::clone(&self.state),
        }
    }

    fn read_field(&self, reference: &ExternalReference, column: &str) -> Result<String, HostError> {
        let state = self.state.borrow();
        if state.faults.fields.contains(&(reference.id, column.to_string())) {
            return Err(HostError::new(format!("cannot read {column}")));
        }
        state
            .entries
            .iter()
            .find(|e| e.reference.id == reference.id)
            .and_then(|e| e.fields.get(column).cloned())
            .ok_or_else(|| HostError::new(format!("{column} is not set")))
    }

    fn reload_from(
        &mut self,
        reference: &ExternalReference,
        path: &Path,
        config: LoadConfig,
    ) -> Result<NativeLoadResult, HostError> {
        let mut state = self.state.borrow_mut();
        state.reload_calls.push(ReloadCall {
            config,
            path: path.to_path_buf(),
            reference: reference.id,
        });
        if state.snapshot.is_none() {
            return Err(HostError::new("modification outside of a transaction"));
        }
        if let Some(message) = state.faults.reloads.get(&reference.name) {
            return Err(HostError::new(message.clone()));
        }

        let introduced = state.candidate_types.get(path).cloned().unwrap_or_default();
        let code = state
            .load_codes
            .get(path)
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOAD_CODE.to_string());
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.reference.id == reference.id)
            .ok_or_else(|| HostError::new(format!("element {} does not exist", reference.id)))?;
        entry.reference.child_type_ids.extend(introduced);
        entry
            .fields
            .insert("FILEPATH".to_string(), path.display().to_string());
        Ok(NativeLoadResult::new(code))
    }
}

/// Scope over a [`MemoryDocument`]. Only one may be active at a time.
#[derive(Debug)]
pub struct MemoryScope {
    /// Scope name, as journaled.
    name: String,
    /// Document state.
    state: Rc<RefCell<State>>,
}

impl Scope for MemoryScope {
    fn commit(&mut self) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.faults.commit {
            return Err(HostError::new(message.clone()));
        }
        state.snapshot = None;
        state.scope_events.push(ScopeEvent::Committed(self.name.clone()));
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.faults.rollback {
            return Err(HostError::new(message.clone()));
        }
        if let Some(entries) = state.snapshot.take() {
            state.entries = entries;
        }
        state.scope_events.push(ScopeEvent::RolledBack(self.name.clone()));
        Ok(())
    }

    fn start(&mut self) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.faults.start {
            return Err(HostError::new(message.clone()));
        }
        if state.snapshot.is_some() {
            return Err(HostError::new("another scope is already active"));
        }
        let entries = state.entries.clone();
        state.snapshot = Some(entries);
        state.scope_events.push(ScopeEvent::Started(self.name.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_entries() {
        let mut doc = MemoryDocument::new();
        let door = doc.add_reference(ReferenceKind::Family, "Door", &[1]);
        doc.set_candidate_types("lib/Door.rfa", &[1, 2]);
        let reference = doc.enumerate_references(ReferenceKind::Family).unwrap().remove(0);

        let mut scope = doc.open_scope("Reloading: Door");
        scope.start().unwrap();
        doc.reload_from(&reference, Path::new("lib/Door.rfa"), LoadConfig::ReusePrevious)
            .unwrap();
        assert_eq!(doc.types_of(door), vec![ElementId(1), ElementId(2)]);
        scope.rollback().unwrap();

        assert_eq!(doc.types_of(door), vec![ElementId(1)]);
        assert_eq!(
            doc.scope_events(),
            vec![
                ScopeEvent::Started("Reloading: Door".to_string()),
                ScopeEvent::RolledBack("Reloading: Door".to_string()),
            ]
        );
    }

    #[test]
    fn nested_scope_is_rejected() {
        let doc = MemoryDocument::new();
        let mut outer = doc.open_scope("outer");
        outer.start().unwrap();
        assert!(doc.open_scope("inner").start().is_err());
        outer.commit().unwrap();
        assert!(doc.open_scope("inner").start().is_ok());
    }

    #[test]
    fn mutation_outside_scope_fails() {
        let mut doc = MemoryDocument::new();
        doc.add_reference(ReferenceKind::Family, "Door", &[1]);
        assert!(doc.delete_elements(&[ElementId(1)]).is_err());
        assert_eq!(doc.types_of(ElementId(FIRST_REFERENCE_ID)), vec![ElementId(1)]);
    }
}

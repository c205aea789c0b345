//! Edit store
//!
//! Owns every annotation of a session, grouped by page in insertion
//! (z-order) sequence. Each public mutation applies its change first, then
//! records exactly one [`HistoryAction`], then notifies subscribers.
//! Undo and redo replay recorded actions without recording new ones.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind};
use crate::error::{RedactError, Result};
use crate::history::{ActionKind, Change, ClearScope, History, HistoryAction};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Page-indexed annotation collection without any history bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PageMap {
    pages: BTreeMap<u32, Vec<Annotation>>,
}

impl PageMap {
    fn page(&self, page: u32) -> &[Annotation] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    fn locate(&self, id: &str) -> Option<(u32, usize)> {
        self.pages.iter().find_map(|(page, annotations)| {
            annotations
                .iter()
                .position(|a| a.id().as_str() == id)
                .map(|index| (*page, index))
        })
    }

    fn get(&self, id: &str) -> Option<&Annotation> {
        let (page, index) = self.locate(id)?;
        self.pages.get(&page).and_then(|list| list.get(index))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        let (page, index) = self.locate(id)?;
        self.pages.get_mut(&page).and_then(|list| list.get_mut(index))
    }

    pub(crate) fn push(&mut self, annotation: Annotation) {
        self.pages
            .entry(annotation.page())
            .or_default()
            .push(annotation);
    }

    /// Insert at a z-order position within the annotation's page
    pub(crate) fn insert_at(&mut self, annotation: Annotation, index: usize) {
        let list = self.pages.entry(annotation.page()).or_default();
        let index = index.min(list.len());
        list.insert(index, annotation);
    }

    /// Remove by id, returning the annotation and its z-order index
    pub(crate) fn remove(&mut self, id: &str) -> Option<(Annotation, usize)> {
        let (page, index) = self.locate(id)?;
        let list = self.pages.get_mut(&page)?;
        let annotation = list.remove(index);
        if list.is_empty() {
            self.pages.remove(&page);
        }
        Some((annotation, index))
    }

    /// Overwrite the annotation with the same id, keeping its z-order slot
    pub(crate) fn replace(&mut self, annotation: Annotation) -> bool {
        match self.get_mut(annotation.id().as_str()) {
            Some(slot) => {
                *slot = annotation;
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_page(&mut self, page: u32) -> Vec<Annotation> {
        self.pages.remove(&page).unwrap_or_default()
    }

    fn take_all(&mut self) -> BTreeMap<u32, Vec<Annotation>> {
        std::mem::take(&mut self.pages)
    }

    /// Put a cleared page back. Anything added since stays on top.
    pub(crate) fn restore_page(&mut self, page: u32, mut annotations: Vec<Annotation>) {
        if annotations.is_empty() {
            return;
        }
        match self.pages.get_mut(&page) {
            Some(existing) => {
                tracing::warn!(
                    "Restoring page {} over {} existing annotations",
                    page,
                    existing.len()
                );
                annotations.append(existing);
                *existing = annotations;
            }
            None => {
                self.pages.insert(page, annotations);
            }
        }
    }

    fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.pages.values().flatten()
    }

    fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }
}

/// Outcome of an undo or redo request. The "nothing to do" cases are
/// boundary states, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    Undone(ActionKind),
    Redone(ActionKind),
    NothingToUndo,
    NothingToRedo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Edit(ActionKind),
    Undo(ActionKind),
    Redo(ActionKind),
    /// The whole collection was replaced by loaded data
    Reload,
}

/// Sent to subscribers after the store changed. Renderers re-read
/// [`EditStore::list_for_page`] for each page listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub cause: ChangeCause,
    pub pages: Vec<u32>,
}

pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Maximum number of history actions kept. `None` keeps everything.
    pub history_limit: Option<usize>,
}

pub struct EditStore {
    page_count: u32,
    options: StoreOptions,
    pages: PageMap,
    history: History,
    /// Every id ever handed out or accepted in this session
    issued: HashSet<AnnotationId>,
    next_seq: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl fmt::Debug for EditStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditStore")
            .field("page_count", &self.page_count)
            .field("pages", &self.pages)
            .field("history", &self.history)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl EditStore {
    /// Create an empty store for a document with `page_count` pages
    pub fn new(page_count: u32) -> Self {
        Self::with_options(page_count, StoreOptions::default())
    }

    pub fn with_options(page_count: u32, options: StoreOptions) -> Self {
        let history = match options.history_limit {
            Some(limit) => History::with_limit(limit),
            None => History::new(),
        };
        Self {
            page_count,
            options,
            pages: PageMap::default(),
            history,
            issued: HashSet::new(),
            next_seq: 1,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Build a store already holding `annotations`, with an empty history.
    ///
    /// Used when loading saved redaction data: the loaded state is the
    /// starting point, not an undoable edit.
    pub fn from_annotations(
        page_count: u32,
        annotations: Vec<Annotation>,
        options: StoreOptions,
    ) -> Result<Self> {
        let mut store = Self::with_options(page_count, options);
        store.load(annotations)?;
        Ok(store)
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Swap in a freshly loaded collection, keeping subscribers.
    ///
    /// History starts over. Ids issued before the reload stay reserved,
    /// though the loaded data may carry them again. On error the store is
    /// left as it was. Returns the number of annotations loaded.
    pub fn reload(&mut self, annotations: Vec<Annotation>) -> Result<usize> {
        let mut fresh = Self::with_options(self.page_count, self.options);
        fresh.issued = self.issued.clone();
        fresh.next_seq = self.next_seq;
        fresh.load(annotations)?;
        let mut pages = self.pages.page_numbers();
        pages.extend(fresh.pages.page_numbers());
        pages.sort_unstable();
        pages.dedup();

        fresh.subscribers = std::mem::take(&mut self.subscribers);
        fresh.next_subscription = self.next_subscription;
        *self = fresh;

        let count = self.len();
        tracing::debug!("Reloaded store with {} annotations", count);
        self.notify(StoreEvent {
            cause: ChangeCause::Reload,
            pages,
        });
        Ok(count)
    }

    /// Add an annotation, assigning an id when it has none. Records `Add`.
    pub fn add_annotation(&mut self, mut annotation: Annotation) -> Result<AnnotationId> {
        self.admit(&mut annotation)?;
        let id = annotation.id().clone();

        self.pages.push(annotation.clone());
        self.commit(HistoryAction::new(Change::Add { annotation }));
        Ok(id)
    }

    /// Remove an annotation. Records `Delete` with a full snapshot.
    pub fn delete_annotation(&mut self, id: &str) -> Result<()> {
        let (annotation, index) = self
            .pages
            .remove(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::new(id)))?;

        self.commit(HistoryAction::new(Change::Delete { annotation, index }));
        Ok(())
    }

    /// Move an annotation's anchor to `(new_x, new_y)` in document space.
    /// Records `Move` with before/after snapshots.
    pub fn move_annotation(&mut self, id: &str, new_x: f64, new_y: f64) -> Result<()> {
        if !new_x.is_finite() || !new_y.is_finite() {
            return Err(RedactError::InvalidAnnotation(
                "move target must be finite".into(),
            ));
        }
        let slot = self
            .pages
            .get_mut(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::new(id)))?;

        let before = slot.clone();
        slot.move_to(new_x, new_y);
        let after = slot.clone();

        self.commit(HistoryAction::new(Change::Move { before, after }));
        Ok(())
    }

    /// Change the size of a whiteout, keeping its top-left corner in place.
    /// Records `Update`.
    pub fn resize_annotation(&mut self, id: &str, width: f64, height: f64) -> Result<()> {
        let current = self
            .pages
            .get(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::new(id)))?;

        let mut updated = current.clone();
        match &mut updated {
            Annotation::Whiteout { rect, .. } => {
                let top = rect.y + rect.height;
                rect.width = width;
                rect.height = height;
                rect.y = top - height;
            }
            other => {
                return Err(RedactError::InvalidAnnotation(format!(
                    "{:?} {} cannot be resized",
                    other.kind(),
                    id
                )))
            }
        }
        self.update(updated)
    }

    /// Replace the text of a text stamp. Records `Update`.
    pub fn edit_text(&mut self, id: &str, new_text: &str) -> Result<()> {
        let current = self
            .pages
            .get(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::new(id)))?;

        let mut updated = current.clone();
        match &mut updated {
            Annotation::TextStamp { text, .. } => *text = new_text.to_string(),
            other => {
                return Err(RedactError::InvalidAnnotation(format!(
                    "{:?} {} has no text",
                    other.kind(),
                    id
                )))
            }
        }
        self.update(updated)
    }

    fn update(&mut self, updated: Annotation) -> Result<()> {
        updated.validate()?;
        let id = updated.id().clone();
        let slot = self
            .pages
            .get_mut(id.as_str())
            .ok_or(RedactError::NotFound(id))?;

        let before = std::mem::replace(slot, updated.clone());
        self.commit(HistoryAction::new(Change::Update {
            before,
            after: updated,
        }));
        Ok(())
    }

    /// Remove every annotation on `page` as one undoable action.
    /// Returns how many were removed; an empty page records nothing.
    pub fn clear_page(&mut self, page: u32) -> Result<usize> {
        self.check_page(page)?;
        let removed = self.pages.take_page(page);
        if removed.is_empty() {
            return Ok(0);
        }

        let count = removed.len();
        let mut snapshot = BTreeMap::new();
        snapshot.insert(page, removed);
        self.commit(HistoryAction::new(Change::Clear {
            scope: ClearScope::Page(page),
            removed: snapshot,
        }));
        Ok(count)
    }

    /// Remove every annotation in the document as one undoable action.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.pages.take_all();
        let count: usize = removed.values().map(Vec::len).sum();
        if count == 0 {
            return 0;
        }

        self.commit(HistoryAction::new(Change::Clear {
            scope: ClearScope::All,
            removed,
        }));
        count
    }

    /// Annotations on `page`, bottom-most first
    pub fn list_for_page(&self, page: u32) -> &[Annotation] {
        self.pages.page(page)
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.pages.get(id)
    }

    /// All annotations, page by page in z-order
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.pages.iter()
    }

    /// Pages that currently carry at least one annotation
    pub fn pages_with_annotations(&self) -> Vec<u32> {
        self.pages.page_numbers()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_of(&self, kind: AnnotationKind) -> usize {
        self.pages.iter().filter(|a| a.kind() == kind).count()
    }

    /// Revert the most recent applied action
    pub fn undo(&mut self) -> HistoryStatus {
        let Some(action) = self.history.step_back() else {
            return HistoryStatus::NothingToUndo;
        };
        action.revert(&mut self.pages);

        let kind = action.kind();
        let pages = action.pages();
        tracing::debug!("Undid {:?} on pages {:?}", kind, pages);
        self.notify(StoreEvent {
            cause: ChangeCause::Undo(kind),
            pages,
        });
        HistoryStatus::Undone(kind)
    }

    /// Re-apply the most recently undone action
    pub fn redo(&mut self) -> HistoryStatus {
        let Some(action) = self.history.step_forward() else {
            return HistoryStatus::NothingToRedo;
        };
        action.replay(&mut self.pages);

        let kind = action.kind();
        let pages = action.pages();
        tracing::debug!("Redid {:?} on pages {:?}", kind, pages);
        self.notify(StoreEvent {
            cause: ChangeCause::Redo(kind),
            pages,
        });
        HistoryStatus::Redone(kind)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index of the most recent applied action, `None` before the first
    pub fn history_index(&self) -> Option<usize> {
        self.history.index()
    }

    /// Register a callback run after every mutation, undo and redo
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.page_count {
            return Err(RedactError::InvalidPage {
                page,
                page_count: self.page_count,
            });
        }
        Ok(())
    }

    /// Validate an incoming annotation and settle its id
    /// Place `annotations` without recording history. Their ids only have
    /// to be unique among themselves.
    fn load(&mut self, annotations: Vec<Annotation>) -> Result<()> {
        let mut loaded = HashSet::new();
        for annotation in &annotations {
            let id = annotation.id();
            if id.is_assigned() && !loaded.insert(id.clone()) {
                return Err(RedactError::DuplicateId(id.clone()));
            }
        }
        self.issued.extend(loaded);

        for mut annotation in annotations {
            self.check_page(annotation.page())?;
            annotation.validate()?;
            if !annotation.id().is_assigned() {
                let id = self.fresh_id(annotation.kind());
                self.issued.insert(id.clone());
                annotation.set_id(id);
            }
            self.pages.push(annotation);
        }
        Ok(())
    }

    fn admit(&mut self, annotation: &mut Annotation) -> Result<()> {
        self.check_page(annotation.page())?;
        annotation.validate()?;

        if annotation.id().is_assigned() {
            if self.issued.contains(annotation.id()) {
                return Err(RedactError::DuplicateId(annotation.id().clone()));
            }
        } else {
            let id = self.fresh_id(annotation.kind());
            annotation.set_id(id);
        }
        self.issued.insert(annotation.id().clone());
        Ok(())
    }

    fn fresh_id(&mut self, kind: AnnotationKind) -> AnnotationId {
        loop {
            let candidate = AnnotationId::new(format!("{}{}", kind.id_prefix(), self.next_seq));
            self.next_seq += 1;
            if !self.issued.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Record an already-applied change and tell subscribers
    fn commit(&mut self, action: HistoryAction) {
        let event = StoreEvent {
            cause: ChangeCause::Edit(action.kind()),
            pages: action.pages(),
        };
        self.history.record(action);
        self.notify(event);
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{DocPoint, PdfRect};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect(x: f64, y: f64, width: f64, height: f64) -> PdfRect {
        PdfRect {
            x,
            y,
            width,
            height,
        }
    }

    fn whiteout(page: u32) -> Annotation {
        Annotation::whiteout(page, rect(10.0, 20.0, 100.0, 30.0))
    }

    fn snapshot(store: &EditStore) -> Vec<Annotation> {
        store.annotations().cloned().collect()
    }

    #[test]
    fn test_add_assigns_prefixed_ids() {
        let mut store = EditStore::new(2);
        let w = store.add_annotation(whiteout(1)).unwrap();
        let t = store
            .add_annotation(Annotation::text_stamp(1, 5.0, 5.0, "REDACTED", 12.0, "#000000"))
            .unwrap();
        let s = store
            .add_annotation(Annotation::freehand_stroke(
                2,
                vec![DocPoint::new(1.0, 1.0)],
                "#000000",
                2.0,
                1.0,
            ))
            .unwrap();
        assert_eq!(w.as_str(), "w1");
        assert_eq!(t.as_str(), "t2");
        assert_eq!(s.as_str(), "s3");
    }

    #[test]
    fn test_add_rejects_unknown_page() {
        let mut store = EditStore::new(1);
        let err = store.add_annotation(whiteout(2)).unwrap_err();
        assert_eq!(
            err,
            RedactError::InvalidPage {
                page: 2,
                page_count: 1
            }
        );
        assert!(store.is_empty());
        assert_eq!(store.history().len(), 0);
    }

    #[test]
    fn test_caller_ids_are_never_reused() {
        let mut store = EditStore::new(1);
        store.add_annotation(whiteout(1).with_id("w2")).unwrap();
        let generated = store.add_annotation(whiteout(1)).unwrap();
        let next = store.add_annotation(whiteout(1)).unwrap();
        assert_eq!(generated.as_str(), "w1");
        assert_eq!(next.as_str(), "w3");

        store.delete_annotation("w1").unwrap();
        let err = store.add_annotation(whiteout(1).with_id("w1")).unwrap_err();
        assert_eq!(err, RedactError::DuplicateId(AnnotationId::new("w1")));
    }

    #[test]
    fn test_list_for_page_keeps_insertion_order() {
        let mut store = EditStore::new(2);
        let a = store.add_annotation(whiteout(1)).unwrap();
        store.add_annotation(whiteout(2)).unwrap();
        let b = store.add_annotation(whiteout(1)).unwrap();
        let ids: Vec<_> = store.list_for_page(1).iter().map(|a| a.id().clone()).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(store.list_for_page(3).is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = EditStore::new(1);
        assert_eq!(
            store.delete_annotation("nope").unwrap_err(),
            RedactError::NotFound(AnnotationId::new("nope"))
        );
        assert_eq!(
            store.move_annotation("nope", 1.0, 1.0).unwrap_err(),
            RedactError::NotFound(AnnotationId::new("nope"))
        );
        assert_eq!(store.history().len(), 0);
    }

    #[test]
    fn test_every_mutation_records_one_action() {
        let mut store = EditStore::new(1);
        let id = store.add_annotation(whiteout(1)).unwrap();
        assert_eq!(store.history().len(), 1);
        store.move_annotation(id.as_str(), 1.0, 2.0).unwrap();
        assert_eq!(store.history().len(), 2);
        store.resize_annotation(id.as_str(), 5.0, 6.0).unwrap();
        assert_eq!(store.history().len(), 3);
        store.delete_annotation(id.as_str()).unwrap();
        assert_eq!(store.history().len(), 4);
        store.add_annotation(whiteout(1)).unwrap();
        store.clear_all();
        assert_eq!(store.history().len(), 6);

        let kinds: Vec<_> = store.history().actions().iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Add,
                ActionKind::Move,
                ActionKind::Update,
                ActionKind::Delete,
                ActionKind::Add,
                ActionKind::Clear
            ]
        );
    }

    #[test]
    fn test_undo_redo_never_record() {
        let mut store = EditStore::new(1);
        store.add_annotation(whiteout(1)).unwrap();
        store.add_annotation(whiteout(1)).unwrap();
        store.undo();
        store.undo();
        store.redo();
        store.undo();
        store.redo();
        store.redo();
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.history().index(), Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_undo_delete_restores_z_order() {
        let mut store = EditStore::new(1);
        let a = store.add_annotation(whiteout(1)).unwrap();
        let b = store.add_annotation(whiteout(1)).unwrap();
        let c = store.add_annotation(whiteout(1)).unwrap();
        store.delete_annotation(b.as_str()).unwrap();
        store.undo();

        let ids: Vec<_> = store.list_for_page(1).iter().map(|a| a.id().clone()).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_move_undo_keeps_z_order() {
        let mut store = EditStore::new(1);
        let a = store.add_annotation(whiteout(1)).unwrap();
        let b = store.add_annotation(whiteout(1)).unwrap();
        store.move_annotation(a.as_str(), 300.0, 300.0).unwrap();
        store.undo();
        let ids: Vec<_> = store.list_for_page(1).iter().map(|a| a.id().clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_resize_round_trip() {
        let mut store = EditStore::new(1);
        let id = store.add_annotation(whiteout(1)).unwrap();
        store.resize_annotation(id.as_str(), 40.0, 50.0).unwrap();
        store.undo();
        assert_eq!(store.get(id.as_str()), Some(&whiteout(1).with_id(id.clone())));
        store.redo();
        match store.get(id.as_str()) {
            Some(Annotation::Whiteout { rect, .. }) => {
                assert_eq!((rect.width, rect.height), (40.0, 50.0));
                // top edge stays at 20 + 30
                assert_eq!(rect.y + rect.height, 50.0);
            }
            other => panic!("Expected whiteout, got {:?}", other),
        }
    }

    #[test]
    fn test_resize_rejects_text_and_bad_sizes() {
        let mut store = EditStore::new(1);
        let t = store
            .add_annotation(Annotation::text_stamp(1, 0.0, 0.0, "x", 12.0, "#000000"))
            .unwrap();
        assert!(store.resize_annotation(t.as_str(), 1.0, 1.0).is_err());
        let w = store.add_annotation(whiteout(1)).unwrap();
        assert!(store.resize_annotation(w.as_str(), -1.0, 1.0).is_err());
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_edit_text_round_trip() {
        let mut store = EditStore::new(1);
        let t = store
            .add_annotation(Annotation::text_stamp(1, 0.0, 0.0, "DRAFT", 12.0, "#000000"))
            .unwrap();
        store.edit_text(t.as_str(), "FINAL").unwrap();
        store.undo();
        match store.get(t.as_str()) {
            Some(Annotation::TextStamp { text, .. }) => assert_eq!(text, "DRAFT"),
            other => panic!("Expected text stamp, got {:?}", other),
        }
        assert!(store.edit_text(t.as_str(), "  ").is_err());
    }

    #[test]
    fn test_clear_page_is_scoped_and_atomic() {
        let mut store = EditStore::new(2);
        store.add_annotation(whiteout(1)).unwrap();
        store.add_annotation(whiteout(1)).unwrap();
        store.add_annotation(whiteout(2)).unwrap();
        let before = snapshot(&store);

        assert_eq!(store.clear_page(1).unwrap(), 2);
        assert!(store.list_for_page(1).is_empty());
        assert_eq!(store.list_for_page(2).len(), 1);

        assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Clear));
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn test_clear_empty_records_nothing() {
        let mut store = EditStore::new(1);
        assert_eq!(store.clear_all(), 0);
        assert_eq!(store.clear_page(1).unwrap(), 0);
        assert!(store.history().is_empty());
        assert!(store.clear_page(5).is_err());
    }

    #[test]
    fn test_subscribers_see_mutations_after_they_apply() {
        let mut store = EditStore::new(2);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let sub = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        store.add_annotation(whiteout(2)).unwrap();
        store.undo();
        store.redo();

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent {
                    cause: ChangeCause::Edit(ActionKind::Add),
                    pages: vec![2]
                },
                StoreEvent {
                    cause: ChangeCause::Undo(ActionKind::Add),
                    pages: vec![2]
                },
                StoreEvent {
                    cause: ChangeCause::Redo(ActionKind::Add),
                    pages: vec![2]
                },
            ]
        );

        assert!(store.unsubscribe(sub));
        store.clear_all();
        assert_eq!(events.borrow().len(), 3);
    }

    #[test]
    fn test_from_annotations_has_no_history() {
        let loaded = vec![whiteout(1).with_id("w7"), whiteout(1)];
        let mut store = EditStore::from_annotations(1, loaded, StoreOptions::default()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.can_undo());
        assert_eq!(store.undo(), HistoryStatus::NothingToUndo);
        assert!(store.add_annotation(whiteout(1).with_id("w7")).is_err());
    }

    #[test]
    fn test_reload_keeps_subscribers_and_resets_history() {
        let mut store = EditStore::new(3);
        store.add_annotation(whiteout(1)).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let count = store.reload(vec![whiteout(3).with_id("w9")]).unwrap();
        assert_eq!(count, 1);
        assert!(!store.can_undo());
        assert!(store.list_for_page(1).is_empty());
        assert_eq!(
            *events.borrow(),
            vec![StoreEvent {
                cause: ChangeCause::Reload,
                pages: vec![1, 3]
            }]
        );

        // a failed reload leaves everything in place
        assert!(store.reload(vec![whiteout(4)]).is_err());
        assert_eq!(store.get("w9").map(Annotation::page), Some(3));
    }

    #[test]
    fn test_reload_never_reissues_ids() {
        let mut store = EditStore::new(2);
        let first = store.add_annotation(whiteout(1)).unwrap();
        assert_eq!(first.as_str(), "w1");

        store.reload(vec![whiteout(2).with_id("w9")]).unwrap();
        let next = store.add_annotation(whiteout(1)).unwrap();
        assert_ne!(next, first);
        assert_eq!(next.as_str(), "w2");

        // unassigned ids in loaded data skip everything issued so far
        store.reload(vec![whiteout(1), whiteout(2)]).unwrap();
        let ids: Vec<&str> = store.annotations().map(|a| a.id().as_str()).collect();
        assert_eq!(ids, vec!["w3", "w4"]);

        // reloading data that carries an earlier id is allowed
        store.reload(vec![whiteout(1).with_id("w1")]).unwrap();
        assert!(store.get("w1").is_some());
        assert_eq!(store.add_annotation(whiteout(1)).unwrap().as_str(), "w5");

        let duplicate = vec![whiteout(1).with_id("w7"), whiteout(2).with_id("w7")];
        assert_eq!(
            store.reload(duplicate),
            Err(RedactError::DuplicateId(AnnotationId::new("w7")))
        );
    }

    #[test]
    fn test_history_limit_option() {
        let mut store = EditStore::with_options(
            1,
            StoreOptions {
                history_limit: Some(2),
            },
        );
        for _ in 0..4 {
            store.add_annotation(whiteout(1)).unwrap();
        }
        assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Add));
        assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Add));
        assert_eq!(store.undo(), HistoryStatus::NothingToUndo);
        assert_eq!(store.len(), 2);
    }
}

//! Edit history scenarios
//!
//! End-to-end checks of the edit store and its undo/redo history through
//! the public API only.
//!
//! Run with: cargo test -p redact-core --test edit_history

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use redact_core::{
    ActionKind, Annotation, AnnotationId, AnnotationKind, ClearScope, DocPoint, EditStore,
    HistoryStatus, PdfRect, RedactError,
};

fn whiteout(page: u32, x: f64, y: f64, width: f64, height: f64) -> Annotation {
    Annotation::whiteout(
        page,
        PdfRect {
            x,
            y,
            width,
            height,
        },
    )
}

#[test]
fn delete_then_undo_walks_back_to_empty() {
    let mut store = EditStore::new(1);
    let original = whiteout(1, 10.0, 20.0, 100.0, 30.0);

    let id = store.add_annotation(original.clone()).unwrap();
    assert_eq!(id.as_str(), "w1");
    let stored = store.list_for_page(1)[0].clone();
    assert_eq!(stored, original.with_id("w1"));

    store.delete_annotation("w1").unwrap();
    assert!(store.list_for_page(1).is_empty());

    assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Delete));
    assert_eq!(store.list_for_page(1), &[stored]);

    assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Add));
    assert!(store.list_for_page(1).is_empty());

    assert_eq!(store.undo(), HistoryStatus::NothingToUndo);
    assert!(store.is_empty());
    assert_eq!(store.history_index(), None);
}

#[test]
fn move_undo_and_redo_restore_exact_positions() {
    let mut store = EditStore::new(1);
    store
        .add_annotation(whiteout(1, 10.0, 20.0, 100.0, 30.0))
        .unwrap();

    store.move_annotation("w1", 50.0, 60.0).unwrap();
    assert_eq!(store.get("w1").unwrap().position(), DocPoint::new(50.0, 60.0));

    assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Move));
    assert_eq!(store.get("w1").unwrap().position(), DocPoint::new(10.0, 20.0));

    assert_eq!(store.redo(), HistoryStatus::Redone(ActionKind::Move));
    assert_eq!(store.get("w1").unwrap().position(), DocPoint::new(50.0, 60.0));
    assert_eq!(store.redo(), HistoryStatus::NothingToRedo);
}

#[test]
fn new_edit_after_undo_discards_the_future() {
    let mut store = EditStore::new(1);
    let a = store.add_annotation(whiteout(1, 0.0, 0.0, 10.0, 10.0)).unwrap();
    store.add_annotation(whiteout(1, 20.0, 0.0, 10.0, 10.0)).unwrap();
    store.add_annotation(whiteout(1, 40.0, 0.0, 10.0, 10.0)).unwrap();

    store.undo();
    store.undo();
    let d = store.add_annotation(whiteout(1, 60.0, 0.0, 10.0, 10.0)).unwrap();

    assert_eq!(store.redo(), HistoryStatus::NothingToRedo);
    let ids: Vec<&str> = store
        .list_for_page(1)
        .iter()
        .map(|a| a.id().as_str())
        .collect();
    assert_eq!(ids, vec![a.as_str(), d.as_str()]);
    assert_eq!(store.history_len(), 2);
}

#[test]
fn clear_all_undoes_as_one_batch() {
    let mut store = EditStore::new(3);
    store.add_annotation(whiteout(1, 0.0, 0.0, 10.0, 10.0)).unwrap();
    store.add_annotation(whiteout(2, 5.0, 5.0, 10.0, 10.0)).unwrap();
    store
        .add_annotation(Annotation::text_stamp(
            2, 72.0, 700.0, "REDACTED", 12.0, "#B3B3B3",
        ))
        .unwrap();
    store
        .add_annotation(Annotation::freehand_stroke(
            3,
            vec![DocPoint::new(1.0, 1.0), DocPoint::new(9.0, 4.0)],
            "#FF0000",
            2.0,
            0.5,
        ))
        .unwrap();
    store.add_annotation(whiteout(3, 30.0, 30.0, 5.0, 5.0)).unwrap();
    let before: Vec<Annotation> = store.annotations().cloned().collect();
    assert_eq!(before.len(), 5);

    assert_eq!(store.clear_all(), 5);
    assert!(store.is_empty());

    assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Clear));
    let after: Vec<Annotation> = store.annotations().cloned().collect();
    assert_eq!(after, before);

    // one more undo only removes the last add
    store.undo();
    assert_eq!(store.len(), 4);
}

#[test]
fn clear_page_leaves_other_pages() {
    let mut store = EditStore::new(2);
    store.add_annotation(whiteout(1, 0.0, 0.0, 10.0, 10.0)).unwrap();
    store.add_annotation(whiteout(2, 0.0, 0.0, 10.0, 10.0)).unwrap();

    assert_eq!(store.clear_page(1).unwrap(), 1);
    assert!(store.list_for_page(1).is_empty());
    assert_eq!(store.list_for_page(2).len(), 1);

    let last = store.history().actions().last().unwrap();
    assert!(matches!(
        last.change,
        redact_core::Change::Clear {
            scope: ClearScope::Page(1),
            ..
        }
    ));
}

#[test]
fn unknown_ids_are_not_found() {
    let mut store = EditStore::new(1);
    assert!(matches!(
        store.delete_annotation("w1"),
        Err(RedactError::NotFound(_))
    ));
    assert!(matches!(
        store.move_annotation("w1", 1.0, 1.0),
        Err(RedactError::NotFound(_))
    ));
    assert!(store.history().is_empty());
}

#[derive(Debug, Clone)]
enum Draft {
    Box(u32, f64, f64, f64, f64),
    Text(u32, f64, f64, String),
    Line(u32, Vec<(f64, f64)>),
}

impl Draft {
    fn build(&self) -> Annotation {
        match self {
            Draft::Box(page, x, y, w, h) => whiteout(*page, *x, *y, *w, *h),
            Draft::Text(page, x, y, text) => {
                Annotation::text_stamp(*page, *x, *y, text.as_str(), 12.0, "#000000")
            }
            Draft::Line(page, points) => Annotation::freehand_stroke(
                *page,
                points.iter().map(|(x, y)| DocPoint::new(*x, *y)).collect(),
                "#000000",
                2.0,
                1.0,
            ),
        }
    }
}

fn draft_strategy() -> impl Strategy<Value = Draft> {
    let coord = 0.0f64..800.0;
    let size = 1.0f64..300.0;
    prop_oneof![
        (1u32..=3, coord.clone(), coord.clone(), size.clone(), size)
            .prop_map(|(p, x, y, w, h)| Draft::Box(p, x, y, w, h)),
        (1u32..=3, coord.clone(), coord.clone(), "[A-Za-z]{1,12}")
            .prop_map(|(p, x, y, t)| Draft::Text(p, x, y, t)),
        (
            1u32..=3,
            prop::collection::vec((coord.clone(), coord), 1..6)
        )
            .prop_map(|(p, pts)| Draft::Line(p, pts)),
    ]
}

/// One user edit. Targets are picked by index from whatever exists when
/// the edit runs.
#[derive(Debug, Clone)]
enum Edit {
    Add(Draft),
    Delete(usize),
    Move(usize, f64, f64),
    Resize(usize, f64, f64),
    ClearPage(u32),
    ClearAll,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => draft_strategy().prop_map(Edit::Add),
        2 => any::<usize>().prop_map(Edit::Delete),
        2 => (any::<usize>(), 0.0f64..800.0, 0.0f64..800.0)
            .prop_map(|(i, x, y)| Edit::Move(i, x, y)),
        1 => (any::<usize>(), 1.0f64..300.0, 1.0f64..300.0)
            .prop_map(|(i, w, h)| Edit::Resize(i, w, h)),
        1 => (1u32..=3).prop_map(Edit::ClearPage),
        1 => Just(Edit::ClearAll),
    ]
}

fn pick(ids: &[AnnotationId], index: usize) -> Option<&AnnotationId> {
    if ids.is_empty() {
        None
    } else {
        ids.get(index % ids.len())
    }
}

fn apply(store: &mut EditStore, edit: &Edit) {
    let ids: Vec<AnnotationId> = store.annotations().map(|a| a.id().clone()).collect();
    match edit {
        Edit::Add(draft) => {
            store.add_annotation(draft.build()).unwrap();
        }
        Edit::Delete(i) => {
            if let Some(id) = pick(&ids, *i) {
                store.delete_annotation(id.as_str()).unwrap();
            }
        }
        Edit::Move(i, x, y) => {
            if let Some(id) = pick(&ids, *i) {
                store.move_annotation(id.as_str(), *x, *y).unwrap();
            }
        }
        Edit::Resize(i, w, h) => {
            let boxes: Vec<AnnotationId> = store
                .annotations()
                .filter(|a| a.kind() == AnnotationKind::Whiteout)
                .map(|a| a.id().clone())
                .collect();
            if let Some(id) = pick(&boxes, *i) {
                store.resize_annotation(id.as_str(), *w, *h).unwrap();
            }
        }
        Edit::ClearPage(page) => {
            store.clear_page(*page).unwrap();
        }
        Edit::ClearAll => {
            store.clear_all();
        }
    }
}

proptest! {
    #[test]
    fn mixed_edits_undo_to_empty_and_redo_to_final(edits in prop::collection::vec(edit_strategy(), 1..30)) {
        let mut store = EditStore::new(3);
        for edit in &edits {
            apply(&mut store, edit);
        }
        let recorded = store.history_len();
        let final_state: Vec<Annotation> = store.annotations().cloned().collect();

        for _ in 0..recorded {
            prop_assert!(matches!(store.undo(), HistoryStatus::Undone(_)));
        }
        prop_assert!(store.is_empty());
        prop_assert_eq!(store.undo(), HistoryStatus::NothingToUndo);

        for _ in 0..recorded {
            prop_assert!(matches!(store.redo(), HistoryStatus::Redone(_)));
        }
        prop_assert_eq!(store.redo(), HistoryStatus::NothingToRedo);
        let restored: Vec<Annotation> = store.annotations().cloned().collect();
        prop_assert_eq!(restored, final_state);
    }

    #[test]
    fn undo_all_then_redo_all_restores_everything(drafts in prop::collection::vec(draft_strategy(), 1..20)) {
        let mut store = EditStore::new(3);
        for draft in &drafts {
            store.add_annotation(draft.build()).unwrap();
        }
        let snapshot: Vec<Annotation> = store.annotations().cloned().collect();

        for _ in 0..drafts.len() {
            prop_assert_eq!(store.undo(), HistoryStatus::Undone(ActionKind::Add));
        }
        prop_assert!(store.is_empty());
        prop_assert_eq!(store.undo(), HistoryStatus::NothingToUndo);

        for _ in 0..drafts.len() {
            prop_assert_eq!(store.redo(), HistoryStatus::Redone(ActionKind::Add));
        }
        let restored: Vec<Annotation> = store.annotations().cloned().collect();
        prop_assert_eq!(restored, snapshot);
        prop_assert_eq!(store.history_len(), drafts.len());
    }
}

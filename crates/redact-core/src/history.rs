//! Linear undo/redo history
//!
//! The history is a list of recorded actions plus a cursor. Everything at or
//! before the cursor is applied; everything after it is redoable. Recording
//! a new action while redoable actions exist discards them.
//!
//! Actions own snapshots of the annotations they touched, never the live
//! objects. Replaying or reverting an action goes through [`PageMap`]
//! directly and never records anything.

use crate::annotation::{Annotation, AnnotationId};
use crate::store::PageMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Add,
    Delete,
    Move,
    Update,
    Clear,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Delete => "delete",
            ActionKind::Move => "move",
            ActionKind::Update => "update",
            ActionKind::Clear => "clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearScope {
    Page(u32),
    All,
}

/// What a recorded action did, with enough state to reverse it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Change {
    Add {
        annotation: Annotation,
    },
    /// `index` is the z-order position within the page at removal time
    Delete {
        annotation: Annotation,
        index: usize,
    },
    Move {
        before: Annotation,
        after: Annotation,
    },
    Update {
        before: Annotation,
        after: Annotation,
    },
    Clear {
        scope: ClearScope,
        removed: BTreeMap<u32, Vec<Annotation>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAction {
    pub change: Change,
    pub timestamp: DateTime<Utc>,
}

impl HistoryAction {
    pub fn new(change: Change) -> Self {
        Self {
            change,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match &self.change {
            Change::Add { .. } => ActionKind::Add,
            Change::Delete { .. } => ActionKind::Delete,
            Change::Move { .. } => ActionKind::Move,
            Change::Update { .. } => ActionKind::Update,
            Change::Clear { .. } => ActionKind::Clear,
        }
    }

    /// The single annotation this action targets. `None` for clears.
    pub fn target(&self) -> Option<&AnnotationId> {
        match &self.change {
            Change::Add { annotation } | Change::Delete { annotation, .. } => Some(annotation.id()),
            Change::Move { after, .. } | Change::Update { after, .. } => Some(after.id()),
            Change::Clear { .. } => None,
        }
    }

    /// Pages whose content changes when this action is applied or reverted
    pub fn pages(&self) -> Vec<u32> {
        match &self.change {
            Change::Add { annotation } | Change::Delete { annotation, .. } => {
                vec![annotation.page()]
            }
            Change::Move { after, .. } | Change::Update { after, .. } => vec![after.page()],
            Change::Clear { removed, .. } => removed.keys().copied().collect(),
        }
    }

    /// Apply the inverse of this action
    pub(crate) fn revert(&self, pages: &mut PageMap) {
        match &self.change {
            Change::Add { annotation } => {
                if pages.remove(annotation.id().as_str()).is_none() {
                    tracing::warn!("Undo of add: {} was already gone", annotation.id());
                }
            }
            Change::Delete { annotation, index } => {
                pages.insert_at(annotation.clone(), *index);
            }
            Change::Move { before, .. } | Change::Update { before, .. } => {
                if !pages.replace(before.clone()) {
                    tracing::warn!("Undo: {} is missing, snapshot not restored", before.id());
                }
            }
            Change::Clear { removed, .. } => {
                for (page, annotations) in removed {
                    pages.restore_page(*page, annotations.clone());
                }
            }
        }
    }

    /// Apply this action forward again
    pub(crate) fn replay(&self, pages: &mut PageMap) {
        match &self.change {
            Change::Add { annotation } => pages.push(annotation.clone()),
            Change::Delete { annotation, .. } => {
                if pages.remove(annotation.id().as_str()).is_none() {
                    tracing::warn!("Redo of delete: {} was already gone", annotation.id());
                }
            }
            Change::Move { after, .. } | Change::Update { after, .. } => {
                if !pages.replace(after.clone()) {
                    tracing::warn!("Redo: {} is missing, snapshot not restored", after.id());
                }
            }
            Change::Clear { removed, .. } => {
                for page in removed.keys() {
                    pages.take_page(*page);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    actions: Vec<HistoryAction>,
    /// Number of applied actions; the cursor index is `applied - 1`
    applied: usize,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` actions, dropping the oldest first
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Append an action, discarding any redoable actions first
    pub fn record(&mut self, action: HistoryAction) {
        if self.applied < self.actions.len() {
            let dropped = self.actions.len() - self.applied;
            self.actions.truncate(self.applied);
            tracing::debug!("Discarded {} redoable actions", dropped);
        }

        tracing::debug!("Recorded {:?} action", action.kind());
        self.actions.push(action);

        if let Some(limit) = self.limit {
            if self.actions.len() > limit {
                let excess = self.actions.len() - limit;
                self.actions.drain(..excess);
            }
        }
        self.applied = self.actions.len();
    }

    /// Move the cursor back one step, returning the action to revert
    pub(crate) fn step_back(&mut self) -> Option<&HistoryAction> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        self.actions.get(self.applied)
    }

    /// Move the cursor forward one step, returning the action to replay
    pub(crate) fn step_forward(&mut self) -> Option<&HistoryAction> {
        if self.applied >= self.actions.len() {
            return None;
        }
        self.applied += 1;
        self.actions.get(self.applied - 1)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Index of the last applied action, `None` when nothing is applied
    pub fn index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn actions(&self) -> &[HistoryAction] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.applied = 0;
    }
}

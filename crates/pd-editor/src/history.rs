//! Per-page undo/redo history.
//!
//! Each page id owns two stacks of scene snapshots. Only the active page's
//! stacks are pushed to; switching pages suspends them without discarding,
//! so returning to a page restores its undo chain.
//!
//! Drag gestures use **snapshot batching**: the scene is captured at the
//! start of the gesture and pushed as one undo step when it ends, provided
//! it actually changed.

use pd_core::{PageId, SceneSnapshot};
use std::collections::HashMap;

/// Undo and redo stacks of one page.
#[derive(Debug, Clone, Default)]
pub struct HistoryStacks {
    undo: Vec<SceneSnapshot>,
    redo: Vec<SceneSnapshot>,
}

impl HistoryStacks {
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

/// Undo/redo stacks for every page, keyed by page id.
#[derive(Debug)]
pub struct PageHistory {
    stacks: HashMap<PageId, HistoryStacks>,
    active: Option<PageId>,
    /// Maximum undo depth per page.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Scene captured at the start of the outermost batch.
    batch_snapshot: Option<SceneSnapshot>,
}

impl PageHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            stacks: HashMap::new(),
            active: None,
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Start a fresh history for `page` and make it active.
    pub fn init(&mut self, page: PageId) {
        self.abort_batch();
        self.stacks.insert(page, HistoryStacks::default());
        self.active = Some(page);
    }

    /// Reactivate the retained history of `page` (fresh if it has none).
    pub fn restore(&mut self, page: PageId) {
        self.abort_batch();
        self.stacks.entry(page).or_default();
        self.active = Some(page);
    }

    /// Detach the active page. Its stacks stay retained.
    pub fn suspend(&mut self) {
        self.abort_batch();
        self.active = None;
    }

    /// Drop the history of a deleted page.
    pub fn forget(&mut self, page: PageId) {
        self.stacks.remove(&page);
        if self.active == Some(page) {
            self.active = None;
        }
    }

    pub fn active(&self) -> Option<PageId> {
        self.active
    }

    pub fn stacks(&self, page: PageId) -> Option<&HistoryStacks> {
        self.stacks.get(&page)
    }

    /// Record the pre-edit scene of the active page.
    /// Inside a batch the batch's opening snapshot stands in for it.
    pub fn checkpoint(&mut self, before: SceneSnapshot) {
        if self.batch_depth > 0 {
            return;
        }
        self.push_undo(before);
    }

    /// Open a gesture batch. Nested batches collapse into the outermost.
    pub fn begin_batch(&mut self, current: SceneSnapshot) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(current);
        }
        self.batch_depth += 1;
    }

    /// Close a gesture batch. The outermost close pushes one undo step if
    /// the scene changed during the gesture.
    pub fn end_batch(&mut self, current: &SceneSnapshot) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0
            && let Some(before) = self.batch_snapshot.take()
            && before != *current
        {
            self.push_undo(before);
        }
    }

    /// Step back. Returns the snapshot to load; `current` moves to redo.
    pub fn undo(&mut self, current: SceneSnapshot) -> Option<SceneSnapshot> {
        let stacks = self.active_stacks()?;
        let previous = stacks.undo.pop()?;
        stacks.redo.push(current);
        Some(previous)
    }

    /// Step forward. Returns the snapshot to load; `current` moves to undo.
    pub fn redo(&mut self, current: SceneSnapshot) -> Option<SceneSnapshot> {
        let stacks = self.active_stacks()?;
        let next = stacks.redo.pop()?;
        stacks.undo.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.active_ref().is_some_and(|s| !s.undo.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        self.active_ref().is_some_and(|s| !s.redo.is_empty())
    }

    /// Number of pages with retained history.
    pub fn depth(&self) -> usize {
        self.stacks.len()
    }

    fn push_undo(&mut self, snapshot: SceneSnapshot) {
        let max_depth = self.max_depth;
        let Some(stacks) = self.active_stacks() else {
            log::warn!("history: checkpoint with no active page dropped");
            return;
        };
        stacks.undo.push(snapshot);
        if stacks.undo.len() > max_depth {
            stacks.undo.remove(0);
        }
        // New action invalidates redo
        stacks.redo.clear();
    }

    fn abort_batch(&mut self) {
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }

    fn active_stacks(&mut self) -> Option<&mut HistoryStacks> {
        let id = self.active?;
        self.stacks.get_mut(&id)
    }

    fn active_ref(&self) -> Option<&HistoryStacks> {
        self.active.and_then(|id| self.stacks.get(&id))
    }
}

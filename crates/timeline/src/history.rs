use crate::{Timeline, TimelineError, Track};

/// Undo depth kept before the oldest snapshots fall off.
pub const HISTORY_LIMIT: usize = 100;

/// Snapshot-based undo/redo over the track list. Selection and drag
/// state are ephemeral and deliberately not captured.
#[derive(Debug, Default, Clone)]
pub struct EditHistory {
    undo_stack: Vec<Vec<Track>>,
    redo_stack: Vec<Vec<Track>>,
}

impl EditHistory {
    pub(crate) fn push(&mut self, tracks: Vec<Track>) {
        self.undo_stack.push(tracks);
        if self.undo_stack.len() > HISTORY_LIMIT {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl Timeline {
    /// Capture the current track state; every mutating edit operation
    /// calls this once validation has passed.
    pub(crate) fn push_history(&mut self) {
        let snapshot = self.tracks.clone();
        self.history.push(snapshot);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<(), TimelineError> {
        let prev = self
            .history
            .undo_stack
            .pop()
            .ok_or(TimelineError::HistoryEmpty("undo stack"))?;
        let current = std::mem::replace(&mut self.tracks, prev);
        self.history.redo_stack.push(current);
        self.prune_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), TimelineError> {
        let next = self
            .history
            .redo_stack
            .pop()
            .ok_or(TimelineError::HistoryEmpty("redo stack"))?;
        let current = std::mem::replace(&mut self.tracks, next);
        self.history.undo_stack.push(current);
        self.prune_selection();
        Ok(())
    }
}

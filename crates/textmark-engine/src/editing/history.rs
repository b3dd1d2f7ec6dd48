use xi_rope::Rope;

use crate::editing::MarkSpan;

/// One restorable document state: buffer, mark table, selection.
#[derive(Clone)]
pub(crate) struct Revision {
    pub(crate) buffer: Rope,
    pub(crate) spans: Vec<MarkSpan>,
    pub(crate) selection: std::ops::Range<usize>,
}

/// Linear undo/redo stacks of whole-document revisions.
///
/// Rope clones share structure, so a revision stores the full buffer rather
/// than an inverted delta. One recorded command pushes one revision, which
/// is what makes a delete+insert replacement undo as a single unit.
#[derive(Clone, Default)]
pub(crate) struct History {
    undo: Vec<Revision>,
    redo: Vec<Revision>,
}

impl History {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the state as it was before a change. Any redo branch is
    /// discarded.
    pub(crate) fn record(&mut self, revision: Revision) {
        self.undo.push(revision);
        self.redo.clear();
    }

    pub(crate) fn undo(&mut self, current: Revision) -> Option<Revision> {
        let revision = self.undo.pop()?;
        self.redo.push(current);
        Some(revision)
    }

    pub(crate) fn redo(&mut self, current: Revision) -> Option<Revision> {
        let revision = self.redo.pop()?;
        self.undo.push(current);
        Some(revision)
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

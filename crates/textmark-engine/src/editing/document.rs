use xi_rope::Rope;

use crate::editing::history::{History, Revision};
use crate::editing::{Cmd, Mark, MarkKind, MarkSet, MarkSpan, Patch, commands, spans};

/// Mark-annotated text document.
///
/// The text lives in a single `xi_rope::Rope` buffer, the source of truth
/// for the flat position space; positions are byte offsets on character
/// boundaries. Marks are carried by a side table of [`MarkSpan`]s whose
/// ranges are transformed through every edit's delta. All edits flow
/// through [`Cmd`] values compiled to deltas and applied atomically; each
/// recorded command pushes one undo revision and bumps the version counter.
///
/// The version counter doubles as the change notification: a host holding a
/// stale version number can detect that the document moved underneath it.
#[derive(Clone)]
pub struct Document {
    /// Rope buffer containing the entire document as UTF-8 bytes
    pub(crate) buffer: Rope,
    /// Mark spans over byte ranges of the buffer
    pub(crate) spans: Vec<MarkSpan>,
    /// Current selection/cursor position as byte offsets in the buffer
    pub(crate) selection: std::ops::Range<usize>,
    /// Version counter incremented on each mutation
    pub(crate) version: u64,
    /// Undo/redo revisions
    pub(crate) history: History,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        let buffer = Rope::from(text);
        let len = buffer.len();

        Ok(Self {
            buffer,
            spans: Vec::new(),
            selection: len..len,
            version: 0,
            history: History::new(),
        })
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// Slice the buffer to a cow string, clamping the range to the document
    /// bounds.
    pub fn slice_to_cow(&self, range: std::ops::Range<usize>) -> std::borrow::Cow<'_, str> {
        let doc_len = self.buffer.len();
        let start = range.start.min(doc_len);
        let end = range.end.min(doc_len).max(start);
        self.buffer.slice_to_cow(start..end)
    }

    /// Plain-text rendering of a range, with newlines (block boundaries)
    /// replaced by `block_separator`.
    pub fn text_between(&self, range: std::ops::Range<usize>, block_separator: &str) -> String {
        self.slice_to_cow(range).replace('\n', block_separator)
    }

    /// Plain-text rendering of the whole document with a configurable block
    /// separator.
    pub fn plain_text(&self, block_separator: &str) -> String {
        self.text_between(0..self.len(), block_separator)
    }

    /// Ordered set of marks active at a byte position.
    pub fn marks_at(&self, pos: usize) -> MarkSet {
        spans::marks_at(self, pos)
    }

    /// The mark span table, in insertion order.
    pub fn spans(&self) -> &[MarkSpan] {
        &self.spans
    }

    /// Ranges currently covered by spans of `kind`.
    pub fn ranges_of(&self, kind: MarkKind) -> Vec<std::ops::Range<usize>> {
        spans::ranges_of(self, kind)
    }

    /// Attach a mark to a byte range. Mark-only mutation: the text and the
    /// undo history are untouched, but the version still advances.
    pub fn add_mark(&mut self, mark: Mark, range: std::ops::Range<usize>) -> Patch {
        let clamped = commands::clamp_range(self, &range);
        spans::add_span(self, mark, clamped.clone());
        self.version += 1;
        Patch {
            changed: vec![clamped],
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }

    /// Remove every span of the given kinds. Mark-only mutation, not
    /// recorded in the undo history.
    pub fn strip_marks(&mut self, kinds: &[MarkKind]) -> Patch {
        let changed = spans::strip_spans(self, kinds);
        self.version += 1;
        Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }

    /// Apply a command, recording one undo revision.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        self.apply_inner(cmd, true)
    }

    /// Apply a command without recording an undo revision. Used for
    /// corrections that must not appear as their own history entry.
    pub fn apply_unrecorded(&mut self, cmd: Cmd) -> Patch {
        self.apply_inner(cmd, false)
    }

    fn apply_inner(&mut self, cmd: Cmd, record: bool) -> Patch {
        let delta = commands::compile_command(self, &cmd);
        let old_len = self.len();

        // Track inserted ranges for the patch
        let mut changed = Vec::new();
        let mut cursor = 0;
        for op in delta.els.iter() {
            match op {
                xi_rope::delta::DeltaElement::Copy(_from, to) => {
                    cursor = *to;
                }
                xi_rope::delta::DeltaElement::Insert(inserted) => {
                    let start = cursor;
                    let end = cursor + inserted.len();
                    changed.push(start..end);
                    cursor = end;
                }
            }
        }

        if record {
            self.history.record(self.revision());
        }

        // Transformed against the pre-edit document, where the command's
        // ranges are meaningful
        let new_selection = commands::transform_selection_for_command(self, &self.selection, &cmd);

        // Buffer and span table update together: one delta, applied once
        self.buffer = delta.apply(&self.buffer);
        spans::transform_spans(self, &delta);

        // A replacement carries the mark set for the bytes it inserted
        if let Cmd::ReplaceRange { range, text, marks } = &cmd {
            let start = range.start.min(old_len);
            let inserted = start..start + text.len();
            for mark in marks.iter() {
                spans::add_span(self, mark.clone(), inserted.clone());
            }
        }

        self.selection = new_selection.clone();
        self.version += 1;

        Patch {
            changed,
            new_selection,
            version: self.version,
        }
    }

    fn revision(&self) -> Revision {
        Revision {
            buffer: self.buffer.clone(),
            spans: self.spans.clone(),
            selection: self.selection.clone(),
        }
    }

    fn restore(&mut self, revision: Revision) -> Patch {
        self.buffer = revision.buffer;
        self.spans = revision.spans;
        self.selection = revision.selection.clone();
        self.version += 1;
        Patch {
            changed: vec![0..self.len()],
            new_selection: revision.selection,
            version: self.version,
        }
    }

    /// Revert the most recent recorded command. Text, marks and selection
    /// restore together.
    pub fn undo(&mut self) -> Option<Patch> {
        let current = self.revision();
        let revision = self.history.undo(current)?;
        Some(self.restore(revision))
    }

    /// Reapply the most recently undone command.
    pub fn redo(&mut self) -> Option<Patch> {
        let current = self.revision();
        let revision = self.history.redo(current)?;
        Some(self.restore(revision))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Get the current selection range
    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    /// Set the selection range (clamped to the document)
    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.selection = commands::clamp_range(self, &selection);
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // History is derived state and does not participate in equality
        self.buffer.to_string() == other.buffer.to_string()
            && self.spans == other.spans
            && self.selection == other.selection
            && self.version == other.version
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.text())
            .field("spans", &self.spans)
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish()
    }
}

use crate::editing::{Document, MarkKind, Patch};

/// Kinds stripped from pasted content: link formatting and stray
/// inserted-text tags that rode in with the clipboard payload.
const STRIPPED_ON_PASTE: [MarkKind; 2] = [MarkKind::Link, MarkKind::InsertedText];

/// Deferred correction run after a host paste event.
///
/// The host schedules a fixup from its paste handler and drains the queue on
/// the next event-loop turn, once the native paste has landed in the
/// document. Draining strips link and inserted-text spans without recording
/// an undo revision, so the cleanup never shows up as its own history entry.
/// Once scheduled, a fixup cannot be cancelled; draining with nothing
/// pending is a no-op.
#[derive(Debug, Default)]
pub struct PasteFixups {
    pending: bool,
}

impl PasteFixups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Run any scheduled fixup against the document.
    pub fn drain(&mut self, doc: &mut Document) -> Option<Patch> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(doc.strip_marks(&STRIPPED_ON_PASTE))
    }
}

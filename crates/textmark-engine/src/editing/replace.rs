use crate::editing::{Cmd, Document, Mark, MarkKind, Patch};

/// Replace `[range.start, range.end)` with `text`, carrying the marks that
/// were active at the start of the range plus a fresh inserted-text tag.
///
/// A prior inserted-text mark on the source run is dropped before the fresh
/// one is appended, so transformed output is tagged exactly once no matter
/// how many times it is re-transformed. The delete and the insert commit as
/// one command and one undo revision, and the caret lands at the end of the
/// inserted text.
///
/// Returns `None` without touching anything when the document handle is
/// absent or the range is collapsed.
pub fn replace_selection(
    doc: Option<&mut Document>,
    range: std::ops::Range<usize>,
    text: &str,
) -> Option<Patch> {
    let doc = doc?;
    if range.start >= range.end {
        return None;
    }

    let mut marks = doc.marks_at(range.start).without(MarkKind::InsertedText);
    marks.add(Mark::new(MarkKind::InsertedText));

    // The replaced range is the selection; the caret collapses to the end
    // of the inserted text through the command's selection transform
    doc.set_selection(range.clone());
    Some(doc.apply(Cmd::ReplaceRange {
        range,
        text: text.to_string(),
        marks,
    }))
}

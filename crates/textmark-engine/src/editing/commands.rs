use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::{Document, MarkSet};

/// Commands that can be applied to the document.
///
/// Positions are byte offsets into the document's flat position space and
/// must fall on character boundaries; offsets past the end are clamped.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: std::ops::Range<usize>,
    },
    /// Remove `range` and insert `text` in its place, tagging the inserted
    /// bytes with `marks`. Compiles to one delta, so the delete and the
    /// insert are never observable separately.
    ReplaceRange {
        range: std::ops::Range<usize>,
        text: String,
        marks: MarkSet,
    },
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    match cmd {
        Cmd::InsertText { at, text } => {
            let at = (*at).min(doc.len());
            let mut builder = Builder::new(doc.len());
            builder.replace(at..at, Rope::from(text));
            builder.build()
        }
        Cmd::DeleteRange { range } => {
            let range = clamp_range(doc, range);
            let mut builder = Builder::new(doc.len());
            builder.delete(range);
            builder.build()
        }
        Cmd::ReplaceRange { range, text, .. } => {
            let range = clamp_range(doc, range);
            let mut builder = Builder::new(doc.len());
            builder.replace(range, Rope::from(text));
            builder.build()
        }
    }
}

/// Clamp a byte range to the document bounds.
pub(crate) fn clamp_range(
    doc: &Document,
    range: &std::ops::Range<usize>,
) -> std::ops::Range<usize> {
    let doc_len = doc.len();
    let start = range.start.min(doc_len);
    let end = range.end.min(doc_len).max(start);
    start..end
}

/// Transform selection based on the command being applied
pub(crate) fn transform_selection_for_command(
    doc: &Document,
    range: &std::ops::Range<usize>,
    cmd: &Cmd,
) -> std::ops::Range<usize> {
    match cmd {
        Cmd::InsertText { at, text } => {
            let at = (*at).min(doc.len());
            let text_len = text.len();
            if at <= range.start {
                // Insertion before or at selection start shifts it right
                (range.start + text_len)..(range.end + text_len)
            } else if at < range.end {
                // Insertion within selection grows the end
                range.start..(range.end + text_len)
            } else {
                range.clone()
            }
        }
        Cmd::DeleteRange { range: del_range } => {
            let del_range = clamp_range(doc, del_range);
            let del_len = del_range.len();
            if del_range.end <= range.start {
                // Deletion completely before selection shifts it left
                (range.start - del_len)..(range.end - del_len)
            } else if del_range.start >= range.end {
                range.clone()
            } else {
                // Deletion overlaps selection: collapse to deletion point
                del_range.start..del_range.start
            }
        }
        Cmd::ReplaceRange {
            range: replace_range,
            text,
            ..
        } => {
            let replace_range = clamp_range(doc, replace_range);
            let del_len = replace_range.len();
            let insert_len = text.len();

            if replace_range.end <= range.start {
                // Replacement before selection shifts it by the net change
                let shift = insert_len as i64 - del_len as i64;
                let start = (range.start as i64 + shift).max(0) as usize;
                let end = (range.end as i64 + shift).max(0) as usize;
                start..end
            } else if replace_range.start >= range.end {
                range.clone()
            } else {
                // Replacement touches the selection: collapse the caret to
                // the end of the inserted text
                let caret = replace_range.start + insert_len;
                caret..caret
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============ InsertText command tests ============

    #[test]
    fn test_insert_text_at_beginning() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(0..0);

        let patch = doc.apply(Cmd::InsertText {
            at: 0,
            text: "say: ".to_string(),
        });

        assert_eq!(doc.text(), "say: hello world");
        assert_eq!(patch.version, 1);
        assert_eq!(patch.changed, vec![0..5]);
        assert_eq!(patch.new_selection, 5..5);
    }

    #[test]
    fn test_insert_text_in_middle() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(5..5);

        let patch = doc.apply(Cmd::InsertText {
            at: 5,
            text: " there".to_string(),
        });

        assert_eq!(doc.text(), "hello there world");
        assert_eq!(patch.changed, vec![5..11]);
        assert_eq!(patch.new_selection, 11..11);
    }

    #[test]
    fn test_insert_text_past_end_is_clamped() {
        let mut doc = Document::from_bytes(b"hello").unwrap();

        doc.apply(Cmd::InsertText {
            at: 99,
            text: "!".to_string(),
        });

        assert_eq!(doc.text(), "hello!");
    }

    // ============ DeleteRange command tests ============

    #[test]
    fn test_delete_range_multiple_chars() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(11..11);

        let patch = doc.apply(Cmd::DeleteRange { range: 5..11 });

        assert_eq!(doc.text(), "hello");
        assert_eq!(patch.new_selection, 5..5);
    }

    #[test]
    fn test_delete_range_across_lines() {
        let mut doc = Document::from_bytes(b"Line 1\nLine 2\nLine 3").unwrap();

        doc.apply(Cmd::DeleteRange { range: 6..14 });

        assert_eq!(doc.text(), "Line 1Line 3");
    }

    // ============ ReplaceRange command tests ============

    #[test]
    fn test_replace_range_basic() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();

        let patch = doc.apply(Cmd::ReplaceRange {
            range: 6..11,
            text: "there".to_string(),
            marks: MarkSet::new(),
        });

        assert_eq!(doc.text(), "hello there");
        assert!(!patch.changed.is_empty());
    }

    #[test]
    fn test_replace_range_with_longer_text() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();

        doc.apply(Cmd::ReplaceRange {
            range: 6..11,
            text: "wide wide world".to_string(),
            marks: MarkSet::new(),
        });

        assert_eq!(doc.text(), "hello wide wide world");
    }

    #[test]
    fn test_replace_range_empty_text_deletes() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();

        doc.apply(Cmd::ReplaceRange {
            range: 5..11,
            text: String::new(),
            marks: MarkSet::new(),
        });

        assert_eq!(doc.text(), "hello");
    }

    #[test]
    fn test_replace_range_vs_delete_insert() {
        let original = "hello world";

        let mut doc1 = Document::from_bytes(original.as_bytes()).unwrap();
        doc1.apply(Cmd::ReplaceRange {
            range: 0..5,
            text: "goodbye".to_string(),
            marks: MarkSet::new(),
        });

        let mut doc2 = Document::from_bytes(original.as_bytes()).unwrap();
        doc2.apply(Cmd::DeleteRange { range: 0..5 });
        doc2.apply(Cmd::InsertText {
            at: 0,
            text: "goodbye".to_string(),
        });

        assert_eq!(doc1.text(), doc2.text());
        assert_eq!(doc1.text(), "goodbye world");
    }

    // ============ Selection transformation tests ============

    #[test]
    fn test_selection_transform_after_insert() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(8..10);

        doc.apply(Cmd::InsertText {
            at: 5,
            text: " there".to_string(),
        });

        assert_eq!(doc.selection(), 14..16);
    }

    #[test]
    fn test_selection_transform_after_delete_before() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(8..10);

        doc.apply(Cmd::DeleteRange { range: 0..6 });

        assert_eq!(doc.selection(), 2..4);
    }

    #[test]
    fn test_selection_transform_after_delete_containing() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(8..10);

        doc.apply(Cmd::DeleteRange { range: 6..11 });

        assert_eq!(doc.selection(), 6..6);
    }

    #[test]
    fn test_replace_of_selection_moves_caret_to_end_of_insert() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.set_selection(0..5);

        doc.apply(Cmd::ReplaceRange {
            range: 0..5,
            text: "HELLO".to_string(),
            marks: MarkSet::new(),
        });

        // Caret collapses to just after the inserted text
        assert_eq!(doc.selection(), 5..5);
    }

    #[test]
    fn test_replace_before_selection_shifts_it() {
        let mut doc = Document::from_bytes(b"hello world end").unwrap();
        doc.set_selection(12..15); // "end"

        doc.apply(Cmd::ReplaceRange {
            range: 6..11, // "world" -> 8 bytes
            text: "universe".to_string(),
            marks: MarkSet::new(),
        });

        assert_eq!(doc.selection(), 15..18);
        assert_eq!(doc.text(), "hello universe end");
    }
}

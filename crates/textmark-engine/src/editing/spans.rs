use serde::{Deserialize, Serialize};
use xi_rope::delta::Transformer;
use xi_rope::{Delta, RopeInfo};

use crate::editing::{Document, Mark, MarkKind, MarkSet};

/// A mark applied to a byte range of the document.
///
/// Spans live in a side table next to the rope buffer. Their ranges are
/// transformed through every edit's delta, so an annotation stays attached
/// to the text it covers while the text moves around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkSpan {
    pub mark: Mark,
    pub range: std::ops::Range<usize>,
}

/// Transform mark spans through a delta operation.
///
/// The start is transformed with `after = true` so an insertion at the exact
/// start pushes the span forward; the end uses `after = false` so an
/// insertion at the exact end does not expand it. Spans that collapse to
/// empty (their covered text was deleted) are dropped.
pub(crate) fn transform_spans(doc: &mut Document, delta: &Delta<RopeInfo>) {
    let mut transformer = Transformer::new(delta);

    for span in &mut doc.spans {
        let new_start = transformer.transform(span.range.start, true);
        let new_end = transformer.transform(span.range.end, false);
        span.range = new_start..new_end.max(new_start);
    }

    let doc_len = doc.len();
    doc.spans
        .retain(|span| span.range.start < span.range.end && span.range.end <= doc_len);
}

/// Ordered set of marks active at a byte position: the marks of the
/// character starting at `pos`. When overlapping spans carry the same kind,
/// the earliest span in the table wins.
pub(crate) fn marks_at(doc: &Document, pos: usize) -> MarkSet {
    let mut set = MarkSet::new();
    for span in &doc.spans {
        if span.range.start <= pos && pos < span.range.end && !set.contains(span.mark.kind) {
            set.add(span.mark.clone());
        }
    }
    set
}

/// Add a span, clamped to the document. Empty ranges are ignored.
pub(crate) fn add_span(doc: &mut Document, mark: Mark, range: std::ops::Range<usize>) {
    let doc_len = doc.len();
    let start = range.start.min(doc_len);
    let end = range.end.min(doc_len);
    if start < end {
        doc.spans.push(MarkSpan {
            mark,
            range: start..end,
        });
    }
}

/// Remove every span whose kind is in `kinds`, returning the ranges they
/// covered.
pub(crate) fn strip_spans(doc: &mut Document, kinds: &[MarkKind]) -> Vec<std::ops::Range<usize>> {
    let mut removed = Vec::new();
    doc.spans.retain(|span| {
        if kinds.contains(&span.mark.kind) {
            removed.push(span.range.clone());
            false
        } else {
            true
        }
    });
    removed
}

/// Ranges covered by spans of the given kind, in table order.
pub(crate) fn ranges_of(doc: &Document, kind: MarkKind) -> Vec<std::ops::Range<usize>> {
    doc.spans
        .iter()
        .filter(|span| span.mark.kind == kind)
        .map(|span| span.range.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Cmd;
    use pretty_assertions::assert_eq;

    fn doc_with_span(text: &str, kind: MarkKind, range: std::ops::Range<usize>) -> Document {
        let mut doc = Document::from_bytes(text.as_bytes()).unwrap();
        doc.add_mark(Mark::new(kind), range);
        doc
    }

    #[test]
    fn test_span_shifts_right_on_insert_before() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 6..11);

        doc.apply(Cmd::InsertText {
            at: 0,
            text: "say: ".to_string(),
        });

        assert_eq!(doc.spans()[0].range, 11..16);
        assert_eq!(doc.text(), "say: hello world");
    }

    #[test]
    fn test_span_unchanged_on_insert_after() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 0..5);

        doc.apply(Cmd::InsertText {
            at: 11,
            text: "!".to_string(),
        });

        assert_eq!(doc.spans()[0].range, 0..5);
    }

    #[test]
    fn test_span_grows_on_insert_inside() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 0..11);

        doc.apply(Cmd::InsertText {
            at: 5,
            text: " there".to_string(),
        });

        // Typing inside a marked run extends the run
        assert_eq!(doc.spans()[0].range, 0..17);
    }

    #[test]
    fn test_span_does_not_grow_on_insert_at_end_boundary() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 0..5);

        doc.apply(Cmd::InsertText {
            at: 5,
            text: "!!!".to_string(),
        });

        assert_eq!(doc.spans()[0].range, 0..5);
    }

    #[test]
    fn test_span_shrinks_on_partial_delete() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 0..11);

        doc.apply(Cmd::DeleteRange { range: 5..11 });

        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.spans()[0].range, 0..5);
    }

    #[test]
    fn test_span_dropped_when_covered_text_deleted() {
        let mut doc = doc_with_span("hello world", MarkKind::Bold, 6..11);

        doc.apply(Cmd::DeleteRange { range: 5..11 });

        assert_eq!(doc.text(), "hello");
        assert!(doc.spans().is_empty());
    }

    #[test]
    fn test_marks_at_position() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.add_mark(Mark::new(MarkKind::Bold), 0..11);
        doc.add_mark(Mark::new(MarkKind::Link), 6..11);

        let at_start = doc.marks_at(0);
        assert!(at_start.contains(MarkKind::Bold));
        assert!(!at_start.contains(MarkKind::Link));

        let at_world = doc.marks_at(6);
        assert!(at_world.contains(MarkKind::Bold));
        assert!(at_world.contains(MarkKind::Link));

        // End of document: no character starts there
        assert!(doc.marks_at(11).is_empty());
    }

    #[test]
    fn test_marks_at_dedupes_overlapping_same_kind() {
        let mut doc = Document::from_bytes(b"hello world").unwrap();
        doc.add_mark(
            Mark::with_attr(MarkKind::Link, "href", serde_json::json!("/first")),
            0..11,
        );
        doc.add_mark(
            Mark::with_attr(MarkKind::Link, "href", serde_json::json!("/second")),
            3..8,
        );

        let set = doc.marks_at(5);

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(MarkKind::Link).unwrap().attrs["href"],
            serde_json::json!("/first")
        );
    }

    #[test]
    fn test_add_mark_ignores_empty_and_clamps() {
        let mut doc = Document::from_bytes(b"hello").unwrap();

        doc.add_mark(Mark::new(MarkKind::Bold), 3..3);
        assert!(doc.spans().is_empty());

        doc.add_mark(Mark::new(MarkKind::Bold), 2..99);
        assert_eq!(doc.spans()[0].range, 2..5);
    }
}

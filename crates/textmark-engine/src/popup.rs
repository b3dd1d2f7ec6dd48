//! Transient state for the transform popup.
//!
//! The controller is a two-state machine, `Hidden` or `Visible(snapshot)`.
//! It owns a captured-by-value snapshot of the selection (range, text,
//! anchor, document version) and nothing else; the live document is passed
//! into each operation. Every failure path declines quietly: a guard that
//! does not pass leaves the state untouched and surfaces nothing.

use crate::editing::{Document, Patch, replace_selection};
use crate::transforms::Transform;

/// Vertical gap between the selection rectangle and the popup.
const ANCHOR_GAP: f64 = 8.0;

/// Screen-space bounding rectangle of the active selection, as reported by
/// the host UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// Where the popup is placed: just below the selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupAnchor {
    pub top: f64,
    pub left: f64,
}

impl PopupAnchor {
    fn below(rect: &AnchorRect) -> Self {
        Self {
            top: rect.bottom + ANCHOR_GAP,
            left: rect.left,
        }
    }
}

/// Captured-by-value selection data, decoupled from the live document.
///
/// `doc_version` is the version the document had when the snapshot was
/// taken. It is checked again at commit time, so a snapshot that went stale
/// is refused even if the visibility bookkeeping somehow missed the edit.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    pub range: std::ops::Range<usize>,
    pub text: String,
    pub anchor: PopupAnchor,
    pub doc_version: u64,
}

/// Host hook for suppressing background scroll/interaction while the popup
/// is open. `hold` is called on the transition to visible, `release` on
/// every transition back to hidden, including controller teardown.
pub trait ScrollLatch {
    fn hold(&mut self);
    fn release(&mut self);
}

/// Latch for hosts with nothing to suppress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScrollLatch;

impl ScrollLatch for NoScrollLatch {
    fn hold(&mut self) {}
    fn release(&mut self) {}
}

/// Popup state machine. `None` snapshot means `Hidden`.
#[derive(Debug)]
pub struct PopupController<L: ScrollLatch = NoScrollLatch> {
    snapshot: Option<SelectionSnapshot>,
    latch: L,
}

impl PopupController<NoScrollLatch> {
    pub fn new() -> Self {
        Self::with_latch(NoScrollLatch)
    }
}

impl Default for PopupController<NoScrollLatch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ScrollLatch> PopupController<L> {
    pub fn with_latch(latch: L) -> Self {
        Self {
            snapshot: None,
            latch,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&SelectionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Request to open the popup over `range`. Stays hidden unless the
    /// document is present, the range is non-collapsed, the captured text is
    /// non-blank after trimming, and the host produced a selection
    /// rectangle. Returns whether the popup is now visible.
    pub fn open_requested(
        &mut self,
        doc: Option<&Document>,
        range: std::ops::Range<usize>,
        rect: Option<AnchorRect>,
    ) -> bool {
        let Some(doc) = doc else {
            return false;
        };
        if range.start == range.end {
            return false;
        }
        let text = doc.text_between(range.clone(), " ");
        if text.trim().is_empty() {
            return false;
        }
        let Some(rect) = rect else {
            return false;
        };

        if !self.is_visible() {
            self.latch.hold();
        }
        self.snapshot = Some(SelectionSnapshot {
            range,
            text,
            anchor: PopupAnchor::below(&rect),
            doc_version: doc.version(),
        });
        true
    }

    /// Any document mutation invalidates the captured range; hide.
    pub fn document_changed(&mut self) {
        self.hide();
    }

    /// Explicit close (click outside, escape).
    pub fn dismissed(&mut self) {
        self.hide();
    }

    /// Apply `transform` to the captured selection, then hide.
    ///
    /// The edit commits only when the popup was visible, the document is
    /// present, and the document version still matches the snapshot. The
    /// popup ends hidden on every path.
    pub fn transform_chosen(
        &mut self,
        doc: Option<&mut Document>,
        transform: Transform,
    ) -> Option<Patch> {
        let snapshot = self.take_snapshot()?;
        let doc = doc?;
        if doc.version() != snapshot.doc_version {
            return None;
        }
        let replacement = transform.apply(&snapshot.text);
        replace_selection(Some(doc), snapshot.range, &replacement)
    }

    fn take_snapshot(&mut self) -> Option<SelectionSnapshot> {
        let snapshot = self.snapshot.take();
        if snapshot.is_some() {
            self.latch.release();
        }
        snapshot
    }

    fn hide(&mut self) {
        let _ = self.take_snapshot();
    }
}

impl<L: ScrollLatch> Drop for PopupController<L> {
    fn drop(&mut self) {
        // Teardown while visible must still restore the host's scroll state
        self.hide();
    }
}

/*!
 * # Editing Core Module
 *
 * Command-based rich text editing over a single xi-rope buffer.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The entire document is stored in one **`xi_rope::Rope`** buffer
 * - Provides efficient insert/delete operations and **Delta** representation of edits
 * - **Lossless round-trip**: saving writes rope bytes verbatim with no formatting drift
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum) that compile to **Deltas**
 * - Commands are applied immediately for authoritative model updates
 * - One recorded command is one undo revision, so compound edits stay atomic
 *
 * ### 3. Marks as Span Side Table
 * - Formatting (**`Mark`**) never lives in the text; it lives in **`MarkSpan`** ranges
 *   alongside the buffer
 * - Span ranges are transformed through Deltas using xi-rope's interval
 *   transformation, so formatting survives surrounding edits
 * - Replacement text written via `replace_selection` inherits the marks active at
 *   the start of the replaced run and gains a fresh `insertedText` tag
 *
 * ### 4. Patches for the UI
 * - Every mutation returns a **`Patch`** with changed ranges, the new selection,
 *   and the bumped document version
 * - Hosts use the version to detect stale captured state (see `crate::popup`)
 *
 * ## Module Structure
 *
 * - **`document`**: Core `Document` type owning buffer, spans, selection and history
 * - **`commands`**: `Cmd` enum and delta compilation logic for all edit operations
 * - **`marks`**: `MarkKind`/`Mark`/`MarkSet`, the closed formatting vocabulary
 * - **`spans`**: `MarkSpan` side table and its delta transformation
 * - **`replace`**: mark-inheriting selection replacement
 * - **`paste`**: deferred post-paste mark stripping
 * - **`patch`**: edit result metadata
 *
 * ## Usage Pattern
 *
 * ```rust
 * use textmark_engine::editing::*;
 *
 * let mut doc = Document::from_bytes(b"hello world").unwrap();
 * doc.add_mark(Mark::new(MarkKind::Bold), 0..5);
 *
 * let patch = replace_selection(Some(&mut doc), 0..5, "HELLO").unwrap();
 * assert_eq!(doc.text(), "HELLO world");
 * assert!(doc.marks_at(0).contains(MarkKind::InsertedText));
 * assert_eq!(patch.new_selection, 5..5);
 * ```
 */

// Module exports
pub mod commands;
pub mod document;
mod history;
pub mod marks;
pub mod paste;
pub mod patch;
pub mod replace;
pub mod spans;

// Public API re-exports
pub use commands::Cmd;
pub use document::Document;
pub use marks::{Mark, MarkKind, MarkSet};
pub use paste::PasteFixups;
pub use patch::Patch;
pub use replace::replace_selection;
pub use spans::MarkSpan;

pub mod editing;
pub mod popup;
pub mod transforms;

// Re-export key types for easier usage
pub use editing::{commands::*, document::*, marks::*, paste::*, patch::*, replace::*, spans::*};
pub use popup::{AnchorRect, NoScrollLatch, PopupAnchor, PopupController, ScrollLatch, SelectionSnapshot};
pub use transforms::Transform;

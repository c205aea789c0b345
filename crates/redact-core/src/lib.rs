//! Client-side PDF redaction editing
//!
//! This crate holds the state behind a redaction editor: annotations placed
//! on pages (whiteout boxes, text stamps, freehand strokes), a linear
//! undo/redo history over every edit, and the mapping between the rendered
//! page on screen and PDF document space.
//!
//! Annotations are stored in document space only. When the user exports,
//! a [`CommitBridge`] burns them into a copy of the original document;
//! [`LopdfBridge`] flattens them into page content with lopdf.

pub mod annotation;
pub mod commit;
pub mod coords;
pub mod error;
pub mod history;
pub mod page_info;
pub mod session;
pub mod store;

pub use annotation::{Annotation, AnnotationId, AnnotationKind};
pub use commit::{pages_of, CommitBridge, LopdfBridge, PageAnnotations};
pub use coords::{
    rect_to_document_space, rect_to_screen_space, to_document_space, to_screen_space, DocPoint,
    PdfRect, ScreenPoint, ScreenRect, Viewport,
};
pub use error::{RedactError, Result};
pub use history::{ActionKind, Change, ClearScope, History, HistoryAction};
pub use page_info::PageGeometry;
pub use session::{RedactSession, RedactionData, RedactionStats, StrokeStyle, TextStyle};
pub use store::{
    ChangeCause, EditStore, HistoryStatus, StoreEvent, StoreOptions, SubscriptionId,
};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| RedactError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

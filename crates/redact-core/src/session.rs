//! Redaction session
//!
//! Ties one loaded document to its edit store. The session knows each
//! page's geometry, so it can accept edits straight from screen space and
//! hand the finished annotations to a [`CommitBridge`].

use crate::annotation::{Annotation, AnnotationId, AnnotationKind};
use crate::commit::{pages_of, CommitBridge, LopdfBridge};
use crate::coords::{ScreenPoint, ScreenRect, Viewport};
use crate::error::{RedactError, Result};
use crate::page_info::PageGeometry;
use crate::store::{EditStore, StoreOptions};
use chrono::{DateTime, Utc};
use lopdf::Document;
use serde::{Deserialize, Serialize};

/// Font settings for new text stamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font size in points
    pub font_size: f64,
    pub color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            color: "#B3B3B3".to_string(),
        }
    }
}

/// Pen settings for new freehand strokes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    pub color: String,
    /// Line width in points
    pub width: f64,
    pub opacity: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
            opacity: 1.0,
        }
    }
}

/// Saved annotations of a session, as written by [`RedactSession::export_json`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionData {
    pub annotations: Vec<Annotation>,
    pub page_count: u32,
    pub exported_at: DateTime<Utc>,
}

/// Annotation counts for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedactionStats {
    pub whiteouts: usize,
    pub text_stamps: usize,
    pub strokes: usize,
    pub total: usize,
    /// Pages carrying at least one annotation
    pub pages_touched: usize,
}

/// A document opened for redaction
#[derive(Debug)]
pub struct RedactSession {
    name: String,
    document: Vec<u8>,
    pages: Vec<PageGeometry>,
    store: EditStore,
}

impl RedactSession {
    /// Parse `bytes` and start an empty session over it
    pub fn open(name: impl Into<String>, bytes: Vec<u8>, options: StoreOptions) -> Result<Self> {
        let name = name.into();
        let doc = Document::load_mem(&bytes)
            .map_err(|e| RedactError::ParseError(format!("{}: {}", name, e)))?;
        let pages = PageGeometry::all_from_document(&doc)?;
        if pages.is_empty() {
            return Err(RedactError::ParseError(format!("{}: document has no pages", name)));
        }

        let store = EditStore::with_options(pages.len() as u32, options);
        tracing::info!("Opened {} ({} pages)", name, pages.len());
        Ok(Self {
            name,
            document: bytes,
            pages,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// The document as it was opened, without any annotations
    pub fn document_bytes(&self) -> &[u8] {
        &self.document
    }

    pub fn page_geometry(&self, page: u32) -> Result<&PageGeometry> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .ok_or_else(|| RedactError::InvalidPage {
                page,
                page_count: self.page_count(),
            })
    }

    pub fn store(&self) -> &EditStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditStore {
        &mut self.store
    }

    /// How `page` is mapped at render scale `scale`
    pub fn viewport(&self, page: u32, scale: f64) -> Result<Viewport> {
        Viewport::new(scale, self.page_geometry(page)?.height)
    }

    /// Add a whiteout from a rectangle dragged on the rendered page
    pub fn add_whiteout_from_screen(
        &mut self,
        page: u32,
        rect: ScreenRect,
        scale: f64,
    ) -> Result<AnnotationId> {
        let rect = self.viewport(page, scale)?.rect_to_document(rect);
        self.store.add_annotation(Annotation::whiteout(page, rect))
    }

    /// Add a text stamp whose top-left corner is at the clicked point
    pub fn add_text_from_screen(
        &mut self,
        page: u32,
        at: ScreenPoint,
        scale: f64,
        text: &str,
        style: &TextStyle,
    ) -> Result<AnnotationId> {
        let top_left = self.viewport(page, scale)?.to_document(at);
        // stored position is the baseline
        let stamp = Annotation::text_stamp(
            page,
            top_left.x,
            top_left.y - style.font_size,
            text,
            style.font_size,
            style.color.clone(),
        );
        self.store.add_annotation(stamp)
    }

    /// Add a freehand stroke from the pointer path on the rendered page
    pub fn add_stroke_from_screen(
        &mut self,
        page: u32,
        path: &[ScreenPoint],
        scale: f64,
        style: &StrokeStyle,
    ) -> Result<AnnotationId> {
        let viewport = self.viewport(page, scale)?;
        let points = path.iter().map(|p| viewport.to_document(*p)).collect();
        let stroke = Annotation::freehand_stroke(
            page,
            points,
            style.color.clone(),
            style.width,
            style.opacity,
        );
        self.store.add_annotation(stroke)
    }

    /// Move an annotation so the top-left corner of its box lands on `to`
    pub fn move_from_screen(&mut self, id: &str, to: ScreenPoint, scale: f64) -> Result<()> {
        let annotation = self
            .store
            .get(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::from(id)))?;
        let bounds = annotation.bounds();
        let anchor = annotation.position();

        let top_left = self.viewport(annotation.page(), scale)?.to_document(to);
        let new_bottom = top_left.y - bounds.height;
        self.store.move_annotation(
            id,
            top_left.x + (anchor.x - bounds.x),
            new_bottom + (anchor.y - bounds.y),
        )
    }

    /// Where an annotation's box sits on the page rendered at `scale`
    pub fn screen_rect(&self, id: &str, scale: f64) -> Result<ScreenRect> {
        let annotation = self
            .store
            .get(id)
            .ok_or_else(|| RedactError::NotFound(AnnotationId::from(id)))?;
        Ok(self
            .viewport(annotation.page(), scale)?
            .rect_to_screen(annotation.bounds()))
    }

    /// Burn the current annotations into a copy of the document
    pub fn export(&self) -> Result<Vec<u8>> {
        self.export_with(&LopdfBridge)
    }

    pub fn export_with(&self, bridge: &impl CommitBridge) -> Result<Vec<u8>> {
        let pages = pages_of(&self.store);
        let output = bridge.commit(&self.document, &pages)?;
        tracing::info!(
            "Exported {} with {} annotations on {} pages",
            self.name,
            self.store.len(),
            pages.len()
        );
        Ok(output)
    }

    /// Serialize the current annotations for later [`import_json`](Self::import_json)
    pub fn export_json(&self) -> Result<String> {
        let data = RedactionData {
            annotations: self.store.annotations().cloned().collect(),
            page_count: self.page_count(),
            exported_at: Utc::now(),
        };
        serde_json::to_string_pretty(&data)
            .map_err(|e| RedactError::SerializationError(e.to_string()))
    }

    /// Replace the session's annotations with saved data.
    ///
    /// Loading is not an edit: history starts over. Every annotation must
    /// fit this document, otherwise nothing changes.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let data: RedactionData = serde_json::from_str(json)
            .map_err(|e| RedactError::SerializationError(e.to_string()))?;
        if data.page_count != self.page_count() {
            tracing::warn!(
                "Redaction data was saved for {} pages, {} has {}",
                data.page_count,
                self.name,
                self.page_count()
            );
        }
        let count = self.store.reload(data.annotations)?;
        tracing::info!("Imported {} annotations into {}", count, self.name);
        Ok(count)
    }

    pub fn stats(&self) -> RedactionStats {
        RedactionStats {
            whiteouts: self.store.count_of(AnnotationKind::Whiteout),
            text_stamps: self.store.count_of(AnnotationKind::TextStamp),
            strokes: self.store.count_of(AnnotationKind::FreehandStroke),
            total: self.store.len(),
            pages_touched: self.store.pages_with_annotations().len(),
        }
    }
}

//! Redaction editor session for the browser
//!
//! Coordinates passed in from JavaScript are canvas pixels of the page as
//! currently rendered, together with the render scale used. Annotations are
//! kept in document space, so re-rendering at another zoom only needs
//! `getScreenRect` with the new scale.

use redact_core::{
    ActionKind, ChangeCause, HistoryStatus, RedactError, RedactSession, RedactionStats,
    ScreenPoint, ScreenRect, StoreEvent, StoreOptions, StrokeStyle, TextStyle,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Store events waiting for the JS change callback.
///
/// The callback never runs inside an editor method: the editor is still
/// borrowed there and any call back into it would throw. Events are queued
/// and delivered from a microtask once the method has returned.
#[derive(Default)]
struct ChangeQueue {
    callback: RefCell<Option<js_sys::Function>>,
    pending: RefCell<Vec<StoreEvent>>,
}

impl ChangeQueue {
    fn push(self: &Rc<Self>, event: &StoreEvent) {
        if self.callback.borrow().is_none() {
            return;
        }
        if self.enqueue(event) {
            self.schedule_flush();
        }
    }

    /// Queue `event`; true when it is the first one since the last flush
    fn enqueue(&self, event: &StoreEvent) -> bool {
        let mut pending = self.pending.borrow_mut();
        pending.push(event.clone());
        pending.len() == 1
    }

    fn take_pending(&self) -> Vec<StoreEvent> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    fn schedule_flush(self: &Rc<Self>) {
        let queue = Rc::clone(self);
        let flush = Closure::once(Box::new(move |_: JsValue| {
            let events = queue.take_pending();
            let callback = queue.callback.borrow().clone();
            if let Some(callback) = callback {
                for event in &events {
                    notify_js(&callback, event);
                }
            }
        }) as Box<dyn FnOnce(JsValue)>);
        let _ = js_sys::Promise::resolve(&JsValue::UNDEFINED).then(&flush);
        flush.forget();
    }
}

/// Browser-facing editor over one PDF document
#[wasm_bindgen]
pub struct RedactEditor {
    session: RedactSession,
    text_style: TextStyle,
    stroke_style: StrokeStyle,
    changes: Rc<ChangeQueue>,
}

#[wasm_bindgen]
impl RedactEditor {
    /// Open a document for redaction.
    /// `history_limit` caps the undo list; omit it to keep every step.
    #[wasm_bindgen(constructor)]
    pub fn new(
        name: &str,
        bytes: &[u8],
        history_limit: Option<u32>,
    ) -> Result<RedactEditor, JsValue> {
        Self::open_internal(name, bytes, history_limit.map(|n| n as usize))
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.session.page_count()
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> String {
        self.session.name().to_string()
    }

    /// Get document bytes for PDF.js rendering
    #[wasm_bindgen(js_name = getDocumentBytes)]
    pub fn get_document_bytes(&self) -> js_sys::Uint8Array {
        let bytes = self.session.document_bytes();
        let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
        array.copy_from(bytes);
        array
    }

    /// Page size in points: `{ page_num, media_box, width, height, rotation }`
    #[wasm_bindgen(js_name = getPageGeometry)]
    pub fn get_page_geometry(&self, page: u32) -> Result<JsValue, JsValue> {
        let geometry = self
            .session
            .page_geometry(page)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(geometry)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Set a change callback function
    /// Callback signature: (cause: string, pages: number[]) => void
    /// `cause` is e.g. "edit:add", "undo:clear", "redo:move" or "reload".
    /// Called from a microtask after the editing call returns, so the
    /// callback may read the editor again.
    #[wasm_bindgen(js_name = setChangeCallback)]
    pub fn set_change_callback(&mut self, callback: js_sys::Function) {
        *self.changes.callback.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = clearChangeCallback)]
    pub fn clear_change_callback(&mut self) {
        *self.changes.callback.borrow_mut() = None;
        self.changes.take_pending();
    }

    /// Style used for text added after this call
    #[wasm_bindgen(js_name = setTextStyle)]
    pub fn set_text_style(&mut self, font_size: f64, color: &str) {
        self.text_style = TextStyle {
            font_size,
            color: color.to_string(),
        };
    }

    /// Pen used for strokes added after this call
    #[wasm_bindgen(js_name = setStrokeStyle)]
    pub fn set_stroke_style(&mut self, color: &str, width: f64, opacity: f64) {
        self.stroke_style = StrokeStyle {
            color: color.to_string(),
            width,
            opacity,
        };
    }

    /// Add a whiteout box dragged from (x, y) with the given size.
    /// Returns the new annotation id.
    #[wasm_bindgen(js_name = addWhiteout)]
    pub fn add_whiteout(
        &mut self,
        page: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<String, JsValue> {
        let rect = ScreenRect {
            x,
            y,
            width,
            height,
        };
        self.add_whiteout_internal(page, rect, scale)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Add a text stamp whose top-left corner is at (x, y)
    #[wasm_bindgen(js_name = addText)]
    pub fn add_text(
        &mut self,
        page: u32,
        x: f64,
        y: f64,
        text: &str,
        scale: f64,
    ) -> Result<String, JsValue> {
        self.add_text_internal(page, ScreenPoint::new(x, y), text, scale)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Add a freehand stroke. `points` is a flat `[x0, y0, x1, y1, ...]` list.
    #[wasm_bindgen(js_name = addStroke)]
    pub fn add_stroke(&mut self, page: u32, points: &[f64], scale: f64) -> Result<String, JsValue> {
        self.add_stroke_internal(page, points, scale)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Move an annotation so its top-left corner is at (x, y)
    #[wasm_bindgen(js_name = moveAnnotation)]
    pub fn move_annotation(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        scale: f64,
    ) -> Result<(), JsValue> {
        self.session
            .move_from_screen(id, ScreenPoint::new(x, y), scale)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Resize a whiteout to a new size in canvas pixels, keeping its top-left corner
    #[wasm_bindgen(js_name = resizeWhiteout)]
    pub fn resize_whiteout(
        &mut self,
        id: &str,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<(), JsValue> {
        self.resize_whiteout_internal(id, width, height, scale)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = editText)]
    pub fn edit_text(&mut self, id: &str, text: &str) -> Result<(), JsValue> {
        self.session
            .store_mut()
            .edit_text(id, text)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = deleteAnnotation)]
    pub fn delete_annotation(&mut self, id: &str) -> Result<(), JsValue> {
        self.session
            .store_mut()
            .delete_annotation(id)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Remove every annotation on one page. Returns how many were removed.
    #[wasm_bindgen(js_name = clearPage)]
    pub fn clear_page(&mut self, page: u32) -> Result<usize, JsValue> {
        self.session
            .store_mut()
            .clear_page(page)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) -> usize {
        self.session.store_mut().clear_all()
    }

    /// Undo the last edit. Returns the undone action kind, or undefined.
    pub fn undo(&mut self) -> Option<String> {
        match self.session.store_mut().undo() {
            HistoryStatus::Undone(kind) => Some(kind.as_str().to_string()),
            _ => None,
        }
    }

    /// Redo the last undone edit. Returns the redone action kind, or undefined.
    pub fn redo(&mut self) -> Option<String> {
        match self.session.store_mut().redo() {
            HistoryStatus::Redone(kind) => Some(kind.as_str().to_string()),
            _ => None,
        }
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.store().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.store().can_redo()
    }

    #[wasm_bindgen(js_name = hasChanges)]
    pub fn has_changes(&self) -> bool {
        !self.session.store().is_empty()
    }

    /// Annotations on a page in z-order, as JSON
    #[wasm_bindgen(js_name = getPageAnnotationsJson)]
    pub fn get_page_annotations_json(&self, page: u32) -> Result<String, JsValue> {
        self.page_annotations_json_internal(page)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Where an annotation sits on a page rendered at `scale`:
    /// `{ x, y, width, height }` in canvas pixels
    #[wasm_bindgen(js_name = getScreenRect)]
    pub fn get_screen_rect(&self, id: &str, scale: f64) -> Result<JsValue, JsValue> {
        let rect = self
            .session
            .screen_rect(id, scale)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&rect)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.stats_internal())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Burn all annotations into the document and return the new PDF
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self
            .export_pdf_internal()
            .map_err(|e| JsValue::from_str(&e))?;
        let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
        array.copy_from(&bytes);
        Ok(array)
    }

    /// Save the annotations as JSON for a later `importJson`
    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.session
            .export_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Replace all annotations with saved ones. Clears the undo history.
    #[wasm_bindgen(js_name = importJson)]
    pub fn import_json(&mut self, json: &str) -> Result<usize, JsValue> {
        self.session
            .import_json(json)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl RedactEditor {
    /// Internal constructor (testable without JsValue)
    fn open_internal(
        name: &str,
        bytes: &[u8],
        history_limit: Option<usize>,
    ) -> Result<Self, String> {
        let options = StoreOptions { history_limit };
        let mut session =
            RedactSession::open(name, bytes.to_vec(), options).map_err(|e| e.to_string())?;

        let changes = Rc::new(ChangeQueue::default());
        let queue = Rc::clone(&changes);
        session.store_mut().subscribe(move |event| queue.push(event));

        Ok(Self {
            session,
            text_style: TextStyle::default(),
            stroke_style: StrokeStyle::default(),
            changes,
        })
    }

    fn add_whiteout_internal(
        &mut self,
        page: u32,
        rect: ScreenRect,
        scale: f64,
    ) -> Result<String, String> {
        self.session
            .add_whiteout_from_screen(page, rect, scale)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    fn add_text_internal(
        &mut self,
        page: u32,
        at: ScreenPoint,
        text: &str,
        scale: f64,
    ) -> Result<String, String> {
        self.session
            .add_text_from_screen(page, at, scale, text, &self.text_style)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    fn add_stroke_internal(
        &mut self,
        page: u32,
        flat: &[f64],
        scale: f64,
    ) -> Result<String, String> {
        let path = parse_path(flat)?;
        self.session
            .add_stroke_from_screen(page, &path, scale, &self.stroke_style)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    fn resize_whiteout_internal(
        &mut self,
        id: &str,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<(), String> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RedactError::InvalidScale(scale).to_string());
        }
        self.session
            .store_mut()
            .resize_annotation(id, width / scale, height / scale)
            .map_err(|e| e.to_string())
    }

    fn page_annotations_json_internal(&self, page: u32) -> Result<String, String> {
        self.session
            .page_geometry(page)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(self.session.store().list_for_page(page))
            .map_err(|e| format!("Serialization error: {}", e))
    }

    fn export_pdf_internal(&self) -> Result<Vec<u8>, String> {
        self.session.export().map_err(|e| e.to_string())
    }

    fn stats_internal(&self) -> RedactionStats {
        self.session.stats()
    }
}

/// Split a flat `[x0, y0, x1, y1, ...]` list into points
fn parse_path(flat: &[f64]) -> Result<Vec<ScreenPoint>, String> {
    if flat.is_empty() {
        return Err("A stroke needs at least one point".to_string());
    }
    if flat.len() % 2 != 0 {
        return Err(format!(
            "Stroke points must come in x, y pairs (got {} numbers)",
            flat.len()
        ));
    }
    Ok(flat
        .chunks_exact(2)
        .map(|pair| ScreenPoint::new(pair[0], pair[1]))
        .collect())
}

fn cause_label(cause: ChangeCause) -> String {
    let (prefix, kind): (&str, ActionKind) = match cause {
        ChangeCause::Edit(kind) => ("edit", kind),
        ChangeCause::Undo(kind) => ("undo", kind),
        ChangeCause::Redo(kind) => ("redo", kind),
        ChangeCause::Reload => return "reload".to_string(),
    };
    format!("{}:{}", prefix, kind.as_str())
}

fn notify_js(callback: &js_sys::Function, event: &StoreEvent) {
    let pages = js_sys::Array::new();
    for page in &event.pages {
        pages.push(&JsValue::from(*page));
    }
    let cause = JsValue::from_str(&cause_label(event.cause));
    // a throwing callback must not abort the edit that triggered it
    let _ = callback.call2(&JsValue::NULL, &cause, &pages);
}

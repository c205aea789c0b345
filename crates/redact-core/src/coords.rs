//! Coordinate mapping between screen space and document space
//!
//! Screen (canvas) space is what the rendered page shows: pixels at the
//! current render scale, origin top-left, Y growing downward.
//! Document space is PDF user space: points, origin bottom-left, Y growing
//! upward, independent of zoom. Annotations are always stored in document
//! space so they survive zoom changes and page re-renders.

use crate::error::{RedactError, Result};
use serde::{Deserialize, Serialize};

/// A point in document space (PDF points, origin bottom-left)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

/// A point in screen space (pixels at a render scale, origin top-left)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle in screen space. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle in document space. `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn check_scale(render_scale: f64) -> Result<()> {
    if render_scale.is_finite() && render_scale > 0.0 {
        Ok(())
    } else {
        Err(RedactError::InvalidScale(render_scale))
    }
}

/// Convert a screen point to document space.
///
/// `page_height` is the page height in document units (the page height at
/// scale 1).
pub fn to_document_space(
    screen: ScreenPoint,
    render_scale: f64,
    page_height: f64,
) -> Result<DocPoint> {
    Ok(Viewport::new(render_scale, page_height)?.to_document(screen))
}

/// Convert a document point to screen space. Inverse of [`to_document_space`].
pub fn to_screen_space(doc: DocPoint, render_scale: f64, page_height: f64) -> Result<ScreenPoint> {
    Ok(Viewport::new(render_scale, page_height)?.to_screen(doc))
}

/// Convert a screen rectangle to document space.
///
/// The screen rectangle's top edge becomes the document rectangle's top
/// edge, so the stored `y` is the bottom: `page_height - (y + height) / scale`.
/// Negative sizes (a drag that went up or left) are normalised first.
pub fn rect_to_document_space(
    rect: ScreenRect,
    render_scale: f64,
    page_height: f64,
) -> Result<PdfRect> {
    Ok(Viewport::new(render_scale, page_height)?.rect_to_document(rect))
}

/// Convert a document rectangle to screen space. Inverse of [`rect_to_document_space`].
pub fn rect_to_screen_space(
    rect: PdfRect,
    render_scale: f64,
    page_height: f64,
) -> Result<ScreenRect> {
    Ok(Viewport::new(render_scale, page_height)?.rect_to_screen(rect))
}

/// A page as it is currently rendered: the render scale plus the page
/// height in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    page_height: f64,
}

impl Viewport {
    pub fn new(scale: f64, page_height: f64) -> Result<Self> {
        check_scale(scale)?;
        Ok(Self { scale, page_height })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn to_document(&self, screen: ScreenPoint) -> DocPoint {
        DocPoint {
            x: screen.x / self.scale,
            y: self.page_height - screen.y / self.scale,
        }
    }

    pub fn to_screen(&self, doc: DocPoint) -> ScreenPoint {
        ScreenPoint {
            x: doc.x * self.scale,
            y: (self.page_height - doc.y) * self.scale,
        }
    }

    pub fn rect_to_document(&self, rect: ScreenRect) -> PdfRect {
        let left = rect.x.min(rect.x + rect.width);
        let top = rect.y.min(rect.y + rect.height);
        let width = rect.width.abs();
        let height = rect.height.abs();
        PdfRect {
            x: left / self.scale,
            y: self.page_height - (top + height) / self.scale,
            width: width / self.scale,
            height: height / self.scale,
        }
    }

    pub fn rect_to_screen(&self, rect: PdfRect) -> ScreenRect {
        ScreenRect {
            x: rect.x * self.scale,
            y: (self.page_height - rect.y - rect.height) * self.scale,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }
}

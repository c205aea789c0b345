//! Annotation data model
//!
//! This module provides the annotation types a user places on a page:
//! whiteout boxes, text stamps, and freehand strokes. All coordinates are
//! document-space (see [`crate::coords`]).

use crate::coords::{DocPoint, PdfRect};
use crate::error::{RedactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an annotation, unique for the lifetime of a session.
///
/// An empty id means "not yet assigned"; the store assigns one on add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unassigned() -> Self {
        Self(String::new())
    }

    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AnnotationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Whiteout,
    TextStamp,
    FreehandStroke,
}

impl AnnotationKind {
    /// Prefix used for generated ids ("w1", "t2", "s3")
    pub fn id_prefix(self) -> &'static str {
        match self {
            AnnotationKind::Whiteout => "w",
            AnnotationKind::TextStamp => "t",
            AnnotationKind::FreehandStroke => "s",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Annotation {
    /// Opaque white box covering content
    Whiteout {
        #[serde(default)]
        id: AnnotationId,
        page: u32,
        rect: PdfRect,
    },
    /// Text burned onto the page. `(x, y)` is the baseline origin.
    TextStamp {
        #[serde(default)]
        id: AnnotationId,
        page: u32,
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        color: String,
    },
    /// Pen stroke through an ordered list of points
    FreehandStroke {
        #[serde(default)]
        id: AnnotationId,
        page: u32,
        points: Vec<DocPoint>,
        color: String,
        width: f64,
        opacity: f64,
    },
}

impl Annotation {
    pub fn whiteout(page: u32, rect: PdfRect) -> Self {
        Annotation::Whiteout {
            id: AnnotationId::unassigned(),
            page,
            rect,
        }
    }

    pub fn text_stamp(
        page: u32,
        x: f64,
        y: f64,
        text: impl Into<String>,
        font_size: f64,
        color: impl Into<String>,
    ) -> Self {
        Annotation::TextStamp {
            id: AnnotationId::unassigned(),
            page,
            x,
            y,
            text: text.into(),
            font_size,
            color: color.into(),
        }
    }

    pub fn freehand_stroke(
        page: u32,
        points: Vec<DocPoint>,
        color: impl Into<String>,
        width: f64,
        opacity: f64,
    ) -> Self {
        Annotation::FreehandStroke {
            id: AnnotationId::unassigned(),
            page,
            points,
            color: color.into(),
            width,
            opacity,
        }
    }

    /// Builder-style id override, for callers that bring their own ids
    pub fn with_id(mut self, id: impl Into<AnnotationId>) -> Self {
        self.set_id(id.into());
        self
    }

    pub fn id(&self) -> &AnnotationId {
        match self {
            Annotation::Whiteout { id, .. }
            | Annotation::TextStamp { id, .. }
            | Annotation::FreehandStroke { id, .. } => id,
        }
    }

    pub(crate) fn set_id(&mut self, new_id: AnnotationId) {
        match self {
            Annotation::Whiteout { id, .. }
            | Annotation::TextStamp { id, .. }
            | Annotation::FreehandStroke { id, .. } => *id = new_id,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Annotation::Whiteout { page, .. }
            | Annotation::TextStamp { page, .. }
            | Annotation::FreehandStroke { page, .. } => *page,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Whiteout { .. } => AnnotationKind::Whiteout,
            Annotation::TextStamp { .. } => AnnotationKind::TextStamp,
            Annotation::FreehandStroke { .. } => AnnotationKind::FreehandStroke,
        }
    }

    /// Anchor position used by moves: the rect origin for whiteouts, the
    /// baseline origin for text, and the bounding-box origin for strokes.
    pub fn position(&self) -> DocPoint {
        match self {
            Annotation::Whiteout { rect, .. } => DocPoint::new(rect.x, rect.y),
            Annotation::TextStamp { x, y, .. } => DocPoint::new(*x, *y),
            Annotation::FreehandStroke { points, .. } => {
                let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                DocPoint::new(min_x, min_y)
            }
        }
    }

    /// Document-space box covering the annotation, used for hit areas and
    /// screen overlays. Text width is estimated at half an em per character.
    pub fn bounds(&self) -> PdfRect {
        match self {
            Annotation::Whiteout { rect, .. } => *rect,
            Annotation::TextStamp {
                x,
                y,
                text,
                font_size,
                ..
            } => PdfRect {
                x: *x,
                y: *y,
                width: text.chars().count() as f64 * font_size * 0.5,
                height: *font_size,
            },
            Annotation::FreehandStroke { points, .. } => {
                let origin = self.position();
                let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                PdfRect {
                    x: origin.x,
                    y: origin.y,
                    width: (max_x - origin.x).max(0.0),
                    height: (max_y - origin.y).max(0.0),
                }
            }
        }
    }

    /// Move the anchor to `(new_x, new_y)`. Strokes are translated as a whole.
    pub(crate) fn move_to(&mut self, new_x: f64, new_y: f64) {
        let anchor = self.position();
        match self {
            Annotation::Whiteout { rect, .. } => {
                rect.x = new_x;
                rect.y = new_y;
            }
            Annotation::TextStamp { x, y, .. } => {
                *x = new_x;
                *y = new_y;
            }
            Annotation::FreehandStroke { points, .. } => {
                let dx = new_x - anchor.x;
                let dy = new_y - anchor.y;
                for point in points.iter_mut() {
                    point.x += dx;
                    point.y += dy;
                }
            }
        }
    }

    /// Check the shape invariants that do not depend on the document
    pub fn validate(&self) -> Result<()> {
        if self.page() == 0 {
            return Err(RedactError::InvalidAnnotation(
                "page numbers start at 1".into(),
            ));
        }

        match self {
            Annotation::Whiteout { rect, .. } => {
                require_finite(&[rect.x, rect.y, rect.width, rect.height])?;
                if rect.width <= 0.0 || rect.height <= 0.0 {
                    return Err(RedactError::InvalidAnnotation(format!(
                        "whiteout must have a positive size, got {}x{}",
                        rect.width, rect.height
                    )));
                }
            }
            Annotation::TextStamp {
                x,
                y,
                text,
                font_size,
                ..
            } => {
                require_finite(&[*x, *y, *font_size])?;
                if text.trim().is_empty() {
                    return Err(RedactError::InvalidAnnotation(
                        "text stamp must not be empty".into(),
                    ));
                }
                if *font_size <= 0.0 {
                    return Err(RedactError::InvalidAnnotation(format!(
                        "font size must be positive, got {}",
                        font_size
                    )));
                }
            }
            Annotation::FreehandStroke {
                points,
                width,
                opacity,
                ..
            } => {
                if points.is_empty() {
                    return Err(RedactError::InvalidAnnotation(
                        "stroke needs at least one point".into(),
                    ));
                }
                for point in points {
                    require_finite(&[point.x, point.y])?;
                }
                require_finite(&[*width, *opacity])?;
                if *width <= 0.0 {
                    return Err(RedactError::InvalidAnnotation(format!(
                        "stroke width must be positive, got {}",
                        width
                    )));
                }
                if !(0.0..=1.0).contains(opacity) {
                    return Err(RedactError::InvalidAnnotation(format!(
                        "opacity must be within [0, 1], got {}",
                        opacity
                    )));
                }
            }
        }
        Ok(())
    }
}

fn require_finite(values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(RedactError::InvalidAnnotation(
            "coordinates and sizes must be finite numbers".into(),
        ))
    }
}

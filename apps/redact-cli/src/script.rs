//! Edit scripts
//!
//! A script is a JSON document listing editor actions in order, the same
//! actions a user performs in the browser editor:
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "add_whiteout", "page": 1, "x": 150, "y": 300, "width": 150, "height": 45 },
//!     { "op": "add_text", "page": 1, "x": 150, "y": 300, "text": "REDACTED" },
//!     { "op": "delete", "id": "t2" },
//!     { "op": "undo" }
//!   ]
//! }
//! ```
//!
//! Coordinates are canvas pixels at the configured render scale unless a
//! step sets `"space": "document"`, in which case they are PDF points with
//! the origin at the bottom-left of the page.

use crate::config::Config;
use anyhow::Context;
use redact_core::{
    Annotation, DocPoint, HistoryStatus, PdfRect, RedactSession, ScreenPoint, ScreenRect,
    StrokeStyle, TextStyle,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::from_str(&content)
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("Failed to parse edit script")
    }
}

/// Coordinate system of a step's positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    #[default]
    Screen,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Box at (x, y): top-left in screen space, bottom-left in document space
    AddWhiteout {
        page: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        space: Space,
    },
    /// Text at (x, y): top-left in screen space, baseline start in document space
    AddText {
        page: u32,
        x: f64,
        y: f64,
        text: String,
        #[serde(default)]
        font_size: Option<f64>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        space: Space,
    },
    AddStroke {
        page: u32,
        points: Vec<[f64; 2]>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        opacity: Option<f64>,
        #[serde(default)]
        space: Space,
    },
    Delete {
        id: String,
    },
    Move {
        id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        space: Space,
    },
    /// New whiteout size in points
    Resize {
        id: String,
        width: f64,
        height: f64,
    },
    EditText {
        id: String,
        text: String,
    },
    ClearPage {
        page: u32,
    },
    ClearAll,
    Undo,
    Redo,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AddWhiteout { .. } => "add_whiteout",
            Step::AddText { .. } => "add_text",
            Step::AddStroke { .. } => "add_stroke",
            Step::Delete { .. } => "delete",
            Step::Move { .. } => "move",
            Step::Resize { .. } => "resize",
            Step::EditText { .. } => "edit_text",
            Step::ClearPage { .. } => "clear_page",
            Step::ClearAll => "clear_all",
            Step::Undo => "undo",
            Step::Redo => "redo",
        }
    }
}

/// What running a script did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    /// Ids of annotations created, in step order
    pub created: Vec<String>,
    pub steps_run: usize,
    /// Undo or redo steps that found nothing to do
    pub no_ops: usize,
}

/// Run every step against the session, stopping at the first failure
pub fn run(
    session: &mut RedactSession,
    script: &Script,
    config: &Config,
) -> anyhow::Result<ScriptReport> {
    let mut report = ScriptReport::default();
    for (index, step) in script.steps.iter().enumerate() {
        apply_step(session, step, config, &mut report)
            .with_context(|| format!("Step {} ({}) failed", index + 1, step.name()))?;
        report.steps_run += 1;
    }
    Ok(report)
}

fn apply_step(
    session: &mut RedactSession,
    step: &Step,
    config: &Config,
    report: &mut ScriptReport,
) -> anyhow::Result<()> {
    let scale = config.render.scale;
    match step {
        Step::AddWhiteout {
            page,
            x,
            y,
            width,
            height,
            space,
        } => {
            let id = match space {
                Space::Screen => {
                    let rect = ScreenRect {
                        x: *x,
                        y: *y,
                        width: *width,
                        height: *height,
                    };
                    session.add_whiteout_from_screen(*page, rect, scale)?
                }
                Space::Document => {
                    let rect = PdfRect {
                        x: *x,
                        y: *y,
                        width: *width,
                        height: *height,
                    };
                    session
                        .store_mut()
                        .add_annotation(Annotation::whiteout(*page, rect))?
                }
            };
            tracing::debug!("Added whiteout {} on page {}", id, page);
            report.created.push(id.to_string());
        }
        Step::AddText {
            page,
            x,
            y,
            text,
            font_size,
            color,
            space,
        } => {
            let style = TextStyle {
                font_size: font_size.unwrap_or(config.text.font_size),
                color: color.clone().unwrap_or_else(|| config.text.color.clone()),
            };
            let id = match space {
                Space::Screen => {
                    let at = ScreenPoint::new(*x, *y);
                    session.add_text_from_screen(*page, at, scale, text, &style)?
                }
                Space::Document => session.store_mut().add_annotation(Annotation::text_stamp(
                    *page,
                    *x,
                    *y,
                    text.as_str(),
                    style.font_size,
                    style.color,
                ))?,
            };
            tracing::debug!("Added text {} on page {}", id, page);
            report.created.push(id.to_string());
        }
        Step::AddStroke {
            page,
            points,
            color,
            width,
            opacity,
            space,
        } => {
            let style = StrokeStyle {
                color: color.clone().unwrap_or_else(|| config.stroke.color.clone()),
                width: width.unwrap_or(config.stroke.width),
                opacity: opacity.unwrap_or(config.stroke.opacity),
            };
            let id = match space {
                Space::Screen => {
                    let path: Vec<ScreenPoint> =
                        points.iter().map(|[x, y]| ScreenPoint::new(*x, *y)).collect();
                    session.add_stroke_from_screen(*page, &path, scale, &style)?
                }
                Space::Document => {
                    let path = points.iter().map(|[x, y]| DocPoint::new(*x, *y)).collect();
                    session.store_mut().add_annotation(Annotation::freehand_stroke(
                        *page,
                        path,
                        style.color,
                        style.width,
                        style.opacity,
                    ))?
                }
            };
            tracing::debug!("Added stroke {} on page {}", id, page);
            report.created.push(id.to_string());
        }
        Step::Delete { id } => session.store_mut().delete_annotation(id)?,
        Step::Move { id, x, y, space } => match space {
            Space::Screen => session.move_from_screen(id, ScreenPoint::new(*x, *y), scale)?,
            Space::Document => session.store_mut().move_annotation(id, *x, *y)?,
        },
        Step::Resize { id, width, height } => {
            session.store_mut().resize_annotation(id, *width, *height)?
        }
        Step::EditText { id, text } => session.store_mut().edit_text(id, text)?,
        Step::ClearPage { page } => {
            let removed = session.store_mut().clear_page(*page)?;
            if removed == 0 {
                tracing::warn!("No annotations to clear on page {}", page);
            }
        }
        Step::ClearAll => {
            if session.store_mut().clear_all() == 0 {
                tracing::warn!("No annotations to clear");
            }
        }
        Step::Undo => match session.store_mut().undo() {
            HistoryStatus::NothingToUndo => {
                tracing::warn!("Nothing to undo");
                report.no_ops += 1;
            }
            status => tracing::debug!("{:?}", status),
        },
        Step::Redo => match session.store_mut().redo() {
            HistoryStatus::NothingToRedo => {
                tracing::warn!("Nothing to redo");
                report.no_ops += 1;
            }
            status => tracing::debug!("{:?}", status),
        },
    }
    Ok(())
}

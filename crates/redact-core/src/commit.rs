//! Burn annotations into PDF documents
//!
//! The commit bridge turns the store's document-space annotations into page
//! content. [`LopdfBridge`] flattens them into each page's content stream,
//! so a whiteout really hides what is underneath instead of floating above
//! it as an editable annotation.

use crate::annotation::Annotation;
use crate::error::{RedactError, Result};
use crate::page_info::{inherited, PageGeometry};
use crate::store::EditStore;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Resource name of the font used for text stamps
const STAMP_FONT: &str = "RdHelv";

/// Annotations of one page, bottom-most first
#[derive(Debug, Clone, Copy)]
pub struct PageAnnotations<'a> {
    pub page: u32,
    pub annotations: &'a [Annotation],
}

/// Group the store's contents by page, in page order
pub fn pages_of(store: &EditStore) -> Vec<PageAnnotations<'_>> {
    store
        .pages_with_annotations()
        .into_iter()
        .map(|page| PageAnnotations {
            page,
            annotations: store.list_for_page(page),
        })
        .collect()
}

/// Writes annotations into a copy of a document.
///
/// Implementations take document-space coordinates (points, origin at the
/// page's lower-left) and must map them into whatever coordinate system the
/// underlying writer uses. They never see or modify the edit store.
pub trait CommitBridge {
    fn commit(&self, document: &[u8], pages: &[PageAnnotations<'_>]) -> Result<Vec<u8>>;
}

/// Commit bridge backed by lopdf
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBridge;

impl CommitBridge for LopdfBridge {
    fn commit(&self, document: &[u8], pages: &[PageAnnotations<'_>]) -> Result<Vec<u8>> {
        if pages.iter().all(|group| group.annotations.is_empty()) {
            // No changes, return original
            return Ok(document.to_vec());
        }

        let mut doc = Document::load_mem(document)
            .map_err(|e| RedactError::CommitFailed(format!("cannot read document: {}", e)))?;
        let page_ids = doc.get_pages();

        for group in pages.iter().filter(|g| !g.annotations.is_empty()) {
            let page_id = *page_ids.get(&group.page).ok_or_else(|| {
                RedactError::CommitFailed(format!(
                    "page {} does not exist (document has {} pages)",
                    group.page,
                    page_ids.len()
                ))
            })?;
            let geometry = PageGeometry::from_document(&doc, group.page)
                .map_err(|e| RedactError::CommitFailed(e.to_string()))?;

            burn_page(&mut doc, page_id, &geometry, group.annotations)?;
            tracing::debug!(
                "Burned {} annotations into page {}",
                group.annotations.len(),
                group.page
            );
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| RedactError::CommitFailed(e.to_string()))?;
        Ok(output)
    }
}

/// Parse hex color string (e.g., "#FF0000" or "FF0000") to RGB floats (0-1 range)
pub fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 && hex.is_char_boundary(6) {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0) // Default to black
    }
}

fn burn_page(
    doc: &mut Document,
    page_id: ObjectId,
    geometry: &PageGeometry,
    annotations: &[Annotation],
) -> Result<()> {
    let (ox, oy) = geometry.origin();
    let mut operations = Vec::new();
    let mut font_registered = false;
    let mut opacity_states: Vec<(f64, String)> = Vec::new();

    for annotation in annotations {
        operations.push(Operation::new("q", vec![]));
        match annotation {
            Annotation::Whiteout { rect, .. } => {
                operations.push(Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]));
                operations.push(Operation::new(
                    "re",
                    vec![
                        real(rect.x + ox),
                        real(rect.y + oy),
                        real(rect.width),
                        real(rect.height),
                    ],
                ));
                operations.push(Operation::new("f", vec![]));
            }
            Annotation::TextStamp {
                x,
                y,
                text,
                font_size,
                color,
                ..
            } => {
                if !font_registered {
                    let font_id = doc.add_object(dictionary! {
                        "Type" => "Font",
                        "Subtype" => "Type1",
                        "BaseFont" => "Helvetica",
                        "Encoding" => "WinAnsiEncoding",
                    });
                    add_resource(doc, page_id, "Font", STAMP_FONT, Object::Reference(font_id))?;
                    font_registered = true;
                }
                operations.push(Operation::new("rg", rgb(color)));
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), real(*font_size)],
                ));
                operations.push(Operation::new("Td", vec![real(x + ox), real(y + oy)]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            Annotation::FreehandStroke {
                points,
                color,
                width,
                opacity,
                ..
            } => {
                if *opacity < 1.0 {
                    let name = match opacity_states.iter().find(|(o, _)| o == opacity) {
                        Some((_, name)) => name.clone(),
                        None => {
                            let name = format!("RdGS{}", opacity_states.len());
                            let state_id = doc.add_object(dictionary! {
                                "Type" => "ExtGState",
                                "CA" => real(*opacity),
                                "ca" => real(*opacity),
                            });
                            add_resource(
                                doc,
                                page_id,
                                "ExtGState",
                                &name,
                                Object::Reference(state_id),
                            )?;
                            opacity_states.push((*opacity, name.clone()));
                            name
                        }
                    };
                    operations.push(Operation::new("gs", vec![Object::Name(name.into_bytes())]));
                }

                operations.push(Operation::new("RG", rgb(color)));
                operations.push(Operation::new("w", vec![real(*width)]));
                // Round caps and joins
                operations.push(Operation::new("J", vec![Object::Integer(1)]));
                operations.push(Operation::new("j", vec![Object::Integer(1)]));

                if let Some((first, rest)) = points.split_first() {
                    operations.push(Operation::new(
                        "m",
                        vec![real(first.x + ox), real(first.y + oy)],
                    ));
                    if rest.is_empty() {
                        // A single click draws a dot
                        operations.push(Operation::new(
                            "l",
                            vec![real(first.x + ox), real(first.y + oy)],
                        ));
                    }
                    for point in rest {
                        operations.push(Operation::new(
                            "l",
                            vec![real(point.x + ox), real(point.y + oy)],
                        ));
                    }
                    operations.push(Operation::new("S", vec![]));
                }
            }
        }
        operations.push(Operation::new("Q", vec![]));
    }

    let encoded = Content { operations }
        .encode()
        .map_err(|e| RedactError::CommitFailed(e.to_string()))?;
    append_overlay(doc, page_id, encoded)
}

fn rgb(color: &str) -> Vec<Object> {
    let (r, g, b) = parse_hex_color(color);
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Encode text for a WinAnsi font. Characters outside Latin-1 become '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Append `overlay` after the page's existing content, isolating the
/// existing content's graphics state with q/Q.
fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<()> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| RedactError::CommitFailed(e.to_string()))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(streams)) => streams.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(streams)) => streams.clone(),
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    let mut overlay_bytes = Vec::with_capacity(overlay.len() + 2);
    if !existing.is_empty() {
        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        // the last stream may end without whitespace
        overlay_bytes.extend_from_slice(b"\nQ\n");
    }
    overlay_bytes.extend(overlay);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay_bytes));
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)
        .map_err(|e| RedactError::CommitFailed(e.to_string()))?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// The page's own Resources dictionary, created from the inherited one
/// when the page has none.
fn page_resources_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    enum Location {
        Shared(ObjectId),
        Inline,
        Missing(Dictionary),
    }

    let location = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| RedactError::CommitFailed(e.to_string()))?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Location::Shared(*id),
            Ok(Object::Dictionary(_)) => Location::Inline,
            _ => {
                let from_parent = match inherited(doc, page, b"Resources") {
                    Some(Object::Dictionary(dict)) => dict.clone(),
                    Some(Object::Reference(id)) => doc
                        .get_dictionary(*id)
                        .map(Clone::clone)
                        .unwrap_or_else(|_| Dictionary::new()),
                    _ => Dictionary::new(),
                };
                Location::Missing(from_parent)
            }
        }
    };

    let fail = |e: lopdf::Error| RedactError::CommitFailed(e.to_string());
    match location {
        Location::Shared(id) => doc.get_dictionary_mut(id).map_err(fail),
        Location::Inline => doc
            .get_dictionary_mut(page_id)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(|resources| resources.as_dict_mut())
            .map_err(fail),
        Location::Missing(resources) => {
            let page = doc.get_dictionary_mut(page_id).map_err(fail)?;
            page.set("Resources", Object::Dictionary(resources));
            page.get_mut(b"Resources")
                .and_then(|resources| resources.as_dict_mut())
                .map_err(fail)
        }
    }
}

/// Register `value` under `/category/name` in the page's resources
fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    value: Object,
) -> Result<()> {
    let current = page_resources_mut(doc, page_id)?
        .get(category.as_bytes())
        .ok()
        .cloned();
    let mut entries = match current {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc
            .get_dictionary(id)
            .map(Clone::clone)
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    };
    entries.set(name, value);
    page_resources_mut(doc, page_id)?.set(category, Object::Dictionary(entries));
    Ok(())
}

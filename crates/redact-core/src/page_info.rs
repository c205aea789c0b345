//! Page geometry
//!
//! Reads the page boxes the coordinate mapper needs: the page height at
//! scale 1 and the MediaBox origin the commit bridge offsets by.

use crate::error::{RedactError, Result};
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

/// Upper bound on Parent links followed when resolving inherited keys
const MAX_TREE_DEPTH: usize = 32;

/// Size and placement of a single PDF page
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PageGeometry {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// MediaBox as [llx, lly, urx, ury]
    pub media_box: [f64; 4],
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

impl PageGeometry {
    /// Lower-left corner of the MediaBox, the origin of document space
    pub fn origin(&self) -> (f64, f64) {
        (self.media_box[0], self.media_box[1])
    }

    /// Extract geometry for one page of a loaded document
    pub fn from_document(doc: &Document, page_num: u32) -> Result<Self> {
        let pages = doc.get_pages();
        let page_id = pages
            .get(&page_num)
            .ok_or_else(|| RedactError::ParseError(format!("Page {} not found", page_num)))?;

        let page_dict = doc.get_dictionary(*page_id).map_err(|_| {
            RedactError::ParseError(format!("Page {} is not a dictionary", page_num))
        })?;

        let media_box = match inherited(doc, page_dict, b"MediaBox") {
            Some(obj) => parse_box(doc, obj)?,
            // US Letter when the document omits it
            None => [0.0, 0.0, 612.0, 792.0],
        };
        let rotation = inherited(doc, page_dict, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .map(|angle| normalize_rotation(angle as i32))
            .unwrap_or(0);

        Ok(Self {
            page_num,
            media_box,
            width: (media_box[2] - media_box[0]).abs(),
            height: (media_box[3] - media_box[1]).abs(),
            rotation,
        })
    }

    /// Geometry for every page, in page order
    pub fn all_from_document(doc: &Document) -> Result<Vec<Self>> {
        let page_count = doc.get_pages().len() as u32;
        (1..=page_count)
            .map(|page_num| Self::from_document(doc, page_num))
            .collect()
    }
}

/// Look up a key on the page, falling back to its Parent chain
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

fn parse_box(doc: &Document, obj: &Object) -> Result<[f64; 4]> {
    let obj = match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| RedactError::ParseError(e.to_string()))?,
        other => other,
    };
    let array = obj
        .as_array()
        .map_err(|_| RedactError::ParseError("MediaBox is not an array".into()))?;
    if array.len() != 4 {
        return Err(RedactError::ParseError(
            "MediaBox must have 4 elements".into(),
        ));
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = number(obj).ok_or_else(|| {
            RedactError::ParseError(format!("MediaBox element {} is not a number", i))
        })?;
    }
    Ok(result)
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

/// Normalize rotation to 0, 90, 180, or 270. Angles that are not a
/// multiple of 90 are invalid and read as 0.
fn normalize_rotation(angle: i32) -> i32 {
    if angle % 90 != 0 {
        return 0;
    }
    angle.rem_euclid(360)
}

use crate::annotation::AnnotationId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedactError {
    #[error("Invalid render scale: {0} (must be a positive, finite number)")]
    InvalidScale(f64),

    #[error("Annotation not found: {0}")]
    NotFound(AnnotationId),

    #[error("Page {page} does not exist (document has {page_count} pages)")]
    InvalidPage { page: u32, page_count: u32 },

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Annotation id already used in this session: {0}")]
    DuplicateId(AnnotationId),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, RedactError>;

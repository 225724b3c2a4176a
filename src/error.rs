use crate::richtext::structured_document::{BlockId, InlineId};
use crate::richtext::text_range::RangeId;
use thiserror::Error;

/// Errors raised by the edit engine.
///
/// Structural variants (`EmptyDocument`, `DanglingInline`, `DanglingBlock`,
/// `EmptyParagraph`, `Corrupted`) mean the document tree no longer matches
/// what an edit recorded. Callers should treat them as fatal.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("document has no blocks")]
    EmptyDocument,
    #[error("{0} is not attached to any paragraph")]
    DanglingInline(InlineId),
    #[error("{0} is not part of the document")]
    DanglingBlock(BlockId),
    #[error("{0} has no inlines")]
    EmptyParagraph(BlockId),
    #[error("range end {end} lies before its start {start}")]
    InvertedRange { start: usize, end: usize },
    #[error("offset {offset} is outside the document (end {doc_end})")]
    OffsetOutOfRange { offset: usize, doc_end: usize },
    #[error("unsupported formatting: {0}")]
    UnsupportedFormat(String),
    #[error("no tracked range with id {0}")]
    UnknownRange(RangeId),
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("document structure corrupted: {0}")]
    Corrupted(String),
}

pub type EditResult<T = ()> = Result<T, EditError>;

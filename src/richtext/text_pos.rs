// Text Position Resolver
// Maps between flat document offsets and (inline, char index) positions

use crate::error::{EditError, EditResult};
use crate::richtext::structured_document::{BlockId, Document, InlineId, Paragraph};
use crate::richtext::style::RunStyle;

/// A structural cursor: an inline and a char index within it.
///
/// `offset == span` means "after this inline". Resolution only produces
/// that form for the last inline of a paragraph; anywhere else the position
/// is expressed as offset 0 of the following inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPos {
    pub inline: InlineId,
    pub offset: usize,
}

impl TextPos {
    pub fn new(inline: InlineId, offset: usize) -> Self {
        TextPos { inline, offset }
    }
}

/// A gap between inlines: before `paragraph.inlines()[index]`, or after the
/// last inline when `index == inline_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineBoundary {
    pub paragraph: BlockId,
    pub index: usize,
}

impl Document {
    /// Resolve a flat offset. Offsets past the caret range clamp to the end
    /// of the last paragraph.
    pub fn to_text_pos(&self, offset: usize) -> EditResult<TextPos> {
        let last = *self.block_ids().last().ok_or(EditError::EmptyDocument)?;
        let mut paragraph_start = 0;
        for &block in self.block_ids() {
            let paragraph = self.paragraph_ref(block)?;
            let content_len = self.content_len(paragraph)?;
            if offset <= paragraph_start + content_len {
                return self.locate_in_paragraph(block, offset - paragraph_start);
            }
            paragraph_start += content_len + 1;
        }
        let content_len = self.content_len(self.paragraph_ref(last)?)?;
        self.locate_in_paragraph(last, content_len)
    }

    /// Flat offset of a position. Fails if the inline is not reachable from
    /// any block.
    pub fn to_flat_offset(&self, pos: TextPos) -> EditResult<usize> {
        let mut paragraph_start = 0;
        for &block in self.block_ids() {
            let mut local = 0;
            for &id in self.paragraph_ref(block)?.inlines() {
                let span = self.inline_ref(id)?.span_len();
                if id == pos.inline {
                    return Ok(paragraph_start + local + pos.offset.min(span));
                }
                local += span;
            }
            paragraph_start += local + 1;
        }
        Err(EditError::DanglingInline(pos.inline))
    }

    /// Normalize the start of a range. A position after an inline moves to
    /// the next inline of the same paragraph. At a paragraph end it moves
    /// into the next paragraph unless `keep_paragraph_end` is set, which a
    /// deletion needs so that it merges the two paragraphs instead of
    /// removing from the wrong side.
    pub fn normalize_start(&self, pos: TextPos, keep_paragraph_end: bool) -> EditResult<TextPos> {
        let (block, index) = self.inline_index(pos.inline)?;
        if pos.offset < self.inline_ref(pos.inline)?.span_len() {
            return Ok(pos);
        }
        let paragraph = self.paragraph_ref(block)?;
        if let Some(&next) = paragraph.inlines().get(index + 1) {
            return Ok(TextPos::new(next, 0));
        }
        if keep_paragraph_end {
            return Ok(pos);
        }
        let block_index = self.require_block_index(block)?;
        match self.block_ids().get(block_index + 1) {
            Some(&next_block) => {
                let first = *self
                    .paragraph_ref(next_block)?
                    .inlines()
                    .first()
                    .ok_or(EditError::EmptyParagraph(next_block))?;
                Ok(TextPos::new(first, 0))
            }
            None => Ok(pos),
        }
    }

    /// Normalize the exclusive end of a range; never leaves its paragraph
    pub fn normalize_end(&self, pos: TextPos) -> EditResult<TextPos> {
        let (block, index) = self.inline_index(pos.inline)?;
        if pos.offset < self.inline_ref(pos.inline)?.span_len() {
            return Ok(pos);
        }
        match self.paragraph_ref(block)?.inlines().get(index + 1) {
            Some(&next) => Ok(TextPos::new(next, 0)),
            None => Ok(pos),
        }
    }

    /// Convert a position on an inline edge into the gap it denotes
    pub fn boundary_of(&self, pos: TextPos) -> EditResult<InlineBoundary> {
        let (paragraph, index) = self.inline_index(pos.inline)?;
        let span = self.inline_ref(pos.inline)?.span_len();
        if pos.offset == 0 {
            Ok(InlineBoundary { paragraph, index })
        } else if pos.offset >= span {
            Ok(InlineBoundary {
                paragraph,
                index: index + 1,
            })
        } else {
            Err(EditError::Corrupted(format!(
                "offset {} lies inside {}",
                pos.offset, pos.inline
            )))
        }
    }

    /// Style a caret at `offset` picks up. With `bias_forward` unset a caret
    /// on an inline edge takes the style of the inline before it.
    pub fn style_at(&self, offset: usize, bias_forward: bool) -> EditResult<RunStyle> {
        let pos = self.to_text_pos(offset)?;
        let (paragraph, index) = self.inline_index(pos.inline)?;
        let index = if !bias_forward && pos.offset == 0 && index > 0 {
            index - 1
        } else {
            index
        };
        self.run_style_near(paragraph, index)
    }

    fn content_len(&self, paragraph: &Paragraph) -> EditResult<usize> {
        paragraph
            .inlines()
            .iter()
            .map(|id| self.inline_ref(*id).map(|i| i.span_len()))
            .sum()
    }

    fn locate_in_paragraph(&self, block: BlockId, local: usize) -> EditResult<TextPos> {
        let inlines = self.paragraph_ref(block)?.inlines();
        let mut inline_start = 0;
        for (i, &id) in inlines.iter().enumerate() {
            let span = self.inline_ref(id)?.span_len();
            if local < inline_start + span || i + 1 == inlines.len() {
                return Ok(TextPos::new(id, (local - inline_start).min(span)));
            }
            inline_start += span;
        }
        Err(EditError::EmptyParagraph(block))
    }
}

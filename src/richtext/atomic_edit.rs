// Atomic edits
// Minimal reversible mutations of the document tree. They never touch cached
// positions or the selection; EditAction refreshes those once per batch.

use crate::error::EditResult;
use crate::richtext::formatting::RunFormat;
use crate::richtext::structured_document::{BlockId, Document, InlineId};
use crate::richtext::text_range::{RangeId, TextRange};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum AtomicEdit {
    InsertBlock {
        index: usize,
        block: BlockId,
    },
    RemoveBlock {
        index: usize,
        block: BlockId,
    },
    InsertInline {
        paragraph: BlockId,
        index: usize,
        inline: InlineId,
    },
    RemoveInline {
        paragraph: BlockId,
        index: usize,
        inline: InlineId,
    },
    SetRunText {
        run: InlineId,
        old: String,
        new: String,
    },
    SetRunFormat {
        run: InlineId,
        old: RunFormat,
        new: RunFormat,
    },
    /// One value applied to many runs, each keeping its own old value
    SetRunsFormat {
        new: RunFormat,
        old: Vec<(InlineId, RunFormat)>,
    },
    /// Shift tracked ranges. Apply snapshots the registry so unapply puts
    /// every range back exactly, including ranges the shift disposed.
    ShiftTextRanges {
        at: usize,
        delta: isize,
        snapshot: Option<BTreeMap<RangeId, TextRange>>,
        disposed: Vec<RangeId>,
    },
    /// Runs the wrapped edit backwards
    Revert(Box<AtomicEdit>),
}

impl AtomicEdit {
    pub fn shift_text_ranges(at: usize, delta: isize) -> Self {
        AtomicEdit::ShiftTextRanges {
            at,
            delta,
            snapshot: None,
            disposed: Vec::new(),
        }
    }

    pub fn revert(inner: AtomicEdit) -> Self {
        AtomicEdit::Revert(Box::new(inner))
    }

    pub fn apply(&mut self, doc: &mut Document) -> EditResult<()> {
        match self {
            AtomicEdit::InsertBlock { index, block } => doc.attach_block(*index, *block),
            AtomicEdit::RemoveBlock { index, block } => doc.detach_block(*index, *block),
            AtomicEdit::InsertInline {
                paragraph,
                index,
                inline,
            } => doc.attach_inline(*paragraph, *index, *inline),
            AtomicEdit::RemoveInline {
                paragraph,
                index,
                inline,
            } => doc.detach_inline(*paragraph, *index, *inline),
            AtomicEdit::SetRunText { run, new, .. } => doc.set_run_text(*run, new.clone()),
            AtomicEdit::SetRunFormat { run, new, .. } => {
                new.apply_to(&mut doc.run_mut(*run)?.style);
                Ok(())
            }
            AtomicEdit::SetRunsFormat { new, old } => {
                for (run, _) in old.iter() {
                    new.apply_to(&mut doc.run_mut(*run)?.style);
                }
                Ok(())
            }
            AtomicEdit::ShiftTextRanges {
                at,
                delta,
                snapshot,
                disposed,
            } => {
                *snapshot = Some(doc.ranges.snapshot());
                *disposed = doc.ranges.shift(*at, *delta);
                Ok(())
            }
            AtomicEdit::Revert(inner) => inner.unapply(doc),
        }
    }

    pub fn unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        match self {
            AtomicEdit::InsertBlock { index, block } => doc.detach_block(*index, *block),
            AtomicEdit::RemoveBlock { index, block } => doc.attach_block(*index, *block),
            AtomicEdit::InsertInline {
                paragraph,
                index,
                inline,
            } => doc.detach_inline(*paragraph, *index, *inline),
            AtomicEdit::RemoveInline {
                paragraph,
                index,
                inline,
            } => doc.attach_inline(*paragraph, *index, *inline),
            AtomicEdit::SetRunText { run, old, .. } => doc.set_run_text(*run, old.clone()),
            AtomicEdit::SetRunFormat { run, old, .. } => {
                old.apply_to(&mut doc.run_mut(*run)?.style);
                Ok(())
            }
            AtomicEdit::SetRunsFormat { old, .. } => {
                for (run, value) in old.iter().rev() {
                    value.apply_to(&mut doc.run_mut(*run)?.style);
                }
                Ok(())
            }
            AtomicEdit::ShiftTextRanges {
                at,
                delta,
                snapshot,
                disposed,
            } => {
                match snapshot.take() {
                    Some(recorded) => doc.ranges.restore(&recorded, disposed, *at, *delta),
                    None => doc.ranges.unshift(*at, *delta),
                }
                disposed.clear();
                Ok(())
            }
            AtomicEdit::Revert(inner) => inner.apply(doc),
        }
    }

    /// Ranges disposed by the last apply
    pub fn disposed_ranges(&self) -> &[RangeId] {
        match self {
            AtomicEdit::ShiftTextRanges { disposed, .. } => disposed,
            AtomicEdit::Revert(inner) => inner.disposed_ranges(),
            _ => &[],
        }
    }

    /// Net change in document length
    pub fn length_delta(&self) -> isize {
        match self {
            AtomicEdit::ShiftTextRanges { delta, .. } => *delta,
            AtomicEdit::Revert(inner) => -inner.length_delta(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::structured_document::InlineContent;
    use crate::richtext::style::{ParagraphStyle, RunStyle, Thickness};

    fn first_inline(doc: &Document) -> InlineId {
        doc.block_at(0).unwrap().paragraph().inlines()[0]
    }

    fn round_trip(doc: &mut Document, mut edit: AtomicEdit) {
        let before = doc.snapshot();
        edit.apply(doc).unwrap();
        doc.recompute_from(0);
        assert_ne!(doc.snapshot(), before);
        edit.unapply(doc).unwrap();
        doc.recompute_from(0);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_insert_inline_round_trip() {
        let mut doc = Document::from_plain_text("ab");
        let paragraph = doc.block_ids()[0];
        let inline = doc.alloc_inline(InlineContent::LineBreak);
        round_trip(
            &mut doc,
            AtomicEdit::InsertInline {
                paragraph,
                index: 1,
                inline,
            },
        );
        assert_eq!(doc.inline(inline).unwrap().paragraph(), None);
    }

    #[test]
    fn test_remove_block_restores_same_instance() {
        let mut doc = Document::from_plain_text("ab\rcd\ref");
        let block = doc.block_ids()[1];
        let mut edit = AtomicEdit::RemoveBlock { index: 1, block };
        edit.apply(&mut doc).unwrap();
        doc.recompute_from(0);
        assert_eq!(doc.text(), "ab\ref\r");
        edit.unapply(&mut doc).unwrap();
        doc.recompute_from(0);
        assert_eq!(doc.block_ids()[1], block);
        assert_eq!(doc.text(), "ab\rcd\ref\r");
    }

    #[test]
    fn test_insert_block_round_trip() {
        let mut doc = Document::from_plain_text("ab");
        let block = doc.alloc_paragraph(ParagraphStyle::default(), Thickness::default());
        round_trip(&mut doc, AtomicEdit::InsertBlock { index: 1, block });
    }

    #[test]
    fn test_set_run_text_round_trip() {
        let mut doc = Document::from_plain_text("ab");
        let run = first_inline(&doc);
        round_trip(
            &mut doc,
            AtomicEdit::SetRunText {
                run,
                old: "ab".to_string(),
                new: "axb".to_string(),
            },
        );
    }

    #[test]
    fn test_set_runs_format_restores_each_value() {
        let mut doc = Document::from_paragraphs(vec![vec![
            InlineContent::run("a", RunStyle::bold()),
            InlineContent::run("b", RunStyle::default()),
        ]]);
        let ids = doc.block_at(0).unwrap().paragraph().inlines().to_vec();
        let old = ids
            .iter()
            .map(|id| {
                let style = &doc.inline(*id).unwrap().content.as_run().unwrap().style;
                (*id, RunFormat::read(style, RunFormat::italic().property()))
            })
            .collect();
        let mut edit = AtomicEdit::SetRunsFormat {
            new: RunFormat::italic(),
            old,
        };
        let before = doc.snapshot();
        edit.apply(&mut doc).unwrap();
        assert!(ids.iter().all(|id| {
            doc.inline(*id).unwrap().content.as_run().unwrap().style.is_italic()
        }));
        edit.unapply(&mut doc).unwrap();
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_revert_flips_direction() {
        let mut doc = Document::from_plain_text("ab\rcd");
        let block = doc.block_ids()[1];
        let mut edit = AtomicEdit::revert(AtomicEdit::InsertBlock { index: 1, block });
        edit.apply(&mut doc).unwrap();
        doc.recompute_from(0);
        assert_eq!(doc.block_count(), 1);
        edit.unapply(&mut doc).unwrap();
        doc.recompute_from(0);
        assert_eq!(doc.text(), "ab\rcd\r");
    }

    #[test]
    fn test_shift_text_ranges_restores_disposed() {
        let mut doc = Document::from_plain_text("abcdef");
        let inside = doc.ranges.create(2, 3);
        let later = doc.ranges.create(4, 6);
        let mut edit = AtomicEdit::shift_text_ranges(1, -3);
        edit.apply(&mut doc).unwrap();
        assert_eq!(edit.disposed_ranges(), &[inside]);
        assert_eq!(doc.ranges().get(later), Some(TextRange::new(1, 3)));
        edit.unapply(&mut doc).unwrap();
        assert_eq!(doc.ranges().get(inside), Some(TextRange::new(2, 3)));
        assert_eq!(doc.ranges().get(later), Some(TextRange::new(4, 6)));
        assert!(edit.disposed_ranges().is_empty());
    }

    #[test]
    fn test_attach_twice_is_corruption() {
        let mut doc = Document::from_plain_text("ab");
        let paragraph = doc.block_ids()[0];
        let inline = first_inline(&doc);
        let mut edit = AtomicEdit::InsertInline {
            paragraph,
            index: 0,
            inline,
        };
        assert!(edit.apply(&mut doc).is_err());
    }
}

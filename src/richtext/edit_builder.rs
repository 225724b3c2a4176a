// Edit Builder
// Turns a replace or format request into an EditAction. Every step is applied
// to the live document and recorded, then the whole batch is rolled back so
// a built action has no effect until it is executed.

use crate::error::{EditError, EditResult};
use crate::richtext::atomic_edit::AtomicEdit;
use crate::richtext::edit_action::{ActionKind, EditAction};
use crate::richtext::formatting::RunFormat;
use crate::richtext::structured_document::{
    BlockId, Document, InlineContent, InlineId, PARAGRAPH_SEPARATOR, Run,
};
use crate::richtext::style::RunStyle;
use crate::richtext::text_pos::{InlineBoundary, TextPos};
use crate::richtext::text_range::Selection;
use std::collections::BTreeSet;
use tracing::{error, trace};

/// Build the action replacing `[start, end)` with `content`.
///
/// A `\r` inside run text opens a new paragraph. Returns `Ok(None)` when
/// there is nothing to remove and nothing to insert.
pub fn build_replace_range(
    doc: &mut Document,
    start: usize,
    end: usize,
    content: Vec<InlineContent>,
) -> EditResult<Option<EditAction>> {
    check_range(doc, start, end)?;
    if start == end && content.iter().all(|c| c.span_len() == 0) {
        return Ok(None);
    }
    let mut builder = EditBuilder::new(doc);
    match builder.replace(start, end, content) {
        Ok((kind, selection_after)) => builder.finish(kind, selection_after).map(Some),
        Err(err) => Err(builder.abort(err)),
    }
}

/// Build the action applying `format` to every run inside `[start, end)`.
///
/// Toggleable values (bold, italic, underline) switch off instead when every
/// covered run already carries them. Returns `Ok(None)` when no run is
/// covered; the document is left untouched in that case.
pub fn build_format_range(
    doc: &mut Document,
    start: usize,
    end: usize,
    format: &RunFormat,
) -> EditResult<Option<EditAction>> {
    format.validate()?;
    check_range(doc, start, end)?;
    if start == end {
        return Ok(None);
    }
    let mut builder = EditBuilder::new(doc);
    match builder.format(start, end, format) {
        Ok(true) => {
            let selection_after = builder.selection_before.clone();
            builder.finish(ActionKind::Format, selection_after).map(Some)
        }
        Ok(false) => {
            builder.rollback()?;
            trace!(target: "flowdoc::edit_builder", start, end, "format range covers no runs");
            Ok(None)
        }
        Err(err) => Err(builder.abort(err)),
    }
}

fn check_range(doc: &Document, start: usize, end: usize) -> EditResult<()> {
    if start > end {
        return Err(EditError::InvertedRange { start, end });
    }
    if end > doc.caret_max() {
        return Err(EditError::OffsetOutOfRange {
            offset: end,
            doc_end: doc.doc_end(),
        });
    }
    Ok(())
}

struct EditBuilder<'a> {
    doc: &'a mut Document,
    edits: Vec<AtomicEdit>,
    dirty: BTreeSet<BlockId>,
    refresh_from: usize,
    selection_before: Selection,
}

impl<'a> EditBuilder<'a> {
    fn new(doc: &'a mut Document) -> Self {
        let selection_before = doc.selection().clone();
        let refresh_from = doc.block_count();
        EditBuilder {
            doc,
            edits: Vec::new(),
            dirty: BTreeSet::new(),
            refresh_from,
            selection_before,
        }
    }

    fn record(&mut self, mut edit: AtomicEdit) -> EditResult<()> {
        edit.apply(self.doc)?;
        self.edits.push(edit);
        Ok(())
    }

    /// Note a paragraph as changed; must be called while it is attached
    fn touch(&mut self, paragraph: BlockId) -> EditResult<()> {
        let index = self.doc.require_block_index(paragraph)?;
        self.refresh_from = self.refresh_from.min(index);
        self.dirty.insert(paragraph);
        Ok(())
    }

    fn rollback(&mut self) -> EditResult<()> {
        for edit in self.edits.iter_mut().rev() {
            edit.unapply(self.doc)?;
        }
        self.doc.recompute_from(self.refresh_from);
        Ok(())
    }

    fn finish(mut self, kind: ActionKind, selection_after: Selection) -> EditResult<EditAction> {
        self.rollback()?;
        trace!(
            target: "flowdoc::edit_builder",
            ?kind,
            edits = self.edits.len(),
            refresh_from = self.refresh_from,
            "built edit action"
        );
        Ok(EditAction::new(
            kind,
            self.edits,
            self.selection_before,
            selection_after,
            self.refresh_from,
            self.dirty.into_iter().collect(),
        ))
    }

    fn abort(mut self, err: EditError) -> EditError {
        if let Err(rollback_err) = self.rollback() {
            error!(target: "flowdoc::edit_builder", %err, %rollback_err, "rollback failed");
        }
        err
    }

    // Replace

    fn replace(
        &mut self,
        start: usize,
        end: usize,
        content: Vec<InlineContent>,
    ) -> EditResult<(ActionKind, Selection)> {
        let removed = end - start;
        let inserted: usize = content.iter().map(InlineContent::span_len).sum();

        let kind = if removed == 0 && self.splice_into_run(start, content.as_slice())? {
            ActionKind::Typing
        } else {
            let fallback = self.doc.style_at(start, false)?;
            self.split_run_at(start)?;
            self.split_run_at(end)?;
            let from = self.start_boundary(start, true)?;
            let to = if removed == 0 {
                from
            } else {
                self.end_boundary(end)?
            };
            trace!(target: "flowdoc::edit_builder", ?from, ?to, removed, inserted, "replace");
            let at = self.delete_between(from, to)?;
            self.insert_at(at, content, &fallback)?;
            ActionKind::Replace
        };

        if inserted != removed {
            let delta = inserted as isize - removed as isize;
            self.record(AtomicEdit::shift_text_ranges(start, delta))?;
        }
        self.doc.recompute_from(self.refresh_from);
        let caret = (start + inserted).min(self.doc.caret_max());
        Ok((kind, self.doc.selection_at(caret, caret)))
    }

    /// Typing fast path: splice a single run of plain text into a run of the
    /// same style at the caret
    fn splice_into_run(&mut self, start: usize, content: &[InlineContent]) -> EditResult<bool> {
        let [InlineContent::Run(incoming)] = content else {
            return Ok(false);
        };
        if incoming.text.is_empty() || incoming.text.contains(PARAGRAPH_SEPARATOR) {
            return Ok(false);
        }
        let pos = self.doc.to_text_pos(start)?;
        let (paragraph, index) = self.doc.inline_index(pos.inline)?;
        let inlines = self.doc.paragraph_ref(paragraph)?.inlines().to_vec();

        let mut candidates = Vec::with_capacity(2);
        if pos.offset == 0
            && index > 0
            && let Some(&prev) = inlines.get(index - 1)
        {
            candidates.push(TextPos::new(prev, self.doc.inline_ref(prev)?.span_len()));
        }
        candidates.push(pos);
        for candidate in candidates {
            if self.run_has_style(candidate.inline, &incoming.style)? {
                self.splice(paragraph, candidate, &incoming.text)?;
                return Ok(true);
            }
        }

        // An empty paragraph takes on the style of the text typed into it
        if inlines.len() == 1
            && let Some(run) = self.doc.inline_ref(pos.inline)?.content.as_run()
            && run.text.is_empty()
        {
            let changes = RunFormat::differences(&run.style, &incoming.style);
            self.touch(paragraph)?;
            for (old, new) in changes {
                self.record(AtomicEdit::SetRunFormat {
                    run: pos.inline,
                    old,
                    new,
                })?;
            }
            self.splice(paragraph, pos, &incoming.text)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn splice(&mut self, paragraph: BlockId, pos: TextPos, text: &str) -> EditResult<()> {
        let old = self.run_text(pos.inline)?;
        let mut new = old.clone();
        new.insert_str(byte_index(&old, pos.offset), text);
        self.touch(paragraph)?;
        self.record(AtomicEdit::SetRunText {
            run: pos.inline,
            old,
            new,
        })
    }

    /// Split the run under `offset` so the offset falls between two inlines
    fn split_run_at(&mut self, offset: usize) -> EditResult<()> {
        let pos = self.doc.to_text_pos(offset)?;
        let (old, style) = match &self.doc.inline_ref(pos.inline)?.content {
            InlineContent::Run(run) => (run.text.clone(), run.style.clone()),
            _ => return Ok(()),
        };
        if pos.offset == 0 || pos.offset >= old.chars().count() {
            return Ok(());
        }
        let (head, tail) = old.split_at(byte_index(&old, pos.offset));
        let (head, tail) = (head.to_string(), tail.to_string());
        let (paragraph, index) = self.doc.inline_index(pos.inline)?;
        trace!(target: "flowdoc::edit_builder", offset, run = %pos.inline, "split run");

        self.touch(paragraph)?;
        self.record(AtomicEdit::SetRunText {
            run: pos.inline,
            old,
            new: head,
        })?;
        let inline = self.doc.alloc_inline(InlineContent::run(tail, style));
        self.record(AtomicEdit::InsertInline {
            paragraph,
            index: index + 1,
            inline,
        })
    }

    fn start_boundary(&self, offset: usize, keep_paragraph_end: bool) -> EditResult<InlineBoundary> {
        let pos = self.doc.to_text_pos(offset)?;
        let pos = self.doc.normalize_start(pos, keep_paragraph_end)?;
        self.doc.boundary_of(pos)
    }

    fn end_boundary(&self, offset: usize) -> EditResult<InlineBoundary> {
        let pos = self.doc.to_text_pos(offset)?;
        let pos = self.doc.normalize_end(pos)?;
        self.doc.boundary_of(pos)
    }

    /// Remove every inline between two boundaries. Across paragraphs, what
    /// is left of the end paragraph moves into the start paragraph and the
    /// emptied blocks go away. Returns where insertion continues.
    fn delete_between(
        &mut self,
        from: InlineBoundary,
        to: InlineBoundary,
    ) -> EditResult<InlineBoundary> {
        self.touch(from.paragraph)?;
        if from.paragraph == to.paragraph {
            self.remove_inlines(from.paragraph, from.index, to.index)?;
            return Ok(from);
        }

        let first = self.doc.require_block_index(from.paragraph)?;
        let last = self.doc.require_block_index(to.paragraph)?;
        if last < first {
            return Err(EditError::Corrupted(format!(
                "range end {} precedes its start {}",
                to.paragraph, from.paragraph
            )));
        }
        self.touch(to.paragraph)?;

        let tail_end = self.doc.paragraph_ref(from.paragraph)?.inline_count();
        self.remove_inlines(from.paragraph, from.index, tail_end)?;
        self.remove_inlines(to.paragraph, 0, to.index)?;

        for index in (first + 1..last).rev() {
            let block = self.doc.block_ids()[index];
            self.touch(block)?;
            self.record(AtomicEdit::RemoveBlock { index, block })?;
        }

        let remainder = self.doc.paragraph_ref(to.paragraph)?.inlines().to_vec();
        for inline in remainder {
            let index = self.doc.paragraph_ref(from.paragraph)?.inline_count();
            self.record(AtomicEdit::RemoveInline {
                paragraph: to.paragraph,
                index: 0,
                inline,
            })?;
            self.record(AtomicEdit::InsertInline {
                paragraph: from.paragraph,
                index,
                inline,
            })?;
        }
        self.record(AtomicEdit::RemoveBlock {
            index: first + 1,
            block: to.paragraph,
        })?;
        Ok(from)
    }

    fn remove_inlines(&mut self, paragraph: BlockId, from: usize, to: usize) -> EditResult<()> {
        if from >= to {
            return Ok(());
        }
        let ids = self
            .doc
            .paragraph_ref(paragraph)?
            .inlines()
            .get(from..to)
            .ok_or_else(|| {
                EditError::Corrupted(format!("inlines {from}..{to} out of bounds in {paragraph}"))
            })?
            .to_vec();
        for (offset, inline) in ids.into_iter().enumerate().rev() {
            // a removal is an insertion run backwards
            self.record(AtomicEdit::revert(AtomicEdit::InsertInline {
                paragraph,
                index: from + offset,
                inline,
            }))?;
        }
        Ok(())
    }

    fn insert_at(
        &mut self,
        at: InlineBoundary,
        content: Vec<InlineContent>,
        fallback: &RunStyle,
    ) -> EditResult<()> {
        let mut segments = split_segments(content).into_iter();
        let first = segments.next().unwrap_or_default();
        let rest: Vec<Vec<InlineContent>> = segments.collect();
        if rest.is_empty() {
            self.insert_segment(at.paragraph, at.index, first)?;
            return self.tidy(at.paragraph, fallback);
        }

        // Paragraph breaks: whatever followed the insertion point ends up in
        // the last new paragraph
        let block = self
            .doc
            .block(at.paragraph)
            .ok_or(EditError::DanglingBlock(at.paragraph))?;
        let (style, margin) = (block.paragraph().style.clone(), block.margin);
        let trailing = self.detach_from(at.paragraph, at.index)?;
        self.insert_segment(at.paragraph, at.index, first)?;

        let mut index = self.doc.require_block_index(at.paragraph)?;
        let mut current = at.paragraph;
        let mut created = vec![at.paragraph];
        for segment in rest {
            index += 1;
            let block = self.doc.alloc_paragraph(style.clone(), margin);
            self.record(AtomicEdit::InsertBlock { index, block })?;
            self.touch(block)?;
            self.insert_segment(block, 0, segment)?;
            created.push(block);
            current = block;
        }
        let base = self.doc.paragraph_ref(current)?.inline_count();
        for (offset, inline) in trailing.into_iter().enumerate() {
            self.record(AtomicEdit::InsertInline {
                paragraph: current,
                index: base + offset,
                inline,
            })?;
        }
        trace!(target: "flowdoc::edit_builder", paragraphs = created.len(), "split paragraph");
        for paragraph in created {
            self.tidy(paragraph, fallback)?;
        }
        Ok(())
    }

    fn detach_from(&mut self, paragraph: BlockId, index: usize) -> EditResult<Vec<InlineId>> {
        let ids = self
            .doc
            .paragraph_ref(paragraph)?
            .inlines()
            .get(index..)
            .map(<[InlineId]>::to_vec)
            .unwrap_or_default();
        for (offset, inline) in ids.iter().enumerate().rev() {
            self.record(AtomicEdit::RemoveInline {
                paragraph,
                index: index + offset,
                inline: *inline,
            })?;
        }
        Ok(ids)
    }

    fn insert_segment(
        &mut self,
        paragraph: BlockId,
        index: usize,
        segment: Vec<InlineContent>,
    ) -> EditResult<()> {
        if let [InlineContent::Run(run)] = segment.as_slice()
            && self.merge_adjacent(paragraph, index, run)?
        {
            return Ok(());
        }
        for (offset, content) in segment.into_iter().enumerate() {
            let inline = self.doc.alloc_inline(content);
            self.record(AtomicEdit::InsertInline {
                paragraph,
                index: index + offset,
                inline,
            })?;
        }
        Ok(())
    }

    /// Append to the run before `index`, or prepend to the run at `index`,
    /// when its style matches
    fn merge_adjacent(&mut self, paragraph: BlockId, index: usize, run: &Run) -> EditResult<bool> {
        let inlines = self.doc.paragraph_ref(paragraph)?.inlines().to_vec();
        if index > 0
            && let Some(&prev) = inlines.get(index - 1)
            && self.run_has_style(prev, &run.style)?
        {
            let span = self.doc.inline_ref(prev)?.span_len();
            self.splice(paragraph, TextPos::new(prev, span), &run.text)?;
            return Ok(true);
        }
        if let Some(&next) = inlines.get(index)
            && self.run_has_style(next, &run.style)?
        {
            self.splice(paragraph, TextPos::new(next, 0), &run.text)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Keep a paragraph non-empty and free of empty runs beside real content
    fn tidy(&mut self, paragraph: BlockId, fallback: &RunStyle) -> EditResult<()> {
        let inlines = self.doc.paragraph_ref(paragraph)?.inlines().to_vec();
        if inlines.is_empty() {
            let placeholder = self.doc.alloc_inline(InlineContent::run("", fallback.clone()));
            return self.record(AtomicEdit::InsertInline {
                paragraph,
                index: 0,
                inline: placeholder,
            });
        }
        let mut remaining = inlines.len();
        for (index, inline) in inlines.into_iter().enumerate().rev() {
            if remaining > 1 && self.doc.inline_ref(inline)?.span_len() == 0 {
                self.record(AtomicEdit::RemoveInline {
                    paragraph,
                    index,
                    inline,
                })?;
                remaining -= 1;
            }
        }
        Ok(())
    }

    // Format

    fn format(&mut self, start: usize, end: usize, format: &RunFormat) -> EditResult<bool> {
        self.split_run_at(start)?;
        self.split_run_at(end)?;
        let from = self.start_boundary(start, false)?;
        let to = self.end_boundary(end)?;
        let runs = self.covered_runs(from, to)?;
        if runs.is_empty() {
            return Ok(false);
        }

        let property = format.property();
        let mut old = Vec::with_capacity(runs.len());
        let mut all_set = true;
        for (_, run) in &runs {
            let style = &self.run_ref(*run)?.style;
            all_set &= format.is_set_on(style);
            old.push((*run, RunFormat::read(style, property)));
        }
        let new = match format.toggled_off() {
            Some(off) if all_set => off,
            _ => format.clone(),
        };
        trace!(target: "flowdoc::edit_builder", runs = runs.len(), ?new, "format range");

        for (paragraph, _) in &runs {
            self.touch(*paragraph)?;
        }
        self.record(AtomicEdit::SetRunsFormat { new, old })?;
        Ok(true)
    }

    /// Non-empty runs between two boundaries, in document order
    fn covered_runs(
        &self,
        from: InlineBoundary,
        to: InlineBoundary,
    ) -> EditResult<Vec<(BlockId, InlineId)>> {
        let first = self.doc.require_block_index(from.paragraph)?;
        let last = self.doc.require_block_index(to.paragraph)?;
        let mut runs = Vec::new();
        for index in first..=last {
            let paragraph = self.doc.block_ids()[index];
            let inlines = self.doc.paragraph_ref(paragraph)?.inlines();
            let lo = if index == first { from.index } else { 0 };
            let hi = if index == last { to.index } else { inlines.len() };
            for &inline in inlines.get(lo..hi).unwrap_or_default() {
                if self.doc.inline_ref(inline)?.content.as_run().is_some_and(|r| !r.text.is_empty()) {
                    runs.push((paragraph, inline));
                }
            }
        }
        Ok(runs)
    }

    // Helpers

    fn run_ref(&self, id: InlineId) -> EditResult<&Run> {
        self.doc
            .inline_ref(id)?
            .content
            .as_run()
            .ok_or_else(|| EditError::Corrupted(format!("{id} is not a text run")))
    }

    fn run_text(&self, id: InlineId) -> EditResult<String> {
        Ok(self.run_ref(id)?.text.clone())
    }

    fn run_has_style(&self, id: InlineId, style: &RunStyle) -> EditResult<bool> {
        Ok(self
            .doc
            .inline_ref(id)?
            .content
            .as_run()
            .is_some_and(|run| run.style == *style))
    }
}

/// Cut inserted content into paragraphs at every `\r` inside run text
fn split_segments(content: Vec<InlineContent>) -> Vec<Vec<InlineContent>> {
    let mut segments: Vec<Vec<InlineContent>> = vec![Vec::new()];
    for item in content {
        match item {
            InlineContent::Run(run) if run.text.contains(PARAGRAPH_SEPARATOR) => {
                for (i, part) in run.text.split(PARAGRAPH_SEPARATOR).enumerate() {
                    if i > 0 {
                        segments.push(Vec::new());
                    }
                    if !part.is_empty()
                        && let Some(segment) = segments.last_mut()
                    {
                        segment.push(InlineContent::run(part, run.style.clone()));
                    }
                }
            }
            InlineContent::Run(run) if run.text.is_empty() => {}
            other => {
                if let Some(segment) = segments.last_mut() {
                    segment.push(other);
                }
            }
        }
    }
    segments
}

/// Byte position of the `char_index`-th char, or the end of the string
pub(crate) fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

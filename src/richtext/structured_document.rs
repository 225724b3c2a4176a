// Structured Document Model
// Blocks and inlines live in arenas owned by the document; paragraphs
// reference their inlines by id and inlines point back to their paragraph
// by id. Positions are cached and refreshed explicitly with recompute_from.

use crate::error::{EditError, EditResult};
use crate::richtext::style::{ParagraphStyle, RunStyle, Thickness};
use crate::richtext::text_range::{RangeId, RangeTracker, Selection};
use std::collections::BTreeSet;
use std::fmt;

/// Paragraph boundary unit in flat text; also the paragraph-break sentinel
/// inside inserted run text
pub const PARAGRAPH_SEPARATOR: char = '\r';
/// Flat-text stand-in for a line break inline
pub const LINE_BREAK_CHAR: char = '\u{000B}';
/// Flat-text stand-in for an embedded object
pub const OBJECT_REPLACEMENT_CHAR: char = '\u{FFFC}';

/// Identity of an inline in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InlineId(usize);

/// Identity of a block in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl fmt::Display for InlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inline #{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{}", self.0)
    }
}

/// A run of styled text
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Run {
            text: text.into(),
            style,
        }
    }

    /// Length in flat-offset units (Unicode scalar values)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An embedded non-text object, identified by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiObject {
    pub name: String,
}

impl UiObject {
    pub fn new(name: impl Into<String>) -> Self {
        UiObject { name: name.into() }
    }
}

/// Inline content (can appear within a paragraph)
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    Run(Run),
    LineBreak,
    UiObject(UiObject),
}

impl InlineContent {
    pub fn run(text: impl Into<String>, style: RunStyle) -> Self {
        InlineContent::Run(Run::new(text, style))
    }

    pub fn object(name: impl Into<String>) -> Self {
        InlineContent::UiObject(UiObject::new(name))
    }

    /// Number of flat-offset units this inline occupies
    pub fn span_len(&self) -> usize {
        match self {
            InlineContent::Run(run) => run.char_len(),
            InlineContent::LineBreak => 1,
            InlineContent::UiObject(_) => 1,
        }
    }

    /// Text content; only runs carry text
    pub fn text(&self) -> Option<&str> {
        match self {
            InlineContent::Run(run) => Some(&run.text),
            _ => None,
        }
    }

    pub fn as_run(&self) -> Option<&Run> {
        match self {
            InlineContent::Run(run) => Some(run),
            _ => None,
        }
    }

    pub fn as_run_mut(&mut self) -> Option<&mut Run> {
        match self {
            InlineContent::Run(run) => Some(run),
            _ => None,
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, InlineContent::Run(_))
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, InlineContent::LineBreak)
    }

    pub fn is_ui_object(&self) -> bool {
        matches!(self, InlineContent::UiObject(_))
    }

    /// Append the flat-text rendering; one char per flat-offset unit
    pub fn push_flat_text(&self, out: &mut String) {
        match self {
            InlineContent::Run(run) => out.push_str(&run.text),
            InlineContent::LineBreak => out.push(LINE_BREAK_CHAR),
            InlineContent::UiObject(_) => out.push(OBJECT_REPLACEMENT_CHAR),
        }
    }
}

/// An inline as stored in the arena
#[derive(Debug, Clone)]
pub struct Inline {
    id: InlineId,
    paragraph: Option<BlockId>,
    start_in_paragraph: usize,
    pub content: InlineContent,
}

impl Inline {
    pub fn id(&self) -> InlineId {
        self.id
    }

    /// Owning paragraph, if the inline is currently attached
    pub fn paragraph(&self) -> Option<BlockId> {
        self.paragraph
    }

    /// Cached offset of this inline within its paragraph
    pub fn start_in_paragraph(&self) -> usize {
        self.start_in_paragraph
    }

    pub fn span_len(&self) -> usize {
        self.content.span_len()
    }
}

/// A paragraph: ordered inline ids plus paragraph style
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    inlines: Vec<InlineId>,
}

impl Paragraph {
    pub fn inlines(&self) -> &[InlineId] {
        &self.inlines
    }

    pub fn inline_count(&self) -> usize {
        self.inlines.len()
    }
}

/// Block variants
#[derive(Debug, Clone)]
pub enum BlockKind {
    Paragraph(Paragraph),
}

/// A block as stored in the arena
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    pub margin: Thickness,
    start_in_doc: usize,
    length: usize,
    kind: BlockKind,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Cached flat offset of the first character
    pub fn start_in_doc(&self) -> usize {
        self.start_in_doc
    }

    /// Cached length including the paragraph boundary unit
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn paragraph(&self) -> &Paragraph {
        match &self.kind {
            BlockKind::Paragraph(paragraph) => paragraph,
        }
    }

    fn paragraph_mut(&mut self) -> &mut Paragraph {
        match &mut self.kind {
            BlockKind::Paragraph(paragraph) => paragraph,
        }
    }
}

/// Notifications batched since the last `take_changes`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub selection_changed: bool,
    pub dirty_paragraphs: BTreeSet<BlockId>,
    pub disposed_ranges: Vec<RangeId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.selection_changed && self.dirty_paragraphs.is_empty() && self.disposed_ranges.is_empty()
    }
}

/// Structural state used to compare documents across undo/redo
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub paragraphs: Vec<ParagraphSnapshot>,
    pub selection: Selection,
    pub ranges: Vec<(RangeId, usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphSnapshot {
    pub id: BlockId,
    pub style: ParagraphStyle,
    pub inlines: Vec<(InlineId, InlineContent)>,
}

/// The document: ordered blocks, the inline arena, selection and tracked ranges
#[derive(Debug, Clone)]
pub struct Document {
    order: Vec<BlockId>,
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    selection: Selection,
    pub(crate) ranges: RangeTracker,
    default_run_style: RunStyle,
    default_paragraph_style: ParagraphStyle,
    changes: ChangeSet,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding one empty paragraph
    pub fn new() -> Self {
        Self::with_defaults(RunStyle::default(), ParagraphStyle::default())
    }

    /// Create an empty document using the given default styles
    pub fn with_defaults(run_style: RunStyle, paragraph_style: ParagraphStyle) -> Self {
        let mut doc = Self::bare(run_style, paragraph_style);
        doc.push_paragraph(Vec::new());
        doc.reset_selection();
        doc
    }

    fn bare(run_style: RunStyle, paragraph_style: ParagraphStyle) -> Self {
        Document {
            order: Vec::new(),
            blocks: Vec::new(),
            inlines: Vec::new(),
            selection: Selection::default(),
            ranges: RangeTracker::new(),
            default_run_style: run_style,
            default_paragraph_style: paragraph_style,
            changes: ChangeSet::default(),
        }
    }

    /// Build a document from paragraphs of inline content
    pub fn from_paragraphs<I>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = Vec<InlineContent>>,
    {
        let mut doc = Self::bare(RunStyle::default(), ParagraphStyle::default());
        for content in paragraphs {
            doc.push_paragraph(content);
        }
        if doc.order.is_empty() {
            doc.push_paragraph(Vec::new());
        }
        doc.reset_selection();
        doc
    }

    /// Build a document of default-styled paragraphs separated by `\r` or `\n`
    pub fn from_plain_text(text: &str) -> Self {
        let style = RunStyle::default();
        let text = text.replace("\r\n", "\n");
        Self::from_paragraphs(
            text.split(['\r', '\n'])
                .map(|line| vec![InlineContent::run(line, style.clone())]),
        )
    }

    /// Append a paragraph outside of any undoable edit
    pub fn push_paragraph(&mut self, content: Vec<InlineContent>) -> BlockId {
        let block = self.alloc_paragraph(self.default_paragraph_style.clone(), Thickness::default());
        let content: Vec<InlineContent> = if content.iter().all(|c| c.span_len() == 0) {
            vec![InlineContent::run("", self.default_run_style.clone())]
        } else {
            content.into_iter().filter(|c| c.span_len() > 0).collect()
        };
        for item in content {
            let id = self.alloc_inline(item);
            self.inlines[id.0].paragraph = Some(block);
            self.blocks[block.0].paragraph_mut().inlines.push(id);
        }
        self.order.push(block);
        self.recompute_from(self.order.len() - 1);
        block
    }

    fn reset_selection(&mut self) {
        self.selection = self.selection_at(0, 0);
    }

    pub fn default_run_style(&self) -> &RunStyle {
        &self.default_run_style
    }

    pub fn default_paragraph_style(&self) -> &ParagraphStyle {
        &self.default_paragraph_style
    }

    // Arena access

    /// Allocate a detached inline
    pub(crate) fn alloc_inline(&mut self, content: InlineContent) -> InlineId {
        let id = InlineId(self.inlines.len());
        self.inlines.push(Inline {
            id,
            paragraph: None,
            start_in_paragraph: 0,
            content,
        });
        id
    }

    /// Allocate a detached, empty paragraph block
    pub(crate) fn alloc_paragraph(&mut self, style: ParagraphStyle, margin: Thickness) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block {
            id,
            margin,
            start_in_doc: 0,
            length: 1,
            kind: BlockKind::Paragraph(Paragraph {
                style,
                inlines: Vec::new(),
            }),
        });
        id
    }

    pub fn inline(&self, id: InlineId) -> Option<&Inline> {
        self.inlines.get(id.0)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub(crate) fn inline_ref(&self, id: InlineId) -> EditResult<&Inline> {
        self.inlines.get(id.0).ok_or(EditError::DanglingInline(id))
    }

    pub(crate) fn paragraph_ref(&self, id: BlockId) -> EditResult<&Paragraph> {
        self.blocks
            .get(id.0)
            .map(Block::paragraph)
            .ok_or(EditError::DanglingBlock(id))
    }

    fn paragraph_mut(&mut self, id: BlockId) -> EditResult<&mut Paragraph> {
        self.blocks
            .get_mut(id.0)
            .map(Block::paragraph_mut)
            .ok_or(EditError::DanglingBlock(id))
    }

    pub(crate) fn run_mut(&mut self, id: InlineId) -> EditResult<&mut Run> {
        self.inlines
            .get_mut(id.0)
            .ok_or(EditError::DanglingInline(id))?
            .content
            .as_run_mut()
            .ok_or_else(|| EditError::Corrupted(format!("{id} is not a text run")))
    }

    // Block order

    /// Block ids in document order
    pub fn block_ids(&self) -> &[BlockId] {
        &self.order
    }

    pub fn block_count(&self) -> usize {
        self.order.len()
    }

    /// Attached blocks in document order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.order.iter().map(move |id| &self.blocks[id.0])
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.order.get(index).and_then(|id| self.blocks.get(id.0))
    }

    /// Position of a block in document order
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.order.iter().position(|b| *b == id)
    }

    pub(crate) fn require_block_index(&self, id: BlockId) -> EditResult<usize> {
        self.block_index(id).ok_or(EditError::DanglingBlock(id))
    }

    /// Paragraph and index within it of an attached inline
    pub fn inline_index(&self, id: InlineId) -> EditResult<(BlockId, usize)> {
        let paragraph = self
            .inline_ref(id)?
            .paragraph
            .ok_or(EditError::DanglingInline(id))?;
        let index = self
            .paragraph_ref(paragraph)?
            .inlines
            .iter()
            .position(|i| *i == id)
            .ok_or(EditError::DanglingInline(id))?;
        Ok((paragraph, index))
    }

    // Structural mutation, used by atomic edits

    pub(crate) fn attach_block(&mut self, index: usize, block: BlockId) -> EditResult<()> {
        if block.0 >= self.blocks.len() {
            return Err(EditError::DanglingBlock(block));
        }
        if index > self.order.len() || self.order.contains(&block) {
            return Err(EditError::Corrupted(format!(
                "cannot insert {block} at index {index}"
            )));
        }
        self.order.insert(index, block);
        Ok(())
    }

    pub(crate) fn detach_block(&mut self, index: usize, block: BlockId) -> EditResult<()> {
        if self.order.get(index) != Some(&block) {
            return Err(EditError::Corrupted(format!(
                "{block} is not at index {index}"
            )));
        }
        self.order.remove(index);
        Ok(())
    }

    pub(crate) fn attach_inline(
        &mut self,
        paragraph: BlockId,
        index: usize,
        inline: InlineId,
    ) -> EditResult<()> {
        if let Some(owner) = self.inline_ref(inline)?.paragraph {
            return Err(EditError::Corrupted(format!(
                "{inline} is already attached to {owner}"
            )));
        }
        let target = self.paragraph_mut(paragraph)?;
        if index > target.inlines.len() {
            return Err(EditError::Corrupted(format!(
                "cannot insert {inline} at index {index} of {paragraph}"
            )));
        }
        target.inlines.insert(index, inline);
        self.inlines[inline.0].paragraph = Some(paragraph);
        Ok(())
    }

    pub(crate) fn detach_inline(
        &mut self,
        paragraph: BlockId,
        index: usize,
        inline: InlineId,
    ) -> EditResult<()> {
        self.inline_ref(inline)?;
        let target = self.paragraph_mut(paragraph)?;
        if target.inlines.get(index) != Some(&inline) {
            return Err(EditError::Corrupted(format!(
                "{inline} is not at index {index} of {paragraph}"
            )));
        }
        target.inlines.remove(index);
        self.inlines[inline.0].paragraph = None;
        Ok(())
    }

    pub(crate) fn set_run_text(&mut self, run: InlineId, text: String) -> EditResult<()> {
        self.run_mut(run)?.text = text;
        Ok(())
    }

    // Derived positions

    /// Refresh cached block and inline positions from `block_index` onward
    pub fn recompute_from(&mut self, block_index: usize) {
        let block_index = block_index.min(self.order.len());
        let mut start = match block_index.checked_sub(1).and_then(|i| self.order.get(i)) {
            Some(prev) => {
                let prev = &self.blocks[prev.0];
                prev.start_in_doc + prev.length
            }
            None => 0,
        };
        for id in &self.order[block_index..] {
            let block = &mut self.blocks[id.0];
            let mut local = 0;
            for inline_id in &block.paragraph().inlines {
                let inline = &mut self.inlines[inline_id.0];
                inline.start_in_paragraph = local;
                local += inline.content.span_len();
            }
            block.start_in_doc = start;
            block.length = local + 1;
            start += block.length;
        }
    }

    /// Flat offset one past the last paragraph boundary unit
    pub fn doc_end(&self) -> usize {
        self.block_at(self.order.len().saturating_sub(1))
            .map(|b| b.start_in_doc + b.length)
            .unwrap_or(0)
    }

    /// Largest offset a caret or range endpoint may take
    pub fn caret_max(&self) -> usize {
        self.doc_end().saturating_sub(1)
    }

    /// Attached paragraph whose span contains `offset`
    pub fn paragraph_containing(&self, offset: usize) -> Option<BlockId> {
        let offset = offset.min(self.caret_max());
        self.blocks()
            .find(|b| offset < b.start_in_doc + b.length)
            .map(Block::id)
    }

    // Text queries

    /// Flat document text, each paragraph followed by `\r`
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in self.blocks() {
            for id in &block.paragraph().inlines {
                self.inlines[id.0].content.push_flat_text(&mut out);
            }
            out.push(PARAGRAPH_SEPARATOR);
        }
        out
    }

    /// Flat text of `[start, end)`
    pub fn text_in(&self, start: usize, end: usize) -> EditResult<String> {
        if start > end {
            return Err(EditError::InvertedRange { start, end });
        }
        if end > self.doc_end() {
            return Err(EditError::OffsetOutOfRange {
                offset: end,
                doc_end: self.doc_end(),
            });
        }
        Ok(self.text().chars().skip(start).take(end - start).collect())
    }

    /// Flat text of one paragraph without its boundary unit
    pub fn paragraph_text(&self, paragraph: BlockId) -> EditResult<String> {
        let mut out = String::new();
        for id in &self.paragraph_ref(paragraph)?.inlines {
            self.inline_ref(*id)?.content.push_flat_text(&mut out);
        }
        Ok(out)
    }

    /// Style of the run nearest to `index`, searching backward then forward
    pub fn run_style_near(&self, paragraph: BlockId, index: usize) -> EditResult<RunStyle> {
        let inlines = &self.paragraph_ref(paragraph)?.inlines;
        let run_at = |i: usize| {
            inlines
                .get(i)
                .and_then(|id| self.inlines.get(id.0))
                .and_then(|inline| inline.content.as_run())
        };
        let before = (0..=index.min(inlines.len())).rev().find_map(run_at);
        let found = before.or_else(|| (index + 1..inlines.len()).find_map(run_at));
        Ok(found
            .map(|run| run.style.clone())
            .unwrap_or_else(|| self.default_run_style.clone()))
    }

    // Selection and notifications

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Build a selection over `[start, end)` with owning paragraphs filled in
    pub fn selection_at(&self, start: usize, end: usize) -> Selection {
        Selection {
            start,
            end,
            start_paragraph: self.paragraph_containing(start),
            end_paragraph: self.paragraph_containing(end),
            ..Selection::default()
        }
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        if self.selection != selection {
            self.changes.selection_changed = true;
        }
        self.selection = selection;
    }

    pub fn ranges(&self) -> &RangeTracker {
        &self.ranges
    }

    pub(crate) fn mark_dirty<I: IntoIterator<Item = BlockId>>(&mut self, paragraphs: I) {
        self.changes.dirty_paragraphs.extend(paragraphs);
    }

    pub(crate) fn note_disposed(&mut self, ranges: &[RangeId]) {
        self.changes.disposed_ranges.extend_from_slice(ranges);
    }

    /// Drain notifications batched since the last call
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            paragraphs: self
                .blocks()
                .map(|block| ParagraphSnapshot {
                    id: block.id,
                    style: block.paragraph().style.clone(),
                    inlines: block
                        .paragraph()
                        .inlines
                        .iter()
                        .map(|id| (*id, self.inlines[id.0].content.clone()))
                        .collect(),
                })
                .collect(),
            selection: self.selection.clone(),
            ranges: self
                .ranges
                .iter()
                .map(|(id, range)| (id, range.start, range.end))
                .collect(),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, block) in self.blocks().enumerate() {
            write!(f, "P{index}:")?;
            for id in &block.paragraph().inlines {
                match &self.inlines[id.0].content {
                    InlineContent::Run(run) => {
                        write!(f, " {:?}", run.text)?;
                        let markers = run.style.markers();
                        if !markers.is_empty() {
                            write!(f, "[{}]", markers.join(","))?;
                        }
                    }
                    InlineContent::LineBreak => write!(f, " <br>")?,
                    InlineContent::UiObject(object) => write!(f, " <obj:{}>", object.name)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// Structured Editor
// The editing surface callers drive: insertions and deletions at the
// selection, formatting, undo/redo, tracked ranges and change notifications

use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::history::History;
use crate::richtext::atomic_edit::AtomicEdit;
use crate::richtext::edit_action::EditAction;
use crate::richtext::edit_builder::{self, byte_index};
use crate::richtext::formatting::RunFormat;
use crate::richtext::structured_document::{
    BlockId, ChangeSet, Document, InlineContent, InlineId, LINE_BREAK_CHAR, PARAGRAPH_SEPARATOR,
};
use crate::richtext::style::RunStyle;
use crate::richtext::text_range::{RangeId, Selection, TextRange};
use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// An in-progress run of keystrokes that later keystrokes fold into
#[derive(Debug, Clone, Copy)]
struct TypingState {
    run: InlineId,
    paragraph: BlockId,
    caret: usize,
}

#[derive(Debug)]
pub struct Editor {
    document: Document,
    history: History,
    typing: Option<TypingState>,
    pending_style: Option<RunStyle>,
    coalesce_typing: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor over an empty document
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        let document = Document::with_defaults(
            config.default_run_style.clone(),
            config.default_paragraph_style.clone(),
        );
        Editor {
            document,
            history: History::with_max_depth(config.history.max_undo_depth),
            typing: None,
            pending_style: None,
            coalesce_typing: config.history.coalesce_typing,
        }
    }

    /// Create an editor with an existing document
    pub fn from_document(document: Document) -> Self {
        Editor {
            document,
            history: History::new(),
            typing: None,
            pending_style: None,
            coalesce_typing: true,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        self.document.selection()
    }

    /// Flat document text
    pub fn text(&self) -> String {
        self.document.text()
    }

    /// Flat text of `[start, end)`
    pub fn get_text(&self, start: usize, end: usize) -> EditResult<String> {
        self.document.text_in(start, end)
    }

    // Selection

    /// Select `[start, end)`. Moving the selection ends any typing run and
    /// drops a pending format.
    pub fn select(&mut self, start: usize, end: usize) -> EditResult<()> {
        self.check_range(start, end)?;
        let selection = self.document.selection_at(start, end);
        self.move_selection(selection);
        Ok(())
    }

    pub fn set_caret(&mut self, offset: usize) -> EditResult<()> {
        self.select(offset, offset)
    }

    pub fn select_all(&mut self) {
        let selection = self.document.selection_at(0, self.document.caret_max());
        self.move_selection(selection);
    }

    /// Set which inline a caret on an inline edge attaches to
    pub fn set_bias(&mut self, start_forward: bool, end_forward: bool) {
        let mut selection = self.document.selection().clone();
        selection.start_bias_forward = start_forward;
        selection.end_bias_forward = end_forward;
        self.move_selection(selection);
    }

    fn move_selection(&mut self, selection: Selection) {
        self.typing = None;
        self.pending_style = None;
        self.document.set_selection(selection);
    }

    // Insertion

    /// Insert text at the selection, replacing it. `\n` and `\r\n` start a
    /// new paragraph like `\r` does.
    pub fn insert_text(&mut self, text: &str) -> EditResult<()> {
        let text = normalize_newlines(text);
        if text.is_empty() {
            return Ok(());
        }
        if self.try_coalesce(&text)? {
            return Ok(());
        }

        let selection = self.document.selection().clone();
        let style = match self.pending_style.take() {
            Some(style) => style,
            None => self.insertion_style(&selection)?,
        };
        let keystroke = selection.is_collapsed() && text.chars().count() == 1;
        let action = edit_builder::build_replace_range(
            &mut self.document,
            selection.start,
            selection.end,
            vec![InlineContent::run(text, style)],
        )?;
        let Some(action) = action else {
            return Ok(());
        };
        let run = action.typing_run();
        self.commit(action, "insert_text")?;

        if keystroke
            && let Some(run) = run
            && let Some(paragraph) = self.document.inline(run).and_then(|i| i.paragraph())
        {
            self.typing = Some(TypingState {
                run,
                paragraph,
                caret: self.document.selection().start,
            });
        }
        Ok(())
    }

    /// Fold a keystroke into the typing action on top of the undo stack.
    /// The live run text is spliced directly; the builder is bypassed.
    fn try_coalesce(&mut self, text: &str) -> EditResult<bool> {
        if !self.coalesce_typing
            || self.pending_style.is_some()
            || text.chars().count() != 1
            || text.contains(PARAGRAPH_SEPARATOR)
        {
            return Ok(false);
        }
        let Some(state) = self.typing else {
            return Ok(false);
        };
        let selection = self.document.selection();
        if !selection.is_collapsed() || selection.start != state.caret {
            return Ok(false);
        }
        let Some(inline) = self.document.inline(state.run) else {
            return Ok(false);
        };
        let Some(block) = self.document.block(state.paragraph) else {
            return Ok(false);
        };
        if inline.paragraph() != Some(state.paragraph) {
            return Ok(false);
        }
        let Some(run) = inline.content.as_run() else {
            return Ok(false);
        };
        let local = state
            .caret
            .checked_sub(block.start_in_doc() + inline.start_in_paragraph());
        let Some(local) = local.filter(|local| *local <= run.char_len()) else {
            return Ok(false);
        };
        let Some(action) = self.history.last_undo_mut() else {
            return Ok(false);
        };
        if action.typing_run() != Some(state.run) {
            return Ok(false);
        }

        let mut new_text = run.text.clone();
        new_text.insert_str(byte_index(&run.text, local), text);
        self.document.set_run_text(state.run, new_text.clone())?;
        let mut shift = AtomicEdit::shift_text_ranges(state.caret, 1);
        shift.apply(&mut self.document)?;
        let refresh_from = self.document.require_block_index(state.paragraph)?;
        self.document.recompute_from(refresh_from);

        let caret = state.caret + 1;
        let selection = self.document.selection_at(caret, caret);
        self.document.set_selection(selection.clone());
        self.document.mark_dirty([state.paragraph]);
        action.absorb_keystroke(new_text, shift, selection);
        debug!(target: "flowdoc::editor", caret, edits = action.len(), "coalesced keystroke");

        self.typing = Some(TypingState { caret, ..state });
        Ok(true)
    }

    /// Split the paragraph at the selection (Enter)
    pub fn insert_paragraph(&mut self) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        let style = self.insertion_style(&selection)?;
        let content = vec![InlineContent::run(PARAGRAPH_SEPARATOR.to_string(), style)];
        self.replace_with(selection.start, selection.end, content, "insert_paragraph")
    }

    pub fn insert_line_break(&mut self) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        self.replace_with(
            selection.start,
            selection.end,
            vec![InlineContent::LineBreak],
            "insert_line_break",
        )
    }

    /// Insert an embedded object placeholder
    pub fn insert_object(&mut self, name: &str) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        self.replace_with(
            selection.start,
            selection.end,
            vec![InlineContent::object(name)],
            "insert_object",
        )
    }

    fn insertion_style(&self, selection: &Selection) -> EditResult<RunStyle> {
        // replacing a selection continues the style of its first character
        let bias_forward = !selection.is_collapsed() || selection.start_bias_forward;
        self.document.style_at(selection.start, bias_forward)
    }

    // Deletion

    /// Delete one grapheme cluster (or one paragraph boundary) before the
    /// caret when `backspace` is set, after it otherwise. A non-empty
    /// selection is deleted instead.
    pub fn delete_char(&mut self, backspace: bool) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        if !selection.is_collapsed() {
            return self.delete_selection();
        }
        let caret = selection.start;
        let (start, end) = if backspace {
            if caret == 0 {
                return Ok(false);
            }
            (self.grapheme_before(caret)?, caret)
        } else {
            if caret >= self.document.caret_max() {
                return Ok(false);
            }
            (caret, self.grapheme_after(caret)?)
        };
        self.replace_with(start, end, Vec::new(), "delete_char")
    }

    /// Delete to the previous (`backward`) or next word boundary inside the
    /// paragraph, skipping whitespace next to the caret first. At a
    /// paragraph edge this deletes the paragraph boundary like `delete_char`.
    pub fn delete_word(&mut self, backward: bool) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        if !selection.is_collapsed() {
            return self.delete_selection();
        }
        let caret = selection.start;
        let (paragraph_start, text) = self.paragraph_around(caret)?;
        let local = caret - paragraph_start;
        let len = text.chars().count();
        if (backward && local == 0) || (!backward && local >= len) {
            return self.delete_char(backward);
        }
        let (start, end) = if backward {
            (paragraph_start + word_stop_before(&text, local), caret)
        } else {
            (caret, paragraph_start + word_stop_after(&text, local))
        };
        self.replace_with(start, end, Vec::new(), "delete_word")
    }

    /// Delete the selected range. Returns false for a collapsed selection.
    pub fn delete_selection(&mut self) -> EditResult<bool> {
        let selection = self.document.selection().clone();
        if selection.is_collapsed() {
            return Ok(false);
        }
        self.replace_with(selection.start, selection.end, Vec::new(), "delete_selection")
    }

    fn grapheme_before(&self, caret: usize) -> EditResult<usize> {
        let (paragraph_start, text) = self.paragraph_around(caret)?;
        let local = caret - paragraph_start;
        if local == 0 {
            return Ok(caret - 1);
        }
        let stop = grapheme_stops(&text)
            .into_iter()
            .rev()
            .find(|stop| *stop < local)
            .unwrap_or(0);
        Ok(paragraph_start + stop)
    }

    fn grapheme_after(&self, caret: usize) -> EditResult<usize> {
        let (paragraph_start, text) = self.paragraph_around(caret)?;
        let local = caret - paragraph_start;
        let stop = grapheme_stops(&text).into_iter().find(|stop| *stop > local);
        Ok(match stop {
            Some(stop) => paragraph_start + stop,
            // at the paragraph end the boundary unit goes
            None => caret + 1,
        })
    }

    fn paragraph_around(&self, caret: usize) -> EditResult<(usize, String)> {
        let paragraph = self
            .document
            .paragraph_containing(caret)
            .ok_or(EditError::EmptyDocument)?;
        let block = self
            .document
            .block(paragraph)
            .ok_or(EditError::DanglingBlock(paragraph))?;
        Ok((block.start_in_doc(), self.document.paragraph_text(paragraph)?))
    }

    // Replace and execute

    /// Replace `[start, end)` with inline content and record the change.
    /// Returns false when there was nothing to do.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        content: Vec<InlineContent>,
    ) -> EditResult<bool> {
        self.replace_with(start, end, content, "replace_range")
    }

    /// Build the replace action without running it
    pub fn build_replace_range(
        &mut self,
        start: usize,
        end: usize,
        content: Vec<InlineContent>,
    ) -> EditResult<Option<EditAction>> {
        edit_builder::build_replace_range(&mut self.document, start, end, content)
    }

    /// Run a previously built action and record it for undo
    pub fn execute_edit(&mut self, action: EditAction) -> EditResult<()> {
        self.commit(action, "execute_edit")
    }

    fn replace_with(
        &mut self,
        start: usize,
        end: usize,
        content: Vec<InlineContent>,
        op: &'static str,
    ) -> EditResult<bool> {
        match edit_builder::build_replace_range(&mut self.document, start, end, content)? {
            Some(action) => {
                self.commit(action, op)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit(&mut self, mut action: EditAction, op: &'static str) -> EditResult<()> {
        self.typing = None;
        self.pending_style = None;
        action.apply(&mut self.document)?;
        let selection = self.document.selection();
        debug!(
            target: "flowdoc::editor",
            op,
            kind = ?action.kind(),
            edits = action.len(),
            selection = ?(selection.start, selection.end),
            "executed"
        );
        self.history.push(action);
        Ok(())
    }

    // Undo/redo

    /// Undo the last action. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> EditResult<bool> {
        self.typing = None;
        self.pending_style = None;
        self.history.undo(&mut self.document)
    }

    /// Redo the last undone action. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> EditResult<bool> {
        self.typing = None;
        self.pending_style = None;
        self.history.redo(&mut self.document)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    // Formatting

    /// Apply `format` to every run in `[start, end)`. Returns false when no
    /// run is covered.
    pub fn apply_formatting(&mut self, start: usize, end: usize, format: &RunFormat) -> EditResult<bool> {
        match edit_builder::build_format_range(&mut self.document, start, end, format)? {
            Some(action) => {
                self.commit(action, "apply_formatting")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply `format` over the current extent of a tracked range
    pub fn apply_formatting_to_range(&mut self, id: RangeId, format: &RunFormat) -> EditResult<bool> {
        let range = self.range(id).ok_or(EditError::UnknownRange(id))?;
        self.apply_formatting(range.start, range.end, format)
    }

    pub fn toggle_bold(&mut self) -> EditResult<()> {
        self.toggle(RunFormat::bold())
    }

    pub fn toggle_italic(&mut self) -> EditResult<()> {
        self.toggle(RunFormat::italic())
    }

    pub fn toggle_underline(&mut self) -> EditResult<()> {
        self.toggle(RunFormat::underline())
    }

    /// Over a selection this formats the covered runs. At a collapsed caret
    /// it changes the pending format the next insertion uses.
    fn toggle(&mut self, format: RunFormat) -> EditResult<()> {
        let selection = self.document.selection().clone();
        if !selection.is_collapsed() {
            self.apply_formatting(selection.start, selection.end, &format)?;
            return Ok(());
        }
        let mut style = self.caret_formatting()?;
        match format.toggled_off() {
            Some(off) if format.is_set_on(&style) => off.apply_to(&mut style),
            _ => format.apply_to(&mut style),
        }
        debug!(target: "flowdoc::editor", ?format, "pending format");
        self.typing = None;
        self.pending_style = Some(style);
        Ok(())
    }

    /// Style a caret at `offset` would type with
    pub fn formatting_at(&self, offset: usize, bias_forward: bool) -> EditResult<RunStyle> {
        self.check_range(offset, offset)?;
        self.document.style_at(offset, bias_forward)
    }

    /// Style the next insertion at the caret uses, pending format included
    pub fn caret_formatting(&self) -> EditResult<RunStyle> {
        if let Some(style) = &self.pending_style {
            return Ok(style.clone());
        }
        let selection = self.document.selection();
        self.document.style_at(selection.start, selection.start_bias_forward)
    }

    // Tracked ranges

    pub fn create_range(&mut self, start: usize, end: usize) -> EditResult<RangeId> {
        self.check_range(start, end)?;
        Ok(self.document.ranges.create(start, end))
    }

    pub fn dispose_range(&mut self, id: RangeId) -> bool {
        self.document.ranges.dispose(id)
    }

    pub fn range(&self, id: RangeId) -> Option<TextRange> {
        self.document.ranges().get(id)
    }

    /// Format every non-empty match of `pattern` in the flat text, one undo
    /// entry per match. Returns how many matches were formatted.
    pub fn highlight_matches(&mut self, pattern: &str, format: &RunFormat) -> EditResult<usize> {
        let regex = Regex::new(pattern)?;
        format.validate()?;
        let text = self.document.text();
        let caret_max = self.document.caret_max();

        let mut ids = Vec::new();
        let (mut byte, mut chars) = (0, 0);
        for found in regex.find_iter(&text) {
            chars += text[byte..found.start()].chars().count();
            let start = chars;
            chars += found.as_str().chars().count();
            byte = found.end();
            let end = chars.min(caret_max);
            if start < end {
                ids.push(self.document.ranges.create(start, end));
            }
        }

        let mut formatted = 0;
        let result: EditResult<()> = ids.iter().try_for_each(|id| {
            if self.apply_formatting_to_range(*id, format)? {
                formatted += 1;
            }
            Ok(())
        });
        for id in ids {
            self.document.ranges.dispose(id);
        }
        result?;
        debug!(target: "flowdoc::editor", pattern, formatted, "highlighted matches");
        Ok(formatted)
    }

    /// Drain notifications batched since the last call
    pub fn take_changes(&mut self) -> ChangeSet {
        self.document.take_changes()
    }

    fn check_range(&self, start: usize, end: usize) -> EditResult<()> {
        if start > end {
            return Err(EditError::InvertedRange { start, end });
        }
        if end > self.document.caret_max() {
            return Err(EditError::OffsetOutOfRange {
                offset: end,
                doc_end: self.document.doc_end(),
            });
        }
        Ok(())
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\r").replace('\n', "\r")
}

/// Char offsets where grapheme clusters start, plus the text length
fn grapheme_stops(text: &str) -> Vec<usize> {
    let mut stops = Vec::new();
    let mut chars = 0;
    for grapheme in text.graphemes(true) {
        stops.push(chars);
        chars += grapheme.chars().count();
    }
    stops.push(chars);
    stops
}

/// `(start, end)` char offsets of each word-boundary segment
fn word_segments(text: &str) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut chars = 0;
    for (_, segment) in text.split_word_bound_indices() {
        let len = segment.chars().count();
        segments.push((chars, chars + len));
        chars += len;
    }
    segments
}

/// Whitespace a word deletion may swallow; a line break stops it
fn skippable(c: char) -> bool {
    c != LINE_BREAK_CHAR && c.is_whitespace()
}

fn word_stop_before(text: &str, local: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let from = local.min(chars.len());
    let mut i = from;
    while i > 0 && skippable(chars[i - 1]) {
        i -= 1;
    }
    if i == 0 {
        return 0;
    }
    if chars[i - 1] == LINE_BREAK_CHAR {
        return if i == from { i - 1 } else { i };
    }
    word_segments(text)
        .into_iter()
        .find(|(start, end)| *start < i && i <= *end)
        .map(|(start, _)| start)
        .unwrap_or(i - 1)
}

fn word_stop_after(text: &str, local: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut i = local;
    while i < chars.len() && skippable(chars[i]) {
        i += 1;
    }
    if i >= chars.len() {
        return chars.len();
    }
    if chars[i] == LINE_BREAK_CHAR {
        return if i == local { i + 1 } else { i };
    }
    word_segments(text)
        .into_iter()
        .find(|(start, end)| *start <= i && i < *end)
        .map(|(_, end)| end)
        .unwrap_or(i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::style::Color;

    #[test]
    fn test_insert_text() {
        let mut editor = Editor::new();
        editor.insert_text("Hello").unwrap();
        assert_eq!(editor.text(), "Hello\r");
        assert_eq!(editor.selection().start, 5);
    }

    #[test]
    fn test_typing_coalesces_into_one_entry() {
        let mut editor = Editor::new();
        editor.insert_text("a").unwrap();
        editor.insert_text("b").unwrap();
        editor.insert_text("c").unwrap();
        assert_eq!(editor.text(), "abc\r");
        assert_eq!(editor.undo_count(), 1);

        editor.undo().unwrap();
        assert_eq!(editor.text(), "\r");
        assert_eq!(editor.selection().start, 0);

        editor.redo().unwrap();
        assert_eq!(editor.text(), "abc\r");
        assert_eq!(editor.selection().start, 3);
    }

    #[test]
    fn test_caret_move_breaks_coalescing() {
        let mut editor = Editor::new();
        editor.insert_text("a").unwrap();
        editor.set_caret(0).unwrap();
        editor.insert_text("b").unwrap();
        assert_eq!(editor.text(), "ba\r");
        assert_eq!(editor.undo_count(), 2);
    }

    #[test]
    fn test_coalescing_can_be_disabled() {
        let mut config = EditorConfig::default();
        config.history.coalesce_typing = false;
        let mut editor = Editor::with_config(&config);
        editor.insert_text("a").unwrap();
        editor.insert_text("b").unwrap();
        assert_eq!(editor.undo_count(), 2);
    }

    #[test]
    fn test_coalesced_typing_shifts_ranges() {
        let mut editor = Editor::from_document(Document::from_plain_text("xy"));
        let tail = editor.create_range(1, 2).unwrap();
        editor.set_caret(1).unwrap();
        editor.insert_text("a").unwrap();
        editor.insert_text("b").unwrap();
        assert_eq!(editor.range(tail), Some(TextRange::new(3, 4)));
        editor.undo().unwrap();
        assert_eq!(editor.range(tail), Some(TextRange::new(1, 2)));
    }

    #[test]
    fn test_newline_in_text_splits_paragraph() {
        let mut editor = Editor::new();
        editor.insert_text("Hello\nWorld").unwrap();
        assert_eq!(editor.document().block_count(), 2);
        assert_eq!(editor.text(), "Hello\rWorld\r");
    }

    #[test]
    fn test_insert_paragraph_then_backspace_merges() {
        let mut editor = Editor::new();
        editor.insert_text("ab").unwrap();
        editor.set_caret(1).unwrap();
        editor.insert_paragraph().unwrap();
        assert_eq!(editor.text(), "a\rb\r");
        assert_eq!(editor.selection().start, 2);

        editor.delete_char(true).unwrap();
        assert_eq!(editor.text(), "ab\r");
        assert_eq!(editor.document().block_count(), 1);
    }

    #[test]
    fn test_forward_delete_at_paragraph_end_merges() {
        let mut editor = Editor::from_document(Document::from_plain_text("a\rb"));
        editor.set_caret(1).unwrap();
        assert!(editor.delete_char(false).unwrap());
        assert_eq!(editor.text(), "ab\r");
    }

    #[test]
    fn test_delete_at_document_edges_is_noop() {
        let mut editor = Editor::from_document(Document::from_plain_text("ab"));
        assert!(!editor.delete_char(true).unwrap());
        editor.set_caret(2).unwrap();
        assert!(!editor.delete_char(false).unwrap());
        assert_eq!(editor.undo_count(), 0);
    }

    #[test]
    fn test_backspace_removes_whole_grapheme() {
        let mut editor = Editor::from_document(Document::from_plain_text("ae\u{301}"));
        editor.set_caret(3).unwrap();
        editor.delete_char(true).unwrap();
        assert_eq!(editor.text(), "a\r");
    }

    #[test]
    fn test_delete_word() {
        let mut editor = Editor::from_document(Document::from_plain_text("hello big world"));
        editor.set_caret(15).unwrap();
        editor.delete_word(true).unwrap();
        assert_eq!(editor.text(), "hello big \r");
        editor.delete_word(true).unwrap();
        assert_eq!(editor.text(), "hello \r");

        editor.set_caret(0).unwrap();
        editor.delete_word(false).unwrap();
        assert_eq!(editor.text(), " \r");
    }

    #[test]
    fn test_delete_selection() {
        let mut editor = Editor::from_document(Document::from_plain_text("abc\rdef"));
        assert!(!editor.delete_selection().unwrap());
        editor.select(2, 5).unwrap();
        assert!(editor.delete_selection().unwrap());
        assert_eq!(editor.text(), "abef\r");
        assert_eq!(editor.selection().start, 2);
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut editor = Editor::from_document(Document::from_plain_text("hello"));
        editor.select(1, 4).unwrap();
        editor.insert_text("i").unwrap();
        assert_eq!(editor.text(), "hio\r");
        editor.undo().unwrap();
        assert_eq!(editor.text(), "hello\r");
        assert_eq!(editor.selection().range(), TextRange::new(1, 4));
    }

    #[test]
    fn test_line_break_and_object() {
        let mut editor = Editor::new();
        editor.insert_text("a").unwrap();
        editor.insert_line_break().unwrap();
        editor.insert_object("chart").unwrap();
        assert_eq!(editor.document().to_string(), "P0: \"a\" <br> <obj:chart>\n");
        assert_eq!(editor.get_text(1, 3).unwrap(), "\u{000B}\u{FFFC}");
    }

    #[test]
    fn test_toggle_bold_over_selection() {
        let mut editor = Editor::from_document(Document::from_plain_text("abc"));
        editor.select(0, 2).unwrap();
        editor.toggle_bold().unwrap();
        assert_eq!(editor.document().to_string(), "P0: \"ab\"[b] \"c\"\n");
        editor.toggle_bold().unwrap();
        assert_eq!(editor.document().to_string(), "P0: \"ab\" \"c\"\n");
        assert_eq!(editor.undo_count(), 2);
    }

    #[test]
    fn test_toggle_at_caret_sets_pending_format() {
        let mut editor = Editor::new();
        editor.insert_text("a").unwrap();
        editor.toggle_bold().unwrap();
        assert!(editor.caret_formatting().unwrap().is_bold());
        editor.insert_text("bc").unwrap();
        assert_eq!(editor.document().to_string(), "P0: \"a\" \"bc\"[b]\n");
        assert_eq!(editor.undo_count(), 2);
    }

    #[test]
    fn test_caret_move_clears_pending_format() {
        let mut editor = Editor::new();
        editor.insert_text("a").unwrap();
        editor.toggle_italic().unwrap();
        editor.set_caret(1).unwrap();
        assert!(!editor.caret_formatting().unwrap().is_italic());
    }

    #[test]
    fn test_format_without_runs_adds_no_entry() {
        let mut editor = Editor::from_document(Document::from_plain_text("ab\rcd"));
        assert!(!editor.apply_formatting(2, 3, &RunFormat::bold()).unwrap());
        assert_eq!(editor.undo_count(), 0);
    }

    #[test]
    fn test_formatting_at() {
        let mut editor = Editor::from_document(Document::from_plain_text("abcd"));
        editor.apply_formatting(0, 2, &RunFormat::Foreground(Color::rgb(255, 0, 0))).unwrap();
        assert_eq!(editor.formatting_at(2, false).unwrap().foreground, Color::rgb(255, 0, 0));
        assert_eq!(editor.formatting_at(2, true).unwrap().foreground, Color::BLACK);
        assert!(editor.formatting_at(9, false).is_err());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut editor = Editor::new();
        editor.insert_text("ab").unwrap();
        editor.undo().unwrap();
        assert_eq!(editor.redo_count(), 1);
        editor.insert_text("c").unwrap();
        assert_eq!(editor.redo_count(), 0);
    }

    #[test]
    fn test_build_then_execute() {
        let mut editor = Editor::from_document(Document::from_plain_text("abc"));
        let action = editor
            .build_replace_range(0, 1, vec![InlineContent::run("X", RunStyle::default())])
            .unwrap()
            .unwrap();
        assert_eq!(editor.text(), "abc\r");
        editor.execute_edit(action).unwrap();
        assert_eq!(editor.text(), "Xbc\r");
        assert!(editor.can_undo());
    }

    #[test]
    fn test_apply_formatting_to_unknown_range() {
        let mut editor = Editor::from_document(Document::from_plain_text("abc"));
        let id = editor.create_range(0, 1).unwrap();
        assert!(editor.dispose_range(id));
        assert!(matches!(
            editor.apply_formatting_to_range(id, &RunFormat::bold()),
            Err(EditError::UnknownRange(_))
        ));
    }

    #[test]
    fn test_highlight_matches() {
        let mut editor = Editor::from_document(Document::from_plain_text("one two\rtwo three"));
        let format = RunFormat::Background(Some(Color::YELLOW));
        assert_eq!(editor.highlight_matches("two", &format).unwrap(), 2);
        assert_eq!(editor.undo_count(), 2);
        assert!(editor.document().ranges().is_empty());
        assert_eq!(
            editor.document().to_string(),
            "P0: \"one \" \"two\"[bg=#FFFF00]\nP1: \"two\"[bg=#FFFF00] \" three\"\n"
        );
        assert!(matches!(
            editor.highlight_matches("(", &format),
            Err(EditError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_highlight_matches_failure_disposes_ranges() {
        let mut editor = Editor::from_document(Document::from_plain_text("one two\rtwo three"));
        assert!(matches!(
            editor.highlight_matches("two", &RunFormat::FontSize(0.0)),
            Err(EditError::UnsupportedFormat(_))
        ));
        assert!(editor.document().ranges().is_empty());
        assert_eq!(editor.undo_count(), 0);
    }

    #[test]
    fn test_take_changes_reports_dirty_paragraphs() {
        let mut editor = Editor::from_document(Document::from_plain_text("a\rb"));
        editor.take_changes();
        editor.set_caret(3).unwrap();
        editor.insert_text("c").unwrap();
        let changes = editor.take_changes();
        assert!(changes.selection_changed);
        assert_eq!(
            changes.dirty_paragraphs.into_iter().collect::<Vec<_>>(),
            vec![editor.document().block_ids()[1]]
        );
        assert!(editor.take_changes().is_empty());
    }

    #[test]
    fn test_select_rejects_bad_ranges() {
        let mut editor = Editor::from_document(Document::from_plain_text("abc"));
        assert!(matches!(editor.select(2, 1), Err(EditError::InvertedRange { .. })));
        assert!(matches!(editor.select(0, 4), Err(EditError::OffsetOutOfRange { .. })));
        editor.select_all();
        assert_eq!(editor.selection().range(), TextRange::new(0, 3));
    }

    #[test]
    fn test_word_stops() {
        assert_eq!(word_stop_before("foo bar", 7), 4);
        assert_eq!(word_stop_before("foo bar", 4), 0);
        assert_eq!(word_stop_after("foo bar", 0), 3);
        assert_eq!(word_stop_after("foo bar", 3), 7);
    }

    #[test]
    fn test_word_stops_at_line_break() {
        let text = format!("ab{LINE_BREAK_CHAR}  cd");
        assert_eq!(word_stop_before(&text, 3), 2);
        assert_eq!(word_stop_before(&text, 5), 3);
        assert_eq!(word_stop_before(&text, 7), 5);
        assert_eq!(word_stop_after(&text, 2), 3);
        assert_eq!(word_stop_after("ab  \u{000B}cd", 2), 4);
    }

    #[test]
    fn test_delete_word_next_to_line_break() {
        let mut editor = Editor::from_document(Document::from_paragraphs(vec![vec![
            InlineContent::run("one two", RunStyle::default()),
            InlineContent::LineBreak,
            InlineContent::run("three", RunStyle::default()),
        ]]));
        editor.set_caret(13).unwrap();
        editor.delete_word(true).unwrap();
        assert_eq!(editor.text(), "one two\u{000B}\r");
        editor.delete_word(true).unwrap();
        assert_eq!(editor.text(), "one two\r");

        editor.undo().unwrap();
        editor.undo().unwrap();
        editor.set_caret(7).unwrap();
        editor.delete_word(false).unwrap();
        assert_eq!(editor.text(), "one twothree\r");
    }
}

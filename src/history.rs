// Undo/redo history of edit actions

use crate::error::EditResult;
use crate::richtext::edit_action::EditAction;
use crate::richtext::structured_document::Document;
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_MAX_UNDO_DEPTH: usize = 1000;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<EditAction>,
    redo: Vec<EditAction>,
    // 0 means unlimited
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_UNDO_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Record an action that was just executed.
    /// This clears any redo history.
    pub fn push(&mut self, action: EditAction) {
        self.redo.clear();
        self.push_undo(action);
    }

    fn push_undo(&mut self, action: EditAction) {
        self.undo.push_back(action);
        while self.max_depth > 0 && self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }

    /// Undo the most recent action.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> EditResult<bool> {
        let Some(mut action) = self.undo.pop_back() else {
            return Ok(false);
        };
        action.unapply(doc)?;
        debug!(target: "flowdoc::history", kind = ?action.kind(), edits = action.len(), "undo");
        self.redo.push(action);
        Ok(true)
    }

    /// Redo the most recently undone action.
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> EditResult<bool> {
        let Some(mut action) = self.redo.pop() else {
            return Ok(false);
        };
        action.apply(doc)?;
        debug!(target: "flowdoc::history", kind = ?action.kind(), edits = action.len(), "redo");
        self.push_undo(action);
        Ok(true)
    }

    /// The newest undo entry, for folding further keystrokes into it
    pub(crate) fn last_undo_mut(&mut self) -> Option<&mut EditAction> {
        self.undo.back_mut()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::edit_builder::build_replace_range;
    use crate::richtext::structured_document::InlineContent;
    use crate::richtext::style::RunStyle;

    fn insert(doc: &mut Document, history: &mut History, at: usize, text: &str) {
        let mut action = build_replace_range(doc, at, at, vec![InlineContent::run(text, RunStyle::default())])
            .unwrap()
            .unwrap();
        action.apply(doc).unwrap();
        history.push(action);
    }

    #[test]
    fn test_undo_and_redo() {
        let mut doc = Document::new();
        let mut history = History::new();

        insert(&mut doc, &mut history, 0, "page1");
        insert(&mut doc, &mut history, 5, " page2");
        assert_eq!(doc.text(), "page1 page2\r");
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(history.undo(&mut doc).unwrap());
        assert_eq!(doc.text(), "page1\r");
        assert!(history.can_redo());

        assert!(history.redo(&mut doc).unwrap());
        assert_eq!(doc.text(), "page1 page2\r");
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut doc = Document::new();
        let mut history = History::new();

        insert(&mut doc, &mut history, 0, "a");
        insert(&mut doc, &mut history, 1, "b");
        history.undo(&mut doc).unwrap();
        assert!(history.can_redo());

        insert(&mut doc, &mut history, 1, "c");
        assert!(!history.can_redo());
        assert_eq!(doc.text(), "ac\r");
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut doc = Document::from_plain_text("abc");
        let mut history = History::new();
        assert!(!history.undo(&mut doc).unwrap());
        assert!(!history.redo(&mut doc).unwrap());
        assert_eq!(doc.text(), "abc\r");
    }

    #[test]
    fn test_max_depth_evicts_oldest() {
        let mut doc = Document::new();
        let mut history = History::with_max_depth(3);

        for (i, c) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            insert(&mut doc, &mut history, i, c);
        }
        assert_eq!(history.undo_count(), 3);

        while history.undo(&mut doc).unwrap() {}
        // the two oldest insertions can no longer be undone
        assert_eq!(doc.text(), "ab\r");
    }

    #[test]
    fn test_clear() {
        let mut doc = Document::new();
        let mut history = History::new();
        insert(&mut doc, &mut history, 0, "a");
        history.clear();
        assert!(!history.can_undo());
        assert_eq!(doc.text(), "a\r");
    }
}

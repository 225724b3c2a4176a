// Edit Action
// One user-visible operation: ordered atomic edits plus the selection before
// and after, and what has to be refreshed once the edits ran.

use crate::error::EditResult;
use crate::richtext::atomic_edit::AtomicEdit;
use crate::richtext::structured_document::{BlockId, Document, InlineId};
use crate::richtext::text_range::{RangeId, Selection};

/// What produced an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Text spliced into an existing run at a collapsed caret
    Typing,
    Replace,
    Format,
}

#[derive(Debug, Clone)]
pub struct EditAction {
    kind: ActionKind,
    edits: Vec<AtomicEdit>,
    selection_before: Selection,
    selection_after: Selection,
    refresh_from: usize,
    refresh_paragraphs: Vec<BlockId>,
}

impl EditAction {
    pub(crate) fn new(
        kind: ActionKind,
        edits: Vec<AtomicEdit>,
        selection_before: Selection,
        selection_after: Selection,
        refresh_from: usize,
        refresh_paragraphs: Vec<BlockId>,
    ) -> Self {
        EditAction {
            kind,
            edits,
            selection_before,
            selection_after,
            refresh_from,
            refresh_paragraphs,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn edits(&self) -> &[AtomicEdit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn selection_before(&self) -> &Selection {
        &self.selection_before
    }

    pub fn selection_after(&self) -> &Selection {
        &self.selection_after
    }

    /// First block index whose cached positions need refreshing
    pub fn refresh_from(&self) -> usize {
        self.refresh_from
    }

    pub fn refresh_paragraphs(&self) -> &[BlockId] {
        &self.refresh_paragraphs
    }

    /// Net change in document length
    pub fn length_delta(&self) -> isize {
        self.edits.iter().map(AtomicEdit::length_delta).sum()
    }

    /// Run every edit in order, then restore the "after" selection
    pub fn apply(&mut self, doc: &mut Document) -> EditResult<()> {
        for edit in self.edits.iter_mut() {
            edit.apply(doc)?;
        }
        let disposed: Vec<RangeId> = self
            .edits
            .iter()
            .flat_map(|edit| edit.disposed_ranges().iter().copied())
            .collect();
        doc.note_disposed(&disposed);
        self.refresh(doc, self.selection_after.clone());
        Ok(())
    }

    /// Run every edit backwards, then restore the "before" selection
    pub fn unapply(&mut self, doc: &mut Document) -> EditResult<()> {
        for edit in self.edits.iter_mut().rev() {
            edit.unapply(doc)?;
        }
        self.refresh(doc, self.selection_before.clone());
        Ok(())
    }

    fn refresh(&self, doc: &mut Document, selection: Selection) {
        doc.recompute_from(self.refresh_from);
        doc.set_selection(selection);
        doc.mark_dirty(self.refresh_paragraphs.iter().copied());
    }

    /// Run spliced by a typing action
    pub(crate) fn typing_run(&self) -> Option<InlineId> {
        if self.kind != ActionKind::Typing {
            return None;
        }
        self.edits.iter().find_map(|edit| match edit {
            AtomicEdit::SetRunText { run, .. } => Some(*run),
            _ => None,
        })
    }

    /// Fold a further keystroke into this typing action. The run text has
    /// already been set to `text` and `shift` already applied.
    pub(crate) fn absorb_keystroke(&mut self, text: String, shift: AtomicEdit, selection_after: Selection) {
        for edit in self.edits.iter_mut() {
            if let AtomicEdit::SetRunText { new, .. } = edit {
                *new = text;
                break;
            }
        }
        self.edits.push(shift);
        self.selection_after = selection_after;
    }
}

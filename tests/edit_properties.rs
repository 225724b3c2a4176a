// Property tests: random edit sequences undo and redo exactly

use flowdoc::Editor;
use flowdoc::richtext::structured_document::Document;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(String),
    Backspace,
    Delete,
    DeleteWord(bool),
    Select(usize, usize),
    Enter,
    LineBreak,
    Object,
    Bold,
    Italic,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-c \\n]{1,4}".prop_map(Op::Insert),
        2 => Just(Op::Backspace),
        1 => Just(Op::Delete),
        1 => any::<bool>().prop_map(Op::DeleteWord),
        3 => (0usize..64, 0usize..64).prop_map(|(a, b)| Op::Select(a, b)),
        1 => Just(Op::Enter),
        1 => Just(Op::LineBreak),
        1 => Just(Op::Object),
        1 => Just(Op::Bold),
        1 => Just(Op::Italic),
    ]
}

fn run(editor: &mut Editor, op: &Op) {
    match op {
        Op::Insert(text) => editor.insert_text(text).unwrap(),
        Op::Backspace => {
            editor.delete_char(true).unwrap();
        }
        Op::Delete => {
            editor.delete_char(false).unwrap();
        }
        Op::DeleteWord(backward) => {
            editor.delete_word(*backward).unwrap();
        }
        Op::Select(a, b) => {
            let max = editor.document().caret_max() + 1;
            let (a, b) = (a % max, b % max);
            editor.select(a.min(b), a.max(b)).unwrap();
        }
        Op::Enter => {
            editor.insert_paragraph().unwrap();
        }
        Op::LineBreak => {
            editor.insert_line_break().unwrap();
        }
        Op::Object => {
            editor.insert_object("img").unwrap();
        }
        Op::Bold => editor.toggle_bold().unwrap(),
        Op::Italic => editor.toggle_italic().unwrap(),
    }
}

proptest! {
    #[test]
    fn undo_all_then_redo_all_is_exact(ops in prop::collection::vec(op(), 1..40)) {
        let mut editor = Editor::from_document(Document::from_plain_text("ab c\rdef"));
        let initial = editor.document().to_string();
        // state before the first recorded action and after the last edit
        let mut first_before = None;
        let mut last_after = None;

        for op in &ops {
            let before = editor.document().snapshot();
            let count = editor.undo_count();
            run(&mut editor, op);
            let doc = editor.document();
            prop_assert_eq!(doc.text().chars().count(), doc.doc_end());
            prop_assert!(doc.selection().end <= doc.caret_max());

            let after = doc.snapshot();
            if editor.undo_count() != count || after.paragraphs != before.paragraphs {
                if first_before.is_none() {
                    first_before = Some(before);
                }
                last_after = Some(after);
            }
        }
        let last = editor.document().to_string();
        let first_before = first_before.unwrap_or_else(|| editor.document().snapshot());
        let last_after = last_after.unwrap_or_else(|| first_before.clone());
        let actions = editor.undo_count();

        while editor.undo().unwrap() {}
        prop_assert_eq!(editor.document().to_string(), initial);
        prop_assert_eq!(editor.document().snapshot(), first_before);
        prop_assert_eq!(editor.redo_count(), actions);

        while editor.redo().unwrap() {}
        prop_assert_eq!(editor.document().to_string(), last);
        prop_assert_eq!(editor.document().snapshot(), last_after);
    }

    #[test]
    fn every_paragraph_keeps_an_inline(ops in prop::collection::vec(op(), 1..30)) {
        let mut editor = Editor::new();
        for op in &ops {
            run(&mut editor, op);
        }
        let doc = editor.document();
        for block in doc.blocks() {
            prop_assert!(block.paragraph().inline_count() > 0);
        }
    }
}

// Undo/redo scenarios driven through the Editor facade

use flowdoc::Editor;
use flowdoc::richtext::formatting::RunFormat;
use flowdoc::richtext::structured_document::{Document, DocumentSnapshot, InlineContent};
use flowdoc::richtext::style::RunStyle;

fn dump(editor: &Editor) -> String {
    editor.document().to_string()
}

#[test]
fn test_every_action_round_trips() {
    let mut editor = Editor::from_document(Document::from_plain_text("first line\rsecond line"));
    let initial = editor.document().snapshot();

    editor.select(6, 17).unwrap();
    editor.insert_text("X\rY").unwrap();
    let after = editor.document().snapshot();
    assert_ne!(after, initial);

    editor.undo().unwrap();
    assert_eq!(editor.document().snapshot(), initial);
    editor.redo().unwrap();
    assert_eq!(editor.document().snapshot(), after);
}

#[test]
fn test_typing_coalesces() {
    let mut editor = Editor::new();
    editor.insert_text("a").unwrap();
    editor.insert_text("b").unwrap();
    assert_eq!(editor.undo_count(), 1);
    insta::assert_snapshot!(dump(&editor), @r#"P0: "ab""#);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut editor = Editor::new();
    editor.insert_text("one").unwrap();
    editor.insert_paragraph().unwrap();
    editor.insert_text("two").unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.redo_count(), 1);

    editor.insert_text("three").unwrap();
    assert_eq!(editor.redo_count(), 0);
    assert!(!editor.redo().unwrap());
}

/// Run one edit, logging the document before and after it
fn step(editor: &mut Editor, log: &mut Vec<(DocumentSnapshot, DocumentSnapshot)>, edit: impl FnOnce(&mut Editor)) {
    let before = editor.document().snapshot();
    edit(editor);
    log.push((before, editor.document().snapshot()));
}

#[test]
fn test_undo_redo_k_steps_is_exact() {
    let mut editor = Editor::new();
    let mut log = Vec::new();

    step(&mut editor, &mut log, |e| e.insert_text("Hello world").unwrap());
    editor.select(0, 5).unwrap();
    step(&mut editor, &mut log, |e| e.toggle_bold().unwrap());
    editor.set_caret(5).unwrap();
    step(&mut editor, &mut log, |e| {
        e.insert_paragraph().unwrap();
    });
    step(&mut editor, &mut log, |e| {
        e.insert_line_break().unwrap();
    });
    editor.select(3, 9).unwrap();
    step(&mut editor, &mut log, |e| {
        e.delete_selection().unwrap();
    });

    let n = editor.undo_count();
    assert_eq!(n, log.len());
    for k in 1..=n {
        for i in (n - k..n).rev() {
            assert!(editor.undo().unwrap());
            assert_eq!(editor.document().snapshot(), log[i].0);
        }
        for i in n - k..n {
            assert!(editor.redo().unwrap());
            assert_eq!(editor.document().snapshot(), log[i].1);
        }
    }
}

#[test]
fn test_paragraph_split_and_merge() {
    let mut editor = Editor::new();
    editor.insert_text("ab").unwrap();
    editor.set_caret(1).unwrap();
    editor.insert_paragraph().unwrap();
    insta::assert_snapshot!(dump(&editor), @r#"
    P0: "a"
    P1: "b"
    "#);

    editor.select(1, 2).unwrap();
    editor.delete_selection().unwrap();
    assert_eq!(editor.document().block_count(), 1);
    assert_eq!(editor.text(), "ab\r");
}

#[test]
fn test_backspace_at_paragraph_start_merges() {
    let mut editor = Editor::from_document(Document::from_plain_text("a\rb"));
    editor.set_caret(2).unwrap();
    editor.delete_char(true).unwrap();
    assert_eq!(editor.text(), "ab\r");
    assert_eq!(editor.selection().start, 1);

    editor.undo().unwrap();
    assert_eq!(editor.text(), "a\rb\r");
    assert_eq!(editor.selection().start, 2);
}

#[test]
fn test_delete_at_paragraph_end_merges() {
    let mut editor = Editor::from_document(Document::from_plain_text("a\rb"));
    editor.set_caret(1).unwrap();
    editor.delete_char(false).unwrap();
    assert_eq!(editor.text(), "ab\r");
}

#[test]
fn test_format_over_no_runs_leaves_no_trace() {
    let mut editor = Editor::from_document(Document::from_paragraphs(vec![
        vec![InlineContent::run("ab", RunStyle::default()), InlineContent::object("img")],
        vec![InlineContent::run("cd", RunStyle::default())],
    ]));
    let before = editor.document().snapshot();
    let text = editor.text();

    assert!(!editor.apply_formatting(2, 4, &RunFormat::bold()).unwrap());
    assert_eq!(editor.undo_count(), 0);
    assert_eq!(editor.document().snapshot(), before);
    assert_eq!(editor.text(), text);
}

#[test]
fn test_mixed_content_replace_snapshot() {
    let mut editor = Editor::from_document(Document::from_plain_text("The quick fox\rjumps over\rthe dog"));
    editor.select(4, 9).unwrap();
    editor.toggle_italic().unwrap();
    editor.select(10, 20).unwrap();
    editor.insert_text("cat\rsat ").unwrap();
    editor.insert_object("emoji").unwrap();
    insta::assert_snapshot!(dump(&editor), @r#"
    P0: "The " "quick"[i] " cat"
    P1: "sat " <obj:emoji> "over"
    P2: "the dog"
    "#);

    while editor.undo().unwrap() {}
    insta::assert_snapshot!(dump(&editor), @r#"
    P0: "The quick fox"
    P1: "jumps over"
    P2: "the dog"
    "#);
}

#[test]
fn test_forward_bias_joins_following_run() {
    let mut editor = Editor::from_document(Document::from_paragraphs(vec![vec![
        InlineContent::run("ab", RunStyle::bold()),
        InlineContent::run("cd", RunStyle::default()),
    ]]));
    editor.set_caret(2).unwrap();
    editor.set_bias(true, true);
    let before = editor.document().snapshot();
    assert!(before.selection.start_bias_forward);

    editor.insert_text("x").unwrap();
    insta::assert_snapshot!(dump(&editor), @r#"P0: "ab"[b] "xcd""#);

    editor.undo().unwrap();
    assert_eq!(editor.document().snapshot(), before);
    assert!(editor.selection().start_bias_forward);
    assert!(editor.selection().end_bias_forward);
}

#[test]
fn test_backward_bias_joins_preceding_run() {
    let mut editor = Editor::from_document(Document::from_paragraphs(vec![vec![
        InlineContent::run("ab", RunStyle::bold()),
        InlineContent::run("cd", RunStyle::default()),
    ]]));
    editor.set_caret(2).unwrap();
    let before = editor.document().snapshot();
    assert!(!before.selection.start_bias_forward);

    editor.insert_text("x").unwrap();
    insta::assert_snapshot!(dump(&editor), @r#"P0: "abx"[b] "cd""#);

    editor.undo().unwrap();
    assert_eq!(editor.document().snapshot(), before);
}

// Edit scripts: a TOML list of editor operations replayed by the CLI

use crate::error::EditResult;
use crate::richtext::formatting::RunFormat;
use crate::richtext::structured_editor::Editor;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Insert { text: String },
    Backspace,
    Delete,
    DeleteWord {
        #[serde(default = "default_backward")]
        backward: bool,
    },
    Select { start: usize, end: usize },
    Enter,
    LineBreak,
    Object { name: String },
    Bold,
    Italic,
    Underline,
    Format { start: usize, end: usize, format: RunFormat },
    Undo,
    Redo,
    Highlight { pattern: String, format: RunFormat },
}

fn default_backward() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditScript {
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

pub fn parse_script(source: &str) -> Result<EditScript, toml::de::Error> {
    toml::from_str(source)
}

/// Run every step against `editor`, stopping at the first error
pub fn run_script(editor: &mut Editor, script: &EditScript) -> EditResult<()> {
    for (index, step) in script.steps.iter().enumerate() {
        debug!(target: "flowdoc::script", index, ?step, "step");
        run_step(editor, step)?;
    }
    Ok(())
}

fn run_step(editor: &mut Editor, step: &ScriptStep) -> EditResult<()> {
    match step {
        ScriptStep::Insert { text } => editor.insert_text(text)?,
        ScriptStep::Backspace => {
            editor.delete_char(true)?;
        }
        ScriptStep::Delete => {
            editor.delete_char(false)?;
        }
        ScriptStep::DeleteWord { backward } => {
            editor.delete_word(*backward)?;
        }
        ScriptStep::Select { start, end } => editor.select(*start, *end)?,
        ScriptStep::Enter => {
            editor.insert_paragraph()?;
        }
        ScriptStep::LineBreak => {
            editor.insert_line_break()?;
        }
        ScriptStep::Object { name } => {
            editor.insert_object(name)?;
        }
        ScriptStep::Bold => editor.toggle_bold()?,
        ScriptStep::Italic => editor.toggle_italic()?,
        ScriptStep::Underline => editor.toggle_underline()?,
        ScriptStep::Format { start, end, format } => {
            editor.apply_formatting(*start, *end, format)?;
        }
        ScriptStep::Undo => {
            editor.undo()?;
        }
        ScriptStep::Redo => {
            editor.redo()?;
        }
        ScriptStep::Highlight { pattern, format } => {
            editor.highlight_matches(pattern, format)?;
        }
    }
    Ok(())
}

// Library exports for flowdoc

pub mod config;
pub mod error;
pub mod history;
pub mod richtext;
pub mod script;

pub use error::{EditError, EditResult};
pub use richtext::structured_editor::Editor;

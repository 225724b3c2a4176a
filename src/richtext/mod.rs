pub mod atomic_edit;
pub mod edit_action;
pub mod edit_builder;
pub mod formatting;
pub mod structured_document;
pub mod structured_editor;
pub mod style;
pub mod text_pos;
pub mod text_range;

//! Host plug-in entry points.
//!
//! Free functions the host calls with its document, picker and options.
//! Nothing here keeps state between calls.
//!
//! | Host hook     | Function                                   |
//! |---------------|--------------------------------------------|
//! | file export   | [`write_file`]                             |
//! | file import   | [`read_file`] / [`import_file`]            |
//! | export command| [`export_selection`]                       |
//! | inspect       | [`inspect`]                                |
//!
//! File-type indices are the discriminants of [`FileType`].

mod export;
mod file_types;
mod import;
mod options;
mod picker;

pub use export::{WriteFileResult, export_selection, inspect, write_file};
pub use file_types::FileType;
pub use import::{import_file, read_file};
pub use options::{DEFAULT_APPLICATION, ExportOptions, SelectionMode};
pub use picker::{ObjectPicker, PickOptions, PickOutcome};

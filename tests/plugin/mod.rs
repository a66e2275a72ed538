//! Plug-in entry point tests
//!
//! - File export and import through the registered file types
//! - Interactive export and inspection with scripted pickers

mod tests_export_import;

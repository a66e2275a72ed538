//! Export flows: file export, interactive export and inspection.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{error, info};

use super::file_types::FileType;
use super::options::{ExportOptions, SelectionMode};
use super::picker::{ObjectPicker, PickOptions, PickOutcome};
use crate::document::{HostDocument, ObjectId};
use crate::interchange::{Format, InterchangeError, Selection, capture, encode};

/// Outcome reported to the host's file-export machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFileResult {
    Success,
    /// Nothing was written; carries the logged reason.
    Failure(String),
    /// The user backed out.
    Cancel,
}

impl WriteFileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteFileResult::Success)
    }
}

/// Write the whole document as file type `index`.
///
/// This is the host's file-export entry point. Any failure is logged and
/// reported as `Failure`; no partial file is left at `path`.
pub fn write_file(
    path: &Path,
    index: usize,
    doc: &dyn HostDocument,
    options: &ExportOptions,
) -> WriteFileResult {
    let Some(file_type) = FileType::from_index(index) else {
        return failure(path, InterchangeError::Unsupported(format!("file type index {index}")));
    };
    finish(path, export(path, file_type, doc, &Selection::All, options))
}

/// Export to `path`, letting the user pick objects when
/// `options.selection` is `Interactive`. The file type follows the
/// extension of `path`.
pub fn export_selection(
    path: &Path,
    doc: &dyn HostDocument,
    picker: &mut dyn ObjectPicker,
    options: &ExportOptions,
) -> WriteFileResult {
    let Some(file_type) = FileType::from_path(path) else {
        return failure(
            path,
            InterchangeError::Unsupported(format!("no file type for {}", path.display())),
        );
    };
    let selection = match options.selection {
        SelectionMode::All => Selection::All,
        SelectionMode::Interactive => {
            match pick(doc, picker, &PickOptions::default().with_format(options.format)) {
                Ok((objects, _)) => Selection::Objects(objects),
                Err(InterchangeError::SelectionCancelled) => {
                    info!("Export cancelled during selection");
                    return WriteFileResult::Cancel;
                }
                Err(e) => return failure(path, e),
            }
        }
    };
    finish(path, export(path, file_type, doc, &selection, options))
}

/// Encode picked objects for on-screen inspection.
///
/// The picker's format toggle chooses between XML and pretty JSON.
pub fn inspect(
    doc: &dyn HostDocument,
    picker: &mut dyn ObjectPicker,
    options: &ExportOptions,
) -> Result<String, InterchangeError> {
    let pick_options = PickOptions::default()
        .with_prompt("Select objects to inspect")
        .with_format(options.format);
    let (objects, format) = pick(doc, picker, &pick_options)?;
    let captured = capture(doc, &Selection::Objects(objects))?;
    encode(&options.apply(captured.model), format)
}

fn pick(
    doc: &dyn HostDocument,
    picker: &mut dyn ObjectPicker,
    options: &PickOptions,
) -> Result<(Vec<ObjectId>, Format), InterchangeError> {
    match picker.pick(doc, options) {
        PickOutcome::Cancelled => Err(InterchangeError::SelectionCancelled),
        PickOutcome::Picked { objects, format } => {
            if !options.accepts(objects.len()) {
                return Err(InterchangeError::InvalidSelection(format!(
                    "{} objects picked, at least {} required",
                    objects.len(),
                    options.minimum
                )));
            }
            Ok((objects, format))
        }
    }
}

fn export(
    path: &Path,
    file_type: FileType,
    doc: &dyn HostDocument,
    selection: &Selection,
    options: &ExportOptions,
) -> Result<usize, InterchangeError> {
    let captured = file_type.capture(doc, selection)?;
    let model = options.apply(captured.model);
    let bytes = file_type.codec(options.xml).write(&model)?;
    write_atomic(path, &bytes)?;
    info!(
        path = %path.display(),
        entries = model.len(),
        skipped = captured.skipped,
        "Exported {}",
        file_type.description()
    );
    Ok(model.len())
}

/// Write through a temporary file in the target directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn finish(path: &Path, result: Result<usize, InterchangeError>) -> WriteFileResult {
    match result {
        Ok(_) => WriteFileResult::Success,
        Err(e) => failure(path, e),
    }
}

fn failure(path: &Path, e: InterchangeError) -> WriteFileResult {
    error!(path = %path.display(), error = %e, "Export failed");
    WriteFileResult::Failure(e.to_string())
}

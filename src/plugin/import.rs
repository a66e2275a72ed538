//! Import flow.

use std::path::Path;

use tracing::{error, info};

use super::file_types::FileType;
use crate::document::HostDocument;
use crate::interchange::{ImportReport, InterchangeError, XmlOptions, reconstruct};

/// Read file type `index` from `path` into `doc`.
///
/// This is the host's file-import entry point: true iff at least one object
/// was added. Failures are logged.
pub fn read_file(path: &Path, index: usize, doc: &mut dyn HostDocument) -> bool {
    match import_file(path, index, doc) {
        Ok(report) => report.success(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Import failed");
            false
        }
    }
}

/// Same flow as [`read_file`], returning the full report.
///
/// `failures` lists entries dropped while decoding, then entries the host
/// could not take.
pub fn import_file(
    path: &Path,
    index: usize,
    doc: &mut dyn HostDocument,
) -> Result<ImportReport, InterchangeError> {
    let file_type = FileType::from_index(index)
        .ok_or_else(|| InterchangeError::Unsupported(format!("file type index {index}")))?;
    let bytes = std::fs::read(path)?;
    let decoded = file_type.codec(XmlOptions::default()).decode(&bytes)?;

    let mut report = reconstruct(&decoded.model, doc);
    if !decoded.diagnostics.is_empty() {
        let mut failures = decoded.diagnostics;
        failures.append(&mut report.failures);
        report.failures = failures;
    }

    info!(
        path = %path.display(),
        added = report.added.len(),
        failed = report.failures.len(),
        "Imported {}",
        file_type.description()
    );
    Ok(report)
}

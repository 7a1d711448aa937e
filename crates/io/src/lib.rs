//! `callbill-io`: reading call logs and rosters, writing billing reports.
//!
//! Input tables come from delimited text or the first sheet of a workbook.
//! Reports go out as one XLSX workbook, one CSV per sheet, or JSON.

pub mod csv;
pub mod error;
pub mod json;
pub mod naming;
pub mod xlsx;

use std::path::{Path, PathBuf};

use callbill_recon::{RawTable, RunOutput};

pub use error::IoError;
pub use naming::{artifact_path, artifact_stem, OutputFormat};

/// Read one input table, picking the reader by file extension.
pub fn read_table(path: &Path) -> Result<RawTable, IoError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => crate::csv::import(path),
        "tsv" => crate::csv::import_tsv(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::import(path),
        _ => Err(IoError::Unsupported {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

/// Persist a run. Returns every file written (CSV writes one per sheet).
pub fn write_report(output: &RunOutput, path: &Path, format: OutputFormat) -> Result<Vec<PathBuf>, IoError> {
    let written = match format {
        OutputFormat::Xlsx => {
            xlsx::export(&output.sheets, path)?;
            vec![path.to_path_buf()]
        }
        OutputFormat::Csv => crate::csv::export(&output.sheets, path)?,
        OutputFormat::Json => {
            json::export(output, path)?;
            vec![path.to_path_buf()]
        }
    };
    for p in &written {
        log::info!("wrote {}", p.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("calls.pdf")).unwrap_err();
        assert_eq!(err.to_string(), "unsupported file type 'pdf' for calls.pdf");
    }

    #[test]
    fn extension_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("CALLS.CSV");
        fs::write(&path, "ani,duration\n2125550001,5\n").unwrap();
        assert_eq!(read_table(&path).unwrap().len(), 1);
    }
}

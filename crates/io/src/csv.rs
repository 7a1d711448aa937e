// CSV/TSV import/export

use std::io::Read;
use std::path::{Path, PathBuf};

use callbill_recon::{RawTable, RawValue, Sheet, SheetSet};

use crate::error::IoError;

pub fn import(path: &Path) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(path, &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(path, &content, b'\t')
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the header line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines agreeing with the header's field count) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (call-center exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) if s.starts_with('\u{feff}') => Ok(s['\u{feff}'.len_utf8()..].to_string()),
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(path: &Path, content: &str, delimiter: u8) -> Result<RawTable, IoError> {
    let csv_err = |source| IoError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(display_name(path), headers);

    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        // Rows of nothing but delimiters are padding, not data
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(RawValue::text).collect());
    }

    log::debug!(
        "{}: {} row(s), {} column(s), delimiter {:?}",
        table.name,
        table.len(),
        table.headers.len(),
        delimiter as char
    );
    Ok(table)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One file per sheet: `<stem>-<Sheet_Name>.csv` next to `base`.
pub fn export(sheets: &SheetSet, base: &Path) -> Result<Vec<PathBuf>, IoError> {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let dir = base.parent().unwrap_or_else(|| Path::new(""));

    let mut written = Vec::with_capacity(sheets.sheets.len());
    for sheet in &sheets.sheets {
        let path = dir.join(format!("{stem}-{}.csv", sheet.name.replace(' ', "_")));
        export_sheet(sheet, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn export_sheet(sheet: &Sheet, path: &Path) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| IoError::write(path, e))?;

    writer.write_record(&sheet.columns).map_err(|e| IoError::write(path, e))?;
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| IoError::write(path, e))?;
    }

    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use callbill_recon::CellValue;
    use rust_decimal::Decimal;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "ani;duration;total_amount\n2125550001;60;1.00\n2125550002;30;0.50\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "ani,duration,total_amount\n2125550001,60,1.00\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "ani\tduration\ttotal_amount\n2125550001\t60\t1.00\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "ani|duration|total_amount\n2125550001|60|1.00\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Customer;Phone;Note\n\"Acme, Inc\";8005551234;\"a, b\"\nGlobex;8885550000;c\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_semicolon_csv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.csv");
        fs::write(&path, "Destination;Response;Duration\n18005551234;200;1:00\n\n;;\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.name, "calls.csv");
        assert_eq!(table.headers, vec!["Destination", "Response", "Duration"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][2], RawValue::text("1:00"));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.csv");
        // "Café" with 0xE9 for é
        fs::write(&path, b"Phone,Customer\n8005551234,Caf\xe9\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.rows[0][1], RawValue::text("Café"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}ani,duration\n2125550001,5\n").unwrap();
        let table = import(&path).unwrap();
        assert_eq!(table.headers[0], "ani");
    }

    #[test]
    fn test_export_one_file_per_sheet() {
        let dir = tempdir().unwrap();
        let sheets = SheetSet {
            sheets: vec![Sheet {
                name: "Billing Details".into(),
                columns: vec!["Customer".into(), "Rate ($)".into()],
                widths: vec![30.0, 12.0],
                rows: vec![vec![
                    CellValue::Text("Acme, Inc".into()),
                    CellValue::money(Decimal::new(105, 3)),
                ]],
            }],
            primary: 0,
        };

        let written = export(&sheets, &dir.path().join("Toll_Free_Analysis_2025-10-01.csv")).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("Toll_Free_Analysis_2025-10-01-Billing_Details.csv"));

        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "Customer,Rate ($)\n\"Acme, Inc\",0.11\n");

        let back = import(&written[0]).unwrap();
        assert_eq!(back.rows[0][0], RawValue::text("Acme, Inc"));
    }
}

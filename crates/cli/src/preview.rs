//! `--preview`: the first rows of the primary sheet as a fixed-width table.

use std::fmt::Write as _;

use callbill_recon::Sheet;
use unicode_width::UnicodeWidthStr;

pub const PREVIEW_ROWS: usize = 5;
const MAX_COL_WIDTH: usize = 30;

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s.chars().take(width).collect();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }
    format!("{}..", &s[..end_byte])
}

fn pad_right(s: &str, width: usize) -> String {
    let s = truncate_display(s, width);
    let sw = UnicodeWidthStr::width(s.as_str());
    format!("{}{}", s, " ".repeat(width.saturating_sub(sw)))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| pad_right(cell, w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render the header and up to `limit` rows. A trailing line reports how
/// many rows were left out.
pub fn render(sheet: &Sheet, limit: usize) -> String {
    let shown: Vec<Vec<String>> = sheet
        .rows
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let widths: Vec<usize> = sheet
        .columns
        .iter()
        .enumerate()
        .map(|(col, title)| {
            shown
                .iter()
                .filter_map(|row| row.get(col))
                .map(|v| UnicodeWidthStr::width(v.as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(title.as_str())))
                .max()
                .unwrap_or(0)
                .min(MAX_COL_WIDTH)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", sheet.name);
    let _ = writeln!(out, "{}", line(&sheet.columns, &widths));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &shown {
        let _ = writeln!(out, "{}", line(row, &widths));
    }
    if sheet.rows.len() > shown.len() {
        let _ = writeln!(out, "... {} more row(s)", sheet.rows.len() - shown.len());
    }
    out
}

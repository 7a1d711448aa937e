// Artifact naming: {prefix}{infix}_{timestamp}.{ext}

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use callbill_recon::{ReportMeta, TimestampStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// `2025-10-01` or `2025-10-01T12-30-45`.
pub fn timestamp_suffix(style: TimestampStyle, now: NaiveDateTime) -> String {
    match style {
        TimestampStyle::Date => now.format("%Y-%m-%d").to_string(),
        TimestampStyle::Iso => now.format("%Y-%m-%dT%H-%M-%S").to_string(),
    }
}

pub fn artifact_stem(meta: &ReportMeta, now: NaiveDateTime) -> String {
    format!(
        "{}{}_{}",
        meta.artifact_prefix,
        meta.file_infix(),
        timestamp_suffix(meta.timestamp, now)
    )
}

pub fn artifact_path(dir: &Path, meta: &ReportMeta, now: NaiveDateTime, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", artifact_stem(meta, now), format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use callbill_recon::{run_ani_summary, DateRange, RawTable, RawValue, RunConfig, RunOptions};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 5).unwrap().and_hms_opt(14, 3, 9).unwrap()
    }

    fn meta(options: &RunOptions, config: &RunConfig) -> ReportMeta {
        let mut calls = RawTable::new(
            "ani.csv",
            vec!["ani".into(), "duration".into(), "total_amount".into(), "call_time".into()],
        );
        calls.push_row(vec![
            RawValue::text("2125550001"),
            RawValue::text("60"),
            RawValue::text("1"),
            RawValue::text("10/01/2025 10:00"),
        ]);
        run_ani_summary(&[calls], options, config).unwrap().meta
    }

    #[test]
    fn iso_timestamp_without_filter() {
        let meta = meta(&RunOptions::default(), &RunConfig::default());
        let path = artifact_path(Path::new("out"), &meta, now(), OutputFormat::Xlsx);
        assert_eq!(path, Path::new("out/processed_data_2025-10-05T14-03-09.xlsx"));
    }

    #[test]
    fn date_infix_with_open_end() {
        let range = DateRange::new(NaiveDate::from_ymd_opt(2025, 10, 1), None).unwrap();
        let options = RunOptions { date_range: Some(range) };
        let meta = meta(&options, &RunConfig::default());
        assert_eq!(
            artifact_stem(&meta, now()),
            "processed_data_2025-10-01_to_end_2025-10-05T14-03-09"
        );
    }

    #[test]
    fn configured_date_style() {
        let config = RunConfig::from_toml("[output]\ntimestamp = \"date\"").unwrap();
        let meta = meta(&RunOptions::default(), &config);
        let path = artifact_path(Path::new(""), &meta, now(), OutputFormat::Json);
        assert_eq!(path, Path::new("processed_data_2025-10-05.json"));
    }
}

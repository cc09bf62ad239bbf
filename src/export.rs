//! Export of the current view as CSV or JSON

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::catalog::types::Extension;

pub const HEADERS: [&str; 8] = [
    "Tên Extension",
    "Package",
    "Ngôn ngữ",
    "Phiên bản",
    "NSFW",
    "Nguồn Repo",
    "Số Sources",
    "Link APK",
];

/// Output format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One exported row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub name: String,
    pub pkg: String,
    pub language: String,
    pub version: String,
    pub nsfw: String,
    pub repo_name: String,
    pub source_count: usize,
    pub apk: String,
}

impl ExportRow {
    pub fn from_extension(ext: &Extension) -> Self {
        Self {
            name: ext.name.clone(),
            pkg: ext.pkg.clone(),
            language: language_name(&ext.lang),
            version: ext.version.clone(),
            nsfw: if ext.nsfw { "Có" } else { "Không" }.to_string(),
            repo_name: ext.repo_origin.repo_name.clone(),
            source_count: ext.sources.len(),
            apk: ext.apk.clone(),
        }
    }

    fn fields(&self) -> [String; 8] {
        [
            self.name.clone(),
            self.pkg.clone(),
            self.language.clone(),
            self.version.clone(),
            self.nsfw.clone(),
            self.repo_name.clone(),
            self.source_count.to_string(),
            self.apk.clone(),
        ]
    }
}

/// Display name of a language tag
pub fn language_name(code: &str) -> String {
    match code {
        "" => "N/A".to_string(),
        "vi" => "Tiếng Việt".to_string(),
        other => other.to_uppercase(),
    }
}

pub fn rows(view: &[&Extension]) -> Vec<ExportRow> {
    view.iter().map(|ext| ExportRow::from_extension(ext)).collect()
}

/// Write the view in `format`
pub fn write<W: Write>(format: ExportFormat, view: &[&Extension], writer: &mut W) -> io::Result<()> {
    match format {
        ExportFormat::Csv => write_csv(view, writer),
        ExportFormat::Json => write_json(view, writer),
    }
}

/// Write the view as a pretty-printed JSON array of rows
pub fn write_json<W: Write>(view: &[&Extension], writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &rows(view))?;
    writeln!(writer)?;
    writer.flush()
}

/// Write the view as CSV, header first
pub fn write_csv<W: Write>(view: &[&Extension], writer: &mut W) -> io::Result<()> {
    write_record(writer, HEADERS.iter().copied())?;
    for row in rows(view) {
        let fields = row.fields();
        write_record(writer, fields.iter().map(String::as_str))?;
    }
    writer.flush()
}

fn write_record<'a, W: Write>(
    writer: &mut W,
    fields: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    let line: Vec<String> = fields.map(escape_field).collect();
    writeln!(writer, "{}", line.join(","))
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// `extensions_<date>.<csv|json>`
pub fn default_file_name(date: NaiveDate, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!(
        "extensions_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    ))
}

pub fn default_file_name_today(format: ExportFormat) -> PathBuf {
    default_file_name(Local::now().date_naive(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{RepoOrigin, Source};
    use rstest::rstest;

    fn ext() -> Extension {
        Extension {
            pkg: "eu.kanade.tachiyomi.extension.vi.truyenqq".to_string(),
            name: "Tachiyomi: TruyenQQ".to_string(),
            lang: "vi".to_string(),
            version: "1.4.12".to_string(),
            nsfw: true,
            sources: vec![Source::default(), Source::default()],
            repo_origin: RepoOrigin::new("Official", "https://github.com/keiyoushi/extensions"),
            apk: "tachiyomi-vi.truyenqq-v1.4.12.apk".to_string(),
            code: Some(12),
        }
    }

    #[rstest]
    #[case("vi", "Tiếng Việt")]
    #[case("en", "EN")]
    #[case("", "N/A")]
    fn language_name_returns_display_name(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(language_name(code), expected);
    }

    #[test]
    fn from_extension_fills_every_column() {
        assert_eq!(
            ExportRow::from_extension(&ext()),
            ExportRow {
                name: "Tachiyomi: TruyenQQ".to_string(),
                pkg: "eu.kanade.tachiyomi.extension.vi.truyenqq".to_string(),
                language: "Tiếng Việt".to_string(),
                version: "1.4.12".to_string(),
                nsfw: "Có".to_string(),
                repo_name: "Official".to_string(),
                source_count: 2,
                apk: "tachiyomi-vi.truyenqq-v1.4.12.apk".to_string(),
            }
        );
    }

    #[test]
    fn write_csv_writes_header_and_quotes_special_fields() {
        let mut quoted = ext();
        quoted.name = "Say \"hi\", world".to_string();
        quoted.nsfw = false;
        quoted.sources.clear();
        let first = ext();

        let mut out = Vec::new();
        write_csv(&[&first, &quoted], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Tên Extension,Package,Ngôn ngữ,Phiên bản,NSFW,Nguồn Repo,Số Sources,Link APK",
                "Tachiyomi: TruyenQQ,eu.kanade.tachiyomi.extension.vi.truyenqq,Tiếng Việt,1.4.12,Có,Official,2,tachiyomi-vi.truyenqq-v1.4.12.apk",
                "\"Say \"\"hi\"\", world\",eu.kanade.tachiyomi.extension.vi.truyenqq,Tiếng Việt,1.4.12,Không,Official,0,tachiyomi-vi.truyenqq-v1.4.12.apk",
            ]
        );
    }

    #[test]
    fn write_csv_with_empty_view_writes_only_header() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn write_json_emits_camel_case_rows() {
        let first = ext();

        let mut out = Vec::new();
        write(ExportFormat::Json, &[&first], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "name": "Tachiyomi: TruyenQQ",
                "pkg": "eu.kanade.tachiyomi.extension.vi.truyenqq",
                "language": "Tiếng Việt",
                "version": "1.4.12",
                "nsfw": "Có",
                "repoName": "Official",
                "sourceCount": 2,
                "apk": "tachiyomi-vi.truyenqq-v1.4.12.apk",
            }])
        );
    }

    #[rstest]
    #[case(ExportFormat::Csv, "extensions_2026-10-16.csv")]
    #[case(ExportFormat::Json, "extensions_2026-10-16.json")]
    fn default_file_name_uses_iso_date(#[case] format: ExportFormat, #[case] expected: &str) {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(default_file_name(date, format), PathBuf::from(expected));
    }
}

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::Workbook;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::{ExportConfig, ReportFormat};
use crate::data::{Table, Value};
use crate::OutputFormat;

// A4 portrait, in millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const PAGE_MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 7.0;
const FONT_SIZE: f32 = 12.0;
/// Helvetica at 12pt fits roughly this many characters between the margins.
const LINE_CHARS: usize = 85;

/// Persists rendered artifacts. Failures are reported to the caller and
/// never affect the chart or report that was already produced.
pub trait ExportAdapter {
    /// Store rendered chart bytes under `name` (without extension).
    fn export_chart(&self, name: &str, bytes: &[u8], format: OutputFormat) -> Result<PathBuf>;

    /// Store a plain-text report under `name` (without extension).
    fn export_report(&self, name: &str, text: &str) -> Result<PathBuf>;

    /// Typeset a report as a PDF document under `name` (without extension).
    fn export_report_pdf(&self, name: &str, text: &str) -> Result<PathBuf>;

    /// Store a table as CSV under `name` (without extension).
    fn export_table(&self, name: &str, table: &Table) -> Result<PathBuf>;

    /// Store a table as an Excel workbook under `name` (without extension).
    fn export_table_xlsx(&self, name: &str, table: &Table) -> Result<PathBuf>;

    /// Store a report in the configured format.
    fn export_report_as(&self, name: &str, text: &str, format: ReportFormat) -> Result<PathBuf> {
        match format {
            ReportFormat::Pdf => self.export_report_pdf(name, text),
            ReportFormat::Text => self.export_report(name, text),
        }
    }
}

/// Outcome of a persistence attempt, kept separate from rendering success.
#[derive(Debug)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Failed(anyhow::Error),
}

impl ExportOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, ExportOutcome::Saved(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Saved(path) => Some(path),
            ExportOutcome::Failed(_) => None,
        }
    }
}

/// Run an export call and downgrade its failure to a logged outcome.
pub fn try_export<F>(what: &str, export: F) -> ExportOutcome
where
    F: FnOnce() -> Result<PathBuf>,
{
    match export() {
        Ok(path) => {
            info!("Saved {} to {}", what, path.display());
            ExportOutcome::Saved(path)
        }
        Err(err) => {
            warn!("Could not save {}: {:#}", what, err);
            ExportOutcome::Failed(err)
        }
    }
}

/// Destination file stem: spaces become underscores and path separators
/// are stripped so a column name cannot escape the export directory.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// `Report_YYYYMMDD_HHMMSS`
pub fn report_name(at: DateTime<Local>) -> String {
    format!("Report_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Split text into lines no longer than `width` characters, breaking at
/// whitespace where possible. Blank lines are kept.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source in text.lines() {
        let mut current = String::new();
        for word in source.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split = word.char_indices().nth(width).map_or(word.len(), |(i, _)| i);
                let rest = word.split_off(split);
                lines.push(word);
                word = rest;
            }
            if current.is_empty() {
                current = word;
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(&word);
            } else {
                lines.push(std::mem::replace(&mut current, word));
            }
        }
        lines.push(current);
    }
    lines
}

fn write_pdf(path: &Path, title: &str, text: &str) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - PAGE_MARGIN;
    for line in wrap_lines(text, LINE_CHARS) {
        if y < PAGE_MARGIN {
            let (page, next) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(next);
            y = PAGE_HEIGHT - PAGE_MARGIN;
        }
        layer.use_text(line, FONT_SIZE, Mm(PAGE_MARGIN), Mm(y), &font);
        y -= LINE_HEIGHT;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow!("Failed to write PDF {}: {:?}", path.display(), e))?;
    Ok(())
}

/// Writes artifacts into the configured directories, creating them on demand.
#[derive(Debug, Clone)]
pub struct FileExporter {
    config: ExportConfig,
}

impl FileExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    fn destination(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        Ok(dir.join(format!("{}.{}", sanitize_name(name), extension)))
    }
}

impl ExportAdapter for FileExporter {
    fn export_chart(&self, name: &str, bytes: &[u8], format: OutputFormat) -> Result<PathBuf> {
        let path = Self::destination(&self.config.charts_dir, name, format.extension())?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write chart {}", path.display()))?;
        Ok(path)
    }

    fn export_report(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = Self::destination(&self.config.reports_dir, name, "txt")?;
        fs::write(&path, text).with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }

    fn export_report_pdf(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = Self::destination(&self.config.reports_dir, name, "pdf")?;
        write_pdf(&path, name, text)?;
        Ok(path)
    }

    fn export_table(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let path = Self::destination(&self.config.data_dir, name, "csv")?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer
            .write_record(table.columns())
            .context("Failed to write CSV header")?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(|v| v.label()))
                .context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV")?;
        Ok(path)
    }

    fn export_table_xlsx(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let path = Self::destination(&self.config.data_dir, name, "xlsx")?;
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in table.columns().iter().enumerate() {
            let col = u16::try_from(col).context("Too many columns for a worksheet")?;
            sheet
                .write_string(0, col, header.as_str())
                .context("Failed to write worksheet header")?;
        }
        for (row_idx, row) in table.rows().iter().enumerate() {
            let row_num = u32::try_from(row_idx + 1).context("Too many rows for a worksheet")?;
            for (col, value) in row.iter().enumerate() {
                let col = u16::try_from(col).context("Too many columns for a worksheet")?;
                let written = match value {
                    Value::Number(n) => sheet.write_number(row_num, col, *n),
                    Value::Text(s) => sheet.write_string(row_num, col, s.as_str()),
                    Value::Missing => continue,
                };
                written.context("Failed to write worksheet cell")?;
            }
        }

        workbook
            .save(&path)
            .with_context(|| format!("Failed to write workbook {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exporter(root: &Path) -> FileExporter {
        FileExporter::new(ExportConfig {
            charts_dir: root.join("charts"),
            reports_dir: root.join("reports"),
            data_dir: root.join("exports"),
            ..ExportConfig::default()
        })
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("bar Region Sales"), "bar_Region_Sales");
        assert_eq!(sanitize_name("../etc/passwd"), "..etcpasswd");
    }

    #[test]
    fn test_report_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(report_name(at), "Report_20240305_140709");
    }

    #[test]
    fn test_export_chart_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path());

        let chart = exporter
            .export_chart("bar Region Sales", b"<svg/>", OutputFormat::Svg)
            .unwrap();
        assert_eq!(chart, dir.path().join("charts").join("bar_Region_Sales.svg"));
        assert_eq!(fs::read(&chart).unwrap(), b"<svg/>");

        let report = exporter.export_report("Report_1", "Data Insights Report").unwrap();
        assert_eq!(fs::read_to_string(report).unwrap(), "Data Insights Report");
    }

    #[test]
    fn test_export_table_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_text_rows(
            vec!["Region", "Sales"],
            vec![vec!["North", "100"], vec!["South", "2.5"]],
        )
        .unwrap();
        let path = exporter(dir.path()).export_table("filtered_data", &table).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "Region,Sales\nNorth,100\nSouth,2.5\n");
    }

    #[test]
    fn test_export_report_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let text = "Data Insights Report\n\nTop Sales Region: North\n\nGenerated on: 2024-03-05 14:07:09\n";
        let path = exporter(dir.path())
            .export_report_as("Report_20240305_140709", text, ReportFormat::Pdf)
            .unwrap();
        assert_eq!(path, dir.path().join("reports").join("Report_20240305_140709.pdf"));
        assert!(fs::read(path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_report_spills_onto_more_pages() {
        let dir = tempfile::tempdir().unwrap();
        let text = (0..120).map(|i| format!("Line {}", i)).collect::<Vec<_>>().join("\n");
        let path = exporter(dir.path()).export_report_pdf("long", &text).unwrap();
        assert!(fs::read(path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_report_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = exporter(dir.path())
            .export_report_as("Report_1", "body", ReportFormat::Text)
            .unwrap();
        assert_eq!(path.extension().unwrap(), "txt");
    }

    #[test]
    fn test_export_table_as_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_text_rows(
            vec!["Region", "Sales"],
            vec![vec!["North", "100"], vec!["South", "NA"]],
        )
        .unwrap();
        let path = exporter(dir.path()).export_table_xlsx("filtered_data", &table).unwrap();
        assert_eq!(path, dir.path().join("exports").join("filtered_data.xlsx"));
        // xlsx is a zip archive
        assert!(fs::read(path).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_wrap_lines() {
        assert_eq!(wrap_lines("a b c", 3), vec!["a b", "c"]);
        assert_eq!(wrap_lines("title\n\nbody", 10), vec!["title", "", "body"]);
        assert_eq!(wrap_lines("abcdefg", 3), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_try_export_reports_failure_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the charts directory should be makes the export fail.
        let blocker = dir.path().join("charts");
        fs::write(&blocker, "").unwrap();

        let outcome = try_export("chart", || {
            exporter(dir.path()).export_chart("c", b"x", OutputFormat::Png)
        });
        assert!(!outcome.is_saved());
        assert!(outcome.path().is_none());

        let outcome = try_export("report", || {
            exporter(dir.path()).export_report("r", "text")
        });
        assert!(outcome.is_saved());
    }
}

//! Report export - Markdown document and delimited text
//!
//! Both artifacts are written together as `reporte-afilados-<date>.md` and
//! `reporte-afilados-<date>.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::dashboard::{Dashboard, ReportError};
use crate::schema::TemplateRenderer;

/// File name prefix shared by both exports
pub const EXPORT_PREFIX: &str = "reporte-afilados";

const REPORT_TEMPLATE: &str = "report.md.tera";

/// Paths of one export run
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub markdown: PathBuf,
    pub csv: PathBuf,
}

/// Export file name without extension
pub fn file_stem(dashboard: &Dashboard) -> String {
    format!("{}-{}", EXPORT_PREFIX, dashboard.date_stamp())
}

/// Render the Markdown document
pub fn render_markdown(dashboard: &Dashboard) -> Result<String, ReportError> {
    let renderer = TemplateRenderer::new().map_err(|e| ReportError::Template(e.to_string()))?;

    let mut context = tera::Context::new();
    context.insert("date", &dashboard.date_stamp());
    context.insert("summary", &dashboard.summary);
    context.insert("monthly", &dashboard.monthly);
    context.insert("by_kind", &dashboard.by_kind);
    context.insert("by_branch", &dashboard.by_branch);

    renderer
        .render(REPORT_TEMPLATE, &context)
        .map_err(|e| ReportError::Template(e.to_string()))
}

/// The report flattened to two-column rows
pub fn csv_rows(dashboard: &Dashboard) -> Vec<[String; 2]> {
    fn row(a: impl ToString, b: impl ToString) -> [String; 2] {
        [a.to_string(), b.to_string()]
    }
    let blank = || row("", "");
    let s = &dashboard.summary;

    let mut rows = vec![
        row("Sharpening Report", ""),
        row("Date", dashboard.date_stamp()),
        blank(),
        row("Summary", ""),
        row("Total blades", s.total_blades),
        row("Terminal blades", s.terminal_blades),
        row("Open blades", s.open_blades),
        row("Total sharpenings", s.total_events),
        row("Branches", s.total_branches),
        blank(),
        row("Sharpenings by branch", ""),
        row("Branch", "Sharpenings"),
    ];
    rows.extend(dashboard.by_branch.iter().map(|b| row(&b.name, b.count)));

    rows.push(blank());
    rows.push(row("Sharpenings by kind", ""));
    rows.push(row("Kind", "Sharpenings"));
    rows.extend(dashboard.by_kind.iter().map(|k| row(k.kind, k.count)));

    rows.push(blank());
    rows.push(row("Sharpenings by month", ""));
    rows.push(row("Month", "Sharpenings"));
    rows.extend(dashboard.monthly.iter().map(|m| row(&m.label, m.count)));
    rows
}

/// Render the CSV text
pub fn render_csv(dashboard: &Dashboard) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in csv_rows(dashboard) {
        writer
            .write_record(&record)
            .map_err(|e| ReportError::Csv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Csv(e.to_string()))
}

/// Write both artifacts into `dir`, creating it if needed
pub fn export(dashboard: &Dashboard, dir: &Path) -> Result<ExportedFiles, ReportError> {
    let markdown = render_markdown(dashboard)?;
    let csv = render_csv(dashboard)?;

    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let stem = file_stem(dashboard);
    let files = ExportedFiles {
        markdown: dir.join(format!("{}.md", stem)),
        csv: dir.join(format!("{}.csv", stem)),
    };
    write(&files.markdown, &markdown)?;
    write(&files.csv, &csv)?;

    info!(
        markdown = %files.markdown.display(),
        csv = %files.csv.display(),
        "exported report"
    );
    Ok(files)
}

fn write(path: &Path, content: &str) -> Result<(), ReportError> {
    fs::write(path, content).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

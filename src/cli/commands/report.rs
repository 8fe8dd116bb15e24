//! `sawtrack report` command - Dashboard and exports

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::Workspace;
use crate::cli::output::{effective_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dashboard::Dashboard;
use crate::core::export;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Show the dashboard
    Show,

    /// Write the Markdown and CSV reports
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output directory (default: config report_dir, else current directory)
    #[arg(long, short = 'o')]
    pub out_dir: Option<PathBuf>,
}

/// Widest histogram bar
const BAR_WIDTH: usize = 30;

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Show => run_show(global),
        ReportCommands::Export(args) => run_export(args, global),
    }
}

fn load_dashboard(ws: &Workspace) -> Result<Dashboard> {
    ws.session()?;
    Ok(Dashboard::load(&ws.store, Local::now().fixed_offset())?)
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let dashboard = load_dashboard(&ws)?;

    let format = effective_format(global.format, true);
    if print_structured(&dashboard, format)? {
        return Ok(());
    }
    if format == OutputFormat::Csv {
        print!("{}", export::render_csv(&dashboard)?);
        return Ok(());
    }

    let s = &dashboard.summary;
    println!("{}", style("Sharpening Report").bold());
    println!("Date: {}", dashboard.date_stamp());
    println!();
    println!(
        "{}",
        two_column(
            ("Metric", "Value"),
            [
                ("Total blades", s.total_blades),
                ("Terminal blades", s.terminal_blades),
                ("Open blades", s.open_blades),
                ("Total sharpenings", s.total_events),
                ("Branches", s.total_branches),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    );

    println!();
    println!("{}", style("Sharpenings by branch").bold());
    println!(
        "{}",
        two_column(
            ("Branch", "Sharpenings"),
            dashboard
                .by_branch
                .iter()
                .map(|b| (b.name.clone(), b.count.to_string())),
        )
    );

    println!();
    println!("{}", style("Sharpenings by kind").bold());
    if dashboard.by_kind.is_empty() {
        println!("  No sharpenings recorded.");
    } else {
        println!(
            "{}",
            two_column(
                ("Kind", "Sharpenings"),
                dashboard
                    .by_kind
                    .iter()
                    .map(|k| (k.kind.to_string(), k.count.to_string())),
            )
        );
    }

    println!();
    println!("{}", style(format!("Last {} months", dashboard.monthly.len())).bold());
    let peak = dashboard.monthly.iter().map(|m| m.count).max().unwrap_or(0);
    let label_width = dashboard
        .monthly
        .iter()
        .map(|m| m.label.chars().count())
        .max()
        .unwrap_or(0);
    for month in &dashboard.monthly {
        println!(
            "  {:<width$}  {:>4}  {}",
            month.label,
            month.count,
            style(bar(month.count, peak)).cyan(),
            width = label_width
        );
    }
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let dashboard = load_dashboard(&ws)?;
    let dir = args.out_dir.unwrap_or_else(|| ws.config.report_dir());

    let files = export::export(&dashboard, &dir)?;

    match global.format {
        OutputFormat::Id => {
            println!("{}", files.markdown.display());
            println!("{}", files.csv.display());
        }
        _ if global.quiet => {}
        _ => {
            println!("{} Exported report", style("✓").green());
            println!("  {}", style(files.markdown.display()).cyan());
            println!("  {}", style(files.csv.display()).cyan());
        }
    }
    Ok(())
}

fn two_column(header: (&str, &str), rows: impl Iterator<Item = (String, String)>) -> String {
    let mut builder = Builder::default();
    builder.push_record([header.0.to_string(), header.1.to_string()]);
    for (a, b) in rows {
        builder.push_record([a, b]);
    }
    let mut table = builder.build();
    table.with(Style::sharp());
    table.to_string()
}

/// Histogram bar scaled against the busiest month
fn bar(count: usize, peak: usize) -> String {
    if peak == 0 || count == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH).div_ceil(peak).max(1);
    "█".repeat(width)
}

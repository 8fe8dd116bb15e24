//! `sawtrack blade` command - Lookup, registration and sharpening

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::blade_type::type_matches;
use crate::cli::filters::StatusFilter;
use crate::cli::helpers::{format_timestamp, parse_timestamp, resolve_ref, title_matches, Workspace};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::directory::Directory;
use crate::core::lifecycle::{
    BladeLifecycle, BladeSnapshot, LookupOutcome, NewBlade, SharpeningForm,
};
use crate::entities::{Blade, BladeType, Branch, SharpeningEvent, SharpeningKind};

#[derive(Subcommand, Debug)]
pub enum BladeCommands {
    /// Look a blade up by code
    Lookup(LookupArgs),

    /// Register a blade for an unknown code
    Register(RegisterArgs),

    /// Record a sharpening
    Sharpen(SharpenArgs),

    /// List blades
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Blade code (scanned or typed)
    pub code: String,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Blade code
    pub code: String,

    /// Owning branch (name, BRN@N or ID; defaults to config default_branch)
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Blade type (code, name, BTY@N or ID)
    #[arg(long = "type", short = 't')]
    pub blade_type: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SharpenArgs {
    /// Blade code
    pub code: String,

    /// Sharpening kind (edge or face)
    #[arg(long, short = 'k')]
    pub kind: Option<SharpeningKind>,

    /// When the sharpening happened ('now', YYYY-MM-DD, 'YYYY-MM-DD HH:MM' or RFC 3339)
    #[arg(long, default_value = "now", value_parser = parse_timestamp)]
    pub at: DateTime<Utc>,

    /// Observations
    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// Final sharpening: the blade is closed afterwards
    #[arg(long = "final")]
    pub final_sharpening: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by lifecycle state
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Only blades of this branch
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

const BLADE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "CODE"),
    ColumnDef::new("status", "STATUS"),
    ColumnDef::new("branch", "BRANCH"),
    ColumnDef::new("type", "TYPE"),
    ColumnDef::new("sharpenings", "SHARPENINGS"),
    ColumnDef::new("registered", "REGISTERED"),
];

/// Run a blade subcommand
pub fn run(cmd: BladeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BladeCommands::Lookup(args) => run_lookup(args, global),
        BladeCommands::Register(args) => run_register(args, global),
        BladeCommands::Sharpen(args) => run_sharpen(args, global),
        BladeCommands::List(args) => run_list(args, global),
    }
}

/// Names used when printing blades
struct Labels {
    branches: Directory<Branch>,
    types: Directory<BladeType>,
}

impl Labels {
    fn load(ws: &Workspace) -> Result<Self> {
        Ok(Self {
            branches: Directory::load(&ws.store)?,
            types: Directory::load(&ws.store)?,
        })
    }

    fn branch(&self, blade: &Blade) -> String {
        self.branches
            .get(&blade.branch)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| blade.branch.to_string())
    }

    fn blade_type(&self, blade: &Blade) -> String {
        self.types
            .get(&blade.blade_type)
            .map(|t| format!("{} ({})", t.name, t.code))
            .unwrap_or_else(|| blade.blade_type.to_string())
    }
}

fn run_lookup(args: LookupArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let outcome = BladeLifecycle::new(&mut ws.store, &session).lookup(&args.code)?;

    let labels = Labels::load(&ws)?;
    print_outcome(&outcome, &labels, global)
}

fn run_register(args: RegisterArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let labels = Labels::load(&ws)?;
    let short_ids = ws.short_ids();

    let branch_ref = args.branch.or_else(|| ws.config.default_branch.clone());
    let branch = branch_ref
        .map(|r| resolve_ref(&r, &labels.branches, &short_ids, "branch", title_matches))
        .transpose()?;
    let blade_type = args
        .blade_type
        .map(|r| resolve_ref(&r, &labels.types, &short_ids, "type", type_matches))
        .transpose()?;

    let form = NewBlade {
        code: args.code,
        branch,
        blade_type,
    };
    let outcome = BladeLifecycle::new(&mut ws.store, &session).register_blade(form)?;

    if !global.quiet && global.format == OutputFormat::Auto {
        if let Some(snapshot) = outcome.snapshot() {
            println!(
                "{} Registered blade {}",
                style("✓").green(),
                style(&snapshot.blade.code).cyan()
            );
        }
    }
    print_outcome(&outcome, &labels, global)
}

fn run_sharpen(args: SharpenArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;

    let form = SharpeningForm {
        kind: args.kind,
        timestamp: Some(args.at),
        notes: args.notes,
        final_sharpening: args.final_sharpening,
    };
    let receipt = BladeLifecycle::new(&mut ws.store, &session).record_sharpening(&args.code, form)?;

    if !global.quiet && global.format == OutputFormat::Auto {
        println!(
            "{} Recorded {} sharpening {}",
            style("✓").green(),
            receipt.event.kind,
            style(receipt.event.id.to_string()).dim()
        );
        if receipt.outcome.is_terminal() {
            println!(
                "{} Blade {} received its terminal sharpening",
                style("✓").green(),
                style(args.code.trim()).cyan()
            );
        }
    }

    let labels = Labels::load(&ws)?;
    print_outcome(&receipt.outcome, &labels, global)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    ws.session()?;
    let labels = Labels::load(&ws)?;
    let mut short_ids = ws.short_ids();

    let branch = args
        .branch
        .map(|r| resolve_ref(&r, &labels.branches, &short_ids, "branch", title_matches))
        .transpose()?;

    let events: Directory<SharpeningEvent> = Directory::load(&ws.store)?;
    let blades: Vec<Blade> = Directory::<Blade>::load(&ws.store)?
        .iter()
        .filter(|b| args.status.matches(b.status()))
        .filter(|b| branch.is_none_or(|id| b.branch == id))
        .cloned()
        .collect();

    if args.count {
        println!("{}", blades.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_structured(&blades, format)? {
        return Ok(());
    }
    if blades.is_empty() {
        println!("No blades found.");
        return Ok(());
    }

    for blade in &blades {
        short_ids.add(&blade.id);
    }
    ws.save_short_ids(&short_ids);

    let rows: Vec<TableRow> = blades
        .iter()
        .map(|blade| {
            let sharpenings = events.iter().filter(|e| e.blade == blade.id).count();
            TableRow::new(blade.id, &short_ids)
                .cell("code", blade.code.clone())
                .cell("status", status_word(blade))
                .cell("branch", labels.branch(blade))
                .cell("type", labels.blade_type(blade))
                .cell("sharpenings", sharpenings.to_string())
                .cell("registered", format_timestamp(&blade.registration_date))
        })
        .collect();
    TableFormatter::new(BLADE_COLUMNS, "blades").output(&rows, format);
    Ok(())
}

fn status_word(blade: &Blade) -> &'static str {
    if blade.is_terminal() {
        "terminal"
    } else {
        "open"
    }
}

fn print_outcome(outcome: &LookupOutcome, labels: &Labels, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(outcome, global.format)?;
            return Ok(());
        }
        OutputFormat::Id => {
            if let Some(snapshot) = outcome.snapshot() {
                println!("{}", snapshot.blade.id);
            }
            return Ok(());
        }
        _ => {}
    }

    match outcome {
        LookupOutcome::NotFound { code } => {
            println!("No blade registered with code {}", style(code).yellow());
            println!(
                "  Register it with: {}",
                style(format!(
                    "sawtrack blade register {} --branch <BRANCH> --type <TYPE>",
                    code
                ))
                .cyan()
            );
        }
        LookupOutcome::Terminal(snapshot) => {
            println!(
                "{} blade {} already received its terminal sharpening",
                style("WARNING:").yellow().bold(),
                style(&snapshot.blade.code).cyan()
            );
            print_snapshot(snapshot, labels);
        }
        LookupOutcome::Available(snapshot) => {
            print_snapshot(snapshot, labels);
            println!();
            println!(
                "  Record a sharpening with: {}",
                style(format!(
                    "sawtrack blade sharpen {} --kind edge|face [--final]",
                    snapshot.blade.code
                ))
                .cyan()
            );
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &BladeSnapshot, labels: &Labels) {
    let blade = &snapshot.blade;
    println!("{}", style(&blade.code).bold());
    println!("  Status:     {}", blade.status());
    println!("  Branch:     {}", labels.branch(blade));
    println!("  Type:       {}", labels.blade_type(blade));
    println!("  Registered: {}", format_timestamp(&blade.registration_date));
    if let Some(date) = &blade.terminal_sharpening_date {
        println!("  Closed:     {}", format_timestamp(date));
    }

    println!();
    if snapshot.history.is_empty() {
        println!("  No sharpenings recorded.");
        return;
    }
    println!("  Sharpening history ({}):", snapshot.history.len());
    for event in &snapshot.history {
        println!(
            "    {}  {:<4}  {}",
            format_timestamp(&event.timestamp),
            event.kind,
            event.notes.as_deref().unwrap_or("")
        );
    }
}

//! `sawtrack type` command - Blade type catalogue

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::filters::ActiveFilter;
use crate::cli::helpers::{resolve_ref, truncate_str, Workspace};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::directory::{BladeTypeForm, Directory, DirectoryEditor};
use crate::entities::BladeType;

#[derive(Subcommand, Debug)]
pub enum TypeCommands {
    /// List blade types
    List(ListArgs),

    /// Create a blade type (administrators only)
    New(NewArgs),

    /// Edit a blade type (administrators only)
    Edit(EditArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by active flag
    #[arg(long, short = 's', default_value = "all")]
    pub status: ActiveFilter,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short code, e.g. CIR-300
    #[arg(long, short = 'c')]
    pub code: String,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Free-form description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Create the type inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Type code, name, BTY@N or ID
    pub blade_type: String,

    /// New code
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New description (empty string clears it)
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Mark the type active
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Mark the type inactive; it can no longer be chosen for new blades
    #[arg(long)]
    pub inactive: bool,
}

const TYPE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "CODE"),
    ColumnDef::new("name", "NAME"),
    ColumnDef::new("active", "ACTIVE"),
    ColumnDef::new("description", "DESCRIPTION"),
];

pub fn run(cmd: TypeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TypeCommands::List(args) => run_list(args, global),
        TypeCommands::New(args) => run_new(args, global),
        TypeCommands::Edit(args) => run_edit(args, global),
    }
}

/// Match a type on its code or its name
pub fn type_matches(t: &BladeType, reference: &str) -> bool {
    t.code.eq_ignore_ascii_case(reference) || t.name.eq_ignore_ascii_case(reference)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    ws.session()?;
    let types: Vec<BladeType> = Directory::<BladeType>::load(&ws.store)?
        .iter()
        .filter(|t| args.status.matches(t.active))
        .cloned()
        .collect();

    if args.count {
        println!("{}", types.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_structured(&types, format)? {
        return Ok(());
    }
    if types.is_empty() {
        println!("No blade types found.");
        return Ok(());
    }

    let mut short_ids = ws.short_ids();
    for t in &types {
        short_ids.add(&t.id);
    }
    ws.save_short_ids(&short_ids);

    let rows: Vec<TableRow> = types
        .iter()
        .map(|t| {
            TableRow::new(t.id, &short_ids)
                .cell("code", t.code.clone())
                .cell("name", t.name.clone())
                .cell("active", if t.active { "yes" } else { "no" })
                .cell(
                    "description",
                    t.description
                        .as_deref()
                        .map(|d| truncate_str(d, 40))
                        .unwrap_or_else(|| "-".to_string()),
                )
        })
        .collect();
    TableFormatter::new(TYPE_COLUMNS, "blade types").output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;

    let form = BladeTypeForm {
        code: args.code,
        name: args.name,
        active: !args.inactive,
        description: args.description,
    };
    let blade_type: BladeType = DirectoryEditor::new(&mut ws.store, &session).create(&form)?;

    let mut short_ids = ws.short_ids();
    let short = short_ids.add(&blade_type.id);
    ws.save_short_ids(&short_ids);

    report_saved("Created", &blade_type, &short, global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let types: Directory<BladeType> = Directory::load(&ws.store)?;
    let mut short_ids = ws.short_ids();
    let id = resolve_ref(&args.blade_type, &types, &short_ids, "type", type_matches)?;

    let mut form = types.get(&id).map(BladeTypeForm::from).unwrap_or_default();
    if let Some(code) = args.code {
        form.code = code;
    }
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(description) = args.description {
        form.description = Some(description);
    }
    if args.active {
        form.active = true;
    }
    if args.inactive {
        form.active = false;
    }

    let blade_type: BladeType = DirectoryEditor::new(&mut ws.store, &session).edit(&id, &form)?;
    let short = short_ids.add(&blade_type.id);
    ws.save_short_ids(&short_ids);

    report_saved("Updated", &blade_type, &short, global)
}

fn report_saved(verb: &str, blade_type: &BladeType, short: &str, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Id => println!("{}", blade_type.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(blade_type, global.format)?;
        }
        _ if global.quiet => {}
        _ => {
            println!(
                "{} {} blade type {} - {} ({}){}",
                style("✓").green(),
                verb,
                style(&blade_type.code).cyan(),
                blade_type.name,
                style(short).dim(),
                if blade_type.active { "" } else { " [inactive]" }
            );
        }
    }
    Ok(())
}

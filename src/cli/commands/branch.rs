//! `sawtrack branch` command - Branch directory management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, format_timestamp, resolve_ref, title_matches, truncate_str, Workspace};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::directory::{BranchForm, Directory, DirectoryEditor};
use crate::entities::Branch;

#[derive(Subcommand, Debug)]
pub enum BranchCommands {
    /// List branches
    List(ListArgs),

    /// Create a branch (administrators only)
    New(NewArgs),

    /// Edit a branch (administrators only)
    Edit(EditArgs),

    /// Delete a branch (administrators only)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Branch name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Street address
    #[arg(long, short = 'a')]
    pub address: String,

    /// Contact phone
    #[arg(long, short = 'p')]
    pub phone: String,

    /// Person in charge
    #[arg(long, short = 'm')]
    pub manager: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Branch name, BRN@N or ID
    pub branch: String,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New address
    #[arg(long, short = 'a')]
    pub address: Option<String>,

    /// New phone
    #[arg(long, short = 'p')]
    pub phone: Option<String>,

    /// New manager (empty string clears it)
    #[arg(long, short = 'm')]
    pub manager: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Branch name, BRN@N or ID
    pub branch: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const BRANCH_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME"),
    ColumnDef::new("address", "ADDRESS"),
    ColumnDef::new("phone", "PHONE"),
    ColumnDef::new("manager", "MANAGER"),
    ColumnDef::new("created", "CREATED"),
];

pub fn run(cmd: BranchCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BranchCommands::List(args) => run_list(args, global),
        BranchCommands::New(args) => run_new(args, global),
        BranchCommands::Edit(args) => run_edit(args, global),
        BranchCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    ws.session()?;
    let branches: Directory<Branch> = Directory::load(&ws.store)?;

    if args.count {
        println!("{}", branches.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_structured(branches.items(), format)? {
        return Ok(());
    }
    if branches.is_empty() {
        println!("No branches found.");
        return Ok(());
    }

    let mut short_ids = ws.short_ids();
    for branch in branches.iter() {
        short_ids.add(&branch.id);
    }
    ws.save_short_ids(&short_ids);

    let rows: Vec<TableRow> = branches
        .iter()
        .map(|b| {
            TableRow::new(b.id, &short_ids)
                .cell("name", b.name.clone())
                .cell("address", truncate_str(&b.address, 40))
                .cell("phone", b.phone.clone())
                .cell("manager", b.manager.clone().unwrap_or_else(|| "-".to_string()))
                .cell("created", format_timestamp(&b.created))
        })
        .collect();
    TableFormatter::new(BRANCH_COLUMNS, "branches").output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;

    let form = BranchForm {
        name: args.name,
        address: args.address,
        phone: args.phone,
        manager: args.manager,
    };
    let branch: Branch = DirectoryEditor::new(&mut ws.store, &session).create(&form)?;

    let mut short_ids = ws.short_ids();
    let short = short_ids.add(&branch.id);
    ws.save_short_ids(&short_ids);

    report_saved("Created", &branch, &short, global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let branches: Directory<Branch> = Directory::load(&ws.store)?;
    let mut short_ids = ws.short_ids();
    let id = resolve_ref(&args.branch, &branches, &short_ids, "branch", title_matches)?;

    let mut form = branches.get(&id).map(BranchForm::from).unwrap_or_default();
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(address) = args.address {
        form.address = address;
    }
    if let Some(phone) = args.phone {
        form.phone = phone;
    }
    if let Some(manager) = args.manager {
        form.manager = Some(manager);
    }

    let branch: Branch = DirectoryEditor::new(&mut ws.store, &session).edit(&id, &form)?;
    let short = short_ids.add(&branch.id);
    ws.save_short_ids(&short_ids);

    report_saved("Updated", &branch, &short, global)
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    session.require_admin("delete records")?;

    let branches: Directory<Branch> = Directory::load(&ws.store)?;
    let short_ids = ws.short_ids();
    let id = resolve_ref(&args.branch, &branches, &short_ids, "branch", title_matches)?;
    let name = branches.get(&id).map(|b| b.name.clone()).unwrap_or_default();

    if !confirm(&format!("Delete branch '{}'?", name), args.yes)? {
        if !global.quiet {
            println!("Cancelled.");
        }
        return Ok(());
    }

    let branch: Branch = DirectoryEditor::new(&mut ws.store, &session).delete(&id)?;
    if !global.quiet {
        println!("{} Deleted branch {}", style("✓").green(), style(&branch.name).cyan());
    }
    Ok(())
}

fn report_saved(verb: &str, branch: &Branch, short: &str, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Id => println!("{}", branch.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(branch, global.format)?;
        }
        _ if global.quiet => {}
        _ => {
            println!(
                "{} {} branch {} ({})",
                style("✓").green(),
                verb,
                style(&branch.name).cyan(),
                style(short).dim()
            );
        }
    }
    Ok(())
}

//! `sawtrack user` command - Staff accounts and roles

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::filters::ActiveFilter;
use crate::cli::helpers::{format_timestamp, password_or_prompt, resolve_ref, title_matches, Workspace};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::auth::{normalize_email, LocalIdentity};
use crate::core::directory::{Directory, DirectoryEditor, UserForm};
use crate::core::identity::EntityId;
use crate::core::shortid::ShortIdIndex;
use crate::entities::{Branch, Role, User};

/// Role as accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RoleArg {
    Operator,
    Administrator,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Operator => Role::Operator,
            RoleArg::Administrator => Role::Administrator,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List(ListArgs),

    /// Create an account and profile (administrators only)
    New(NewArgs),

    /// Edit a user profile (administrators only)
    Edit(EditArgs),

    /// Switch a user between operator and administrator
    ToggleRole(TargetArgs),

    /// Activate or deactivate a user
    ToggleActive(TargetArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by active flag
    #[arg(long, short = 's', default_value = "all")]
    pub status: ActiveFilter,

    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<RoleArg>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Sign-in email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Full name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Role
    #[arg(long, short = 'r')]
    pub role: Option<RoleArg>,

    /// Home branch (name, BRN@N or ID)
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Initial password (prompted twice when omitted)
    #[arg(long, env = "SAWTRACK_NEW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Create the user inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Email, name, USR@N or ID
    pub user: String,

    /// New full name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New role
    #[arg(long, short = 'r')]
    pub role: Option<RoleArg>,

    /// New home branch
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Mark the user active
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Mark the user inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Email, name, USR@N or ID
    pub user: String,
}

const USER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("email", "EMAIL"),
    ColumnDef::new("name", "NAME"),
    ColumnDef::new("role", "ROLE"),
    ColumnDef::new("branch", "BRANCH"),
    ColumnDef::new("active", "ACTIVE"),
    ColumnDef::new("created", "CREATED"),
];

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::List(args) => run_list(args, global),
        UserCommands::New(args) => run_new(args, global),
        UserCommands::Edit(args) => run_edit(args, global),
        UserCommands::ToggleRole(args) => run_toggle(args, global, Toggle::Role),
        UserCommands::ToggleActive(args) => run_toggle(args, global, Toggle::Active),
    }
}

fn user_matches(user: &User, reference: &str) -> bool {
    user.email == normalize_email(reference) || title_matches(user, reference)
}

fn resolve_user(ws: &Workspace, reference: &str, short_ids: &ShortIdIndex) -> Result<EntityId> {
    let users: Directory<User> = Directory::load(&ws.store)?;
    resolve_ref(reference, &users, short_ids, "user", user_matches)
}

fn resolve_branch(ws: &Workspace, reference: &str, short_ids: &ShortIdIndex) -> Result<EntityId> {
    let branches: Directory<Branch> = Directory::load(&ws.store)?;
    resolve_ref(reference, &branches, short_ids, "branch", title_matches)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    ws.session()?;
    let branches: Directory<Branch> = Directory::load(&ws.store)?;
    let role = args.role.map(Role::from);
    let users: Vec<User> = Directory::<User>::load(&ws.store)?
        .iter()
        .filter(|u| args.status.matches(u.active))
        .filter(|u| role.is_none_or(|r| u.role == r))
        .cloned()
        .collect();

    if args.count {
        println!("{}", users.len());
        return Ok(());
    }

    let format = effective_format(global.format, true);
    if print_structured(&users, format)? {
        return Ok(());
    }
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut short_ids = ws.short_ids();
    for user in &users {
        short_ids.add(&user.id);
    }
    ws.save_short_ids(&short_ids);

    let rows: Vec<TableRow> = users
        .iter()
        .map(|u| {
            let branch = branches
                .get(&u.branch)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| u.branch.to_string());
            TableRow::new(u.id, &short_ids)
                .cell("email", u.email.clone())
                .cell("name", u.name.clone())
                .cell("role", u.role.to_string())
                .cell("branch", branch)
                .cell("active", if u.active { "yes" } else { "no" })
                .cell("created", format_timestamp(&u.created_at))
        })
        .collect();
    TableFormatter::new(USER_COLUMNS, "users").output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    session.require_admin("create users")?;

    let mut short_ids = ws.short_ids();
    let branch = args
        .branch
        .as_deref()
        .map(|r| resolve_branch(&ws, r, &short_ids))
        .transpose()?;
    let (password, confirmation) = password_or_prompt(args.password, "Initial password", true)?;

    let form = UserForm {
        email: args.email,
        name: args.name,
        role: args.role.map(Role::from),
        branch,
        active: !args.inactive,
    };
    let mut identity = LocalIdentity::open(&ws.project)?;
    let user = DirectoryEditor::new(&mut ws.store, &session).provision_user(
        &mut identity,
        &form,
        &password,
        confirmation.as_deref(),
    )?;

    let short = short_ids.add(&user.id);
    ws.save_short_ids(&short_ids);
    report_saved("Created", &user, &short, global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let mut short_ids = ws.short_ids();
    let id = resolve_user(&ws, &args.user, &short_ids)?;
    let branch = args
        .branch
        .as_deref()
        .map(|r| resolve_branch(&ws, r, &short_ids))
        .transpose()?;

    let users: Directory<User> = Directory::load(&ws.store)?;
    let mut form = users.get(&id).map(UserForm::from).unwrap_or_default();
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(role) = args.role {
        form.role = Some(role.into());
    }
    if branch.is_some() {
        form.branch = branch;
    }
    if args.active {
        form.active = true;
    }
    if args.inactive {
        form.active = false;
    }

    let user = DirectoryEditor::new(&mut ws.store, &session).edit_user(&id, &form)?;
    let short = short_ids.add(&user.id);
    ws.save_short_ids(&short_ids);
    report_saved("Updated", &user, &short, global)
}

enum Toggle {
    Role,
    Active,
}

fn run_toggle(args: TargetArgs, global: &GlobalOpts, toggle: Toggle) -> Result<()> {
    let mut ws = Workspace::open()?;
    let session = ws.session()?;
    let mut short_ids = ws.short_ids();
    let id = resolve_user(&ws, &args.user, &short_ids)?;

    let mut editor = DirectoryEditor::new(&mut ws.store, &session);
    let user = match toggle {
        Toggle::Role => editor.toggle_role(&id)?,
        Toggle::Active => editor.toggle_active(&id)?,
    };

    let short = short_ids.add(&user.id);
    ws.save_short_ids(&short_ids);
    report_saved("Updated", &user, &short, global)
}

fn report_saved(verb: &str, user: &User, short: &str, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Id => println!("{}", user.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(user, global.format)?;
        }
        _ if global.quiet => {}
        _ => {
            println!(
                "{} {} user {} <{}> ({}) - {}, {}",
                style("✓").green(),
                verb,
                style(&user.name).cyan(),
                user.email,
                style(short).dim(),
                user.role,
                if user.active { "active" } else { "inactive" }
            );
        }
    }
    Ok(())
}

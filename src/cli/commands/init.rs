//! `sawtrack init` command - Initialize a new project

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::password_or_prompt;
use crate::cli::GlobalOpts;
use crate::core::auth::{check_new_password, IdentityProvider, LocalIdentity};
use crate::core::directory::{BranchForm, CreatableEntity, Directory};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::{Project, ProjectError};
use crate::core::store::{DocumentStore, FileStore};
use crate::entities::{Branch, Role, User};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Reinitialize an existing project (records are kept)
    #[arg(long)]
    pub force: bool,

    /// Email of the first administrator
    #[arg(long)]
    pub admin_email: String,

    /// Name of the first administrator
    #[arg(long, default_value = "Administrator")]
    pub admin_name: String,

    /// Administrator password (prompted when omitted)
    #[arg(long, env = "SAWTRACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Name of the seed branch
    #[arg(long, default_value = "Main")]
    pub branch_name: String,

    /// Address of the seed branch
    #[arg(long, default_value = "not set")]
    pub branch_address: String,

    /// Phone of the seed branch
    #[arg(long, default_value = "not set")]
    pub branch_phone: String,
}

pub fn run(args: InitArgs, _global: &GlobalOpts) -> Result<()> {
    let (password, confirmation) =
        password_or_prompt(args.password.clone(), "Administrator password", true)?;
    check_new_password(&password, confirmation.as_deref())?;

    let project = match Project::init_with(&args.path, args.force) {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} sawtrack project already exists at {}",
                style("!").yellow(),
                path.display()
            );
            println!("  Use {} to reinitialize", style("--force").yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut store = FileStore::open(&project)?;
    let mut identity = LocalIdentity::open(&project)?;

    let branch = seed_branch(&mut store, &args)?;
    if identity.has_account(&args.admin_email) {
        println!(
            "{} Account {} already exists, keeping it",
            style("!").yellow(),
            style(&args.admin_email).cyan()
        );
    } else {
        let uid = identity.create_account(&args.admin_email, &password)?;
        let admin = User {
            id: uid,
            email: crate::core::auth::normalize_email(&args.admin_email),
            name: args.admin_name.trim().to_string(),
            role: Role::Administrator,
            branch,
            active: true,
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        store.create(&admin)?;
        tracing::info!(id = %admin.id, "created first administrator");
    }

    println!(
        "{} Initialized sawtrack project in {}",
        style("✓").green(),
        project.root().display()
    );
    println!();
    println!("Next steps:");
    println!(
        "  {}  Sign in",
        style(format!("sawtrack login --email {}", args.admin_email)).cyan()
    );
    println!("  {}  Add a blade type", style("sawtrack type new").cyan());
    println!("  {}  Look a blade up", style("sawtrack blade lookup <CODE>").cyan());

    Ok(())
}

/// Reuse a branch with the seed name or create it
fn seed_branch(store: &mut FileStore, args: &InitArgs) -> Result<EntityId> {
    let existing: Directory<Branch> = Directory::load(&*store)?;
    if let Some(branch) = existing
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(args.branch_name.trim()))
    {
        return Ok(branch.id);
    }

    let form = BranchForm {
        name: args.branch_name.clone(),
        address: args.branch_address.clone(),
        phone: args.branch_phone.clone(),
        manager: None,
    };
    let branch = Branch::from_form(EntityId::new(EntityPrefix::Brn), &form, chrono::Utc::now())?;
    store.create(&branch)?;
    Ok(branch.id)
}

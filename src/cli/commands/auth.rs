//! `sawtrack login`, `logout` and `whoami` - session init and teardown

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{format_timestamp, password_or_prompt, Workspace};
use crate::cli::output::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::auth::LocalIdentity;
use crate::core::directory::Directory;
use crate::core::session::{sign_in, IdentityGate, Session};
use crate::entities::Branch;

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "SAWTRACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let identity = LocalIdentity::open(&ws.project)?;
    let (password, _) = password_or_prompt(args.password, "Password", false)?;

    let session = sign_in(&identity, &ws.store, &args.email, &password)?;
    IdentityGate::new(&ws.project).persist(&session)?;

    if !global.quiet {
        println!(
            "{} Signed in as {} <{}> ({})",
            style("✓").green(),
            style(&session.user().name).cyan(),
            session.email(),
            session.user().role
        );
    }
    Ok(())
}

pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let existed = IdentityGate::new(&ws.project).clear()?;
    if !global.quiet {
        if existed {
            println!("{} Signed out", style("✓").green());
        } else {
            println!("Not signed in.");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct WhoAmI<'a> {
    id: String,
    email: &'a str,
    name: &'a str,
    role: String,
    branch: Option<String>,
    signed_in_at: String,
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session: Session = ws.session()?;
    let user = session.user();
    let branches: Directory<Branch> = Directory::load(&ws.store)?;
    let branch = branches.get(&user.branch);

    let info = WhoAmI {
        id: user.id.to_string(),
        email: &user.email,
        name: &user.name,
        role: user.role.to_string(),
        branch: branch.map(|b| b.name.clone()),
        signed_in_at: format_timestamp(&session.signed_in_at()),
    };

    match global.format {
        OutputFormat::Id => println!("{}", info.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(&info, global.format)?;
        }
        _ => {
            println!("{} <{}>", style(info.name).cyan(), info.email);
            println!("  Role:      {}", info.role);
            println!("  Branch:    {}", info.branch.as_deref().unwrap_or("-"));
            println!("  Signed in: {}", info.signed_in_at);
        }
    }
    Ok(())
}

//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    auth::LoginArgs, blade::BladeCommands, blade_type::TypeCommands, branch::BranchCommands,
    completions::CompletionsArgs, init::InitArgs, report::ReportCommands, user::UserCommands,
    validate::ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "sawtrack")]
#[command(version, propagate_version = true)]
#[command(about = "Track saw-blade sharpening across branch locations")]
#[command(
    long_about = "Track saw-blade sharpening across branch locations.\n\n\
    Blades, sharpening events, branches, blade types and users are stored as \
    plain-text YAML records inside a project directory."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// Comma-separated values
    Csv,
    Json,
    Yaml,
    /// Record IDs only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project with a seed branch and an administrator
    Init(InitArgs),

    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Blade lookup, registration and sharpening
    #[command(subcommand)]
    Blade(BladeCommands),

    /// Branch directory
    #[command(subcommand)]
    Branch(BranchCommands),

    /// Blade type directory
    #[command(subcommand, name = "type")]
    Type(TypeCommands),

    /// User directory
    #[command(subcommand)]
    User(UserCommands),

    /// Dashboard statistics and exports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Check every record against its schema and the cross-record rules
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

use clap::Parser;
use miette::Result;
use sawtrack::cli::commands;
use sawtrack::cli::{Cli, Commands};
use sawtrack::core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = cli.global;
    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Login(args) => commands::auth::run_login(args, &global),
        Commands::Logout => commands::auth::run_logout(&global),
        Commands::Whoami => commands::auth::run_whoami(&global),
        Commands::Blade(cmd) => commands::blade::run(cmd, &global),
        Commands::Branch(cmd) => commands::branch::run(cmd, &global),
        Commands::Type(cmd) => commands::blade_type::run(cmd, &global),
        Commands::User(cmd) => commands::user::run(cmd, &global),
        Commands::Report(cmd) => commands::report::run(cmd, &global),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Log filter: `-v` count wins, then SAWTRACK_LOG / config `log`, then warnings only
fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => Config::load().log.unwrap_or_else(|| "warn".to_string()),
        1 => "sawtrack=info".to_string(),
        2 => "sawtrack=debug".to_string(),
        _ => "sawtrack=trace".to_string(),
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

use clap::Parser;
use passvault::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr; stdout carries command output.
fn init_logging() {
    let filter = EnvFilter::try_from_env("PASSVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => passvault::cli::commands::init::execute(&cli),
        Commands::Add {
            ref account,
            ref username,
            ref secret,
        } => passvault::cli::commands::add::execute(
            &cli,
            account,
            username.as_deref(),
            secret.as_deref(),
        ),
        Commands::Get { ref account } => passvault::cli::commands::get::execute(&cli, account),
        Commands::List { show } => passvault::cli::commands::list::execute(&cli, show),
        Commands::Remove { ref account, force } => {
            passvault::cli::commands::remove::execute(&cli, account, force)
        }
        Commands::Update {
            ref account,
            ref username,
        } => passvault::cli::commands::update::execute(&cli, account, username.as_deref()),
        Commands::Menu => passvault::cli::commands::menu::execute(&cli),
        Commands::Version => passvault::cli::commands::version::execute(),
        Commands::Completions { ref shell } => passvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        passvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

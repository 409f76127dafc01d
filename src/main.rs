use clap::Parser;
use strongbox::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `strongbox=info`).
const LOG_ENV: &str = "STRONGBOX_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => strongbox::cli::commands::init::execute(&cli, force),
        Commands::Unlock => strongbox::cli::commands::unlock::execute(&cli),
        Commands::Add {
            ref name,
            ref record_type,
            ref value,
            ref file,
        } => strongbox::cli::commands::add::execute(
            &cli,
            name,
            record_type,
            value.as_deref(),
            file.as_deref(),
        ),
        Commands::Get { ref name } => strongbox::cli::commands::get::execute(&cli, name),
        Commands::List => strongbox::cli::commands::list::execute(&cli),
        Commands::Remove { ref name, force } => {
            strongbox::cli::commands::remove::execute(&cli, name, force)
        }
        Commands::Verify => strongbox::cli::commands::verify::execute(&cli),
        Commands::Export { ref dst } => strongbox::cli::commands::export::execute(&cli, dst),
        Commands::Import {
            ref src,
            no_hmac,
            force,
        } => strongbox::cli::commands::import_cmd::execute(&cli, src, no_hmac, force),
        Commands::Passwd => strongbox::cli::commands::passwd::execute(&cli),
    };

    if let Err(e) = result {
        strongbox::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

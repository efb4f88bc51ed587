//! recipe-beam CLI — beam search over food catalogs for stat-maximizing recipes.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "recipe-beam",
    version,
    about = "Beam search for recipes that maximize prioritized stats"
)]
struct Cli {
    /// Debug-level diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: recipe_beam::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    recipe_beam::logging::LoggingConfig::from_env(cli.verbose).init();
    if let Err(e) = recipe_beam::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

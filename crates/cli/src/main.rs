use std::path::PathBuf;

use anyhow::Context;
use catalog_app::modules::catalog::ROUTES;
use catalog_db::seed::Seed;
use catalog_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "catalog-cli", version, about = "Local library catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on, overriding configuration
        #[arg(long)]
        port: Option<u16>,
        /// Seed file to load at startup, overriding configuration
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Print the route table
    Routes,
    /// Parse a seed file and report document counts per collection
    CheckSeed { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Serve { port, seed } => {
            let mut settings = Settings::load().context("failed to load catalog settings")?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            if seed.is_some() {
                settings.database.seed_path = seed;
            }
            catalog_app::bootstrap::run(settings).await
        }
        Command::Routes => {
            print_routes();
            Ok(())
        }
        Command::CheckSeed { path } => check_seed(&path),
    }
}

fn print_routes() {
    let server = [("GET", "/healthz".to_string()), ("GET", "/".to_string())];
    let catalog = ROUTES.iter().map(|&(method, path)| match path {
        "/" => (method, "/catalog".to_string()),
        path => (method, format!("/catalog{path}")),
    });

    for (method, path) in server.into_iter().chain(catalog) {
        println!("{method:<9} {path}");
    }
}

fn check_seed(path: &std::path::Path) -> anyhow::Result<()> {
    let seed = Seed::from_path(path)
        .with_context(|| format!("invalid seed file '{}'", path.display()))?;

    let counts = seed.counts();
    for (collection, documents) in &counts {
        println!("{collection}: {documents}");
    }
    tracing::debug!(collections = counts.len(), "seed file checked");
    Ok(())
}

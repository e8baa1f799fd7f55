mod commands;
mod notify;
mod stackfile;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stack")]
#[command(about = "Declarative AWS application stacks", long_about = None)]
struct Cli {
    /// Stack file describing the application's deltas
    #[arg(
        short,
        long,
        global = true,
        default_value = "stack.yaml",
        env = "STACKFLOW_FILE"
    )]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the deployment for a delta and tag
    Up {
        /// Deployment slot (e.g. staging, prod)
        delta: String,
        /// Version label
        tag: String,
    },
    /// Tear the deployment down
    Down {
        delta: String,
        tag: String,
    },
    /// Print a tier's environment as export lines
    Env {
        delta: String,
        tag: String,
        /// Tier to print (web or worker)
        #[arg(long, default_value = "web")]
        tier: String,
    },
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Up { delta, tag } => commands::up::handle(&cli.file, &delta, &tag).await,
        Commands::Down { delta, tag } => commands::down::handle(&cli.file, &delta, &tag).await,
        Commands::Env { delta, tag, tier } => {
            commands::env::handle(&cli.file, &delta, &tag, &tier).await
        }
        Commands::Version => {
            println!("stackflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

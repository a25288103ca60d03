use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "platetree")]
#[command(about = "Rebuild and check the plate hierarchy of an imaging archive listing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build structure files from an object listing
    Structure {
        /// Listing file, one `date time size path` line per object
        listing: PathBuf,
        /// Directory receiving one folder per dataset
        #[arg(long, default_value = "./outputs")]
        output_dir: PathBuf,
        /// YAML file overriding the classification vocabulary
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a full structure file against a JSON schema and prune what fails
    Validate {
        /// structure_extensive.json produced by `structure`
        input: PathBuf,
        /// Output file [default: <stem>_validated.json next to the input]
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,
    },
    /// Print a structure file as a tree
    Show {
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();

    match cli.command {
        Commands::Structure {
            listing,
            output_dir,
            config,
        } => {
            commands::structure_command(&listing, &output_dir, config.as_deref()).await?;
        }
        Commands::Validate {
            input,
            output,
            schema,
        } => {
            commands::validate_command(&input, output.as_deref(), &schema).await?;
        }
        Commands::Show { input } => commands::show_command(&input).await?,
    }

    Ok(())
}

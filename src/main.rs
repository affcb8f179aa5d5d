use anyhow::Context;
use clap::{Parser, Subcommand};
use nagl_models::config::Config;
use nagl_models::models::sha256_file;
use nagl_models::ModelResolver;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nagl-models")]
#[command(about = "Fetch, verify and cache GNN model weight files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a model file to a local path, downloading if necessary
    Fetch {
        /// Model filename, e.g. openff-gnn-am1bcc-0.1.0-rc.3.pt
        filename: String,
        /// Zenodo DOI to fall back to when no release carries the file
        #[arg(long)]
        doi: Option<String>,
        /// Expected SHA-256 of the file, overriding the built-in registry
        #[arg(long = "hash")]
        expected_hash: Option<String>,
    },
    /// List model files available in installed directories
    List,
    /// Print the newest installed model of a given type
    Latest {
        /// Model type, e.g. am1bcc
        model_type: String,
        /// Skip pre-release versions
        #[arg(long)]
        production_only: bool,
    },
    /// Print the SHA-256 digest of a local file
    Hash {
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let resolver = ModelResolver::from_config(&config).context("Failed to set up resolver")?;

    match cli.command {
        Commands::Fetch {
            filename,
            doi,
            expected_hash,
        } => {
            let path = resolver.resolve(&filename, doi.as_deref(), expected_hash.as_deref())?;
            println!("{}", path.display());
        }
        Commands::List => {
            for path in resolver.list_available() {
                println!("{}", path.display());
            }
        }
        Commands::Latest {
            model_type,
            production_only,
        } => match resolver.latest_model(&model_type, production_only) {
            Some(path) => println!("{}", path.display()),
            None => {
                eprintln!("No installed models of type '{model_type}'");
                std::process::exit(1);
            }
        },
        Commands::Hash { path } => {
            println!("{}", sha256_file(&path)?);
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use docnotary::config::NotaryConfig;
use docnotary::handlers::{
    build_gateway, build_ledger, handle_count, handle_history, handle_list, handle_upload,
    handle_verify_file, handle_verify_hash,
};
use docnotary::Notary;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notary", version, about = "Notarize documents on a ledger and verify them later")]
struct Cli {
    /// Print machine-readable JSON instead of status lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a file, pin it to storage and record it on the ledger
    Upload {
        file: PathBuf,
        /// Override the MIME type guessed from the extension
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Check whether a digest or file is registered
    Verify {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        hash: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show the number of registered documents
    Count,
    /// List registered digests in insertion order
    List {
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// List digests recorded by one uploader
    History { uploader: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = NotaryConfig::from_env()?;
    info!("Using {:?} ledger", config.ledger.backend);

    let ledger = build_ledger(&config.ledger)?;
    let gateway = match &cli.command {
        Command::Upload { .. } => Some(build_gateway(&config.gateway()?)),
        _ => None,
    };
    let notary = Notary::start(ledger, gateway).await;

    let mut stdout = std::io::stdout();
    let ok = match &cli.command {
        Command::Upload { file, mime_type } => {
            handle_upload(&notary, file, mime_type.as_deref(), cli.json, &mut stdout).await?
        }
        Command::Verify { hash: Some(hash), .. } => {
            handle_verify_hash(&notary, hash, cli.json, &mut stdout).await?
        }
        Command::Verify { file: Some(file), .. } => {
            handle_verify_file(&notary, file, cli.json, &mut stdout).await?
        }
        Command::Verify { .. } => {
            handle_verify_hash(&notary, "", cli.json, &mut stdout).await?
        }
        Command::Count => handle_count(&notary, &mut stdout).await?,
        Command::List { offset, limit } => {
            handle_list(&notary, *offset, *limit, cli.json, &mut stdout).await?
        }
        Command::History { uploader } => handle_history(&notary, uploader, &mut stdout).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

mod cli;

use crate::cli::app::BrowserApp;
use clap::{Parser, Subcommand, ValueEnum};
use dayledger::facade::Ledger;
use dayledger::store::DurabilityMode;
use dayledger::web::{serve, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dayledger", about = "Personal day ledger", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the ledger API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:4000")]
        addr: SocketAddr,
        /// Directory for the journal and snapshot; omit for in-memory only
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// How aggressively journal writes hit the disk
        #[arg(long, value_enum, default_value_t = Durability::Async)]
        durability: Durability,
    },
    /// Open the terminal history browser against a running server
    Browse {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:4000")]
        server: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Create the account instead of logging in
        #[arg(long)]
        register: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Durability {
    Sync,
    Async,
    None,
}

impl From<Durability> for DurabilityMode {
    fn from(d: Durability) -> Self {
        match d {
            Durability::Sync => DurabilityMode::Sync,
            Durability::Async => DurabilityMode::Async,
            Durability::None => DurabilityMode::None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            addr,
            data_dir,
            durability,
        } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "dayledger=info,tower_http=info".into()),
                )
                .init();

            let ledger = match data_dir {
                Some(dir) => Ledger::open(dir, durability.into())?,
                None => Ledger::in_memory(),
            };
            serve(addr, AppState::new(Arc::new(ledger))).await?;
        }
        Command::Browse {
            server,
            username,
            password,
            register,
        } => {
            let mut app = BrowserApp::connect(&server, &username, &password, register).await?;
            app.run().await.map_err(|e| anyhow::anyhow!("{e}"))?;
        }
    }

    Ok(())
}

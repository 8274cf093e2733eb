//! CLI entry point for schemaward.
//!
//! Results go to stdout as JSON (or TOML for `import`); logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use schemaward_core::{PolicyKind, SessionConfig};
use schemaward_remote::{ControllerSettings, SchemaClient};

use schemaward_cli::apply::{self, Controllers};
use schemaward_cli::manifest::Manifest;

#[derive(Parser)]
#[command(name = "schemaward")]
#[command(about = "Keep a remote graph schema's policies in line with a manifest")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: schemaward).
    #[arg(short, long, default_value = "schemaward", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a manifest without contacting the service.
    Validate {
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Describe the policy kinds a manifest can declare.
    Kinds,
    #[command(flatten)]
    Remote(RemoteCommand),
}

/// Commands that need an authenticated session.
#[derive(Subcommand)]
enum RemoteCommand {
    /// Create or replace every entry declared in a manifest.
    Apply {
        #[arg(short, long)]
        manifest: PathBuf,
        /// Also delete undeclared entries of the kinds the manifest declares.
        #[arg(long)]
        prune: bool,
    },
    /// Print one entry's remote state.
    Get {
        #[arg(short, long)]
        kind: PolicyKind,
        #[arg(short, long)]
        name: String,
    },
    /// Print an existing remote entry as manifest TOML.
    Import {
        #[arg(short, long)]
        kind: PolicyKind,
        #[arg(short, long)]
        name: String,
    },
    /// Delete one entry (no-op when absent).
    Delete {
        #[arg(short, long)]
        kind: PolicyKind,
        #[arg(short, long)]
        name: String,
    },
    /// Report whether one entry exists.
    Exists {
        #[arg(short, long)]
        kind: PolicyKind,
        #[arg(short, long)]
        name: String,
    },
    /// Print every entry of one kind.
    List {
        #[arg(short, long)]
        kind: PolicyKind,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            println!(
                "{}",
                serde_json::json!({ "valid": true, "entries": manifest.len() })
            );
        }
        Command::Kinds => println!("{}", apply::kinds()),
        Command::Remote(command) => run_remote(command, &cli.config).await?,
    }

    Ok(())
}

async fn run_remote(command: RemoteCommand, config_prefix: &str) -> anyhow::Result<()> {
    let config = SessionConfig::load(config_prefix)?;
    let client = SchemaClient::connect(&config).await?;
    let controllers = Controllers::new(client, ControllerSettings::from(&config));

    match command {
        RemoteCommand::Apply { manifest, prune } => {
            let manifest = Manifest::load(&manifest)?;
            let summary = apply::apply_manifest(&controllers, &manifest, prune).await?;
            println!("{}", serde_json::to_string(&summary)?);
        }
        RemoteCommand::Get { kind, name } => match apply::get(&controllers, kind, &name).await? {
            Some(entry) => println!("{entry}"),
            None => anyhow::bail!("{kind} '{name}' does not exist"),
        },
        RemoteCommand::Import { kind, name } => {
            match apply::import(&controllers, kind, &name).await? {
                Some(manifest) => print!("{}", manifest.to_toml()?),
                None => anyhow::bail!("{kind} '{name}' does not exist"),
            }
        }
        RemoteCommand::Delete { kind, name } => {
            let deleted = apply::delete(&controllers, kind, &name).await?;
            println!("{}", serde_json::json!({ "deleted": deleted }));
        }
        RemoteCommand::Exists { kind, name } => {
            let exists = apply::exists(&controllers, kind, &name).await?;
            println!("{}", serde_json::json!({ "exists": exists }));
        }
        RemoteCommand::List { kind } => {
            println!("{}", apply::list(&controllers, kind).await?);
        }
    }

    Ok(())
}

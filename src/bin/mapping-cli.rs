use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mapping_admin_client::AdminClient;
use serde::Serialize;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mapping-cli")]
#[command(about = "Management CLI for the mapping admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8085")]
    url: String,

    #[arg(long, default_value = "admin")]
    user: String,

    #[arg(long, default_value = "admin")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the mapping JSON Schema
    Schema,
    /// Print the draft, or the active mapping when no draft exists
    Get,
    /// Print the validated active mapping
    Active,
    /// Apply a JSON Patch (file path, or - for stdin) to the draft
    Patch { file: PathBuf },
    /// Promote the draft to active
    Deploy,
    /// Throw the draft away
    Discard,
    /// Validate a document (file path, or - for stdin) against the schema
    Validate { file: PathBuf },
    /// List archived versions, newest first
    History,
    /// Print one archived version
    Show { id: String },
    /// Restore an archived version as active
    Rollback { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = AdminClient::new(&cli.url, &cli.user, &cli.password);

    match cli.command {
        Commands::Schema => print_json(&client.schema().await?)?,
        Commands::Get => print_json(&client.config().await?)?,
        Commands::Active => print_json(&client.active().await?)?,
        Commands::Patch { file } => {
            let patch = read_document(&file)?;
            print_json(&client.patch(&patch).await?)?;
        }
        Commands::Deploy => print_json(&client.deploy().await?)?,
        Commands::Discard => print_json(&client.discard().await?)?,
        Commands::Validate { file } => {
            let document = read_document(&file)?;
            let reply = client.validate(&document).await?;
            print_json(&reply)?;
            if !reply.valid {
                std::process::exit(1);
            }
        }
        Commands::History => {
            let entries = client.history().await?;
            if entries.is_empty() {
                println!("No archived versions");
            }
            for entry in entries {
                println!("{:<12} {:<22} {}", entry.id, entry.date, entry.comment);
            }
        }
        Commands::Show { id } => print_json(&client.version(&id).await?)?,
        Commands::Rollback { id } => print_json(&client.rollback(&id).await?)?,
    }

    Ok(())
}

fn read_document(file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

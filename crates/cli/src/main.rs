//! Registry CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the registry tables and the session table
//! registry migrate
//!
//! # Create an operator account (password read from stdin)
//! echo 'long secret' | registry user create --username admin
//!
//! # Remove photo files no record references
//! registry uploads sweep
//! ```
//!
//! All commands read the same environment as the server
//! (`REGISTRY_DATABASE_URL`, `REGISTRY_UPLOAD_DIR`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "registry")]
#[command(author, version, about = "Person registry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage operator accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Maintain the photo upload directory
    Uploads {
        #[command(subcommand)]
        action: UploadsAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new operator; the password is read from stdin
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum UploadsAction {
    /// Delete photo files that no person record references
    Sweep,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { username } => {
                commands::user::create(&username).await?;
            }
        },
        Commands::Uploads { action } => match action {
            UploadsAction::Sweep => {
                commands::uploads::sweep().await?;
            }
        },
    }
    Ok(())
}

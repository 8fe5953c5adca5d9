//! Summit CLI - Database migrations and member management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! summit-cli migrate
//!
//! # Promote a member to admin
//! summit-cli member set-role --id idp_01HZX4T9 --role admin
//!
//! # Show a member record
//! summit-cli member show --id idp_01HZX4T9
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `member set-role` - Change a member's role
//! - `member show` - Show a member record

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "summit-cli")]
#[command(author, version, about = "Summit CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    /// Change a member's role
    SetRole {
        /// Member id (the identity provider's id)
        #[arg(short, long)]
        id: String,

        /// Role to assign (`member`, `admin`)
        #[arg(short, long)]
        role: String,
    },
    /// Show a member record
    Show {
        /// Member id (the identity provider's id)
        #[arg(short, long)]
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Member { action } => match action {
            MemberAction::SetRole { id, role } => {
                commands::member::set_role(&id, &role).await?;
            }
            MemberAction::Show { id } => {
                commands::member::show(&id).await?;
            }
        },
    }
    Ok(())
}

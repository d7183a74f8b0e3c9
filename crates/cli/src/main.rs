//! Customer Identity CLI - migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run identity database migrations
//! ci-cli migrate
//!
//! # Create a customer (registers in Cognito, then stores locally)
//! ci-cli account create -k customer -n "Ana Souza" -c 171.079.720-73 -e ana@example.com
//!
//! # Look up an admin user by CPF
//! ci-cli account show -k admin -c 17107972073
//!
//! # Check a CPF without touching anything
//! ci-cli cpf check 171.079.720-73
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use customer_identity_core::AccountKind;

mod commands;

#[derive(Parser)]
#[command(name = "ci-cli")]
#[command(author, version, about = "Customer identity CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage customer and admin accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// CPF utilities
    Cpf {
        #[command(subcommand)]
        action: CpfAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Register and store a new account
    Create {
        /// Account kind
        #[arg(short, long, value_enum, default_value_t = Kind::Customer)]
        kind: Kind,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// CPF, with or without punctuation
        #[arg(short, long)]
        cpf: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },
    /// Show a stored account by CPF
    Show {
        /// Account kind
        #[arg(short, long, value_enum, default_value_t = Kind::Customer)]
        kind: Kind,

        /// CPF, with or without punctuation
        #[arg(short, long)]
        cpf: String,
    },
}

#[derive(Subcommand)]
enum CpfAction {
    /// Normalize and validate a CPF
    Check {
        /// CPF, with or without punctuation
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Customer,
    Admin,
}

impl From<Kind> for AccountKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Customer => Self::Customer,
            Kind::Admin => Self::AdminUser,
        }
    }
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
        Commands::Account { action } => match action {
            AccountAction::Create {
                kind,
                name,
                cpf,
                email,
            } => {
                commands::account::create(kind.into(), name, cpf, email).await?;
            }
            AccountAction::Show { kind, cpf } => {
                commands::account::show(kind.into(), &cpf).await?;
            }
        },
        Commands::Cpf { action } => match action {
            CpfAction::Check { value } => commands::cpf::check(&value)?,
        },
    }
    Ok(())
}

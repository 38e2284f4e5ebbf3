use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod console;

use console::Console;

#[derive(Parser)]
#[command(name = "mockapi")]
#[command(about = "MockAPI console - manage mock API projects and watch their request logs", long_about = None)]
struct Cli {
    /// Directory holding config.toml and storage.toml
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange email and password for a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MOCKAPI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show whether a session is held
    Status,
    /// Show the signed-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MOCKAPI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List organizations and their projects
    Orgs,
    /// Create an organization
    CreateOrg { name: String },
    /// Create a project inside an organization
    CreateProject {
        #[arg(long)]
        org: i64,
        name: String,
        /// URL slug under which the mock engine serves the project
        slug: String,
    },
    /// Add a mock endpoint to a project
    CreateEndpoint {
        #[arg(long)]
        project: i64,
        #[arg(long, default_value = "GET")]
        method: String,
        path: String,
        #[arg(long, default_value_t = 200)]
        status: u16,
        #[arg(long, default_value = "{}")]
        body: String,
    },
    /// Follow the live request log of a project
    Tail {
        /// Project URL slug
        slug: String,
        /// Reopen the log channel when it drops
        #[arg(long)]
        reconnect: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let console = Console::bootstrap(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&console, &email, &password).await?
        }
        Commands::Logout => commands::session::logout(&console),
        Commands::Status => commands::session::status(&console),
        Commands::Whoami => commands::session::whoami(&console).await?,
        Commands::Register { email, password } => {
            commands::session::register(&console, &email, &password).await?
        }
        Commands::Orgs => commands::resources::list_organizations(&console).await?,
        Commands::CreateOrg { name } => {
            commands::resources::create_organization(&console, &name).await?
        }
        Commands::CreateProject { org, name, slug } => {
            commands::resources::create_project(&console, org, &name, &slug).await?
        }
        Commands::CreateEndpoint {
            project,
            method,
            path,
            status,
            body,
        } => {
            commands::resources::create_endpoint(&console, project, &method, &path, status, body)
                .await?
        }
        Commands::Tail { slug, reconnect } => commands::tail::run(&console, &slug, reconnect).await?,
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout carries command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

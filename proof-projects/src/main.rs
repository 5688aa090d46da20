//! proof-projects - Project listing and management for Proofroom

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use libproofroom::logging::LoggingConfig;
use libproofroom::view::{format_photo_count, ViewState};
use libproofroom::{Project, ProofroomService};
use std::io::Write;
use tracing::error;

#[derive(Parser)]
#[command(name = "proof-projects")]
#[command(about = "List, create, and delete Proofroom projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects
    List {
        /// Only projects for this client
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Create a project
    Create {
        /// Project title
        title: String,

        /// Associate the project with a client
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Delete a project
    Delete {
        /// Project id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run_command(cli.command).await {
        error!("{}", e);
        let code = e
            .downcast_ref::<libproofroom::ProofroomError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    LoggingConfig::from_env().verbose(verbose).init();
}

async fn run_command(command: Commands) -> Result<()> {
    let service = ProofroomService::new()?;

    match command {
        Commands::List { client_id } => {
            let store = service.projects(client_id, true).await;
            match ViewState::from_snapshot(&store.snapshot().await) {
                ViewState::Content { items } => {
                    for project in &items {
                        println!("{}", format_project(project));
                    }
                    println!("{} project(s)", items.len());
                }
                ViewState::Empty => println!("No projects"),
                ViewState::Failed { message } => bail!(message),
                // List settles before the store is handed out.
                ViewState::Loading => unreachable!("fetch_on_init settles before return"),
            }
        }

        Commands::Create { title, client_id } => {
            let store = service.projects(None, false).await;
            match store.create_project(&title, client_id.as_deref()).await {
                libproofroom::MutationOutcome::Applied(project) => {
                    println!("✓ Created project {} ({})", project.title, project.id);
                }
                libproofroom::MutationOutcome::Rejected(error) => bail!(error.message),
            }
        }

        Commands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete project {}?", id))? {
                println!("Aborted");
                return Ok(());
            }

            let store = service.projects(None, false).await;
            match store.delete_project(&id).await {
                libproofroom::MutationOutcome::Applied(id) => {
                    println!("✓ Deleted project {}", id);
                }
                libproofroom::MutationOutcome::Rejected(error) => bail!(error.message),
            }
        }
    }

    Ok(())
}

fn format_project(project: &Project) -> String {
    let mut line = format!(
        "{}  {}  [{}]  {}",
        project.id,
        project.title,
        project.status,
        format_photo_count(project.photo_count)
    );
    if project.is_locked {
        line.push_str("  (locked)");
    }
    line
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

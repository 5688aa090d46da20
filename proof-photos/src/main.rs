//! proof-photos - Photo listing and favorite toggling for Proofroom

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use libproofroom::logging::LoggingConfig;
use libproofroom::store::photos::PhotoScope;
use libproofroom::view::{PhotoCard, ViewState};
use libproofroom::ProofroomService;
use tracing::error;

#[derive(Parser)]
#[command(name = "proof-photos")]
#[command(about = "List photos and toggle favorites in a Proofroom gallery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the photos of a project
    List {
        /// Project id
        project_id: String,

        /// Narrow to one folder
        #[arg(long)]
        folder_id: Option<String>,
    },

    /// Toggle a photo's favorite flag
    Favorite {
        /// Photo id
        photo_id: String,

        /// Project the photo belongs to
        #[arg(long)]
        project_id: String,
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
        Commands::List { project_id, folder_id } => {
            let scope = match folder_id {
                Some(folder_id) => PhotoScope::folder(project_id, folder_id),
                None => PhotoScope::project(project_id),
            };

            let store = service.photos(scope, true).await;
            match ViewState::from_snapshot(&store.snapshot().await) {
                ViewState::Content { items } => {
                    for photo in &items {
                        println!("{}", format_card(&PhotoCard::from_photo(photo), &photo.id));
                    }
                    println!("{} photo(s)", items.len());
                }
                ViewState::Empty => println!("No photos"),
                ViewState::Failed { message } => bail!(message),
                ViewState::Loading => unreachable!("fetch_on_init settles before return"),
            }
        }

        Commands::Favorite { photo_id, project_id } => {
            let store = service.photos(PhotoScope::project(project_id), true).await;

            if let Some(message) = store.snapshot().await.error {
                bail!(message);
            }

            match store.toggle_favorite(&photo_id).await {
                libproofroom::MutationOutcome::Applied(photo) => {
                    if photo.is_favorite {
                        println!("✓ Favorited {}", photo.id);
                    } else {
                        println!("✓ Unfavorited {}", photo.id);
                    }
                }
                libproofroom::MutationOutcome::Rejected(error) => bail!(error.message),
            }
        }
    }

    Ok(())
}

fn format_card(card: &PhotoCard, id: &str) -> String {
    let marker = if card.is_favorite { "★" } else { " " };
    let mut line = format!("{} {}  {}", marker, id, card.label);
    if let Some(folder) = &card.folder_badge {
        line.push_str(&format!("  [{}]", folder));
    }
    line
}

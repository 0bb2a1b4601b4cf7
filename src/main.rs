use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use review_deck::import::{build_deck, build_dictionary};
use review_deck::paths::DataPaths;
use review_deck::state::AppState;
use review_deck::{config, db, handlers};

#[derive(Parser)]
#[command(version, about = "Flashcard review, quizzes and dictionary search over PDF decks")]
struct Cli {
  /// Data directory (overrides DATA_DIR)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the local API server (default)
  Serve,
  /// Convert a PDF file or directory of PDFs into cards.json
  BuildDeck {
    /// PDF file or directory
    input: PathBuf,
  },
  /// Extract the dictionary search corpus from a directory of PDFs
  BuildDictionary {
    /// Directory of reference PDFs
    dir: PathBuf,
  },
}

#[tokio::main]
async fn main() {
  let env_file = config::load_env();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "review_deck=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  match env_file {
    Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
    Ok(None) => {}
    Err(e) => tracing::warn!("Ignoring unreadable .env: {}", e),
  }

  let cli = Cli::parse();
  let paths = cli.data_dir.clone().map(DataPaths::new).unwrap_or_else(DataPaths::from_env);

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(paths, cli.data_dir.is_some()).await,
    Command::BuildDeck { input } => match build_deck(&input, &paths) {
      Ok(cards) => tracing::info!("Wrote {} cards to {}", cards.len(), paths.cards_json().display()),
      Err(e) => {
        tracing::error!("build-deck failed: {}", e);
        std::process::exit(1);
      }
    },
    Command::BuildDictionary { dir } => match build_dictionary(&dir, &paths) {
      Ok(files) => tracing::info!(
        "Wrote {} dictionary files to {}",
        files.len(),
        paths.dictionary_json().display()
      ),
      Err(e) => {
        tracing::error!("build-dictionary failed: {}", e);
        std::process::exit(1);
      }
    },
  }
}

async fn serve(paths: DataPaths, explicit_data_dir: bool) {
  let db_path = if explicit_data_dir { paths.db() } else { config::load_database_path() };
  let pool = db::init_db(&db_path).expect("Failed to initialize database");

  {
    let conn = pool.lock().expect("Database lock failed during startup");
    match db::count_custom_cards(&conn) {
      Ok(count) => tracing::info!("{} imported cards in {}", count, db_path.display()),
      Err(e) => tracing::warn!("Failed to count imported cards: {}", e),
    }
  }
  tracing::info!("Data directory: {}", paths.root().display());

  let state = match AppState::load(pool, paths) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!("Failed to load content: {}", e);
      std::process::exit(1);
    }
  };
  let app = handlers::router(state);

  let bind_addr = config::server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}

// ==========================================
// SiteTrak - CLI entry point
// ==========================================
// Subcommands: init / import / preview / batches / batch
// Results print as JSON on stdout; logs go through tracing
// ==========================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sitetrak::api::ImportApi;
use sitetrak::db::{
    add_project_member, init_schema, open_sqlite_connection, read_schema_version, seed_project,
    CURRENT_SCHEMA_VERSION,
};

#[derive(Parser)]
#[command(name = "sitetrak", about = "SiteTrak takeoff import CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file path (default: SITETRAK_DB_PATH, then the user data dir)
    #[arg(long, global = true)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and optionally seed a project
    Init {
        /// Project id to seed
        #[arg(long)]
        project: Option<String>,

        /// Display name for the seeded project (defaults to the project id)
        #[arg(long)]
        name: Option<String>,

        /// User granted admin membership in the seeded project
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Import a takeoff file into a project
    Import {
        /// Takeoff file (CSV)
        file: PathBuf,

        /// Target project id
        #[arg(long)]
        project: String,

        /// Acting user, checked against project membership
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Show how a file's headers would map, without importing
    Preview {
        /// Takeoff file (CSV)
        file: PathBuf,
    },

    /// List recent import batches for a project
    Batches {
        /// Project id
        #[arg(long)]
        project: String,

        /// Maximum number of batches to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one import batch by id
    Batch {
        /// Batch id
        batch_id: String,
    },
}

/// Resolve the database path.
///
/// Order:
/// - SITETRAK_DB_PATH environment variable, when non-empty
/// - user data dir: <data_dir>/sitetrak/sitetrak.db (directory is created)
/// - fallback: ./sitetrak.db
fn default_db_path() -> String {
    if let Ok(path) = std::env::var("SITETRAK_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sitetrak.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sitetrak");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sitetrak.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[tokio::main]
async fn main() {
    sitetrak::logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("command failed: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(default_db_path);
    tracing::info!("{} v{}, database: {}", sitetrak::APP_NAME, sitetrak::VERSION, db_path);

    match cli.command {
        Commands::Init {
            project,
            name,
            user,
        } => {
            let conn = open_sqlite_connection(&db_path)?;
            init_schema(&conn)?;

            let version = read_schema_version(&conn)?.unwrap_or(0);
            if version < CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    "database schema is v{}, current code expects v{}",
                    version,
                    CURRENT_SCHEMA_VERSION
                );
            }

            if let Some(project_id) = project {
                let display = name.unwrap_or_else(|| project_id.clone());
                seed_project(&conn, &project_id, &display)?;
                add_project_member(&conn, &project_id, &user, "admin")?;
                println!("initialized {} with project {}", db_path, project_id);
            } else {
                println!("initialized {}", db_path);
            }
        }

        Commands::Import {
            file,
            project,
            user,
        } => {
            let api = ImportApi::new(db_path);
            let response = api
                .import_takeoff(&project, &user, &file.to_string_lossy())
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Preview { file } => {
            let api = ImportApi::new(db_path);
            let response = api.preview_takeoff_mapping(&file.to_string_lossy()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Batches { project, limit } => {
            let api = ImportApi::new(db_path);
            let response = api.list_recent_batches(&project, limit).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Batch { batch_id } => {
            let api = ImportApi::new(db_path);
            let batch = api.get_batch(&batch_id).await?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
    }

    Ok(())
}

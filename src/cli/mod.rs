use clap::{Parser, Subcommand};
use crosstrust::store::{FileMedium, ResilientStore, SqliteStore, StoreResult};

pub mod backup;
pub mod config;
pub mod import;
pub mod restore;
pub mod status;
pub mod version;

use config::CrossTrustConfig;

/// Resilient identity store as configured on disk
pub type IdentityStore = ResilientStore<SqliteStore, FileMedium>;

#[derive(Parser)]
#[command(name = "crosstrust")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the crosstrust identity store", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/crosstrust/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show cached cross-signing secrets and backup state
    Status,

    /// Import cross-signing seeds from a JSON file of name -> base64 seed
    ImportSecrets {
        /// Path to the JSON file
        file: String,
    },

    /// Mirror every secret entry into the backup file
    Backup,

    /// Refill missing secret entries from the backup file
    Restore,

    /// Display version information
    Version,
}

/// Open the primary store and backup medium named by `config`.
pub async fn open_store(config: &CrossTrustConfig) -> StoreResult<IdentityStore> {
    let primary = SqliteStore::open(&config.store.database_path).await?;
    let medium = FileMedium::open(&config.store.backup_path)?;

    Ok(ResilientStore::new(primary, medium, config.store.namespace.as_str())
        .with_secret_prefix(config.store.secret_prefix.as_str()))
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        version::execute();
        return Ok(());
    }

    let config_path = config::resolve_config_path(cli.config.as_deref());
    let config = CrossTrustConfig::load_or_create(&config_path)?;

    match cli.command {
        Commands::Status => status::execute(&config).await,
        Commands::ImportSecrets { file } => import::execute(&config, &file).await,
        Commands::Backup => backup::execute(&config).await,
        Commands::Restore => restore::execute(&config).await,
        Commands::Version => Ok(()),
    }
}

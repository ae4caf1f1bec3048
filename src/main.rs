use anyhow::Result;
use clap::{Parser, Subcommand};
use requestarr::cache::CacheManager;
use requestarr::config::Configuration;
use requestarr::http::HttpClient;
use requestarr::models::MinimumAvailability;
use requestarr::RadarrClient;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity and print the service version
    Status,
    /// List every movie in the library
    Movies,
    /// Show one movie by its library id
    Movie { id: i64 },
    /// Resolve a TMDB id through the service lookup
    Lookup { tmdb_id: i64 },
    /// Add a movie, or start monitoring it if it is already in the library
    Add {
        #[arg(long)]
        tmdb_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: Option<i32>,
        /// Quality profile id, defaults to activeProfileId
        #[arg(long)]
        quality_profile: Option<i64>,
        /// Root folder path, defaults to activeDirectory
        #[arg(long)]
        root_folder: Option<String>,
        #[arg(long)]
        minimum_availability: Option<MinimumAvailability>,
        /// Add without monitoring
        #[arg(long)]
        unmonitored: bool,
        /// Do not search indexers right away
        #[arg(long)]
        no_search: bool,
        /// Tag ids, replaces the configured tags
        #[arg(long = "tag")]
        tags: Vec<i64>,
    },
    /// Remove a movie and its files by TMDB id
    Remove { tmdb_id: i64 },
    /// Trigger an indexer search for a library movie
    Search { id: i64 },
    /// List quality profiles
    Profiles,
    /// List root folders
    RootFolders,
    /// Show the download queue
    Queue,
    /// List tags
    Tags,
    /// Ask the service to refresh tracked downloads
    RefreshDownloads,
    /// Fetch profiles and root folders, then print cache statistics
    CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = Configuration::from_file(&cli.config)?;
    debug!("Configuration loaded from: {}", cli.config);

    let radarr_config = config.radarr()?;
    let http_client = HttpClient::with_timeout(config.request_timeout())?;
    let caches = CacheManager::new();
    let radarr = RadarrClient::from_config(http_client, radarr_config, &caches)?;

    match cli.command {
        Commands::Status => print_json(&radarr.get_system_status().await?),
        Commands::Movies => {
            let movies = radarr.list_items().await?;
            info!("Found {} movies", movies.len());
            print_json(&movies)
        }
        Commands::Movie { id } => print_json(&radarr.get_item(id).await?),
        Commands::Lookup { tmdb_id } => print_json(&radarr.find_item_by_external_id(tmdb_id).await?),
        Commands::Add {
            tmdb_id,
            title,
            year,
            quality_profile,
            root_folder,
            minimum_availability,
            unmonitored,
            no_search,
            tags,
        } => {
            let mut request =
                radarr_config.create_request(tmdb_id, title, year, quality_profile, root_folder)?;
            if let Some(availability) = minimum_availability {
                request.minimum_availability = availability;
            }
            if !tags.is_empty() {
                request.tags = tags;
            }
            request.monitored = !unmonitored;
            request.search_now = !no_search;

            let outcome = radarr.add_item(&request).await?;
            info!("Add finished, service written: {}", outcome.wrote());
            print_json(outcome.item())
        }
        Commands::Remove { tmdb_id } => {
            radarr.remove_item(tmdb_id).await?;
            Ok(())
        }
        Commands::Search { id } => print_json(&radarr.search_item(id).await?),
        Commands::Profiles => print_json(&radarr.get_quality_profiles().await?),
        Commands::RootFolders => print_json(&radarr.get_root_folders().await?),
        Commands::Queue => print_json(&radarr.get_queue().await?),
        Commands::Tags => print_json(&radarr.get_tags().await?),
        Commands::RefreshDownloads => print_json(&radarr.refresh_monitored_downloads().await?),
        Commands::CacheStats => {
            radarr.get_quality_profiles().await?;
            radarr.get_root_folders().await?;
            radarr.get_quality_profiles().await?;
            print_json(&caches.stats())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

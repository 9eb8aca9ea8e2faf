mod config;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;
mod ytmusic_rs;

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt, bail},
};

use crate::{
    config::Config,
    logging::init_tracing,
    ports::destination::DestinationClient,
    services::{
        library::{
            SyncOutcome,
            export::SnapshotExporter,
            report::SyncReport,
            snapshot::SnapshotStore,
            sync::{CancellationFlag, SyncEngine},
        },
        retry::RetryingDestination,
        spotify::client::{SpotifyApiCredentials, SpotifyHttpAdapter},
        ytmusic::client::YtMusicHttpAdapter,
    },
    spotify_rs::auth::{exchange_code_for_token, extract_authorization_code, initiate_oauth},
    ytmusic_rs::auth::BrowserHeaders,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "LIKED_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `liked_sync=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export traces to
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Spotify application client id (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    /// Spotify application client secret (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Spotify refresh token (overrides the config file)
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    spotify_refresh_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the Spotify liked songs to the snapshot file
    Export,
    /// Like every snapshot song on YouTube Music that is not liked yet
    Sync,
    /// Print how many songs the snapshot holds
    Status,
    /// Check that a service session is valid
    #[command(subcommand)]
    Check(CheckCommands),
    /// Authorize access to a service
    #[command(subcommand)]
    Auth(AuthCommands),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum CheckCommands {
    /// Refresh the Spotify token and print the authenticated user
    Spotify,
    /// Fetch one liked song with the YouTube Music headers
    Ytmusic,
}

#[derive(Subcommand, Debug)]
enum AuthCommands {
    /// Run the Spotify authorization flow and print a refresh token
    Spotify {
        /// The redirect URL (or bare `code`) from the authorization page;
        /// prompted for when omitted
        #[arg(long)]
        code: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        env!("CARGO_PKG_NAME"),
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;

    if let Some(tracer_provider) = tracer_provider
        && let Err(error) = tracer_provider.shutdown()
    {
        tracing::warn!("Failed to flush traces: {}", error);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    tracing::debug!("liked-sync starting");

    match &args.command {
        Commands::Config(config_command) => run_config_command(config_command)?,
        Commands::Export => {
            let config = load_config(&args)?;
            let snapshot = SnapshotStore::new(config.snapshot_path());
            let source = SpotifyHttpAdapter::connect(&spotify_credentials(&config)?).await?;
            let exporter = SnapshotExporter::new(source, config.spotify.page_size);
            let exported = exporter.export(&snapshot).await?;
            println!(
                "Exported {} liked songs to {}",
                exported,
                snapshot.path().display()
            );
        }
        Commands::Sync => {
            let config = load_config(&args)?;
            let snapshot = SnapshotStore::new(config.snapshot_path());
            let destination = RetryingDestination::new(
                connect_ytmusic(&config)?,
                config.retry.like_attempts,
            );
            let engine = SyncEngine::new(destination, config.ytmusic.liked_limit);

            let cancel = CancellationFlag::new();
            let interrupt_watcher = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if cancel.watch_interrupts(tokio::signal::ctrl_c).await {
                        tracing::warn!("Second interrupt received, exiting");
                        std::process::exit(130);
                    }
                })
            };

            let started = Instant::now();
            let report = engine.sync(&snapshot, &cancel).await;
            interrupt_watcher.abort();

            print_report(&report?, started.elapsed());
        }
        Commands::Status => {
            let config = load_config(&args)?;
            let snapshot = SnapshotStore::new(config.snapshot_path());
            println!(
                "{} liked songs found in snapshot {}",
                snapshot.count(),
                snapshot.path().display()
            );
        }
        Commands::Check(CheckCommands::Spotify) => {
            let config = load_config(&args)?;
            let source = SpotifyHttpAdapter::connect(&spotify_credentials(&config)?)
                .await
                .wrap_err("Spotify credentials are invalid or expired")?;
            let user = source.current_user().await?;
            println!(
                "Authenticated as: {} ({})",
                user.display_name.as_deref().unwrap_or(&user.id),
                user.id
            );
        }
        Commands::Check(CheckCommands::Ytmusic) => {
            let config = load_config(&args)?;
            let destination = connect_ytmusic(&config)?;
            destination
                .fetch_liked(1)
                .await
                .wrap_err("YouTube Music session might be expired")?;
            println!("YouTube Music session is valid");
        }
        Commands::Auth(AuthCommands::Spotify { code }) => {
            let config = load_config(&args)?;
            authorize_spotify(&spotify_credentials(&config)?, code.clone()).await?;
        }
    }

    Ok(())
}

/// Config commands work without a readable config file.
fn run_config_command(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::CreateDefault => {
            let path = Config::create_default()?;
            println!("Created default config at {}", path.display());
        }
        ConfigCommands::Path => match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No default config path found"),
        },
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    tracing::debug!("Loading configuration");
    let mut config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .wrap_err("Failed to load liked-sync config")?;

    if let Some(client_id) = &args.spotify_client_id {
        config.spotify.client_id = client_id.clone();
    }
    if let Some(client_secret) = &args.spotify_client_secret {
        config.spotify.client_secret = client_secret.clone();
    }
    if let Some(refresh_token) = &args.spotify_refresh_token {
        config.spotify.refresh_token = Some(refresh_token.clone());
    }

    Ok(config)
}

fn spotify_credentials(config: &Config) -> Result<SpotifyApiCredentials> {
    if config.spotify.client_id.is_empty() || config.spotify.client_secret.is_empty() {
        bail!(
            "Spotify client id and secret are required. Set them in the [spotify] section of the config or via SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET"
        );
    }

    Ok(SpotifyApiCredentials::new(
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        config.spotify.redirect_uri.clone(),
        config.spotify.refresh_token.clone(),
    ))
}

fn connect_ytmusic(config: &Config) -> Result<YtMusicHttpAdapter> {
    let headers_path = config.ytmusic_headers_path();
    let headers = BrowserHeaders::from_file(&headers_path).wrap_err_with(|| {
        format!(
            "YouTube Music authentication file not found or invalid. Copy the request headers of a logged-in music.youtube.com session into {}",
            headers_path.display()
        )
    })?;
    tracing::debug!("Loaded YouTube Music headers from {}", headers_path.display());

    Ok(YtMusicHttpAdapter::new(
        headers,
        config.ytmusic.requests_per_second,
    ))
}

async fn authorize_spotify(
    credentials: &SpotifyApiCredentials,
    code: Option<String>,
) -> Result<()> {
    let (response, session) = initiate_oauth(credentials.client_id(), credentials.redirect_uri());
    println!(
        "Open this URL in your browser and authorize access:\n\n  {}\n",
        response.auth_url
    );

    let input = match code {
        Some(code) => code,
        None => {
            print!("Paste the URL you were redirected to: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .wrap_err("Failed to read the redirect URL")?;
            line
        }
    };

    let code = extract_authorization_code(&input, &session.state)
        .ok_or_eyre("No authorization code found, or the state did not match")?;

    let token = exchange_code_for_token(
        credentials.client_id(),
        credentials.client_secret(),
        &code,
        credentials.redirect_uri(),
        &session,
    )
    .await
    .wrap_err("Failed to exchange the authorization code")?;
    let refresh_token = token
        .refresh_token
        .ok_or_eyre("Spotify did not return a refresh token")?;

    println!("Add this to the [spotify] section of your config:\n\nrefresh_token = \"{refresh_token}\"");
    Ok(())
}

fn print_report(report: &SyncReport, elapsed: Duration) {
    for (position, entry) in report.entries().iter().enumerate() {
        let detail = match &entry.outcome {
            SyncOutcome::Unmatched {
                search_error: Some(error),
            } => format!("search failed: {error}"),
            SyncOutcome::Unmatched { search_error: None } => "no match".to_string(),
            SyncOutcome::AlreadyLiked { id } | SyncOutcome::NewlyLiked { id } => id.clone(),
            SyncOutcome::WriteFailed { id, reason } => format!("{id}: {reason}"),
        };
        println!(
            "{:>4}. [{}] {} by {} ({})",
            position + 1,
            entry.outcome.kind(),
            entry.track.title,
            entry.track.artists.join(", "),
            detail
        );
    }

    let counts = report.counts();
    println!(
        "\nMatched {} out of {} songs.",
        counts.matched(),
        counts.total()
    );
    println!("  newly liked:   {}", counts.newly_liked);
    println!("  already liked: {}", counts.already_liked);
    println!("  unmatched:     {}", counts.unmatched);
    println!("  failed:        {}", counts.write_failed);
    if report.interrupted() {
        println!("Sync was interrupted; run it again to continue.");
    }
    println!(
        "Finished in {}",
        humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
    );
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use playlist_converter::converter::{
    save_conversion_result, ConsoleReporter, EventStreamReporter, ProgressReporter,
    SilentReporter,
};
use playlist_converter::{
    Config, ConversionResult, ConversionSession, Credential, CredentialCache, CredentialKey,
    Platform, PlaylistConverter,
};

#[derive(Parser)]
#[command(name = "playlist-converter")]
#[command(about = "Convert playlists between Spotify and YouTube Music")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a playlist link exists and show where it can be converted to
    Verify {
        /// Spotify or YouTube Music playlist URL
        url: String,
    },

    /// Convert a playlist to another platform
    Convert {
        /// Spotify or YouTube Music playlist URL
        url: String,

        /// Destination platform
        #[arg(long, value_enum)]
        to: Platform,

        /// Title of the new playlist (defaults to the source playlist's title)
        #[arg(long)]
        title: Option<String>,

        /// Write progress events to stdout as an event stream
        #[arg(long, conflicts_with = "quiet")]
        stream: bool,

        /// Only print the final summary
        #[arg(short, long)]
        quiet: bool,

        /// Directory for the saved conversion report
        #[arg(long, env = "CONVERSION_RESULTS_DIR", default_value = "conversion_results")]
        output_dir: PathBuf,
    },

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout is reserved for the event stream
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Verify { url } => {
            verify(&url).await?;
        }
        Commands::Convert {
            url,
            to,
            title,
            stream,
            quiet,
            output_dir,
        } => {
            convert(&url, to, title, stream, quiet, output_dir).await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

fn session_id() -> String {
    format!("cli-{}", std::process::id())
}

fn load_converter() -> Result<PlaylistConverter> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".yellow());
        for item in &missing {
            println!("   - {}", item);
        }
    }

    let credentials = Arc::new(CredentialCache::new());
    let session_id = session_id();
    for platform in Platform::ALL {
        if let Some(refresh_token) = config.refresh_token_for(platform) {
            credentials.put(
                CredentialKey::user(platform, &session_id),
                Credential::refreshable(refresh_token),
            );
        }
    }

    let converter = PlaylistConverter::from_config(&config, credentials);
    if converter.supported_platforms().is_empty() {
        println!(
            "\n{}",
            "No platform is configured. Run `playlist-converter setup` for help.".red()
        );
        std::process::exit(1);
    }

    Ok(converter)
}

async fn verify(url: &str) -> Result<()> {
    let converter = load_converter()?;

    let verification = converter
        .verify_playlist(url, &session_id())
        .await
        .context("Playlist verification failed")?;

    let playlist = &verification.playlist;
    println!(
        "{} {} ({} tracks on {})",
        "✓".green(),
        playlist.title.green().bold(),
        playlist.track_count,
        playlist.platform.display_name()
    );

    if verification.supported_destinations.is_empty() {
        println!("{}", "No destination platform is configured".yellow());
    } else {
        let destinations: Vec<&str> = verification
            .supported_destinations
            .iter()
            .map(|p| p.as_str())
            .collect();
        println!("Can be converted to: {}", destinations.join(", ").cyan());
    }

    Ok(())
}

async fn convert(
    url: &str,
    to: Platform,
    title: Option<String>,
    stream: bool,
    quiet: bool,
    output_dir: PathBuf,
) -> Result<()> {
    let converter = load_converter()?;

    let verification = converter
        .verify_playlist(url, &session_id())
        .await
        .context("Playlist verification failed")?;

    let mut session: ConversionSession = verification.session;
    session.choose_destination(to)?;

    let title = title.unwrap_or_else(|| verification.playlist.title.clone());

    if !stream {
        match converter.preview(&session) {
            Ok(preview) => {
                println!("{}", "Playlist Converter".cyan().bold());
                println!("{}", "=".repeat(50));
                println!(
                    "{} ({} tracks): {} -> {}",
                    preview.playlist_name.green(),
                    preview.track_count,
                    preview.source_platform.display_name(),
                    preview.destination_platform.display_name()
                );
            }
            Err(_) => {
                println!(
                    "{}",
                    format!(
                        "No {} account connected: set {}_REFRESH_TOKEN",
                        to.display_name(),
                        to.as_str().to_uppercase()
                    )
                    .red()
                );
                std::process::exit(1);
            }
        }
    }

    let mut reporter: Box<dyn ProgressReporter> = if stream {
        Box::new(EventStreamReporter::new(io::stdout()))
    } else if quiet {
        Box::new(SilentReporter)
    } else {
        Box::new(ConsoleReporter::new())
    };

    let result = converter
        .convert(&session, &title, reporter.as_mut())
        .await
        .context("Conversion failed")?;

    let path = save_conversion_result(&result, &output_dir)
        .context("Failed to save conversion result")?;

    if !stream {
        print_summary(&result);
        println!(
            "\n{}",
            format!("Conversion result saved to {}", path.display()).yellow()
        );
    }

    if !result.conversion_successful {
        std::process::exit(2);
    }

    Ok(())
}

fn print_summary(result: &ConversionResult) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "CONVERSION SUMMARY".bold());
    println!("{}", "=".repeat(60));
    println!("Total tracks processed: {}", result.total_tracks());
    println!(
        "Successfully matched: {}",
        result.tracks_found.to_string().green()
    );
    println!(
        "Failed to match: {}",
        result.tracks_not_found.to_string().red()
    );
    println!("Success rate: {:.1}%", result.success_rate());
    if let Some(destination) = &result.destination {
        println!("New playlist: {}", destination.url.cyan());
    }
    if let Some(error) = &result.error {
        println!("{} {}", "Aborted:".red().bold(), error);
    }
    println!("{}", "=".repeat(60));

    if !result.unmatched.is_empty() {
        println!("\nTracks not found:");
        for track in &result.unmatched {
            println!("  {} - {}", track.title, track.artists.join(", "));
        }
    }
}

fn show_setup_guide() {
    println!("{}", "Playlist Converter Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - To convert into Spotify, authorize the app with the");
    println!("     playlist-modify-private scope and keep the refresh token");

    println!("\n{}", "2. YouTube API Setup".yellow());
    println!("   - Go to https://console.cloud.google.com/");
    println!("   - Enable the YouTube Data API v3");
    println!("   - Create an API key and an OAuth client");
    println!("   - To convert into YouTube Music, authorize the OAuth client with");
    println!("     the youtube.force-ssl scope and keep the refresh token");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REFRESH_TOKEN=your_spotify_refresh_token");
    println!("     YOUTUBE_CLIENT_ID=your_google_client_id");
    println!("     YOUTUBE_CLIENT_SECRET=your_google_client_secret");
    println!("     YOUTUBE_API_KEY=your_youtube_api_key");
    println!("     YOUTUBE_REFRESH_TOKEN=your_youtube_refresh_token");
    println!("     ALLOWED_NUMBER_OF_CONVERSIONS=100   (0 for no limit)");

    println!("\n{}", "4. Usage".yellow());
    println!("   - playlist-converter verify <url>                   (check a playlist)");
    println!("   - playlist-converter convert <url> --to youtube     (convert it)");
    println!("   - playlist-converter convert <url> --to spotify --stream");

    println!("\n{}", "Ready to start converting!".green());
}

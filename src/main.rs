use anyhow::Result;
use clap::{Parser, Subcommand};
use rnb_vibe::{Language, Outcome, ProviderConfig, Recommendation, RecommendationSession};

#[derive(Parser, Debug)]
#[command(name = "rnb-vibe")]
#[command(about = "R&B recommendations by keyword, artist, or a daily pick", long_about = None)]
struct Args {
    /// Language of the recommendation reasons (ko or en)
    #[arg(short = 'l', long, default_value = "ko")]
    lang: Language,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Five songs for a mood, weather, situation or artist
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Today's song (cached per day and language)
    Today,
    /// Five signature songs by an artist
    Artist { name: String },
    /// List the featured artists
    Artists,
    /// Manage the saved playlist
    Playlist {
        #[command(subcommand)]
        action: PlaylistAction,
    },
}

#[derive(Subcommand, Debug)]
enum PlaylistAction {
    /// Print saved songs
    Show,
    /// Save a song
    Add {
        artist: String,
        song: String,
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Remove a saved song
    Remove { artist: String, song: String },
    /// Remove every saved song
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(args.verbose)),
    )
    .init();

    let config = ProviderConfig::from_env();
    log::debug!("Provider config: {:?}", config);
    let session = RecommendationSession::open(&config, args.lang)?;

    match args.command {
        Command::Search { keywords } => {
            let keyword = keywords.join(" ");
            print_list(session.search(&keyword).await?);
        }
        Command::Today => {
            if let Outcome::Applied(rec) = session.load_song_of_the_day().await? {
                println!("Song of the day ({})", chrono::Local::now().format("%Y-%m-%d"));
                print_recommendations(std::slice::from_ref(&rec));
            }
        }
        Command::Artist { name } => {
            print_list(session.select_artist(&name).await?);
        }
        Command::Artists => {
            for artist in session.featured_artists() {
                println!("{}", artist);
            }
        }
        Command::Playlist { action } => run_playlist(&session, action),
    }

    Ok(())
}

fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn run_playlist(session: &RecommendationSession, action: PlaylistAction) {
    match action {
        PlaylistAction::Show => {
            let songs = session.playlist();
            if songs.is_empty() {
                println!("Playlist is empty");
            } else {
                print_recommendations(&songs);
            }
        }
        PlaylistAction::Add {
            artist,
            song,
            reason,
        } => {
            let rec = Recommendation::new(artist, song, reason);
            if session.add_to_playlist(rec.clone()) {
                println!("Saved {} - {}", rec.song, rec.artist);
            } else {
                println!("{} - {} is already saved", rec.song, rec.artist);
            }
        }
        PlaylistAction::Remove { artist, song } => {
            let removed = session.remove_from_playlist(&Recommendation::new(artist, song, ""));
            println!("Removed {} song(s)", removed);
        }
        PlaylistAction::Clear => {
            session.clear_playlist();
            println!("Playlist cleared");
        }
    }
}

fn print_list(outcome: Outcome<Vec<Recommendation>>) {
    if let Outcome::Applied(recs) = outcome {
        print_recommendations(&recs);
    }
}

fn print_recommendations(recs: &[Recommendation]) {
    for (i, rec) in recs.iter().enumerate() {
        println!("{:>2}. {} - {}", i + 1, rec.song, rec.artist);
        if !rec.reason.is_empty() {
            println!("    {}", rec.reason);
        }
    }
}

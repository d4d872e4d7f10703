//! QuoteDay command-line shell.
//!
//! # Responsibility
//! - Drive core stores and quote fetching from a terminal.
//! - Resolve configuration from `QUOTEDAY_*` environment variables.
//!
//! # Invariants
//! - Failures print to stderr and exit with status 1.
//! - Corrupt store data is only quarantined via `recover`.

use clap::{Parser, Subcommand};
use quoteday_core::db::open_db;
use quoteday_core::{
    core_version, init_logging, ping, CoreConfig, DiaryStore, EntryId, FavoritesStore,
    HttpQuoteSource, OpenStatus, Quote, QuoteFetchCoordinator, QuoteNoteStore, SqliteKvRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "quoteday")]
#[command(version)]
#[command(about = "Quote of the day: favorites, diary and notes")]
struct Cli {
    /// Overrides `QUOTEDAY_DB_PATH`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling log files; logging stays off without it.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a quote from the configured endpoint
    Fetch {
        /// Category to request; defaults to `QUOTEDAY_CATEGORY`
        #[arg(long)]
        category: Option<String>,
    },
    /// Manage favorite quotes
    #[command(subcommand, alias = "fav")]
    Favorites(FavoritesCommand),
    /// Record and browse reflections
    #[command(subcommand)]
    Diary(DiaryCommand),
    /// Read or write a quote's note
    #[command(subcommand)]
    Note(NoteCommand),
    /// Move corrupt store data aside so stores open empty
    Recover,
    /// Print a health-check response
    Ping,
    /// Print the core version
    Version,
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// List categories and their quotes
    List,
    /// Add a quote to a category
    Add {
        text: String,
        author: String,
        category: String,
    },
    /// Remove a quote from every category
    Remove { text: String, author: String },
    /// Move a quote into one category
    Move {
        text: String,
        author: String,
        category: String,
    },
    /// Rename a category, merging into an existing one
    Rename { old: String, new: String },
    /// Delete a category and its quotes
    Drop { category: String },
}

#[derive(Subcommand)]
enum DiaryCommand {
    /// List entries, optionally filtered
    List {
        #[arg(long)]
        query: Option<String>,
    },
    /// Add a reflection on a quote
    Add {
        text: String,
        author: String,
        reflection: String,
    },
    /// Replace a reflection's text
    Edit {
        entry_id: String,
        reflection_id: String,
        text: String,
    },
    /// Delete a reflection
    Rm {
        entry_id: String,
        reflection_id: String,
    },
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Print a quote's note
    Get { text: String, author: String },
    /// Save a note; an empty note deletes it
    Set {
        text: String,
        author: String,
        note: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("quoteday: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }

    let Some(command) = cli.command else {
        println!("quoteday v{}", core_version());
        println!("Run `quoteday --help` for usage.");
        return Ok(());
    };

    match command {
        Commands::Fetch { category } => fetch(&config, category).await,
        Commands::Favorites(command) => favorites(&config, command),
        Commands::Diary(command) => diary(&config, command),
        Commands::Note(command) => note(&config, command),
        Commands::Recover => recover(&config),
        Commands::Ping => {
            println!("{}", ping());
            Ok(())
        }
        Commands::Version => {
            println!("{}", core_version());
            Ok(())
        }
    }
}

async fn fetch(config: &CoreConfig, category: Option<String>) -> CliResult {
    let source = HttpQuoteSource::from_config(config)?;
    let mut coordinator =
        QuoteFetchCoordinator::new(category.unwrap_or_else(|| config.category.clone()));
    coordinator.fetch(&source).await;

    let state = coordinator.state();
    if let Some(message) = &state.error_message {
        return Err(message.clone().into());
    }
    if let Some(quote) = &state.quote {
        print_quote(quote);
    }
    Ok(())
}

fn favorites(config: &CoreConfig, command: FavoritesCommand) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn)?)?;

    match command {
        FavoritesCommand::List => {
            for (name, quotes) in store.collection().iter() {
                println!("[{name}]");
                for (index, quote) in quotes.iter().enumerate() {
                    println!("  {index}. \"{}\" - {}", quote.text, quote.author);
                }
            }
        }
        FavoritesCommand::Add {
            text,
            author,
            category,
        } => store.add(&Quote::new(text, author), &category)?,
        FavoritesCommand::Remove { text, author } => {
            if !store.remove(&Quote::new(text, author))? {
                println!("not a favorite");
            }
        }
        FavoritesCommand::Move {
            text,
            author,
            category,
        } => store.move_quote(&Quote::new(text, author), &category)?,
        FavoritesCommand::Rename { old, new } => {
            if !store.rename_category(&old, &new)? {
                println!("nothing to rename");
            }
        }
        FavoritesCommand::Drop { category } => {
            if !store.remove_category(&category)? {
                println!("no such category");
            }
        }
    }
    Ok(())
}

fn diary(config: &CoreConfig, command: DiaryCommand) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let repo = SqliteKvRepository::try_new(&conn)?;
    let mut store = DiaryStore::open(&repo)?;

    match command {
        DiaryCommand::List { query } => {
            let favorites = FavoritesStore::open(&repo)?;
            let query = query.unwrap_or_default();
            for entry in store.search(&query, favorites.collection()) {
                println!("{} \"{}\" - {}", entry.id, entry.quote.text, entry.quote.author);
                for reflection in entry.reflections.iter().rev() {
                    println!(
                        "  {} @{} {}",
                        reflection.id, reflection.timestamp_ms, reflection.text
                    );
                }
            }
        }
        DiaryCommand::Add {
            text,
            author,
            reflection,
        } => {
            let (entry_id, reflection_id) =
                store.add_entry(&Quote::new(text, author), reflection)?;
            println!("{entry_id} {reflection_id}");
        }
        DiaryCommand::Edit {
            entry_id,
            reflection_id,
            text,
        } => {
            if !store.update_reflection(parse_id(&entry_id)?, parse_id(&reflection_id)?, text)? {
                return Err("no such reflection".into());
            }
        }
        DiaryCommand::Rm {
            entry_id,
            reflection_id,
        } => {
            if !store.delete_reflection(parse_id(&entry_id)?, parse_id(&reflection_id)?)? {
                return Err("no such reflection".into());
            }
        }
    }
    Ok(())
}

fn note(config: &CoreConfig, command: NoteCommand) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let mut store = QuoteNoteStore::open(SqliteKvRepository::try_new(&conn)?)?;

    match command {
        NoteCommand::Get { text, author } => {
            if let Some(note) = store.note_for(&Quote::new(text, author)) {
                println!("{note}");
            }
        }
        NoteCommand::Set { text, author, note } => {
            store.set_note(&Quote::new(text, author), &note)?;
        }
    }
    Ok(())
}

fn recover(config: &CoreConfig) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let repo = SqliteKvRepository::try_new(&conn)?;
    let statuses = [
        ("favorites", FavoritesStore::open_recovering(&repo)?.1),
        ("diary", DiaryStore::open_recovering(&repo)?.1),
        ("notes", QuoteNoteStore::open_recovering(&repo)?.1),
    ];
    for (name, status) in statuses {
        match status {
            OpenStatus::Quarantined { backup_key } => {
                println!("{name}: corrupt data moved to `{backup_key}`");
            }
            _ => println!("{name}: ok"),
        }
    }
    Ok(())
}

fn print_quote(quote: &Quote) {
    println!("\"{}\"", quote.text);
    println!("  - {}", quote.author);
}

fn parse_id(raw: &str) -> Result<EntryId, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid id `{raw}`"))
}

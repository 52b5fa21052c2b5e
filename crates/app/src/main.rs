use std::fmt;
use std::path::PathBuf;

use grammar_core::content::QuestionBank;
use grammar_core::model::question::{ARTICLE_OPTIONS, display_text_for};
use grammar_core::model::{GameConfig, Question};
use services::{AppServices, Clock, GameLoopService, GameSession, ShuffleSource, Transition};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingContent,
    UnknownArg(String),
    InvalidSeed { raw: String },
    InvalidSnapshotLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingContent => {
                write!(f, "no question file given (use --content or GRAMMAR_CONTENT)")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidSnapshotLimit { raw } => {
                write!(f, "invalid --snapshots value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    content: PathBuf,
    shuffle: ShuffleSource,
    snapshot_limit: Option<usize>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--content <file.json>] [--seed <n>] [--snapshots <limit>]");
    eprintln!("  cargo run -p app -- reset [--db <sqlite_url>] [--content <file.json>]");
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>] [--content <file.json>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:articles.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GRAMMAR_DB_URL, GRAMMAR_CONTENT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Reset,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "reset" => Some(Self::Reset),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("GRAMMAR_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:articles.sqlite3".into()), normalize_sqlite_url);
        let mut content = std::env::var("GRAMMAR_CONTENT").ok().map(PathBuf::from);
        let mut shuffle = ShuffleSource::Random;
        let mut snapshot_limit = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => {
                    content = Some(PathBuf::from(require_value(args, "--content")?));
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    shuffle = ShuffleSource::Seeded(seed);
                }
                "--snapshots" => {
                    let value = require_value(args, "--snapshots")?;
                    let limit: usize = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSnapshotLimit { raw: value.clone() })?;
                    snapshot_limit = Some(limit);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            content: content.ok_or(ArgsError::MissingContent)?,
            shuffle,
            snapshot_limit,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn build_config(snapshot_limit: Option<usize>) -> Result<GameConfig, grammar_core::Error> {
    let config = GameConfig::article_defaults();
    Ok(match snapshot_limit {
        Some(limit) => config.with_snapshots(limit)?,
        None => config,
    })
}

//
// ─── PLAY LOOP ─────────────────────────────────────────────────────────────────
//

/// What the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(&'static str),
    Skip,
    Reset,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "s" | "skip" => Input::Skip,
        "r" | "reset" => Input::Reset,
        "q" | "quit" | "exit" => Input::Quit,
        _ => {
            if let Ok(n) = line.parse::<usize>() {
                return n
                    .checked_sub(1)
                    .and_then(|i| ARTICLE_OPTIONS.get(i))
                    .map_or(Input::Unknown, |opt| Input::Answer(*opt));
            }
            let spoken = match line.as_str() {
                "a" | "an" | "a / an" => "a/an",
                "none" | "-" | "no article" => "nothing",
                other => other,
            };
            ARTICLE_OPTIONS
                .iter()
                .find(|opt| **opt == spoken)
                .map_or(Input::Unknown, |opt| Input::Answer(*opt))
        }
    }
}

fn print_question(session: &GameSession, question: &Question) {
    let view = session.view();
    println!();
    println!(
        "[{} | {}/{} | {:.0}% | score {}]",
        view.mode, view.cursor, view.total, view.percentage, view.score
    );
    println!("  {}", question.sentence());
    let remaining = session.current().remaining_attempts();
    for (i, option) in session.possible_answers().iter().enumerate() {
        let tried = session
            .current()
            .failed_options()
            .contains(option);
        let mark = if tried { " (tried)" } else { "" };
        println!("  {}) {}{mark}", i + 1, display_text_for(option));
    }
    println!("  attempts left: {remaining}   s) skip   r) reset   q) quit");
}

fn print_completion(session: &GameSession) {
    let stats = session.completion_stats();
    println!();
    println!("All done!");
    println!("  final score:         {}", stats.final_score);
    println!("  questions completed: {}", stats.questions_completed);
    println!("  errors remaining:    {}", stats.errors_remaining);
}

async fn play(game_loop: &GameLoopService) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = game_loop.start_or_resume().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if session.is_completed() {
            print_completion(&session);
            return Ok(());
        }
        let Some(question) = session.current_question().cloned() else {
            return Ok(());
        };
        print_question(&session, &question);

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match parse_input(&line) {
            Input::Answer(answer) => {
                let Some(outcome) = game_loop.submit_answer(&mut session, answer).await else {
                    println!("  already tried that one");
                    continue;
                };
                if outcome.is_correct {
                    println!("  correct! +{}", outcome.points);
                } else if outcome.is_completed {
                    println!(
                        "  wrong. The answer is {}.",
                        display_text_for(question.correct_answer())
                    );
                } else {
                    println!("  not quite, try again");
                }
                if outcome.is_completed {
                    if !question.explanation().is_empty() {
                        println!("  {}", question.explanation());
                    }
                    if game_loop.advance_to_next(&mut session).await.switched_mode() {
                        println!("  -- now in {} mode --", session.mode());
                    }
                }
            }
            Input::Skip => {
                if let Some(Transition::Moved { to, .. }) = game_loop.skip_current(&mut session).await {
                    println!("  skipped ({to} mode)");
                }
            }
            Input::Reset => {
                game_loop.reset_session(&mut session).await;
                println!("  game reset");
            }
            Input::Quit => return Ok(()),
            Input::Unknown => println!("  pick 1-3, or s/r/q"),
        }
    }
}

fn print_stats(bank: &QuestionBank) {
    let stats = bank.statistics();
    println!("questions: {}", stats.total);
    for (tier, count) in &stats.by_difficulty {
        println!("  {tier}: {count}");
    }
    for (answer, count) in &stats.by_answer {
        println!("  answer {}: {count}", display_text_for(answer));
    }
    for (rule, count) in &stats.by_rule {
        println!("  rule {rule}: {count}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let content = std::fs::read_to_string(&parsed.content)?;
    let config = build_config(parsed.snapshot_limit)?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        &content,
        Clock::default_clock(),
        config,
        parsed.shuffle,
    )
    .await?;
    tracing::info!(db = %parsed.db_url, questions = services.bank().len(), "services ready");

    match cmd {
        Command::Play => play(&services.game_loop()).await,
        Command::Reset => {
            services.game_loop().clear_stored_statistics().await;
            println!("stored progress cleared");
            Ok(())
        }
        Command::Stats => {
            print_stats(&services.bank());
            let stored = services.game_loop().persistence().load_state().await;
            if let Some(progress) = stored.progress {
                println!(
                    "saved game: {}/{} served, {} mistakes pending, score {}",
                    progress.cursor(),
                    progress.total(),
                    stored.errors.len(),
                    progress.score()
                );
            }
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

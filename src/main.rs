use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use rusty_report::query::QueryResult;
use rusty_report::Config;
use rusty_report::Document;
use rusty_report::QueryService;
use rusty_report::UpdateSession;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rows of a fetched dataset shown before asking for confirmation
const PREVIEW_ROWS: usize = 20;

#[derive(Parser)]
#[command(name = "rusty-report", version, about = "Refresh tables in Word reports from query results")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the sections and tables of a document
    Describe(DescribeArgs),

    /// Interactively replace tables, then save the result
    Update(UpdateArgs),

    /// Replace one table without prompting
    Apply(ApplyArgs),
}

#[derive(clap::Args)]
struct DescribeArgs {
    /// Document to inspect (.docx)
    document: PathBuf,
}

#[derive(clap::Args)]
struct UpdateArgs {
    /// Document to update (.docx)
    document: PathBuf,

    /// Where to save the updated document
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Document to update (.docx)
    document: PathBuf,

    /// Where to save the updated document
    #[arg(short, long)]
    output: PathBuf,

    /// SQL, or a prompt for the configured SQL generator
    #[arg(short, long)]
    query: String,

    /// Which table to replace, in plain words
    #[arg(short, long)]
    instruction: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    match cli.command {
        Command::Describe(args) => describe(&config, args),
        Command::Update(args) => update(&config, args),
        Command::Apply(args) => apply(&config, args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "rusty_report=info",
        _ => "rusty_report=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn describe(config: &Config, args: DescribeArgs) -> Result<()> {
    let document = Document::open(&args.document)?;
    let sections = rusty_report::index(&document, &config.heading_detector()?)?;
    println!("Document: {}\n", document.name());
    print!("{}", rusty_report::describe(&sections));
    Ok(())
}

fn apply(config: &Config, args: ApplyArgs) -> Result<()> {
    let detector = config.heading_detector()?;
    let resolver = config.semantic_resolver()?;
    let query = config.query_service()?;

    let mut session = UpdateSession::new(Document::open(&args.document)?, &detector, resolver.as_ref());
    let result = query.fetch(&args.query)?;
    let report = session
        .apply(&args.instruction, &result.dataset)
        .with_context(|| format!("Instruction '{}' was not applied", args.instruction))?;
    println!("{}: {}", session.document().name(), report);
    session.save(&args.output)?;
    println!("Saved {}", args.output.display());
    Ok(())
}

fn update(config: &Config, args: UpdateArgs) -> Result<()> {
    let detector = config.heading_detector()?;
    let resolver = config.semantic_resolver()?;
    let query = config.query_service()?;
    let mut session = UpdateSession::new(Document::open(&args.document)?, &detector, resolver.as_ref());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!("\n--- Table update ---");
        let Some(prompt) = ask(&mut input, "Query prompt: ")? else {
            break;
        };
        let Some(instruction) = ask(&mut input, "Update instruction: ")? else {
            break;
        };

        let QueryResult { query: sql, dataset } = match query.fetch(&prompt) {
            Ok(result) => result,
            Err(error) => {
                eprintln!("Query failed: {}", error);
                continue;
            }
        };
        println!("\nSQL: {}\n{}\n", sql, dataset.preview(PREVIEW_ROWS));
        if !confirm(&mut input, "Proceed with this data? (y/n): ")? {
            continue;
        }

        println!("\nDocument structure:\n{}", session.describe()?);
        match session.apply(&instruction, &dataset) {
            Ok(report) => println!("{}: {}", session.document().name(), report),
            Err(error) => eprintln!("Skipping update: {}", error),
        }

        if !confirm(&mut input, "Update another table? (y/n): ")? {
            break;
        }
    }

    session
        .save(&args.output)
        .with_context(|| format!("Document changes were not saved to '{}'", args.output.display()))?;
    println!("Saved {}", args.output.display());
    Ok(())
}

/// Prints `question` and reads one trimmed line; `None` at end of input
fn ask(input: &mut impl BufRead, question: &str) -> Result<Option<String>> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

fn confirm(input: &mut impl BufRead, question: &str) -> Result<bool> {
    Ok(ask(input, question)?.is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
}

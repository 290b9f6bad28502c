//! Deck interchange CLI
//!
//! Command-line tool for recognizing, importing and converting trading-card
//! deck and inventory files.

mod prompt;

use clap::{Args, Parser, Subcommand};
use deck_core::{
    canonical_key, decode_input, fuzzy_key, guess_order, import_file, run_batch, write_list,
    CardListHolder, ConversionBatch, Dialect, FormatGuesser, ImportConfig, MemoryCatalog,
    PolicyKind, ResolutionPolicy, ResolvedCardList, ResolvedEntry,
};
use prompt::PromptPolicy;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "deck-cli")]
#[command(about = "Trading-card deck file converter", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that resolves names
#[derive(Args)]
struct ImportArgs {
    /// Catalog file (JSON)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Import settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolution policy: strict, best-guess, skip-unknown or prompt
    #[arg(short, long)]
    policy: Option<PolicyKind>,

    /// Report unresolved names instead of failing
    #[arg(long)]
    allow_partial: bool,

    /// File to remember resolution decisions in
    #[arg(long)]
    lookup_cache: Option<PathBuf>,
}

impl ImportArgs {
    fn import_config(&self) -> deck_core::Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::load(path)?,
            None => ImportConfig::default(),
        };
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if self.allow_partial {
            config.allow_partial = true;
        }
        if self.lookup_cache.is_some() {
            config.lookup_cache = self.lookup_cache.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List supported dialects in guess order
    Dialects,

    /// Detect the dialect of a file
    Guess {
        /// File to inspect
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Parse a file without resolving names
    Parse {
        /// File to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Dialect to parse as; guessed when omitted
        #[arg(short, long)]
        dialect: Option<Dialect>,

        /// Print the parsed holder as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a file and show the resolved card list
    Import {
        /// File to import
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Convert a file to another dialect
    Convert {
        /// File to convert
        #[arg(short, long)]
        file: PathBuf,

        /// Output dialect
        #[arg(short, long)]
        to: Dialect,

        /// Output file; standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Run a conversion batch
    Batch {
        /// Path to batch file (JSON)
        #[arg(short, long)]
        batch: PathBuf,
    },

    /// Create a batch file template
    CreateBatch {
        /// Output path for the batch file
        #[arg(short, long)]
        output: PathBuf,

        /// Catalog file to reference
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Input files or directories to include
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Output directory for converted files
        #[arg(long)]
        export_dir: PathBuf,

        /// Output dialect
        #[arg(short, long, default_value = "csv")]
        to: Dialect,
    },

    /// Show the lookup keys of card names
    Normalize {
        /// Names to normalize
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands) -> deck_core::Result<()> {
    match command {
        Commands::Dialects => cmd_dialects(),
        Commands::Guess { file } => cmd_guess(&file),
        Commands::Parse {
            file,
            dialect,
            json,
        } => cmd_parse(&file, dialect, json),
        Commands::Import { file, import } => cmd_import(&file, &import),
        Commands::Convert {
            file,
            to,
            output,
            import,
        } => cmd_convert(&file, to, output.as_deref(), &import),
        Commands::Batch { batch } => cmd_batch(&batch),
        Commands::CreateBatch {
            output,
            catalog,
            input,
            export_dir,
            to,
        } => cmd_create_batch(&output, catalog, &input, &export_dir, to),
        Commands::Normalize { names } => cmd_normalize(&names),
    }
}

/// The configured policy, or a terminal prompt when asked for one
fn build_policy(config: &ImportConfig) -> Box<dyn ResolutionPolicy> {
    config
        .make_policy()
        .unwrap_or_else(|| Box::new(PromptPolicy::stdio()))
}

fn read_text(path: &Path) -> deck_core::Result<String> {
    let raw = fs::read(path).map_err(|e| deck_core::Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(decode_input(&raw))
}

fn cmd_dialects() -> deck_core::Result<()> {
    println!("Dialects ({}), in guess order:", Dialect::ALL.len());
    println!();

    for dialect in guess_order() {
        let desc = dialect.descriptor();
        let access = if desc.writable { "read/write" } else { "read" };
        println!("  {:<26} {} [{}]", dialect.name(), desc.name, access);
        println!(
            "  {:<26} .{} - {}",
            "",
            desc.extensions.join(", ."),
            desc.content_hint
        );
    }

    Ok(())
}

fn cmd_guess(file: &Path) -> deck_core::Result<()> {
    let text = read_text(file)?;
    let (dialect, holder) = FormatGuesser::new().guess(&text)?;

    println!("File: {}", file.display());
    println!("Dialect: {} ({})", dialect, dialect.descriptor().name);
    println!("Entries: {}", holder.entry_count());
    println!("Cards: {}", holder.total_cards());

    Ok(())
}

fn cmd_parse(file: &Path, dialect: Option<Dialect>, json: bool) -> deck_core::Result<()> {
    let text = read_text(file)?;
    let (dialect, holder, valid) = match dialect {
        Some(dialect) => {
            let mut parser = dialect.parser();
            let holder = deck_core::dialect::parse_text(parser.as_mut(), &text);
            let valid = parser.validate(&holder);
            (dialect, holder, valid)
        }
        None => {
            let (dialect, holder) = FormatGuesser::new().guess(&text)?;
            (dialect, holder, true)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&holder)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Dialect: {}{}", dialect, if valid { "" } else { " (did not validate)" });
    print_holder(&holder);

    Ok(())
}

fn print_holder(holder: &CardListHolder) {
    print_metadata(&holder.title, &holder.author, holder.description.as_deref());
    println!("Entries ({}, {} cards):", holder.entry_count(), holder.total_cards());
    for ((name, expansion), count) in holder.entries() {
        match expansion {
            Some(exp) => println!("  {}x {} [{}]", count, name, exp),
            None => println!("  {}x {}", count, name),
        }
    }

    let malformed = holder.malformed();
    if !malformed.is_empty() {
        println!("\nMalformed lines ({}):", malformed.len());
        for line in malformed {
            println!("  {}: {} ({})", line.line, line.text, line.reason);
        }
    }
}

fn print_metadata(title: &str, author: &str, description: Option<&str>) {
    if !title.is_empty() {
        println!("Title: {}", title);
    }
    if !author.is_empty() {
        println!("Author: {}", author);
    }
    if let Some(description) = description {
        println!("Description: {}", description);
    }
    println!();
}

fn print_entries<'a>(label: &str, entries: impl Iterator<Item = &'a ResolvedEntry>) {
    let entries: Vec<&ResolvedEntry> = entries.collect();
    let total: u32 = entries.iter().map(|e| e.count).sum();
    println!("{} ({} cards):", label, total);
    for entry in entries {
        match entry.expansion_name() {
            Some(exp) => println!("  {}x {} [{}]", entry.count, entry.card.name, exp),
            None => println!("  {}x {}", entry.count, entry.card.name),
        }
    }
}

fn print_list(list: &ResolvedCardList) {
    let meta = &list.metadata;
    print_metadata(&meta.title, &meta.author, meta.description.as_deref());
    print_entries("Crypt", list.crypt());
    println!();
    print_entries("Library", list.library());

    if !list.unresolved.is_empty() {
        println!("\nUnresolved ({}):", list.unresolved.len());
        for missing in &list.unresolved {
            println!("  '{}' ({})", missing.raw_name, missing.reason);
        }
    }
}

fn cmd_import(file: &Path, args: &ImportArgs) -> deck_core::Result<()> {
    let config = args.import_config()?;
    let catalog = MemoryCatalog::load(&args.catalog)?;
    let mut policy = build_policy(&config);

    let (dialect, list) = import_file(file, &catalog, policy.as_mut(), &config)?;

    println!("File: {}", file.display());
    println!("Dialect: {}", dialect);
    print_list(&list);

    Ok(())
}

fn cmd_convert(
    file: &Path,
    to: Dialect,
    output: Option<&Path>,
    args: &ImportArgs,
) -> deck_core::Result<()> {
    to.require_writer()?;
    let config = args.import_config()?;
    let catalog = MemoryCatalog::load(&args.catalog)?;
    let mut policy = build_policy(&config);

    let (dialect, list) = import_file(file, &catalog, policy.as_mut(), &config)?;
    let text = write_list(&list, to)?;

    match output {
        Some(path) => {
            fs::write(path, text)?;
            println!(
                "Converted {} ({}) to {} ({}): {} cards",
                file.display(),
                dialect,
                path.display(),
                to,
                list.total_cards()
            );
            if !list.unresolved.is_empty() {
                println!("  {} names left unresolved", list.unresolved.len());
            }
        }
        None => print!("{}", text),
    }

    Ok(())
}

fn cmd_batch(batch_path: &Path) -> deck_core::Result<()> {
    let batch = ConversionBatch::load(batch_path)?;

    println!("Running batch with {} input(s)", batch.inputs.len());
    println!("Catalog: {}", batch.catalog.display());
    println!("Output: {} as {}", batch.output_dir.display(), batch.output_dialect);
    println!();

    let mut policy = build_policy(&batch.import);
    let result = run_batch(&batch, policy.as_mut())?;

    println!("Batch complete:");
    println!("  {} files written", result.files_written.len());
    for path in &result.files_written {
        println!("  - {}", path.display());
    }
    if result.skipped > 0 {
        println!("  {} files skipped (unknown extension)", result.skipped);
    }

    if !result.errors.is_empty() {
        println!("\nErrors ({}):", result.errors.len());
        for (path, err) in &result.errors {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

fn cmd_create_batch(
    output: &Path,
    catalog: Option<PathBuf>,
    inputs: &[PathBuf],
    export_dir: &Path,
    to: Dialect,
) -> deck_core::Result<()> {
    to.require_writer()?;

    let inputs = if inputs.is_empty() {
        vec![PathBuf::from("decks")]
    } else {
        inputs.to_vec()
    };
    let batch = ConversionBatch {
        catalog: catalog.unwrap_or_else(|| PathBuf::from("cards.json")),
        inputs,
        output_dir: export_dir.to_path_buf(),
        output_dialect: to,
        import: ImportConfig::default(),
    };

    batch.save(output)?;
    println!("Created batch file: {}", output.display());
    println!();
    println!("Edit the file to configure your batch, then run:");
    println!("  deck-cli batch --batch {}", output.display());

    Ok(())
}

fn cmd_normalize(names: &[String]) -> deck_core::Result<()> {
    for name in names {
        println!("{}", name);
        println!("  key:   {}", canonical_key(name));
        println!("  fuzzy: {}", fuzzy_key(name));
    }
    Ok(())
}

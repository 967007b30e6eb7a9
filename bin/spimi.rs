use anyhow::{bail, Result};
use clap::Parser;
use spimi::{IndexerConfig, SourceConfig, TokenizerConfig};
use spimi::{Indexer, TermLookup, Tokenizer};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "spimi")]
#[command(about = "Disk-based inverted index builder (SPIMI)", long_about = None)]
struct Args {
    /// Path to the gzip-compressed TSV data file
    #[arg(long, env = "SPIMI_DATA_PATH")]
    data_path: PathBuf,

    /// Root directory for index output
    #[arg(long, env = "SPIMI_OUTPUT_ROOT", default_value = "index")]
    output_root: PathBuf,

    /// Disable stopword removal
    #[arg(long, conflicts_with = "stopwords")]
    no_stopwords: bool,

    /// Path to a custom stopword list (one word per line)
    #[arg(long, env = "SPIMI_STOPWORDS")]
    stopwords: Option<PathBuf>,

    /// Keep only words strictly longer than this
    #[arg(long, env = "SPIMI_WORD_SIZE", default_value = "3")]
    word_size: usize,

    /// Disable the word size filter
    #[arg(long, conflicts_with = "word_size")]
    no_word_size: bool,

    /// Disable stemming
    #[arg(long)]
    no_stemmer: bool,

    /// Record token positions in postings
    #[arg(long, env = "SPIMI_POSITIONS")]
    use_positions: bool,

    /// Maximum postings per index block
    #[arg(long, env = "SPIMI_MAX_POSTINGS", default_value = "1000000")]
    max_postings: u64,

    /// Enter an interactive term lookup loop after indexing
    #[arg(long)]
    search: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting spimi v{}", spimi::VERSION);

    if !args.data_path.exists() {
        bail!("data file {} does not exist", args.data_path.display());
    }
    if args.data_path.extension().and_then(|e| e.to_str()) != Some("gz") {
        bail!(
            "data file {} is not gzip-compressed (.gz)",
            args.data_path.display()
        );
    }
    let tokenizer_config = TokenizerConfig {
        remove_stopwords: !args.no_stopwords,
        stopwords_path: args.stopwords,
        stem: !args.no_stemmer,
        min_word_size: if args.no_word_size { 0 } else { args.word_size },
        positional: args.use_positions,
    };
    let indexer_config = IndexerConfig {
        max_postings_per_block: args.max_postings,
        output_root: args.output_root,
        ..Default::default()
    };

    let tokenizer = Tokenizer::new(&tokenizer_config)?;
    let indexer = Indexer::new(tokenizer, indexer_config, SourceConfig::default())?;

    let stats = indexer.index_corpus(&args.data_path)?;

    println!("Number of indexed documents: {}", stats.indexed_documents);
    println!("Number of postings: {}", stats.postings);
    println!("Vocabulary size: {}", stats.vocabulary_size);
    println!("Total indexing time (s): {:.2}", stats.elapsed.as_secs_f64());
    println!(
        "Total index size on disk (MB): {:.2}",
        stats.index_size_bytes as f64 / 1_000_000.0
    );
    println!("Number of temporary index blocks: {}", stats.temp_blocks);
    println!("Number of final index blocks: {}", stats.final_blocks);

    if args.search {
        let lookup_tokenizer = Tokenizer::new(&tokenizer_config)?;
        let lookup = TermLookup::open(&indexer.output_dir(&args.data_path), lookup_tokenizer)?;
        run_search_loop(&lookup)?;
    }

    Ok(())
}

/// Read query terms from stdin until "0" and report master index statistics.
fn run_search_loop(lookup: &TermLookup) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("Search term (0 to exit): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let query = line.trim();
        if query == "0" {
            return Ok(());
        }

        for result in lookup.lookup(query) {
            println!("Normalized term: {}", result.normalized);
            match result.stats {
                Some(stats) => {
                    println!("Document frequency: {}", stats.doc_frequency);
                    println!("Final index block: {}", stats.block);
                }
                None => println!("Not found"),
            }
        }
    }
}

use anyhow::Result;
use clap::Parser;
use krill::index::IndexReader;
use krill::query::{snippet, QueryEvaluator};
use krill::{Bm25Params, QueryMode, SearchOptions};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "querier")]
#[command(about = "Interactive BM25 search over a compressed index", long_about = None)]
struct Args {
    /// Directory holding the merged index (lexicon, postings, stats)
    index_dir: PathBuf,

    /// Path to doc_table.txt; the content store is expected beside it
    doc_table: PathBuf,

    /// Default query mode: `and` or `or`
    #[arg(long, default_value = "or")]
    mode: String,

    /// Number of results per query
    #[arg(long, default_value = "10")]
    k: usize,

    /// BM25 term-frequency saturation parameter
    #[arg(long, default_value = "0.9")]
    k1: f64,

    /// BM25 length normalization parameter
    #[arg(long, default_value = "0.4")]
    b: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let defaults = SearchOptions {
        // Unrecognized mode strings silently fall back to OR
        mode: args.mode.parse::<QueryMode>().unwrap_or_default(),
        k: args.k,
        bm25: Bm25Params::new(args.k1, args.b),
    };

    info!("Krill querier v{}", krill::VERSION);
    info!("  Index: {}", args.index_dir.display());
    info!("  Doc table: {}", args.doc_table.display());
    info!(
        "  Mode: {}, k: {}, k1: {}, b: {}",
        defaults.mode, defaults.k, defaults.bm25.k1, defaults.bm25.b
    );

    let reader = IndexReader::open_shared(&args.index_dir, &args.doc_table)?;
    let evaluator = QueryEvaluator::with_params(reader, defaults.bm25);

    println!("Enter queries, one per line. /and <q> and /or <q> override the mode;");
    println!("/quit or /exit leaves.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let (mode, query) = if let Some(rest) = line.strip_prefix("/and ") {
            (QueryMode::And, rest)
        } else if let Some(rest) = line.strip_prefix("/or ") {
            (QueryMode::Or, rest)
        } else {
            (defaults.mode, line)
        };
        if query.is_empty() {
            continue;
        }

        run_query(&evaluator, query, mode, defaults.k)?;
        stdout.flush()?;
    }

    println!("Goodbye!");
    Ok(())
}

fn run_query(evaluator: &QueryEvaluator, query: &str, mode: QueryMode, k: usize) -> Result<()> {
    let started = Instant::now();
    let hits = evaluator.search(query, mode, k)?;
    let elapsed_ms = started.elapsed().as_millis();

    println!(
        "\nTop {} results for {:?} ({} mode, {} ms):",
        hits.len(),
        query,
        mode,
        elapsed_ms
    );
    println!("{}", "-".repeat(80));

    if hits.is_empty() {
        println!("(no results)");
        println!();
        return Ok(());
    }

    let snippet_terms = krill::tokenizer::tokenize(query);
    for (rank, hit) in hits.iter().enumerate() {
        let external = evaluator
            .reader()
            .external_id(hit.doc_id)
            .unwrap_or("")
            .to_string();
        let excerpt = match evaluator.reader().content(hit.doc_id)? {
            Some(content) => snippet::generate(&content, &snippet_terms),
            None => String::new(),
        };
        println!(
            "{:>4}  doc {:<10} score {:<10.4} {}",
            rank + 1,
            hit.doc_id,
            hit.score,
            external
        );
        if !excerpt.is_empty() {
            println!("      {}", excerpt);
        }
    }
    println!();
    Ok(())
}

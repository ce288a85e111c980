use anyhow::Result;
use clap::Parser;
use krill::index::IndexBuilder;
use krill::IndexerConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Phase 1: stream a TSV collection into flat postings", long_about = None)]
struct Args {
    /// Input collection: one `externalID <TAB> content` line per document
    input: PathBuf,

    /// Output directory for doc tables, content store, and postings partitions
    out_dir: PathBuf,

    /// Partition byte budget in whole gigabytes
    #[arg(default_value = "2")]
    part_size_gb: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Krill indexer v{} (phase 1)", krill::VERSION);
    info!("  Input: {}", args.input.display());
    info!("  Output: {}", args.out_dir.display());
    info!("  Partition budget: {} GiB", args.part_size_gb);

    let config = IndexerConfig::with_partition_gb(args.part_size_gb);
    let builder = IndexBuilder::create(&args.out_dir, config)?;
    let summary = builder.build_from_tsv(&args.input)?;

    info!(
        "Done: {} documents, {} postings across {} partition(s), {} line(s) skipped",
        summary.documents, summary.postings, summary.partitions, summary.skipped_lines
    );
    info!(
        "Sort the partitions (ascending by term, then numerically by docID) into \
         postings_sorted.tsv before running the merger, e.g.:"
    );
    info!(
        "  LC_ALL=C sort -t $'\\t' -k1,1 -k2,2n {}/postings_part_*.tsv > postings_sorted.tsv",
        args.out_dir.display()
    );
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use krill::index::IndexMerger;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "merger")]
#[command(about = "Phase 2: merge sorted postings into a block-compressed index", long_about = None)]
struct Args {
    /// Globally sorted postings, one `term <TAB> docID <TAB> tf` line each
    sorted_postings: PathBuf,

    /// Output directory for the compressed index files
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Krill merger v{} (phase 2)", krill::VERSION);
    info!("  Input: {}", args.sorted_postings.display());
    info!("  Output: {}", args.out_dir.display());

    let merger = IndexMerger::create(&args.out_dir)?;
    let summary = merger.merge_file(&args.sorted_postings)?;

    info!(
        "Done: {} terms, {} postings, {} documents, avgdl {:.2}",
        summary.terms, summary.postings, summary.documents, summary.avgdl
    );
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use krill::index::{files, Lexicon, PostingCursor};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "inspector")]
#[command(about = "Inspect and verify a compressed index", long_about = None)]
struct Args {
    /// Directory holding the merged index
    index_dir: PathBuf,

    /// Terms whose posting lists should be walked and verified; with no
    /// terms, a lexicon summary is printed instead
    terms: Vec<String>,

    /// Number of lexicon entries shown in the summary
    #[arg(long, default_value = "20")]
    top: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Krill inspector v{}", krill::VERSION);

    show_stats(&args)?;

    let lexicon = Lexicon::load(args.index_dir.join(files::LEXICON))?;
    if args.terms.is_empty() {
        show_lexicon_summary(&lexicon, args.top);
    } else {
        for term in &args.terms {
            inspect_term(&args, &lexicon, term)?;
        }
    }
    Ok(())
}

fn show_stats(args: &Args) -> Result<()> {
    println!("=== Index statistics ===");
    let stats = fs::read_to_string(args.index_dir.join(files::STATS))?;
    for line in stats.lines() {
        if !line.is_empty() && !line.starts_with('#') {
            println!("{}", line);
        }
    }
    Ok(())
}

fn show_lexicon_summary(lexicon: &Lexicon, top: usize) {
    println!("\n=== Lexicon summary (top {} terms by df) ===", top);
    let mut entries: Vec<_> = lexicon.iter().collect();
    entries.sort_by(|a, b| b.1.df.cmp(&a.1.df).then_with(|| a.0.cmp(b.0)));

    println!("{:<20} {:>10} {:>12} {:>8}", "term", "df", "cf", "blocks");
    for (term, meta) in entries.into_iter().take(top) {
        println!(
            "{:<20} {:>10} {:>12} {:>8}",
            term, meta.df, meta.cf, meta.blocks
        );
    }
}

/// Walk a term's full posting list and re-verify it against the lexicon
fn inspect_term(args: &Args, lexicon: &Lexicon, term: &str) -> Result<()> {
    println!("\n=== Term: {} ===", term);
    let Some(meta) = lexicon.get(term) else {
        println!("not found in lexicon");
        return Ok(());
    };
    println!(
        "df {} cf {} blocks {} docids_offset {} freqs_offset {}",
        meta.df, meta.cf, meta.blocks, meta.docids_offset, meta.freqs_offset
    );

    let mut cursor = PostingCursor::open(
        args.index_dir.join(files::POSTINGS_DOCIDS),
        args.index_dir.join(files::POSTINGS_FREQS),
        meta,
    )?;

    let mut postings = 0u32;
    let mut total_freq = 0u64;
    let mut prev = None;
    let mut monotone = true;
    while cursor.valid() {
        if let Some(p) = prev {
            if cursor.doc() <= p {
                monotone = false;
            }
        }
        prev = Some(cursor.doc());
        postings += 1;
        total_freq += cursor.freq() as u64;
        cursor.next();
    }

    println!(
        "walked {} postings (expected {}), total frequency {} (expected {})",
        postings, meta.df, total_freq, meta.cf
    );
    if postings != meta.df || total_freq != meta.cf || !monotone {
        println!("MISMATCH: posting list disagrees with its lexicon entry");
    } else {
        println!("verification passed");
    }
    Ok(())
}

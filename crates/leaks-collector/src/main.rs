use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use itertools::Itertools;
use leaks_snapshot::HeapGraph;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Sweeping and walking multi-gigabyte heaps is allocation-heavy; mimalloc
// measurably shortens index builds.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Explain why leaked JVM heap objects are still reachable.
///
/// Reads an hprof snapshot, builds (or loads) a reverse reference index,
/// and prints one representative reference chain from a GC root for every
/// distinct retention cause of the selected leak classes.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Path to the hprof snapshot file
    snapshot: PathBuf,

    /// Class whose instances are treated as leaked (simple or fully
    /// qualified name; repeatable)
    #[arg(long = "leak-class", value_name = "NAME")]
    leak_classes: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr so the report on stdout stays pipeable.
    // Default to warn, allowlist our crates at the requested level.
    const CRATES: &[&str] = &[
        "leaks_collector",
        "leaks_snapshot",
        "leaks_index",
        "leaks_analysis",
    ];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !cli.snapshot.exists() {
        bail!("snapshot not found: {}", cli.snapshot.display());
    }

    let snapshot = leaks_snapshot::HprofSnapshot::open(&cli.snapshot)
        .with_context(|| {
            format!("failed to read snapshot {}", cli.snapshot.display())
        })?;

    let index = leaks_index::load_or_build(&snapshot, &cli.snapshot);
    let targets =
        leaks_analysis::select_targets(&snapshot, &cli.leak_classes);
    info!(
        instances = snapshot.info().instance_count,
        targets = targets.len(),
        "targets selected"
    );

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    leaks_analysis::run(&snapshot, &index, &targets, &mut out)?;
    out.flush()?;
    Ok(())
}

//! `membench`: measures the retained heap footprint of container families.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use membench::{
    bench_from_config, AggregationPolicy, BenchReport, CountingAllocator, CountingHeap,
    CsvExporter, MarkdownReport, SetFamily,
};
use membench_config::{BenchConfig, HeapScopeConfig, OutputFormat, SweepSegment};
use tracing::info;

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator::system();

#[derive(Parser, Debug)]
#[command(
    name = "membench",
    about = "Retained heap footprint of container families across a size sweep",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Bench configuration file (TOML, or YAML by extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Family to measure; repeat for several. Defaults to all families.
    #[arg(long = "family", value_name = "NAME")]
    families: Vec<SetFamily>,

    /// Comma-separated sizes, replacing the configured sweep
    #[arg(long, value_delimiter = ',', value_name = "N,N,...")]
    sizes: Vec<usize>,

    /// Which allocations are counted
    #[arg(long, value_enum)]
    scope: Option<ScopeOpt>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatOpt>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Leave clamped readings out of the per-size comparison
    #[arg(long, default_value_t = false)]
    exclude_flagged: bool,

    /// No banner or progress lines
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
enum ScopeOpt {
    Thread,
    Process,
}

impl From<ScopeOpt> for HeapScopeConfig {
    fn from(opt: ScopeOpt) -> Self {
        match opt {
            ScopeOpt::Thread => HeapScopeConfig::Thread,
            ScopeOpt::Process => HeapScopeConfig::Process,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
enum FormatOpt {
    Markdown,
    Csv,
}

impl From<FormatOpt> for OutputFormat {
    fn from(opt: FormatOpt) -> Self {
        match opt {
            FormatOpt::Markdown => OutputFormat::Markdown,
            FormatOpt::Csv => OutputFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if !cli.quiet {
        membench_console::init();
    }

    let config = resolve_config(&cli)?;

    CountingHeap::new(config.heap_scope())
        .ensure_installed()
        .context("membench must run with CountingAllocator as its global allocator")?;

    let bench = bench_from_config(&config).context("invalid bench configuration")?;
    let report = bench.execute().context("bench run failed")?;

    let policy = if cli.exclude_flagged {
        AggregationPolicy::ExcludeFlagged
    } else {
        AggregationPolicy::IncludeFlagged
    };
    let rendered = render(&report, config.output.format, policy);

    match &config.output.path {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(event = "report_written", path = %path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("failed to write report to stdout")?;
        }
    }

    Ok(())
}

// Command-line flags override the configuration file.
fn resolve_config(cli: &Cli) -> Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => BenchConfig::new(),
    };

    if !cli.families.is_empty() {
        config.families = cli.families.iter().map(|f| f.name().to_string()).collect();
    }
    if !cli.sizes.is_empty() {
        config.sweep = vec![SweepSegment::sizes_of(cli.sizes.clone())];
    }
    if let Some(scope) = cli.scope {
        config.heap_scope = scope.into();
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(path) = &cli.output {
        config.output.path = Some(path.clone());
    }

    Ok(config)
}

fn render(report: &BenchReport, format: OutputFormat, policy: AggregationPolicy) -> String {
    match format {
        OutputFormat::Markdown => MarkdownReport::to_string_with_policy(report, policy),
        OutputFormat::Csv => CsvExporter::to_string(report),
    }
}

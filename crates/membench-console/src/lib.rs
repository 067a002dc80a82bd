//! Colorful console output for bench runs.
//!
//! Provides a custom `tracing` layer that formats bench events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (bench start/end)
//! - **WARN**: Cells that could not be measured
//! - **DEBUG**: One line per measured cell
//! - **TRACE**: Probe settling details

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static BENCH_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "membench_benchmark=info";

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes console output with [`DEFAULT_FILTER`].
///
/// Safe to call multiple times - only the first call has effect.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Initializes console output, using `default_filter` unless `RUST_LOG` is set.
///
/// Safe to call multiple times - only the first call has effect.
pub fn init_with_filter(default_filter: &str) {
    INIT.get_or_init(|| {
        print_banner();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(MemBenchConsoleLayer)
            .try_init();
    });
}

fn mark_bench_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    BENCH_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = BENCH_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
                           _                     _
 _ __ ___   ___ _ __ ___  | |__   ___ _ __   ___| |__
| '_ ` _ \ / _ \ '_ ` _ \ | '_ \ / _ \ '_ \ / __| '_ \
| | | | | |  __/ | | | | || |_) |  __/ | | | (__| | | |
|_| |_| |_|\___|_| |_| |_||_.__/ \___|_| |_|\___|_| |_|
"#;

    let version_line = format!("          v{} - Retained Heap Footprint Bench\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats bench events with colors.
pub struct MemBenchConsoleLayer;

impl<S: Subscriber> Layer<S> for MemBenchConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();

        if !target.starts_with("membench") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let level = *metadata.level();
        let output = format_event(&visitor, level);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    target_kind: Option<String>,
    label: Option<String>,
    message: Option<String>,
    size: Option<u64>,
    bytes: Option<u64>,
    passes: Option<u64>,
    drift_bytes: Option<u64>,
    size_count: Option<u64>,
    entry_count: Option<u64>,
    warmup_count: Option<u64>,
    duration_ms: Option<u64>,
    measured: Option<u64>,
    unmeasured: Option<u64>,
    failed: Option<u64>,
    low_confidence_count: Option<u64>,
    baseline_passes: Option<u64>,
    retained_passes: Option<u64>,
    low_confidence: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "target_kind" => self.target_kind = Some(s),
            "label" => self.label = Some(s),
            "message" => self.message = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "size" => self.size = Some(value),
            "bytes" => self.bytes = Some(value),
            "passes" => self.passes = Some(value),
            "drift_bytes" => self.drift_bytes = Some(value),
            "size_count" => self.size_count = Some(value),
            "entry_count" => self.entry_count = Some(value),
            "warmup_count" => self.warmup_count = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "measured" => self.measured = Some(value),
            "unmeasured" => self.unmeasured = Some(value),
            "failed" => self.failed = Some(value),
            "low_confidence" => self.low_confidence_count = Some(value),
            "baseline_passes" => self.baseline_passes = Some(value),
            "retained_passes" => self.retained_passes = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "low_confidence" {
            self.low_confidence = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "target_kind" => self.target_kind = Some(value.to_string()),
            "label" => self.label = Some(value.to_string()),
            "message" => self.message = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "bench_start" => format_bench_start(v),
        "bench_end" => format_bench_end(v),
        "cell_measured" => format_cell_measured(v),
        "cell_unstable" => format_cell_unstable(v),
        "cell_failed" => format_cell_failed(v),
        "probe_settled" => format_probe_settled(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_cell_key(v: &EventVisitor) -> String {
    let label = v.label.as_deref().unwrap_or("?");
    let size = v.size.unwrap_or(0);
    format!(
        "{} @ {:>5}",
        label.white().bold(),
        size.to_formatted_string(&Locale::en)
    )
}

fn format_bench_start(v: &EventVisitor) -> String {
    mark_bench_start();
    let target_kind = v.target_kind.as_deref().unwrap_or("Unknown");
    let sizes = v.size_count.unwrap_or(0);
    let entries = v.entry_count.unwrap_or(0);
    let warmup = v.warmup_count.unwrap_or(0);

    format!(
        "{} {} Measuring {} │ {} entries │ {} sizes │ {} cells │ {} warmup",
        format_elapsed(),
        "▶".bright_green().bold(),
        target_kind.bright_white().bold(),
        entries.to_formatted_string(&Locale::en).bright_yellow(),
        sizes.to_formatted_string(&Locale::en).bright_yellow(),
        (entries * sizes)
            .to_formatted_string(&Locale::en)
            .bright_magenta(),
        warmup.to_formatted_string(&Locale::en).bright_yellow(),
    )
}

fn format_bench_end(v: &EventVisitor) -> String {
    let target_kind = v.target_kind.as_deref().unwrap_or("Unknown");
    let duration = v.duration_ms.unwrap_or(0);
    let measured = v.measured.unwrap_or(0);
    let unmeasured = v.unmeasured.unwrap_or(0);
    let failed = v.failed.unwrap_or(0);
    let flagged = v.low_confidence_count.unwrap_or(0);

    let mut output = format!(
        "{} {} {} complete │ {} │ {} measured",
        format_elapsed(),
        "■".bright_cyan().bold(),
        target_kind.bright_white().bold(),
        format_duration_ms(duration).yellow(),
        measured.to_formatted_string(&Locale::en).bright_green(),
    );

    if unmeasured > 0 {
        output.push_str(&format!(
            " │ {} unmeasured",
            unmeasured.to_formatted_string(&Locale::en).bright_yellow()
        ));
    }
    if failed > 0 {
        output.push_str(&format!(
            " │ {} failed",
            failed.to_formatted_string(&Locale::en).bright_red()
        ));
    }
    if flagged > 0 {
        output.push_str(&format!(
            " │ {} clamped",
            flagged.to_formatted_string(&Locale::en).yellow()
        ));
    }

    output
}

fn format_cell_measured(v: &EventVisitor) -> String {
    let bytes = v.bytes.unwrap_or(0);
    let mut output = format!(
        "{} {} {} │ {}",
        format_elapsed(),
        "✓".bright_green(),
        format_cell_key(v),
        format_bytes(bytes).bright_magenta().bold(),
    );
    if v.low_confidence.unwrap_or(false) {
        output.push_str(&format!(" │ {}", "clamped".yellow()));
    }
    output
}

fn format_cell_unstable(v: &EventVisitor) -> String {
    format!(
        "{} {} {} │ {} after {} passes │ drift {}",
        format_elapsed(),
        "~".bright_yellow().bold(),
        format_cell_key(v),
        "unmeasured".bright_yellow(),
        v.passes.unwrap_or(0),
        format_bytes(v.drift_bytes.unwrap_or(0)),
    )
}

fn format_cell_failed(v: &EventVisitor) -> String {
    format!(
        "{} {} {} │ {} │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        format_cell_key(v),
        "failed".bright_red(),
        v.message.as_deref().unwrap_or("").bright_black(),
    )
}

fn format_probe_settled(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    format!(
        "{} {} settled │ baseline {} passes │ retained {} passes │ {}",
        format_elapsed(),
        "·".bright_black(),
        v.baseline_passes.unwrap_or(0),
        v.retained_passes.unwrap_or(0),
        format_bytes(v.bytes.unwrap_or(0)),
    )
    .bright_black()
    .to_string()
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn format_bytes(bytes: u64) -> String {
    format!("{} B", bytes.to_formatted_string(&Locale::en))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_format_bytes_groups_thousands() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1_234_567), "1,234,567 B");
    }

    #[test]
    fn test_unknown_events_are_silent() {
        let visitor = EventVisitor {
            event: Some("unrelated".into()),
            ..EventVisitor::default()
        };
        assert!(format_event(&visitor, Level::INFO).is_empty());
    }

    #[test]
    fn test_probe_settled_only_at_trace() {
        let visitor = EventVisitor {
            event: Some("probe_settled".into()),
            bytes: Some(64),
            ..EventVisitor::default()
        };
        assert!(format_event(&visitor, Level::DEBUG).is_empty());
        assert!(format_event(&visitor, Level::TRACE).contains("64 B"));
    }

    #[test]
    fn test_cell_lines_carry_label_and_outcome() {
        let measured = EventVisitor {
            event: Some("cell_measured".into()),
            label: Some("SortedArraySet".into()),
            size: Some(5),
            bytes: Some(60),
            low_confidence: Some(true),
            ..EventVisitor::default()
        };
        let line = format_event(&measured, Level::DEBUG);
        assert!(line.contains("SortedArraySet"));
        assert!(line.contains("60 B"));
        assert!(line.contains("clamped"));

        let failed = EventVisitor {
            event: Some("cell_failed".into()),
            label: Some("Broken".into()),
            message: Some("panicked: boom".into()),
            ..EventVisitor::default()
        };
        let line = format_event(&failed, Level::WARN);
        assert!(line.contains("failed"));
        assert!(line.contains("panicked: boom"));
    }
}

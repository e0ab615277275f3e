//! netstats - query network traffic counters.
//!
//! Reads per-interface counters from sysfs and falls back to the legacy
//! `xt_qtaguid` tables, printing the answer and the tier that produced it.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use netstats_core::collector::{CollectError, FileSystem, RealFs, TablePaths};
use netstats_core::source::{PrimarySource, SysfsSource, Unavailable};
use netstats_core::{Lookup, NetworkStats, StatsType, StatsValue};

/// Network traffic counters with legacy table fallback.
#[derive(Parser)]
#[command(name = "netstats", about = "Network traffic counters", version)]
struct Args {
    /// Path to /proc filesystem (for testing against captured tables).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Path to /sys filesystem.
    #[arg(long, default_value = "/sys")]
    sys_path: String,

    /// Skip the sysfs source and answer from the legacy tables only.
    #[arg(long)]
    legacy_only: bool,

    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// Repeat the query every SECS seconds until interrupted.
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Totals over all interfaces.
    Total {
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
    /// One interface by name.
    Iface {
        name: String,
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
    /// One interface by kernel index (no legacy fallback).
    Ifindex {
        index: i32,
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
    /// One application or user id.
    Uid {
        uid: u32,
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
    /// Dump the parsed rows of a legacy table.
    Rows {
        #[arg(value_enum)]
        table: Table,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    RxBytes,
    RxPackets,
    TxBytes,
    TxPackets,
}

impl From<Kind> for StatsType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::RxBytes => StatsType::RxBytes,
            Kind::RxPackets => StatsType::RxPackets,
            Kind::TxBytes => StatsType::TxBytes,
            Kind::TxPackets => StatsType::TxPackets,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Iface,
    Uid,
}

/// A counter query, detached from its CLI options.
#[derive(Debug, Clone, PartialEq)]
enum Query {
    Total,
    Iface(String),
    Ifindex(i32),
    Uid(u32),
}

impl Query {
    fn run<P: PrimarySource, F: FileSystem>(&self, stats: &NetworkStats<P, F>) -> Lookup {
        match self {
            Query::Total => stats.total(),
            Query::Iface(name) => stats.interface(Some(name.as_str())),
            Query::Ifindex(index) => stats.interface_index(*index),
            Query::Uid(uid) => stats.user(*uid),
        }
    }

    fn describe(&self) -> String {
        match self {
            Query::Total => "total".to_string(),
            Query::Iface(name) => format!("iface {}", name),
            Query::Ifindex(index) => format!("ifindex {}", index),
            Query::Uid(uid) => format!("uid {}", uid),
        }
    }
}

/// One printed result.
#[derive(Debug, Serialize)]
struct Sample {
    timestamp: String,
    query: String,
    tier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StatsValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    /// Selected counter; `None` when unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<u64>,
}

impl Sample {
    fn new(query: &Query, lookup: &Lookup, kind: Option<StatsType>) -> Self {
        let (stats, value) = match kind {
            Some(kind) => (None, lookup.stats().map(|s| s.get(kind))),
            None => (lookup.stats().copied(), None),
        };
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            query: query.describe(),
            tier: lookup.tier(),
            stats,
            kind: kind.map(StatsType::name),
            value,
        }
    }

    fn render_text(&self, with_timestamp: bool) -> String {
        let body = match (self.kind, self.value, &self.stats) {
            (Some(_), Some(value), _) => value.to_string(),
            (Some(_), None, _) => "unknown".to_string(),
            (None, _, Some(stats)) => format!("{} ({}): {}", self.query, self.tier, stats),
            (None, _, None) => format!("{}: unknown", self.query),
        };
        if with_timestamp {
            format!("{} {}", self.timestamp, body)
        } else {
            body
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["netstats", "netstats_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_sample(sample: &Sample, json: bool, with_timestamp: bool) {
    if json {
        match serde_json::to_string(sample) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize sample: {}", e),
        }
    } else {
        println!("{}", sample.render_text(with_timestamp));
    }
}

fn dump_rows<P: PrimarySource, F: FileSystem>(
    stats: &NetworkStats<P, F>,
    table: Table,
    json: bool,
) -> Result<(), CollectError> {
    let legacy = stats.legacy();
    match table {
        Table::Iface => {
            let rows = legacy.iface_rows()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
            } else {
                for row in rows {
                    let tcp = |v: Option<u64>| v.map_or("-".to_string(), |v| v.to_string());
                    println!(
                        "{:<16} {} tcp_rx_packets: {} tcp_tx_packets: {}",
                        row.iface,
                        row.stats,
                        tcp(row.tcp_rx_packets),
                        tcp(row.tcp_tx_packets)
                    );
                }
            }
        }
        Table::Uid => {
            let rows = legacy.uid_rows()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
            } else {
                for row in rows {
                    println!(
                        "{:>4} {:<16} tag=0x{:x} uid={} set={} {}",
                        row.idx, row.iface, row.tag, row.uid, row.set, row.stats
                    );
                }
            }
        }
    }
    Ok(())
}

/// Runs `query` every `interval` until `running` is cleared.
fn watch<P: PrimarySource, F: FileSystem>(
    stats: &NetworkStats<P, F>,
    query: &Query,
    kind: Option<StatsType>,
    interval: Duration,
    json: bool,
) {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    while running.load(Ordering::SeqCst) {
        let lookup = query.run(stats);
        print_sample(&Sample::new(query, &lookup, kind), json, true);

        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }
}

fn split_command(command: Command) -> Result<(Query, Option<StatsType>), Table> {
    match command {
        Command::Total { kind } => Ok((Query::Total, kind.map(Into::into))),
        Command::Iface { name, kind } => Ok((Query::Iface(name), kind.map(Into::into))),
        Command::Ifindex { index, kind } => Ok((Query::Ifindex(index), kind.map(Into::into))),
        Command::Uid { uid, kind } => Ok((Query::Uid(uid), kind.map(Into::into))),
        Command::Rows { table } => Err(table),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let fs = RealFs::new();
    let primary: Box<dyn PrimarySource> = if args.legacy_only {
        Box::new(Unavailable)
    } else {
        Box::new(SysfsSource::new(fs, &args.sys_path))
    };
    let stats = NetworkStats::new(primary, fs, TablePaths::under(&args.proc_path));
    debug!(
        "Config: proc={}, sys={}, legacy_only={}",
        args.proc_path, args.sys_path, args.legacy_only
    );

    let (query, kind) = match split_command(args.command) {
        Ok(split) => split,
        Err(table) => {
            return match dump_rows(&stats, table, args.json) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("netstats: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
    };

    if let Some(secs) = args.interval {
        watch(&stats, &query, kind, Duration::from_secs(secs.max(1)), args.json);
        return ExitCode::SUCCESS;
    }

    let lookup = query.run(&stats);
    print_sample(&Sample::new(&query, &lookup, kind), args.json, false);
    match lookup {
        Lookup::Unknown => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

//! SolVanity CLI
//!
//! Solana vanity address generator.

use std::num::NonZeroU64;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossbeam_channel::{after, bounded, never, select, Receiver};
use solvanity_core::{
    charset_size, difficulty, difficulty_f64, estimate_time, format_attempts, format_difficulty,
    format_duration, probability50, valid_characters, ChannelProgress, Ed25519Generator,
    EngineOptions, MatchMode, Pattern, ProgressSnapshot, SearchConfig, SearchEngine, SearchError,
    SearchResult, SearchState, DEFAULT_ATTEMPTS_PER_SECOND, DEFAULT_BATCH_SIZE,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "solvanity")]
#[command(version)]
#[command(about = "Solana vanity address generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a keypair whose address matches a pattern
    Generate(GenerateArgs),

    /// Show how hard a pattern is without searching
    Estimate {
        /// Pattern to evaluate
        #[arg(short, long)]
        pattern: String,

        /// Match case exactly
        #[arg(short = 's', long)]
        case_sensitive: bool,

        /// Assumed keypairs per second
        #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS_PER_SECOND)]
        rate: NonZeroU64,
    },

    /// Measure keypair generation speed
    Benchmark {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Number of generation threads (0 = auto)
        #[arg(long, default_value = "1")]
        threads: usize,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Pattern to search for
    #[arg(short, long)]
    pattern: String,

    /// Where the pattern must appear
    #[arg(short, long, default_value = "prefix")]
    mode: ModeArg,

    /// Match case exactly
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Keypairs generated per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Number of generation threads (1 = inline, 0 = auto)
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Maximum time in seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_time: u64,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Prefix,
    Suffix,
}

impl From<ModeArg> for MatchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Prefix => MatchMode::Prefix,
            ModeArg::Suffix => MatchMode::Suffix,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => cmd_generate(args)?,
        Commands::Estimate {
            pattern,
            case_sensitive,
            rate,
        } => cmd_estimate(&pattern, case_sensitive, rate)?,
        Commands::Benchmark { duration, threads } => cmd_benchmark(duration, threads)?,
    }

    Ok(())
}

fn thread_count(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = SearchConfig::new(args.case_sensitive, args.mode.into());
    let options = EngineOptions {
        batch_size: args.batch_size,
        threads: args.threads,
        ..Default::default()
    };

    // Reject bad input before printing anything else
    let pattern = Pattern::parse(&args.pattern)?;

    if !args.json {
        let difficulty = difficulty(pattern.as_str(), config.case_sensitive);
        eprintln!("SolVanity v{}", env!("CARGO_PKG_VERSION"));
        eprintln!(
            "Pattern: {} ({}{})",
            pattern,
            config.mode,
            if config.case_sensitive { ", case-sensitive" } else { "" }
        );
        if pattern.as_str() != args.pattern.trim() {
            eprintln!("         (normalized from '{}')", args.pattern.trim());
        }
        eprintln!("Threads: {}", thread_count(args.threads));
        eprintln!(
            "Difficulty: {} ({})",
            difficulty,
            format_difficulty(difficulty_f64(&difficulty))
        );
        eprintln!(
            "50% chance after: {} attempts",
            probability50(pattern.as_str(), config.case_sensitive)
        );
        eprintln!();
    }

    let mut engine = SearchEngine::with_options(config, Ed25519Generator, options)?;
    let handle = engine.stop_handle();
    let (progress_tx, progress_rx) = bounded(16);
    let (done_tx, done_rx) = bounded(1);

    let raw = args.pattern.clone();
    let worker = thread::spawn(move || {
        let mut observer = ChannelProgress::new(progress_tx);
        let outcome = engine.start_with_progress(&raw, &mut observer);
        // Outcome goes out before the progress channel disconnects
        let _ = done_tx.send(outcome);
    });

    let deadline = if args.max_time > 0 {
        after(Duration::from_secs(args.max_time))
    } else {
        never()
    };

    let outcome = watch(progress_rx, done_rx, deadline, args.json, || {
        info!("Time limit of {}s reached, stopping", args.max_time);
        handle.stop();
    })?;

    worker
        .join()
        .map_err(|_| anyhow!("Search thread panicked"))?;

    match outcome {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        Err(SearchError::Cancelled) => {
            if args.json {
                println!("{{\"error\": \"No match found within limits\"}}");
            } else {
                eprintln!("No match found within limits.");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print progress until the search reports its outcome
fn watch<T>(
    progress: Receiver<ProgressSnapshot>,
    done: Receiver<T>,
    deadline: Receiver<std::time::Instant>,
    quiet: bool,
    mut on_deadline: impl FnMut(),
) -> Result<T> {
    loop {
        select! {
            recv(progress) -> msg => match msg {
                Ok(snapshot) if !quiet => eprint!("\r{}", snapshot.format()),
                // Disconnected only once the outcome is already on `done`
                _ => {}
            },
            recv(done) -> msg => {
                if !quiet {
                    eprintln!();
                }
                return msg.map_err(|_| anyhow!("Search thread exited without a result"));
            }
            recv(deadline) -> _ => on_deadline(),
        }
    }
}

fn cmd_estimate(pattern: &str, case_sensitive: bool, rate: NonZeroU64) -> Result<()> {
    let pattern = Pattern::parse(pattern)?;
    let difficulty = difficulty(pattern.as_str(), case_sensitive);
    let seconds = estimate_time(pattern.as_str(), case_sensitive, rate);

    println!("Pattern:          {}", pattern);
    println!(
        "Charset size:     {} ({})",
        charset_size(case_sensitive),
        valid_characters(case_sensitive)
    );
    println!(
        "Difficulty:       {} ({})",
        difficulty,
        format_difficulty(difficulty_f64(&difficulty))
    );
    println!(
        "50% chance after: {} attempts",
        probability50(pattern.as_str(), case_sensitive)
    );
    println!(
        "Estimated time:   {}s at {}/s ({})",
        seconds,
        format_attempts(rate.get()),
        format_duration(difficulty_f64(&seconds))
    );

    Ok(())
}

fn cmd_benchmark(duration_secs: u64, threads: usize) -> Result<()> {
    eprintln!("Benchmarking Ed25519 keypairs for {} seconds...", duration_secs);
    eprintln!("Threads: {}", thread_count(threads));
    eprintln!();

    let last = run_benchmark(Duration::from_secs(duration_secs), threads)?
        .ok_or_else(|| anyhow!("No batch completed; try a longer duration"))?;

    println!("Keys tested: {}", format_attempts(last.attempts));
    println!("Speed:       {}/s", format_attempts(last.attempts_per_second() as u64));

    Ok(())
}

/// Search an unreachable pattern for `duration` and return the last progress
/// snapshot, if any batch completed
fn run_benchmark(duration: Duration, threads: usize) -> Result<Option<ProgressSnapshot>> {
    let config = SearchConfig::new(true, MatchMode::Prefix);
    let options = EngineOptions {
        threads,
        ..Default::default()
    };
    let mut engine = SearchEngine::with_options(config, Ed25519Generator, options)?;
    let handle = engine.stop_handle();

    let worker = thread::spawn(move || {
        let mut last = None;
        let mut record = |s: &ProgressSnapshot| last = Some(*s);
        let outcome = engine.start_with_progress("zzzzzzzzzzzzzzzzzzzz", &mut record);
        (outcome, last)
    });

    // A stop only lands on a running search
    while handle.state() == SearchState::Idle && !worker.is_finished() {
        thread::sleep(Duration::from_millis(1));
    }

    thread::sleep(duration);
    handle.stop();
    let (outcome, last) = worker
        .join()
        .map_err(|_| anyhow!("Benchmark thread panicked"))?;

    match outcome {
        Err(SearchError::Cancelled) => Ok(last),
        Err(e) => Err(e.into()),
        Ok(_) => Err(anyhow!("Benchmark pattern unexpectedly matched")),
    }
}

fn print_result(result: &SearchResult) {
    println!();
    println!("MATCH FOUND!");
    println!("{:-<60}", "");
    println!("Address:     {}", result.public_address);
    println!("Private Key: {}", result.private_key_material);
    println!("{:-<60}", "");
    println!("Keys Tested: {}", result.attempts);
    println!("Time:        {:.2}s", result.elapsed_millis as f64 / 1000.0);
    println!("Speed:       {}/s", format_attempts(result.keys_per_second() as u64));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_returns_outcome() {
        let (progress_tx, progress_rx) = bounded(4);
        let (done_tx, done_rx) = bounded(1);
        progress_tx
            .send(ProgressSnapshot {
                attempts: 500,
                elapsed_millis: 10,
                estimated_progress_percent: 1.0,
            })
            .unwrap();
        done_tx.send(42).unwrap();
        drop(progress_tx);

        let outcome = watch(progress_rx, done_rx, never(), true, || panic!("no deadline")).unwrap();
        assert_eq!(outcome, 42);
    }

    #[test]
    fn test_watch_fires_deadline() {
        let (_progress_tx, progress_rx) = bounded::<ProgressSnapshot>(1);
        let (done_tx, done_rx) = bounded(1);

        let outcome = watch(progress_rx, done_rx, after(Duration::ZERO), true, || {
            done_tx.send("stopped").unwrap()
        })
        .unwrap();
        assert_eq!(outcome, "stopped");
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from(["solvanity", "generate", "-p", "Sol", "-m", "suffix", "-s"])
            .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.pattern, "Sol");
                assert!(args.case_sensitive);
                assert_eq!(MatchMode::from(args.mode), MatchMode::Suffix);
                assert_eq!(args.batch_size, DEFAULT_BATCH_SIZE);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_benchmark_with_zero_duration_returns() {
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let _ = tx.send(run_benchmark(Duration::ZERO, 1).map(|_| ()));
        });

        let outcome = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("benchmark did not stop");
        outcome.unwrap();
    }

    #[test]
    fn test_estimate_rejects_zero_rate() {
        assert!(Cli::try_parse_from(["solvanity", "estimate", "-p", "a", "-r", "0"]).is_err());
    }
}

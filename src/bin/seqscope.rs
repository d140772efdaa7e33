use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use seqscope::analyzer::Analyzer;
use seqscope::scanner::Scanner;

#[derive(Parser, Debug)]
#[command(name = "seqscope", version, about = "Semantic log pattern miner and parser")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize a single message and print its tokens
    Scan {
        /// Message to tokenize
        #[arg(short, long)]
        msg: String,
    },
    /// Discover the patterns that cover every message of a log file
    Analyze {
        /// Input log file (`.gz` accepted)
        #[arg(short, long)]
        infile: PathBuf,
        /// Seed pattern file; matching messages bypass discovery
        #[arg(short, long)]
        patfile: Option<PathBuf>,
        /// Output file, stdout if omitted
        #[arg(short, long)]
        outfile: Option<PathBuf>,
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Classify a log file against a pattern file
    Parse {
        /// Input log file (`.gz` accepted)
        #[arg(short, long)]
        infile: PathBuf,
        /// Pattern file
        #[arg(short, long)]
        patfile: PathBuf,
    },
    /// Measure classification throughput over a worker pool
    Bench {
        /// Input log file (`.gz` accepted)
        #[arg(short, long)]
        infile: PathBuf,
        /// Pattern file
        #[arg(short, long)]
        patfile: PathBuf,
        /// Worker threads; 0 means one per core
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
    },
}

#[derive(Serialize)]
struct PatternReport {
    pattern: String,
    count: usize,
    examples: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { msg } => scan(&msg),
        Command::Analyze {
            infile,
            patfile,
            outfile,
            format,
        } => analyze(&infile, patfile.as_deref(), outfile.as_deref(), &format),
        Command::Parse { infile, patfile } => parse(&infile, &patfile),
        Command::Bench {
            infile,
            patfile,
            workers,
        } => bench(&infile, &patfile, workers),
    }
}

fn scan(msg: &str) -> anyhow::Result<()> {
    let seq = Scanner::new().scan(msg)?;
    println!("{}", seq.long_string());
    Ok(())
}

fn analyze(
    infile: &Path,
    patfile: Option<&Path>,
    outfile: Option<&Path>,
    format: &str,
) -> anyhow::Result<()> {
    let parser = build_parser(patfile)?;
    let scanner = Scanner::new();
    let lines = read_lines(infile)?;

    // Pass 1: anything the seed patterns cannot parse feeds discovery.
    let mut analyzer = Analyzer::new();
    let mut unscannable = 0usize;
    for line in &lines {
        match scanner.scan(line) {
            Ok(seq) => {
                if parser.parse(&seq).is_err() {
                    analyzer.add(&seq);
                }
            }
            Err(err) => {
                unscannable += 1;
                tracing::warn!(%err, %line, "skipping unscannable message");
            }
        }
    }
    analyzer.finalize();

    // Pass 2: classify every message, parser first, discovery fallback.
    // pattern -> signature -> one example line
    let mut known: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut discovered: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut known_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut discovered_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unmatched = 0usize;

    for line in &lines {
        let Ok(seq) = scanner.scan(line) else { continue };
        if let Ok(parsed) = parser.parse(&seq) {
            let pattern = parsed.to_string();
            known
                .entry(pattern.clone())
                .or_default()
                .insert(parsed.signature(), line.clone());
            *known_counts.entry(pattern).or_insert(0) += 1;
        } else if let Ok(analyzed) = analyzer.analyze(&seq) {
            let pattern = analyzed.to_string();
            discovered
                .entry(pattern.clone())
                .or_default()
                .insert(analyzed.signature(), line.clone());
            *discovered_counts.entry(pattern).or_insert(0) += 1;
        } else {
            unmatched += 1;
            tracing::warn!(%line, "no pattern matched");
        }
    }

    let mut out = open_output(outfile)?;
    if format == "json" {
        let reports: Vec<PatternReport> = known
            .iter()
            .map(|(pattern, examples)| (pattern, examples, &known_counts))
            .chain(
                discovered
                    .iter()
                    .map(|(pattern, examples)| (pattern, examples, &discovered_counts)),
            )
            .map(|(pattern, examples, counts)| PatternReport {
                pattern: pattern.clone(),
                count: counts.get(pattern).copied().unwrap_or(0),
                examples: examples.values().cloned().collect(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &reports)?;
        writeln!(out)?;
    } else {
        for map in [&known, &discovered] {
            for (pattern, examples) in map {
                writeln!(out, "{pattern}")?;
                for example in examples.values() {
                    writeln!(out, "# {example}")?;
                }
                writeln!(out)?;
            }
        }
    }

    tracing::info!(
        messages = lines.len(),
        patterns = known.len() + discovered.len(),
        new = discovered.len(),
        unscannable,
        unmatched,
        "analysis complete"
    );
    Ok(())
}

fn parse(infile: &Path, patfile: &Path) -> anyhow::Result<()> {
    let parser = build_parser(Some(patfile))?;
    let scanner = Scanner::new();
    let lines = read_lines(infile)?;

    let start = Instant::now();
    let mut failed = 0usize;
    for line in &lines {
        let ok = scanner
            .scan(line)
            .ok()
            .and_then(|seq| parser.parse(&seq).ok())
            .is_some();
        if !ok {
            failed += 1;
            tracing::warn!(%line, "failed to parse");
        }
    }
    report_rate("parse", lines.len(), failed, start.elapsed());
    Ok(())
}

fn bench(infile: &Path, patfile: &Path, workers: usize) -> anyhow::Result<()> {
    let parser = build_parser(Some(patfile))?;
    let lines = read_lines(infile)?;

    let threads = if workers == 0 { num_cpus::get() } else { workers };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;

    let failed = AtomicUsize::new(0);
    let start = Instant::now();
    pool.install(|| {
        lines.par_iter().for_each(|line| {
            let scanner = Scanner::new();
            let ok = scanner
                .scan(line)
                .ok()
                .and_then(|seq| parser.parse(&seq).ok())
                .is_some();
            if !ok {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        });
    });
    let elapsed = start.elapsed();

    tracing::info!(threads, "bench finished");
    report_rate("bench", lines.len(), failed.into_inner(), elapsed);
    Ok(())
}

fn report_rate(what: &str, total: usize, failed: usize, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    let rate = total as f64 / secs;
    tracing::info!(total, failed, elapsed_secs = secs, msgs_per_sec = rate, "{what} done");
}

fn build_parser(patfile: Option<&Path>) -> anyhow::Result<seqscope::parser::Parser> {
    match patfile {
        Some(path) => {
            let reader = open_input(path)?;
            Ok(seqscope::patfile::build_parser(reader)?)
        }
        None => Ok(seqscope::parser::Parser::new()),
    }
}

/// Log and pattern files may be gzip-compressed; pick the decoder off the
/// file name.
fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stdout())),
    }
}

/// Reads every non-empty, non-comment line of a log file.
fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let reader = open_input(path)?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line);
    }
    Ok(lines)
}

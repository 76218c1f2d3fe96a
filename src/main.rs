use std::{
    env,
    fs::{self, File},
    io::{self, BufWriter, Write},
    ops::ControlFlow,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand, ValueEnum};
use tacst_recon::{
    graph::stats::LemmaStats, lex::TraceParser, process_trace, reconstruct, trace::TraceReader,
    Error, Reconstruction, Result,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tacst-recon")]
#[command(about = "Reconstruct proof-search graphs from tactic traces")]
struct Cli {
    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    stderr_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one JSON line of statistics per lemma
    Stats {
        trace: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump reconstructed lemmas as JSON
    Dump {
        trace: PathBuf,
        /// Only this lemma, pretty-printed
        #[arg(short, long)]
        lemma: Option<String>,
    },
    /// Print the tactics of one lemma in traversal order
    Show {
        trace: PathBuf,
        #[arg(short, long)]
        lemma: String,
        #[arg(long, value_enum, default_value_t = Order::Flat)]
        order: Order,
    },
    /// Reconstruct every lemma and report failures
    Check { trace: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Flat,
    Bfs,
    Dfs,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.stderr_log) {
        eprintln!("Error: cannot open log file: {e}");
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Stats { trace, output } => stats(&trace, output.as_deref()),
        Commands::Dump { trace, lemma } => dump(&trace, lemma.as_deref()),
        Commands::Show {
            trace,
            lemma,
            order,
        } => show(&trace, &lemma, order),
        Commands::Check { trace } => check(&trace),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn init_tracing(to_stderr: bool) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tacst_recon=info"));

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
        return Ok(());
    }

    let dir = dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("tacst-recon");
    fs::create_dir_all(&dir)?;
    let log_file = File::create(dir.join("tacst-recon.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(false)
        .pretty()
        .init();
    Ok(())
}

fn open(trace: &Path) -> Result<TraceParser> {
    info!("reading {}", trace.display());
    Ok(TraceParser::new(TraceReader::from_path(trace)?))
}

/// Reconstruct the lemma called `name`, failing if the trace has none.
fn find(trace: &Path, name: &str) -> Result<Reconstruction> {
    let mut parser = open(trace)?;
    if !parser.seek_lemma(name) {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no lemma named {name} in {}", trace.display()),
        )));
    }
    let lemma = parser.parse_lemma()?.ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("lemma {name} is truncated"),
        ))
    })?;
    reconstruct(lemma)
}

/// Keep the first output failure and end the run on it.
fn stop_on_error(written: Result<()>, slot: &mut Option<Error>) -> ControlFlow<()> {
    match written {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => {
            warn!("stopping: {e}");
            *slot = Some(e);
            ControlFlow::Break(())
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn stats(trace: &Path, output: Option<&Path>) -> Result<bool> {
    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    let mut write_error = None;

    let mut parser = open(trace)?;
    let report = process_trace(&mut parser, |recon| {
        let written = LemmaStats::of(&recon.graph, &recon.lemma.tables)
            .to_json_line(&recon.lemma.name)
            .and_then(|line| Ok(writeln!(out, "{line}")?));
        stop_on_error(written, &mut write_error)
    });

    if let Some(e) = write_error {
        return Err(e);
    }
    out.flush()?;
    Ok(report.failures.is_empty())
}

fn dump(trace: &Path, lemma: Option<&str>) -> Result<bool> {
    if let Some(name) = lemma {
        let recon = find(trace, name)?;
        println!("{}", serde_json::to_string_pretty(&recon)?);
        return Ok(true);
    }

    let mut stdout = io::stdout().lock();
    let mut write_error = None;
    let mut parser = open(trace)?;
    let report = process_trace(&mut parser, |recon| {
        let written = serde_json::to_string(&recon)
            .map_err(Error::from)
            .and_then(|json| Ok(writeln!(stdout, "{json}")?));
        stop_on_error(written, &mut write_error)
    });

    if let Some(e) = write_error {
        return Err(e);
    }
    Ok(report.failures.is_empty())
}

fn show(trace: &Path, name: &str, order: Order) -> Result<bool> {
    let recon = find(trace, name)?;
    let graph = &recon.graph;
    println!("{} (root {})", graph.name, graph.root());

    match order {
        Order::Flat => {
            for entry in graph.flat_view() {
                let pretty = entry
                    .snapshot
                    .and_then(|s| s.pretty_goal.as_deref())
                    .unwrap_or("");
                println!(
                    "{:indent$}{} => {} {pretty}",
                    "",
                    entry.edge.full_tactic,
                    entry.target,
                    indent = 2 * entry.depth.saturating_sub(1)
                );
            }
        }
        Order::Bfs | Order::Dfs => {
            let steps = if matches!(order, Order::Bfs) {
                graph.bfs_traverse()
            } else {
                graph.dfs_traverse()
            };
            for step in steps {
                let tactic = step.tactic.map_or("", |edge| edge.full_tactic.as_str());
                let pretty = step.snapshot.pretty_goal.as_deref().unwrap_or("");
                println!("{:>6}  {tactic}  {pretty}", step.goal_id);
            }
        }
    }

    let report = graph.dead_paths();
    if !report.unreachable.is_empty() {
        warn!(
            "{} failed goals unreachable from the root",
            report.unreachable.len()
        );
    }
    Ok(true)
}

fn check(trace: &Path) -> Result<bool> {
    let mut parser = open(trace)?;
    let report = process_trace(&mut parser, |recon| {
        info!(
            lemma = %recon.lemma.name,
            tactics = recon.tactics.tactics.len(),
            goals = recon.graph.num_nodes(),
            "ok"
        );
        ControlFlow::Continue(())
    });

    for failure in &report.failures {
        eprintln!("{failure}");
    }
    println!("{} ok, {} failed", report.num_ok(), report.num_failed());
    Ok(report.failures.is_empty())
}

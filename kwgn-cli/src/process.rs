//! `process`: run one or more batches through a session and export the results.

use anyhow::{Context, Result, bail};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use kwgn_core::{
    FileId, FileSubmission, SessionAction, SessionFile, SessionState, SessionStore, batch_actions,
    failure_actions,
};
use kwgn_finance::{
    cumulative_flow, daily_flow, flow_graph, summarize_session, to_csv_rows, write_csv,
};
use kwgn_ingest::{BatchEnvelope, BatchRollup, ExtractionEngine, Orchestrator};

use crate::config::Config;

/// Human-readable report stream. Moves to stderr when stdout carries CSV.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    to_stderr: bool,
}

impl Reporter {
    pub fn new(to_stderr: bool) -> Self {
        Self { to_stderr }
    }

    pub fn line(&self, text: impl Display) {
        if self.to_stderr {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

pub struct ProcessArgs {
    pub files: Vec<PathBuf>,
    pub add: Vec<PathBuf>,
    pub csv: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub summary: bool,
}

pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub async fn run_process(cfg: &Config, args: ProcessArgs) -> Result<()> {
    let strategies = cfg.engine.strategies()?;
    if strategies.is_empty() {
        bail!("engine.strategies is empty; nothing to try");
    }
    let orch = Orchestrator::new(cfg.engine.build_engine())
        .with_strategies(strategies)
        .with_scratch_dir(cfg.engine.scratch_dir.clone());

    let mut batches = vec![read_submissions(&args.files)?];
    if !args.add.is_empty() {
        batches.push(read_submissions(&args.add)?);
    }

    let report = Reporter::new(args.csv.as_deref().is_some_and(is_stdout));
    let state = run_session(&orch, batches, report).await;

    if let Some(path) = &args.log {
        fs::write(path, &state.output).with_context(|| format!("write {}", path.display()))?;
        report.line(format_args!("Log written to {}", path.display()));
    }
    if let Some(path) = &args.csv {
        export_csv(&state, path)?;
        if !is_stdout(path) {
            report.line(format_args!(
                "{} rows written to {}",
                state.transactions.len(),
                path.display()
            ));
        }
    }
    if args.summary {
        print_summary(&state, report);
    }
    Ok(())
}

fn read_submissions(paths: &[PathBuf]) -> Result<Vec<FileSubmission>> {
    paths
        .iter()
        .map(|p| FileSubmission::from_path(p).with_context(|| format!("read {}", p.display())))
        .collect()
}

/// Feed each batch through the orchestrator in turn, folding results into one session.
pub async fn run_session<E: ExtractionEngine>(
    orch: &Orchestrator<E>,
    batches: Vec<Vec<FileSubmission>>,
    report: Reporter,
) -> SessionState {
    let mut store = SessionStore::new();
    let mut last_millis = 0_i64;

    for (n, submissions) in batches.into_iter().enumerate() {
        // ids must stay unique across batches created within the same millisecond
        let millis = chrono::Utc::now().timestamp_millis().max(last_millis + 1);
        last_millis = millis;

        let pending: Vec<SessionFile> = submissions
            .iter()
            .enumerate()
            .map(|(i, s)| SessionFile::pending(FileId::new(millis, i), s))
            .collect();
        store.dispatch(SessionAction::UpsertFiles(pending.clone()));

        report.line(format_args!("Batch {} ({} files)", n + 1, submissions.len()));
        let known = store.snapshot().known_digests();
        match orch.submit(&submissions, &known).await {
            BatchEnvelope::Success { results, rollups } => {
                print_rollup(&rollups, report);
                store.dispatch_all(batch_actions(&pending, &results));
            }
            BatchEnvelope::Failure { error } => {
                report.line(format_args!("  batch failed: {error}"));
                store.dispatch_all(failure_actions(&pending, &error));
            }
        }
    }

    store.into_state()
}

fn print_rollup(rollup: &BatchRollup, report: Reporter) {
    for file in &rollup.files {
        match (&file.error, file.strategy_used) {
            (Some(error), _) => report.line(format_args!("  error  {}  {error}", file.name)),
            (None, strategy) => {
                let (credit, debit, nett) = match &file.reported {
                    Some(r) => (r.total_credit.as_str(), r.total_debit.as_str(), r.nett.as_str()),
                    None => ("-", "-", "-"),
                };
                report.line(format_args!(
                    "  ok     {}  {}  {} txns  credit {credit}  debit {debit}  nett {nett}",
                    file.name,
                    strategy.map(|s| s.name()).unwrap_or("-"),
                    file.transaction_count,
                ))
            }
        }
    }
    report.line(format_args!(
        "  {} ok, {} failed ({} duplicate), {} transactions, credit {}, debit {}",
        rollup.succeeded,
        rollup.failed,
        rollup.duplicates,
        rollup.transaction_count,
        rollup.reported.credit,
        rollup.reported.debit,
    ));
}

fn export_csv(state: &SessionState, path: &Path) -> Result<()> {
    let rows = to_csv_rows(&state.transactions);
    if is_stdout(path) {
        return write_csv(std::io::stdout().lock(), &rows);
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(BufWriter::new(file), &rows)
}

fn print_summary(state: &SessionState, report: Reporter) {
    let summary = summarize_session(state);
    report.line("\n## Files");
    for f in &summary.files {
        let nett = f.reported.as_ref().map_or("-", |r| r.nett.as_str());
        report.line(format_args!(
            "- {} [{}] {} txns, nett {nett}",
            f.name, f.status, f.transaction_count
        ));
    }
    report.line(format_args!(
        "Total: {} txns, credit {}, debit {}",
        summary.transaction_count, summary.reported.credit, summary.reported.debit
    ));

    let days = daily_flow(&state.transactions);
    if !days.is_empty() {
        report.line("\n## Daily flow");
        for (day, running) in days.iter().zip(cumulative_flow(&days)) {
            report.line(format_args!(
                "{}  in {}  out {}  balance {}",
                day.date, day.money_in, day.money_out, running.cumulative
            ));
        }
    }

    let graph = flow_graph(&state.transactions);
    if graph.nodes.len() > 1 {
        report.line("\n## Flow");
        for link in &graph.links {
            report.line(format_args!(
                "{} -> {}  {}",
                graph.nodes[link.source].name, graph.nodes[link.target].name, link.value
            ));
        }
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use hexcolony_bot::config::StrategyConfig;
use hexcolony_bot::engine::DecisionEngine;
use hexcolony_bot::hex::HexCoord;
use hexcolony_bot::render::write_turn_svg;
use hexcolony_bot::rng::Rng;
use hexcolony_bot::types::{Move, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

/// Replays saved arena snapshots through one engine and checks the moves.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Snapshot JSON files, replayed in the given order.
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Directory for one SVG map per replayed turn.
    #[arg(long)]
    render_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct TurnResultLine {
    turn: u64,
    #[serde(rename = "moveCount")]
    move_count: usize,
    legions: Vec<String>,
    moves: Vec<Move>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    turn: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    seed: u32,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "turnCount")]
    turn_count: usize,
    #[serde(rename = "totalMoves")]
    total_moves: usize,
    #[serde(rename = "averageMovesPerTurn")]
    average_moves_per_turn: f64,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "legionTurns")]
    legion_turns: BTreeMap<String, usize>,
    anomalies: Vec<String>,
}

struct ReplayOutcome {
    lines: Vec<TurnResultLine>,
    anomalies: Vec<String>,
    anomaly_records: Vec<AnomalyRecord>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether any anomaly was found.
fn run(cli: &Cli) -> Result<bool> {
    let config = match cli.config.as_ref() {
        Some(path) => StrategyConfig::load_from_path(path)
            .with_context(|| format!("loading strategy config {}", path.display()))?,
        None => StrategyConfig::default(),
    };
    let snapshots = cli
        .snapshots
        .iter()
        .map(|path| {
            Snapshot::load_from_path(path)
                .with_context(|| format!("loading snapshot {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let started_at_ms = now_ms();
    let seed = normalize_seed(cli.seed.unwrap_or(started_at_ms));
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, started_at_ms));
    tracing::info!(run_id = %run_id, seed, turns = snapshots.len(), "replay started");

    let mut engine = DecisionEngine::new(config, seed);
    let outcome = replay(&mut engine, &snapshots);

    for record in &outcome.anomaly_records {
        tracing::warn!(run_id = %run_id, turn = record.turn, message = %record.message, "anomaly detected");
    }
    for line in &outcome.lines {
        println!("{}", serde_json::to_string(line)?);
    }
    if let Some(dir) = cli.render_dir.as_ref() {
        for (snapshot, line) in snapshots.iter().zip(&outcome.lines) {
            write_turn_svg(dir, snapshot, &line.moves)
                .with_context(|| format!("rendering turn {} into {}", line.turn, dir.display()))?;
        }
        tracing::info!(dir = %dir.display(), turns = outcome.lines.len(), "maps rendered");
    }

    let summary = build_run_summary(
        run_id.clone(),
        seed,
        started_at_ms,
        now_ms(),
        &outcome,
    );
    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }
    tracing::info!(
        run_id = %run_id,
        turns = summary.turn_count,
        moves = summary.total_moves,
        anomalies = summary.anomaly_count,
        "replay finished"
    );

    Ok(!outcome.anomalies.is_empty())
}

fn replay(engine: &mut DecisionEngine<Rng>, snapshots: &[Snapshot]) -> ReplayOutcome {
    let mut lines = Vec::new();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for snapshot in snapshots {
        let moves = engine.decide(snapshot);
        let found = collect_move_anomalies(snapshot, &moves, engine.config());
        for message in &found {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.turn,
                message.clone(),
            );
        }
        lines.push(TurnResultLine {
            turn: snapshot.turn,
            move_count: moves.len(),
            legions: engine.legions().ids(),
            moves,
            anomalies: found,
        });
    }

    ReplayOutcome {
        lines,
        anomalies,
        anomaly_records,
    }
}

fn collect_move_anomalies(snapshot: &Snapshot, moves: &[Move], config: &StrategyConfig) -> Vec<String> {
    let mut anomalies = Vec::new();
    let mut destinations: HashMap<HexCoord, &str> = HashMap::new();

    for mv in moves {
        let Some(agent) = snapshot.agents.iter().find(|agent| agent.id == mv.agent_id) else {
            anomalies.push(format!("move for unknown agent {}", mv.agent_id));
            continue;
        };

        let speed = config.speed(agent.kind);
        if mv.path.len() > speed {
            anomalies.push(format!(
                "move for {} has {} steps, speed is {speed}",
                mv.agent_id,
                mv.path.len()
            ));
        }

        let mut previous = agent.pos();
        for &step in &mv.path {
            if previous.distance(step) != 1 {
                anomalies.push(format!(
                    "non-adjacent step for {}: {previous} -> {step}",
                    mv.agent_id
                ));
                break;
            }
            previous = step;
        }

        if let Some(destination) = mv.destination() {
            if let Some(other) = destinations.insert(destination, &mv.agent_id) {
                anomalies.push(format!(
                    "{other} and {} both end at {destination}",
                    mv.agent_id
                ));
            }
        }
    }
    anomalies
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    turn: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        turn,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("replay-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    seed: u32,
    started_at_ms: u64,
    finished_at_ms: u64,
    outcome: &ReplayOutcome,
) -> RunSummary {
    let turn_count = outcome.lines.len();
    let total_moves: usize = outcome.lines.iter().map(|line| line.move_count).sum();
    let average_moves_per_turn = if turn_count == 0 {
        0.0
    } else {
        total_moves as f64 / turn_count as f64
    };
    let mut legion_turns: BTreeMap<String, usize> = BTreeMap::new();
    for line in &outcome.lines {
        for id in &line.legions {
            *legion_turns.entry(id.clone()).or_insert(0) += 1;
        }
    }
    RunSummary {
        run_id,
        seed,
        started_at_ms,
        finished_at_ms,
        turn_count,
        total_moves,
        average_moves_per_turn,
        anomaly_count: outcome.anomaly_records.len(),
        legion_turns,
        anomalies: outcome.anomalies.clone(),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

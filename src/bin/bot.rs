use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hexcolony_bot::client::ArenaClient;
use hexcolony_bot::config::StrategyConfig;
use hexcolony_bot::constants::{
    ARENA_RETRY_SECS, DEFAULT_NEXT_TURN_SECS, MIN_DECISION_BUDGET_MS, REGISTER_RETRY_SECS,
    TURN_SLEEP_MARGIN_SECS,
};
use hexcolony_bot::engine::DecisionEngine;
use hexcolony_bot::legion::LegionLedger;
use hexcolony_bot::render::write_turn_svg;
use hexcolony_bot::rng::Rng;
use hexcolony_bot::turn_log::TurnLogWriter;
use hexcolony_bot::types::{Move, Snapshot};
use tokio::sync::Mutex;

type SharedEngine = Arc<Mutex<DecisionEngine<Rng>>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Registers for an arena round and plays it to the end")]
struct Cli {
    #[arg(long, env = "ARENA_BASE_URL", default_value = "https://games-test.datsteam.dev")]
    base_url: String,
    #[arg(long, env = "ARENA_TOKEN", hide_env_values = true)]
    token: String,
    /// JSON file with strategy overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value = ".data/legions.json")]
    ledger: PathBuf,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
    /// Directory for one SVG map per turn; nothing is drawn without it.
    #[arg(long)]
    render_dir: Option<PathBuf>,
    /// Time kept free before the turn deadline.
    #[arg(long, default_value_t = 300)]
    deadline_margin_ms: u64,
    #[arg(long, default_value_t = REGISTER_RETRY_SECS)]
    register_interval_secs: u64,
    #[arg(long, default_value_t = 2)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_ref() {
        Some(path) => StrategyConfig::load_from_path(path)
            .with_context(|| format!("loading strategy config {}", path.display()))?,
        None => StrategyConfig::default(),
    };
    let rng = cli.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
    tracing::info!(seed = rng.seed(), base_url = %cli.base_url, "starting bot");

    let engine = DecisionEngine::with_rng(config, rng).with_legions(load_ledger(&cli.ledger));
    let engine: SharedEngine = Arc::new(Mutex::new(engine));

    let client = ArenaClient::new(cli.base_url.clone(), cli.token.clone())
        .context("building arena client")?
        .with_retries(cli.retries, Duration::from_millis(500));

    let wait = register_until_open(&client, Duration::from_secs(cli.register_interval_secs)).await;
    tracing::info!(wait_secs = wait, "waiting for the round to start");
    sleep_secs(wait + TURN_SLEEP_MARGIN_SECS).await;

    play_round(&cli, &client, engine).await
}

fn load_ledger(path: &Path) -> LegionLedger {
    match LegionLedger::load(path) {
        Ok(ledger) => {
            if !ledger.is_empty() {
                tracing::info!(legions = ledger.len(), path = %path.display(), "restored legions");
            }
            ledger
        }
        Err(error) => {
            tracing::warn!(%error, path = %path.display(), "ignoring saved legions");
            LegionLedger::new()
        }
    }
}

async fn register_until_open(client: &ArenaClient, interval: Duration) -> f64 {
    let mut attempt = 1u32;
    loop {
        match client.register().await {
            Ok(Some(wait)) => return wait,
            Ok(None) => tracing::info!(attempt, "registration is not open"),
            Err(error) => tracing::warn!(attempt, %error, "registration failed"),
        }
        attempt += 1;
        tokio::time::sleep(interval).await;
    }
}

async fn play_round(cli: &Cli, client: &ArenaClient, engine: SharedEngine) -> Result<()> {
    let (mut turn_log, log_path) = TurnLogWriter::create_in(&cli.log_dir)
        .with_context(|| format!("creating log file in {}", cli.log_dir.display()))?;
    tracing::info!(path = %log_path.display(), "writing server logs");

    loop {
        let snapshot = match client.arena().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(%error, "could not fetch arena");
                tokio::time::sleep(Duration::from_secs(ARENA_RETRY_SECS)).await;
                continue;
            }
        };

        match client.logs().await {
            Ok(entries) => {
                if let Err(error) = turn_log.append(&entries) {
                    tracing::warn!(%error, "could not write server logs");
                }
            }
            Err(error) => tracing::warn!(%error, "could not fetch server logs"),
        }

        if snapshot.is_round_over() {
            turn_log.mark_round_end().context("writing round end marker")?;
            tracing::info!("round finished");
            return Ok(());
        }

        let next_turn_in = snapshot.next_turn_in.unwrap_or(DEFAULT_NEXT_TURN_SECS);
        tracing::info!(
            turn = snapshot.turn,
            score = snapshot.score.unwrap_or(0),
            ants = snapshot.agents.len(),
            next_turn_in,
            "turn started"
        );

        let margin = Duration::from_millis(cli.deadline_margin_ms);
        let (budget, squeezed) = decision_budget(next_turn_in, margin);
        if squeezed {
            tracing::warn!(
                turn = snapshot.turn,
                next_turn_in,
                ?margin,
                ?budget,
                "turn deadline is inside the safety margin; using the minimum budget"
            );
        }
        match decide_within(engine.clone(), snapshot.clone(), budget).await {
            Some(moves) => {
                if let Err(error) = client.send_moves(&moves).await {
                    tracing::warn!(%error, "could not submit moves");
                } else {
                    tracing::info!(turn = snapshot.turn, moves = moves.len(), "moves submitted");
                }
                if let Some(dir) = cli.render_dir.as_ref() {
                    if let Err(error) = write_turn_svg(dir, &snapshot, &moves) {
                        tracing::warn!(%error, dir = %dir.display(), "could not render map");
                    }
                }
            }
            None => tracing::warn!(turn = snapshot.turn, ?budget, "decision pass missed the deadline"),
        }

        let ledger = engine.lock().await.legions().clone();
        if let Err(error) = ledger.save(&cli.ledger) {
            tracing::warn!(%error, path = %cli.ledger.display(), "could not save legions");
        }

        sleep_secs(next_turn_in - TURN_SLEEP_MARGIN_SECS).await;
    }
}

/// Time the decision pass gets this turn: `next_turn_in` minus `margin`,
/// floored at the minimum budget. The flag is set when the floor kicked in.
fn decision_budget(next_turn_in: f64, margin: Duration) -> (Duration, bool) {
    let secs = if next_turn_in.is_finite() {
        next_turn_in.max(0.0)
    } else {
        DEFAULT_NEXT_TURN_SECS
    };
    let budget = Duration::from_secs_f64(secs).saturating_sub(margin);
    let floor = Duration::from_millis(MIN_DECISION_BUDGET_MS);
    if budget < floor {
        (floor, true)
    } else {
        (budget, false)
    }
}

/// Runs the decision pass on a blocking worker. `None` when it overruns
/// `budget` or the worker dies; a late pass still finishes in the background
/// and keeps the engine locked until it does.
async fn decide_within(engine: SharedEngine, snapshot: Snapshot, budget: Duration) -> Option<Vec<Move>> {
    let task = tokio::task::spawn_blocking(move || engine.blocking_lock().decide(&snapshot));
    match tokio::time::timeout(budget, task).await {
        Ok(Ok(moves)) => Some(moves),
        Ok(Err(error)) => {
            tracing::error!(%error, "decision worker failed");
            None
        }
        Err(_) => None,
    }
}

async fn sleep_secs(secs: f64) {
    if secs > 0.0 && secs.is_finite() {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

use std::collections::HashSet;

use crate::config::StrategyConfig;
use crate::error::DecisionError;
use crate::hex::HexCoord;
use crate::legion::LegionLedger;
use crate::moves::format_move;
use crate::occupancy::OccupancyLedger;
use crate::pathfinding::Pathfinder;
use crate::rng::{RandomSource, Rng};
use crate::types::{Agent, Move, Snapshot};
use crate::world::WorldView;

mod instinct_system;
mod legion_system;
mod utils;

pub use self::utils::{exploration_sector, stable_hash};

/// What produced an agent's path; only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Instinct {
    EvacuateSpawn,
    AvoidCrowding,
    Resupply,
    Engage,
    Forage,
    Explore,
    LegionLead,
    LegionEscort,
    LegionForage,
}

/// Per-pass scratch state. Built from one snapshot and dropped when the pass
/// returns.
struct TickContext<'a> {
    world: WorldView<'a>,
    ledger: OccupancyLedger,
    /// Snapshot agents with duplicate ids removed, in snapshot order.
    agents: Vec<&'a Agent>,
    moves: Vec<Move>,
    handled: HashSet<String>,
    hazard_penalty: u32,
}

impl<'a> TickContext<'a> {
    fn new(snapshot: &'a Snapshot, hazard_penalty: u32) -> Self {
        let world = WorldView::new(snapshot);
        let ledger = OccupancyLedger::seeded_with_enemies(world.enemy_positions());

        let mut seen = HashSet::new();
        let mut agents = Vec::with_capacity(snapshot.agents.len());
        for agent in &snapshot.agents {
            if seen.insert(agent.id.as_str()) {
                agents.push(agent);
            } else {
                let error = DecisionError::DuplicateAgent(agent.id.clone());
                tracing::warn!(turn = snapshot.turn, %error, "skipping agent");
            }
        }

        Self {
            world,
            ledger,
            agents,
            moves: Vec::new(),
            handled: HashSet::new(),
            hazard_penalty,
        }
    }

    fn route(&self, from: HexCoord, to: HexCoord) -> Option<Vec<HexCoord>> {
        Pathfinder::new(&self.world.tiles, self.hazard_penalty).find_path(from, to, &self.ledger)
    }

    fn present_ids(&self) -> HashSet<&'a str> {
        self.agents.iter().map(|agent| agent.id.as_str()).collect()
    }

    fn is_open(&self, cell: HexCoord) -> bool {
        self.world.is_walkable(cell) && !self.ledger.is_claimed(cell)
    }

    /// Formats and records `path` for `agent`. Returns whether a move was
    /// emitted; the agent counts as handled either way.
    fn commit(&mut self, agent: &Agent, path: &[HexCoord], speed: usize, instinct: Instinct) -> bool {
        self.handled.insert(agent.id.clone());
        match format_move(agent, path, speed, &mut self.ledger) {
            Ok(Some(mv)) => {
                tracing::debug!(
                    turn = self.world.turn(),
                    agent = %agent.id,
                    ?instinct,
                    steps = mv.path.len(),
                    "planned move"
                );
                self.moves.push(mv);
                true
            }
            Ok(None) => {
                tracing::debug!(turn = self.world.turn(), agent = %agent.id, ?instinct, "holding position");
                false
            }
            Err(error) => {
                tracing::warn!(turn = self.world.turn(), %error, "skipping agent");
                false
            }
        }
    }

    fn hold(&mut self, agent: &Agent) {
        self.handled.insert(agent.id.clone());
    }
}

/// Turns snapshots into move lists. The legion ledger is the only state kept
/// from one call to the next.
#[derive(Clone, Debug)]
pub struct DecisionEngine<R: RandomSource = Rng> {
    config: StrategyConfig,
    legions: LegionLedger,
    rng: R,
}

impl DecisionEngine<Rng> {
    pub fn new(config: StrategyConfig, seed: u32) -> Self {
        Self::with_rng(config, Rng::new(seed))
    }
}

impl<R: RandomSource> DecisionEngine<R> {
    pub fn with_rng(config: StrategyConfig, rng: R) -> Self {
        Self {
            config,
            legions: LegionLedger::new(),
            rng,
        }
    }

    pub fn with_legions(mut self, legions: LegionLedger) -> Self {
        self.legions = legions;
        self
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn legions(&self) -> &LegionLedger {
        &self.legions
    }

    pub fn into_legions(self) -> LegionLedger {
        self.legions
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Runs one full decision pass. Legion bookkeeping and legion moves come
    /// first; every other agent then goes through the instinct cascade,
    /// nearest to the colony center first.
    pub fn decide(&mut self, snapshot: &Snapshot) -> Vec<Move> {
        let mut ctx = TickContext::new(snapshot, self.config.hazard_penalty);

        self.update_legions(&ctx);
        self.plan_new_mission(&ctx);
        self.execute_legions(&mut ctx);

        let center = ctx.world.center;
        let mut queue: Vec<&Agent> = ctx
            .agents
            .iter()
            .copied()
            .filter(|agent| !ctx.handled.contains(&agent.id))
            .collect();
        queue.sort_by(|a, b| {
            a.pos()
                .distance(center)
                .cmp(&b.pos().distance(center))
                .then_with(|| a.id.cmp(&b.id))
        });
        for agent in queue {
            self.run_instincts(&mut ctx, agent);
        }

        tracing::debug!(
            turn = snapshot.turn,
            moves = ctx.moves.len(),
            legions = self.legions.len(),
            "decision pass finished"
        );
        ctx.moves
    }
}

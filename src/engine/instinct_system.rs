use super::utils::{enemy_score, exploration_sector, food_score, sector_angle};
use super::*;
use crate::hex::HEX_DIRECTIONS;

#[derive(Clone, Copy)]
enum ScoredTarget {
    Enemy(HexCoord),
    Food(HexCoord),
}

impl<R: RandomSource> DecisionEngine<R> {
    pub(super) fn run_instincts(&mut self, ctx: &mut TickContext<'_>, agent: &Agent) {
        let speed = self.config.speed(agent.kind);

        if let Some(path) = self.evacuate_spawn(ctx, agent) {
            ctx.commit(agent, &path, speed, Instinct::EvacuateSpawn);
            return;
        }

        if let Some(path) = self.avoid_crowding(ctx, agent) {
            ctx.commit(agent, &path, speed, Instinct::AvoidCrowding);
            return;
        }

        if let Some(path) = self.resupply(ctx, agent) {
            ctx.commit(agent, &path, speed, Instinct::Resupply);
            return;
        }

        if let Some((path, instinct)) = self.engage_or_forage(ctx, agent) {
            ctx.commit(agent, &path, speed, instinct);
            return;
        }

        match self.explore(ctx, agent) {
            Some(path) => {
                ctx.commit(agent, &path, speed, Instinct::Explore);
            }
            None => ctx.hold(agent),
        }
    }

    fn evacuate_spawn(&self, ctx: &TickContext<'_>, agent: &Agent) -> Option<Vec<HexCoord>> {
        let spawn = ctx.world.spawn?;
        if agent.pos() != spawn {
            return None;
        }
        let free: Vec<HexCoord> = ctx
            .world
            .home
            .iter()
            .copied()
            .filter(|cell| *cell != spawn && ctx.is_open(*cell))
            .collect();
        if let Some(&cell) = free.iter().find(|cell| cell.distance(spawn) == 1) {
            return Some(vec![spawn, cell]);
        }
        // No free home cell next to the spawn: walk to the first reachable one.
        free.into_iter().find_map(|cell| ctx.route(spawn, cell))
    }

    fn avoid_crowding(&mut self, ctx: &TickContext<'_>, agent: &Agent) -> Option<Vec<HexCoord>> {
        let near = ctx
            .world
            .count_agents_near(&ctx.agents, agent, self.config.crowd_radius);
        if near < self.config.crowd_limit {
            return None;
        }

        let origin = agent.pos();
        for _ in 0..self.config.crowd_trials {
            let dir = HEX_DIRECTIONS[self.rng.pick_index(HEX_DIRECTIONS.len())];
            let jump = self
                .rng
                .int(self.config.crowd_jump_min, self.config.crowd_jump_max);
            let target = origin.offset(dir, jump);
            if !ctx.world.is_visible(target) || ctx.ledger.is_claimed(target) {
                continue;
            }
            if let Some(path) = ctx.route(origin, target) {
                return Some(path);
            }
        }
        None
    }

    fn resupply(&self, ctx: &TickContext<'_>, agent: &Agent) -> Option<Vec<HexCoord>> {
        if !agent.is_carrying() {
            return None;
        }
        ctx.route(agent.pos(), ctx.world.center)
    }

    fn engage_or_forage(
        &self,
        ctx: &TickContext<'_>,
        agent: &Agent,
    ) -> Option<(Vec<HexCoord>, Instinct)> {
        let mut best: Option<(f32, ScoredTarget)> = None;
        let mut consider = |score: f32, target: ScoredTarget| {
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, target));
            }
        };
        for enemy in &ctx.world.snapshot.enemies {
            consider(
                enemy_score(&self.config, agent, enemy),
                ScoredTarget::Enemy(enemy.pos()),
            );
        }
        for food in &ctx.world.snapshot.food {
            consider(
                food_score(&self.config, agent, food),
                ScoredTarget::Food(food.pos()),
            );
        }

        match best?.1 {
            ScoredTarget::Enemy(cell) => {
                let mut path = ctx.route(agent.pos(), cell)?;
                if path.len() > 1 {
                    path.pop();
                }
                Some((path, Instinct::Engage))
            }
            ScoredTarget::Food(cell) => {
                let path = ctx.route(agent.pos(), cell)?;
                Some((path, Instinct::Forage))
            }
        }
    }

    /// Heads out along the agent's sector. When the far point is out of
    /// reach, settles for the farthest open cell on the same ray.
    fn explore(&self, ctx: &TickContext<'_>, agent: &Agent) -> Option<Vec<HexCoord>> {
        let sectors = self.config.exploration_sectors;
        let angle = sector_angle(exploration_sector(&agent.id, sectors), sectors);
        let center = ctx.world.center;
        let origin = agent.pos();

        let goal = center.toward_angle(angle, f64::from(self.config.exploration_distance));
        if let Some(path) = ctx.route(origin, goal) {
            return Some(path);
        }

        let mut previous = goal;
        for distance in (1..self.config.exploration_distance).rev() {
            let cell = center.toward_angle(angle, f64::from(distance));
            if cell == previous {
                continue;
            }
            previous = cell;
            if cell == origin || !ctx.is_open(cell) {
                continue;
            }
            if let Some(path) = ctx.route(origin, cell) {
                return Some(path);
            }
        }
        None
    }
}

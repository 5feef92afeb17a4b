use super::*;
use crate::legion::{find_clusters, recruit, Legion, Mission};
use crate::types::UnitKind;

impl<R: RandomSource> DecisionEngine<R> {
    pub(super) fn update_legions(&mut self, ctx: &TickContext<'_>) {
        let present = ctx.present_ids();
        let enemies: Vec<HexCoord> = ctx.world.enemy_positions().collect();
        let disbanded = self
            .legions
            .prune(&present, &enemies, self.config.dispersal_radius);
        for id in disbanded {
            tracing::info!(turn = ctx.world.turn(), legion = %id, "legion disbanded");
        }
    }

    pub(super) fn plan_new_mission(&mut self, ctx: &TickContext<'_>) {
        let unassigned: Vec<&Agent> = ctx
            .agents
            .iter()
            .copied()
            .filter(|agent| !self.legions.contains_agent(&agent.id))
            .collect();
        let center = ctx.world.center;
        let at_home = unassigned
            .iter()
            .filter(|agent| agent.pos().within(center, self.config.home_radius))
            .count();
        if at_home <= self.config.min_home_defenders {
            return;
        }

        let Some((mission, target)) = self.choose_mission(ctx) else {
            return;
        };
        let crew = recruit(
            &unassigned,
            target,
            self.config.fighter_quota,
            self.config.scout_quota,
        );
        if crew.len() < self.config.min_legion_size {
            tracing::debug!(
                turn = ctx.world.turn(),
                mission = mission.key(),
                recruits = crew.len(),
                "not enough recruits for a legion"
            );
            return;
        }

        let legion = Legion::new(mission, target, ctx.world.turn(), crew);
        let id = legion.id.clone();
        if self.legions.insert(legion) {
            tracing::info!(turn = ctx.world.turn(), legion = %id, %target, "legion formed");
        }
    }

    /// Attack the largest enemy cluster no legion is already after, otherwise
    /// expand toward food beyond the home radius that no expand legion
    /// harvests yet.
    fn choose_mission(&self, ctx: &TickContext<'_>) -> Option<(Mission, HexCoord)> {
        let radius = self.config.cluster_radius;
        let enemies: Vec<HexCoord> = ctx.world.enemy_positions().collect();
        let attacked = self.held_targets(Mission::AttackEnemyGroup);
        let fresh_enemy_cluster = find_clusters(&enemies, radius)
            .into_iter()
            .map(|cluster| enemies[cluster[0]])
            .find(|anchor| {
                !attacked
                    .iter()
                    .any(|target| anchor.distance(*target) < self.config.dispersal_radius)
            });
        if let Some(anchor) = fresh_enemy_cluster {
            return Some((Mission::AttackEnemyGroup, anchor));
        }

        let center = ctx.world.center;
        let harvested = self.held_targets(Mission::ExpandAndHarvest);
        let far_food: Vec<HexCoord> = ctx
            .world
            .snapshot
            .food
            .iter()
            .map(|food| food.pos())
            .filter(|cell| cell.distance(center) > self.config.home_radius)
            .filter(|cell| {
                !harvested
                    .iter()
                    .any(|target| cell.within(*target, self.config.harvest_radius))
            })
            .collect();
        if let Some(cluster) = find_clusters(&far_food, radius).first() {
            return Some((Mission::ExpandAndHarvest, far_food[cluster[0]]));
        }

        let mut farthest: Option<HexCoord> = None;
        for cell in &far_food {
            if farthest.map_or(true, |best| cell.distance(center) > best.distance(center)) {
                farthest = Some(*cell);
            }
        }
        farthest.map(|cell| (Mission::ExpandAndHarvest, cell))
    }

    fn held_targets(&self, mission: Mission) -> Vec<HexCoord> {
        self.legions
            .iter()
            .filter(|legion| legion.mission == mission)
            .map(|legion| legion.target)
            .collect()
    }

    pub(super) fn execute_legions(&self, ctx: &mut TickContext<'_>) {
        for legion in self.legions.iter() {
            let members: Vec<&Agent> = ctx
                .agents
                .iter()
                .copied()
                .filter(|agent| legion.has_member(&agent.id))
                .collect();
            let Some((&leader, escorts)) = members.split_first() else {
                continue;
            };

            let leader_moved = match ctx.route(leader.pos(), legion.target) {
                Some(mut path) => {
                    if ctx.world.has_enemy_at(legion.target) && path.len() > 1 {
                        path.pop();
                    }
                    let speed = self.config.speed(leader.kind);
                    ctx.commit(leader, &path, speed, Instinct::LegionLead)
                }
                None => {
                    ctx.hold(leader);
                    false
                }
            };

            for &member in escorts {
                let speed = self.config.speed(member.kind);
                if legion.mission == Mission::ExpandAndHarvest && member.kind != UnitKind::Fighter {
                    match self.forage_near(ctx, member, leader.pos()) {
                        Some(path) => {
                            ctx.commit(member, &path, speed, Instinct::LegionForage);
                        }
                        None => ctx.hold(member),
                    }
                    continue;
                }

                match ctx.route(member.pos(), leader.pos()) {
                    Some(mut path) => {
                        // The leader still stands on its cell.
                        if !leader_moved && path.len() > 1 {
                            path.pop();
                        }
                        ctx.commit(member, &path, speed, Instinct::LegionEscort);
                    }
                    None => ctx.hold(member),
                }
            }
        }
    }

    /// Carriers return home; others go for the food nearest to them among
    /// the food within the harvest radius of `anchor`.
    fn forage_near(
        &self,
        ctx: &TickContext<'_>,
        agent: &Agent,
        anchor: HexCoord,
    ) -> Option<Vec<HexCoord>> {
        let origin = agent.pos();
        if agent.is_carrying() {
            return ctx.route(origin, ctx.world.center);
        }

        let mut nearest: Option<HexCoord> = None;
        for food in &ctx.world.snapshot.food {
            let cell = food.pos();
            if !cell.within(anchor, self.config.harvest_radius) {
                continue;
            }
            if nearest.map_or(true, |best| cell.distance(origin) < best.distance(origin)) {
                nearest = Some(cell);
            }
        }
        ctx.route(origin, nearest?)
    }
}

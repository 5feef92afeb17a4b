use std::f64::consts::TAU;

use crate::config::StrategyConfig;
use crate::hex::HexCoord;
use crate::types::{Agent, Enemy, FoodResource, UnitKind};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a. Stable across runs and platforms, unlike `DefaultHasher`.
pub fn stable_hash(text: &str) -> u32 {
    text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

pub fn exploration_sector(agent_id: &str, sectors: u32) -> u32 {
    stable_hash(agent_id) % sectors.max(1)
}

pub(super) fn sector_angle(sector: u32, sectors: u32) -> f64 {
    f64::from(sector) * TAU / f64::from(sectors.max(1))
}

fn score_distance(config: &StrategyConfig, from: HexCoord, to: HexCoord) -> f32 {
    (from.distance(to) as f32).max(config.min_score_distance)
}

pub(super) fn enemy_score(config: &StrategyConfig, agent: &Agent, enemy: &Enemy) -> f32 {
    let base = if enemy.is_carrying() {
        config.enemy_value_carrying
    } else if enemy.kind == UnitKind::Scout {
        config.enemy_value_scout
    } else {
        config.enemy_value_base
    };
    base / score_distance(config, agent.pos(), enemy.pos()) * config.combat_weights.get(agent.kind)
}

pub(super) fn food_score(config: &StrategyConfig, agent: &Agent, food: &FoodResource) -> f32 {
    let value = food.amount as f32 * config.food_amount_weight;
    value / score_distance(config, agent.pos(), food.pos()) * config.forage_weights.get(agent.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CarriedResource;

    fn agent(kind: UnitKind) -> Agent {
        Agent {
            id: "a".to_string(),
            kind,
            q: 0,
            r: 0,
            health: 100,
            food: None,
            last_move: None,
            planned_move: None,
        }
    }

    fn enemy(kind: UnitKind, q: i32, carrying: bool) -> Enemy {
        Enemy {
            kind,
            q,
            r: 0,
            health: 100,
            food: carrying.then(|| CarriedResource { kind: 1, amount: 3 }),
            attack: None,
        }
    }

    #[test]
    fn stable_hash_matches_fnv1a_vectors() {
        assert_eq!(stable_hash(""), 0x811c_9dc5);
        assert_eq!(stable_hash("a"), 0xe40c_292c);
        assert_eq!(stable_hash("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn sector_is_stable_and_in_range() {
        for id in ["ant-1", "ant-2", "6f1c", ""] {
            let sector = exploration_sector(id, 12);
            assert!(sector < 12);
            assert_eq!(sector, exploration_sector(id, 12));
        }
        assert_eq!(exploration_sector("anything", 0), 0);
    }

    #[test]
    fn carrying_enemies_outrank_scouts_and_scouts_outrank_others() {
        let config = StrategyConfig::default();
        let fighter = agent(UnitKind::Fighter);
        let carrying = enemy_score(&config, &fighter, &enemy(UnitKind::Worker, 2, true));
        let scout = enemy_score(&config, &fighter, &enemy(UnitKind::Scout, 2, false));
        let plain = enemy_score(&config, &fighter, &enemy(UnitKind::Fighter, 2, false));
        assert!(carrying > scout && scout > plain);
        assert_eq!(plain, 50.0 / 2.0 * 1.5);
    }

    #[test]
    fn zero_distance_uses_minimum_score_distance() {
        let config = StrategyConfig::default();
        let food = FoodResource {
            q: 0,
            r: 0,
            kind: 1,
            amount: 2,
        };
        assert_eq!(food_score(&config, &agent(UnitKind::Worker), &food), 40.0 / 0.5 * 1.5);
    }

    #[test]
    fn workers_value_food_more_than_fighters() {
        let config = StrategyConfig::default();
        let food = FoodResource {
            q: 3,
            r: 0,
            kind: 1,
            amount: 10,
        };
        let worker = food_score(&config, &agent(UnitKind::Worker), &food);
        let fighter = food_score(&config, &agent(UnitKind::Fighter), &food);
        assert!(worker > fighter);
    }
}

use crate::types::UnitKind;

pub const WORKER_SPEED: usize = 5;
pub const FIGHTER_SPEED: usize = 4;
pub const SCOUT_SPEED: usize = 7;

pub const DEFAULT_MOVE_COST: u32 = 1;
pub const HAZARD_PENALTY: u32 = 15;

pub const HOME_ZONE_RADIUS: i32 = 12;
pub const MIN_HOME_DEFENDERS: usize = 1;

pub const CROWDED_RADIUS: i32 = 1;
pub const CROWDED_LIMIT: usize = 3;
pub const CROWD_TRIALS: usize = 10;
pub const CROWD_JUMP_MIN: i32 = 2;
pub const CROWD_JUMP_MAX: i32 = 3;

pub const CLUSTER_RADIUS: i32 = 7;
pub const DISPERSAL_RADIUS: i32 = 5;
pub const HARVEST_RADIUS: i32 = 6;
pub const MIN_LEGION_SIZE: usize = 2;
pub const LEGION_FIGHTER_QUOTA: usize = 1;
pub const LEGION_SCOUT_QUOTA: usize = 1;

pub const EXPLORATION_DISTANCE: i32 = 10;
pub const EXPLORATION_SECTORS: u32 = 12;

pub const ENEMY_VALUE_CARRYING: f32 = 120.0;
pub const ENEMY_VALUE_SCOUT: f32 = 80.0;
pub const ENEMY_VALUE_BASE: f32 = 50.0;
pub const FOOD_AMOUNT_WEIGHT: f32 = 20.0;
pub const MIN_SCORE_DISTANCE: f32 = 0.5;

pub const REGISTER_RETRY_SECS: u64 = 60;
pub const ARENA_RETRY_SECS: u64 = 2;
pub const TURN_SLEEP_MARGIN_SECS: f64 = 0.2;
pub const DEFAULT_NEXT_TURN_SECS: f64 = 2.0;
pub const DEFAULT_ROUND_WAIT_SECS: f64 = 5.0;
pub const MIN_DECISION_BUDGET_MS: u64 = 50;

pub fn get_default_speed(kind: UnitKind) -> usize {
    match kind {
        UnitKind::Worker => WORKER_SPEED,
        UnitKind::Fighter => FIGHTER_SPEED,
        UnitKind::Scout => SCOUT_SPEED,
    }
}

/// Weight applied to enemy scores: fighters hunt, workers mostly do not.
pub fn get_combat_weight(kind: UnitKind) -> f32 {
    match kind {
        UnitKind::Worker => 0.5,
        UnitKind::Fighter => 1.5,
        UnitKind::Scout => 1.0,
    }
}

pub fn get_forage_weight(kind: UnitKind) -> f32 {
    match kind {
        UnitKind::Worker => 1.5,
        UnitKind::Fighter => 0.5,
        UnitKind::Scout => 1.0,
    }
}

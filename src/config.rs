use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    get_combat_weight, get_default_speed, get_forage_weight, CLUSTER_RADIUS, CROWDED_LIMIT,
    CROWDED_RADIUS, CROWD_JUMP_MAX, CROWD_JUMP_MIN, CROWD_TRIALS, DISPERSAL_RADIUS,
    ENEMY_VALUE_BASE, ENEMY_VALUE_CARRYING, ENEMY_VALUE_SCOUT, EXPLORATION_DISTANCE,
    EXPLORATION_SECTORS, FOOD_AMOUNT_WEIGHT, HARVEST_RADIUS, HAZARD_PENALTY, HOME_ZONE_RADIUS,
    LEGION_FIGHTER_QUOTA, LEGION_SCOUT_QUOTA, MIN_HOME_DEFENDERS, MIN_LEGION_SIZE,
    MIN_SCORE_DISTANCE,
};
use crate::error::ConfigError;
use crate::types::UnitKind;

/// Per-unit-kind value. Overrides in a config file must name all three kinds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindTable<T> {
    pub worker: T,
    pub fighter: T,
    pub scout: T,
}

impl<T: Copy> KindTable<T> {
    pub fn from_fn(f: impl Fn(UnitKind) -> T) -> Self {
        Self {
            worker: f(UnitKind::Worker),
            fighter: f(UnitKind::Fighter),
            scout: f(UnitKind::Scout),
        }
    }

    pub fn get(&self, kind: UnitKind) -> T {
        match kind {
            UnitKind::Worker => self.worker,
            UnitKind::Fighter => self.fighter,
            UnitKind::Scout => self.scout,
        }
    }

    fn values(&self) -> [T; 3] {
        [self.worker, self.fighter, self.scout]
    }
}

/// Every tunable of the decision pass. Missing fields in a config file keep
/// their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyConfig {
    /// Steps per turn by unit kind.
    pub speeds: KindTable<usize>,
    /// Extra cost for entering an acid tile.
    pub hazard_penalty: u32,
    pub home_radius: i32,
    /// Unassigned agents near home that must stay behind before a legion forms.
    pub min_home_defenders: usize,
    pub crowd_radius: i32,
    pub crowd_limit: usize,
    pub crowd_trials: usize,
    pub crowd_jump_min: i32,
    pub crowd_jump_max: i32,
    pub cluster_radius: i32,
    pub dispersal_radius: i32,
    pub harvest_radius: i32,
    pub min_legion_size: usize,
    pub fighter_quota: usize,
    pub scout_quota: usize,
    pub exploration_distance: i32,
    pub exploration_sectors: u32,
    pub enemy_value_carrying: f32,
    pub enemy_value_scout: f32,
    pub enemy_value_base: f32,
    pub food_amount_weight: f32,
    pub min_score_distance: f32,
    pub combat_weights: KindTable<f32>,
    pub forage_weights: KindTable<f32>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            speeds: KindTable::from_fn(get_default_speed),
            hazard_penalty: HAZARD_PENALTY,
            home_radius: HOME_ZONE_RADIUS,
            min_home_defenders: MIN_HOME_DEFENDERS,
            crowd_radius: CROWDED_RADIUS,
            crowd_limit: CROWDED_LIMIT,
            crowd_trials: CROWD_TRIALS,
            crowd_jump_min: CROWD_JUMP_MIN,
            crowd_jump_max: CROWD_JUMP_MAX,
            cluster_radius: CLUSTER_RADIUS,
            dispersal_radius: DISPERSAL_RADIUS,
            harvest_radius: HARVEST_RADIUS,
            min_legion_size: MIN_LEGION_SIZE,
            fighter_quota: LEGION_FIGHTER_QUOTA,
            scout_quota: LEGION_SCOUT_QUOTA,
            exploration_distance: EXPLORATION_DISTANCE,
            exploration_sectors: EXPLORATION_SECTORS,
            enemy_value_carrying: ENEMY_VALUE_CARRYING,
            enemy_value_scout: ENEMY_VALUE_SCOUT,
            enemy_value_base: ENEMY_VALUE_BASE,
            food_amount_weight: FOOD_AMOUNT_WEIGHT,
            min_score_distance: MIN_SCORE_DISTANCE,
            combat_weights: KindTable::from_fn(get_combat_weight),
            forage_weights: KindTable::from_fn(get_forage_weight),
        }
    }
}

impl StrategyConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn speed(&self, kind: UnitKind) -> usize {
        self.speeds.get(kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speeds.values().contains(&0) {
            return Err(ConfigError::Invalid(
                "every unit kind needs a speed of at least one step".into(),
            ));
        }
        if self.crowd_jump_min < 1 || self.crowd_jump_min > self.crowd_jump_max {
            return Err(ConfigError::Invalid(format!(
                "crowd jump range {}..={} is empty or non-positive",
                self.crowd_jump_min, self.crowd_jump_max
            )));
        }
        if self.exploration_sectors == 0 {
            return Err(ConfigError::Invalid(
                "exploration needs at least one sector".into(),
            ));
        }
        if self.exploration_distance < 1 {
            return Err(ConfigError::Invalid(
                "exploration distance must be positive".into(),
            ));
        }
        let radii = [
            ("homeRadius", self.home_radius),
            ("crowdRadius", self.crowd_radius),
            ("clusterRadius", self.cluster_radius),
            ("dispersalRadius", self.dispersal_radius),
            ("harvestRadius", self.harvest_radius),
        ];
        for (name, value) in radii {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative")));
            }
        }
        let weights = self
            .combat_weights
            .values()
            .into_iter()
            .chain(self.forage_weights.values())
            .chain([
                self.enemy_value_carrying,
                self.enemy_value_scout,
                self.enemy_value_base,
                self.food_amount_weight,
                self.min_score_distance,
            ]);
        for weight in weights {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "scoring weights must be positive, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_match_unit_speeds() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speed(UnitKind::Worker), 5);
        assert_eq!(config.speed(UnitKind::Fighter), 4);
        assert_eq!(config.speed(UnitKind::Scout), 7);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = StrategyConfig::from_json(r#"{"hazardPenalty": 40, "crowdLimit": 5}"#)
            .expect("valid config");
        assert_eq!(config.hazard_penalty, 40);
        assert_eq!(config.crowd_limit, 5);
        assert_eq!(config.home_radius, HOME_ZONE_RADIUS);
    }

    #[test]
    fn kind_table_override_replaces_all_speeds() {
        let config =
            StrategyConfig::from_json(r#"{"speeds": {"worker": 2, "fighter": 3, "scout": 9}}"#)
                .expect("valid config");
        assert_eq!(config.speed(UnitKind::Scout), 9);
    }

    #[test]
    fn inverted_jump_range_is_rejected() {
        let result = StrategyConfig::from_json(r#"{"crowdJumpMin": 4, "crowdJumpMax": 2}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_speed_and_zero_weight_are_rejected() {
        let mut config = StrategyConfig::default();
        config.speeds.scout = 0;
        assert!(config.validate().is_err());

        let mut config = StrategyConfig::default();
        config.forage_weights.worker = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loading_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = StrategyConfig::load_from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

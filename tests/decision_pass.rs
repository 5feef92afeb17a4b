use hexcolony_bot::config::StrategyConfig;
use hexcolony_bot::engine::DecisionEngine;
use hexcolony_bot::hex::HexCoord;
use hexcolony_bot::legion::{LegionLedger, Mission};
use hexcolony_bot::rng::SequenceRng;
use hexcolony_bot::types::{Move, MoveBatch, Snapshot};
use serde_json::{json, Value};

fn disc_map(radius: i32, overrides: &[(i32, i32, u8)]) -> Vec<Value> {
    let mut tiles = Vec::new();
    for q in -radius..=radius {
        for r in -radius..=radius {
            if HexCoord::new(q, r).distance(HexCoord::ORIGIN) > radius {
                continue;
            }
            let terrain = overrides
                .iter()
                .find(|(oq, or, _)| *oq == q && *or == r)
                .map_or(2, |(_, _, terrain)| *terrain);
            tiles.push(json!({"q": q, "r": r, "type": terrain, "cost": 1}));
        }
    }
    tiles
}

fn parse(value: Value) -> Snapshot {
    serde_json::from_value(value).expect("valid snapshot")
}

fn path_of<'m>(moves: &'m [Move], id: &str) -> Option<&'m [HexCoord]> {
    moves
        .iter()
        .find(|mv| mv.agent_id == id)
        .map(|mv| mv.path.as_slice())
}

fn cells(coords: &[(i32, i32)]) -> Vec<HexCoord> {
    coords.iter().map(|&c| HexCoord::from(c)).collect()
}

#[test]
fn idle_worker_forages_nearest_food_and_serializes_move_batch() {
    let snapshot = parse(json!({
        "turnNo": 1,
        "ants": [{"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}],
        "food": [{"q": 3, "r": 0, "type": 1, "amount": 10}],
        "map": disc_map(6, &[]),
    }));
    let moves = DecisionEngine::new(StrategyConfig::default(), 1).decide(&snapshot);

    assert_eq!(path_of(&moves, "w"), Some(&cells(&[(1, 0), (2, 0), (3, 0)])[..]));
    let body = serde_json::to_string(&MoveBatch { moves }).expect("serialize");
    assert_eq!(
        body,
        r#"{"moves":[{"ant":"w","path":[{"q":1,"r":0},{"q":2,"r":0},{"q":3,"r":0}]}]}"#
    );
}

#[test]
fn forager_takes_the_route_without_acid() {
    let snapshot = parse(json!({
        "turnNo": 1,
        "ants": [{"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}],
        "food": [{"q": 2, "r": -1, "type": 1, "amount": 10}],
        "map": disc_map(5, &[(1, 0, 4)]),
    }));
    let moves = DecisionEngine::new(StrategyConfig::default(), 1).decide(&snapshot);
    assert_eq!(path_of(&moves, "w"), Some(&cells(&[(1, -1), (2, -1)])[..]));
}

#[test]
fn walled_off_food_is_skipped_for_exploration() {
    let ring: Vec<(i32, i32, u8)> = HexCoord::new(3, 0)
        .neighbors()
        .iter()
        .map(|cell| (cell.q, cell.r, 5))
        .collect();
    let snapshot = parse(json!({
        "turnNo": 1,
        "ants": [{"id": "w", "type": 0, "q": -2, "r": 0, "health": 100}],
        "food": [{"q": 3, "r": 0, "type": 1, "amount": 10}],
        "map": disc_map(12, &ring),
    }));
    let moves = DecisionEngine::new(StrategyConfig::default(), 1).decide(&snapshot);
    let path = path_of(&moves, "w").expect("explores instead");
    assert_eq!(path.len(), 5);
    assert_ne!(path.last(), Some(&HexCoord::new(3, 0)));
}

#[test]
fn identical_inputs_give_identical_moves_and_ledgers() {
    let snapshot = parse(json!({
        "turnNo": 12,
        "ants": [
            {"id": "w1", "type": 0, "q": 0, "r": 0, "health": 100},
            {"id": "w2", "type": 0, "q": 1, "r": 0, "health": 100},
            {"id": "w3", "type": 0, "q": 0, "r": 1, "health": 100},
            {"id": "w4", "type": 0, "q": 1, "r": -1, "health": 100},
            {"id": "f1", "type": 1, "q": -1, "r": 0, "health": 100},
            {"id": "s1", "type": 2, "q": -1, "r": 1, "health": 100}
        ],
        "enemies": [
            {"type": 0, "q": 7, "r": -3, "health": 50},
            {"type": 1, "q": 8, "r": -3, "health": 50}
        ],
        "food": [{"q": -4, "r": 2, "type": 1, "amount": 5}],
        "home": [{"q": 0, "r": 0}, {"q": 1, "r": 0}, {"q": 0, "r": 1}],
        "spot": {"q": 0, "r": 0},
        "map": disc_map(10, &[(2, 2, 4), (-2, 3, 5)]),
    }));

    let mut first = DecisionEngine::new(StrategyConfig::default(), 2024);
    let mut second = DecisionEngine::new(StrategyConfig::default(), 2024);
    for _ in 0..3 {
        assert_eq!(first.decide(&snapshot), second.decide(&snapshot));
    }
    assert_eq!(first.legions(), second.legions());
    assert!(first.legions().get("ATTACK_ENEMY_GROUP_12").is_some());
}

#[test]
fn attack_legion_lives_while_enemies_stay_and_dies_the_tick_they_leave() {
    let base = json!({
        "turnNo": 10,
        "ants": [
            {"id": "f", "type": 1, "q": 1, "r": 0, "health": 100},
            {"id": "s", "type": 2, "q": 0, "r": 1, "health": 100},
            {"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}
        ],
        "enemies": [
            {"type": 0, "q": 8, "r": 0, "health": 50},
            {"type": 0, "q": 9, "r": 1, "health": 50}
        ],
        "home": [{"q": 0, "r": 0}],
        "map": disc_map(12, &[]),
    });
    let mut engine = DecisionEngine::new(StrategyConfig::default(), 5);

    let moves = engine.decide(&parse(base.clone()));
    let legion = engine
        .legions()
        .get("ATTACK_ENEMY_GROUP_10")
        .expect("legion formed");
    assert_eq!(legion.mission, Mission::AttackEnemyGroup);
    assert_eq!(legion.target, HexCoord::new(8, 0));
    assert!(!legion.has_member("w"));
    assert!(path_of(&moves, "w").is_some());

    let mut next = base.clone();
    next["turnNo"] = json!(11);
    engine.decide(&parse(next.clone()));
    assert_eq!(engine.legions().len(), 1);

    next["turnNo"] = json!(12);
    next["enemies"] = json!([{"type": 0, "q": 13, "r": 0, "health": 50}]);
    engine.decide(&parse(next));
    assert!(engine.legions().is_empty());
}

#[test]
fn legion_without_surviving_members_is_removed_immediately() {
    let mut engine = DecisionEngine::new(StrategyConfig::default(), 5);
    engine.decide(&parse(json!({
        "turnNo": 3,
        "ants": [
            {"id": "f", "type": 1, "q": 1, "r": 0, "health": 100},
            {"id": "s", "type": 2, "q": 0, "r": 1, "health": 100},
            {"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}
        ],
        "enemies": [
            {"type": 0, "q": 8, "r": 0, "health": 50},
            {"type": 0, "q": 9, "r": 0, "health": 50}
        ],
        "map": disc_map(12, &[]),
    })));
    assert_eq!(engine.legions().len(), 1);

    engine.decide(&parse(json!({
        "turnNo": 4,
        "ants": [{"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}],
        "enemies": [
            {"type": 0, "q": 8, "r": 0, "health": 50},
            {"type": 0, "q": 9, "r": 0, "health": 50}
        ],
        "map": disc_map(12, &[]),
    })));
    assert!(engine.legions().is_empty());
}

#[test]
fn crowding_trials_are_bounded_and_fall_through_when_all_fail() {
    let snapshot = parse(json!({
        "turnNo": 2,
        "ants": [
            {"id": "a", "type": 0, "q": 0, "r": 0, "health": 100},
            {"id": "b", "type": 0, "q": 1, "r": 0, "health": 100},
            {"id": "c", "type": 0, "q": -1, "r": 0, "health": 100},
            {"id": "d", "type": 0, "q": 0, "r": 1, "health": 100}
        ],
        "map": disc_map(1, &[]),
    }));
    let rng = SequenceRng::new(vec![0.1, 0.7, 0.4]);
    let mut engine = DecisionEngine::with_rng(StrategyConfig::default(), rng);
    let moves = engine.decide(&snapshot);

    // Ten trials, one direction and one jump draw each, every target hidden.
    assert_eq!(engine.rng().draws(), 20);
    let path = path_of(&moves, "a").expect("explores within the visible cells");
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].distance(HexCoord::ORIGIN), 1);
}

#[test]
fn saved_legions_resume_in_a_fresh_engine() {
    let snapshot = json!({
        "turnNo": 20,
        "ants": [
            {"id": "f", "type": 1, "q": 1, "r": 0, "health": 100},
            {"id": "s", "type": 2, "q": 0, "r": 1, "health": 100},
            {"id": "w", "type": 0, "q": 0, "r": 0, "health": 100}
        ],
        "food": [
            {"q": 14, "r": 0, "type": 1, "amount": 8},
            {"q": -13, "r": 0, "type": 1, "amount": 8}
        ],
        "home": [{"q": 0, "r": 0}],
        "map": disc_map(15, &[]),
    });
    let mut engine = DecisionEngine::new(StrategyConfig::default(), 8);
    engine.decide(&parse(snapshot.clone()));
    let ledger = engine.into_legions();
    let legion = ledger.get("EXPAND_AND_HARVEST_20").expect("expand legion");
    assert_eq!(legion.target, HexCoord::new(14, 0));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("legions.json");
    ledger.save(&path).expect("save");
    let restored = LegionLedger::load(&path).expect("load");
    assert_eq!(restored, ledger);

    let mut next = snapshot;
    next["turnNo"] = json!(21);
    let mut resumed = DecisionEngine::new(StrategyConfig::default(), 8).with_legions(restored);
    let moves = resumed.decide(&parse(next));
    assert_eq!(resumed.legions().ids(), vec!["EXPAND_AND_HARVEST_20".to_string()]);
    assert_eq!(path_of(&moves, "f").and_then(|p| p.last()), Some(&HexCoord::new(5, 0)));
}

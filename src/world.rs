use std::collections::{HashMap, HashSet};

use crate::hex::HexCoord;
use crate::types::{Agent, Snapshot, Tile};

pub type TileMap = HashMap<HexCoord, Tile>;

/// Indexed, read-only view of one snapshot.
#[derive(Clone, Debug)]
pub struct WorldView<'a> {
    pub snapshot: &'a Snapshot,
    pub tiles: TileMap,
    /// Home cells in snapshot order, deduplicated.
    pub home: Vec<HexCoord>,
    pub center: HexCoord,
    pub spawn: Option<HexCoord>,
    enemy_cells: HashSet<HexCoord>,
}

impl<'a> WorldView<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        let tiles = build_tile_map(&snapshot.tiles);
        let mut seen = HashSet::new();
        let home: Vec<HexCoord> = snapshot
            .home
            .iter()
            .copied()
            .filter(|cell| seen.insert(*cell))
            .collect();
        let center = home_center(&home, snapshot.spawn);
        let enemy_cells = snapshot.enemies.iter().map(|enemy| enemy.pos()).collect();
        Self {
            snapshot,
            tiles,
            home,
            center,
            spawn: snapshot.spawn,
            enemy_cells,
        }
    }

    pub fn turn(&self) -> u64 {
        self.snapshot.turn
    }

    pub fn is_visible(&self, cell: HexCoord) -> bool {
        self.tiles.contains_key(&cell)
    }

    pub fn is_walkable(&self, cell: HexCoord) -> bool {
        self.tiles
            .get(&cell)
            .is_some_and(|tile| tile.terrain.is_passable())
    }

    pub fn is_home(&self, cell: HexCoord) -> bool {
        self.home.contains(&cell)
    }

    pub fn has_enemy_at(&self, cell: HexCoord) -> bool {
        self.enemy_cells.contains(&cell)
    }

    pub fn enemy_positions(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.snapshot.enemies.iter().map(|enemy| enemy.pos())
    }

    /// Own agents other than `agent` standing within `radius` of it.
    pub fn count_agents_near(&self, agents: &[&Agent], agent: &Agent, radius: i32) -> usize {
        let pos = agent.pos();
        agents
            .iter()
            .filter(|other| other.id != agent.id && other.pos().within(pos, radius))
            .count()
    }
}

pub fn build_tile_map(tiles: &[Tile]) -> TileMap {
    tiles.iter().map(|tile| (tile.pos(), tile.clone())).collect()
}

/// Home cell nearest to the centroid of all home cells, earliest on ties.
/// Falls back to the spawn point, then the origin.
pub fn home_center(home: &[HexCoord], spawn: Option<HexCoord>) -> HexCoord {
    if home.is_empty() {
        return spawn.unwrap_or(HexCoord::ORIGIN);
    }
    let count = home.len() as f64;
    let mean_q = home.iter().map(|cell| cell.q as f64).sum::<f64>() / count;
    let mean_r = home.iter().map(|cell| cell.r as f64).sum::<f64>() / count;

    let mut best = home[0];
    let mut best_dist = f64::INFINITY;
    for cell in home {
        let dq = cell.q as f64 - mean_q;
        let dr = cell.r as f64 - mean_r;
        let dist = (dq.abs() + (dq + dr).abs() + dr.abs()) / 2.0;
        if dist < best_dist {
            best_dist = dist;
            best = *cell;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Enemy, TerrainType, UnitKind};

    fn tile(q: i32, r: i32, terrain: TerrainType) -> Tile {
        Tile {
            q,
            r,
            terrain,
            cost: None,
        }
    }

    #[test]
    fn home_center_picks_middle_cell_of_the_nest() {
        let home = [
            HexCoord::new(5, 5),
            HexCoord::new(6, 5),
            HexCoord::new(7, 5),
        ];
        assert_eq!(home_center(&home, None), HexCoord::new(6, 5));
    }

    #[test]
    fn home_center_falls_back_to_spawn_then_origin() {
        assert_eq!(
            home_center(&[], Some(HexCoord::new(2, 3))),
            HexCoord::new(2, 3)
        );
        assert_eq!(home_center(&[], None), HexCoord::ORIGIN);
    }

    #[test]
    fn view_indexes_tiles_home_and_enemies() {
        let snapshot = Snapshot {
            turn: 4,
            enemies: vec![Enemy {
                kind: UnitKind::Fighter,
                q: 1,
                r: 0,
                health: 100,
                food: None,
                attack: None,
            }],
            home: vec![HexCoord::new(0, 0), HexCoord::new(0, 0), HexCoord::new(0, 1)],
            tiles: vec![
                tile(0, 0, TerrainType::Home),
                tile(1, 0, TerrainType::Empty),
                tile(2, 0, TerrainType::Rock),
            ],
            ..Snapshot::default()
        };
        let world = WorldView::new(&snapshot);
        assert_eq!(world.home.len(), 2);
        assert!(world.is_visible(HexCoord::new(2, 0)));
        assert!(!world.is_walkable(HexCoord::new(2, 0)));
        assert!(!world.is_visible(HexCoord::new(9, 9)));
        assert!(world.has_enemy_at(HexCoord::new(1, 0)));
        assert_eq!(world.turn(), 4);
    }
}

//! A* search over the visible part of the map.
//!
//! Unknown cells are impassable, rock is never entered, and acid is allowed
//! but priced with a penalty so safe detours win when they are cheap enough.
//! Cells reported by an [`Occupancy`] are avoided unless they are the goal.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::hex::HexCoord;
use crate::world::TileMap;

pub trait Occupancy {
    fn is_occupied(&self, cell: HexCoord) -> bool;
}

impl Occupancy for HashSet<HexCoord> {
    fn is_occupied(&self, cell: HexCoord) -> bool {
        self.contains(&cell)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Pathfinder<'a> {
    tiles: &'a TileMap,
    hazard_penalty: u32,
}

impl<'a> Pathfinder<'a> {
    pub fn new(tiles: &'a TileMap, hazard_penalty: u32) -> Self {
        Self {
            tiles,
            hazard_penalty,
        }
    }

    /// Cost of entering `cell`, or `None` when it cannot be entered.
    pub fn step_cost(&self, cell: HexCoord) -> Option<u32> {
        let tile = self.tiles.get(&cell)?;
        if !tile.terrain.is_passable() {
            return None;
        }
        let mut cost = tile.move_cost();
        if tile.terrain.is_hazard() {
            cost = cost.saturating_add(self.hazard_penalty);
        }
        Some(cost)
    }

    /// Cheapest route from `start` to `goal`, both inclusive.
    pub fn find_path<O>(&self, start: HexCoord, goal: HexCoord, occupied: &O) -> Option<Vec<HexCoord>>
    where
        O: Occupancy + ?Sized,
    {
        if start == goal {
            return Some(vec![start]);
        }
        if self.step_cost(goal).is_none() {
            return None;
        }

        // (f, insertion sequence, cell); the sequence keeps equal keys FIFO.
        let mut open: BinaryHeap<Reverse<(u32, u64, HexCoord)>> = BinaryHeap::new();
        let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
        let mut g_cost: HashMap<HexCoord, u32> = HashMap::new();
        let mut closed: HashSet<HexCoord> = HashSet::new();
        let mut sequence = 0u64;

        g_cost.insert(start, 0);
        open.push(Reverse((heuristic(start, goal), sequence, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if current == goal {
                return Some(reconstruct(&came_from, start, goal));
            }
            if !closed.insert(current) {
                continue;
            }
            let Some(&current_g) = g_cost.get(&current) else {
                continue;
            };

            for neighbor in current.neighbors() {
                if closed.contains(&neighbor) {
                    continue;
                }
                if neighbor != goal && occupied.is_occupied(neighbor) {
                    continue;
                }
                let Some(step) = self.step_cost(neighbor) else {
                    continue;
                };
                let tentative = current_g.saturating_add(step);
                let improved = g_cost
                    .get(&neighbor)
                    .map_or(true, |&known| tentative < known);
                if improved {
                    g_cost.insert(neighbor, tentative);
                    came_from.insert(neighbor, current);
                    sequence += 1;
                    open.push(Reverse((
                        tentative.saturating_add(heuristic(neighbor, goal)),
                        sequence,
                        neighbor,
                    )));
                }
            }
        }

        None
    }
}

fn heuristic(from: HexCoord, to: HexCoord) -> u32 {
    from.distance(to) as u32
}

fn reconstruct(came_from: &HashMap<HexCoord, HexCoord>, start: HexCoord, goal: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

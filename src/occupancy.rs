use std::collections::HashMap;

use crate::hex::HexCoord;
use crate::pathfinding::Occupancy;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Claim {
    Enemy,
    Agent(String),
}

/// Cells reserved during one decision pass. Enemy cells are claimed up front
/// and never released; agent claims follow planned destinations.
#[derive(Clone, Debug, Default)]
pub struct OccupancyLedger {
    claims: HashMap<HexCoord, Claim>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded_with_enemies(enemies: impl IntoIterator<Item = HexCoord>) -> Self {
        let claims = enemies
            .into_iter()
            .map(|cell| (cell, Claim::Enemy))
            .collect();
        Self { claims }
    }

    pub fn is_claimed(&self, cell: HexCoord) -> bool {
        self.claims.contains_key(&cell)
    }

    pub fn claimant(&self, cell: HexCoord) -> Option<&Claim> {
        self.claims.get(&cell)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Records `destination` as planned for `agent_id` and drops the agent's
    /// own earlier claim on `origin`. Returns false when the destination was
    /// already held by someone else.
    pub fn claim_destination(&mut self, agent_id: &str, origin: HexCoord, destination: HexCoord) -> bool {
        let previous = self.claims.get(&destination).cloned();
        let was_free = match &previous {
            None => true,
            Some(Claim::Agent(owner)) => owner == agent_id,
            Some(Claim::Enemy) => false,
        };
        if previous != Some(Claim::Enemy) {
            self.claims
                .insert(destination, Claim::Agent(agent_id.to_string()));
        }

        if origin != destination {
            let owns_origin = matches!(
                self.claims.get(&origin),
                Some(Claim::Agent(owner)) if owner == agent_id
            );
            if owns_origin {
                self.claims.remove(&origin);
            }
        }
        was_free
    }
}

impl Occupancy for OccupancyLedger {
    fn is_occupied(&self, cell: HexCoord) -> bool {
        self.is_claimed(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemies_are_pre_claimed() {
        let ledger = OccupancyLedger::seeded_with_enemies([HexCoord::new(3, 3)]);
        assert!(ledger.is_claimed(HexCoord::new(3, 3)));
        assert_eq!(ledger.claimant(HexCoord::new(3, 3)), Some(&Claim::Enemy));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn claiming_destination_releases_own_stale_origin() {
        let mut ledger = OccupancyLedger::new();
        assert!(ledger.claim_destination("a", HexCoord::new(0, 0), HexCoord::new(1, 0)));
        assert!(ledger.claim_destination("a", HexCoord::new(1, 0), HexCoord::new(2, 0)));
        assert!(!ledger.is_claimed(HexCoord::new(1, 0)));
        assert!(ledger.is_claimed(HexCoord::new(2, 0)));
    }

    #[test]
    fn origin_held_by_someone_else_is_kept() {
        let mut ledger = OccupancyLedger::seeded_with_enemies([HexCoord::new(5, 5)]);
        ledger.claim_destination("b", HexCoord::new(9, 9), HexCoord::new(0, 0));
        ledger.claim_destination("a", HexCoord::new(0, 0), HexCoord::new(1, 0));
        assert_eq!(
            ledger.claimant(HexCoord::new(0, 0)),
            Some(&Claim::Agent("b".to_string()))
        );

        ledger.claim_destination("c", HexCoord::new(5, 5), HexCoord::new(6, 5));
        assert_eq!(ledger.claimant(HexCoord::new(5, 5)), Some(&Claim::Enemy));
    }

    #[test]
    fn contested_destination_is_reported_and_taken_over() {
        let mut ledger = OccupancyLedger::seeded_with_enemies([HexCoord::new(4, 0)]);
        ledger.claim_destination("a", HexCoord::new(0, 0), HexCoord::new(2, 0));
        assert!(!ledger.claim_destination("b", HexCoord::new(0, 1), HexCoord::new(2, 0)));
        assert_eq!(
            ledger.claimant(HexCoord::new(2, 0)),
            Some(&Claim::Agent("b".to_string()))
        );

        assert!(!ledger.claim_destination("b", HexCoord::new(2, 0), HexCoord::new(4, 0)));
        assert_eq!(ledger.claimant(HexCoord::new(4, 0)), Some(&Claim::Enemy));
    }
}

use crate::error::DecisionError;
use crate::hex::HexCoord;
use crate::occupancy::OccupancyLedger;
use crate::types::{Agent, Move};

/// Cuts `path` down to the next `speed` steps and claims its end cell.
///
/// `path` must start at the agent's own cell. Paths of one cell or fewer mean
/// "stay put" and yield no move and no claim.
pub fn format_move(
    agent: &Agent,
    path: &[HexCoord],
    speed: usize,
    ledger: &mut OccupancyLedger,
) -> Result<Option<Move>, DecisionError> {
    let origin = agent.pos();
    let Some(&first) = path.first() else {
        return Ok(None);
    };
    if first != origin {
        return Err(DecisionError::PathOrigin {
            agent_id: agent.id.clone(),
            expected: origin,
            found: first,
        });
    }
    if path.len() <= 1 || speed == 0 {
        return Ok(None);
    }

    let end = path.len().min(speed + 1);
    let steps = path[1..end].to_vec();
    let Some(&destination) = steps.last() else {
        return Ok(None);
    };
    if !ledger.claim_destination(&agent.id, origin, destination) {
        tracing::debug!(agent = %agent.id, %destination, "destination already claimed");
    }

    Ok(Some(Move {
        agent_id: agent.id.clone(),
        path: steps,
    }))
}

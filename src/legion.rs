use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::hex::HexCoord;
use crate::types::{Agent, UnitKind};

const LEDGER_FILE_VERSION: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mission {
    AttackEnemyGroup,
    ExpandAndHarvest,
}

impl Mission {
    pub fn key(self) -> &'static str {
        match self {
            Self::AttackEnemyGroup => "ATTACK_ENEMY_GROUP",
            Self::ExpandAndHarvest => "EXPAND_AND_HARVEST",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegionRole {
    Fighter,
    Scout,
}

impl LegionRole {
    pub fn for_kind(kind: UnitKind) -> Option<Self> {
        match kind {
            UnitKind::Fighter => Some(Self::Fighter),
            UnitKind::Scout => Some(Self::Scout),
            UnitKind::Worker => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legion {
    pub id: String,
    pub mission: Mission,
    pub target: HexCoord,
    #[serde(rename = "formedTurn")]
    pub formed_turn: u64,
    pub members: BTreeMap<String, LegionRole>,
}

impl Legion {
    pub fn new(
        mission: Mission,
        target: HexCoord,
        turn: u64,
        members: BTreeMap<String, LegionRole>,
    ) -> Self {
        Self {
            id: format!("{}_{}", mission.key(), turn),
            mission,
            target,
            formed_turn: turn,
            members,
        }
    }

    pub fn has_member(&self, agent_id: &str) -> bool {
        self.members.contains_key(agent_id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u8,
    legions: BTreeMap<String, Legion>,
}

/// Squads that outlive a single decision pass, keyed and iterated by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegionLedger {
    legions: BTreeMap<String, Legion>,
}

impl LegionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.legions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Legion> {
        self.legions.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Legion> {
        self.legions.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.legions.keys().cloned().collect()
    }

    pub fn contains_agent(&self, agent_id: &str) -> bool {
        self.legions
            .values()
            .any(|legion| legion.has_member(agent_id))
    }

    pub fn assigned_agents(&self) -> HashSet<&str> {
        self.legions
            .values()
            .flat_map(|legion| legion.members.keys().map(String::as_str))
            .collect()
    }

    /// Adds `legion` unless its id is taken, it has no members, or one of its
    /// members already serves elsewhere.
    pub fn insert(&mut self, legion: Legion) -> bool {
        if legion.members.is_empty() || self.legions.contains_key(&legion.id) {
            return false;
        }
        if legion.members.keys().any(|id| self.contains_agent(id)) {
            return false;
        }
        self.legions.insert(legion.id.clone(), legion);
        true
    }

    /// Drops members missing from `present`, then disbands legions left empty
    /// and attack legions with no enemy closer than `dispersal_radius` to the
    /// target. Returns the disbanded ids.
    pub fn prune(
        &mut self,
        present: &HashSet<&str>,
        enemies: &[HexCoord],
        dispersal_radius: i32,
    ) -> Vec<String> {
        let mut disbanded = Vec::new();
        for (id, legion) in self.legions.iter_mut() {
            legion
                .members
                .retain(|member, _| present.contains(member.as_str()));
            if legion.members.is_empty() {
                disbanded.push(id.clone());
                continue;
            }
            if legion.mission == Mission::AttackEnemyGroup {
                let enemy_near = enemies
                    .iter()
                    .any(|enemy| enemy.distance(legion.target) < dispersal_radius);
                if !enemy_near {
                    disbanded.push(id.clone());
                }
            }
        }
        for id in &disbanded {
            self.legions.remove(id);
        }
        disbanded
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = LedgerFile {
            version: LEDGER_FILE_VERSION,
            legions: self.legions.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }

    /// Reads a saved ledger. A missing file is an empty ledger; entries that
    /// would break the one-legion-per-agent rule are dropped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(error) => return Err(error.into()),
        };
        let parsed: LedgerFile = serde_json::from_str(&text)?;
        if parsed.version != LEDGER_FILE_VERSION {
            return Err(LedgerError::UnsupportedVersion(parsed.version));
        }

        let mut ledger = Self::new();
        for (key, mut legion) in parsed.legions {
            legion.id = key;
            let id = legion.id.clone();
            if !ledger.insert(legion) {
                tracing::warn!(legion = %id, path = %path.display(), "dropping conflicting legion entry");
            }
        }
        Ok(ledger)
    }
}

/// Single-link clusters of `points`: two points are linked when closer than
/// `radius`. Only clusters of two or more are returned, as index lists in
/// ascending order, largest first and then by earliest member.
pub fn find_clusters(points: &[HexCoord], radius: i32) -> Vec<Vec<usize>> {
    let mut visited = vec![false; points.len()];
    let mut clusters = Vec::new();

    for seed in 0..points.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut members = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            for other in 0..points.len() {
                if !visited[other] && points[current].distance(points[other]) < radius {
                    visited[other] = true;
                    members.push(other);
                    queue.push_back(other);
                }
            }
        }
        if members.len() >= 2 {
            members.sort_unstable();
            clusters.push(members);
        }
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    clusters
}

/// Picks the legion crew for `target` from `candidates`, nearest first with
/// ties broken by id, until the fighter and scout quotas are met.
pub fn recruit(
    candidates: &[&Agent],
    target: HexCoord,
    fighter_quota: usize,
    scout_quota: usize,
) -> BTreeMap<String, LegionRole> {
    let mut sorted: Vec<&Agent> = candidates.to_vec();
    sorted.sort_by(|a, b| {
        a.pos()
            .distance(target)
            .cmp(&b.pos().distance(target))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut fighters = 0;
    let mut scouts = 0;
    let mut crew = BTreeMap::new();
    for agent in sorted {
        match LegionRole::for_kind(agent.kind) {
            Some(LegionRole::Fighter) if fighters < fighter_quota => {
                fighters += 1;
                crew.insert(agent.id.clone(), LegionRole::Fighter);
            }
            Some(LegionRole::Scout) if scouts < scout_quota => {
                scouts += 1;
                crew.insert(agent.id.clone(), LegionRole::Scout);
            }
            _ => {}
        }
        if fighters >= fighter_quota && scouts >= scout_quota {
            break;
        }
    }
    crew
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_MOVE_COST;
use crate::error::SnapshotError;
use crate::hex::HexCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TerrainType {
    Home,
    Empty,
    Mud,
    Acid,
    Rock,
}

impl TerrainType {
    pub fn is_passable(self) -> bool {
        self != Self::Rock
    }

    pub fn is_hazard(self) -> bool {
        self == Self::Acid
    }
}

impl From<u8> for TerrainType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Home,
            2 => Self::Empty,
            3 => Self::Mud,
            4 => Self::Acid,
            _ => Self::Rock,
        }
    }
}

impl From<TerrainType> for u8 {
    fn from(value: TerrainType) -> Self {
        match value {
            TerrainType::Home => 1,
            TerrainType::Empty => 2,
            TerrainType::Mud => 3,
            TerrainType::Acid => 4,
            TerrainType::Rock => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum UnitKind {
    #[default]
    Worker,
    Fighter,
    Scout,
}

impl From<u8> for UnitKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Fighter,
            2 => Self::Scout,
            _ => Self::Worker,
        }
    }
}

impl From<UnitKind> for u8 {
    fn from(value: UnitKind) -> Self {
        match value {
            UnitKind::Worker => 0,
            UnitKind::Fighter => 1,
            UnitKind::Scout => 2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CarriedResource {
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub amount: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: UnitKind,
    pub q: i32,
    pub r: i32,
    #[serde(default)]
    pub health: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<CarriedResource>,
    #[serde(rename = "lastMove", default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Vec<HexCoord>>,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub planned_move: Option<Vec<HexCoord>>,
}

impl Agent {
    pub fn pos(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn carried_amount(&self) -> u32 {
        self.food.as_ref().map_or(0, |food| food.amount)
    }

    pub fn is_carrying(&self) -> bool {
        self.carried_amount() > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    #[serde(rename = "type", default)]
    pub kind: UnitKind,
    pub q: i32,
    pub r: i32,
    #[serde(default)]
    pub health: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<CarriedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<i32>,
}

impl Enemy {
    pub fn pos(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn is_carrying(&self) -> bool {
        self.food.as_ref().is_some_and(|food| food.amount > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodResource {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub amount: u32,
}

impl FoodResource {
    pub fn pos(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub terrain: TerrainType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
}

impl Tile {
    pub fn pos(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn move_cost(&self) -> u32 {
        self.cost.unwrap_or(DEFAULT_MOVE_COST).max(1)
    }
}

/// One turn of the arena as served by `GET /api/arena`. Every field is
/// optional on the wire, and malformed collection entries are dropped
/// instead of failing the whole snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "turnNo", default, deserialize_with = "nullable")]
    pub turn: u64,
    #[serde(rename = "ants", default, deserialize_with = "lenient_list")]
    pub agents: Vec<Agent>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub enemies: Vec<Enemy>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub food: Vec<FoodResource>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub home: Vec<HexCoord>,
    #[serde(rename = "spot", default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<HexCoord>,
    #[serde(rename = "map", default, deserialize_with = "lenient_list")]
    pub tiles: Vec<Tile>,
    #[serde(rename = "nextTurnIn", default, skip_serializing_if = "Option::is_none")]
    pub next_turn_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Empty arena after a round: turn zero and no own units.
    pub fn is_round_over(&self) -> bool {
        self.turn == 0 && self.agents.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    #[serde(rename = "ant")]
    pub agent_id: String,
    pub path: Vec<HexCoord>,
}

impl Move {
    pub fn destination(&self) -> Option<HexCoord> {
        self.path.last().copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveBatch {
    pub moves: Vec<Move>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "nextTurn", default)]
    pub next_turn: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerLogEntry {
    #[serde(default)]
    pub tick: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Null or missing lists become empty; entries that do not parse are logged
/// and skipped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Vec<serde_json::Value> = nullable(deserializer)?;
    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(error) => tracing::warn!(
                index,
                entry = std::any::type_name::<T>(),
                %error,
                "dropping malformed snapshot entry"
            ),
        }
    }
    Ok(items)
}

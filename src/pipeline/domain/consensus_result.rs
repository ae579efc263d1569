use serde::{Serialize, Serializer};
use std::fmt;

pub const UNKNOWN: &str = "unknown";

/// A scalar after voting: either the winning value or an explicit unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Value(String),
    Unknown,
}

impl Resolved {
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolved::Value(value) => Some(value),
            Resolved::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolved::Unknown)
    }

    /// The value, or `placeholder` when unknown.
    pub fn or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.value().unwrap_or(placeholder)
    }
}

impl From<Option<String>> for Resolved {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.trim().is_empty() => Resolved::Value(value),
            _ => Resolved::Unknown,
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.or(UNKNOWN))
    }
}

impl Serialize for Resolved {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.or(UNKNOWN))
    }
}

/// The single report fused from every frame's analysis. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub game: Resolved,
    pub characters: ConsensusCharacters,
    pub situation: ConsensusSituation,
    pub map: ConsensusMap,
    pub tags: Vec<String>,
    pub summary: String,
    pub frame_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusCharacters {
    pub player: Resolved,
    pub allies: Vec<String>,
    pub enemies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusSituation {
    pub action: Resolved,
    #[serde(rename = "gamePhase")]
    pub game_phase: Resolved,
    #[serde(rename = "playerStatus")]
    pub player_status: Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusMap {
    pub location: Resolved,
    pub features: Vec<String>,
}

impl fmt::Display for ConsensusResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Game: {}", self.game)?;
        writeln!(f, "Player: {}", self.characters.player)?;
        if !self.characters.allies.is_empty() {
            writeln!(f, "Allies: {}", self.characters.allies.join(", "))?;
        }
        if !self.characters.enemies.is_empty() {
            writeln!(f, "Enemies: {}", self.characters.enemies.join(", "))?;
        }
        writeln!(f, "Action: {}", self.situation.action)?;
        writeln!(f, "Game phase: {}", self.situation.game_phase)?;
        writeln!(f, "Player status: {}", self.situation.player_status)?;
        writeln!(f, "Location: {}", self.map.location)?;
        if !self.map.features.is_empty() {
            writeln!(f, "Features: {}", self.map.features.join(", "))?;
        }
        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(" "))?;
        }
        write!(f, "Summary: {}", self.summary)
    }
}

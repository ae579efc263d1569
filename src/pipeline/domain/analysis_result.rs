use serde::{Deserialize, Serialize};

use super::field::{lenient_list, Field};

pub const NO_STATUS_INFORMATION: &str = "no status information";

/// What the vision service reported for a single frame.
///
/// Every part is optional: the service may leave out whole sections, return
/// them as null, or return shapes we cannot read. None of that is an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub confidence: Field<String>,
    pub game: Field<String>,
    pub ui_analysis: Field<UiAnalysis>,
    pub characters: Field<Characters>,
    pub situation: Field<Situation>,
    pub map: Field<MapInfo>,
    #[serde(deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    pub summary: Field<String>,
    pub analysis_notes: Field<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiAnalysis {
    pub skill_icons_visible: Field<String>,
    pub character_portrait_visible: Field<String>,
    pub health_mana_bars_visible: Field<String>,
    pub ui_layout: Field<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Characters {
    pub player: Field<String>,
    pub player_confidence: Field<String>,
    pub identification_method: Field<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub allies: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub enemies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Situation {
    pub action: Field<String>,
    #[serde(rename = "gamePhase")]
    pub game_phase: Field<String>,
    #[serde(rename = "playerStatus")]
    pub player_status: Field<PlayerStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapInfo {
    pub location: Field<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub features: Vec<String>,
}

/// Status is either prose or a breakdown, depending on the service's mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerStatus {
    Text(String),
    Detailed(StatusDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDetails {
    pub health: Field<String>,
    pub mana: Field<String>,
    pub level: Field<String>,
    pub gold: Field<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub items: Vec<String>,
}

impl PlayerStatus {
    /// Renders the status as one line of text. Blank prose renders as an empty string.
    pub fn render(&self) -> String {
        match self {
            PlayerStatus::Text(text) => text.trim().to_string(),
            PlayerStatus::Detailed(details) => {
                let mut parts = Vec::new();
                let labelled = [
                    ("health", &details.health),
                    ("mana", &details.mana),
                    ("level", &details.level),
                    ("gold", &details.gold),
                ];
                for (label, field) in labelled {
                    if let Some(value) = field.text() {
                        parts.push(format!("{label}: {value}"));
                    }
                }
                if !details.items.is_empty() {
                    parts.push(format!("items: {}", details.items.join(", ")));
                }
                if parts.is_empty() {
                    NO_STATUS_INFORMATION.to_string()
                } else {
                    parts.join(", ")
                }
            }
        }
    }
}

impl AnalysisResult {
    pub fn game(&self) -> Option<&str> {
        self.game.text()
    }

    pub fn player(&self) -> Option<&str> {
        self.characters.value().and_then(|c| c.player.text())
    }

    pub fn allies(&self) -> &[String] {
        self.characters.value().map_or(&[], |c| c.allies.as_slice())
    }

    pub fn enemies(&self) -> &[String] {
        self.characters.value().map_or(&[], |c| c.enemies.as_slice())
    }

    pub fn action(&self) -> Option<&str> {
        self.situation.value().and_then(|s| s.action.text())
    }

    pub fn game_phase(&self) -> Option<&str> {
        self.situation.value().and_then(|s| s.game_phase.text())
    }

    pub fn player_status(&self) -> Option<&PlayerStatus> {
        self.situation.value().and_then(|s| s.player_status.value())
    }

    pub fn location(&self) -> Option<&str> {
        self.map.value().and_then(|m| m.location.text())
    }

    pub fn features(&self) -> &[String] {
        self.map.value().map_or(&[], |m| m.features.as_slice())
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

//! Game data documents
//!
//! A game's achievements, leaderboards and rich presence script arrive as a
//! single JSON document with PascalCase keys. Numeric ids are accepted as
//! numbers or as strings.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::achievement::Achievement;
use crate::format::ValueFormat;
use crate::leaderboard::Leaderboard;

/// `Flags` value for official achievements
pub const FLAG_OFFICIAL: u32 = 3;
/// `Flags` value for unofficial achievements
pub const FLAG_UNOFFICIAL: u32 = 5;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u32::try_from(n).map_err(de::Error::custom),
        NumberOrString::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn default_flags() -> u32 {
    FLAG_OFFICIAL
}

fn default_format() -> String {
    "VALUE".to_string()
}

/// Root game document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GamePatch {
    #[serde(rename = "ID", default, deserialize_with = "number_or_string")]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "ConsoleID", default)]
    pub console_id: u32,
    #[serde(default)]
    pub rich_presence_patch: Option<String>,
    #[serde(default)]
    pub achievements: Vec<AchievementData>,
    #[serde(default)]
    pub leaderboards: Vec<LeaderboardData>,
}

/// One achievement in a game document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AchievementData {
    #[serde(rename = "ID", deserialize_with = "number_or_string")]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub points: u32,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub badge_name: String,
    pub mem_addr: String,
    #[serde(default = "default_flags")]
    pub flags: u32,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl AchievementData {
    pub fn is_official(&self) -> bool {
        self.flags == FLAG_OFFICIAL
    }

    /// Build a runtime achievement. Unofficial achievements start inactive.
    pub fn to_achievement(&self) -> Achievement {
        let mut achievement = Achievement::new(self.id, &self.mem_addr);
        achievement.title = self.title.clone();
        achievement.description = self.description.clone();
        achievement.points = self.points;
        achievement.author = self.author.clone();
        achievement.badge = self
            .badge_name
            .strip_suffix("_lock")
            .unwrap_or(&self.badge_name)
            .to_string();
        achievement.created = self.created;
        achievement.modified = self.modified;
        achievement.set_active(self.is_official());
        achievement
    }
}

/// One leaderboard in a game document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeaderboardData {
    #[serde(rename = "ID", deserialize_with = "number_or_string")]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mem: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl LeaderboardData {
    pub fn to_leaderboard(&self) -> Leaderboard {
        Leaderboard::new(self.id, &self.mem, ValueFormat::from_name(&self.format))
            .with_title(self.title.clone(), self.description.clone())
    }
}

impl GamePatch {
    /// Parse a game document from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a game document from a file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Rich presence script, if the document has a non-empty one
    pub fn rich_presence(&self) -> Option<&str> {
        self.rich_presence_patch
            .as_deref()
            .filter(|script| !script.trim().is_empty())
    }
}

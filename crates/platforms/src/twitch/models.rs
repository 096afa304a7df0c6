use serde::{Deserialize, Serialize};

/// Envelope of every Helix response body.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

/// A Twitch category (called "game" by the API).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub box_art_url: Option<String>,
}

/// Partial channel update. Absent fields are left untouched by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

impl ChannelPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn game_id(game_id: impl Into<String>) -> Self {
        Self {
            game_id: Some(game_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.game_id.is_none()
    }
}

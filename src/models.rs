// Domain records mirroring the ppl_index / card_index tables

/// A tracked person with a quota tier ("hard", "soft", or "base").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub tier: String,
}

/// One stored card. Optional columns stay unset on insert so the database
/// fills its defaults; fetches tolerate rows with any subset populated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ppl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_media: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_id: None,
            is_ppl: None,
            screen: None,
            category: None,
            title: title.into(),
            subtext: None,
            slug: None,
            score: None,
            is_media: None,
            link: None,
            is_active: None,
            created_at: None,
        }
    }
}

/// A candidate card as returned by the summarization model, before it is
/// normalized and turned into a [`Card`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CardDraft {
    pub title: String,
    #[serde(default)]
    pub subtext: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

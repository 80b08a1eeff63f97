use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Structured overlay persisted alongside a generated asset: the copy
/// fields that went onto the creative plus the scene descriptors the
/// variation selector chose.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignOverlay {
    pub headline: Option<String>,
    pub offer: Option<String>,
    pub cta: Option<String>,
    pub cast: Option<String>,
    pub scene: Option<String>,
    pub framing: Option<String>,
    pub appearance: Option<String>,
    pub mood: Option<String>,
}

/// Campaign record as stored in database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: RecordId,
    pub owner: String,
    pub mode: Option<String>,
    pub title: String,
    pub briefing: String,
    pub asset_ref: Option<String>,
    #[serde(default)]
    pub overlay: Option<CampaignOverlay>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: Datetime,
}

/// Data for persisting a generated campaign.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct CampaignRecordCreate {
    pub owner: String,
    pub mode: Option<String>,
    pub title: String,
    pub briefing: String,
    pub asset_ref: Option<String>,
    pub overlay: Option<CampaignOverlay>,
    pub metadata: Option<serde_json::Value>,
}

/// Persist a generated campaign.
pub async fn create_campaign(
    db: &ConciergeDb,
    data: CampaignRecordCreate,
) -> Result<CampaignRecord, ConciergeError> {
    let result: Option<CampaignRecord> = db.create("campaign").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to create campaign record".into()))
}

/// Recent campaigns for an owner (optionally narrowed by mode), newest first.
///
/// The variation selector uses the overlays of these records as its
/// recently-used identifier history.
pub async fn recent_campaigns(
    db: &ConciergeDb,
    owner: &str,
    mode: Option<&str>,
    limit: usize,
) -> Result<Vec<CampaignRecord>, ConciergeError> {
    let mut query = String::from("SELECT * FROM campaign WHERE owner = $owner");
    if mode.is_some() {
        query.push_str(" AND mode = $mode");
    }
    query.push_str(&format!(" ORDER BY created_at DESC LIMIT {limit}"));

    let mut builder = db.query(query).bind(("owner", owner.to_string()));
    if let Some(m) = mode {
        builder = builder.bind(("mode", m.to_string()));
    }
    let mut response = builder.await?;
    let records: Vec<CampaignRecord> = response.take(0)?;
    Ok(records)
}

use serde::{Deserialize, Serialize};

/// An evaluated startup. Always placed in exactly one folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub parent_id: String,
    pub company_name: String,
    #[serde(default)]
    pub biz_type: Option<String>,
    #[serde(default)]
    pub company_address: Option<String>,
    #[serde(default)]
    pub support_needs: Vec<String>,
    #[serde(default)]
    pub founding_date: Option<String>,
    #[serde(default)]
    pub ceo_name: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub service_summary: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub created_at: i64,
}

use super::rubric::Question;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Question id → score in `[0, max_score]`.
pub type Scores = BTreeMap<String, i64>;

/// Scored evaluation of one entity against one category, keyed by `(entity_id, category)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub entity_id: String,
    pub category: String,
    /// Folder whose shared rubric `extra_questions` snapshots; captured at save time.
    pub folder_id: String,
    #[serde(default)]
    pub scores: Scores,
    #[serde(default)]
    pub total_score: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub extra_questions: Vec<Question>,
    /// Unix milliseconds of the last save.
    #[serde(default)]
    pub updated_at: i64,
}

/// Read filter for analysis records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub entity_ids: Option<Vec<String>>,
    pub folder_scope_id: Option<String>,
    pub category: Option<String>,
}

impl RecordFilter {
    pub fn for_entities(entity_ids: Vec<String>) -> Self {
        Self {
            entity_ids: Some(entity_ids),
            ..Self::default()
        }
    }

    pub fn for_folder(folder_id: &str) -> Self {
        Self {
            folder_scope_id: Some(folder_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

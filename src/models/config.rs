use super::rubric::{default_question_labels, default_question_sets, Question};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_SCORE: i64 = 10;
pub const DEFAULT_CUSTOM_QUESTION_COUNT: usize = 5;
pub const DEFAULT_REGION_CODE_LENGTH: usize = 2;
pub const DEFAULT_UNREGISTERED_LABEL: &str = "미등록";

/// Tables and limits shared by the rubric registry, the aggregation engine
/// and the report assembler. Built from settings or `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub fixed_categories: Vec<(String, Vec<Question>)>,
    pub question_labels: BTreeMap<String, String>,
    pub max_score: i64,
    pub custom_question_count: usize,
    pub region_code_length: usize,
    pub unregistered_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_categories: default_question_sets(),
            question_labels: default_question_labels(),
            max_score: DEFAULT_MAX_SCORE,
            custom_question_count: DEFAULT_CUSTOM_QUESTION_COUNT,
            region_code_length: DEFAULT_REGION_CODE_LENGTH,
            unregistered_label: DEFAULT_UNREGISTERED_LABEL.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn fixed_names(&self) -> impl Iterator<Item = &str> {
        self.fixed_categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_fixed(&self, category: &str) -> bool {
        self.fixed_names().any(|name| name == category)
    }

    pub fn fixed_questions(&self, category: &str) -> Option<&[Question]> {
        self.fixed_categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, questions)| questions.as_slice())
    }
}

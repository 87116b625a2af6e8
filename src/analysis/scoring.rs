use crate::models::analysis_record::{AnalysisRecord, Scores};
use crate::models::rubric::Question;

pub fn clamp_score(value: i64, max_score: i64) -> i64 {
    value.clamp(0, max_score.max(0))
}

/// Analyst input → score. The leading sign and digits are read and anything
/// after them is ignored; input without leading digits scores 0. Values past
/// the range saturate instead of being rejected.
pub fn parse_score_input(raw: &str, max_score: i64) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }

    // Only overflow can fail on a non-empty run of ASCII digits.
    let value = match digits.parse::<i64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    };
    clamp_score(value, max_score)
}

pub fn total_score(scores: &Scores) -> i64 {
    scores.values().sum()
}

/// In-progress scoring of one entity for one category. Becomes an
/// `AnalysisRecord` on save and can be re-opened from one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDraft {
    pub entity_id: String,
    pub folder_id: String,
    pub category: String,
    pub scores: Scores,
    pub comment: String,
    max_score: i64,
}

impl ScoreDraft {
    pub fn new(entity_id: &str, folder_id: &str, category: &str, max_score: i64) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            folder_id: folder_id.to_string(),
            category: category.to_string(),
            scores: Scores::new(),
            comment: String::new(),
            max_score,
        }
    }

    pub fn from_record(record: &AnalysisRecord, max_score: i64) -> Self {
        let scores = record
            .scores
            .iter()
            .map(|(id, score)| (id.clone(), clamp_score(*score, max_score)))
            .collect();
        Self {
            entity_id: record.entity_id.clone(),
            folder_id: record.folder_id.clone(),
            category: record.category.clone(),
            scores,
            comment: record.comment.clone(),
            max_score,
        }
    }

    pub fn set_score(&mut self, question_id: &str, value: i64) {
        self.scores
            .insert(question_id.to_string(), clamp_score(value, self.max_score));
    }

    pub fn set_score_input(&mut self, question_id: &str, raw: &str) {
        self.scores
            .insert(question_id.to_string(), parse_score_input(raw, self.max_score));
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    pub fn total_score(&self) -> i64 {
        total_score(&self.scores)
    }

    /// Saved form, stamped with `updated_at` and carrying the rubric snapshot in effect.
    pub fn into_record(self, questions: &[Question], updated_at: i64) -> AnalysisRecord {
        let total_score = self.total_score();
        AnalysisRecord {
            entity_id: self.entity_id,
            category: self.category,
            folder_id: self.folder_id,
            scores: self.scores,
            total_score,
            comment: self.comment,
            extra_questions: questions.to_vec(),
            updated_at,
        }
    }
}

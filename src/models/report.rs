use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    pub own_score: i64,
    pub group_mean: i64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub label: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailCard {
    pub category: String,
    pub total_score: i64,
    pub per_question: Vec<QuestionScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInvestors {
    pub round: String,
    pub investors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSummary {
    pub total_amount: f64,
    pub latest_pre_share: f64,
    pub latest_post_share: f64,
    pub investors_by_round: Vec<RoundInvestors>,
    /// Index on the Seed → Series C ladder of the latest round, `None` when unknown.
    pub current_stage_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRow {
    pub year: String,
    pub revenue_domestic: f64,
    pub revenue_overseas: f64,
    pub total_revenue: f64,
    pub employees: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturePlan {
    pub title: String,
    pub content: String,
}

/// Free-form report narrative saved alongside an entity's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub entity_id: String,
    pub invest_comment: String,
    pub plans: Vec<FuturePlan>,
    pub updated_at: i64,
}

impl ReportDetails {
    pub fn blank(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            invest_comment: String::new(),
            plans: (1..=3)
                .map(|n| FuturePlan {
                    title: format!("주제명 {n}"),
                    content: String::new(),
                })
                .collect(),
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity_id: String,
    pub company_name: String,
    pub scope_id: String,
    pub comparison: Vec<ComparisonRow>,
    pub detail_cards: Vec<DetailCard>,
    pub investment: InvestmentSummary,
    pub financials: Vec<FinancialRow>,
    pub details: ReportDetails,
}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyAmount {
    pub year: String,
    pub average_amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentStats {
    pub round_distribution: Vec<DistributionEntry>,
    pub yearly_average_amount: Vec<YearlyAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyFinancials {
    pub year: String,
    pub revenue_domestic: i64,
    pub revenue_overseas: i64,
    pub employees: i64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScoreStats {
    pub category: String,
    pub record_count: usize,
    pub mean_total_score: i64,
    /// Question id → mean over the records that report that question, one decimal.
    pub question_means: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarPoint {
    pub subject: String,
    pub group_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub category: String,
    pub entity_id: String,
    pub company_name: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub scope_id: String,
    pub scope_name: Option<String>,
    pub entity_count: usize,
    pub biz_type_distribution: Vec<DistributionEntry>,
    pub region_distribution: Vec<DistributionEntry>,
    pub support_needs_distribution: Vec<DistributionEntry>,
    pub investment: InvestmentStats,
    pub financials: Vec<YearlyFinancials>,
    pub category_scores: Vec<CategoryScoreStats>,
    pub radar: Vec<RadarPoint>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl AggregationResult {
    pub fn empty(scope_id: &str, scope_name: Option<String>) -> Self {
        Self {
            scope_id: scope_id.to_string(),
            scope_name,
            ..Self::default()
        }
    }

    pub fn mean_for(&self, category: &str) -> Option<i64> {
        self.category_scores
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.mean_total_score)
    }

    pub fn group_means(&self) -> HashMap<String, i64> {
        self.category_scores
            .iter()
            .map(|c| (c.category.clone(), c.mean_total_score))
            .collect()
    }

    pub fn leader(&self, category: &str) -> Option<&LeaderboardEntry> {
        self.leaderboard.iter().find(|entry| entry.category == category)
    }
}

/// Latest aggregation per requested scope. A result is only installed when its
/// request is still the most recent one.
#[derive(Debug, Default)]
pub struct AggregationCache {
    pub requested_scope: Option<String>,
    pub generation: u64,
    pub result: Option<AggregationResult>,
}

impl AggregationCache {
    /// Registers a new request and returns its ticket.
    pub fn begin(&mut self, scope_id: &str) -> u64 {
        self.generation += 1;
        self.requested_scope = Some(scope_id.to_string());
        self.generation
    }

    /// Installs `result` if `ticket` is still current. Returns false for superseded requests.
    pub fn complete(&mut self, ticket: u64, result: &AggregationResult) -> bool {
        if ticket != self.generation {
            return false;
        }
        self.result = Some(result.clone());
        true
    }

    pub fn current(&self) -> Option<&AggregationResult> {
        let scope = self.requested_scope.as_deref()?;
        self.result.as_ref().filter(|r| r.scope_id == scope)
    }
}

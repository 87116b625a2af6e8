use super::distribution::Tally;
use super::round_nearest;
use crate::models::aggregation::{InvestmentStats, YearlyAmount, YearlyFinancials};
use crate::models::finance::{coerce, FinancialRecord, InvestmentRecord};
use crate::models::report::{FinancialRow, InvestmentSummary, RoundInvestors};
use std::collections::BTreeMap;

/// Stage ladder used to place an entity's latest round.
pub const INVESTMENT_STAGES: [&str; 5] = ["Seed", "Pre-A", "Series A", "Series B", "Series C"];

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Round distribution plus average amount per investment year. Only records with
/// a period and an amount take part in the yearly average; a malformed amount
/// still counts, as zero.
pub fn investment_stats(investments: &[&InvestmentRecord]) -> InvestmentStats {
    let mut rounds = Tally::default();
    let mut by_year: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for inv in investments {
        if let Some(round) = non_blank(inv.round.as_ref()) {
            rounds.add(round);
        }

        let (Some(period), Some(amount)) = (non_blank(inv.period.as_ref()), inv.amount.as_ref()) else {
            continue;
        };
        let year: String = period.chars().take(4).collect();
        let slot = by_year.entry(year).or_insert((0.0, 0));
        slot.0 += amount.as_f64();
        slot.1 += 1;
    }

    InvestmentStats {
        round_distribution: rounds.into_sorted(),
        yearly_average_amount: by_year
            .into_iter()
            .map(|(year, (sum, count))| YearlyAmount {
                year,
                average_amount: round_nearest(sum / count as f64),
            })
            .collect(),
    }
}

#[derive(Default)]
struct YearSums {
    domestic: f64,
    overseas: f64,
    employees: f64,
    count: usize,
}

/// Per-year means of domestic revenue, overseas revenue and headcount, ascending by year.
pub fn financial_stats(financials: &[&FinancialRecord]) -> Vec<YearlyFinancials> {
    let mut by_year: BTreeMap<&str, YearSums> = BTreeMap::new();
    for record in financials {
        let sums = by_year.entry(record.year.trim()).or_default();
        sums.domestic += coerce(record.revenue_domestic.as_ref());
        sums.overseas += coerce(record.revenue_overseas.as_ref());
        sums.employees += coerce(record.employees.as_ref());
        sums.count += 1;
    }

    by_year
        .into_iter()
        .map(|(year, sums)| {
            let n = sums.count as f64;
            YearlyFinancials {
                year: year.to_string(),
                revenue_domestic: round_nearest(sums.domestic / n),
                revenue_overseas: round_nearest(sums.overseas / n),
                employees: round_nearest(sums.employees / n),
                record_count: sums.count,
            }
        })
        .collect()
}

/// Single-entity investment view: totals, latest valuation, investors per round
/// and position on the stage ladder.
pub fn summarize_investments(investments: &[&InvestmentRecord]) -> InvestmentSummary {
    let mut ordered: Vec<&InvestmentRecord> = investments.to_vec();
    ordered.sort_by(|a, b| {
        let left = a.period.as_deref().unwrap_or("");
        let right = b.period.as_deref().unwrap_or("");
        left.cmp(right)
    });

    let total_amount = ordered.iter().map(|inv| coerce(inv.amount.as_ref())).sum();

    let mut investors_by_round: Vec<RoundInvestors> = Vec::new();
    for inv in &ordered {
        let Some(round) = non_blank(inv.round.as_ref()) else {
            continue;
        };
        let position = match investors_by_round.iter().position(|r| r.round == round) {
            Some(index) => index,
            None => {
                investors_by_round.push(RoundInvestors {
                    round: round.to_string(),
                    investors: Vec::new(),
                });
                investors_by_round.len() - 1
            }
        };
        if let Some(investor) = non_blank(inv.investor.as_ref()) {
            let slot = &mut investors_by_round[position].investors;
            if !slot.iter().any(|existing| existing == investor) {
                slot.push(investor.to_string());
            }
        }
    }

    let latest = ordered
        .iter()
        .rev()
        .find(|inv| non_blank(inv.period.as_ref()).is_some())
        .copied();

    InvestmentSummary {
        total_amount,
        latest_pre_share: latest.map(|inv| coerce(inv.pre_share.as_ref())).unwrap_or(0.0),
        latest_post_share: latest.map(|inv| coerce(inv.post_share.as_ref())).unwrap_or(0.0),
        investors_by_round,
        current_stage_index: latest
            .and_then(|inv| non_blank(inv.round.as_ref()))
            .and_then(|round| INVESTMENT_STAGES.iter().position(|stage| *stage == round)),
    }
}

pub fn financial_rows(financials: &[&FinancialRecord]) -> Vec<FinancialRow> {
    let mut rows: Vec<FinancialRow> = financials
        .iter()
        .map(|record| {
            let domestic = coerce(record.revenue_domestic.as_ref());
            let overseas = coerce(record.revenue_overseas.as_ref());
            FinancialRow {
                year: record.year.clone(),
                revenue_domestic: domestic,
                revenue_overseas: overseas,
                total_revenue: domestic + overseas,
                employees: coerce(record.employees.as_ref()),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.year.cmp(&b.year));
    rows
}

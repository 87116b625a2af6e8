use super::distribution::{biz_type_distribution, region_distribution, support_needs_distribution};
use super::finance::{financial_stats, investment_stats};
use super::folder_tree::{entities_in_scope, FolderIndex};
use super::{round_nearest, round_one_decimal};
use crate::models::aggregation::{AggregationResult, CategoryScoreStats, LeaderboardEntry, RadarPoint};
use crate::models::analysis_record::AnalysisRecord;
use crate::models::config::EngineConfig;
use crate::models::entity::Entity;
use crate::models::finance::{FinancialRecord, InvestmentRecord};
use crate::models::folder::{Folder, ROOT_FOLDER_ID};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Snapshot the engine aggregates over. Detail rows may include entities outside
/// the scope; they are filtered by entity id.
#[derive(Debug, Clone, Default)]
pub struct AggregationInputs {
    pub folders: Vec<Folder>,
    pub entities: Vec<Entity>,
    pub investments: Vec<InvestmentRecord>,
    pub financials: Vec<FinancialRecord>,
    pub records: Vec<AnalysisRecord>,
}

/// Ids of the entities under `folder_id`, or `None` when the scope does not exist.
pub fn scope_entity_ids(folder_id: &str, folders: &[Folder], entities: &[Entity]) -> Option<Vec<String>> {
    let index = FolderIndex::new(folders);
    if !index.contains(folder_id) {
        return None;
    }
    let scope = index.subtree_ids(folder_id);
    Some(
        entities_in_scope(entities, &scope)
            .into_iter()
            .map(|e| e.id.clone())
            .collect(),
    )
}

pub fn scope_name(folder_id: &str, folders: &[Folder]) -> Option<String> {
    if folder_id == ROOT_FOLDER_ID {
        return None;
    }
    folders.iter().find(|f| f.id == folder_id).map(|f| f.name.clone())
}

pub fn aggregate(folder_id: &str, inputs: &AggregationInputs, config: &EngineConfig) -> AggregationResult {
    let index = FolderIndex::new(&inputs.folders);
    if !index.contains(folder_id) {
        log::warn!("Aggregation scope {folder_id} does not exist; returning empty result");
        return AggregationResult::empty(folder_id, None);
    }

    let name = scope_name(folder_id, &inputs.folders);
    let scope = index.subtree_ids(folder_id);
    let entities = entities_in_scope(&inputs.entities, &scope);
    if entities.is_empty() {
        log::info!("Scope {folder_id} has no entities");
        return AggregationResult::empty(folder_id, name);
    }

    let ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    let investments: Vec<&InvestmentRecord> = inputs
        .investments
        .iter()
        .filter(|inv| ids.contains(inv.entity_id.as_str()))
        .collect();
    let financials: Vec<&FinancialRecord> = inputs
        .financials
        .iter()
        .filter(|fin| ids.contains(fin.entity_id.as_str()))
        .collect();
    let records: Vec<&AnalysisRecord> = inputs
        .records
        .iter()
        .filter(|r| ids.contains(r.entity_id.as_str()))
        .collect();

    let company_names: HashMap<&str, &str> = entities
        .iter()
        .map(|e| (e.id.as_str(), e.company_name.as_str()))
        .collect();
    let (category_scores, leaderboard) = score_statistics(&records, &company_names);

    log::info!(
        "Aggregated scope {folder_id}: {} entities, {} analysis records, {} categories",
        entities.len(),
        records.len(),
        category_scores.len()
    );

    AggregationResult {
        scope_id: folder_id.to_string(),
        scope_name: name,
        entity_count: entities.len(),
        biz_type_distribution: biz_type_distribution(&entities, &config.unregistered_label),
        region_distribution: region_distribution(&entities, config.region_code_length, &config.unregistered_label),
        support_needs_distribution: support_needs_distribution(&entities),
        investment: investment_stats(&investments),
        financials: financial_stats(&financials),
        radar: category_scores
            .iter()
            .map(|c| RadarPoint {
                subject: c.category.clone(),
                group_score: c.mean_total_score,
            })
            .collect(),
        category_scores,
        leaderboard,
    }
}

#[derive(Default)]
struct CategoryAccumulator<'a> {
    total: i64,
    count: usize,
    questions: BTreeMap<&'a str, (i64, usize)>,
    leader: Option<(&'a str, i64)>,
}

/// Per-category means and leaders, categories in first-seen order. Leader ties
/// keep the first entity scanned.
pub fn score_statistics(
    records: &[&AnalysisRecord],
    company_names: &HashMap<&str, &str>,
) -> (Vec<CategoryScoreStats>, Vec<LeaderboardEntry>) {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, CategoryAccumulator> = HashMap::new();

    for record in records {
        let category = record.category.as_str();
        let acc = groups.entry(category).or_insert_with(|| {
            order.push(category);
            CategoryAccumulator::default()
        });

        acc.total += record.total_score;
        acc.count += 1;
        for (question, score) in &record.scores {
            let slot = acc.questions.entry(question.as_str()).or_insert((0, 0));
            slot.0 += score;
            slot.1 += 1;
        }

        let leads = match acc.leader {
            Some((_, best)) => record.total_score > best,
            None => true,
        };
        if leads {
            acc.leader = Some((record.entity_id.as_str(), record.total_score));
        }
    }

    let mut stats = Vec::with_capacity(order.len());
    let mut leaderboard = Vec::with_capacity(order.len());
    for category in order {
        let Some(acc) = groups.remove(category) else {
            continue;
        };

        if let Some((entity_id, score)) = acc.leader {
            leaderboard.push(LeaderboardEntry {
                category: category.to_string(),
                entity_id: entity_id.to_string(),
                company_name: company_names.get(entity_id).copied().unwrap_or("Unknown").to_string(),
                score,
            });
        }

        stats.push(CategoryScoreStats {
            category: category.to_string(),
            record_count: acc.count,
            mean_total_score: round_nearest(acc.total as f64 / acc.count as f64),
            question_means: acc
                .questions
                .into_iter()
                .map(|(question, (sum, n))| (question.to_string(), round_one_decimal(sum as f64 / n as f64)))
                .collect(),
        });
    }

    (stats, leaderboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis_record::Scores;

    fn folder(id: &str, parent: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: format!("{id} 폴더"),
            parent_id: parent.to_string(),
            sort_order: 0,
        }
    }

    fn entity(id: &str, parent: &str) -> Entity {
        Entity {
            id: id.to_string(),
            parent_id: parent.to_string(),
            company_name: format!("{id} 주식회사"),
            ..Entity::default()
        }
    }

    fn record(entity_id: &str, category: &str, scores: &[(&str, i64)]) -> AnalysisRecord {
        let scores: Scores = scores.iter().map(|(q, s)| (q.to_string(), *s)).collect();
        AnalysisRecord {
            entity_id: entity_id.to_string(),
            category: category.to_string(),
            folder_id: "a".to_string(),
            total_score: scores.values().sum(),
            scores,
            comment: String::new(),
            extra_questions: Vec::new(),
            updated_at: 0,
        }
    }

    fn inputs() -> AggregationInputs {
        AggregationInputs {
            folders: vec![folder("a", "root"), folder("b", "a"), folder("z", "root")],
            entities: vec![entity("E1", "b"), entity("E2", "a"), entity("E9", "z")],
            records: vec![
                record("E1", "사업성", &[("biz_1", 8), ("biz_2", 6), ("biz_3", 7), ("biz_4", 5), ("biz_5", 9)]),
                record("E2", "사업성", &[("biz_1", 4), ("biz_2", 4), ("biz_3", 4), ("biz_4", 4), ("biz_5", 4)]),
            ],
            ..AggregationInputs::default()
        }
    }

    #[test]
    fn group_mean_rounds_and_leader_is_top_scorer() {
        let result = aggregate("a", &inputs(), &EngineConfig::default());
        assert_eq!(result.entity_count, 2);
        assert_eq!(result.mean_for("사업성"), Some(28));
        let leader = result.leader("사업성").unwrap();
        assert_eq!(leader.entity_id, "E1");
        assert_eq!(leader.score, 35);
        assert_eq!(leader.company_name, "E1 주식회사");
        assert_eq!(
            result.radar,
            vec![RadarPoint {
                subject: "사업성".to_string(),
                group_score: 28
            }]
        );
    }

    #[test]
    fn out_of_scope_records_do_not_change_means() {
        let mut with_outsider = inputs();
        with_outsider
            .records
            .push(record("E9", "사업성", &[("biz_1", 10), ("biz_2", 10)]));
        let config = EngineConfig::default();
        assert_eq!(
            aggregate("a", &with_outsider, &config).category_scores,
            aggregate("a", &inputs(), &config).category_scores
        );
    }

    #[test]
    fn question_mean_uses_only_reporting_records() {
        let records = [
            record("E1", "팀역량", &[("team_1", 7), ("team_2", 4)]),
            record("E2", "팀역량", &[("team_1", 8)]),
        ];
        let refs: Vec<&AnalysisRecord> = records.iter().collect();
        let (stats, _) = score_statistics(&refs, &HashMap::new());
        assert_eq!(stats[0].question_means["team_1"], 7.5);
        assert_eq!(stats[0].question_means["team_2"], 4.0);
    }

    #[test]
    fn leader_ties_keep_first_seen_entity() {
        let records = [
            record("E1", "기술성", &[("tech_1", 5)]),
            record("E2", "기술성", &[("tech_1", 5)]),
        ];
        let refs: Vec<&AnalysisRecord> = records.iter().collect();
        let (_, leaders) = score_statistics(&refs, &HashMap::new());
        assert_eq!(leaders[0].entity_id, "E1");
        assert_eq!(leaders[0].company_name, "Unknown");
    }

    #[test]
    fn empty_scope_is_terminal_not_error() {
        let mut data = inputs();
        data.folders.push(folder("empty", "root"));
        let result = aggregate("empty", &data, &EngineConfig::default());
        assert_eq!(result.entity_count, 0);
        assert_eq!(result.scope_name.as_deref(), Some("empty 폴더"));
        assert!(result.biz_type_distribution.is_empty());
        assert!(result.category_scores.is_empty());
    }

    #[test]
    fn missing_scope_yields_empty_result() {
        let result = aggregate("ghost", &inputs(), &EngineConfig::default());
        assert_eq!(result.entity_count, 0);
        assert!(result.scope_name.is_none());
        assert_eq!(scope_entity_ids("ghost", &inputs().folders, &inputs().entities), None);
    }

    #[test]
    fn root_scope_covers_all_entities() {
        let data = inputs();
        let ids = scope_entity_ids("root", &data.folders, &data.entities).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(aggregate("root", &data, &EngineConfig::default()).entity_count, 3);
    }
}

use super::aggregate::score_statistics;
use crate::models::analysis_record::AnalysisRecord;
use crate::models::config::EngineConfig;
use crate::models::entity::Entity;
use crate::models::report::{ComparisonRow, DetailCard, QuestionScore};
use std::collections::{HashMap, HashSet};

/// Per-category mean `total_score` over the entities placed directly in
/// `folder_id`. Entities in subfolders are not part of the group.
pub fn folder_group_means(
    folder_id: &str,
    entities: &[Entity],
    records: &[AnalysisRecord],
) -> HashMap<String, i64> {
    let members: HashMap<&str, &str> = entities
        .iter()
        .filter(|e| e.parent_id == folder_id)
        .map(|e| (e.id.as_str(), e.company_name.as_str()))
        .collect();
    let group: Vec<&AnalysisRecord> = records
        .iter()
        .filter(|r| members.contains_key(r.entity_id.as_str()))
        .collect();

    let (stats, _) = score_statistics(&group, &members);
    stats
        .into_iter()
        .map(|s| (s.category, s.mean_total_score))
        .collect()
}

/// One row per category the entity has been scored in. Categories without group
/// data compare against 0.
pub fn build_comparison(
    entity_id: &str,
    own_records: &[AnalysisRecord],
    group_means: &HashMap<String, i64>,
) -> Vec<ComparisonRow> {
    own_records
        .iter()
        .filter(|r| r.entity_id == entity_id)
        .map(|r| ComparisonRow {
            category: r.category.clone(),
            own_score: r.total_score,
            group_mean: group_means.get(&r.category).copied().unwrap_or(0),
            comment: r.comment.clone(),
        })
        .collect()
}

/// Scores laid out against each record's question snapshot. Questions appear in
/// snapshot order; scored ids missing from the snapshot follow in id order.
pub fn build_detail_cards(own_records: &[AnalysisRecord], config: &EngineConfig) -> Vec<DetailCard> {
    own_records
        .iter()
        .map(|record| {
            let mut placed: HashSet<&str> = HashSet::new();
            let mut per_question = Vec::with_capacity(record.scores.len());

            for question in &record.extra_questions {
                let Some(score) = record.scores.get(&question.id) else {
                    continue;
                };
                if !placed.insert(question.id.as_str()) {
                    continue;
                }
                per_question.push(QuestionScore {
                    question_id: question.id.clone(),
                    label: question_label(record, &question.id, config),
                    score: *score,
                });
            }

            for (question_id, score) in &record.scores {
                if placed.contains(question_id.as_str()) {
                    continue;
                }
                per_question.push(QuestionScore {
                    question_id: question_id.clone(),
                    label: question_label(record, question_id, config),
                    score: *score,
                });
            }

            DetailCard {
                category: record.category.clone(),
                total_score: record.total_score,
                per_question,
            }
        })
        .collect()
}

/// Custom label from the snapshot, then the static label table, then the id itself.
fn question_label(record: &AnalysisRecord, question_id: &str, config: &EngineConfig) -> String {
    record
        .extra_questions
        .iter()
        .find(|q| q.id == question_id && !q.label.trim().is_empty())
        .map(|q| q.label.clone())
        .or_else(|| config.question_labels.get(question_id).cloned())
        .unwrap_or_else(|| question_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rubric::Question;
    use std::collections::BTreeMap;

    fn record(category: &str, scores: &[(&str, i64)], questions: Vec<Question>) -> AnalysisRecord {
        scored("E1", category, scores, questions)
    }

    fn scored(entity_id: &str, category: &str, scores: &[(&str, i64)], questions: Vec<Question>) -> AnalysisRecord {
        let scores: BTreeMap<String, i64> = scores.iter().map(|(q, s)| (q.to_string(), *s)).collect();
        AnalysisRecord {
            entity_id: entity_id.to_string(),
            category: category.to_string(),
            folder_id: "B".to_string(),
            total_score: scores.values().sum(),
            scores,
            comment: format!("{category} 의견"),
            extra_questions: questions,
            updated_at: 0,
        }
    }

    fn question(id: &str, label: &str) -> Question {
        Question {
            id: id.to_string(),
            label: label.to_string(),
            guide: String::new(),
            is_extra: true,
        }
    }

    fn member(id: &str, parent: &str) -> Entity {
        Entity {
            id: id.to_string(),
            parent_id: parent.to_string(),
            ..Entity::default()
        }
    }

    #[test]
    fn group_means_cover_direct_folder_members_only() {
        let entities = vec![member("E1", "A"), member("E2", "B"), member("E3", "A")];
        let records = vec![
            scored("E1", "사업성", &[("biz_1", 10)], vec![]),
            scored("E2", "사업성", &[("biz_1", 0)], vec![]),
            scored("E3", "사업성", &[("biz_1", 5)], vec![]),
        ];
        let means = folder_group_means("A", &entities, &records);
        assert_eq!(means.get("사업성"), Some(&8));
        assert!(folder_group_means("empty", &entities, &records).is_empty());
    }

    #[test]
    fn comparison_defaults_missing_group_mean_to_zero() {
        let records = vec![
            record("사업성", &[("biz_1", 8)], vec![]),
            record("ESG", &[("p1", 3)], vec![]),
        ];
        let means = HashMap::from([("사업성".to_string(), 6)]);
        let rows = build_comparison("E1", &records, &means);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group_mean, 6);
        assert_eq!(rows[0].comment, "사업성 의견");
        assert_eq!(rows[1].group_mean, 0);
        assert!(build_comparison("E2", &records, &means).is_empty());
    }

    #[test]
    fn detail_labels_prefer_snapshot_then_static_table() {
        let config = EngineConfig::default();
        let records = vec![record(
            "사업성",
            &[("biz_1", 8), ("biz_2", 6), ("zz_unknown", 1)],
            vec![question("biz_2", "수익 구조"), question("biz_1", "")],
        )];
        let cards = build_detail_cards(&records, &config);
        let labels: Vec<(&str, &str)> = cards[0]
            .per_question
            .iter()
            .map(|q| (q.question_id.as_str(), q.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("biz_2", "수익 구조"), ("biz_1", "BM 고도화"), ("zz_unknown", "zz_unknown")]
        );
        assert_eq!(cards[0].total_score, 15);
    }

    #[test]
    fn substitute_label_table_is_honoured() {
        let mut config = EngineConfig::default();
        config.question_labels = BTreeMap::from([("biz_1".to_string(), "Business model".to_string())]);
        let cards = build_detail_cards(&[record("사업성", &[("biz_1", 8)], vec![])], &config);
        assert_eq!(cards[0].per_question[0].label, "Business model");
    }
}

use async_trait::async_trait;
use scopelens_lib::analysis::folder_tree::{format_path, resolve_subtree_ids};
use scopelens_lib::commands::aggregation::{aggregate_scope, aggregate_scope_cached};
use scopelens_lib::commands::analysis::{load_rubric, load_rubric_for_entity, save_analysis, save_analysis_checked};
use scopelens_lib::commands::db::SqliteStore;
use scopelens_lib::commands::report::{build_entity_report, save_report_details};
use scopelens_lib::commands::settings::{get_settings, load_engine_config, save_settings};
use scopelens_lib::commands::store::RecordStore;
use scopelens_lib::models::aggregation::AggregationCache;
use scopelens_lib::models::analysis_record::{AnalysisRecord, RecordFilter};
use scopelens_lib::models::config::EngineConfig;
use scopelens_lib::models::entity::Entity;
use scopelens_lib::models::finance::{FinancialRecord, InvestmentRecord, NumericField};
use scopelens_lib::models::folder::{Folder, ROOT_FOLDER_ID};
use scopelens_lib::models::report::ReportDetails;
use scopelens_lib::models::rubric::QuestionField;
use scopelens_lib::Error;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn create_workspace() -> (TempDir, SqliteStore) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let workspace_path = temp_dir.path().to_string_lossy().to_string();
    let store = SqliteStore::open(&workspace_path).expect("open store");
    (temp_dir, store)
}

fn add_entity(store: &SqliteStore, id: &str, folder_id: &str, address: &str) -> Entity {
    store
        .insert_entity(&Entity {
            id: id.to_string(),
            parent_id: folder_id.to_string(),
            company_name: format!("{id} Corp"),
            biz_type: Some("법인".to_string()),
            company_address: Some(address.to_string()),
            support_needs: vec!["투자유치".to_string()],
            ..Entity::default()
        })
        .expect("insert entity")
}

async fn score(store: &SqliteStore, entity_id: &str, category: &str, values: &[(&str, i64)]) -> AnalysisRecord {
    let config = EngineConfig::default();
    let mut session = load_rubric_for_entity(store, entity_id, category, &config)
        .await
        .expect("load session");
    for (question, value) in values {
        session.draft.set_score(question, *value);
    }
    save_analysis(store, session.draft, &session.rubric)
        .await
        .expect("save analysis")
}

const BUSINESS_SCORES: [(&str, i64); 5] = [("biz_1", 8), ("biz_2", 6), ("biz_3", 7), ("biz_4", 5), ("biz_5", 9)];

#[tokio::test]
async fn nested_folder_scope_resolves_entities() {
    let (_tmp, store) = create_workspace();
    let a = store.create_folder("2024", ROOT_FOLDER_ID).expect("folder A");
    let b = store.create_folder("Batch A", &a.id).expect("folder B");
    let other = store.create_folder("2023", ROOT_FOLDER_ID).expect("other folder");
    add_entity(&store, "E1", &b.id, "서울특별시 강남구");

    let folders = store.list_folders().await.expect("folders");
    let expected: std::collections::BTreeSet<String> = [a.id.clone(), b.id.clone()].into_iter().collect();
    assert_eq!(resolve_subtree_ids(&a.id, &folders), expected);
    assert_eq!(format_path(&b.id, &folders).as_deref(), Some("ROOT / 2024 / Batch A"));

    let config = EngineConfig::default();
    let scoped = aggregate_scope(&store, &a.id, &config).await.expect("aggregate A");
    assert_eq!(scoped.entity_count, 1);
    assert_eq!(scoped.scope_name.as_deref(), Some("2024"));
    assert_eq!(scoped.region_distribution[0].label, "서울");

    let elsewhere = aggregate_scope(&store, &other.id, &config).await.expect("aggregate other");
    assert_eq!(elsewhere.entity_count, 0);
}

#[tokio::test]
async fn business_scores_save_with_total_and_reopen() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "부산광역시");

    let record = score(&store, "E1", "사업성", &BUSINESS_SCORES).await;
    assert_eq!(record.total_score, 35);
    assert_eq!(record.extra_questions.len(), 5);
    assert_eq!(record.folder_id, folder.id);

    let reopened = load_rubric_for_entity(&store, "E1", "사업성", &EngineConfig::default())
        .await
        .expect("reopen");
    assert_eq!(reopened.draft.total_score(), 35);
    assert_eq!(reopened.saved_at, Some(record.updated_at));
}

#[tokio::test]
async fn group_mean_rounds_and_leader_is_top_scorer() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    let outside = store.create_folder("Elsewhere", ROOT_FOLDER_ID).expect("outside");
    add_entity(&store, "E1", &folder.id, "서울");
    add_entity(&store, "E2", &folder.id, "대전");
    add_entity(&store, "E3", &outside.id, "광주");

    score(&store, "E1", "사업성", &BUSINESS_SCORES).await;
    score(&store, "E2", "사업성", &[("biz_1", 4), ("biz_2", 4), ("biz_3", 4), ("biz_4", 4), ("biz_5", 4)]).await;

    let config = EngineConfig::default();
    let before = aggregate_scope(&store, &folder.id, &config).await.expect("aggregate");
    assert_eq!(before.mean_for("사업성"), Some(28));
    let leader = before.leader("사업성").expect("leader");
    assert_eq!(leader.entity_id, "E1");
    assert_eq!(leader.score, 35);

    score(&store, "E3", "사업성", &[("biz_1", 0)]).await;
    let after = aggregate_scope(&store, &folder.id, &config).await.expect("aggregate again");
    assert_eq!(after.mean_for("사업성"), Some(28));
    assert_eq!(after.entity_count, 2);
}

#[tokio::test]
async fn yearly_investment_average_uses_period_year() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");

    for (period, amount) in [("2023-04", 1000.0), ("2023-11", 2000.0)] {
        store
            .insert_investment(&InvestmentRecord {
                entity_id: "E1".to_string(),
                period: Some(period.to_string()),
                round: Some("Seed".to_string()),
                investor: Some("Alpha".to_string()),
                amount: Some(NumericField::Number(amount)),
                ..InvestmentRecord::default()
            })
            .expect("insert investment");
    }

    let result = aggregate_scope(&store, &folder.id, &EngineConfig::default())
        .await
        .expect("aggregate");
    assert_eq!(result.investment.yearly_average_amount.len(), 1);
    assert_eq!(result.investment.yearly_average_amount[0].year, "2023");
    assert_eq!(result.investment.yearly_average_amount[0].average_amount, 1500);
    assert_eq!(result.investment.round_distribution[0].count, 2);
}

#[tokio::test]
async fn duplicate_custom_category_leaves_rubric_unchanged() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");

    let config = EngineConfig::default();
    let mut session = load_rubric_for_entity(&store, "E1", "사업성", &config)
        .await
        .expect("session");
    let before = session.rubric.clone();

    let err = session
        .rubric
        .add_custom_category("사업성", &config)
        .expect_err("duplicate must fail");
    assert!(matches!(err, Error::DuplicateCategory(name) if name == "사업성"));
    assert_eq!(session.rubric, before);
}

#[tokio::test]
async fn custom_category_snapshot_becomes_folder_rubric() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");
    add_entity(&store, "E2", &folder.id, "서울");

    let config = EngineConfig::default();
    let mut session = load_rubric_for_entity(&store, "E1", "ESG", &config)
        .await
        .expect("session");
    session.rubric.add_custom_category("ESG", &config).expect("add category");
    let first_id = session.rubric.questions("ESG")[0].id.clone();
    session.rubric = session
        .rubric
        .with_question_text("ESG", &first_id, QuestionField::Label, "탄소 감축 계획");
    session.draft.set_score(&first_id, 7);
    save_analysis(&store, session.draft, &session.rubric)
        .await
        .expect("save");

    let rubric = load_rubric(&store, &folder.id, &config).await.expect("rubric");
    assert_eq!(rubric.custom_names(), vec!["ESG".to_string()]);
    assert_eq!(rubric.questions("ESG").len(), config.custom_question_count);
    assert_eq!(rubric.questions("ESG")[0].label, "탄소 감축 계획");

    let other = load_rubric_for_entity(&store, "E2", "ESG", &config).await.expect("E2 session");
    assert_eq!(other.rubric, rubric);
    assert!(other.saved_at.is_none());
}

#[tokio::test]
async fn empty_and_missing_scopes_return_empty_results() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Empty", ROOT_FOLDER_ID).expect("folder");
    let config = EngineConfig::default();

    let empty = aggregate_scope(&store, &folder.id, &config).await.expect("empty scope");
    assert_eq!(empty.entity_count, 0);
    assert!(empty.biz_type_distribution.is_empty());
    assert!(empty.category_scores.is_empty());
    assert_eq!(empty.scope_name.as_deref(), Some("Empty"));

    let missing = aggregate_scope(&store, "ghost", &config).await.expect("missing scope");
    assert_eq!(missing.entity_count, 0);
    assert!(missing.scope_name.is_none());
}

#[tokio::test]
async fn checked_save_rejects_stale_session() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");
    let config = EngineConfig::default();

    let stale = load_rubric_for_entity(&store, "E1", "기술성", &config)
        .await
        .expect("stale session");
    score(&store, "E1", "기술성", &[("tech_1", 9)]).await;

    let err = save_analysis_checked(&store, stale).await.expect_err("stale save");
    assert!(matches!(err, Error::ConflictDetected { .. }));

    let fresh = load_rubric_for_entity(&store, "E1", "기술성", &config)
        .await
        .expect("fresh session");
    save_analysis_checked(&store, fresh).await.expect("fresh save");
}

#[tokio::test]
async fn entity_report_combines_scores_investments_and_details() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");
    add_entity(&store, "E2", &folder.id, "서울");
    score(&store, "E1", "사업성", &BUSINESS_SCORES).await;
    score(&store, "E2", "사업성", &[("biz_1", 10), ("biz_2", 10)]).await;

    for (period, round, investor, amount, post) in [
        ("2022-03", "Seed", "Alpha", 500.0, 3000.0),
        ("2023-06", "Pre-A", "Beta", 1500.0, 9000.0),
        ("2023-09", "Pre-A", "Beta", 500.0, 12000.0),
    ] {
        store
            .insert_investment(&InvestmentRecord {
                entity_id: "E1".to_string(),
                period: Some(period.to_string()),
                round: Some(round.to_string()),
                investor: Some(investor.to_string()),
                amount: Some(NumericField::Number(amount)),
                pre_share: None,
                post_share: Some(NumericField::Number(post)),
            })
            .expect("insert investment");
    }
    store
        .insert_financial(&FinancialRecord {
            entity_id: "E1".to_string(),
            year: "2023".to_string(),
            revenue_domestic: Some(NumericField::Text("1,200".to_string())),
            revenue_overseas: Some(NumericField::Number(300.0)),
            employees: Some(NumericField::Number(12.0)),
        })
        .expect("insert financial");

    let mut details = ReportDetails::blank("E1");
    details.invest_comment = "Series A 준비 중".to_string();
    save_report_details(&store, details).await.expect("save details");

    let report = build_entity_report(&store, "E1", &EngineConfig::default())
        .await
        .expect("report");

    assert_eq!(report.scope_id, folder.id);
    assert_eq!(report.comparison.len(), 1);
    assert_eq!(report.comparison[0].own_score, 35);
    assert_eq!(report.comparison[0].group_mean, 28);
    assert_eq!(report.detail_cards[0].per_question.len(), 5);
    assert_eq!(report.detail_cards[0].per_question[0].question_id, "biz_1");

    assert_eq!(report.investment.total_amount, 2500.0);
    assert_eq!(report.investment.latest_post_share, 12000.0);
    assert_eq!(report.investment.current_stage_index, Some(1));
    assert_eq!(report.investment.investors_by_round.len(), 2);
    assert_eq!(report.investment.investors_by_round[1].investors, vec!["Beta".to_string()]);

    assert_eq!(report.financials[0].total_revenue, 1500.0);
    assert_eq!(report.details.invest_comment, "Series A 준비 중");
    assert_eq!(report.details.plans.len(), 3);

    let missing = build_entity_report(&store, "nobody", &EngineConfig::default()).await;
    assert!(matches!(missing, Err(Error::EntityNotFound(_))));
}

#[tokio::test]
async fn report_group_excludes_subfolder_entities() {
    let (_tmp, store) = create_workspace();
    let parent = store.create_folder("2024", ROOT_FOLDER_ID).expect("parent folder");
    let child = store.create_folder("Batch A", &parent.id).expect("child folder");
    add_entity(&store, "E1", &parent.id, "서울");
    add_entity(&store, "E2", &child.id, "서울");
    score(&store, "E1", "사업성", &[("biz_1", 10)]).await;
    score(&store, "E2", "사업성", &[("biz_1", 0)]).await;

    let report = build_entity_report(&store, "E1", &EngineConfig::default())
        .await
        .expect("report");
    assert_eq!(report.comparison[0].own_score, 10);
    assert_eq!(report.comparison[0].group_mean, 10);

    let nested = build_entity_report(&store, "E2", &EngineConfig::default())
        .await
        .expect("nested report");
    assert_eq!(nested.comparison[0].group_mean, 0);
}

/// Store wrapper that registers a newer aggregation request while the first one is in flight.
struct InterruptingStore {
    inner: SqliteStore,
    cache: Arc<Mutex<AggregationCache>>,
    next_scope: String,
}

#[async_trait]
impl RecordStore for InterruptingStore {
    async fn list_folders(&self) -> scopelens_lib::Result<Vec<Folder>> {
        self.cache.lock().expect("cache lock").begin(&self.next_scope);
        self.inner.list_folders().await
    }

    async fn list_entities(&self) -> scopelens_lib::Result<Vec<Entity>> {
        self.inner.list_entities().await
    }

    async fn list_analysis_records(&self, filter: &RecordFilter) -> scopelens_lib::Result<Vec<AnalysisRecord>> {
        self.inner.list_analysis_records(filter).await
    }

    async fn list_investments(&self, entity_ids: &[String]) -> scopelens_lib::Result<Vec<InvestmentRecord>> {
        self.inner.list_investments(entity_ids).await
    }

    async fn list_financials(&self, entity_ids: &[String]) -> scopelens_lib::Result<Vec<FinancialRecord>> {
        self.inner.list_financials(entity_ids).await
    }

    async fn upsert_analysis_record(&self, record: &AnalysisRecord) -> scopelens_lib::Result<()> {
        self.inner.upsert_analysis_record(record).await
    }

    async fn upsert_analysis_record_if_unchanged(
        &self,
        record: &AnalysisRecord,
        expected_updated_at: Option<i64>,
    ) -> scopelens_lib::Result<()> {
        self.inner
            .upsert_analysis_record_if_unchanged(record, expected_updated_at)
            .await
    }
}

#[tokio::test]
async fn superseded_aggregation_is_discarded() {
    let (_tmp, store) = create_workspace();
    let folder = store.create_folder("Batch", ROOT_FOLDER_ID).expect("folder");
    add_entity(&store, "E1", &folder.id, "서울");

    let cache = Arc::new(Mutex::new(AggregationCache::default()));
    let config = EngineConfig::default();

    let interrupting = InterruptingStore {
        inner: store,
        cache: cache.clone(),
        next_scope: ROOT_FOLDER_ID.to_string(),
    };
    let stale = aggregate_scope_cached(&interrupting, &cache, &folder.id, &config)
        .await
        .expect("stale aggregation");
    assert!(stale.is_none());
    assert!(cache.lock().expect("cache lock").current().is_none());

    let fresh = aggregate_scope_cached(&interrupting.inner, &cache, &folder.id, &config)
        .await
        .expect("fresh aggregation")
        .expect("current result");
    assert_eq!(fresh.entity_count, 1);
    assert_eq!(
        cache.lock().expect("cache lock").current().map(|r| r.scope_id.clone()),
        Some(folder.id.clone())
    );
}

#[tokio::test]
async fn settings_round_trip_feeds_engine_config() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let workspace_path = temp_dir.path().to_string_lossy().to_string();

    let initial = get_settings(workspace_path.clone()).await.expect("load settings");
    assert_eq!(initial["maxQuestionScore"], json!(10));
    assert!(temp_dir.path().join(".scopelens").join("settings.json").exists());

    let saved = save_settings(
        workspace_path.clone(),
        json!({
            "regionCodeLength": 3,
            "unregisteredLabel": "없음",
            "questionLabels": { "mkt_1": "성장률" }
        }),
    )
    .await
    .expect("save settings");
    assert_eq!(saved["regionCodeLength"], json!(3));
    assert_eq!(saved["customQuestionCount"], json!(5));

    let config = load_engine_config(&workspace_path).expect("engine config");
    assert_eq!(config.region_code_length, 3);
    assert_eq!(config.unregistered_label, "없음");
    assert_eq!(config.question_labels.get("mkt_1").map(String::as_str), Some("성장률"));
}

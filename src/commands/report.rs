use crate::analysis::finance::{financial_rows, summarize_investments};
use crate::analysis::report::{build_comparison, build_detail_cards, folder_group_means};
use crate::commands::analysis::find_entity;
use crate::commands::db::SqliteStore;
use crate::commands::store::RecordStore;
use crate::error::{Error, Result};
use crate::models::analysis_record::{AnalysisRecord, RecordFilter};
use crate::models::config::EngineConfig;
use crate::models::report::{EntityReport, ReportDetails};

/// Report for one entity, compared against the entities placed directly in its folder.
pub async fn assemble_entity_report<S: RecordStore + ?Sized>(
    store: &S,
    entity_id: &str,
    config: &EngineConfig,
    details: Option<ReportDetails>,
) -> Result<EntityReport> {
    let entities = store.list_entities().await?;
    let entity = entities
        .iter()
        .find(|e| e.id == entity_id)
        .cloned()
        .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;

    let member_ids: Vec<String> = entities
        .iter()
        .filter(|e| e.parent_id == entity.parent_id)
        .map(|e| e.id.clone())
        .collect();
    let ids = vec![entity.id.clone()];
    let group_filter = RecordFilter::for_entities(member_ids);
    let (group_records, investments, financials) = tokio::try_join!(
        store.list_analysis_records(&group_filter),
        store.list_investments(&ids),
        store.list_financials(&ids),
    )?;

    let own_records: Vec<AnalysisRecord> = group_records
        .iter()
        .filter(|r| r.entity_id == entity.id)
        .cloned()
        .collect();
    let group_means = folder_group_means(&entity.parent_id, &entities, &group_records);
    let investments: Vec<_> = investments.iter().collect();
    let financials: Vec<_> = financials.iter().collect();

    log::debug!(
        "Assembled report for {entity_id}: {} categories scored against folder {} ({} group records)",
        own_records.len(),
        entity.parent_id,
        group_records.len()
    );

    Ok(EntityReport {
        entity_id: entity.id.clone(),
        company_name: entity.company_name.clone(),
        scope_id: entity.parent_id.clone(),
        comparison: build_comparison(&entity.id, &own_records, &group_means),
        detail_cards: build_detail_cards(&own_records, config),
        investment: summarize_investments(&investments),
        financials: financial_rows(&financials),
        details: details.unwrap_or_else(|| ReportDetails::blank(&entity.id)),
    })
}

pub async fn build_entity_report(store: &SqliteStore, entity_id: &str, config: &EngineConfig) -> Result<EntityReport> {
    let details = store.load_report_details(entity_id)?;
    assemble_entity_report(store, entity_id, config, details).await
}

pub async fn save_report_details(store: &SqliteStore, mut details: ReportDetails) -> Result<ReportDetails> {
    find_entity(store, &details.entity_id).await?;
    details.updated_at = chrono::Utc::now().timestamp_millis();
    store.upsert_report_details(&details)?;
    Ok(details)
}

use crate::analysis::aggregate::{aggregate, scope_entity_ids, scope_name, AggregationInputs};
use crate::commands::store::RecordStore;
use crate::error::{Error, Result};
use crate::models::aggregation::{AggregationCache, AggregationResult};
use crate::models::analysis_record::RecordFilter;
use crate::models::config::EngineConfig;
use std::sync::{Arc, Mutex};

/// Aggregates every entity under `folder_id` (root = all). A missing or empty scope
/// yields an empty result; store failures propagate.
pub async fn aggregate_scope<S: RecordStore + ?Sized>(
    store: &S,
    folder_id: &str,
    config: &EngineConfig,
) -> Result<AggregationResult> {
    let (folders, entities) = tokio::try_join!(store.list_folders(), store.list_entities())?;

    let Some(entity_ids) = scope_entity_ids(folder_id, &folders, &entities) else {
        log::warn!("Aggregation scope {folder_id} does not exist; returning empty result");
        return Ok(AggregationResult::empty(folder_id, None));
    };
    log::debug!("Scope {folder_id} resolved to {} entities", entity_ids.len());
    if entity_ids.is_empty() {
        return Ok(AggregationResult::empty(folder_id, scope_name(folder_id, &folders)));
    }

    let filter = RecordFilter::for_entities(entity_ids.clone());
    let (investments, financials, records) = tokio::try_join!(
        store.list_investments(&entity_ids),
        store.list_financials(&entity_ids),
        store.list_analysis_records(&filter),
    )?;

    let inputs = AggregationInputs {
        folders,
        entities,
        investments,
        financials,
        records,
    };
    Ok(aggregate(folder_id, &inputs, config))
}

/// Like [`aggregate_scope`], but only the most recently requested scope is installed
/// in `cache`. Returns `Ok(None)` when a newer request superseded this one.
pub async fn aggregate_scope_cached<S: RecordStore + ?Sized>(
    store: &S,
    cache: &Arc<Mutex<AggregationCache>>,
    folder_id: &str,
    config: &EngineConfig,
) -> Result<Option<AggregationResult>> {
    let ticket = {
        let mut guard = cache
            .lock()
            .map_err(|_| Error::Store("aggregation cache lock poisoned".into()))?;
        guard.begin(folder_id)
    };

    let result = aggregate_scope(store, folder_id, config).await?;

    let mut guard = cache
        .lock()
        .map_err(|_| Error::Store("aggregation cache lock poisoned".into()))?;
    if guard.complete(ticket, &result) {
        Ok(Some(result))
    } else {
        log::debug!("Discarding superseded aggregation for {folder_id}");
        Ok(None)
    }
}

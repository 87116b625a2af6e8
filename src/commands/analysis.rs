use crate::analysis::rubric::load_effective_rubric;
use crate::analysis::scoring::ScoreDraft;
use crate::commands::store::RecordStore;
use crate::error::{Error, Result};
use crate::models::analysis_record::{AnalysisRecord, RecordFilter};
use crate::models::config::EngineConfig;
use crate::models::entity::Entity;
use crate::models::rubric::Rubric;

/// What the scoring screen works on: the folder's rubric and one entity's draft.
#[derive(Debug, Clone)]
pub struct RubricSession {
    pub rubric: Rubric,
    pub draft: ScoreDraft,
    /// `updated_at` of the stored record the draft was opened from.
    pub saved_at: Option<i64>,
}

pub async fn load_rubric<S: RecordStore + ?Sized>(
    store: &S,
    folder_id: &str,
    config: &EngineConfig,
) -> Result<Rubric> {
    let records = store
        .list_analysis_records(&RecordFilter::for_folder(folder_id))
        .await?;
    Ok(load_effective_rubric(folder_id, &records, config))
}

pub(crate) async fn find_entity<S: RecordStore + ?Sized>(store: &S, entity_id: &str) -> Result<Entity> {
    store
        .list_entities()
        .await?
        .into_iter()
        .find(|e| e.id == entity_id)
        .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))
}

/// Rubric of the entity's parent folder plus the entity's draft for `category`,
/// re-opened from the saved record when one exists.
pub async fn load_rubric_for_entity<S: RecordStore + ?Sized>(
    store: &S,
    entity_id: &str,
    category: &str,
    config: &EngineConfig,
) -> Result<RubricSession> {
    let entity = find_entity(store, entity_id).await?;
    let rubric = load_rubric(store, &entity.parent_id, config).await?;

    let filter = RecordFilter::for_entities(vec![entity.id.clone()]).with_category(category);
    let saved = store.list_analysis_records(&filter).await?.into_iter().next();

    let (draft, saved_at) = match saved {
        Some(record) => {
            let mut draft = ScoreDraft::from_record(&record, config.max_score);
            draft.folder_id = entity.parent_id.clone();
            (draft, Some(record.updated_at))
        }
        None => (
            ScoreDraft::new(&entity.id, &entity.parent_id, category, config.max_score),
            None,
        ),
    };

    Ok(RubricSession {
        rubric,
        draft,
        saved_at,
    })
}

fn draft_to_record(draft: ScoreDraft, rubric: &Rubric) -> AnalysisRecord {
    let questions = rubric.questions(&draft.category).to_vec();
    draft.into_record(&questions, chrono::Utc::now().timestamp_millis())
}

/// Saves the draft with the rubric's current question set for its category.
/// Concurrent saves of the same key: last writer wins.
pub async fn save_analysis<S: RecordStore + ?Sized>(
    store: &S,
    draft: ScoreDraft,
    rubric: &Rubric,
) -> Result<AnalysisRecord> {
    let record = draft_to_record(draft, rubric);
    store.upsert_analysis_record(&record).await?;
    log::info!(
        "Saved {} analysis for {} (total {})",
        record.category,
        record.entity_id,
        record.total_score
    );
    Ok(record)
}

/// Saves the session's draft only if nobody saved the same record since it was opened.
pub async fn save_analysis_checked<S: RecordStore + ?Sized>(
    store: &S,
    session: RubricSession,
) -> Result<AnalysisRecord> {
    let record = draft_to_record(session.draft, &session.rubric);
    store
        .upsert_analysis_record_if_unchanged(&record, session.saved_at)
        .await?;
    Ok(record)
}

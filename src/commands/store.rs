use crate::error::Result;
use crate::models::analysis_record::{AnalysisRecord, RecordFilter};
use crate::models::entity::Entity;
use crate::models::finance::{FinancialRecord, InvestmentRecord};
use crate::models::folder::Folder;
use async_trait::async_trait;

/// Persistence collaborator the engine reads from and saves analysis records to.
/// Every read returns the full matching set.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<Folder>>;

    async fn list_entities(&self) -> Result<Vec<Entity>>;

    async fn list_analysis_records(&self, filter: &RecordFilter) -> Result<Vec<AnalysisRecord>>;

    async fn list_investments(&self, entity_ids: &[String]) -> Result<Vec<InvestmentRecord>>;

    async fn list_financials(&self, entity_ids: &[String]) -> Result<Vec<FinancialRecord>>;

    /// Overwrites the row keyed by `(entity_id, category)`. Last writer wins.
    async fn upsert_analysis_record(&self, record: &AnalysisRecord) -> Result<()>;

    /// Overwrites only if the stored row's `updated_at` still equals
    /// `expected_updated_at` (`None` = no row yet). Fails with `ConflictDetected` otherwise.
    async fn upsert_analysis_record_if_unchanged(
        &self,
        record: &AnalysisRecord,
        expected_updated_at: Option<i64>,
    ) -> Result<()>;
}

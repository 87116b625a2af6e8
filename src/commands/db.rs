use crate::analysis::folder_tree::FolderIndex;
use crate::commands::store::RecordStore;
use crate::error::{Error, Result};
use crate::models::analysis_record::{AnalysisRecord, RecordFilter};
use crate::models::entity::Entity;
use crate::models::finance::{FinancialRecord, InvestmentRecord, NumericField};
use crate::models::folder::{Folder, ROOT_FOLDER_ID};
use crate::models::report::ReportDetails;
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Database schema version {version} is newer than {DB_SCHEMA_VERSION}; continuing");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    // Numeric detail columns are untyped so legacy text values are kept as entered.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS folders (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id TEXT NOT NULL DEFAULT 'root',
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS startups (
            id TEXT PRIMARY KEY,
            parent_id TEXT NOT NULL,
            company_name TEXT NOT NULL DEFAULT '',
            biz_type TEXT,
            company_address TEXT,
            support_needs TEXT NOT NULL DEFAULT '[]',
            founding_date TEXT,
            ceo_name TEXT,
            homepage TEXT,
            service_summary TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS startup_analysis (
            startup_id TEXT NOT NULL,
            category TEXT NOT NULL,
            folder_id TEXT NOT NULL,
            scores TEXT NOT NULL DEFAULT '{}',
            total_score INTEGER NOT NULL DEFAULT 0,
            comment TEXT NOT NULL DEFAULT '',
            extra_questions TEXT NOT NULL DEFAULT '[]',
            updated_at INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (startup_id, category)
        );

        CREATE TABLE IF NOT EXISTS startup_investments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            startup_id TEXT NOT NULL,
            period TEXT,
            round TEXT,
            investor TEXT,
            amount,
            pre_share,
            post_share
        );

        CREATE TABLE IF NOT EXISTS startup_financials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            startup_id TEXT NOT NULL,
            year TEXT NOT NULL,
            revenue_domestic,
            revenue_overseas,
            employees
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS startup_report_details (
            startup_id TEXT PRIMARY KEY,
            invest_comment TEXT NOT NULL DEFAULT '',
            plans TEXT NOT NULL DEFAULT '[]',
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id);
        CREATE INDEX IF NOT EXISTS idx_startups_parent ON startups(parent_id);
        CREATE INDEX IF NOT EXISTS idx_analysis_folder ON startup_analysis(folder_id);
        CREATE INDEX IF NOT EXISTS idx_investments_startup ON startup_investments(startup_id);
        CREATE INDEX IF NOT EXISTS idx_financials_startup ON startup_financials(startup_id);
        ",
    )
}

pub fn get_db_connection(workspace_path: &str) -> Result<Connection> {
    let dir = Path::new(workspace_path).join(".scopelens");
    std::fs::create_dir_all(&dir).map_err(|e| Error::Store(Box::new(e)))?;
    let conn = Connection::open(dir.join("state.db"))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn numeric_to_sql(field: &Option<NumericField>) -> SqlValue {
    match field {
        Some(NumericField::Number(n)) => SqlValue::Real(*n),
        Some(NumericField::Text(raw)) => SqlValue::Text(raw.clone()),
        None => SqlValue::Null,
    }
}

fn numeric_from_sql(value: SqlValue) -> Option<NumericField> {
    match value {
        SqlValue::Integer(n) => Some(NumericField::Number(n as f64)),
        SqlValue::Real(n) => Some(NumericField::Number(n)),
        SqlValue::Text(raw) => Some(NumericField::Text(raw)),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn folder_from_row(row: &Row) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        sort_order: row.get(3)?,
    })
}

fn entity_from_row(row: &Row) -> rusqlite::Result<Entity> {
    let needs_json: String = row.get(5)?;
    Ok(Entity {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        company_name: row.get(2)?,
        biz_type: row.get(3)?,
        company_address: row.get(4)?,
        support_needs: serde_json::from_str(&needs_json).unwrap_or_default(),
        founding_date: row.get(6)?,
        ceo_name: row.get(7)?,
        homepage: row.get(8)?,
        service_summary: row.get(9)?,
        sort_order: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn analysis_from_row(row: &Row) -> rusqlite::Result<AnalysisRecord> {
    let entity_id: String = row.get(0)?;
    let category: String = row.get(1)?;
    let scores_json: String = row.get(3)?;
    let questions_json: String = row.get(6)?;

    let scores = serde_json::from_str(&scores_json).unwrap_or_else(|e| {
        log::warn!("Unreadable scores for ({entity_id}, {category}): {e}");
        Default::default()
    });
    let extra_questions = serde_json::from_str(&questions_json).unwrap_or_else(|e| {
        log::warn!("Unreadable question snapshot for ({entity_id}, {category}): {e}");
        Vec::new()
    });

    Ok(AnalysisRecord {
        entity_id,
        category,
        folder_id: row.get(2)?,
        scores,
        total_score: row.get(4)?,
        comment: row.get(5)?,
        extra_questions,
        updated_at: row.get(7)?,
    })
}

fn write_analysis_record(conn: &Connection, record: &AnalysisRecord) -> Result<()> {
    let scores_json = serde_json::to_string(&record.scores)?;
    let questions_json = serde_json::to_string(&record.extra_questions)?;

    conn.execute(
        "
        INSERT INTO startup_analysis (
            startup_id,
            category,
            folder_id,
            scores,
            total_score,
            comment,
            extra_questions,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(startup_id, category) DO UPDATE SET
            folder_id = excluded.folder_id,
            scores = excluded.scores,
            total_score = excluded.total_score,
            comment = excluded.comment,
            extra_questions = excluded.extra_questions,
            updated_at = excluded.updated_at
        ",
        params![
            record.entity_id,
            record.category,
            record.folder_id,
            scores_json,
            record.total_score,
            record.comment,
            questions_json,
            record.updated_at,
        ],
    )?;

    Ok(())
}

/// SQLite-backed store for folders, startups, their detail rows and analysis records.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) `<workspace>/.scopelens/state.db`.
    pub fn open(workspace_path: &str) -> Result<Self> {
        Ok(Self::from_connection(get_db_connection(workspace_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("database connection lock poisoned".into()))
    }

    fn folders_snapshot(conn: &Connection) -> Result<Vec<Folder>> {
        let mut stmt =
            conn.prepare("SELECT id, name, parent_id, sort_order FROM folders ORDER BY sort_order ASC, name ASC")?;
        let folders = stmt
            .query_map([], folder_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    fn ensure_folder(conn: &Connection, folder_id: &str) -> Result<()> {
        if folder_id == ROOT_FOLDER_ID {
            return Ok(());
        }
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE id = ?1)",
            params![folder_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::FolderNotFound(folder_id.to_string()))
        }
    }

    pub fn create_folder(&self, name: &str, parent_id: &str) -> Result<Folder> {
        let conn = self.lock()?;
        Self::ensure_folder(&conn, parent_id)?;

        let sort_order: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM folders WHERE parent_id = ?1",
            params![parent_id],
            |row| row.get(0),
        )?;
        let folder = Folder {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            parent_id: parent_id.to_string(),
            sort_order,
        };

        conn.execute(
            "INSERT INTO folders (id, name, parent_id, sort_order, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![folder.id, folder.name, folder.parent_id, folder.sort_order, now_millis()],
        )?;
        log::info!("Created folder {} under {}", folder.id, folder.parent_id);
        Ok(folder)
    }

    pub fn rename_folder(&self, folder_id: &str, name: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE folders SET name = ?2 WHERE id = ?1",
            params![folder_id, name],
        )?;
        if changed == 0 {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        Ok(())
    }

    pub fn move_folder(&self, folder_id: &str, new_parent_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let folders = Self::folders_snapshot(&conn)?;
        let index = FolderIndex::new(&folders);

        if index.get(folder_id).is_none() {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }
        if !index.contains(new_parent_id) {
            return Err(Error::FolderNotFound(new_parent_id.to_string()));
        }
        if index.is_descendant_or_self(new_parent_id, folder_id) {
            return Err(Error::CycleDetected {
                folder_id: folder_id.to_string(),
                parent_id: new_parent_id.to_string(),
            });
        }

        conn.execute(
            "UPDATE folders SET parent_id = ?2 WHERE id = ?1",
            params![folder_id, new_parent_id],
        )?;
        Ok(())
    }

    /// Deletes the folder, its descendants, their startups and the startups'
    /// investment and financial rows. Analysis records are left in place.
    pub fn delete_folder(&self, folder_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let folders = Self::folders_snapshot(&conn)?;
        let index = FolderIndex::new(&folders);
        if index.get(folder_id).is_none() {
            return Err(Error::FolderNotFound(folder_id.to_string()));
        }

        let doomed: Vec<String> = index.subtree_ids(folder_id).into_iter().collect();
        let marks = placeholders(doomed.len());

        let tx = conn.unchecked_transaction()?;
        for table in ["startup_investments", "startup_financials"] {
            tx.execute(
                &format!(
                    "DELETE FROM {table} WHERE startup_id IN (SELECT id FROM startups WHERE parent_id IN ({marks}))"
                ),
                params_from_iter(doomed.iter()),
            )?;
        }
        tx.execute(
            &format!("DELETE FROM startups WHERE parent_id IN ({marks})"),
            params_from_iter(doomed.iter()),
        )?;
        let removed = tx.execute(
            &format!("DELETE FROM folders WHERE id IN ({marks})"),
            params_from_iter(doomed.iter()),
        )?;
        tx.commit()?;

        log::info!("Deleted folder {folder_id} and {} descendants", removed.saturating_sub(1));
        Ok(removed)
    }

    /// Persists a startup captured by the intake form. An empty id gets a fresh one.
    pub fn insert_entity(&self, entity: &Entity) -> Result<Entity> {
        let conn = self.lock()?;
        Self::ensure_folder(&conn, &entity.parent_id)?;

        let mut stored = entity.clone();
        if stored.id.is_empty() {
            stored.id = uuid::Uuid::new_v4().to_string();
        }
        if stored.created_at == 0 {
            stored.created_at = now_millis();
        }
        let needs_json = serde_json::to_string(&stored.support_needs)?;

        conn.execute(
            "INSERT INTO startups (id, parent_id, company_name, biz_type, company_address, support_needs, founding_date, ceo_name, homepage, service_summary, sort_order, created_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            params![
                stored.id,
                stored.parent_id,
                stored.company_name,
                stored.biz_type,
                stored.company_address,
                needs_json,
                stored.founding_date,
                stored.ceo_name,
                stored.homepage,
                stored.service_summary,
                stored.sort_order,
                stored.created_at,
            ],
        )?;
        Ok(stored)
    }

    pub fn move_entity(&self, entity_id: &str, folder_id: &str) -> Result<()> {
        let conn = self.lock()?;
        Self::ensure_folder(&conn, folder_id)?;
        let changed = conn.execute(
            "UPDATE startups SET parent_id = ?2 WHERE id = ?1",
            params![entity_id, folder_id],
        )?;
        if changed == 0 {
            return Err(Error::EntityNotFound(entity_id.to_string()));
        }
        Ok(())
    }

    pub fn insert_investment(&self, investment: &InvestmentRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO startup_investments (startup_id, period, round, investor, amount, pre_share, post_share) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                investment.entity_id,
                investment.period,
                investment.round,
                investment.investor,
                numeric_to_sql(&investment.amount),
                numeric_to_sql(&investment.pre_share),
                numeric_to_sql(&investment.post_share),
            ],
        )?;
        Ok(())
    }

    pub fn insert_financial(&self, financial: &FinancialRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO startup_financials (startup_id, year, revenue_domestic, revenue_overseas, employees) VALUES (?1,?2,?3,?4,?5)",
            params![
                financial.entity_id,
                financial.year,
                numeric_to_sql(&financial.revenue_domestic),
                numeric_to_sql(&financial.revenue_overseas),
                numeric_to_sql(&financial.employees),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_report_details(&self, details: &ReportDetails) -> Result<()> {
        let conn = self.lock()?;
        let plans_json = serde_json::to_string(&details.plans)?;
        conn.execute(
            "
            INSERT INTO startup_report_details (startup_id, invest_comment, plans, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(startup_id) DO UPDATE SET
                invest_comment = excluded.invest_comment,
                plans = excluded.plans,
                updated_at = excluded.updated_at
            ",
            params![details.entity_id, details.invest_comment, plans_json, details.updated_at],
        )?;
        Ok(())
    }

    pub fn load_report_details(&self, entity_id: &str) -> Result<Option<ReportDetails>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT startup_id, invest_comment, plans, updated_at FROM startup_report_details WHERE startup_id = ?1",
                params![entity_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((entity_id, invest_comment, plans_json, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(ReportDetails {
            entity_id,
            invest_comment,
            plans: serde_json::from_str(&plans_json)?,
            updated_at,
        }))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list_folders(&self) -> Result<Vec<Folder>> {
        let conn = self.lock()?;
        Self::folders_snapshot(&conn)
    }

    async fn list_entities(&self) -> Result<Vec<Entity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, company_name, biz_type, company_address, support_needs, founding_date, ceo_name, homepage, service_summary, sort_order, created_at FROM startups ORDER BY sort_order ASC, company_name ASC",
        )?;
        let entities = stmt
            .query_map([], entity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entities)
    }

    async fn list_analysis_records(&self, filter: &RecordFilter) -> Result<Vec<AnalysisRecord>> {
        if matches!(&filter.entity_ids, Some(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(ids) = &filter.entity_ids {
            clauses.push(format!("startup_id IN ({})", placeholders(ids.len())));
            args.extend(ids.iter().cloned());
        }
        if let Some(folder_id) = &filter.folder_scope_id {
            clauses.push("folder_id = ?".to_string());
            args.push(folder_id.clone());
        }
        if let Some(category) = &filter.category {
            clauses.push("category = ?".to_string());
            args.push(category.clone());
        }

        let mut sql = "SELECT startup_id, category, folder_id, scores, total_score, comment, extra_questions, updated_at FROM startup_analysis".to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY updated_at ASC, startup_id ASC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args.iter()), analysis_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn list_investments(&self, entity_ids: &[String]) -> Result<Vec<InvestmentRecord>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT startup_id, period, round, investor, amount, pre_share, post_share FROM startup_investments WHERE startup_id IN ({}) ORDER BY period ASC, id ASC",
            placeholders(entity_ids.len())
        ))?;
        let investments = stmt
            .query_map(params_from_iter(entity_ids.iter()), |row| {
                Ok(InvestmentRecord {
                    entity_id: row.get(0)?,
                    period: row.get(1)?,
                    round: row.get(2)?,
                    investor: row.get(3)?,
                    amount: numeric_from_sql(row.get(4)?),
                    pre_share: numeric_from_sql(row.get(5)?),
                    post_share: numeric_from_sql(row.get(6)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(investments)
    }

    async fn list_financials(&self, entity_ids: &[String]) -> Result<Vec<FinancialRecord>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT startup_id, year, revenue_domestic, revenue_overseas, employees FROM startup_financials WHERE startup_id IN ({}) ORDER BY year ASC, id ASC",
            placeholders(entity_ids.len())
        ))?;
        let financials = stmt
            .query_map(params_from_iter(entity_ids.iter()), |row| {
                Ok(FinancialRecord {
                    entity_id: row.get(0)?,
                    year: row.get(1)?,
                    revenue_domestic: numeric_from_sql(row.get(2)?),
                    revenue_overseas: numeric_from_sql(row.get(3)?),
                    employees: numeric_from_sql(row.get(4)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(financials)
    }

    async fn upsert_analysis_record(&self, record: &AnalysisRecord) -> Result<()> {
        let conn = self.lock()?;
        write_analysis_record(&conn, record)?;
        log::debug!("Saved analysis ({}, {})", record.entity_id, record.category);
        Ok(())
    }

    async fn upsert_analysis_record_if_unchanged(
        &self,
        record: &AnalysisRecord,
        expected_updated_at: Option<i64>,
    ) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT updated_at FROM startup_analysis WHERE startup_id = ?1 AND category = ?2",
                params![record.entity_id, record.category],
                |row| row.get(0),
            )
            .optional()?;

        if current != expected_updated_at {
            return Err(Error::ConflictDetected {
                entity_id: record.entity_id.clone(),
                category: record.category.clone(),
            });
        }

        write_analysis_record(&tx, record)?;
        tx.commit()?;
        Ok(())
    }
}

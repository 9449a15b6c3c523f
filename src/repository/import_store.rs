// ==========================================
// 学员管理后台 - 本地导入存储
// ==========================================
// 职责: 将确认导入的记录写入 SQLite
// 语义:
// - participant 以 email 为键 upsert（同键记录被更新）
// - program / module 以 title 为键 upsert
// - 整批在同一事务中，失败则整批回滚
// - 每批写入一条 import_batch 记录
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import::{ConfirmRequest, ConfirmResponse};
use crate::domain::schema::EntityType;
use crate::domain::types::EditableRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_service_trait::CommitService;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};
use uuid::Uuid;

/// 单批提交结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub batch_id: String,
    pub imported: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// import_batch 表的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub batch_id: String,
    pub entity: String,
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
    pub imported: usize,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ImportStoreRepository
// ==========================================
pub struct ImportStoreRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportStoreRepository {
    /// 打开（或创建）数据库文件并建表
    pub fn new(db_path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存数据库（测试 / 试运行）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在一个事务中写入整批记录
    pub fn commit_batch(
        &self,
        entity: EntityType,
        request: &ConfirmRequest,
    ) -> RepositoryResult<CommitSummary> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now();

        let mut inserted = 0;
        let mut updated = 0;
        for (row, record) in request.data.iter().enumerate() {
            let was_update = match entity {
                EntityType::Participant => upsert_participant_tx(&tx, row, record, &now)?,
                EntityType::Program => upsert_program_tx(&tx, row, record, &now)?,
                EntityType::Module => upsert_module_tx(&tx, row, record, &now)?,
            };
            if was_update {
                updated += 1;
            } else {
                inserted += 1;
            }
        }

        let batch_id = Uuid::new_v4().to_string();
        let imported = inserted + updated;
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, entity, original_name, size, file_type, imported, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                batch_id,
                entity.model_name(),
                request.original_name,
                request.size as i64,
                request.file_type,
                imported as i64,
                now.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        Ok(CommitSummary {
            batch_id,
            imported,
            inserted,
            updated,
        })
    }

    /// 某实体表的记录数
    pub fn count(&self, entity: EntityType) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(entity));
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 导入批次列表（最新在前）
    pub fn list_batches(&self) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, entity, original_name, size, file_type, imported, created_at
            FROM import_batch
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let size: i64 = row.get(3)?;
            let imported: i64 = row.get(5)?;
            let created_at: String = row.get(6)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                size,
                row.get::<_, String>(4)?,
                imported,
                created_at,
            ))
        })?;

        let mut batches = Vec::new();
        for row in rows {
            let (batch_id, entity, original_name, size, file_type, imported, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| RepositoryError::DatabaseQueryError(format!("created_at: {}", e)))?
                .with_timezone(&Utc);
            batches.push(ImportBatch {
                batch_id,
                entity,
                original_name,
                size: size.max(0) as u64,
                file_type,
                imported: imported.max(0) as usize,
                created_at,
            });
        }
        Ok(batches)
    }

    /// 学员列表，形状与远端 GET /participants 的元素一致
    pub fn list_participants(&self) -> RepositoryResult<Vec<Value>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, first_name, last_name, email, phone_number,
                   division, deanery, parish, program, semester
            FROM participants
            ORDER BY created_at, rowid
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(json!({
                "id": row.get::<_, String>(0)?,
                "firstName": row.get::<_, String>(1)?,
                "lastName": row.get::<_, String>(2)?,
                "email": row.get::<_, String>(3)?,
                "phoneNumber": row.get::<_, String>(4)?,
                "division": row.get::<_, Option<String>>(5)?,
                "deanery": row.get::<_, Option<String>>(6)?,
                "parish": row.get::<_, Option<String>>(7)?,
                "program": row.get::<_, Option<String>>(8)?,
                "semester": row.get::<_, Option<String>>(9)?,
                "modules": [],
            }))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn table_name(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Participant => "participants",
        EntityType::Program => "programs",
        EntityType::Module => "modules",
    }
}

// ==========================================
// 字段取值
// ==========================================

fn required<'a>(record: &'a EditableRecord, row: usize, key: &str) -> RepositoryResult<&'a str> {
    match record.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RepositoryError::FieldValueError {
            row,
            field: key.to_string(),
            message: "required value is empty".to_string(),
        }),
    }
}

fn optional<'a>(record: &'a EditableRecord, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn existing_id(tx: &Transaction, sql: &str, key: &str) -> RepositoryResult<Option<String>> {
    Ok(tx
        .query_row(sql, params![key], |row| row.get::<_, String>(0))
        .optional()?)
}

// ==========================================
// upsert（返回 true 表示更新了已有记录）
// ==========================================
// 学员 password 列只作用于远端账户创建，本地存储不落盘

fn upsert_participant_tx(
    tx: &Transaction,
    row: usize,
    record: &EditableRecord,
    now: &DateTime<Utc>,
) -> RepositoryResult<bool> {
    let email = required(record, row, "email")?.to_lowercase();
    let first_name = required(record, row, "firstName")?;
    let last_name = required(record, row, "lastName")?;
    let phone_number = required(record, row, "phoneNumber")?;
    let now = now.to_rfc3339();

    match existing_id(tx, "SELECT id FROM participants WHERE email = ?1", &email)? {
        Some(id) => {
            tx.execute(
                r#"
                UPDATE participants SET
                    first_name = ?2, last_name = ?3, phone_number = ?4,
                    division = ?5, deanery = ?6, parish = ?7,
                    program = ?8, semester = ?9, updated_at = ?10
                WHERE id = ?1
                "#,
                params![
                    id,
                    first_name,
                    last_name,
                    phone_number,
                    optional(record, "division"),
                    optional(record, "deanery"),
                    optional(record, "parish"),
                    optional(record, "program"),
                    optional(record, "semester"),
                    now,
                ],
            )?;
            Ok(true)
        }
        None => {
            tx.execute(
                r#"
                INSERT INTO participants (
                    id, first_name, last_name, email, phone_number,
                    division, deanery, parish, program, semester, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    first_name,
                    last_name,
                    email,
                    phone_number,
                    optional(record, "division"),
                    optional(record, "deanery"),
                    optional(record, "parish"),
                    optional(record, "program"),
                    optional(record, "semester"),
                    now,
                ],
            )?;
            Ok(false)
        }
    }
}

fn upsert_program_tx(
    tx: &Transaction,
    row: usize,
    record: &EditableRecord,
    now: &DateTime<Utc>,
) -> RepositoryResult<bool> {
    let title = required(record, row, "title")?;
    let semester = required(record, row, "semester")?;
    let duration = required(record, row, "duration")?;
    let description = optional(record, "description");
    let now = now.to_rfc3339();

    match existing_id(tx, "SELECT id FROM programs WHERE title = ?1", title)? {
        Some(id) => {
            tx.execute(
                r#"
                UPDATE programs SET
                    semester = ?2, duration = ?3, description = ?4, updated_at = ?5
                WHERE id = ?1
                "#,
                params![id, semester, duration, description, now],
            )?;
            Ok(true)
        }
        None => {
            tx.execute(
                r#"
                INSERT INTO programs (
                    id, title, semester, duration, description, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                "#,
                params![Uuid::new_v4().to_string(), title, semester, duration, description, now],
            )?;
            Ok(false)
        }
    }
}

fn upsert_module_tx(
    tx: &Transaction,
    row: usize,
    record: &EditableRecord,
    now: &DateTime<Utc>,
) -> RepositoryResult<bool> {
    let title = required(record, row, "title")?;
    let credits = required(record, row, "credits")?;
    let program = required(record, row, "program")?;
    let is_active = optional(record, "isActive");
    let now = now.to_rfc3339();

    match existing_id(tx, "SELECT id FROM modules WHERE title = ?1", title)? {
        Some(id) => {
            tx.execute(
                r#"
                UPDATE modules SET
                    credits = ?2, program = ?3, is_active = ?4, updated_at = ?5
                WHERE id = ?1
                "#,
                params![id, credits, program, is_active, now],
            )?;
            Ok(true)
        }
        None => {
            tx.execute(
                r#"
                INSERT INTO modules (
                    id, title, credits, program, is_active, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                "#,
                params![Uuid::new_v4().to_string(), title, credits, program, is_active, now],
            )?;
            Ok(false)
        }
    }
}

// ==========================================
// SqliteCommitService
// ==========================================

/// 本地提交服务：CommitService 的 SQLite 实现
#[derive(Clone)]
pub struct SqliteCommitService {
    repo: Arc<ImportStoreRepository>,
}

impl SqliteCommitService {
    pub fn new(repo: Arc<ImportStoreRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<ImportStoreRepository> {
        &self.repo
    }
}

#[async_trait]
impl CommitService for SqliteCommitService {
    #[instrument(skip(self, request), fields(entity = %entity, rows = request.data.len()))]
    async fn confirm(&self, entity: EntityType, request: ConfirmRequest) -> ImportResult<ConfirmResponse> {
        let repo = Arc::clone(&self.repo);
        let summary = tokio::task::spawn_blocking(move || repo.commit_batch(entity, &request))
            .await
            .map_err(|e| ImportError::InternalError(format!("commit task failed: {}", e)))??;

        info!(
            batch_id = %summary.batch_id,
            inserted = summary.inserted,
            updated = summary.updated,
            "本地导入完成"
        );
        Ok(ConfirmResponse {
            imported: summary.imported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::FileDetails;

    fn record(pairs: &[(&str, &str)]) -> EditableRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn participant(first: &str, email: &str) -> EditableRecord {
        record(&[
            ("firstName", first),
            ("lastName", "Okafor"),
            ("email", email),
            ("phoneNumber", "08030000000"),
            ("password", "s3cret"),
            ("division", "North"),
            ("deanery", ""),
            ("parish", "St. Mary"),
            ("program", "Diploma"),
            ("semester", "1"),
        ])
    }

    fn request(data: Vec<EditableRecord>) -> ConfirmRequest {
        ConfirmRequest::new(
            data,
            &FileDetails {
                original_name: "roster.csv".to_string(),
                size: 128,
                file_type: "text/csv".to_string(),
            },
        )
    }

    #[test]
    fn test_participants_upsert_by_email() {
        let repo = ImportStoreRepository::in_memory().unwrap();
        let first = repo
            .commit_batch(
                EntityType::Participant,
                &request(vec![participant("Ada", "ada@example.com"), participant("Ben", "ben@example.com")]),
            )
            .unwrap();
        assert_eq!((first.inserted, first.updated), (2, 0));

        let second = repo
            .commit_batch(
                EntityType::Participant,
                &request(vec![participant("Adaeze", "ADA@example.com")]),
            )
            .unwrap();
        assert_eq!((second.inserted, second.updated), (0, 1));
        assert_eq!(repo.count(EntityType::Participant).unwrap(), 2);

        let people = repo.list_participants().unwrap();
        assert_eq!(people[0]["firstName"], "Adaeze");
        assert_eq!(people[0]["deanery"], Value::Null);
    }

    #[test]
    fn test_participant_password_is_not_stored() {
        let repo = ImportStoreRepository::in_memory().unwrap();
        repo.commit_batch(
            EntityType::Participant,
            &request(vec![participant("Ada", "ada@example.com")]),
        )
        .unwrap();

        let columns: Vec<String> = {
            let conn = repo.get_conn().unwrap();
            let mut stmt = conn
                .prepare("SELECT name FROM pragma_table_info('participants')")
                .unwrap();
            let names: Vec<String> = stmt
                .query_map([], |row| row.get(0))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
            names
        };
        assert!(!columns.iter().any(|c| c == "password"));

        let people = repo.list_participants().unwrap();
        assert!(people[0].get("password").is_none());
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let repo = ImportStoreRepository::in_memory().unwrap();
        let result = repo.commit_batch(
            EntityType::Participant,
            &request(vec![participant("Ada", "ada@example.com"), participant("Ben", "")]),
        );
        assert!(matches!(
            result,
            Err(RepositoryError::FieldValueError { row: 1, .. })
        ));
        assert_eq!(repo.count(EntityType::Participant).unwrap(), 0);
        assert!(repo.list_batches().unwrap().is_empty());
    }

    #[test]
    fn test_batch_row_recorded() {
        let repo = ImportStoreRepository::in_memory().unwrap();
        let data = vec![record(&[
            ("title", "Diploma in Theology"),
            ("semester", "2"),
            ("duration", "2 years"),
            ("description", ""),
        ])];
        let summary = repo.commit_batch(EntityType::Program, &request(data)).unwrap();

        let batches = repo.list_batches().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_id, summary.batch_id);
        assert_eq!(batches[0].entity, "program");
        assert_eq!(batches[0].original_name, "roster.csv");
        assert_eq!(batches[0].size, 128);
        assert_eq!(batches[0].imported, 1);
    }

    #[tokio::test]
    async fn test_commit_service_reports_imported() {
        let repo = Arc::new(ImportStoreRepository::in_memory().unwrap());
        let service = SqliteCommitService::new(Arc::clone(&repo));
        let data = vec![
            record(&[("title", "Liturgy"), ("credits", "3"), ("program", "Diploma"), ("isActive", "true")]),
            record(&[("title", "Liturgy"), ("credits", "4"), ("program", "Diploma"), ("isActive", "")]),
        ];
        let response = service.confirm(EntityType::Module, request(data)).await.unwrap();
        assert_eq!(response.imported, 2);
        assert_eq!(repo.count(EntityType::Module).unwrap(), 1);
    }
}

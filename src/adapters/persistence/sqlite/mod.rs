//! SQLite-backed repository via libsql. Implements every storage port.
//!
//! One database file holds users, sections, registrations, assignments, the audit log and
//! bot settings. Each call opens a fresh connection with foreign keys and the busy timeout
//! set; multi-step writes run in a transaction.

mod activity;
mod assignments;
mod registrations;
mod schema;
mod sections;
mod settings;
mod users;

use crate::domain::entities::{
    Activity, Assignment, Division, RegistrationStatus, Section, StudentEntry, StudyType, User,
    UserType,
};
use crate::domain::time::parse_stored_timestamp;
use crate::domain::DomainError;
use libsql::params::IntoParams;
use libsql::{params, Connection, Database, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Row counts reported after `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSummary {
    pub tables: i64,
    pub levels: i64,
    pub subjects: i64,
    pub settings: i64,
    pub features: i64,
}

/// SQLite repository. Safe to share via Arc.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
    busy_timeout_ms: u128,
}

pub(crate) fn db_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Map a write error, turning uniqueness violations into `Conflict(msg)`.
fn write_err(e: libsql::Error, conflict_msg: &str) -> DomainError {
    if is_unique_violation(&e) {
        DomainError::Conflict(conflict_msg.to_string())
    } else {
        db_err(e)
    }
}

/// First row of `sql` mapped through `map`. The row is read before the cursor is dropped.
async fn first_row<T>(
    conn: &Connection,
    sql: &str,
    params: impl IntoParams,
    map: impl Fn(&Row) -> Result<T, DomainError>,
) -> Result<Option<T>, DomainError> {
    let mut rows = conn.query(sql, params).await.map_err(db_err)?;
    match rows.next().await.map_err(db_err)? {
        Some(row) => map(&row).map(Some),
        None => Ok(None),
    }
}

/// Every row of `sql`, each mapped while the cursor still points at it.
async fn all_rows<T>(
    conn: &Connection,
    sql: &str,
    params: impl IntoParams,
    map: impl Fn(&Row) -> Result<T, DomainError>,
) -> Result<Vec<T>, DomainError> {
    let mut rows = conn.query(sql, params).await.map_err(db_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(db_err)? {
        out.push(map(&row)?);
    }
    Ok(out)
}

async fn count(conn: &Connection, sql: &str, params: impl IntoParams) -> Result<i64, DomainError> {
    let value = first_row(conn, sql, params, |row| {
        row.get::<Option<i64>>(0).map_err(db_err)
    })
    .await?;
    Ok(value.flatten().unwrap_or(0))
}

/// INTEGER flag column; NULL reads as `default`.
fn flag(row: &Row, idx: i32, default: bool) -> Result<bool, DomainError> {
    Ok(row
        .get::<Option<i64>>(idx)
        .map_err(db_err)?
        .map(|v| v != 0)
        .unwrap_or(default))
}

const USER_COLUMNS: &str =
    "u.user_id, u.telegram_id, u.username, u.full_name, u.user_type, u.is_active, u.is_blocked";

fn user_from_row(row: &Row) -> Result<User, DomainError> {
    let user_type: String = row.get(4).map_err(db_err)?;
    Ok(User {
        user_id: row.get(0).map_err(db_err)?,
        telegram_id: row.get(1).map_err(db_err)?,
        username: row.get(2).map_err(db_err)?,
        full_name: row.get(3).map_err(db_err)?,
        user_type: UserType::parse(&user_type)
            .ok_or_else(|| db_err(format!("unknown user_type {}", user_type)))?,
        is_active: flag(row, 5, true)?,
        is_blocked: flag(row, 6, false)?,
    })
}

const SECTION_SELECT: &str = r#"
    SELECT s.section_id, s.section_name, s.level_id, al.level_name, s.study_type, s.division,
           s.admin_id, u.full_name, s.join_code, s.max_students, s.is_active
    FROM sections s
    JOIN academic_levels al ON s.level_id = al.level_id
    LEFT JOIN users u ON s.admin_id = u.user_id
"#;

fn section_from_row(row: &Row) -> Result<Section, DomainError> {
    let study_type: String = row.get(4).map_err(db_err)?;
    let division: String = row.get(5).map_err(db_err)?;
    Ok(Section {
        section_id: row.get(0).map_err(db_err)?,
        section_name: row.get(1).map_err(db_err)?,
        level_id: row.get(2).map_err(db_err)?,
        level_name: row.get(3).map_err(db_err)?,
        study_type: StudyType::from_label(&study_type)
            .ok_or_else(|| db_err(format!("unknown study_type {}", study_type)))?,
        division: Division::from_label(&division)
            .ok_or_else(|| db_err(format!("unknown division {}", division)))?,
        admin_id: row.get(6).map_err(db_err)?,
        admin_name: row.get(7).map_err(db_err)?,
        join_code: row.get(8).map_err(db_err)?,
        max_students: row.get::<Option<i64>>(9).map_err(db_err)?.unwrap_or(50),
        is_active: flag(row, 10, true)?,
    })
}

const ASSIGNMENT_SELECT: &str = r#"
    SELECT a.assignment_id, a.section_id, a.subject_id, sub.subject_name, a.title,
           a.description, a.deadline, a.created_by, u.full_name, a.is_active, a.is_edited,
           a.created_at
    FROM assignments a
    JOIN subjects sub ON a.subject_id = sub.subject_id
    JOIN users u ON a.created_by = u.user_id
"#;

fn timestamp(row: &Row, idx: i32) -> Result<chrono::DateTime<chrono::FixedOffset>, DomainError> {
    let raw: String = row.get(idx).map_err(db_err)?;
    parse_stored_timestamp(&raw).ok_or_else(|| db_err(format!("bad timestamp {}", raw)))
}

fn assignment_from_row(row: &Row) -> Result<Assignment, DomainError> {
    Ok(Assignment {
        assignment_id: row.get(0).map_err(db_err)?,
        section_id: row.get(1).map_err(db_err)?,
        subject_id: row.get(2).map_err(db_err)?,
        subject_name: row.get(3).map_err(db_err)?,
        title: row.get(4).map_err(db_err)?,
        description: row.get(5).map_err(db_err)?,
        deadline: timestamp(row, 6)?,
        created_by: row.get(7).map_err(db_err)?,
        creator_name: row.get(8).map_err(db_err)?,
        is_active: flag(row, 9, true)?,
        is_edited: flag(row, 10, false)?,
        created_at: timestamp(row, 11)?,
    })
}

/// Columns: user_id, telegram_id, full_name, username, is_blocked, status, at.
fn student_from_row(row: &Row) -> Result<StudentEntry, DomainError> {
    let status: String = row.get(5).map_err(db_err)?;
    Ok(StudentEntry {
        user_id: row.get(0).map_err(db_err)?,
        telegram_id: row.get(1).map_err(db_err)?,
        full_name: row.get(2).map_err(db_err)?,
        username: row.get(3).map_err(db_err)?,
        is_blocked: flag(row, 4, false)?,
        status: RegistrationStatus::parse(&status)
            .ok_or_else(|| db_err(format!("unknown registration_status {}", status)))?,
        at: row.get(6).map_err(db_err)?,
    })
}

fn activity_from_row(row: &Row) -> Result<Activity, DomainError> {
    Ok(Activity {
        log_id: row.get(0).map_err(db_err)?,
        user_id: row.get(1).map_err(db_err)?,
        action_type: row.get(2).map_err(db_err)?,
        details: row.get(3).map_err(db_err)?,
        target_type: row.get(4).map_err(db_err)?,
        target_id: row.get(5).map_err(db_err)?,
        created_at: row.get::<Option<String>>(6).map_err(db_err)?.unwrap_or_default(),
        full_name: row.get(7).map_err(db_err)?,
        user_type: row.get(8).map_err(db_err)?,
    })
}

impl SqliteRepo {
    /// Open (or create) the database file. Creates the parent directory and enables WAL.
    /// Does not create the schema; call `initialize` for that.
    pub async fn connect(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(db_err)?;
        }
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(db_err)?;
        let repo = Self {
            db,
            db_path,
            busy_timeout_ms: busy_timeout.as_millis(),
        };

        let conn = repo.conn().await?;
        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(db_err)?.is_some() {}

        info!(path = %repo.db_path.display(), "SQLite connected with WAL mode");
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// New connection with foreign keys on and the busy timeout applied.
    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(db_err)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(db_err)?;
        let mut rows = conn
            .query(&format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms), ())
            .await
            .map_err(db_err)?;
        while rows.next().await.map_err(db_err)?.is_some() {}
        Ok(conn)
    }

    /// Create all tables and indexes, then insert seed rows. Idempotent.
    pub async fn initialize(&self) -> Result<SchemaSummary, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        for ddl in schema::TABLES.iter().chain(schema::INDEXES) {
            tx.execute(ddl, ()).await.map_err(db_err)?;
        }
        for (name, number) in schema::LEVELS {
            tx.execute(
                "INSERT OR IGNORE INTO academic_levels (level_name, level_number) VALUES (?1, ?2)",
                params![*name, *number],
            )
            .await
            .map_err(db_err)?;
        }
        for (name, description) in schema::SUBJECTS {
            tx.execute(
                "INSERT OR IGNORE INTO subjects (subject_name, description) VALUES (?1, ?2)",
                params![*name, *description],
            )
            .await
            .map_err(db_err)?;
        }
        for (subject, level_number) in schema::SUBJECT_STAGES {
            tx.execute(
                r#"
                INSERT OR IGNORE INTO subjects_stages (subject_id, stage_id)
                SELECT s.subject_id, al.level_id
                FROM subjects s, academic_levels al
                WHERE s.subject_name = ?1 AND al.level_number = ?2
                "#,
                params![*subject, *level_number],
            )
            .await
            .map_err(db_err)?;
        }
        for (key, value, kind, description) in schema::SETTINGS {
            tx.execute(
                r#"
                INSERT OR IGNORE INTO bot_settings (setting_key, setting_value, setting_type, description)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![*key, *value, *kind, *description],
            )
            .await
            .map_err(db_err)?;
        }
        for (key, name, enabled, description) in schema::FEATURES {
            tx.execute(
                r#"
                INSERT OR IGNORE INTO bot_features (feature_key, feature_name, is_enabled, description)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![*key, *name, *enabled, *description],
            )
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;

        let summary = self.summary().await?;
        info!(
            tables = summary.tables,
            levels = summary.levels,
            subjects = summary.subjects,
            "database schema ready"
        );
        Ok(summary)
    }

    /// True when the levels table exists and has rows.
    pub async fn is_initialized(&self) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let exists = count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'academic_levels'",
            (),
        )
        .await?;
        if exists == 0 {
            debug!("academic_levels table missing");
            return Ok(false);
        }
        Ok(count(&conn, "SELECT COUNT(*) FROM academic_levels", ()).await? > 0)
    }

    pub async fn summary(&self) -> Result<SchemaSummary, DomainError> {
        let conn = self.conn().await?;
        Ok(SchemaSummary {
            tables: count(
                &conn,
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                (),
            )
            .await?,
            levels: count(&conn, "SELECT COUNT(*) FROM academic_levels", ()).await?,
            subjects: count(&conn, "SELECT COUNT(*) FROM subjects", ()).await?,
            settings: count(&conn, "SELECT COUNT(*) FROM bot_settings", ()).await?,
            features: count(&conn, "SELECT COUNT(*) FROM bot_features", ()).await?,
        })
    }
}

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use submittal_model::{KeyedRow, MergedRecord};
use thiserror::Error;

use crate::schema;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("project already exists: {0}")]
    ProjectExists(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A saved project: the merged records plus the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_number: String,
    pub project_name: String,
    pub records: Vec<MergedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_number: String,
    pub project_name: String,
    pub record_count: usize,
    pub modified_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadKind {
    Documents,
    Workflows,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Documents => "documents",
            UploadKind::Workflows => "workflows",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "documents" => Ok(UploadKind::Documents),
            "workflows" => Ok(UploadKind::Workflows),
            other => Err(format!("unknown upload kind: {other}")),
        }
    }
}

/// One stored upload of raw export rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub id: i64,
    pub kind: UploadKind,
    pub rows: Vec<KeyedRow>,
    pub uploaded_at: String,
}

/// Project blobs keyed by project number. Saves overwrite the whole record set.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectStore {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Open a SQLite URI, e.g. `file:name?mode=memory&cache=shared`.
    pub fn open_uri(uri: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(uri, flags)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn get(&self, project_number: &str) -> Result<Project> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let row = conn
            .query_row(
                "SELECT project_name, data FROM projects WHERE project_number = ?1",
                params![project_number],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?;

        let (project_name, data) =
            row.ok_or_else(|| StorageError::ProjectNotFound(project_number.to_string()))?;
        Ok(Project {
            project_number: project_number.to_string(),
            project_name,
            records: serde_json::from_str(&data)?,
        })
    }

    pub fn exists(&self, project_number: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        project_exists(&conn, project_number)
    }

    pub fn create(
        &self,
        project_number: &str,
        records: &[MergedRecord],
        project_name: &str,
    ) -> Result<()> {
        let data = serde_json::to_string(records)?;
        let conn = self.conn.lock().expect("storage mutex poisoned");
        if project_exists(&conn, project_number)? {
            return Err(StorageError::ProjectExists(project_number.to_string()));
        }
        conn.execute(
            "INSERT INTO projects (project_number, project_name, data, record_count) VALUES (?1, ?2, ?3, ?4)",
            params![project_number, project_name, data, records.len() as i64],
        )?;
        log::debug!(
            "created project {project_number} with {} records",
            records.len()
        );
        Ok(())
    }

    /// Replace the project's records and name. Last writer wins.
    pub fn update(
        &self,
        project_number: &str,
        records: &[MergedRecord],
        project_name: &str,
    ) -> Result<()> {
        let data = serde_json::to_string(records)?;
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let changed = conn.execute(
            "UPDATE projects SET project_name = ?2, data = ?3, record_count = ?4, modified_at = CURRENT_TIMESTAMP WHERE project_number = ?1",
            params![project_number, project_name, data, records.len() as i64],
        )?;
        if changed == 0 {
            return Err(StorageError::ProjectNotFound(project_number.to_string()));
        }
        log::debug!(
            "updated project {project_number} with {} records",
            records.len()
        );
        Ok(())
    }

    /// Create the project, or overwrite it if it already exists.
    pub fn save(
        &self,
        project_number: &str,
        records: &[MergedRecord],
        project_name: &str,
    ) -> Result<()> {
        match self.update(project_number, records, project_name) {
            Err(StorageError::ProjectNotFound(_)) => {
                self.create(project_number, records, project_name)
            }
            other => other,
        }
    }

    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT project_number, project_name, record_count, modified_at FROM projects ORDER BY project_number",
        )?;
        let rows = stmt.query_map([], |r| {
            let count: i64 = r.get(2)?;
            Ok(ProjectSummary {
                project_number: r.get(0)?,
                project_name: r.get(1)?,
                record_count: usize::try_from(count).unwrap_or(0),
                modified_at: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Append a raw upload for an existing project and return its id.
    pub fn append_upload(
        &self,
        project_number: &str,
        kind: UploadKind,
        rows: &[KeyedRow],
    ) -> Result<i64> {
        let data = serde_json::to_string(rows)?;
        let conn = self.conn.lock().expect("storage mutex poisoned");
        if !project_exists(&conn, project_number)? {
            return Err(StorageError::ProjectNotFound(project_number.to_string()));
        }
        conn.execute(
            "INSERT INTO raw_uploads (project_number, kind, row_count, data) VALUES (?1, ?2, ?3, ?4)",
            params![project_number, kind.as_str(), rows.len() as i64, data],
        )?;
        let id = conn.last_insert_rowid();
        log::debug!("stored {kind} upload {id} ({} rows) for {project_number}", rows.len());
        Ok(id)
    }

    /// Uploads for a project, oldest first.
    pub fn uploads(&self, project_number: &str) -> Result<Vec<Upload>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        if !project_exists(&conn, project_number)? {
            return Err(StorageError::ProjectNotFound(project_number.to_string()));
        }
        let mut stmt = conn.prepare(
            "SELECT id, kind, data, uploaded_at FROM raw_uploads WHERE project_number = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![project_number], |r| {
            let kind: String = r.get(1)?;
            Ok((
                r.get::<_, i64>(0)?,
                kind.parse::<UploadKind>()
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?.unwrap_or_default(),
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, kind, data, uploaded_at) = row?;
            out.push(Upload {
                id,
                kind,
                rows: serde_json::from_str(&data)?,
                uploaded_at,
            });
        }
        Ok(out)
    }

    /// The most recent upload of each kind, if any.
    pub fn latest_uploads(
        &self,
        project_number: &str,
    ) -> Result<(Option<Upload>, Option<Upload>)> {
        let mut documents = None;
        let mut workflows = None;
        for upload in self.uploads(project_number)? {
            match upload.kind {
                UploadKind::Documents => documents = Some(upload),
                UploadKind::Workflows => workflows = Some(upload),
            }
        }
        Ok((documents, workflows))
    }
}

fn project_exists(conn: &Connection, project_number: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM projects WHERE project_number = ?1",
            params![project_number],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
          project_number TEXT PRIMARY KEY,
          project_name TEXT NOT NULL,
          data JSON NOT NULL,
          created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
          modified_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        -- Raw export rows as uploaded, kept so a project can be re-merged with different options.
        CREATE TABLE IF NOT EXISTS raw_uploads (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          project_number TEXT NOT NULL REFERENCES projects(project_number) ON DELETE CASCADE,
          kind TEXT NOT NULL CHECK (kind IN ('documents','workflows')),
          row_count INTEGER NOT NULL,
          data JSON NOT NULL,
          uploaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_raw_uploads_project ON raw_uploads(project_number);
        "#,
    )?;

    // Stores created before record counts were tracked lack the column.
    ensure_project_columns(conn)?;

    Ok(())
}

fn ensure_project_columns(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(projects)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut existing = std::collections::HashSet::new();
    for name in rows {
        existing.insert(name?);
    }

    if !existing.contains("record_count") {
        conn.execute(
            "ALTER TABLE projects ADD COLUMN record_count INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
    }

    Ok(())
}

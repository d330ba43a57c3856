use rusqlite::Connection;

use crate::error::TaskdeckError;

pub fn run_migrations(conn: &Connection) -> Result<(), TaskdeckError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            project TEXT NOT NULL,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            data TEXT NOT NULL CHECK (json_valid(data)),
            created_on TEXT NOT NULL,
            created_by TEXT,
            modified_on TEXT NOT NULL,
            modified_by TEXT,
            PRIMARY KEY (project, collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_collection ON records(project, collection);
        ",
    )?;
    Ok(())
}

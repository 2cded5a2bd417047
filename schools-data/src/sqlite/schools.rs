use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use schools_core::{NewSchool, School};

fn from_row(row: &Row<'_>) -> rusqlite::Result<School> {
    Ok(School {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a school and read the stored row back.
pub fn insert(conn: &Connection, school: &NewSchool) -> rusqlite::Result<School> {
    let now: DateTime<Utc> = Utc::now();
    conn.execute(
        "INSERT INTO schools (name, address, latitude, longitude, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            school.name(),
            school.address(),
            school.latitude(),
            school.longitude(),
            now
        ],
    )?;
    find(conn, conn.last_insert_rowid())
}

/// Fetch a single school by id.
pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<School> {
    conn.query_row(
        "SELECT id, name, address, latitude, longitude, created_at FROM schools WHERE id = ?1",
        params![id],
        from_row,
    )
}

/// List all schools.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<School>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, latitude, longitude, created_at FROM schools ORDER BY id",
    )?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

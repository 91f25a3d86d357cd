use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::grading::GradingScale;

pub const DB_FILE: &str = "gradingd.sqlite3";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScale {
    pub id: String,
    pub department: String,
    pub grade: String,
    pub remark: String,
    pub from: f64,
    pub to: f64,
    pub sort_order: i64,
    pub updated_at: String,
}

impl StoredScale {
    pub fn to_scale(&self) -> GradingScale {
        GradingScale::new(&self.grade, &self.remark, self.from, self.to)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    pub scale_count: i64,
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(workspace.join(DB_FILE))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grading_scales(
            id TEXT PRIMARY KEY,
            department TEXT NOT NULL,
            grade TEXT NOT NULL,
            remark TEXT NOT NULL,
            from_pct REAL NOT NULL,
            to_pct REAL NOT NULL,
            sort_order INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grading_scales_department
            ON grading_scales(department, sort_order)",
        [],
    )?;

    Ok(conn)
}

pub fn departments_list(conn: &Connection) -> anyhow::Result<Vec<DepartmentSummary>> {
    let mut stmt = conn.prepare(
        "SELECT department, COUNT(*) FROM grading_scales
         GROUP BY department ORDER BY department",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DepartmentSummary {
                department: row.get(0)?,
                scale_count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn scales_list(conn: &Connection, department: &str) -> anyhow::Result<Vec<StoredScale>> {
    let mut stmt = conn.prepare(
        "SELECT id, department, grade, remark, from_pct, to_pct, sort_order, updated_at
         FROM grading_scales WHERE department = ? ORDER BY sort_order",
    )?;
    let rows = stmt
        .query_map([department], |row| {
            Ok(StoredScale {
                id: row.get(0)?,
                department: row.get(1)?,
                grade: row.get(2)?,
                remark: row.get(3)?,
                from: row.get(4)?,
                to: row.get(5)?,
                sort_order: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace a department's whole set. Callers validate first; a band missing
/// any field is rejected here rather than stored half-formed.
pub fn scales_replace(
    conn: &Connection,
    department: &str,
    scales: &[GradingScale],
) -> anyhow::Result<usize> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM grading_scales WHERE department = ?",
        [department],
    )?;
    for (i, s) in scales.iter().enumerate() {
        let (Some(grade), Some(remark), Some((from, to))) =
            (s.grade.as_deref(), s.remark.as_deref(), s.bounds())
        else {
            anyhow::bail!("scale {} is incomplete", i);
        };
        tx.execute(
            "INSERT INTO grading_scales(
                id, department, grade, remark, from_pct, to_pct, sort_order, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                department,
                grade.trim(),
                remark.trim(),
                from,
                to,
                i as i64,
                &now,
            ),
        )?;
    }
    tx.commit()?;
    Ok(scales.len())
}

pub fn scales_delete(conn: &Connection, department: &str) -> anyhow::Result<usize> {
    let n = conn.execute(
        "DELETE FROM grading_scales WHERE department = ?",
        [department],
    )?;
    Ok(n)
}

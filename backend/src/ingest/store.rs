use crate::ingest::batch::{RowBatch, OWNER_COLUMN};
use log::debug;
use rusqlite::{params_from_iter, Connection};
use std::time::Duration;

/// How a batch lands in its target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop any existing table and create it from the batch's columns.
    Replace,
    /// Insert into the existing table.
    Append,
}

pub fn open(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    // jobs for different owners share the database file
    conn.busy_timeout(Duration::from_secs(30))?;
    Ok(conn)
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Writes one batch inside its own transaction and returns the number of rows inserted.
///
/// Each call commits on its own; a later failure never rolls back an earlier batch.
pub fn write_batch(
    conn: &mut Connection,
    table: &str,
    batch: &RowBatch,
    mode: WriteMode,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let quoted_table = quote_ident(table);

    if mode == WriteMode::Replace {
        tx.execute(&format!("DROP TABLE IF EXISTS {quoted_table}"), [])?;
        let column_defs: Vec<String> = batch
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("{} {}", quote_ident(name), infer_column_type(batch, idx)))
            .collect();
        let ddl = format!("CREATE TABLE {quoted_table} ({})", column_defs.join(", "));
        debug!("{}", ddl);
        tx.execute(&ddl, [])?;
    }

    let column_list: Vec<String> = batch.columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=batch.columns.len()).map(|i| format!("?{i}")).collect();
    let insert = format!(
        "INSERT INTO {quoted_table} ({}) VALUES ({})",
        column_list.join(", "),
        placeholders.join(", ")
    );

    {
        let mut stmt = tx.prepare(&insert)?;
        for row in &batch.rows {
            stmt.execute(params_from_iter(row.iter().map(|v| v.as_deref())))?;
        }
    }
    tx.commit()?;
    Ok(batch.len())
}

#[cfg(test)]
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
}

/// Picks the SQLite column type from the non-null values of the batch.
/// The owner column is always `TEXT`, and so is a column holding an integer
/// too wide for `i64`.
fn infer_column_type(batch: &RowBatch, idx: usize) -> &'static str {
    if batch.columns[idx] == OWNER_COLUMN {
        return "TEXT";
    }

    let mut values = batch
        .rows
        .iter()
        .filter_map(|row| row.get(idx).and_then(|v| v.as_deref()))
        .peekable();
    if values.peek().is_none() {
        return "TEXT";
    }

    let mut all_integer = true;
    let mut all_real = true;
    for value in values {
        let trimmed = value.trim();
        if all_integer && trimmed.parse::<i64>().is_err() {
            if is_integer_literal(trimmed) {
                return "TEXT";
            }
            all_integer = false;
        }
        if trimmed.parse::<f64>().is_err() {
            all_real = false;
            break;
        }
    }

    if all_integer {
        "INTEGER"
    } else if all_real {
        "REAL"
    } else {
        "TEXT"
    }
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

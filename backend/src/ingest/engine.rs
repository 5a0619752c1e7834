//! Loads a CSV source into an owner's table.
//!
//! Two paths share the same batch reader and writer:
//! - [`ingest_chunked`] walks the source in `chunk_size` slices. The first
//!   slice replaces the table and every later slice is appended, strictly in
//!   source order.
//! - [`ingest_whole`] reads the entire source and replaces the table in one
//!   write.
//!
//! Batches commit independently. If a later batch fails, the rows of earlier
//! batches stay in the table.

use crate::ingest::batch::{read_all, BatchReader};
use crate::ingest::error::IngestError;
use crate::ingest::store::{write_batch, WriteMode};
use log::info;
use rusqlite::Connection;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: String,
    pub rows: u64,
    pub batches: usize,
    pub columns: usize,
}

/// `on_progress` receives the cumulative row count after every committed batch.
pub fn ingest_chunked<R, F>(
    source: R,
    conn: &mut Connection,
    table: &str,
    owner: &str,
    chunk_size: usize,
    mut on_progress: F,
) -> Result<IngestReport, IngestError>
where
    R: Read,
    F: FnMut(u64),
{
    let mut reader = BatchReader::new(source, owner, chunk_size)?;
    let columns = reader.columns().len();
    let mut total_rows = 0u64;
    let mut batches = 0usize;

    while let Some(batch) = reader.next_batch()? {
        info!("Read batch of {} rows for table {}", batch.len(), table);
        let mode = if batches == 0 {
            WriteMode::Replace
        } else {
            WriteMode::Append
        };
        let written = write_batch(conn, table, &batch, mode)?;
        total_rows += written as u64;
        batches += 1;
        info!("Batch saved: {} rows ({} total) into {}", written, total_rows, table);
        on_progress(total_rows);
    }

    Ok(IngestReport {
        table: table.to_string(),
        rows: total_rows,
        batches,
        columns,
    })
}

pub fn ingest_whole<R: Read>(
    source: R,
    conn: &mut Connection,
    table: &str,
    owner: &str,
) -> Result<IngestReport, IngestError> {
    let batch = read_all(source, owner)?;
    let rows = write_batch(conn, table, &batch, WriteMode::Replace)? as u64;
    info!("CSV saved: {} rows into {}", rows, table);
    Ok(IngestReport {
        table: table.to_string(),
        rows,
        batches: 1,
        columns: batch.columns.len(),
    })
}

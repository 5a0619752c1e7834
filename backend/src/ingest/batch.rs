//! Reads a CSV source into [`RowBatch`]es.
//!
//! The reader normalizes the header once (lower-cased names, `unnamed: {i}`
//! for blank ones, `name.1`, `name.2`, ... for repeats) and stamps every row with the owner identifier in the
//! `chat_id` column, reusing an existing `chat_id` column when the source
//! already has one. Empty cells become `None` so they are stored as NULL.

use crate::ingest::error::IngestError;
use std::collections::HashMap;
use std::io::Read;

pub const OWNER_COLUMN: &str = "chat_id";

/// A slice of consecutive source rows sharing one column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct BatchReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
    owner_index: usize,
    source_width: usize,
    owner: String,
    chunk_size: usize,
    record: csv::StringRecord,
    exhausted: bool,
    emitted: bool,
}

impl<R: Read> BatchReader<R> {
    /// Reads and normalizes the header. Fails with [`IngestError::EmptySource`]
    /// when the source has no header line at all.
    pub fn new(source: R, owner: &str, chunk_size: usize) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(source);
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(IngestError::EmptySource);
        }

        let source_width = headers.len();
        let mut columns = normalize_columns(&headers);
        let owner_index = match columns.iter().position(|c| c == OWNER_COLUMN) {
            Some(idx) => idx,
            None => {
                columns.push(OWNER_COLUMN.to_string());
                columns.len() - 1
            }
        };

        Ok(Self {
            reader,
            columns,
            owner_index,
            source_width,
            owner: owner.to_string(),
            chunk_size: chunk_size.max(1),
            record: csv::StringRecord::new(),
            exhausted: false,
            emitted: false,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the next batch of at most `chunk_size` rows.
    ///
    /// A header-only source yields exactly one empty batch so the table still
    /// gets created.
    pub fn next_batch(&mut self) -> Result<Option<RowBatch>, IngestError> {
        if self.exhausted && self.emitted {
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(self.chunk_size.min(4096));
        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut self.record)? {
                self.exhausted = true;
                break;
            }
            rows.push(self.shape_row()?);
        }

        if rows.is_empty() && self.emitted {
            return Ok(None);
        }
        self.emitted = true;
        Ok(Some(RowBatch {
            columns: self.columns.clone(),
            rows,
        }))
    }

    fn shape_row(&self) -> Result<Vec<Option<String>>, IngestError> {
        let found = self.record.len();
        if found > self.source_width {
            return Err(IngestError::RaggedRow {
                line: self.record.position().map(|p| p.line()).unwrap_or(0),
                expected: self.source_width,
                found,
            });
        }

        let mut row: Vec<Option<String>> = (0..self.columns.len())
            .map(|idx| self.record.get(idx).and_then(cell))
            .collect();
        row[self.owner_index] = Some(self.owner.clone());
        Ok(row)
    }
}

/// Reads the whole source into a single batch.
pub fn read_all<R: Read>(source: R, owner: &str) -> Result<RowBatch, IngestError> {
    let mut reader = BatchReader::new(source, owner, usize::MAX)?;
    let columns = reader.columns().to_vec();
    Ok(reader
        .next_batch()?
        .unwrap_or(RowBatch { columns, rows: Vec::new() }))
}

fn normalize_columns(headers: &csv::StringRecord) -> Vec<String> {
    let names = headers.iter().enumerate().map(|(idx, name)| {
        if name.is_empty() {
            format!("unnamed: {idx}")
        } else {
            name.to_lowercase()
        }
    });
    dedupe_columns(names)
}

/// Renames repeated names to `name.1`, `name.2`, ... in header order. A
/// generated name that is itself taken gets suffixed again.
fn dedupe_columns(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();
    for mut name in names {
        let mut count = seen.get(&name).copied().unwrap_or(0);
        while count > 0 {
            seen.insert(name.clone(), count + 1);
            name = format!("{name}.{count}");
            count = seen.get(&name).copied().unwrap_or(0);
        }
        seen.insert(name.clone(), count + 1);
        columns.push(name);
    }
    columns
}

fn cell(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

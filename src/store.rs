// 🗄️ Record Store - failed transactions loaded once from CSV
// Read-only after load; lookups are a linear scan (first match wins)

use crate::record::{cell_value, normalize_id, TransactionRecord, ERROR_CODE, REQUIRED_FIELDS, TRANSACTION_ID};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction source `{path}` is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse transaction source: {0}")]
    Csv(#[from] csv::Error),
    #[error("transaction source is missing required column `{0}`")]
    MissingColumn(String),
}

/// In-memory table of failed transactions
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<TransactionRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        RecordStore { records }
    }

    /// Load the store from a CSV file on disk
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            records = store.len(),
            "loaded failed transactions"
        );

        Ok(store)
    }

    /// Load the store from any CSV reader with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for column in [TRANSACTION_ID, ERROR_CODE].iter().chain(REQUIRED_FIELDS.iter()) {
            if !headers.iter().any(|h| h.as_str() == *column) {
                return Err(StoreError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;

            // Short rows pad with absent values; extra cells are dropped
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).and_then(cell_value)))
                .collect();

            records.push(TransactionRecord::new(fields));
        }

        debug!(records = records.len(), columns = headers.len(), "parsed transaction table");

        Ok(RecordStore { records })
    }

    /// First record whose transaction id matches after normalization.
    /// Blank ids never match, on either side.
    pub fn lookup(&self, transaction_id: &str) -> Option<&TransactionRecord> {
        let wanted = normalize_id(transaction_id);
        if wanted.is_empty() {
            return None;
        }

        self.records
            .iter()
            .filter(|record| record.has_transaction_id())
            .find(|record| {
                record
                    .transaction_id()
                    .map(|id| normalize_id(id) == wanted)
                    .unwrap_or(false)
            })
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

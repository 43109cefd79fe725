use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{CellValue, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How the store interprets written values. `UserEntered` lets the
/// spreadsheet parse formulas and numbers the way typed input would.
pub enum ValueInputMode {
    Raw,
    UserEntered,
}

impl ValueInputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `StoreError` values.
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid store response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Trait contract for the spreadsheet store the table backend talks
/// to: read a range as a grid, write a grid back, run a structural
/// batch update, and fetch the spreadsheet title.
pub trait SheetStore: Send + Sync {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<CellValue>>, StoreError>;

    async fn write_range(
        &self,
        range: &str,
        rows: &[Vec<CellValue>],
        mode: ValueInputMode,
    ) -> Result<(), StoreError>;

    async fn batch_update(&self, body: Value) -> Result<(), StoreError>;

    async fn spreadsheet_title(&self) -> Result<String, StoreError>;
}

#[derive(Debug, Default)]
/// In-memory store used by tests and offline runs: one sheet, plus a
/// log of structural batch-update bodies.
pub struct MemorySheetStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Vec<CellValue>>,
    title: String,
    batch_updates: Vec<Value>,
    write_calls: usize,
    batch_update_failures: usize,
}

impl MemorySheetStore {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rows,
                title: "memory sheet".to_string(),
                batch_updates: Vec::new(),
                write_calls: 0,
                batch_update_failures: 0,
            }),
        }
    }

    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        self.state.lock().expect("memory store lock").rows.clone()
    }

    pub fn batch_updates(&self) -> Vec<Value> {
        self.state
            .lock()
            .expect("memory store lock")
            .batch_updates
            .clone()
    }

    /// Number of `write_range` calls, i.e. push-backs.
    pub fn write_calls(&self) -> usize {
        self.state.lock().expect("memory store lock").write_calls
    }

    /// Makes the next `count` batch updates fail with a server error.
    pub fn fail_batch_updates(&self, count: usize) {
        self.state
            .lock()
            .expect("memory store lock")
            .batch_update_failures = count;
    }

    pub fn table(&self) -> Table {
        Table::from_rows(self.rows())
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_range(&self, _range: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        Ok(self.rows())
    }

    async fn write_range(
        &self,
        _range: &str,
        rows: &[Vec<CellValue>],
        _mode: ValueInputMode,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("memory store lock");
        state.rows = rows.to_vec();
        state.write_calls += 1;
        Ok(())
    }

    async fn batch_update(&self, body: Value) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("memory store lock");
        if state.batch_update_failures > 0 {
            state.batch_update_failures -= 1;
            return Err(StoreError::HttpStatus {
                status: 500,
                body: "injected batch update failure".to_string(),
            });
        }
        state.batch_updates.push(body);
        Ok(())
    }

    async fn spreadsheet_title(&self) -> Result<String, StoreError> {
        Ok(self.state.lock().expect("memory store lock").title.clone())
    }
}

//! In-memory table grid, spreadsheet store surface, and the
//! instruction backend that applies typed instruction arguments.
mod backend;
mod chart;
mod google;
mod store;
mod table;
mod value;

pub use backend::TableBackend;
pub use chart::build_chart_request;
pub use google::{GoogleSheetsClient, GoogleSheetsConfig};
pub use store::{MemorySheetStore, SheetStore, StoreError, ValueInputMode};
pub use table::Table;
pub use value::CellValue;

use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates supported `TableError` values.
pub enum TableError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("rows and columns must have the same length")]
    UnpairedIndices,
}

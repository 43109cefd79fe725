use std::sync::Arc;

use sheetwright_instructions::InstructionArgs;
use tracing::{debug, info};

use crate::{build_chart_request, SheetStore, Table, TableError, ValueInputMode};

/// Applies typed instruction arguments to an in-memory copy of one
/// sheet range, reading the copy from the store up front and pushing
/// it back when asked.
pub struct TableBackend {
    store: Arc<dyn SheetStore>,
    range: String,
    table: Table,
}

impl TableBackend {
    pub fn new(store: Arc<dyn SheetStore>, range: impl Into<String>) -> Self {
        Self {
            store,
            range: range.into(),
            table: Table::default(),
        }
    }

    /// Replaces the working copy with the store's current contents.
    pub async fn load(&mut self) -> Result<(), TableError> {
        let rows = self.store.read_range(&self.range).await?;
        self.table = Table::from_rows(rows);
        debug!(
            rows = self.table.row_count(),
            cols = self.table.col_count(),
            "loaded table snapshot"
        );
        Ok(())
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Applies one instruction and returns its result text. Reads and
    /// writes touch only the working copy; chart and batch-update
    /// instructions go straight to the store.
    pub async fn apply(&mut self, args: &InstructionArgs) -> Result<String, TableError> {
        match args {
            InstructionArgs::Write(writes) => {
                self.table.write(writes);
                Ok("Finished writing to table".to_string())
            }
            InstructionArgs::Read { rows, columns } => {
                let values = self.table.read(rows, columns)?;
                Ok(values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "))
            }
            InstructionArgs::Chart(chart) => {
                let request = build_chart_request(chart);
                info!(title = %chart.title, chart_type = %chart.chart_type, "creating chart");
                self.store.batch_update(request).await?;
                Ok("Created chart".to_string())
            }
            InstructionArgs::Question { answer } => Ok(answer.clone()),
            InstructionArgs::Other { body } => {
                info!("running batch update instruction");
                self.store.batch_update(body.clone()).await?;
                Ok("Completed instruction".to_string())
            }
        }
    }

    /// Writes the working copy back to the store. Values go through
    /// user-entered parsing so formulas and numbers behave as typed.
    pub async fn push_back(&self) -> Result<(), TableError> {
        info!(range = %self.range, "pushing table back to store");
        self.store
            .write_range(&self.range, self.table.rows(), ValueInputMode::UserEntered)
            .await?;
        Ok(())
    }
}

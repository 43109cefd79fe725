use std::fmt;

use sheetwright_instructions::CellWrite;

use crate::{CellValue, TableError};

#[derive(Debug, Clone, PartialEq, Default)]
/// A rectangular, growable 2-D grid of cells addressed by zero-based
/// (row, column) indices. Every row always has the same column count.
pub struct Table {
    cells: Vec<Vec<CellValue>>,
}

impl Table {
    /// Builds a table from raw rows, padding short rows with the
    /// missing-value marker so the grid stays rectangular.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { cells }
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn col_count(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.cells
    }

    /// Grows the grid to at least `min_rows` x `min_cols`, filling new
    /// cells with the missing-value marker. Never shrinks; a no-op when
    /// the grid already meets both dimensions.
    pub fn expand(&mut self, min_rows: usize, min_cols: usize) {
        let target_cols = self.col_count().max(min_cols);
        if target_cols > self.col_count() {
            for row in &mut self.cells {
                row.resize(target_cols, CellValue::Empty);
            }
        }
        while self.cells.len() < min_rows {
            self.cells.push(vec![CellValue::Empty; target_cols]);
        }
    }

    /// Sets one cell, expanding first when the coordinates fall
    /// outside the current grid.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        self.expand(row + 1, col + 1);
        self.cells[row][col] = value;
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells.get(row).and_then(|cells| cells.get(col))
    }

    /// Applies a batch of cell writes in order. Each write expands as
    /// needed; there is no all-or-nothing guarantee across the batch.
    pub fn write(&mut self, writes: &[CellWrite]) {
        for write in writes {
            tracing::debug!(row = write.row, col = write.col, value = %write.value, "setting cell");
            self.set(write.row, write.col, CellValue::from(write.value.as_str()));
        }
    }

    /// Returns the values at the paired (rows[i], columns[i])
    /// coordinates, expanding to the maximum requested index first.
    pub fn read(&mut self, rows: &[usize], columns: &[usize]) -> Result<Vec<CellValue>, TableError> {
        if rows.len() != columns.len() {
            return Err(TableError::UnpairedIndices);
        }
        if let (Some(max_row), Some(max_col)) = (rows.iter().max(), columns.iter().max()) {
            self.expand(max_row + 1, max_col + 1);
        }
        Ok(rows
            .iter()
            .zip(columns.iter())
            .map(|(&row, &col)| self.cells[row][col].clone())
            .collect())
    }
}

/// Renders the grid with column headers and row indices, the shape the
/// instruction prompts embed between `Table:` and `End Table.`.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_count = self.col_count();
        let mut widths: Vec<usize> = (0..col_count)
            .map(|col| col.to_string().len())
            .collect();
        for row in &self.cells {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(cell.to_string().len());
            }
        }
        let index_width = self.row_count().saturating_sub(1).to_string().len();

        write!(f, "{:index_width$}", "")?;
        for (col, width) in widths.iter().copied().enumerate() {
            write!(f, "  {col:>width$}")?;
        }
        for (index, row) in self.cells.iter().enumerate() {
            write!(f, "\n{index:>index_width$}")?;
            for (cell, width) in row.iter().zip(widths.iter().copied()) {
                let rendered = cell.to_string();
                write!(f, "  {rendered:>width$}")?;
            }
        }
        Ok(())
    }
}
